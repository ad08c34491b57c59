// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Probe a CUPS server: print its version and the printers it reports.
//
//   CUPSLINK_CONFIG=client.json RUST_LOG=debug cargo run --example cups_probe

use cupslink_core::ClientConfig;
use cupslink_ipp::CupsClient;

#[tokio::main]
async fn main() -> cupslink_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("CUPSLINK_CONFIG") {
        Ok(path) => ClientConfig::from_json_file(path)?,
        Err(_) => ClientConfig::default(),
    };
    tracing::info!(server = %config.authority(), "probing CUPS server");

    let mut client = CupsClient::new(config)?;

    match client.get_version().await {
        Ok(version) => tracing::info!(%version, "server version"),
        Err(e) => tracing::warn!(error = %e, "version unavailable"),
    }

    let printers = client.get_printers().await?;
    for group in &printers.groups {
        let label = group.name.as_deref().unwrap_or("(ungrouped)");
        for (name, value) in &group.attributes {
            tracing::info!(group = label, attribute = %name, %value);
        }
    }

    client.disconnect();
    Ok(())
}
