//! Fernruf Peer - Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und baut den Anruf auf.

use anyhow::Result;
use fernruf_peer::{Peer, config::PeerConfig, eingabe};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("FERNRUF_CONFIG")
        .unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let mut config = PeerConfig::laden(&config_pfad)?;

    // Zieladresse aus der Umgebung uebersteuert die Datei
    if let Ok(ip) = std::env::var("FERNRUF_ZIEL_IP") {
        eingabe::ip_parsen(&ip)?;
        config.netzwerk.ziel_ip = ip;
    }
    if let Ok(port) = std::env::var("FERNRUF_ZIEL_PORT") {
        config.netzwerk.ziel_port = eingabe::port_parsen(&port)?;
    }
    if let Ok(port) = std::env::var("FERNRUF_LOKAL_PORT") {
        config.netzwerk.lokal_port = eingabe::port_parsen(&port)?;
    }
    if let Ok(level) = std::env::var("FERNRUF_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(format) = std::env::var("FERNRUF_LOG_FORMAT") {
        config.logging.format = format;
    }

    // Logging initialisieren
    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Fernruf Peer wird initialisiert"
    );

    let peer = Peer::neu(config);
    peer.starten().await?;

    Ok(())
}

/// Initialisiert tracing-subscriber mit dem konfigurierten Level und Format
fn logging_initialisieren(level: &str, format: &str) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
