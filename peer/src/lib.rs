//! fernruf-peer - Bibliotheks-Root
//!
//! Deklariert die Peer-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod eingabe;

use anyhow::Result;
use std::sync::Arc;

use config::PeerConfig;
use fernruf_audio::CallEngine;
use fernruf_core::{CallStatus, UserId};
use fernruf_signaling::{MemoryStore, SignalingClient};

/// Haelt den laufenden Peer-Zustand zusammen
pub struct Peer {
    pub config: PeerConfig,
}

impl Peer {
    /// Erstellt einen neuen Peer aus der gegebenen Konfiguration
    pub fn neu(config: PeerConfig) -> Self {
        Self { config }
    }

    /// Baut den Anruf auf und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Zieladresse und Ports pruefen
    /// 2. Sitzung im Signalisierungs-Store anlegen
    /// 3. Statusaenderungen der Sitzung beobachten
    /// 4. Medienpfad starten und CONNECTED melden
    /// 5. Auf Ctrl-C warten, dann Medienpfad und Sitzung beenden
    pub async fn starten(self) -> Result<()> {
        let ziel_ip = eingabe::ip_parsen(&self.config.netzwerk.ziel_ip)?;
        let ziel_port = eingabe::port_pruefen(self.config.netzwerk.ziel_port)?;
        let lokal_port = eingabe::port_pruefen(self.config.netzwerk.lokal_port)?;

        tracing::info!(
            ziel = %self.config.ziel_adresse(),
            lokal_port,
            "Peer startet"
        );

        let store = Arc::new(MemoryStore::neu());
        let signaling = SignalingClient::neu(store);
        let engine = CallEngine::new(
            self.config.audio.eingabegeraet.clone(),
            self.config.audio.ausgabegeraet.clone(),
        );

        let call_id = signaling
            .anruf_erstellen(
                UserId::from(self.config.signalisierung.eigene_uid.as_str()),
                UserId::from(self.config.signalisierung.gegenstelle_uid.as_str()),
                ziel_ip,
                ziel_port,
                lokal_port,
            )
            .await?;

        let mut abo = signaling.abonnieren(&call_id).await?;
        let beobachter = tokio::spawn(async move {
            loop {
                match abo.naechste().await {
                    Ok(sitzung) => {
                        tracing::info!(
                            call = %sitzung.call_id,
                            status = %sitzung.status,
                            "Sitzungsstatus"
                        );
                        if sitzung.status.is_terminal() {
                            break;
                        }
                    }
                    Err(fehler) => {
                        tracing::warn!(fehler = %fehler, "Sitzungsabo abgebrochen");
                        break;
                    }
                }
            }
            abo
        });

        // Fehler in den Medien-Loops beenden den Anruf still und landen
        // in last_error; nur der Start selbst kann hier scheitern
        engine.start(ziel_ip, ziel_port, lokal_port)?;
        signaling
            .status_aktualisieren(&call_id, CallStatus::Connected)
            .await?;

        tracing::info!("Anruf laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Anruf wird beendet");

        engine.stop();
        if let Some(fehler) = engine.last_error() {
            tracing::warn!(fehler = %fehler, "Medienpfad meldete einen Fehler");
        }
        let statistik = engine.stats();
        tracing::info!(
            frames_gesendet = statistik.frames_sent,
            frames_empfangen = statistik.frames_received,
            "Medienpfad beendet"
        );

        signaling.anruf_beenden(&call_id).await?;
        let abo = beobachter.await?;
        abo.beenden();

        Ok(())
    }
}
