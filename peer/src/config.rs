//! Peer-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Peer ohne Konfigurationsdatei
//! lauffaehig ist.

use serde::{Deserialize, Serialize};

/// Vollstaendige Peer-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PeerConfig {
    /// Netzwerk-Einstellungen (Gegenstelle und lokaler Empfang)
    pub netzwerk: NetzwerkEinstellungen,
    /// Signalisierungs-Einstellungen
    pub signalisierung: SignalisierungsEinstellungen,
    /// Audio-Einstellungen
    pub audio: AudioEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// IP-Adresse der Gegenstelle
    pub ziel_ip: String,
    /// UDP-Port der Gegenstelle
    pub ziel_port: u16,
    /// Lokaler UDP-Port fuer eingehende Frames
    pub lokal_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            ziel_ip: "127.0.0.1".into(),
            ziel_port: 5004,
            lokal_port: 5006,
        }
    }
}

/// Signalisierungs-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalisierungsEinstellungen {
    /// Eigene Benutzerkennung
    pub eigene_uid: String,
    /// Benutzerkennung der Gegenstelle
    pub gegenstelle_uid: String,
}

impl Default for SignalisierungsEinstellungen {
    fn default() -> Self {
        Self {
            eigene_uid: "peer-a".into(),
            gegenstelle_uid: "peer-b".into(),
        }
    }
}

/// Audio-Einstellungen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEinstellungen {
    /// Name des Eingabegeraets (leer = Systemstandard)
    pub eingabegeraet: Option<String>,
    /// Name des Ausgabegeraets (leer = Systemstandard)
    pub ausgabegeraet: Option<String>,
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl PeerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Zieladresse der Gegenstelle zurueck
    pub fn ziel_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.ziel_ip, self.netzwerk.ziel_port)
    }
}
