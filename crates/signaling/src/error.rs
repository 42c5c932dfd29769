//! Fehlertypen fuer die Anruf-Signalisierung

use thiserror::Error;

/// Fehlertyp der Anruf-Signalisierung
///
/// Anders als im Medienpfad werden diese Fehler immer an den Aufrufer
/// hochgereicht: ein fehlgeschlagener Store-Write darf nie
/// stillschweigend untergehen.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// Schreibvorgang in den Store fehlgeschlagen
    #[error("Store-Schreibfehler: {0}")]
    SchreibFehler(String),

    /// Lesevorgang aus dem Store fehlgeschlagen
    #[error("Store-Lesefehler: {0}")]
    LeseFehler(String),

    /// Der Store hat ein Abonnement beendet
    #[error("Abonnement abgebrochen: {0}")]
    Abbruch(String),

    /// Sitzung nicht gefunden
    #[error("Sitzung nicht gefunden: {0}")]
    NichtGefunden(String),

    /// Datensatz am Pfad hat nicht die erwartete Form
    #[error("Ungueltiger Datensatz: {0}")]
    UngueltigerDatensatz(#[from] serde_json::Error),
}

impl SignalingError {
    /// Erstellt einen Schreibfehler
    pub fn schreibfehler(msg: impl Into<String>) -> Self {
        Self::SchreibFehler(msg.into())
    }

    /// Erstellt einen Abbruch-Fehler
    pub fn abbruch(msg: impl Into<String>) -> Self {
        Self::Abbruch(msg.into())
    }
}

/// Result-Typ der Anruf-Signalisierung
pub type SignalingResult<T> = Result<T, SignalingError>;
