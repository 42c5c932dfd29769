//! Fehlertypen fuer den Audio-Kernel

use thiserror::Error;

/// Alle moeglichen Fehler des Audio-Kernels
///
/// Fehler aus den laufenden Medien-Loops werden nie an den Aufrufer
/// von `CallEngine::start` propagiert. Der betroffene Loop beendet
/// sich, die Engine geht auf Idle und der Grund ist danach ueber
/// `CallEngine::last_error` abrufbar.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Mikrofon-Berechtigung verweigert")]
    BerechtigungVerweigert,

    #[error("Audio-Konfiguration nicht unterstuetzt: {0}")]
    KonfigNichtUnterstuetzt(String),

    #[error("Audio-Geraet nicht gefunden: {0}")]
    GeraetNichtGefunden(String),

    #[error("Kein Standard-Eingabegeraet verfuegbar")]
    KeinStandardEingabegeraet,

    #[error("Kein Standard-Ausgabegeraet verfuegbar")]
    KeinStandardAusgabegeraet,

    #[error("Stream-Fehler: {0}")]
    StreamFehler(String),

    #[error("Netzwerkfehler: {0}")]
    Netzwerk(#[from] std::io::Error),

    #[error("Engine laeuft bereits")]
    LaeuftBereits,
}

pub type AudioResult<T> = Result<T, AudioError>;
