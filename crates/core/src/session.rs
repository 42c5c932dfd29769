//! Anruf-Sitzungen und deren Status
//!
//! `CallSession` ist der Datensatz, den beide Gegenstellen ueber den
//! Signalisierungs-Store austauschen. Die Feldnamen auf der Leitung sind
//! camelCase, damit Clients anderer Plattformen denselben Datensatz
//! lesen koennen.

use serde::{Deserialize, Serialize};

use crate::types::{CallId, UserId};

/// Status eines Anrufs im Signalisierungs-Store
///
/// Auf der Leitung ein blanker String. Unbekannte Werte werden beim
/// Lesen nicht verworfen sondern in `Andere` originalgetreu erhalten,
/// damit neuere Gegenstellen zusaetzliche Stati einfuehren koennen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    Initiated,
    Ringing,
    Connected,
    Ended,
    /// Unbekannter Status, Originalschreibweise bleibt erhalten
    Andere(String),
}

impl CallStatus {
    /// Leitungs-Repraesentation des Status
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Initiated => "INITIATED",
            CallStatus::Ringing => "RINGING",
            CallStatus::Connected => "CONNECTED",
            CallStatus::Ended => "ENDED",
            CallStatus::Andere(s) => s,
        }
    }

    /// Ob der Status einen abgeschlossenen Anruf bezeichnet.
    ///
    /// Reine Konvention: der Store erzwingt keine Statusuebergaenge,
    /// jede Gegenstelle darf jeden Status schreiben.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Ended)
    }
}

impl From<&str> for CallStatus {
    fn from(s: &str) -> Self {
        match s {
            "INITIATED" => CallStatus::Initiated,
            "RINGING" => CallStatus::Ringing,
            "CONNECTED" => CallStatus::Connected,
            "ENDED" => CallStatus::Ended,
            other => CallStatus::Andere(other.to_string()),
        }
    }
}

impl From<String> for CallStatus {
    fn from(s: String) -> Self {
        CallStatus::from(s.as_str())
    }
}

impl From<CallStatus> for String {
    fn from(status: CallStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ein Anrufversuch zwischen genau zwei Gegenstellen
///
/// Wird vom Anrufer unter `anrufe/<callId>` in den Store geschrieben
/// und danach von beiden Seiten per Merge-Write fortgeschrieben.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    pub call_id: CallId,
    pub caller_uid: UserId,
    pub callee_uid: UserId,
    /// IP-Adresse, unter der der Anrufer Medien empfaengt
    pub ip_address: String,
    /// UDP-Port der Gegenseite
    pub port: u16,
    /// Eigener UDP-Empfangsport
    pub local_port: u16,
    pub status: CallStatus,
    /// Erstellungszeitpunkt in Millisekunden seit Epoche
    pub timestamp: i64,
}

impl CallSession {
    /// Erstellt eine neue Sitzung im Status `INITIATED`
    pub fn new(
        call_id: CallId,
        caller_uid: UserId,
        callee_uid: UserId,
        ip_address: impl Into<String>,
        port: u16,
        local_port: u16,
    ) -> Self {
        Self {
            call_id,
            caller_uid,
            callee_uid,
            ip_address: ip_address.into(),
            port,
            local_port,
            status: CallStatus::Initiated,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beispiel_sitzung() -> CallSession {
        CallSession::new(
            CallId::from("anruf-1"),
            UserId::from("alice"),
            UserId::from("bob"),
            "192.168.1.20",
            5004,
            5006,
        )
    }

    #[test]
    fn neue_sitzung_ist_initiated() {
        let sitzung = beispiel_sitzung();
        assert_eq!(sitzung.status, CallStatus::Initiated);
        assert!(sitzung.timestamp > 0);
    }

    #[test]
    fn feldnamen_auf_der_leitung_sind_camel_case() {
        let wert = serde_json::to_value(beispiel_sitzung()).unwrap();
        let obj = wert.as_object().unwrap();
        for feld in [
            "callId",
            "callerUid",
            "calleeUid",
            "ipAddress",
            "port",
            "localPort",
            "status",
            "timestamp",
        ] {
            assert!(obj.contains_key(feld), "Feld {} fehlt", feld);
        }
    }

    #[test]
    fn status_serialisiert_als_blanker_string() {
        let json = serde_json::to_string(&CallStatus::Connected).unwrap();
        assert_eq!(json, "\"CONNECTED\"");
    }

    #[test]
    fn unbekannter_status_bleibt_erhalten() {
        let status: CallStatus = serde_json::from_str("\"VERPASST\"").unwrap();
        assert_eq!(status, CallStatus::Andere("VERPASST".to_string()));
        let zurueck = serde_json::to_string(&status).unwrap();
        assert_eq!(zurueck, "\"VERPASST\"");
    }

    #[test]
    fn nur_ended_ist_terminal() {
        assert!(CallStatus::Ended.is_terminal());
        assert!(!CallStatus::Connected.is_terminal());
        assert!(!CallStatus::Andere("ENDED_X".to_string()).is_terminal());
    }

    #[test]
    fn sitzung_ueberlebt_serde_roundtrip() {
        let sitzung = beispiel_sitzung();
        let json = serde_json::to_string(&sitzung).unwrap();
        let gelesen: CallSession = serde_json::from_str(&json).unwrap();
        assert_eq!(sitzung, gelesen);
    }
}
