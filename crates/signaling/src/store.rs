//! Abstrakter Signalisierungs-Store
//!
//! Pfad-adressierter Baum von JSON-Werten, wie ihn gehostete
//! Realtime-Datenbanken anbieten. Die Anruf-Signalisierung kennt nur
//! dieses Interface; ob dahinter ein Speicher-Stub oder ein gehosteter
//! Dienst liegt, ist austauschbar.

use async_trait::async_trait;
use fernruf_core::CallId;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::SignalingResult;

/// Store-Pfad einer Anruf-Sitzung
pub fn sitzungs_pfad(call_id: &CallId) -> String {
    format!("anrufe/{}", call_id.inner())
}

/// Laufendes Abonnement auf einen Store-Pfad
///
/// Liefert bei der Registrierung zuerst den aktuellen Wert (falls
/// vorhanden) und danach jeden neuen Stand des Pfads. Muss explizit
/// mit `beenden()` gekuendigt werden: ein Drop ohne Kuendigung laesst
/// die Registrierung im Store bestehen.
pub struct StoreAbo {
    rx: mpsc::Receiver<Value>,
    kuendigung: Option<Box<dyn FnOnce() + Send>>,
}

impl StoreAbo {
    /// Baut ein Abo aus Empfangsseite und Kuendigungs-Callback
    pub fn neu(rx: mpsc::Receiver<Value>, kuendigung: impl FnOnce() + Send + 'static) -> Self {
        Self {
            rx,
            kuendigung: Some(Box::new(kuendigung)),
        }
    }

    /// Naechster Stand des Pfads; None wenn der Store das Abo beendet hat
    pub async fn naechster_wert(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Kuendigt das Abonnement beim Store
    pub fn beenden(mut self) {
        if let Some(kuendigung) = self.kuendigung.take() {
            kuendigung();
        }
    }
}

/// Pfad-adressierter JSON-Store mit Push-Abonnements
#[async_trait]
pub trait SignalStore: Send + Sync + 'static {
    /// Ueberschreibt den Wert am Pfad vollstaendig
    async fn wert_setzen(&self, pfad: &str, wert: Value) -> SignalingResult<()>;

    /// Merge-Write: aktualisiert die genannten Felder am Pfad und
    /// laesst alle uebrigen unveraendert
    async fn felder_aktualisieren(
        &self,
        pfad: &str,
        felder: serde_json::Map<String, Value>,
    ) -> SignalingResult<()>;

    /// Liest den aktuellen Wert am Pfad
    async fn lesen(&self, pfad: &str) -> SignalingResult<Option<Value>>;

    /// Registriert ein Abonnement auf genau diesen Pfad
    async fn abonnieren(&self, pfad: &str) -> SignalingResult<StoreAbo>;
}
