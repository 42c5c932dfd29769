//! In-Memory-Implementierung des SignalStore
//!
//! Referenz-Store fuer Tests und lokale Entwicklung: ein DashMap als
//! Wertebaum plus eine Abonnenten-Registry je Pfad. Benachrichtigungen
//! laufen nicht-blockierend ueber bounded Queues; ein voller Abonnent
//! verliert Zwischenstaende statt den Schreiber aufzuhalten.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::SignalingResult;
use crate::store::{SignalStore, StoreAbo};

/// Groesse der Benachrichtigungs-Queue je Abonnent
const ABO_QUEUE_GROESSE: usize = 64;

/// Abonnenten-Handle in der Registry
struct AboEintrag {
    abo_id: u64,
    tx: mpsc::Sender<Value>,
}

/// In-Memory-Store
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Wertebaum: voller Pfad -> aktueller Stand
    werte: DashMap<String, Value>,
    /// Abonnenten je Pfad
    abos: DashMap<String, Vec<AboEintrag>>,
    naechste_abo_id: AtomicU64,
}

impl MemoryStore {
    /// Erstellt einen leeren Store
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl registrierter Abonnements auf einem Pfad
    pub fn abo_anzahl(&self, pfad: &str) -> usize {
        self.inner.abos.get(pfad).map(|v| v.len()).unwrap_or(0)
    }

    fn benachrichtigen(&self, pfad: &str, wert: &Value) {
        let Some(eintraege) = self.inner.abos.get(pfad) else {
            return;
        };
        for eintrag in eintraege.iter() {
            match eintrag.tx.try_send(wert.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(pfad, abo_id = eintrag.abo_id, "Abo-Queue voll, Stand verworfen");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Empfaenger weg; die Registrierung bleibt bis zur
                    // expliziten Kuendigung bestehen
                    debug!(pfad, abo_id = eintrag.abo_id, "Abo-Queue geschlossen");
                }
            }
        }
    }

    fn abbestellen(&self, pfad: &str, abo_id: u64) {
        if let Some(mut eintraege) = self.inner.abos.get_mut(pfad) {
            eintraege.retain(|e| e.abo_id != abo_id);
        }
        debug!(pfad, abo_id, "Abo gekuendigt");
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn wert_setzen(&self, pfad: &str, wert: Value) -> SignalingResult<()> {
        self.inner.werte.insert(pfad.to_string(), wert.clone());
        debug!(pfad, "Wert gesetzt");
        self.benachrichtigen(pfad, &wert);
        Ok(())
    }

    async fn felder_aktualisieren(
        &self,
        pfad: &str,
        felder: Map<String, Value>,
    ) -> SignalingResult<()> {
        let mut basis = match self.inner.werte.get(pfad) {
            Some(wert) => wert.as_object().cloned().unwrap_or_default(),
            None => Map::new(),
        };
        for (feld, wert) in felder {
            basis.insert(feld, wert);
        }
        let neuer_stand = Value::Object(basis);
        self.inner
            .werte
            .insert(pfad.to_string(), neuer_stand.clone());
        debug!(pfad, "Felder aktualisiert");
        self.benachrichtigen(pfad, &neuer_stand);
        Ok(())
    }

    async fn lesen(&self, pfad: &str) -> SignalingResult<Option<Value>> {
        Ok(self.inner.werte.get(pfad).map(|wert| wert.clone()))
    }

    async fn abonnieren(&self, pfad: &str) -> SignalingResult<StoreAbo> {
        let (tx, rx) = mpsc::channel(ABO_QUEUE_GROESSE);
        let abo_id = self.inner.naechste_abo_id.fetch_add(1, Ordering::Relaxed);

        // Registry-Eintrag zuerst sperren, dann den initialen Stand
        // zustellen: so geht zwischen Snapshot und Registrierung keine
        // Aenderung verloren
        {
            let mut eintraege = self.inner.abos.entry(pfad.to_string()).or_default();
            if let Some(wert) = self.inner.werte.get(pfad) {
                let _ = tx.try_send(wert.clone());
            }
            eintraege.push(AboEintrag { abo_id, tx });
        }

        debug!(pfad, abo_id, "Abo registriert");

        let store = self.clone();
        let abo_pfad = pfad.to_string();
        Ok(StoreAbo::neu(rx, move || {
            store.abbestellen(&abo_pfad, abo_id)
        }))
    }
}
