//! Anruf-Signalisierung ueber den SignalStore
//!
//! Der Client legt Sitzungen unter `anrufe/<callId>` ab und merkt sich
//! den zuletzt erstellten Anruf, damit ein Folgeanruf den alten auf
//! ENDED setzen kann. Alle Operationen reichen Store-Fehler an den
//! Aufrufer hoch.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use fernruf_core::{CallId, CallSession, CallStatus, UserId};

use crate::error::{SignalingError, SignalingResult};
use crate::store::{sitzungs_pfad, SignalStore, StoreAbo};

// ---------------------------------------------------------------------------
// SignalingClient
// ---------------------------------------------------------------------------

/// Client fuer Anruf-Sitzungen im SignalStore
pub struct SignalingClient {
    store: Arc<dyn SignalStore>,
    /// Zuletzt von diesem Client erstellter, noch nicht beendeter Anruf
    aktiver_anruf: Mutex<Option<CallId>>,
}

impl SignalingClient {
    pub fn neu(store: Arc<dyn SignalStore>) -> Self {
        Self {
            store,
            aktiver_anruf: Mutex::new(None),
        }
    }

    /// Erstellt eine neue Anruf-Sitzung im Status INITIATED
    ///
    /// Ein noch offener vorheriger Anruf dieses Clients wird dabei
    /// asynchron auf ENDED gesetzt; das Ergebnis dieses Aufraeumens
    /// beeinflusst den neuen Anruf nicht.
    pub async fn anruf_erstellen(
        &self,
        anrufer: UserId,
        angerufener: UserId,
        ip: IpAddr,
        port: u16,
        lokal_port: u16,
    ) -> SignalingResult<CallId> {
        if let Some(vorheriger) = self.aktiver_anruf.lock().take() {
            self.vorherigen_beenden(vorheriger);
        }

        let call_id = CallId::new();
        let sitzung = CallSession::new(
            call_id.clone(),
            anrufer,
            angerufener,
            ip.to_string(),
            port,
            lokal_port,
        );
        let pfad = sitzungs_pfad(&call_id);
        let wert = serde_json::to_value(&sitzung)?;
        self.store.wert_setzen(&pfad, wert).await?;

        *self.aktiver_anruf.lock() = Some(call_id.clone());
        info!(call = %call_id, ziel = %sitzung.ip_address, port, "Anruf erstellt");
        Ok(call_id)
    }

    /// Abonniert die Sitzung; der erste gelieferte Stand ist der
    /// aktuelle Schnappschuss
    pub async fn abonnieren(&self, call_id: &CallId) -> SignalingResult<CallAbo> {
        let abo = self.store.abonnieren(&sitzungs_pfad(call_id)).await?;
        debug!(call = %call_id, "Sitzung abonniert");
        Ok(CallAbo { abo })
    }

    /// Schreibt einen neuen Status in die Sitzung
    ///
    /// Uebergaenge werden nicht geprueft; der Status ist eine offene
    /// Zeichenkette und jede Schreibfolge ist zulaessig.
    pub async fn status_aktualisieren(
        &self,
        call_id: &CallId,
        status: CallStatus,
    ) -> SignalingResult<()> {
        let mut felder = Map::new();
        felder.insert(
            "status".to_string(),
            Value::String(status.as_str().to_string()),
        );
        self.store
            .felder_aktualisieren(&sitzungs_pfad(call_id), felder)
            .await?;
        debug!(call = %call_id, status = %status, "Status aktualisiert");
        Ok(())
    }

    /// Beendet den Anruf: Status ENDED, die Sitzung bleibt im Store stehen
    pub async fn anruf_beenden(&self, call_id: &CallId) -> SignalingResult<()> {
        self.status_aktualisieren(call_id, CallStatus::Ended).await?;

        {
            let mut aktiv = self.aktiver_anruf.lock();
            if aktiv.as_ref() == Some(call_id) {
                *aktiv = None;
            }
        }

        info!(call = %call_id, "Anruf beendet");
        Ok(())
    }

    /// Liest den aktuellen Stand der Sitzung
    pub async fn sitzung_lesen(&self, call_id: &CallId) -> SignalingResult<CallSession> {
        let pfad = sitzungs_pfad(call_id);
        let wert = self
            .store
            .lesen(&pfad)
            .await?
            .ok_or_else(|| SignalingError::NichtGefunden(pfad.clone()))?;
        Ok(serde_json::from_value(wert)?)
    }

    /// Setzt einen liegengebliebenen Anruf asynchron auf ENDED
    fn vorherigen_beenden(&self, call_id: CallId) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let pfad = sitzungs_pfad(&call_id);
            let mut felder = Map::new();
            felder.insert(
                "status".to_string(),
                Value::String(CallStatus::Ended.as_str().to_string()),
            );
            match store.felder_aktualisieren(&pfad, felder).await {
                Ok(()) => debug!(call = %call_id, "Vorherigen Anruf beendet"),
                Err(e) => {
                    warn!(call = %call_id, fehler = %e, "Vorheriger Anruf nicht beendet")
                }
            }
        });
    }
}

// ---------------------------------------------------------------------------
// CallAbo
// ---------------------------------------------------------------------------

/// Abonnement auf eine Anruf-Sitzung
///
/// Liefert zuerst den aktuellen Schnappschuss, danach jeden neuen
/// Stand. `beenden` kuendigt die Registrierung beim Store.
pub struct CallAbo {
    abo: StoreAbo,
}

impl CallAbo {
    /// Naechster Stand der Sitzung
    pub async fn naechste(&mut self) -> SignalingResult<CallSession> {
        let wert = self
            .abo
            .naechster_wert()
            .await
            .ok_or_else(|| SignalingError::abbruch("Store hat das Abonnement beendet"))?;
        Ok(serde_json::from_value(wert)?)
    }

    /// Kuendigt das Abonnement beim Store
    pub fn beenden(self) {
        self.abo.beenden();
    }
}
