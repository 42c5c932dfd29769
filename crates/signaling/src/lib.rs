//! fernruf-signaling - Anruf-Signalisierung
//!
//! Dieser Crate verwaltet Anruf-Sitzungen in einem pfad-adressierten
//! JSON-Store. Der Medienpfad laeuft davon unabhaengig; hier wird nur
//! ausgehandelt, wer wen unter welcher Adresse erreicht.
//!
//! ## Ablauf
//!
//! ```text
//! SignalingClient (Anrufer)              SignalingClient (Angerufener)
//!     |                                       |
//!     | anruf_erstellen                       |
//!     +--> anrufe/<callId> = Sitzung -------->| abonnieren
//!     |                                       | (Schnappschuss, dann Updates)
//!     | status_aktualisieren                  |
//!     +--> status = RINGING / CONNECTED ----->|
//!     |                                       |
//!     | anruf_beenden                         |
//!     +--> status = ENDED ------------------->|
//! ```
//!
//! Der `SignalStore`-Trait abstrahiert den Transport; `MemoryStore` ist
//! die mitgelieferte In-Memory-Implementierung.

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

// Bequeme Re-Exporte
pub use client::{CallAbo, SignalingClient};
pub use error::{SignalingError, SignalingResult};
pub use memory::MemoryStore;
pub use store::{sitzungs_pfad, SignalStore, StoreAbo};
