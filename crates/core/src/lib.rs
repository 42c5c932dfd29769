//! fernruf-core - Gemeinsame Typen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Fernruf-Crates gemeinsam genutzt werden.

pub mod session;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use session::{CallSession, CallStatus};
pub use types::{CallId, UserId};
