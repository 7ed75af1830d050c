//! palaver-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Palaver-Crates gemeinsam genutzt werden: die Chat-Nachricht
//! mit ihrer Herkunfts-Klassifikation, die Beobachter-Schnittstelle fuer
//! empfangene Ereignisse und den zentralen Fehler-Enum.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{PalaverError, Result};
pub use event::{ChatBeobachter, ChatEreignis, SitzungsEnde};
pub use types::{Herkunft, Nachricht};
