//! palaver-client – Verbindungs-Kern des Chatclients
//!
//! Dieser Crate implementiert die beiden Kern-Komponenten des Clients:
//! den Verbindungs-Manager und den Rahmen-Dekoder.
//!
//! ## Architektur
//!
//! ```text
//! ChatVerbindung (Verbindungs-Manager)
//!     |  State Machine: Bereit -> Verbindet -> Offen -> Geschlossen
//!     |  verbinden / anmelden / senden / schliessen
//!     |  serialisierte Schreibzugriffe (ein Schreiber zur Zeit)
//!     |
//!     +-- Sitzung          – Benutzername + Lebenszyklus-Phase
//!     |
//!     v
//! RahmenDekoder (eigener tokio-Task pro Verbindung)
//!     |  liest Rahmen-Chunks, dekodiert UTF-8, trennt am ersten ':'
//!     |  klassifiziert Herkunft (Eigen/Fremd) gegen die Sitzung
//!     v
//! ChatBeobachter (extern registriert, schwach referenziert)
//!     nachricht_empfangen / sitzung_beendet
//! ```
//!
//! Lese- und Schreibseite teilen sich nur die `Sitzung`; der Dekoder
//! laeuft als einziger Leser, Schreibzugriffe laufen durch einen Mutex.

pub mod beobachter;
pub mod config;
pub mod dekoder;
pub mod error;
pub mod sitzung;
pub mod verbindung;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use beobachter::KanalBeobachter;
pub use config::ClientKonfiguration;
pub use error::{VerbindungsFehler, VerbindungsResult};
pub use sitzung::{Sitzung, Verbindungsphase};
pub use verbindung::ChatVerbindung;
