//! Fehlertypen fuer den Verbindungs-Kern

use crate::sitzung::Verbindungsphase;
use thiserror::Error;

/// Fehler die bei Verbindungs-Operationen auftreten koennen
///
/// Transportfehler (`VerbindungFehlgeschlagen`, `SendenFehlgeschlagen`)
/// und Vorbedingungsverletzungen (`NichtOffen`, `FalschePhase`) sind
/// bewusst getrennte Varianten: erstere kann der Aufrufer durch einen
/// neuen Versuch behandeln, letztere sind Programmierfehler.
#[derive(Debug, Error)]
pub enum VerbindungsFehler {
    /// TCP-Verbindungsaufbau fehlgeschlagen
    #[error("Verbindungsaufbau fehlgeschlagen: {0}")]
    VerbindungFehlgeschlagen(#[source] std::io::Error),

    /// Schreiboperation ausserhalb der Phase `Offen`
    #[error("Verbindung ist nicht offen")]
    NichtOffen,

    /// Transportfehler beim Senden; die Sitzung bleibt offen
    #[error("Senden fehlgeschlagen: {0}")]
    SendenFehlgeschlagen(#[source] std::io::Error),

    /// Operation in einer Phase aufgerufen in der sie nicht erlaubt ist
    /// (z.B. `verbinden` auf einer bereits benutzten Sitzung)
    #[error("Falsche Phase: erwartet {erwartet:?}, ist {ist:?}")]
    FalschePhase {
        erwartet: Verbindungsphase,
        ist: Verbindungsphase,
    },
}

/// Result-Typ fuer Verbindungs-Operationen
pub type VerbindungsResult<T> = Result<T, VerbindungsFehler>;
