//! Rahmen-Definitionen fuer das Palaver-Wire-Format
//!
//! Ein Rahmen ist eine logische Protokolleinheit der Form `verb:inhalt`
//! bzw. `absender:inhalt`. Die Kodierung ist UTF-8; nur der erste
//! Doppelpunkt hat Trenn-Funktion.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Verb fuer die Beitritts-Ankuendigung eines Clients
pub const VERB_ANMELDUNG: &str = "iam";

/// Verb fuer eine Chat-Nachricht eines Clients
pub const VERB_CHAT: &str = "msg";

/// Trennzeichen zwischen Verb/Absender und Inhalt
pub const TRENNZEICHEN: char = ':';

/// Standard-maximale Rahmengroesse in Bytes
pub const STANDARD_MAX_RAHMEN_BYTES: usize = 4096;

// ---------------------------------------------------------------------------
// AusgehenderRahmen (Client -> Server)
// ---------------------------------------------------------------------------

/// Rahmen die ein Client an den Server sendet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AusgehenderRahmen {
    /// Beitritts-Ankuendigung mit Benutzername (`iam:<name>`)
    Anmeldung(String),
    /// Chat-Nachricht (`msg:<text>`)
    Chat(String),
}

impl AusgehenderRahmen {
    /// Kodiert den Rahmen als Wire-String (ohne Terminator)
    pub fn kodieren(&self) -> String {
        match self {
            Self::Anmeldung(name) => format!("{VERB_ANMELDUNG}{TRENNZEICHEN}{name}"),
            Self::Chat(text) => format!("{VERB_CHAT}{TRENNZEICHEN}{text}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RelayRahmen (Server -> Client)
// ---------------------------------------------------------------------------

/// Ein vom Server weitergereichter Rahmen der Form `absender:inhalt`
///
/// Der Server kodiert ihn beim Verteilen, der Client parst ihn beim
/// Empfang. Beide Richtungen nutzen dieselbe Form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRahmen {
    /// Anzeigename des Absenders, nie leer
    pub absender: String,
    /// Textinhalt, darf leer sein und weitere Doppelpunkte enthalten
    pub inhalt: String,
}

impl RelayRahmen {
    /// Erstellt einen neuen Relay-Rahmen
    pub fn neu(absender: impl Into<String>, inhalt: impl Into<String>) -> Self {
        Self {
            absender: absender.into(),
            inhalt: inhalt.into(),
        }
    }

    /// Parst eine Wire-Zeile am ersten Doppelpunkt
    ///
    /// Gibt `None` zurueck wenn kein Trennzeichen vorhanden oder der
    /// Absender leer ist – solche Rahmen werden vom Aufrufer verworfen.
    pub fn parsen(zeile: &str) -> Option<Self> {
        let (absender, inhalt) = zeile.split_once(TRENNZEICHEN)?;
        if absender.is_empty() {
            return None;
        }
        Some(Self::neu(absender, inhalt))
    }

    /// Kodiert den Rahmen als Wire-String (ohne Terminator)
    pub fn kodieren(&self) -> String {
        format!("{}{TRENNZEICHEN}{}", self.absender, self.inhalt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
