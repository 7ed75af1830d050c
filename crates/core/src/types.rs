//! Gemeinsame Domaenen-Typen fuer Palaver
//!
//! Die `Nachricht` ist der zentrale Werttyp des Systems: sie wird
//! ausschliesslich vom Rahmen-Dekoder aus einem erfolgreich geparsten
//! Wire-Rahmen erzeugt und danach nie mehr veraendert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Herkunft einer Nachricht relativ zur lokalen Sitzung
///
/// Wird beim Dekodieren abgeleitet: stimmt der Absender mit dem
/// Benutzernamen der eigenen Sitzung ueberein, ist die Nachricht `Eigen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Herkunft {
    /// Von der lokalen Sitzung verfasst (Server-Echo der eigenen Nachricht)
    Eigen,
    /// Von einem anderen Teilnehmer verfasst
    Fremd,
}

impl Herkunft {
    /// Gibt true zurueck wenn die Nachricht von der lokalen Sitzung stammt
    pub fn ist_eigen(&self) -> bool {
        matches!(self, Self::Eigen)
    }
}

/// Eine empfangene Chat-Nachricht
///
/// Unveraenderlicher Wert: wird nur vom Rahmen-Dekoder konstruiert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nachricht {
    /// Anzeigename des Absenders (nie leer bei wohlgeformten Rahmen)
    pub absender: String,
    /// Textinhalt, darf leer sein und weitere Doppelpunkte enthalten
    pub inhalt: String,
    /// Klassifikation relativ zur lokalen Sitzung
    pub herkunft: Herkunft,
    /// Zeitpunkt des Dekodierens
    pub empfangen_um: DateTime<Utc>,
}

impl Nachricht {
    /// Erstellt eine neue Nachricht mit dem aktuellen Empfangszeitpunkt
    pub fn neu(
        absender: impl Into<String>,
        inhalt: impl Into<String>,
        herkunft: Herkunft,
    ) -> Self {
        Self {
            absender: absender.into(),
            inhalt: inhalt.into(),
            herkunft,
            empfangen_um: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn herkunft_klassifikation() {
        assert!(Herkunft::Eigen.ist_eigen());
        assert!(!Herkunft::Fremd.ist_eigen());
    }

    #[test]
    fn nachricht_konstruktion() {
        let n = Nachricht::neu("alice", "hallo", Herkunft::Fremd);
        assert_eq!(n.absender, "alice");
        assert_eq!(n.inhalt, "hallo");
        assert_eq!(n.herkunft, Herkunft::Fremd);
    }

    #[test]
    fn nachricht_leerer_inhalt_erlaubt() {
        let n = Nachricht::neu("bob", "", Herkunft::Fremd);
        assert!(n.inhalt.is_empty());
    }

    #[test]
    fn nachricht_ist_serde_kompatibel() {
        let n = Nachricht::neu("alice", "a:b:c", Herkunft::Eigen);
        let json = serde_json::to_string(&n).unwrap();
        let n2: Nachricht = serde_json::from_str(&json).unwrap();
        assert_eq!(n2.absender, "alice");
        assert_eq!(n2.inhalt, "a:b:c");
        assert_eq!(n2.herkunft, Herkunft::Eigen);
    }
}
