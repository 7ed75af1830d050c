//! Beobachter-Schnittstelle fuer Chat-Ereignisse
//!
//! Der Verbindungs-Kern besitzt den Beobachter nicht: er haelt nur eine
//! schwache Referenz (`Weak`) auf die extern registrierte Implementierung
//! und verlaengert deren Lebenszeit nie. Ist der Beobachter bereits
//! freigegeben, werden Ereignisse kommentarlos verworfen.

use crate::types::Nachricht;
use serde::{Deserialize, Serialize};

/// Grund fuer das Ende einer Sitzung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SitzungsEnde {
    /// Die Gegenseite hat die Verbindung getrennt (EOF)
    RemoteGetrennt,
    /// Lesefehler auf dem Transport; die Sitzung wurde automatisch geschlossen
    LeseFehler(String),
    /// Lokales `schliessen()` hat die Sitzung beendet
    LokalGeschlossen,
}

/// Alle Ereignisse die eine Sitzung an ihren Beobachter meldet
///
/// Praktisch fuer Kanal-basierte Beobachter, die Ereignisse in eine
/// Queue weiterreichen statt sie direkt zu verarbeiten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEreignis {
    /// Ein Wire-Rahmen wurde erfolgreich dekodiert
    Nachricht(Nachricht),
    /// Die Sitzung ist beendet; danach folgen keine weiteren Ereignisse
    SitzungBeendet(SitzungsEnde),
}

/// Schnittstelle fuer den extern registrierten Ereignis-Konsumenten
///
/// Beide Methoden werden auf dem Task der Lese-Schleife aufgerufen.
/// Implementierungen die UI- oder anderen single-threaded Zustand
/// anfassen, muessen selbst auf den richtigen Kontext wechseln.
pub trait ChatBeobachter: Send + Sync {
    /// Wird einmal pro erfolgreich dekodiertem Rahmen aufgerufen
    fn nachricht_empfangen(&self, nachricht: Nachricht);

    /// Wird genau einmal beim Ende der Sitzung aufgerufen
    fn sitzung_beendet(&self, grund: SitzungsEnde);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Herkunft;

    #[test]
    fn sitzungs_ende_ist_serde_kompatibel() {
        let ende = SitzungsEnde::LeseFehler("Verbindung zurueckgesetzt".into());
        let json = serde_json::to_string(&ende).unwrap();
        let ende2: SitzungsEnde = serde_json::from_str(&json).unwrap();
        assert_eq!(ende, ende2);
    }

    #[test]
    fn ereignis_ist_serde_kompatibel() {
        let ereignis =
            ChatEreignis::Nachricht(Nachricht::neu("bob", "yo", Herkunft::Fremd));
        let json = serde_json::to_string(&ereignis).unwrap();
        let _: ChatEreignis = serde_json::from_str(&json).unwrap();
    }
}
