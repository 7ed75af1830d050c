//! Sitzungszustand – Benutzername und Lebenszyklus-Phase
//!
//! Die `Sitzung` ist der einzige zwischen Lese- und Schreibseite
//! geteilte Zustand. Der Verbindungs-Manager besitzt sie exklusiv
//! schreibend; der Rahmen-Dekoder liest nur (Benutzername fuer die
//! Herkunfts-Klassifikation, Phase fuer den Abbau).

use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// Verbindungsphase
// ---------------------------------------------------------------------------

/// Lebenszyklus-Phase der Verbindung
///
/// ```text
/// Bereit --verbinden--> Verbindet --Stream offen--> Offen
///    ^                      |                         |
///    +--- Verbindungsfehler-+      schliessen()/EOF/Lesefehler
///                                                     v
///                                               Geschlossen (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbindungsphase {
    /// Noch keine Verbindung aufgebaut
    Bereit,
    /// TCP-Verbindungsaufbau laeuft
    Verbindet,
    /// Verbindung steht, Rahmen koennen gesendet und empfangen werden
    Offen,
    /// Terminal: eine geschlossene Sitzung wird nie wiederverwendet
    Geschlossen,
}

// ---------------------------------------------------------------------------
// Sitzung
// ---------------------------------------------------------------------------

/// Zustand einer Chat-Sitzung
#[derive(Debug)]
pub struct Sitzung {
    /// Beim Anmelden gesetzt, vorher leer
    benutzername: RwLock<String>,
    phase: RwLock<Verbindungsphase>,
}

impl Sitzung {
    /// Erstellt eine frische Sitzung in Phase `Bereit`
    pub fn neu() -> Self {
        Self {
            benutzername: RwLock::new(String::new()),
            phase: RwLock::new(Verbindungsphase::Bereit),
        }
    }

    /// Gibt die aktuelle Phase zurueck
    pub fn phase(&self) -> Verbindungsphase {
        *self.phase.read()
    }

    /// Setzt die Phase
    pub(crate) fn phase_setzen(&self, phase: Verbindungsphase) {
        *self.phase.write() = phase;
    }

    /// Wechselt atomar von `von` nach `nach`
    ///
    /// Gibt die tatsaechliche Phase als Fehler zurueck wenn sie nicht
    /// `von` ist – etwa wenn `schliessen()` dem Aufbau zuvorkam.
    pub(crate) fn phase_wechseln(
        &self,
        von: Verbindungsphase,
        nach: Verbindungsphase,
    ) -> Result<(), Verbindungsphase> {
        let mut phase = self.phase.write();
        if *phase != von {
            return Err(*phase);
        }
        *phase = nach;
        Ok(())
    }

    /// Markiert die Sitzung als geschlossen und gibt die vorherige Phase
    /// zurueck – war sie bereits `Geschlossen`, ist der Aufruf ein No-op.
    pub(crate) fn schliessen(&self) -> Verbindungsphase {
        let mut phase = self.phase.write();
        std::mem::replace(&mut *phase, Verbindungsphase::Geschlossen)
    }

    /// Gibt true zurueck wenn Rahmen gesendet werden duerfen
    pub fn ist_offen(&self) -> bool {
        self.phase() == Verbindungsphase::Offen
    }

    /// Gibt den angemeldeten Benutzernamen zurueck (leer vor `anmelden`)
    pub fn benutzername(&self) -> String {
        self.benutzername.read().clone()
    }

    /// Speichert den Benutzernamen beim Anmelden
    pub(crate) fn benutzername_setzen(&self, name: &str) {
        *self.benutzername.write() = name.to_string();
    }

    /// Prueft ob ein Absendername die lokale Sitzung bezeichnet
    pub fn ist_eigener_absender(&self, absender: &str) -> bool {
        *self.benutzername.read() == absender
    }
}

impl Default for Sitzung {
    fn default() -> Self {
        Self::neu()
    }
}
