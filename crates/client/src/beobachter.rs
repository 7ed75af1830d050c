//! Beobachter-Hilfen
//!
//! `KanalBeobachter` ist die Standard-Bruecke zwischen dem Lese-Task und
//! einem Konsumenten in anderem Kontext (UI-Thread, Test): Ereignisse
//! werden in eine unbegrenzte tokio-Queue weitergereicht statt direkt
//! verarbeitet.

use palaver_core::{ChatBeobachter, ChatEreignis, Nachricht, SitzungsEnde};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Beobachter der alle Ereignisse in einen tokio-Kanal weiterleitet
///
/// Der Aufrufer haelt den `Arc` (der Verbindungs-Kern referenziert nur
/// schwach) und konsumiert die Ereignisse aus dem Receiver.
pub struct KanalBeobachter {
    tx: mpsc::UnboundedSender<ChatEreignis>,
}

impl KanalBeobachter {
    /// Erstellt das Beobachter/Empfaenger-Paar
    pub fn neu() -> (Arc<Self>, mpsc::UnboundedReceiver<ChatEreignis>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl ChatBeobachter for KanalBeobachter {
    fn nachricht_empfangen(&self, nachricht: Nachricht) {
        // Empfaenger weg = Konsument nicht mehr interessiert
        let _ = self.tx.send(ChatEreignis::Nachricht(nachricht));
    }

    fn sitzung_beendet(&self, grund: SitzungsEnde) {
        let _ = self.tx.send(ChatEreignis::SitzungBeendet(grund));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::Herkunft;

    #[tokio::test]
    async fn ereignisse_laufen_durch_den_kanal() {
        let (beobachter, mut rx) = KanalBeobachter::neu();

        beobachter.nachricht_empfangen(Nachricht::neu("bob", "yo", Herkunft::Fremd));
        beobachter.sitzung_beendet(SitzungsEnde::RemoteGetrennt);

        match rx.recv().await.expect("Ereignis erwartet") {
            ChatEreignis::Nachricht(n) => {
                assert_eq!(n.absender, "bob");
                assert_eq!(n.inhalt, "yo");
            }
            andere => panic!("Nachricht erwartet, erhalten: {andere:?}"),
        }
        match rx.recv().await.expect("Ereignis erwartet") {
            ChatEreignis::SitzungBeendet(grund) => {
                assert_eq!(grund, SitzungsEnde::RemoteGetrennt);
            }
            andere => panic!("SitzungBeendet erwartet, erhalten: {andere:?}"),
        }
    }

    #[tokio::test]
    async fn geschlossener_empfaenger_verwirft_still() {
        let (beobachter, rx) = KanalBeobachter::neu();
        drop(rx);

        // Darf nicht panicken
        beobachter.nachricht_empfangen(Nachricht::neu("bob", "yo", Herkunft::Fremd));
    }
}
