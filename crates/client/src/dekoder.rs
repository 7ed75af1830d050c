//! Rahmen-Dekoder – die Lese-Schleife einer Verbindung
//!
//! Pro Verbindung laeuft genau ein Dekoder-Task: er entnimmt dem
//! `FramedRead` Rahmen-Chunks, dekodiert sie als UTF-8, trennt am
//! ersten Doppelpunkt und stellt jede wohlgeformte Nachricht dem
//! Beobachter zu. Missgebildete Chunks (ungueltiges UTF-8, kein
//! Trennzeichen) werden still verworfen – nur ein Debug-Log bleibt.
//!
//! Lesefehler sind dagegen fatal fuer die Sitzung: der Dekoder
//! schliesst sie und meldet dem Beobachter genau ein
//! `sitzung_beendet`-Ereignis.

use futures_util::{SinkExt, StreamExt};
use palaver_core::{ChatBeobachter, Herkunft, Nachricht, SitzungsEnde};
use palaver_protocol::{RahmenCodec, RelayRahmen};
use std::sync::Arc;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;

use crate::sitzung::Sitzung;
use crate::verbindung::{BeobachterZelle, SchreiberZelle};

/// Lese-Haelfte mit Codec
type Leser = FramedRead<OwnedReadHalf, RahmenCodec>;

// ---------------------------------------------------------------------------
// RahmenDekoder
// ---------------------------------------------------------------------------

/// Verwandelt den rohen Byte-Strom in Chat-Ereignisse
pub(crate) struct RahmenDekoder {
    sitzung: Arc<Sitzung>,
    beobachter: BeobachterZelle,
    schreiber: SchreiberZelle,
}

impl RahmenDekoder {
    /// Erstellt einen neuen Dekoder fuer eine offene Verbindung
    pub(crate) fn neu(
        sitzung: Arc<Sitzung>,
        beobachter: BeobachterZelle,
        schreiber: SchreiberZelle,
    ) -> Self {
        Self {
            sitzung,
            beobachter,
            schreiber,
        }
    }

    /// Die Lese-Schleife; laeuft bis EOF, Lesefehler oder Shutdown
    ///
    /// Innerhalb eines Readiness-Ereignisses werden alle bereits
    /// gepufferten Rahmen nacheinander zugestellt, ohne die Kontrolle
    /// an den Aufrufer zurueckzugeben (Drain-Schleife des
    /// `FramedRead`).
    pub(crate) async fn lauf(
        self,
        mut leser: Leser,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let grund = loop {
            tokio::select! {
                rahmen = leser.next() => match rahmen {
                    Some(Ok(bytes)) => self.rahmen_verarbeiten(&bytes),
                    Some(Err(e)) => {
                        tracing::warn!(fehler = %e, "Lesefehler auf dem Transport");
                        break SitzungsEnde::LeseFehler(e.to_string());
                    }
                    None => {
                        tracing::info!("Verbindung von der Gegenseite getrennt");
                        break SitzungsEnde::RemoteGetrennt;
                    }
                },
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break SitzungsEnde::LokalGeschlossen;
                    }
                }
            }
        };

        self.abschliessen(grund).await;
    }

    /// Dekodiert einen Rahmen-Chunk und stellt ihn zu
    fn rahmen_verarbeiten(&self, bytes: &[u8]) {
        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!(laenge = bytes.len(), "Rahmen mit ungueltigem UTF-8 verworfen");
                return;
            }
        };

        let Some(rahmen) = RelayRahmen::parsen(text) else {
            tracing::debug!(rahmen = text, "Rahmen ohne Trennzeichen verworfen");
            return;
        };

        let herkunft = if self.sitzung.ist_eigener_absender(&rahmen.absender) {
            Herkunft::Eigen
        } else {
            Herkunft::Fremd
        };

        tracing::trace!(
            absender = %rahmen.absender,
            herkunft = ?herkunft,
            "Nachricht dekodiert"
        );

        if let Some(beobachter) = self.beobachter_aufloesen() {
            beobachter.nachricht_empfangen(Nachricht::neu(
                rahmen.absender,
                rahmen.inhalt,
                herkunft,
            ));
        }
    }

    /// Schliesst die Sitzung und meldet das Ende genau einmal
    async fn abschliessen(&self, grund: SitzungsEnde) {
        let _ = self.sitzung.schliessen();

        // Transport freigeben falls der Manager es nicht schon getan hat
        if let Some(mut sink) = self.schreiber.lock().await.take() {
            let _ = sink.close().await;
        }

        tracing::info!(grund = ?grund, "Sitzung beendet");
        if let Some(beobachter) = self.beobachter_aufloesen() {
            beobachter.sitzung_beendet(grund);
        }
    }

    /// Loest die schwache Beobachter-Referenz auf, falls noch am Leben
    fn beobachter_aufloesen(&self) -> Option<Arc<dyn ChatBeobachter>> {
        self.beobachter.read().as_ref()?.upgrade()
    }
}
