//! Verbindungs-Manager – besitzt Socket, Sitzung und Lebenszyklus
//!
//! Die `ChatVerbindung` kapselt eine TCP-Verbindung zum Chat-Server.
//! Sie faehrt die State Machine `Bereit -> Verbindet -> Offen ->
//! Geschlossen`, kodiert ausgehende Rahmen und startet pro Verbindung
//! einen Lese-Task mit dem [`RahmenDekoder`](crate::dekoder).
//!
//! ## Schreib-Disziplin
//! Alle Schreibzugriffe laufen durch einen tokio-Mutex um die
//! Schreib-Haelfte: ein Schreiber zur Zeit, keine verschachtelten
//! Rahmen. Ausgehende Nachrichten werden nicht gepuffert – ein Senden
//! ausserhalb der Phase `Offen` schlaegt sofort fehl.

use futures_util::SinkExt;
use palaver_core::ChatBeobachter;
use palaver_protocol::{AusgehenderRahmen, RahmenCodec};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::config::ClientKonfiguration;
use crate::dekoder::RahmenDekoder;
use crate::error::{VerbindungsFehler, VerbindungsResult};
use crate::sitzung::{Sitzung, Verbindungsphase};

/// Schreib-Haelfte mit Codec
pub(crate) type Schreiber = FramedWrite<OwnedWriteHalf, RahmenCodec>;

/// Zwischen Manager und Dekoder geteilte Schreiber-Zelle
pub(crate) type SchreiberZelle = Arc<tokio::sync::Mutex<Option<Schreiber>>>;

/// Zwischen Manager und Dekoder geteilte Beobachter-Registrierung
pub(crate) type BeobachterZelle = Arc<RwLock<Option<Weak<dyn ChatBeobachter>>>>;

// ---------------------------------------------------------------------------
// ChatVerbindung
// ---------------------------------------------------------------------------

/// Eine Chat-Verbindung zum Palaver-Server
///
/// Eine Instanz entspricht genau einer Sitzung: nach `schliessen()`
/// (oder einem Verbindungsabriss) ist sie verbraucht – fuer eine neue
/// Verbindung wird eine neue `ChatVerbindung` konstruiert.
pub struct ChatVerbindung {
    konfig: ClientKonfiguration,
    sitzung: Arc<Sitzung>,
    beobachter: BeobachterZelle,
    schreiber: SchreiberZelle,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl ChatVerbindung {
    /// Erstellt eine neue, noch unverbundene Chat-Verbindung
    pub fn neu(konfig: ClientKonfiguration) -> Self {
        Self {
            konfig,
            sitzung: Arc::new(Sitzung::neu()),
            beobachter: Arc::new(RwLock::new(None)),
            schreiber: Arc::new(tokio::sync::Mutex::new(None)),
            shutdown: Mutex::new(None),
        }
    }

    /// Registriert den Ereignis-Beobachter
    ///
    /// Der Kern haelt nur eine schwache Referenz; der Aufrufer bleibt
    /// Eigentuemer. Eine erneute Registrierung ersetzt die vorherige.
    pub fn beobachter_registrieren<B>(&self, beobachter: &Arc<B>)
    where
        B: ChatBeobachter + 'static,
    {
        let beobachter: Arc<dyn ChatBeobachter> = beobachter.clone();
        let schwach: Weak<dyn ChatBeobachter> = Arc::downgrade(&beobachter);
        *self.beobachter.write() = Some(schwach);
    }

    /// Baut die TCP-Verbindung auf und startet den Lese-Task
    ///
    /// Uebergang `Bereit -> Verbindet -> Offen`. Schlaegt der Aufbau
    /// fehl, faellt die Sitzung auf `Bereit` zurueck – die
    /// Wiederholungs-Strategie liegt beim Aufrufer, dieser Kern
    /// versucht es nie selbst erneut. Jede andere Ausgangsphase ist
    /// eine Vorbedingungsverletzung (`FalschePhase`).
    pub async fn verbinden(&self) -> VerbindungsResult<()> {
        self.sitzung
            .phase_wechseln(Verbindungsphase::Bereit, Verbindungsphase::Verbindet)
            .map_err(|ist| VerbindungsFehler::FalschePhase {
                erwartet: Verbindungsphase::Bereit,
                ist,
            })?;

        let adresse = self.konfig.adresse();
        tracing::info!(adresse = %adresse, "Verbinde mit Chat-Server");

        let stream = match TcpStream::connect(&adresse).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(adresse = %adresse, fehler = %e, "Verbindungsaufbau fehlgeschlagen");
                self.sitzung.phase_setzen(Verbindungsphase::Bereit);
                return Err(VerbindungsFehler::VerbindungFehlgeschlagen(e));
            }
        };

        let codec =
            RahmenCodec::mit_max_groesse(self.konfig.modus, self.konfig.max_rahmen_bytes);
        let (lese_haelfte, schreib_haelfte) = stream.into_split();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        {
            // Schreiber-Lock haelt schliessen() fern, bis Phase und
            // Transport-Handles konsistent installiert sind
            let mut schreiber = self.schreiber.lock().await;
            if let Err(ist) = self
                .sitzung
                .phase_wechseln(Verbindungsphase::Verbindet, Verbindungsphase::Offen)
            {
                tracing::info!("schliessen() kam dem Verbindungsaufbau zuvor");
                return Err(VerbindungsFehler::FalschePhase {
                    erwartet: Verbindungsphase::Verbindet,
                    ist,
                });
            }
            *schreiber = Some(FramedWrite::new(schreib_haelfte, codec.clone()));
            *self.shutdown.lock() = Some(shutdown_tx);
        }

        tracing::info!(adresse = %adresse, "Verbindung offen");

        let dekoder = RahmenDekoder::neu(
            Arc::clone(&self.sitzung),
            Arc::clone(&self.beobachter),
            Arc::clone(&self.schreiber),
        );
        tokio::spawn(dekoder.lauf(FramedRead::new(lese_haelfte, codec), shutdown_rx));

        Ok(())
    }

    /// Tritt dem Chat-Raum unter dem gegebenen Benutzernamen bei
    ///
    /// Speichert den Namen in der Sitzung (Basis der
    /// Herkunfts-Klassifikation) und sendet `iam:<name>`.
    pub async fn anmelden(&self, benutzername: &str) -> VerbindungsResult<()> {
        if !self.sitzung.ist_offen() {
            return Err(VerbindungsFehler::NichtOffen);
        }
        self.sitzung.benutzername_setzen(benutzername);
        tracing::debug!(benutzername = benutzername, "Melde an Chat-Raum an");
        self.rahmen_senden(AusgehenderRahmen::Anmeldung(benutzername.to_string()))
            .await
    }

    /// Sendet eine Chat-Nachricht (`msg:<text>`)
    ///
    /// Ein Transportfehler schliesst die Sitzung NICHT automatisch –
    /// der Aufrufer entscheidet, ob er weitermacht oder schliesst.
    pub async fn senden(&self, text: &str) -> VerbindungsResult<()> {
        if !self.sitzung.ist_offen() {
            return Err(VerbindungsFehler::NichtOffen);
        }
        self.rahmen_senden(AusgehenderRahmen::Chat(text.to_string()))
            .await
    }

    /// Schliesst die Sitzung und gibt den Transport frei
    ///
    /// Aus jeder Phase erlaubt und idempotent: ein zweiter Aufruf ist
    /// ein No-op ohne weitere Abbau-Seiteneffekte. Der Lese-Task
    /// beendet sich und meldet dem Beobachter `LokalGeschlossen`.
    pub async fn schliessen(&self) {
        let mut schreiber = self.schreiber.lock().await;
        let vorher = self.sitzung.schliessen();
        if vorher == Verbindungsphase::Geschlossen {
            return;
        }
        tracing::info!(vorherige_phase = ?vorher, "Sitzung wird geschlossen");

        if let Some(shutdown_tx) = self.shutdown.lock().take() {
            let _ = shutdown_tx.send(true);
        }
        if let Some(mut sink) = schreiber.take() {
            let _ = sink.close().await;
        }
    }

    /// Gibt die aktuelle Lebenszyklus-Phase zurueck
    pub fn phase(&self) -> Verbindungsphase {
        self.sitzung.phase()
    }

    /// Gibt den angemeldeten Benutzernamen zurueck (leer vor `anmelden`)
    pub fn benutzername(&self) -> String {
        self.sitzung.benutzername()
    }

    /// Gibt die verwendete Konfiguration zurueck
    pub fn konfiguration(&self) -> &ClientKonfiguration {
        &self.konfig
    }

    /// Kodiert und sendet einen Rahmen ueber die Schreib-Haelfte
    async fn rahmen_senden(&self, rahmen: AusgehenderRahmen) -> VerbindungsResult<()> {
        let mut schreiber = self.schreiber.lock().await;
        let Some(sink) = schreiber.as_mut() else {
            return Err(VerbindungsFehler::NichtOffen);
        };
        sink.send(rahmen.kodieren())
            .await
            .map_err(VerbindungsFehler::SendenFehlgeschlagen)
    }
}
