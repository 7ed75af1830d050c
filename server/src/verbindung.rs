//! Client-Verbindung – verwaltet eine einzelne TCP-Verbindung
//!
//! Jede akzeptierte Verbindung bekommt eine `ClientVerbindung` in einem
//! eigenen tokio-Task. Der Ablauf folgt dem Protokoll:
//!
//! ```text
//! iam:<name>   registriert den Client im Raum (erneut = Umbenennung)
//! msg:<text>   wird als <name>:<text> an ALLE verteilt (auch den Absender)
//! ```
//!
//! Missgebildete Rahmen, unbekannte Verben und `msg` vor `iam` werden
//! nachsichtig verworfen. Beitritt, Austritt und Shutdown meldet der
//! Server als Rahmen des reservierten Absenders [`SERVER_ABSENDER`].

use futures_util::{SinkExt, StreamExt};
use palaver_protocol::{
    frame::{TRENNZEICHEN, VERB_ANMELDUNG, VERB_CHAT},
    RahmenCodec, RelayRahmen,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::broadcast::{RaumBroadcaster, SENDE_QUEUE_GROESSE};
use crate::config::ServerConfig;

/// Reservierter Absendername fuer Server-Mitteilungen
pub const SERVER_ABSENDER: &str = "server";

type Schreiber = FramedWrite<OwnedWriteHalf, RahmenCodec>;

// ---------------------------------------------------------------------------
// ClientVerbindung
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne TCP-Verbindung
///
/// Liest Rahmen via `RahmenCodec`, verteilt Chat-Zeilen ueber den
/// [`RaumBroadcaster`] und sendet eingereihte Zeilen zurueck. Laeuft in
/// einem eigenen tokio-Task.
pub struct ClientVerbindung {
    broadcaster: RaumBroadcaster,
    config: Arc<ServerConfig>,
    peer_addr: SocketAddr,
}

impl ClientVerbindung {
    /// Erstellt eine neue ClientVerbindung
    pub fn neu(
        broadcaster: RaumBroadcaster,
        config: Arc<ServerConfig>,
        peer_addr: SocketAddr,
    ) -> Self {
        Self {
            broadcaster,
            config,
            peer_addr,
        }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis die Verbindung getrennt wird oder ein Shutdown-Signal
    /// eingeht.
    pub async fn verarbeiten(
        self,
        stream: TcpStream,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let peer_addr = self.peer_addr;
        tracing::info!(peer = %peer_addr, "Neue Verbindung");

        let codec = RahmenCodec::mit_max_groesse(
            self.config.protokoll.modus,
            self.config.protokoll.max_rahmen_bytes,
        );
        let (lese_haelfte, schreib_haelfte) = stream.into_split();
        let mut leser: FramedRead<OwnedReadHalf, RahmenCodec> =
            FramedRead::new(lese_haelfte, codec.clone());
        let mut schreiber: Schreiber = FramedWrite::new(schreib_haelfte, codec);

        // Ausgehende Zeilen-Queue (Broadcaster -> TCP)
        // Wird nach der Anmeldung mit der Broadcaster-Queue verknuepft
        let (sende_tx, mut sende_rx) = mpsc::channel::<String>(SENDE_QUEUE_GROESSE);

        // Angemeldeter Name; None bis zum ersten gueltigen `iam`
        let mut name: Option<String> = None;

        loop {
            tokio::select! {
                // Eingehender Rahmen vom Client
                rahmen = leser.next() => match rahmen {
                    Some(Ok(bytes)) => {
                        self.rahmen_behandeln(&bytes, &mut name, &sende_tx, &mut schreiber)
                            .await;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Rahmen-Lesefehler");
                        break;
                    }
                    None => {
                        tracing::info!(peer = %peer_addr, "Verbindung vom Client getrennt");
                        break;
                    }
                },

                // Ausgehende Zeile aus dem Broadcaster
                Some(zeile) = sende_rx.recv() => {
                    if let Err(e) = schreiber.send(zeile).await {
                        tracing::warn!(peer = %peer_addr, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(peer = %peer_addr, "Shutdown-Signal – Verbindung wird getrennt");
                        let abschied =
                            RelayRahmen::neu(SERVER_ABSENDER, "Server wird beendet").kodieren();
                        let _ = schreiber.send(abschied).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        if let Some(n) = name {
            self.broadcaster.client_entfernen(&peer_addr);
            let abschied =
                RelayRahmen::neu(SERVER_ABSENDER, format!("{n} hat den Raum verlassen"))
                    .kodieren();
            self.broadcaster.an_alle_senden(&abschied);
        }

        tracing::info!(peer = %peer_addr, "Verbindungs-Task beendet");
    }

    /// Dekodiert einen Rahmen-Chunk und fuehrt das Verb aus
    async fn rahmen_behandeln(
        &self,
        bytes: &[u8],
        name: &mut Option<String>,
        sende_tx: &mpsc::Sender<String>,
        schreiber: &mut Schreiber,
    ) {
        let Ok(text) = std::str::from_utf8(bytes) else {
            tracing::debug!(peer = %self.peer_addr, "Rahmen mit ungueltigem UTF-8 verworfen");
            return;
        };
        let Some((verb, inhalt)) = text.split_once(TRENNZEICHEN) else {
            tracing::debug!(peer = %self.peer_addr, rahmen = text, "Rahmen ohne Trennzeichen verworfen");
            return;
        };

        match verb {
            VERB_ANMELDUNG => {
                self.anmeldung_behandeln(inhalt, name, sende_tx, schreiber).await;
            }
            VERB_CHAT => self.chat_behandeln(inhalt, name),
            _ => {
                tracing::debug!(peer = %self.peer_addr, verb = verb, "Unbekanntes Verb verworfen");
            }
        }
    }

    /// `iam:<name>` – registriert den Client bzw. benennt ihn um
    async fn anmeldung_behandeln(
        &self,
        gewuenschter_name: &str,
        name: &mut Option<String>,
        sende_tx: &mpsc::Sender<String>,
        schreiber: &mut Schreiber,
    ) {
        if gewuenschter_name.is_empty() {
            tracing::debug!(peer = %self.peer_addr, "Anmeldung ohne Namen verworfen");
            return;
        }

        match name {
            Some(alter_name) => {
                tracing::info!(
                    peer = %self.peer_addr,
                    alt = %alter_name,
                    neu = gewuenschter_name,
                    "Client umbenannt"
                );
                self.broadcaster
                    .client_umbenennen(&self.peer_addr, gewuenschter_name);
                *name = Some(gewuenschter_name.to_string());
            }
            None => {
                let mut queue = self
                    .broadcaster
                    .client_registrieren(self.peer_addr, gewuenschter_name);
                // Broadcaster-Queue in die Verbindungs-Schleife weiterleiten
                let sende_tx = sende_tx.clone();
                tokio::spawn(async move {
                    while let Some(zeile) = queue.recv().await {
                        if sende_tx.send(zeile).await.is_err() {
                            break;
                        }
                    }
                });
                *name = Some(gewuenschter_name.to_string());
                tracing::info!(peer = %self.peer_addr, name = gewuenschter_name, "Client angemeldet");

                let beitritt = RelayRahmen::neu(
                    SERVER_ABSENDER,
                    format!("{gewuenschter_name} ist beigetreten"),
                )
                .kodieren();
                self.broadcaster
                    .an_alle_ausser_senden(&self.peer_addr, &beitritt);

                if let Some(willkommen) = &self.config.server.willkommen {
                    let gruss =
                        RelayRahmen::neu(SERVER_ABSENDER, willkommen.as_str()).kodieren();
                    if let Err(e) = schreiber.send(gruss).await {
                        tracing::warn!(peer = %self.peer_addr, fehler = %e, "Willkommen-Senden fehlgeschlagen");
                    }
                }
            }
        }
    }

    /// `msg:<text>` – verteilt die Zeile an alle angemeldeten Clients
    ///
    /// Das Echo geht auch an den Absender zurueck; dessen Dekoder
    /// klassifiziert es anhand des Namens als eigene Nachricht.
    fn chat_behandeln(&self, text: &str, name: &Option<String>) {
        match name {
            Some(n) => {
                let zeile = RelayRahmen::neu(n.as_str(), text).kodieren();
                let empfaenger = self.broadcaster.an_alle_senden(&zeile);
                tracing::trace!(
                    peer = %self.peer_addr,
                    empfaenger = empfaenger,
                    "Chat-Zeile verteilt"
                );
            }
            None => {
                tracing::debug!(peer = %self.peer_addr, "msg vor iam verworfen");
            }
        }
    }
}
