//! Raum-Broadcaster – verteilt Wire-Zeilen an alle verbundenen Clients
//!
//! Der Broadcaster verwaltet die Send-Queues aller angemeldeten Clients,
//! indiziert nach Peer-Adresse (Benutzernamen sind nicht zwingend
//! eindeutig). Senden ist nicht-blockierend: ist die Queue eines
//! Clients voll, wird die Zeile fuer ihn verworfen.

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Client
pub(crate) const SENDE_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines angemeldeten Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub adresse: SocketAddr,
    pub name: String,
    pub tx: mpsc::Sender<String>,
}

impl ClientSender {
    /// Reiht eine Wire-Zeile nicht-blockierend ein
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, zeile: String) -> bool {
        match self.tx.try_send(zeile) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    peer = %self.adresse,
                    name = %self.name,
                    "Send-Queue voll – Zeile verworfen"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(
                    peer = %self.adresse,
                    "Send-Queue geschlossen (Client getrennt)"
                );
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RaumBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Broadcaster des einen Chat-Raums
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct RaumBroadcaster {
    inner: Arc<RaumBroadcasterInner>,
}

struct RaumBroadcasterInner {
    /// Client-Sender, indiziert nach Peer-Adresse
    clients: DashMap<SocketAddr, ClientSender>,
}

impl RaumBroadcaster {
    /// Erstellt einen neuen RaumBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(RaumBroadcasterInner {
                clients: DashMap::new(),
            }),
        }
    }

    /// Registriert einen angemeldeten Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die Verbindungs-Schleife liest aus dieser Queue und sendet via TCP.
    pub fn client_registrieren(
        &self,
        adresse: SocketAddr,
        name: &str,
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let sender = ClientSender {
            adresse,
            name: name.to_string(),
            tx,
        };
        self.inner.clients.insert(adresse, sender);
        tracing::debug!(peer = %adresse, name = name, "Client im Broadcaster registriert");
        rx
    }

    /// Aendert den Anzeigenamen eines registrierten Clients
    pub fn client_umbenennen(&self, adresse: &SocketAddr, neuer_name: &str) {
        if let Some(mut eintrag) = self.inner.clients.get_mut(adresse) {
            eintrag.name = neuer_name.to_string();
        }
    }

    /// Entfernt einen Client aus dem Broadcaster
    pub fn client_entfernen(&self, adresse: &SocketAddr) {
        self.inner.clients.remove(adresse);
        tracing::debug!(peer = %adresse, "Client aus Broadcaster entfernt");
    }

    /// Sendet eine Wire-Zeile an alle angemeldeten Clients
    ///
    /// Gibt die Anzahl der erfolgreichen Einreihungen zurueck.
    pub fn an_alle_senden(&self, zeile: &str) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|eintrag| {
            if eintrag.value().senden(zeile.to_string()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Sendet eine Wire-Zeile an alle angemeldeten Clients ausser einem
    pub fn an_alle_ausser_senden(&self, ausgeschlossen: &SocketAddr, zeile: &str) -> usize {
        let mut gesendet = 0;
        self.inner.clients.iter().for_each(|eintrag| {
            if eintrag.key() == ausgeschlossen {
                return;
            }
            if eintrag.value().senden(zeile.to_string()) {
                gesendet += 1;
            }
        });
        gesendet
    }

    /// Gibt die Anzahl der angemeldeten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Peer-Adresse registriert ist
    pub fn ist_registriert(&self, adresse: &SocketAddr) -> bool {
        self.inner.clients.contains_key(adresse)
    }
}

impl Default for RaumBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
