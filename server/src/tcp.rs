//! TCP-Listener – bindet den Socket, akzeptiert Verbindungen
//!
//! Der `RelayServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task mit einer
//! [`ClientVerbindung`]. Das Client-Limit zaehlt angemeldete Clients;
//! volle Raeume lehnen neue Verbindungen direkt beim Accept ab.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::broadcast::RaumBroadcaster;
use crate::config::ServerConfig;
use crate::verbindung::ClientVerbindung;

/// TCP-Relay-Server fuer den einen Chat-Raum
pub struct RelayServer {
    config: Arc<ServerConfig>,
    broadcaster: RaumBroadcaster,
}

impl RelayServer {
    /// Erstellt einen neuen RelayServer
    pub fn neu(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            broadcaster: RaumBroadcaster::neu(),
        }
    }

    /// Gibt den Raum-Broadcaster zurueck
    pub fn broadcaster(&self) -> &RaumBroadcaster {
        &self.broadcaster
    }

    /// Bindet den konfigurierten Socket und akzeptiert Verbindungen
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> palaver_core::Result<()> {
        let listener = TcpListener::bind(self.config.tcp_bind_adresse()).await?;
        self.verbindungen_annehmen(listener, shutdown_rx).await
    }

    /// Accept-Schleife auf einem bereits gebundenen Listener
    pub async fn verbindungen_annehmen(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> palaver_core::Result<()> {
        let lokale_adresse = listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_adresse,
            name = %self.config.server.name,
            "Chat-Relay gestartet"
        );

        loop {
            tokio::select! {
                // Neue eingehende Verbindung
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            // Client-Limit pruefen
                            let angemeldet = self.broadcaster.client_anzahl() as u32;
                            if angemeldet >= self.config.server.max_clients {
                                tracing::warn!(
                                    peer = %peer_addr,
                                    max = self.config.server.max_clients,
                                    "Server voll – Verbindung abgelehnt"
                                );
                                drop(stream);
                                continue;
                            }

                            tracing::debug!(peer = %peer_addr, "Verbindung akzeptiert");

                            let verbindung = ClientVerbindung::neu(
                                self.broadcaster.clone(),
                                Arc::clone(&self.config),
                                peer_addr,
                            );
                            let shutdown_rx_clone = shutdown_rx.clone();
                            tokio::spawn(async move {
                                verbindung.verarbeiten(stream, shutdown_rx_clone).await;
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                        }
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Chat-Relay: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!("Chat-Relay gestoppt");
        Ok(())
    }
}
