//! palaver-server – Bibliotheks-Root
//!
//! Der Server ist ein simples Ein-Raum-Relay fuer das Palaver-Protokoll:
//!
//! ```text
//! TCP Listener (RelayServer)
//!     |
//!     v
//! ClientVerbindung (pro Verbindung ein Task)
//!     |  iam:<name>  -> Registrierung im Raum
//!     |  msg:<text>  -> <name>:<text> an alle
//!     v
//! RaumBroadcaster – Send-Queues aller angemeldeten Clients
//! ```

pub mod broadcast;
pub mod config;
pub mod tcp;
pub mod verbindung;

#[cfg(test)]
mod tests;

use anyhow::Result;
use config::ServerConfig;
use std::sync::Arc;
use tokio::sync::watch;

// Bequeme Re-Exporte
pub use broadcast::RaumBroadcaster;
pub use tcp::RelayServer;
pub use verbindung::{ClientVerbindung, SERVER_ABSENDER};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet das Relay und laeuft bis zum Shutdown-Signal (Ctrl-C)
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            server_name = %self.config.server.name,
            tcp = %self.config.tcp_bind_adresse(),
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay = RelayServer::neu(Arc::new(self.config));
        let relay_task = tokio::spawn(relay.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        let _ = shutdown_tx.send(true);
        relay_task.await??;

        Ok(())
    }
}
