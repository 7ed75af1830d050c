//! Client-Konfiguration
//!
//! Wird aus einer TOML-Datei geladen. Alle Felder haben sinnvolle
//! Standardwerte, sodass der Client ohne Konfigurationsdatei
//! lauffaehig ist. Der Benutzername ist bewusst KEIN Teil der
//! Konfiguration – er wird erst beim Anmelden uebergeben.

use palaver_protocol::{RahmenModus, STANDARD_MAX_RAHMEN_BYTES};
use serde::{Deserialize, Serialize};

/// Konfiguration einer Chat-Verbindung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientKonfiguration {
    /// Hostname oder IP des Chat-Servers
    pub host: String,
    /// TCP-Port des Chat-Servers
    pub port: u16,
    /// Maximale Rahmengroesse in Bytes
    pub max_rahmen_bytes: usize,
    /// Framing-Modus ("block" oder "zeile")
    pub modus: RahmenModus,
}

impl Default for ClientKonfiguration {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7878,
            max_rahmen_bytes: STANDARD_MAX_RAHMEN_BYTES,
            modus: RahmenModus::Block,
        }
    }
}

impl ClientKonfiguration {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> palaver_core::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let konfig: Self = toml::from_str(&inhalt).map_err(|e| {
                    palaver_core::PalaverError::konfiguration(format!(
                        "Konfigurationsfehler in '{pfad}': {e}"
                    ))
                })?;
                Ok(konfig)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(palaver_core::PalaverError::konfiguration(format!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            ))),
        }
    }

    /// Gibt die vollstaendige Zieladresse `host:port` zurueck
    pub fn adresse(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
