//! Rahmen-Codec fuer TCP-Verbindungen
//!
//! Das Protokoll selbst traegt weder Laengenfeld noch Terminator: per
//! Konvention entspricht ein `write` des Senders einem `read` des
//! Empfaengers. TCP garantiert das nicht, deshalb bietet der Codec zwei
//! Framing-Modi:
//!
//! - [`RahmenModus::Block`]: jeder gelesene Chunk ist genau ein
//!   Rahmen-Versuch (die Ein-Write-ein-Read-Konvention des Protokolls,
//!   zerbricht bei Fragmentierung oder Koaleszenz).
//! - [`RahmenModus::Zeile`]: Rahmen werden durch `\n` begrenzt und
//!   ueber mehrere Reads hinweg gepuffert, bis eine vollstaendige
//!   Zeile vorliegt (gehaertete Variante).
//!
//! Dekodierte Items sind rohe Rahmen-Bytes; UTF-8-Pruefung und das
//! Aufteilen am Doppelpunkt uebernimmt der Empfaenger.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::STANDARD_MAX_RAHMEN_BYTES;

// ---------------------------------------------------------------------------
// RahmenModus
// ---------------------------------------------------------------------------

/// Framing-Modus des Codecs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RahmenModus {
    /// Ein Read-Chunk = ein Rahmen-Versuch
    #[default]
    Block,
    /// Newline-getrennte Rahmen, gepuffert ueber Reads hinweg
    Zeile,
}

// ---------------------------------------------------------------------------
// RahmenCodec
// ---------------------------------------------------------------------------

/// tokio-util Codec fuer Palaver-Rahmen
///
/// Implementiert `Decoder` (Item: rohe Rahmen-Bytes) und
/// `Encoder<String>` (fertig kodierte Wire-Zeile) fuer die Verwendung
/// mit `FramedRead`/`FramedWrite`.
#[derive(Debug, Clone)]
pub struct RahmenCodec {
    modus: RahmenModus,
    /// Maximale erlaubte Rahmengroesse in Bytes
    max_rahmen_bytes: usize,
}

impl RahmenCodec {
    /// Erstellt einen neuen Codec mit Standard-Limit
    pub fn neu(modus: RahmenModus) -> Self {
        Self {
            modus,
            max_rahmen_bytes: STANDARD_MAX_RAHMEN_BYTES,
        }
    }

    /// Erstellt einen Codec mit benutzerdefinierter maximaler Rahmengroesse
    pub fn mit_max_groesse(modus: RahmenModus, max_rahmen_bytes: usize) -> Self {
        Self {
            modus,
            max_rahmen_bytes,
        }
    }

    /// Gibt die konfigurierte maximale Rahmengroesse zurueck
    pub fn max_rahmen_bytes(&self) -> usize {
        self.max_rahmen_bytes
    }

    /// Gibt den konfigurierten Framing-Modus zurueck
    pub fn modus(&self) -> RahmenModus {
        self.modus
    }

    /// Entfernt ein optionales `\r` am Zeilenende (Telnet-Clients)
    fn cr_entfernen(mut zeile: BytesMut) -> BytesMut {
        if zeile.last() == Some(&b'\r') {
            zeile.truncate(zeile.len() - 1);
        }
        zeile
    }
}

impl Default for RahmenCodec {
    fn default() -> Self {
        Self::neu(RahmenModus::Block)
    }
}

// ---------------------------------------------------------------------------
// Decoder-Implementierung
// ---------------------------------------------------------------------------

impl Decoder for RahmenCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.modus {
            RahmenModus::Block => {
                if src.is_empty() {
                    return Ok(None);
                }
                // Den gesamten gelesenen Chunk als einen Rahmen-Versuch
                // entnehmen, begrenzt auf die maximale Rahmengroesse.
                let n = src.len().min(self.max_rahmen_bytes);
                Ok(Some(src.split_to(n)))
            }
            RahmenModus::Zeile => {
                match src.iter().position(|&b| b == b'\n') {
                    Some(pos) => {
                        if pos > self.max_rahmen_bytes {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!(
                                    "Rahmen zu gross: {} Bytes (Maximum: {} Bytes)",
                                    pos, self.max_rahmen_bytes
                                ),
                            ));
                        }
                        let zeile = src.split_to(pos);
                        // Delimiter verbrauchen
                        src.advance(1);
                        Ok(Some(Self::cr_entfernen(zeile)))
                    }
                    None => {
                        if src.len() > self.max_rahmen_bytes {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!(
                                    "Rahmen ohne Terminator ueberschreitet {} Bytes",
                                    self.max_rahmen_bytes
                                ),
                            ));
                        }
                        Ok(None)
                    }
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(rahmen) => Ok(Some(rahmen)),
            None if src.is_empty() => Ok(None),
            // Zeilen-Modus: Restbytes ohne Terminator als letzten Rahmen liefern
            None => Ok(Some(Self::cr_entfernen(src.split()))),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder-Implementierung
// ---------------------------------------------------------------------------

impl Encoder<String> for RahmenCodec {
    type Error = io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_rahmen_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Nachricht zu gross: {} Bytes (Maximum: {} Bytes)",
                    item.len(),
                    self.max_rahmen_bytes
                ),
            ));
        }

        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        if self.modus == RahmenModus::Zeile {
            dst.put_u8(b'\n');
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
