//! palaver-protocol – Wire-Format des Palaver-Chatprotokolls
//!
//! Das Protokoll ist absichtlich simpel gehalten: Klartext ueber TCP,
//! UTF-8-kodiert, ein Doppelpunkt trennt Verb bzw. Absender vom Rest.
//!
//! ```text
//! Client -> Server, Beitritt:   iam:<benutzername>
//! Client -> Server, Chat:       msg:<text>
//! Server -> Client, Relay:      <absender>:<text>
//! ```
//!
//! Nur der ERSTE Doppelpunkt trennt; der Inhalt darf selbst weitere
//! Doppelpunkte enthalten. Rahmen tragen weder Laengenfeld noch
//! verpflichtenden Terminator – der `RahmenCodec` bietet deshalb zwei
//! Framing-Modi an (siehe [`wire`]).

pub mod frame;
pub mod wire;

pub use frame::{AusgehenderRahmen, RelayRahmen, STANDARD_MAX_RAHMEN_BYTES};
pub use wire::{RahmenCodec, RahmenModus};
