//! Service-Tests fuer das Chat-Relay
//!
//! Die Tests fahren rohe TCP-Clients gegen einen Relay auf einem
//! Loopback-Listener und pruefen Registrierung, Verteilung und
//! Raum-Mitteilungen auf Wire-Ebene.
