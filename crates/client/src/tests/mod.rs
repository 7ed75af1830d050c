//! Service-Tests fuer den Verbindungs-Kern
//!
//! Die Tests fahren echte TCP-Verbindungen gegen einen Loopback-Listener
//! und pruefen Lebenszyklus, Wire-Format und Ereignis-Zustellung.

mod verbindungs_tests;
