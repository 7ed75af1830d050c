//! End-to-End-Tests fuer ChatVerbindung und RahmenDekoder

use std::time::Duration;

use palaver_core::{ChatEreignis, Herkunft, SitzungsEnde};
use palaver_protocol::RahmenModus;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use crate::{
    ChatVerbindung, ClientKonfiguration, KanalBeobachter, VerbindungsFehler, Verbindungsphase,
};

/// Bindet einen Loopback-Listener und liefert die passende Konfiguration
async fn test_listener(modus: RahmenModus) -> (TcpListener, ClientKonfiguration) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Listener muss binden");
    let port = listener.local_addr().expect("local_addr").port();
    let konfig = ClientKonfiguration {
        host: "127.0.0.1".into(),
        port,
        modus,
        ..Default::default()
    };
    (listener, konfig)
}

/// Verbindet Client und Test-Server miteinander
async fn verbunden(
    listener: &TcpListener,
    verbindung: &ChatVerbindung,
) -> TcpStream {
    let (ergebnis, accept) = tokio::join!(verbindung.verbinden(), listener.accept());
    ergebnis.expect("verbinden muss gelingen");
    let (stream, _) = accept.expect("accept muss gelingen");
    stream
}

/// Wartet mit Timeout auf das naechste Beobachter-Ereignis
async fn naechstes_ereignis(rx: &mut UnboundedReceiver<ChatEreignis>) -> ChatEreignis {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("Timeout beim Warten auf Ereignis")
        .expect("Ereignis-Kanal geschlossen")
}

/// Liest genau einen Chunk von der Server-Seite
async fn server_chunk(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = vec![0u8; 256];
    let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("Timeout beim Server-Read")
        .expect("Server-Read fehlgeschlagen");
    buf.truncate(n);
    buf
}

// ---------------------------------------------------------------------------
// Vorbedingungen & Lebenszyklus
// ---------------------------------------------------------------------------

#[tokio::test]
async fn senden_vor_verbinden_ist_nicht_offen() {
    let verbindung = ChatVerbindung::neu(ClientKonfiguration::default());

    assert!(matches!(
        verbindung.senden("hi").await,
        Err(VerbindungsFehler::NichtOffen)
    ));
    assert!(matches!(
        verbindung.anmelden("alice").await,
        Err(VerbindungsFehler::NichtOffen)
    ));
    assert_eq!(verbindung.phase(), Verbindungsphase::Bereit);
}

#[tokio::test]
async fn verbinden_fehlgeschlagen_faellt_auf_bereit_zurueck() {
    // Port reservieren und sofort wieder freigeben: dort lauscht niemand
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let konfig = ClientKonfiguration {
        host: "127.0.0.1".into(),
        port,
        ..Default::default()
    };
    let verbindung = ChatVerbindung::neu(konfig);

    assert!(matches!(
        verbindung.verbinden().await,
        Err(VerbindungsFehler::VerbindungFehlgeschlagen(_))
    ));
    // Aufrufer darf es erneut versuchen
    assert_eq!(verbindung.phase(), Verbindungsphase::Bereit);
}

#[tokio::test]
async fn doppeltes_verbinden_ist_falsche_phase() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let _server = verbunden(&listener, &verbindung).await;

    match verbindung.verbinden().await {
        Err(VerbindungsFehler::FalschePhase { erwartet, ist }) => {
            assert_eq!(erwartet, Verbindungsphase::Bereit);
            assert_eq!(ist, Verbindungsphase::Offen);
        }
        andere => panic!("FalschePhase erwartet, erhalten: {andere:?}"),
    }
}

#[tokio::test]
async fn schliessen_ist_idempotent() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let _server = verbunden(&listener, &verbindung).await;

    verbindung.schliessen().await;
    verbindung.schliessen().await;
    assert_eq!(verbindung.phase(), Verbindungsphase::Geschlossen);

    // Genau EIN Ende-Ereignis, kein doppelter Abbau
    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::SitzungBeendet(grund) => {
            assert_eq!(grund, SitzungsEnde::LokalGeschlossen);
        }
        andere => panic!("SitzungBeendet erwartet, erhalten: {andere:?}"),
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ereignisse.try_recv().is_err(), "kein zweites Ereignis");

    // Geschlossene Sitzung ist verbraucht
    assert!(matches!(
        verbindung.senden("hi").await,
        Err(VerbindungsFehler::NichtOffen)
    ));
    assert!(matches!(
        verbindung.verbinden().await,
        Err(VerbindungsFehler::FalschePhase { .. })
    ));
}

#[tokio::test]
async fn remote_trennung_schliesst_sitzung() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let server = verbunden(&listener, &verbindung).await;

    // Gegenseite legt auf
    drop(server);

    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::SitzungBeendet(grund) => {
            assert_eq!(grund, SitzungsEnde::RemoteGetrennt);
        }
        andere => panic!("SitzungBeendet erwartet, erhalten: {andere:?}"),
    }
    assert_eq!(verbindung.phase(), Verbindungsphase::Geschlossen);
    assert!(matches!(
        verbindung.senden("hi").await,
        Err(VerbindungsFehler::NichtOffen)
    ));
}

// ---------------------------------------------------------------------------
// Wire-Format
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anmelden_sendet_iam_rahmen() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let mut server = verbunden(&listener, &verbindung).await;

    verbindung.anmelden("alice").await.unwrap();
    assert_eq!(verbindung.benutzername(), "alice");
    assert_eq!(server_chunk(&mut server).await, b"iam:alice");
}

#[tokio::test]
async fn senden_produziert_msg_rahmen() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let mut server = verbunden(&listener, &verbindung).await;

    verbindung.anmelden("alice").await.unwrap();
    assert_eq!(server_chunk(&mut server).await, b"iam:alice");

    verbindung.senden("hi").await.unwrap();
    assert_eq!(server_chunk(&mut server).await, b"msg:hi");
}

// ---------------------------------------------------------------------------
// Empfang & Herkunfts-Klassifikation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empfang_klassifiziert_herkunft() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let mut server = verbunden(&listener, &verbindung).await;

    verbindung.anmelden("alice").await.unwrap();
    assert_eq!(server_chunk(&mut server).await, b"iam:alice");

    // Fremde Nachricht
    server.write_all(b"bob:yo").await.unwrap();
    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::Nachricht(n) => {
            assert_eq!(n.absender, "bob");
            assert_eq!(n.inhalt, "yo");
            assert_eq!(n.herkunft, Herkunft::Fremd);
        }
        andere => panic!("Nachricht erwartet, erhalten: {andere:?}"),
    }

    // Server-Echo der eigenen Nachricht: Doppelpunkte im Inhalt bleiben erhalten
    server.write_all(b"alice:hallo:welt").await.unwrap();
    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::Nachricht(n) => {
            assert_eq!(n.absender, "alice");
            assert_eq!(n.inhalt, "hallo:welt");
            assert_eq!(n.herkunft, Herkunft::Eigen);
        }
        andere => panic!("Nachricht erwartet, erhalten: {andere:?}"),
    }
}

#[tokio::test]
async fn rahmen_ohne_trennzeichen_wird_verworfen() {
    let (listener, konfig) = test_listener(RahmenModus::Zeile).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let mut server = verbunden(&listener, &verbindung).await;

    // Erste Zeile ist missgebildet und muss still verworfen werden
    server.write_all(b"nurtext\nbob:ok\n").await.unwrap();

    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::Nachricht(n) => {
            assert_eq!(n.absender, "bob");
            assert_eq!(n.inhalt, "ok");
        }
        andere => panic!("Nachricht erwartet, erhalten: {andere:?}"),
    }
}

#[tokio::test]
async fn zeile_modus_puffert_fragmentierte_rahmen() {
    let (listener, konfig) = test_listener(RahmenModus::Zeile).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let mut server = verbunden(&listener, &verbindung).await;

    // Rahmen in zwei Haelften senden; der Codec muss sie zusammensetzen
    server.write_all(b"ali").await.unwrap();
    server.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    server.write_all(b"ce:hi\n").await.unwrap();

    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::Nachricht(n) => {
            assert_eq!(n.absender, "alice");
            assert_eq!(n.inhalt, "hi");
        }
        andere => panic!("Nachricht erwartet, erhalten: {andere:?}"),
    }
}

#[tokio::test]
async fn lesefehler_meldet_ende_und_schliesst() {
    let (listener, konfig) = test_listener(RahmenModus::Block).await;
    let verbindung = ChatVerbindung::neu(konfig);
    let (beobachter, mut ereignisse) = KanalBeobachter::neu();
    verbindung.beobachter_registrieren(&beobachter);
    let server = verbunden(&listener, &verbindung).await;

    // Harter Reset statt sauberem FIN loest einen Lesefehler aus
    server.set_linger(Some(Duration::from_secs(0))).unwrap();
    drop(server);

    match naechstes_ereignis(&mut ereignisse).await {
        ChatEreignis::SitzungBeendet(grund) => {
            assert!(
                matches!(
                    grund,
                    SitzungsEnde::LeseFehler(_) | SitzungsEnde::RemoteGetrennt
                ),
                "Ende-Ereignis erwartet, erhalten: {grund:?}"
            );
        }
        andere => panic!("SitzungBeendet erwartet, erhalten: {andere:?}"),
    }
    assert_eq!(verbindung.phase(), Verbindungsphase::Geschlossen);
    assert!(matches!(
        verbindung.senden("hi").await,
        Err(VerbindungsFehler::NichtOffen)
    ));
}
