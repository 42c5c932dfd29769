//! Integration-Tests fuer den UDP-Medienpfad (ohne Audio-Hardware)
//!
//! Stub-Quellen erzeugen selbstpruefende Frames: das erste Sample
//! traegt die Frame-Nummer, der Rest ein aus Seed, Frame-Nummer und
//! Position abgeleitetes Muster. So laesst sich jedes beim Empfaenger
//! angekommene Datagramm einzeln auf Byte-Gleichheit pruefen, auch
//! wenn einzelne Datagramme verloren gehen.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fernruf_audio::capture::FrameSource;
use fernruf_audio::engine::{AudioBackend, CallEngine};
use fernruf_audio::error::AudioResult;
use fernruf_audio::playback::FrameSink;
use parking_lot::Mutex;

const TEST_FRAME: usize = 160;
const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn muster_wert(seed: i16, frame_nr: i16, pos: usize) -> i16 {
    seed.wrapping_add(frame_nr)
        .wrapping_mul(31)
        .wrapping_add(pos as i16)
}

/// Quelle, die selbstpruefende Frames erzeugt
struct MusterQuelle {
    seed: i16,
    frame_nr: i16,
}

impl FrameSource for MusterQuelle {
    fn read_frame(&mut self, frame: &mut [i16]) -> AudioResult<usize> {
        frame[0] = self.frame_nr;
        for (pos, s) in frame.iter_mut().enumerate().skip(1) {
            *s = muster_wert(self.seed, self.frame_nr, pos);
        }
        self.frame_nr = self.frame_nr.wrapping_add(1);
        std::thread::sleep(Duration::from_millis(2));
        Ok(frame.len())
    }

    fn frame_size(&self) -> usize {
        TEST_FRAME
    }
}

struct SammelSenke {
    collected: Arc<Mutex<Vec<i16>>>,
}

impl FrameSink for SammelSenke {
    fn write_frame(&mut self, samples: &[i16]) -> AudioResult<()> {
        self.collected.lock().extend_from_slice(samples);
        Ok(())
    }

    fn frame_size(&self) -> usize {
        TEST_FRAME
    }
}

struct MusterBackend {
    seed: i16,
    collected: Arc<Mutex<Vec<i16>>>,
}

impl MusterBackend {
    fn erstellen(seed: i16) -> Arc<Self> {
        Arc::new(Self {
            seed,
            collected: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn frames_gesammelt(&self) -> usize {
        self.collected.lock().len() / TEST_FRAME
    }
}

impl AudioBackend for MusterBackend {
    fn open_source(&self) -> AudioResult<Box<dyn FrameSource>> {
        Ok(Box::new(MusterQuelle {
            seed: self.seed,
            frame_nr: 0,
        }))
    }

    fn open_sink(&self) -> AudioResult<Box<dyn FrameSink>> {
        Ok(Box::new(SammelSenke {
            collected: Arc::clone(&self.collected),
        }))
    }
}

fn zwei_freie_ports() -> (u16, u16) {
    let a = UdpSocket::bind(("127.0.0.1", 0)).expect("Port-Suche a");
    let b = UdpSocket::bind(("127.0.0.1", 0)).expect("Port-Suche b");
    (
        a.local_addr().expect("Adresse a").port(),
        b.local_addr().expect("Adresse b").port(),
    )
}

fn warte_bis(bedingung: impl Fn() -> bool, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if bedingung() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    bedingung()
}

/// Prueft jeden vollstaendig angekommenen Frame auf Byte-Gleichheit
/// mit dem Muster des Senders und verlangt aufsteigende Frame-Nummern.
fn pruefe_frames(collected: &[i16], seed: i16) -> usize {
    let mut letzte_nr: Option<i16> = None;
    let mut gueltig = 0;
    for chunk in collected.chunks_exact(TEST_FRAME) {
        let frame_nr = chunk[0];
        for (pos, &s) in chunk.iter().enumerate().skip(1) {
            assert_eq!(
                s,
                muster_wert(seed, frame_nr, pos),
                "Frame {} ist an Position {} nicht byte-identisch",
                frame_nr,
                pos
            );
        }
        if let Some(vorher) = letzte_nr {
            assert!(
                frame_nr > vorher,
                "Frame-Nummern muessen aufsteigen: {} nach {}",
                frame_nr,
                vorher
            );
        }
        letzte_nr = Some(frame_nr);
        gueltig += 1;
    }
    gueltig
}

#[test]
fn loopback_frames_kommen_byte_identisch_an() {
    let backend = MusterBackend::erstellen(700);
    let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);
    let (port, _) = zwei_freie_ports();

    // Gegenstelle = eigener Empfangsport: der Pfad laeuft im Kreis
    engine.start(LOCALHOST, port, port).expect("Start");
    assert!(
        warte_bis(|| backend.frames_gesammelt() >= 5, Duration::from_secs(2)),
        "Loopback sollte Frames liefern"
    );
    engine.stop();

    let collected = backend.collected.lock().clone();
    let gueltig = pruefe_frames(&collected, 700);
    assert!(gueltig >= 5, "Mindestens 5 Frames erwartet, {} erhalten", gueltig);
}

#[test]
fn zwei_engines_tauschen_frames_in_beide_richtungen() {
    let backend_a = MusterBackend::erstellen(1000);
    let backend_b = MusterBackend::erstellen(-2000);
    let engine_a = CallEngine::with_backend(Arc::clone(&backend_a) as Arc<dyn AudioBackend>);
    let engine_b = CallEngine::with_backend(Arc::clone(&backend_b) as Arc<dyn AudioBackend>);

    let (port_a, port_b) = zwei_freie_ports();

    // A empfaengt auf port_a und sendet nach port_b, B spiegelverkehrt
    engine_a.start(LOCALHOST, port_b, port_a).expect("Start A");
    engine_b.start(LOCALHOST, port_a, port_b).expect("Start B");

    assert!(
        warte_bis(
            || backend_a.frames_gesammelt() >= 3 && backend_b.frames_gesammelt() >= 3,
            Duration::from_secs(2)
        ),
        "Beide Richtungen muessen Frames liefern"
    );

    engine_a.stop();
    engine_b.stop();

    // A hoert B und umgekehrt
    let bei_a = backend_a.collected.lock().clone();
    let bei_b = backend_b.collected.lock().clone();
    assert!(pruefe_frames(&bei_a, -2000) >= 3);
    assert!(pruefe_frames(&bei_b, 1000) >= 3);
}

#[test]
fn stop_beendet_den_medienfluss() {
    let backend = MusterBackend::erstellen(42);
    let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);
    let (port, _) = zwei_freie_ports();

    engine.start(LOCALHOST, port, port).expect("Start");
    assert!(warte_bis(
        || backend.frames_gesammelt() >= 2,
        Duration::from_secs(2)
    ));

    engine.stop();
    assert!(!engine.is_running());

    // Loops abklingen lassen, danach darf nichts mehr ankommen
    std::thread::sleep(Duration::from_millis(100));
    let stand = backend.frames_gesammelt();
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(
        backend.frames_gesammelt(),
        stand,
        "Nach stop() darf kein Frame mehr ankommen"
    );
}
