//! CallEngine - Lebenszyklus des Medienpfads
//!
//! Verbindet Mikrofon-Capture, UDP-Versand, UDP-Empfang und Playback
//! zu einem Punkt-zu-Punkt-Medienpfad fuer genau einen Anruf.
//!
//! ## Sende-Pfad (Mikrofon -> Gegenstelle)
//! ```text
//! cpal Capture Callback
//!     -> Ring-Buffer (lock-free, ringbuf)
//!     -> Sende-Loop: Frame lesen -> PCM16 LE kodieren
//!     -> UDP send_to(ziel), ein Datagramm je Frame, ohne Header
//! ```
//!
//! ## Empfangs-Pfad (Gegenstelle -> Lautsprecher)
//! ```text
//! UDP recv_from(lokaler Port)
//!     -> PCM16 LE dekodieren
//!     -> Playback Ring-Buffer
//!     -> cpal Playback Callback
//! ```
//!
//! Beide Loops laufen als eigene OS-Threads, weil cpal::Stream !Send
//! ist und die Streams im besitzenden Thread leben muessen. Gestoppt
//! wird ausschliesslich ueber das gemeinsame Laufflag; stop() wartet
//! nicht auf die Threads.

use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::capture::{open_capture_source, FrameSource};
use crate::error::{AudioError, AudioResult};
use crate::pcm;
use crate::playback::{open_playback_sink, FrameSink};

/// Maximale UDP-Paketgroesse (typische MTU)
const UDP_BUFFER_SIZE: usize = 1400;
/// Wartezeit wenn das Mikrofon gerade keine Samples liefert
const LEERLAUF_WARTEZEIT: Duration = Duration::from_millis(5);
/// Read-Timeout des Empfangs-Sockets; begrenzt die Reaktionszeit auf stop()
const EMPFANGS_TIMEOUT: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Backend-Abstraktion
// ---------------------------------------------------------------------------

/// Oeffnet Frame-Quelle und Frame-Senke fuer einen Anruf.
///
/// Das Standard-Backend greift via cpal auf echte Geraete zu; Tests
/// haengen hier Stubs ein und treiben den Medienpfad ohne Hardware.
pub trait AudioBackend: Send + Sync + 'static {
    fn open_source(&self) -> AudioResult<Box<dyn FrameSource>>;
    fn open_sink(&self) -> AudioResult<Box<dyn FrameSink>>;
}

/// Standard-Backend: echte Audio-Geraete via cpal
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    /// Name des Eingabegeraets (None = Standard)
    pub input_device: Option<String>,
    /// Name des Ausgabegeraets (None = Standard)
    pub output_device: Option<String>,
}

impl AudioBackend for CpalBackend {
    fn open_source(&self) -> AudioResult<Box<dyn FrameSource>> {
        Ok(Box::new(open_capture_source(self.input_device.as_deref())?))
    }

    fn open_sink(&self) -> AudioResult<Box<dyn FrameSink>> {
        Ok(Box::new(open_playback_sink(self.output_device.as_deref())?))
    }
}

// ---------------------------------------------------------------------------
// Statistiken
// ---------------------------------------------------------------------------

/// Zaehlerstaende des Medienpfads seit dem letzten Start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
}

#[derive(Default)]
struct StatsInner {
    frames_sent: AtomicU64,
    bytes_sent: AtomicU64,
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
}

impl StatsInner {
    fn snapshot(&self) -> EngineStats {
        EngineStats {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.frames_sent.store(0, Ordering::Relaxed);
        self.bytes_sent.store(0, Ordering::Relaxed);
        self.frames_received.store(0, Ordering::Relaxed);
        self.bytes_received.store(0, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// CallEngine
// ---------------------------------------------------------------------------

struct ActiveCall {
    running: Arc<AtomicBool>,
}

/// Steuert den Medienpfad eines Anrufs.
///
/// Lifecycle:
/// 1. `new()` / `with_backend()` - Engine erstellen (Idle)
/// 2. `start()` - genau ein Anruf; nebenlaeufige Starts verlieren mit
///    `LaeuftBereits`
/// 3. `set_muted()` - Sendeseite stummschalten, Empfang laeuft weiter
/// 4. `stop()` - fire-and-forget, idempotent
///
/// Fehler in den laufenden Loops (Geraet weg, Socket kaputt) beenden
/// nur den Anruf selbst: die Engine geht auf Idle und der Grund ist
/// ueber `last_error()` abrufbar, `start()` selbst meldet sie nie.
pub struct CallEngine {
    backend: Arc<dyn AudioBackend>,
    active: Arc<AtomicBool>,
    muted: Arc<AtomicBool>,
    current: Arc<Mutex<Option<ActiveCall>>>,
    last_error: Arc<Mutex<Option<AudioError>>>,
    stats: Arc<StatsInner>,
}

impl CallEngine {
    /// Erstellt eine Engine mit echten cpal-Geraeten
    pub fn new(input_device: Option<String>, output_device: Option<String>) -> Self {
        Self::with_backend(Arc::new(CpalBackend {
            input_device,
            output_device,
        }))
    }

    /// Erstellt eine Engine mit austauschbarem Backend
    pub fn with_backend(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            active: Arc::new(AtomicBool::new(false)),
            muted: Arc::new(AtomicBool::new(false)),
            current: Arc::new(Mutex::new(None)),
            last_error: Arc::new(Mutex::new(None)),
            stats: Arc::new(StatsInner::default()),
        }
    }

    /// Startet den Medienpfad zu einer Gegenstelle.
    ///
    /// Kehrt sofort zurueck, sobald beide Loop-Threads laufen; das
    /// Oeffnen der Geraete passiert in den Threads selbst. Laeuft
    /// bereits ein Anruf, gewinnt genau ein Aufrufer, alle anderen
    /// erhalten `LaeuftBereits`.
    pub fn start(
        &self,
        remote_ip: IpAddr,
        remote_port: u16,
        local_port: u16,
    ) -> AudioResult<()> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AudioError::LaeuftBereits);
        }

        let ziel = SocketAddr::new(remote_ip, remote_port);
        info!(ziel = %ziel, lokal_port = local_port, "Starte Medienpfad");

        *self.last_error.lock() = None;
        self.stats.reset();

        // Je Start ein frisches Laufflag: ein alter Loop, der sein
        // Flag verspaetet liest, kann einen neuen Anruf nicht stoppen.
        let running = Arc::new(AtomicBool::new(true));

        let mut guard = self.current.lock();

        let sende_backend = Arc::clone(&self.backend);
        let sende_running = Arc::clone(&running);
        let sende_muted = Arc::clone(&self.muted);
        let sende_stats = Arc::clone(&self.stats);
        let sende_current = Arc::clone(&self.current);
        let sende_active = Arc::clone(&self.active);
        let sende_fehler = Arc::clone(&self.last_error);

        let sende_thread = std::thread::Builder::new()
            .name("fernruf-capture".to_string())
            .spawn(move || {
                // cpal-Streams sind !Send und leben in diesem Thread
                let ergebnis = sende_backend.open_source().and_then(|quelle| {
                    sende_loop(
                        quelle,
                        ziel,
                        Arc::clone(&sende_running),
                        sende_muted,
                        sende_stats,
                    )
                });
                if let Err(e) = ergebnis {
                    loop_abbruch(
                        &sende_current,
                        &sende_active,
                        &sende_running,
                        &sende_fehler,
                        e,
                    );
                }
            });

        if let Err(e) = sende_thread {
            self.active.store(false, Ordering::SeqCst);
            return Err(AudioError::StreamFehler(e.to_string()));
        }

        let empfangs_backend = Arc::clone(&self.backend);
        let empfangs_running = Arc::clone(&running);
        let empfangs_stats = Arc::clone(&self.stats);
        let empfangs_current = Arc::clone(&self.current);
        let empfangs_active = Arc::clone(&self.active);
        let empfangs_fehler = Arc::clone(&self.last_error);

        let empfangs_thread = std::thread::Builder::new()
            .name("fernruf-playback".to_string())
            .spawn(move || {
                let ergebnis = empfangs_backend.open_sink().and_then(|senke| {
                    empfangs_loop(
                        senke,
                        local_port,
                        Arc::clone(&empfangs_running),
                        empfangs_stats,
                    )
                });
                if let Err(e) = ergebnis {
                    loop_abbruch(
                        &empfangs_current,
                        &empfangs_active,
                        &empfangs_running,
                        &empfangs_fehler,
                        e,
                    );
                }
            });

        if let Err(e) = empfangs_thread {
            running.store(false, Ordering::SeqCst);
            self.active.store(false, Ordering::SeqCst);
            return Err(AudioError::StreamFehler(e.to_string()));
        }

        *guard = Some(ActiveCall { running });
        debug!("Medienpfad gestartet");
        Ok(())
    }

    /// Beendet den Medienpfad (fire-and-forget).
    ///
    /// Setzt nur das Laufflag zurueck und wartet nicht auf die
    /// Threads; der Sende-Loop endet binnen eines Lesezyklus, der
    /// Empfangs-Loop spaetestens nach seinem Read-Timeout. Mehrfaches
    /// Stoppen ist erlaubt und wirkungslos.
    pub fn stop(&self) {
        let mut guard = self.current.lock();
        match guard.take() {
            Some(anruf) => {
                anruf.running.store(false, Ordering::SeqCst);
                self.active.store(false, Ordering::SeqCst);
                info!("Medienpfad gestoppt");
            }
            None => debug!("Stop ohne laufenden Medienpfad"),
        }
    }

    /// Ob gerade ein Anruf laeuft
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mikrofon stummschalten; der Empfang laeuft weiter
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
        info!(muted, "Mikrofon-Mute umgeschaltet");
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Zaehlerstaende seit dem letzten Start
    pub fn stats(&self) -> EngineStats {
        self.stats.snapshot()
    }

    /// Nimmt den zuletzt aufgezeichneten Loop-Fehler heraus.
    ///
    /// Medien-Fehler beenden den Anruf stillschweigend; dieser Getter
    /// liefert den Grund genau einmal an den ersten Interessenten.
    pub fn last_error(&self) -> Option<AudioError> {
        self.last_error.lock().take()
    }
}

impl Drop for CallEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Medien-Loops
// ---------------------------------------------------------------------------

/// Sende-Loop: liest Frames aus der Quelle und sendet jedes gelesene
/// Stueck sofort als einzelnes Datagramm an die Gegenstelle. Es wird
/// nicht auf volle Frames angesammelt.
fn sende_loop(
    mut quelle: Box<dyn FrameSource>,
    ziel: SocketAddr,
    running: Arc<AtomicBool>,
    muted: Arc<AtomicBool>,
    stats: Arc<StatsInner>,
) -> AudioResult<()> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    let mut frame = vec![0i16; quelle.frame_size()];

    debug!(ziel = %ziel, frame = frame.len(), "Sende-Loop gestartet");

    while running.load(Ordering::Relaxed) {
        let gelesen = quelle.read_frame(&mut frame)?;
        if gelesen == 0 {
            std::thread::sleep(LEERLAUF_WARTEZEIT);
            continue;
        }
        if muted.load(Ordering::Relaxed) {
            continue;
        }
        let bytes = pcm::samples_to_bytes(&frame[..gelesen]);
        socket.send_to(&bytes, ziel)?;
        stats.frames_sent.fetch_add(1, Ordering::Relaxed);
        stats
            .bytes_sent
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
    }

    debug!("Sende-Loop beendet");
    Ok(())
}

/// Empfangs-Loop: nimmt Datagramme auf dem lokalen Port entgegen und
/// schreibt die Samples in die Senke. Absender werden nicht geprueft,
/// es gibt keine Sequenznummern und kein Reordering.
fn empfangs_loop(
    mut senke: Box<dyn FrameSink>,
    local_port: u16,
    running: Arc<AtomicBool>,
    stats: Arc<StatsInner>,
) -> AudioResult<()> {
    let socket = UdpSocket::bind(("0.0.0.0", local_port))?;
    socket.set_read_timeout(Some(EMPFANGS_TIMEOUT))?;
    let mut buf = [0u8; UDP_BUFFER_SIZE];

    debug!(port = local_port, "Empfangs-Loop gestartet");

    while running.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, _absender)) => {
                let samples = pcm::bytes_to_samples(&buf[..len]);
                if samples.is_empty() {
                    continue;
                }
                senke.write_frame(&samples)?;
                stats.frames_received.fetch_add(1, Ordering::Relaxed);
                stats
                    .bytes_received
                    .fetch_add(len as u64, Ordering::Relaxed);
            }
            // Timeout-Tick: nur das Laufflag pruefen
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue
            }
            Err(e) => return Err(AudioError::Netzwerk(e)),
        }
    }

    debug!("Empfangs-Loop beendet");
    Ok(())
}

/// Raeumt nach einem Loop-Abbruch auf.
///
/// Nur wenn der abgebrochene Loop noch zum aktiven Anruf gehoert,
/// geht die Engine auf Idle und der Fehler wird aufgezeichnet; hat
/// stop() oder ein neuer Anruf den Zustand schon uebernommen,
/// passiert nichts mehr.
fn loop_abbruch(
    current: &Mutex<Option<ActiveCall>>,
    active: &AtomicBool,
    own_running: &Arc<AtomicBool>,
    last_error: &Mutex<Option<AudioError>>,
    fehler: AudioError,
) {
    warn!(fehler = %fehler, "Medien-Loop abgebrochen");
    let mut guard = current.lock();
    match &*guard {
        Some(anruf) if Arc::ptr_eq(&anruf.running, own_running) => {
            own_running.store(false, Ordering::SeqCst);
            active.store(false, Ordering::SeqCst);
            *guard = None;
            *last_error.lock() = Some(fehler);
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    const TEST_FRAME: usize = 160;
    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// Quelle mit fortlaufendem Zaehlmuster; zaehlt ihre Leseaufrufe
    struct TestSource {
        naechster: i16,
        reads: Arc<AtomicUsize>,
    }

    impl FrameSource for TestSource {
        fn read_frame(&mut self, frame: &mut [i16]) -> AudioResult<usize> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            for s in frame.iter_mut() {
                *s = self.naechster;
                self.naechster = self.naechster.wrapping_add(1);
            }
            // Tempo drosseln, damit der Loop nicht heiss laeuft
            std::thread::sleep(Duration::from_millis(2));
            Ok(frame.len())
        }

        fn frame_size(&self) -> usize {
            TEST_FRAME
        }
    }

    struct TestSink {
        collected: Arc<Mutex<Vec<i16>>>,
    }

    impl FrameSink for TestSink {
        fn write_frame(&mut self, samples: &[i16]) -> AudioResult<()> {
            self.collected.lock().extend_from_slice(samples);
            Ok(())
        }

        fn frame_size(&self) -> usize {
            TEST_FRAME
        }
    }

    /// Backend-Stub: schaltbare Mikrofon-Berechtigung, sammelt alle
    /// empfangenen Samples und die Lesezaehler jeder Quelle
    struct TestBackend {
        capture_erlaubt: AtomicBool,
        source_reads: Mutex<Vec<Arc<AtomicUsize>>>,
        collected: Arc<Mutex<Vec<i16>>>,
    }

    impl TestBackend {
        fn erstellen(capture_erlaubt: bool) -> Arc<Self> {
            Arc::new(Self {
                capture_erlaubt: AtomicBool::new(capture_erlaubt),
                source_reads: Mutex::new(Vec::new()),
                collected: Arc::new(Mutex::new(Vec::new())),
            })
        }

        fn reads(&self, index: usize) -> usize {
            // 0 solange der Loop-Thread diese Quelle noch nicht
            // registriert hat; warte_bis pollt dann weiter
            self.source_reads
                .lock()
                .get(index)
                .map_or(0, |r| r.load(Ordering::Relaxed))
        }

        fn gesammelt(&self) -> usize {
            self.collected.lock().len()
        }
    }

    impl AudioBackend for TestBackend {
        fn open_source(&self) -> AudioResult<Box<dyn FrameSource>> {
            if !self.capture_erlaubt.load(Ordering::Relaxed) {
                return Err(AudioError::BerechtigungVerweigert);
            }
            let reads = Arc::new(AtomicUsize::new(0));
            self.source_reads.lock().push(Arc::clone(&reads));
            Ok(Box::new(TestSource { naechster: 0, reads }))
        }

        fn open_sink(&self) -> AudioResult<Box<dyn FrameSink>> {
            Ok(Box::new(TestSink {
                collected: Arc::clone(&self.collected),
            }))
        }
    }

    fn freier_udp_port() -> u16 {
        let socket = UdpSocket::bind(("127.0.0.1", 0)).expect("Port-Suche");
        socket.local_addr().expect("Lokale Adresse").port()
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

    #[test]
    fn neue_engine_ist_idle() {
        let engine = CallEngine::with_backend(TestBackend::erstellen(true));
        assert!(!engine.is_running());
        assert!(!engine.is_muted());
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn doppelter_start_wird_abgelehnt() {
        let engine = CallEngine::with_backend(TestBackend::erstellen(true));
        let port = freier_udp_port();
        engine
            .start(LOCALHOST, port, port)
            .expect("Erster Start sollte gelingen");

        let zweiter = engine.start(LOCALHOST, port, port);
        assert!(matches!(zweiter, Err(AudioError::LaeuftBereits)));

        engine.stop();
    }

    #[test]
    fn stop_ist_idempotent() {
        let engine = CallEngine::with_backend(TestBackend::erstellen(true));
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());

        let port = freier_udp_port();
        engine.start(LOCALHOST, port, port).expect("Start");
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn nebenlaeufige_starts_genau_ein_gewinner() {
        let engine = Arc::new(CallEngine::with_backend(TestBackend::erstellen(true)));
        let port = freier_udp_port();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = Arc::clone(&engine);
            handles.push(std::thread::spawn(move || {
                match engine.start(LOCALHOST, port, port) {
                    Ok(()) => true,
                    Err(AudioError::LaeuftBereits) => false,
                    Err(e) => panic!("Unerwarteter Startfehler: {}", e),
                }
            }));
        }

        let gewinner = handles
            .into_iter()
            .map(|h| h.join().expect("Thread"))
            .filter(|&ok| ok)
            .count();
        assert_eq!(gewinner, 1, "Genau ein Start darf gewinnen");

        engine.stop();
    }

    #[test]
    fn loopback_liefert_frames_in_die_senke() {
        let backend = TestBackend::erstellen(true);
        let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);
        let port = freier_udp_port();

        // Gegenstelle = eigener Empfangsport: der Pfad laeuft im Kreis
        engine.start(LOCALHOST, port, port).expect("Start");

        assert!(
            warte_bis(
                || backend.gesammelt() >= TEST_FRAME * 3,
                Duration::from_secs(2)
            ),
            "Senke sollte Frames aus dem Loopback erhalten"
        );

        let stats = engine.stats();
        assert!(stats.frames_sent > 0);
        assert_eq!(stats.bytes_sent, stats.frames_sent * (TEST_FRAME as u64) * 2);
        assert!(stats.frames_received > 0);
        assert!(stats.frames_received <= stats.frames_sent);

        engine.stop();
    }

    #[test]
    fn mute_unterdrueckt_den_sendepfad() {
        let backend = TestBackend::erstellen(true);
        let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);
        let port = freier_udp_port();

        engine.start(LOCALHOST, port, port).expect("Start");
        assert!(
            warte_bis(|| backend.gesammelt() > 0, Duration::from_secs(2)),
            "Vor dem Mute muessen Frames ankommen"
        );

        engine.set_muted(true);
        // Nachzuegler aus dem UDP-Puffer abwarten
        std::thread::sleep(Duration::from_millis(100));
        let stand = backend.gesammelt();
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(backend.gesammelt(), stand, "Gemutet darf nichts ankommen");

        engine.set_muted(false);
        assert!(
            warte_bis(|| backend.gesammelt() > stand, Duration::from_secs(2)),
            "Nach dem Unmute muessen wieder Frames ankommen"
        );

        engine.stop();
    }

    #[test]
    fn verweigerte_berechtigung_stoppt_engine_still() {
        let backend = TestBackend::erstellen(false);
        let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);
        let port = freier_udp_port();

        // Der Startaufruf selbst meldet den Medienfehler nicht
        engine
            .start(LOCALHOST, port, port)
            .expect("Start liefert Ok, der Fehler faellt erst im Loop-Thread an");

        assert!(
            warte_bis(|| !engine.is_running(), Duration::from_secs(2)),
            "Engine muss nach dem Berechtigungsfehler auf Idle gehen"
        );

        let fehler = engine.last_error();
        assert!(
            matches!(fehler, Some(AudioError::BerechtigungVerweigert)),
            "Grund muss abrufbar sein: {:?}",
            fehler
        );
        // take-once: ein zweiter Abruf ist leer
        assert!(engine.last_error().is_none());

        // Nach erteilter Berechtigung gelingt ein neuer Start; frischer
        // Port, weil der alte Empfangs-Socket erst mit dem Timeout-Tick
        // freigegeben wird
        backend.capture_erlaubt.store(true, Ordering::Relaxed);
        std::thread::sleep(Duration::from_millis(50));
        let port2 = freier_udp_port();
        engine.start(LOCALHOST, port2, port2).expect("Zweiter Start");
        assert!(
            warte_bis(|| backend.gesammelt() > 0, Duration::from_secs(2)),
            "Mit Berechtigung muessen Frames fliessen"
        );
        engine.stop();
    }

    #[test]
    fn gestoppter_loop_lebt_nach_neustart_nicht_weiter() {
        let backend = TestBackend::erstellen(true);
        let engine = CallEngine::with_backend(Arc::clone(&backend) as Arc<dyn AudioBackend>);

        let port1 = freier_udp_port();
        engine.start(LOCALHOST, port1, port1).expect("Start 1");
        assert!(warte_bis(|| backend.reads(0) > 0, Duration::from_secs(2)));
        engine.stop();

        // Erst abklingen lassen, dann den Stand der alten Quelle merken
        std::thread::sleep(Duration::from_millis(100));
        let alter_stand = backend.reads(0);

        let port2 = freier_udp_port();
        engine.start(LOCALHOST, port2, port2).expect("Start 2");
        assert!(
            warte_bis(|| backend.reads(1) > 0, Duration::from_secs(2)),
            "Der neue Anruf braucht eine frische Quelle"
        );
        std::thread::sleep(Duration::from_millis(100));

        assert_eq!(
            backend.reads(0),
            alter_stand,
            "Die alte Quelle darf nach dem Neustart nicht wieder gelesen werden"
        );
        engine.stop();
    }
}
