//! fernruf-audio - Audio-Kernel
//!
//! Medienpfad fuer Punkt-zu-Punkt-Anrufe:
//! - Mikrofon-Capture via cpal
//! - Lautsprecher-Playback via cpal
//! - Roh-PCM16-Transport ueber UDP (ein Frame je Datagramm)
//! - CallEngine als Lebenszyklus-Steuerung mit austauschbarem Backend
//!
//! Kein Codec, kein Jitter-Buffer, keine Sequenznummern: die Leitung
//! traegt rohe Little-Endian-Samples bei 8 kHz mono.

pub mod capture;
pub mod device;
pub mod engine;
pub mod error;
pub mod pcm;
pub mod playback;

/// Abtastrate des Medienpfads in Hz (Telefonie-Schmalband)
pub const SAMPLE_RATE: u32 = 8000;
/// Kanalanzahl des Medienpfads (Mono)
pub const CHANNELS: u16 = 1;

// Bequeme Re-Exporte der wichtigsten Typen
pub use capture::{open_capture_source, CaptureSource, FrameSource};
pub use device::{list_input_devices, list_output_devices, DeviceInfo};
pub use engine::{AudioBackend, CallEngine, CpalBackend, EngineStats};
pub use error::{AudioError, AudioResult};
pub use playback::{open_playback_sink, FrameSink, PlaybackSink};
