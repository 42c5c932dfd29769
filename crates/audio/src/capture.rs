//! Mikrofonseite des Medienpfads
//!
//! Der cpal-Callback fuellt einen lock-free Ring-Buffer, aus dem der
//! Sende-Loop Frame fuer Frame liest. Die Frame-Groesse wird beim
//! Oeffnen einmalig aus der vom Backend gemeldeten minimalen
//! Puffergroesse bestimmt und bleibt fuer den Anruf fest.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{debug, error, warn};

use crate::device::{frame_size_from_buffer, load_input_device, FALLBACK_FRAME_SAMPLES};
use crate::error::{AudioError, AudioResult};
use crate::{CHANNELS, SAMPLE_RATE};

/// Liefert Mikrofon-Frames fuer den Sende-Loop.
///
/// `read_frame` blockiert nicht: sind gerade keine Samples verfuegbar,
/// kommt 0 zurueck und der Loop entscheidet selbst ueber das Warten.
pub trait FrameSource {
    /// Liest bis zu `frame.len()` Samples, gibt die gelesene Anzahl zurueck
    fn read_frame(&mut self, frame: &mut [i16]) -> AudioResult<usize>;

    /// Feste Frame-Groesse dieser Quelle in Samples
    fn frame_size(&self) -> usize;
}

/// Mikrofon-Quelle: cpal-Stream plus Ring-Buffer-Consumer
///
/// Haelt den cpal-Stream am Leben. Wird die Quelle gedroppt, stoppt
/// die Aufnahme automatisch.
pub struct CaptureSource {
    _stream: Stream,
    consumer: HeapCons<i16>,
    frame_size: usize,
}

impl FrameSource for CaptureSource {
    fn read_frame(&mut self, frame: &mut [i16]) -> AudioResult<usize> {
        Ok(self.consumer.pop_slice(frame))
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }
}

/// Oeffnet die Mikrofon-Quelle auf dem gegebenen Geraet (None = Standard).
///
/// Der Producer laeuft im cpal-Callback-Thread, der Consumer gehoert
/// dem Sende-Loop.
pub fn open_capture_source(device_name: Option<&str>) -> AudioResult<CaptureSource> {
    let device = load_input_device(device_name)?;

    let stream_config = StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    // Unterstuetzte Sample-Formate und minimale Puffergroesse ermitteln
    let supported = device
        .supported_input_configs()
        .map_err(|e| AudioError::KonfigNichtUnterstuetzt(e.to_string()))?
        .find(|c| {
            c.min_sample_rate().0 <= SAMPLE_RATE
                && c.max_sample_rate().0 >= SAMPLE_RATE
                && c.channels() >= CHANNELS
        });

    let (sample_format, frame_size) = match &supported {
        Some(c) => (c.sample_format(), frame_size_from_buffer(c.buffer_size())),
        None => (SampleFormat::F32, FALLBACK_FRAME_SAMPLES),
    };

    // 2 Sekunden Puffer zwischen Callback und Sende-Loop
    let rb = HeapRb::<i16>::new(SAMPLE_RATE as usize * 2);
    let (mut producer, consumer) = rb.split();

    let err_fn = |err| error!(fehler = %err, "Capture-Stream-Fehler");

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let written = producer.push_slice(data);
                    if written < data.len() {
                        warn!(
                            verworfen = data.len() - written,
                            "Capture Ring-Buffer voll"
                        );
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| crate::device::classify_build_error(e, true))?,
        SampleFormat::F32 => device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _| {
                    let samples: Vec<i16> = data
                        .iter()
                        .map(|&s| {
                            (s * i16::MAX as f32).clamp(i16::MIN as f32, i16::MAX as f32) as i16
                        })
                        .collect();
                    let written = producer.push_slice(&samples);
                    if written < samples.len() {
                        warn!("Capture Ring-Buffer voll");
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| crate::device::classify_build_error(e, true))?,
        other => {
            return Err(AudioError::KonfigNichtUnterstuetzt(format!(
                "Sample-Format {:?}",
                other
            )))
        }
    };

    stream
        .play()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    debug!(
        abtastrate = SAMPLE_RATE,
        frame = frame_size,
        "Capture-Stream geoeffnet"
    );

    Ok(CaptureSource {
        _stream: stream,
        consumer,
        frame_size,
    })
}
