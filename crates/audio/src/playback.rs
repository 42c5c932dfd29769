//! Lautsprecherseite des Medienpfads
//!
//! Der Empfangs-Loop schreibt angekommene Frames in einen lock-free
//! Ring-Buffer, den der cpal-Callback leert. Bei Underrun spielt der
//! Callback Stille statt alte Samples zu wiederholen.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapProd, HeapRb};
use tracing::{debug, error, trace};

use crate::device::{frame_size_from_buffer, load_output_device, FALLBACK_FRAME_SAMPLES};
use crate::error::{AudioError, AudioResult};
use crate::{CHANNELS, SAMPLE_RATE};

/// Nimmt empfangene Frames fuer die Wiedergabe entgegen.
pub trait FrameSink {
    /// Schreibt einen Frame in Richtung Lautsprecher.
    ///
    /// Ein voller Wiedergabepuffer ist kein Fehler: ueberzaehlige
    /// Samples duerfen verworfen werden.
    fn write_frame(&mut self, samples: &[i16]) -> AudioResult<()>;

    /// Feste Frame-Groesse dieser Senke in Samples
    fn frame_size(&self) -> usize;
}

/// Lautsprecher-Senke: cpal-Stream plus Ring-Buffer-Producer
pub struct PlaybackSink {
    _stream: Stream,
    producer: HeapProd<i16>,
    frame_size: usize,
}

impl FrameSink for PlaybackSink {
    fn write_frame(&mut self, samples: &[i16]) -> AudioResult<()> {
        let written = self.producer.push_slice(samples);
        if written < samples.len() {
            trace!(
                verworfen = samples.len() - written,
                "Playback Ring-Buffer voll"
            );
        }
        Ok(())
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }
}

/// Oeffnet die Lautsprecher-Senke auf dem gegebenen Geraet (None = Standard).
///
/// Der Consumer laeuft im cpal-Callback-Thread, der Producer gehoert
/// dem Empfangs-Loop.
pub fn open_playback_sink(device_name: Option<&str>) -> AudioResult<PlaybackSink> {
    let device = load_output_device(device_name)?;

    let stream_config = StreamConfig {
        channels: CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let supported = device
        .supported_output_configs()
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

    let rb = HeapRb::<i16>::new(SAMPLE_RATE as usize * 2);
    let (producer, mut consumer) = rb.split();

    let err_fn = |err| error!(fehler = %err, "Playback-Stream-Fehler");

    let stream = match sample_format {
        SampleFormat::I16 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _| {
                    let read = consumer.pop_slice(data);
                    // Stille fuer fehlende Samples
                    if read < data.len() {
                        data[read..].fill(0);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| crate::device::classify_build_error(e, false))?,
        SampleFormat::F32 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _| {
                    let mut pcm = vec![0i16; data.len()];
                    let read = consumer.pop_slice(&mut pcm);
                    for (out, s) in data.iter_mut().zip(pcm.iter()) {
                        *out = *s as f32 / i16::MAX as f32;
                    }
                    if read < data.len() {
                        data[read..].fill(0.0);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| crate::device::classify_build_error(e, false))?,
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
        "Playback-Stream geoeffnet"
    );

    Ok(PlaybackSink {
        _stream: stream,
        producer,
        frame_size,
    })
}
