//! Geraeteauswahl und -abfrage via cpal
//!
//! Waehlt das konfigurierte Ein-/Ausgabegeraet (oder den Systemstandard)
//! aus, uebersetzt die vom Backend gemeldete minimale Puffergroesse in
//! die Frame-Groesse des Medienpfads und ordnet Stream-Aufbaufehler in
//! die Fehler-Taxonomie ein.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, SupportedBufferSize};
use tracing::{debug, warn};

use crate::error::{AudioError, AudioResult};

/// Untergrenze je Frame: 10 ms bei 8 kHz
pub const MIN_FRAME_SAMPLES: usize = 80;

/// Rueckfallwert wenn das Backend keine Puffergroesse meldet: 40 ms
pub const FALLBACK_FRAME_SAMPLES: usize = 320;

/// Abtastraten, die bei der Geraeteabfrage geprueft werden
const RELEVANT_RATES: [u32; 4] = [8000, 16000, 44100, 48000];

/// Beschreibung eines abgefragten Audio-Geraets
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Name, wie ihn das Betriebssystem meldet
    pub name: String,
    /// Hoechste gemeldete Kanalanzahl
    pub channels: u16,
    /// Welche der geprueften Abtastraten das Geraet traegt
    pub sample_rates: Vec<u32>,
}

impl DeviceInfo {
    /// Prueft ob das Geraet die gegebene Abtastrate unterstuetzt
    pub fn supports_rate(&self, rate: u32) -> bool {
        self.sample_rates.contains(&rate)
    }
}

/// Uebersetzt die vom Backend gemeldete Puffergroesse in Samples je Frame.
///
/// Die Frame-Groesse wird einmal beim Oeffnen eines Streams bestimmt und
/// bleibt fuer die Dauer des Anrufs fest; jedes UDP-Datagramm traegt
/// genau einen solchen Frame.
pub fn frame_size_from_buffer(buffer: &SupportedBufferSize) -> usize {
    match buffer {
        SupportedBufferSize::Range { min, .. } if *min > 0 => {
            (*min as usize).max(MIN_FRAME_SAMPLES)
        }
        _ => FALLBACK_FRAME_SAMPLES,
    }
}

/// Ordnet einen cpal-Stream-Aufbaufehler in die Fehler-Taxonomie ein
pub(crate) fn classify_build_error(fehler: cpal::BuildStreamError, eingabe: bool) -> AudioError {
    match fehler {
        cpal::BuildStreamError::DeviceNotAvailable if eingabe => {
            // Eine fehlende Mikrofon-Berechtigung meldet cpal als
            // nicht verfuegbares Geraet
            AudioError::BerechtigungVerweigert
        }
        cpal::BuildStreamError::DeviceNotAvailable => {
            AudioError::StreamFehler("Ausgabegeraet nicht mehr verfuegbar".to_string())
        }
        cpal::BuildStreamError::StreamConfigNotSupported => {
            AudioError::KonfigNichtUnterstuetzt("Stream-Konfiguration abgelehnt".to_string())
        }
        cpal::BuildStreamError::InvalidArgument => {
            AudioError::KonfigNichtUnterstuetzt("Ungueltiges Stream-Argument".to_string())
        }
        cpal::BuildStreamError::BackendSpecific { err } => {
            let beschreibung = err.description;
            let klein = beschreibung.to_lowercase();
            if eingabe && (klein.contains("permission") || klein.contains("denied")) {
                AudioError::BerechtigungVerweigert
            } else {
                AudioError::StreamFehler(beschreibung)
            }
        }
        other => AudioError::StreamFehler(other.to_string()),
    }
}

/// Fragt alle Eingabegeraete des Standard-Hosts ab
pub fn list_input_devices() -> AudioResult<Vec<DeviceInfo>> {
    let geraete = cpal::default_host()
        .input_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    Ok(collect_devices(geraete, "eingabe"))
}

/// Fragt alle Ausgabegeraete des Standard-Hosts ab
pub fn list_output_devices() -> AudioResult<Vec<DeviceInfo>> {
    let geraete = cpal::default_host()
        .output_devices()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;
    Ok(collect_devices(geraete, "ausgabe"))
}

fn collect_devices(geraete: impl Iterator<Item = Device>, richtung: &str) -> Vec<DeviceInfo> {
    let mut gefunden = Vec::new();
    for geraet in geraete {
        match probe_device(&geraet) {
            Ok(info) => gefunden.push(info),
            Err(e) => warn!(fehler = %e, richtung, "Geraet nicht lesbar"),
        }
    }
    debug!(anzahl = gefunden.len(), richtung, "Geraete abgefragt");
    gefunden
}

/// Laedt ein cpal-Device fuer Eingabe (None = Standardgeraet)
pub fn load_input_device(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or(AudioError::KeinStandardEingabegeraet),
        Some(n) => host
            .input_devices()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?
            .find(|d| d.name().map(|dn| dn.contains(n)).unwrap_or(false))
            .ok_or_else(|| AudioError::GeraetNichtGefunden(n.to_string())),
    }
}

/// Laedt ein cpal-Device fuer Ausgabe (None = Standardgeraet)
pub fn load_output_device(name: Option<&str>) -> AudioResult<Device> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_output_device()
            .ok_or(AudioError::KeinStandardAusgabegeraet),
        Some(n) => host
            .output_devices()
            .map_err(|e| AudioError::StreamFehler(e.to_string()))?
            .find(|d| d.name().map(|dn| dn.contains(n)).unwrap_or(false))
            .ok_or_else(|| AudioError::GeraetNichtGefunden(n.to_string())),
    }
}

fn probe_device(geraet: &Device) -> AudioResult<DeviceInfo> {
    let name = geraet
        .name()
        .map_err(|e| AudioError::StreamFehler(e.to_string()))?;

    // Raten-Bereiche aus beiden Richtungen einsammeln; ein Geraet kann
    // sowohl Ein- als auch Ausgabe koennen
    let mut bereiche: Vec<(u32, u32)> = Vec::new();
    let mut channels = 1u16;
    if let Ok(configs) = geraet.supported_input_configs() {
        for cfg in configs {
            bereiche.push((cfg.min_sample_rate().0, cfg.max_sample_rate().0));
            channels = channels.max(cfg.channels());
        }
    }
    if let Ok(configs) = geraet.supported_output_configs() {
        for cfg in configs {
            bereiche.push((cfg.min_sample_rate().0, cfg.max_sample_rate().0));
            channels = channels.max(cfg.channels());
        }
    }

    let sample_rates = RELEVANT_RATES
        .into_iter()
        .filter(|rate| {
            bereiche
                .iter()
                .any(|&(min, max)| (min..=max).contains(rate))
        })
        .collect();

    Ok(DeviceInfo {
        name,
        channels,
        sample_rates,
    })
}
