//! PCM16-Konvertierung fuer den UDP-Medienpfad
//!
//! Auf der Leitung liegen rohe PCM16-Samples in Little-Endian, ohne
//! Header und ohne Sequenznummern. Ein Datagramm entspricht genau
//! einem Frame.

/// Kodiert Samples als Little-Endian-Bytefolge
pub fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

/// Dekodiert eine Little-Endian-Bytefolge zu Samples
///
/// Ein haengendes Einzelbyte am Ende wird verworfen, damit ein
/// beschaedigtes Datagramm den Loop nicht abbricht.
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|paar| i16::from_le_bytes([paar[0], paar[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_bytefolge() {
        let bytes = samples_to_bytes(&[0x0102, -2]);
        assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn haengendes_byte_wird_verworfen() {
        let samples = bytes_to_samples(&[0x02, 0x01, 0xAB]);
        assert_eq!(samples, vec![0x0102]);
    }

    #[test]
    fn leeres_datagramm_ergibt_keine_samples() {
        assert!(bytes_to_samples(&[]).is_empty());
    }

    #[test]
    fn extremwerte_ueberleben_die_leitung() {
        let original = [i16::MIN, -1, 0, 1, i16::MAX];
        let zurueck = bytes_to_samples(&samples_to_bytes(&original));
        assert_eq!(zurueck, original);
    }
}
