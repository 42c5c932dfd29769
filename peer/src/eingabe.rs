//! Pruefung von Benutzereingaben
//!
//! Zieladresse und Ports kommen aus der Konfigurationsdatei oder aus
//! Umgebungsvariablen und werden vor dem Verbindungsaufbau geprueft.

use std::net::IpAddr;
use thiserror::Error;

/// Fehler bei der Eingabepruefung
#[derive(Debug, Error)]
pub enum EingabeFehler {
    #[error("'{0}' ist keine gueltige Portnummer")]
    UngueltigerPort(String),

    #[error("Port {0} liegt ausserhalb von 1-65535")]
    PortAusserhalbDesBereichs(u64),

    #[error("'{0}' ist keine gueltige IP-Adresse")]
    UngueltigeAdresse(String),
}

/// Parst eine Portnummer aus einer Zeichenkette.
///
/// Port 0 ist kein erreichbares Ziel und wird abgelehnt.
pub fn port_parsen(eingabe: &str) -> Result<u16, EingabeFehler> {
    let wert: u64 = eingabe
        .trim()
        .parse()
        .map_err(|_| EingabeFehler::UngueltigerPort(eingabe.to_string()))?;
    if wert == 0 || wert > u64::from(u16::MAX) {
        return Err(EingabeFehler::PortAusserhalbDesBereichs(wert));
    }
    Ok(wert as u16)
}

/// Prueft eine bereits numerische Portnummer
pub fn port_pruefen(port: u16) -> Result<u16, EingabeFehler> {
    if port == 0 {
        return Err(EingabeFehler::PortAusserhalbDesBereichs(0));
    }
    Ok(port)
}

/// Parst eine IPv4- oder IPv6-Adresse; Hostnamen sind nicht zulaessig
pub fn ip_parsen(eingabe: &str) -> Result<IpAddr, EingabeFehler> {
    eingabe
        .trim()
        .parse()
        .map_err(|_| EingabeFehler::UngueltigeAdresse(eingabe.to_string()))
}
