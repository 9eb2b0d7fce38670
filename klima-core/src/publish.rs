//! InfluxDB 1.x Line Protocol
//!
//! Baut den kompletten HTTP-Request für `POST /write?db=...` und parst die
//! Statuszeile der Antwort. Der Transport (DNS, TCP) lebt in der Firmware.

use core::fmt::Write;

use heapless::String;

use crate::types::{PublishTarget, Reading};

/// Puffergröße für eine Zeile Line Protocol
pub const LINE_CAPACITY: usize = 128;

/// Puffergröße für den kompletten Request (Header + Body)
pub const REQUEST_CAPACITY: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// Unbekannte Messwerte werden nicht publiziert
    UnknownReading,
    /// Request passt nicht in den Puffer
    TooLarge,
}

/// Eine Zeile Line Protocol: `<series>[,<tags>] temperature_C=<t>,humidity=<h>`
///
/// Leerzeichen in Series und Tags werden escaped, Tags entfallen wenn leer.
///
/// ```
/// # use klima_core::{PublishTarget, Reading, line_protocol};
/// let target = PublishTarget::default();
/// let line = line_protocol(&target, &Reading::new(21.46, 40.4)).unwrap();
/// assert_eq!(line.as_str(), r"climate,name=Sensor\ 1 temperature_C=21.5,humidity=40");
/// ```
pub fn line_protocol(
    target: &PublishTarget,
    reading: &Reading,
) -> Result<String<LINE_CAPACITY>, PublishError> {
    if reading.is_unknown() {
        return Err(PublishError::UnknownReading);
    }

    let mut line = String::new();
    push_escaped(&mut line, &target.series)?;
    if !target.tags.is_empty() {
        line.push(',').map_err(|_| PublishError::TooLarge)?;
        push_escaped(&mut line, &target.tags)?;
    }
    write!(
        line,
        " temperature_C={:.1},humidity={:.0}",
        reading.temperature_c, reading.humidity_pct
    )
    .map_err(|_| PublishError::TooLarge)?;

    Ok(line)
}

fn push_escaped<const N: usize>(out: &mut String<N>, value: &str) -> Result<(), PublishError> {
    for c in value.chars() {
        if c == ' ' {
            out.push('\\').map_err(|_| PublishError::TooLarge)?;
        }
        out.push(c).map_err(|_| PublishError::TooLarge)?;
    }
    Ok(())
}

/// Kompletter HTTP/1.1 Request inklusive Body
pub fn write_request(
    target: &PublishTarget,
    reading: &Reading,
) -> Result<String<REQUEST_CAPACITY>, PublishError> {
    let body = line_protocol(target, reading)?;

    let mut request = String::new();
    write!(
        request,
        "POST /write?db={} HTTP/1.1\r\n\
         Host: {}:{}\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        target.database,
        target.host,
        target.port,
        body.len(),
        body
    )
    .map_err(|_| PublishError::TooLarge)?;

    Ok(request)
}

/// Statuscode aus der ersten Antwortzeile (`HTTP/1.x 204 No Content`)
pub fn parse_status_line(response: &[u8]) -> Option<u16> {
    let line_end = response.iter().position(|&b| b == b'\r' || b == b'\n')?;
    let line = core::str::from_utf8(&response[..line_end]).ok()?;

    let mut parts = line.split(' ');
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }

    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

#[cfg(feature = "defmt")]
impl defmt::Format for PublishError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            PublishError::UnknownReading => defmt::write!(fmt, "unknown reading"),
            PublishError::TooLarge => defmt::write!(fmt, "request too large"),
        }
    }
}
