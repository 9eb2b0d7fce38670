// Publish Task - Schreibt Messwerte per HTTP in eine InfluxDB
use defmt::{Debug2Format, info, warn};
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Ipv4Address, Stack, dns::DnsQueryType};
use embassy_time::{Duration, with_timeout};
use klima_core::publish::parse_status_line;
use klima_core::{PublishError, PublishStatus, PublishTarget, Publisher, Reading, write_request};
use picoserve::io::embedded_io_async::Write;

use crate::config::*;
use crate::{ConfigReceiver, PublishReceiver, set_last_publish_status};

/// Publisher über embassy-net (ein Versuch, kein Retry)
///
/// Ohne Netzwerk-Stack (`None`) schlägt jeder Versuch mit
/// [`PublishStatus::CONNECTION_FAILED`] fehl.
pub struct InfluxPublisher {
    stack: Option<&'static Stack<'static>>,
}

impl InfluxPublisher {
    pub fn new(stack: Option<&'static Stack<'static>>) -> Self {
        Self { stack }
    }
}

impl Publisher for InfluxPublisher {
    async fn publish(&mut self, reading: Reading, target: &PublishTarget) -> PublishStatus {
        let Some(stack) = self.stack else {
            return PublishStatus::CONNECTION_FAILED;
        };

        info!(
            "Publish: Sending {} to {}:{}/{}",
            reading,
            target.host.as_str(),
            target.port,
            target.database.as_str()
        );

        let result = with_timeout(
            Duration::from_secs(PUBLISH_TIMEOUT_SECS),
            publish_once(stack, reading, target),
        )
        .await;

        let status = match result {
            Ok(Ok(code)) => PublishStatus(i16::try_from(code).unwrap_or(i16::MAX)),
            Ok(Err(e)) => {
                warn!("Publish: Failed: {}", e);
                e.status()
            }
            Err(_) => {
                warn!("Publish: Timeout");
                PublishStatus::TIMEOUT
            }
        };

        info!("Publish: Influx replied {}", status);
        status
    }
}

/// Ein kompletter Request: DNS, Connect, Senden, Statuszeile lesen
async fn publish_once(
    stack: &'static Stack<'static>,
    reading: Reading,
    target: &PublishTarget,
) -> Result<u16, InfluxError> {
    let request = write_request(target, &reading).map_err(|e| match e {
        PublishError::UnknownReading => InfluxError::UnknownReading,
        PublishError::TooLarge => InfluxError::RequestTooLarge,
    })?;
    let address = resolve_host(stack, &target.host).await?;

    let mut rx_buffer = [0u8; PUBLISH_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; PUBLISH_TX_BUFFER_SIZE];
    let mut socket = TcpSocket::new(*stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(PUBLISH_TIMEOUT_SECS)));

    socket
        .connect((address, target.port))
        .await
        .map_err(|_| InfluxError::ConnectionFailed)?;
    socket
        .write_all(request.as_bytes())
        .await
        .map_err(|_| InfluxError::ConnectionFailed)?;

    // Nur bis zum Ende der Statuszeile lesen
    let mut response = [0u8; PUBLISH_RESPONSE_PEEK_SIZE];
    let mut filled = 0;
    while filled < response.len() && !response[..filled].contains(&b'\n') {
        match socket.read(&mut response[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return Err(InfluxError::ConnectionFailed),
        }
    }
    socket.close();

    parse_status_line(&response[..filled]).ok_or(InfluxError::MalformedReply)
}

/// Löst den Hostnamen auf, IP-Literale werden direkt verwendet
async fn resolve_host(stack: &'static Stack<'static>, host: &str) -> Result<Ipv4Address, InfluxError> {
    if let Ok(address) = host.parse::<Ipv4Address>() {
        return Ok(address);
    }

    let result = with_timeout(
        Duration::from_secs(DNS_TIMEOUT_SECS),
        stack.dns_query(host, DnsQueryType::A),
    )
    .await;

    match result {
        Ok(Ok(addrs)) => addrs
            .iter()
            .find_map(|addr| match addr {
                IpAddress::Ipv4(ipv4) => Some(*ipv4),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .ok_or(InfluxError::DnsResolutionFailed),
        Ok(Err(e)) => {
            warn!("Publish: DNS error {}", Debug2Format(&e));
            Err(InfluxError::DnsResolutionFailed)
        }
        Err(_) => Err(InfluxError::DnsResolutionFailed),
    }
}

/// Influx Fehler-Typen
#[derive(Debug)]
enum InfluxError {
    DnsResolutionFailed,
    ConnectionFailed,
    MalformedReply,
    RequestTooLarge,
    UnknownReading,
}

impl InfluxError {
    fn status(&self) -> PublishStatus {
        match self {
            InfluxError::DnsResolutionFailed => PublishStatus::DNS_FAILED,
            InfluxError::ConnectionFailed => PublishStatus::CONNECTION_FAILED,
            InfluxError::MalformedReply => PublishStatus::MALFORMED_REPLY,
            InfluxError::RequestTooLarge => PublishStatus::REQUEST_TOO_LARGE,
            InfluxError::UnknownReading => PublishStatus::UNKNOWN_READING,
        }
    }
}

impl defmt::Format for InfluxError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            InfluxError::DnsResolutionFailed => defmt::write!(fmt, "DNS failed"),
            InfluxError::ConnectionFailed => defmt::write!(fmt, "Connection failed"),
            InfluxError::MalformedReply => defmt::write!(fmt, "Malformed reply"),
            InfluxError::RequestTooLarge => defmt::write!(fmt, "Request too large"),
            InfluxError::UnknownReading => defmt::write!(fmt, "Unknown reading"),
        }
    }
}

/// Publish Task - arbeitet die Queue vom Sampling Task ab
///
/// Läuft entkoppelt, damit weder Sampling noch HTTP auf das Netzwerk warten.
/// Das Ziel kommt aus dem jeweils aktuellen Config-Snapshot.
#[embassy_executor::task]
pub async fn publish_task(
    stack: &'static Stack<'static>,
    readings: PublishReceiver,
    mut config_rx: ConfigReceiver,
) {
    info!("Publish: Task started");
    let mut publisher = InfluxPublisher::new(Some(stack));

    loop {
        let reading = readings.receive().await;
        let config = config_rx.get().await;
        if !config.publish_enabled {
            continue;
        }

        let status = publisher.publish(reading, &config.publish_target).await;
        set_last_publish_status(status);
    }
}
