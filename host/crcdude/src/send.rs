use crate::args::SendArgs;
use crate::lines::LineReader;
use crate::tty::Tty;
use crcuart_common::{Report, ReportLine, MAX_DATA_LEN};
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("refusing to send an empty payload: the device would report no data")]
    EmptyPayload,
    #[error("payload is {0} bytes; the device computes over at most {max} bytes per frame", max = MAX_DATA_LEN)]
    PayloadTooLarge(usize),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("device received no data (still holding CRC 0x{0:08X})")]
    NoData(u32),
    #[error("CRC mismatch: device reported 0x{device:08X}, expected 0x{expected:08X}")]
    Mismatch { device: u32, expected: u32 },
    #[error("I/O error on serial link: {0}")]
    Io(#[from] io::Error),
}

pub fn check_payload(payload: &[u8]) -> Result<(), SendError> {
    if payload.is_empty() {
        Err(SendError::EmptyPayload)
    } else if payload.len() > MAX_DATA_LEN {
        Err(SendError::PayloadTooLarge(payload.len()))
    } else {
        Ok(())
    }
}

fn wait_for<T: Read, R>(
    link: &mut LineReader<T>,
    timeout: Duration,
    what: &'static str,
    mut pick: impl FnMut(ReportLine<'_>) -> Option<R>,
) -> Result<R, SendError> {
    let start = Instant::now();
    loop {
        let remaining = timeout
            .checked_sub(start.elapsed())
            .ok_or(SendError::Timeout(what))?;
        let Some(line) = link.next_line(remaining)? else {
            return Err(SendError::Timeout(what));
        };
        tracing::debug!("< {}", line.trim_end());
        if let Some(found) = pick(ReportLine::classify(&line)) {
            return Ok(found);
        }
    }
}

/// Wait for the device to start a cycle, send `payload`, and return the CRC it reports.
pub fn exchange<T: Read + Write>(
    link: &mut LineReader<T>,
    payload: &[u8],
    timeout: Duration,
) -> Result<u32, SendError> {
    check_payload(payload)?;

    wait_for(link, timeout, "ready prompt", |l| {
        (l == ReportLine::ReadyPrompt).then_some(())
    })?;

    tracing::debug!("> {} bytes", payload.len());
    link.get_mut().write_all(payload)?;
    link.get_mut().flush()?;

    let report = wait_for(link, timeout, "CRC report", |l| match l {
        ReportLine::Report(r) => Some(r),
        _ => None,
    })?;
    match report {
        Report::Updated(crc) => Ok(crc),
        Report::NoData(crc) => Err(SendError::NoData(crc)),
    }
}

pub fn verify(device: u32, payload: &[u8]) -> Result<u32, SendError> {
    let expected = crc32fast::hash(payload);
    if device == expected {
        Ok(device)
    } else {
        Err(SendError::Mismatch { device, expected })
    }
}

pub fn send(args: &SendArgs, tty: Tty) -> eyre::Result<()> {
    let payload = args.payload.load()?;
    let timeout = Duration::from_millis(args.timeout_ms);
    let mut link = LineReader::new(tty);

    let device_crc = exchange(&mut link, &payload, timeout)?;
    let crc = verify(device_crc, &payload)?;
    tracing::info!("{} bytes, CRC 0x{crc:08X} (matches local)", payload.len());
    print!("{}", Report::Updated(crc));
    Ok(())
}
