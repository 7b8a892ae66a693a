use crate::collect::{CollectorConfig, FrameCollector};
use crate::crc32;
use crate::io::{ByteSink, ByteSource, Delay};
use crate::report::{Report, BANNER, READY_PROMPT};
use core::convert::Infallible;

/// The CRC of the most recent non-empty frame. Survives across cycles; only a non-empty frame
/// replaces it.
///
/// Before any frame has been received the held value is `0x00000000`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LastCrc {
    value: u32,
    updates: u32,
}

impl LastCrc {
    pub const fn new() -> Self {
        Self {
            value: 0,
            updates: 0,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Whether any frame has produced a CRC yet.
    pub fn is_computed(&self) -> bool {
        self.updates > 0
    }

    /// Number of frames whose CRC has been computed.
    pub fn updates(&self) -> u32 {
        self.updates
    }

    fn replace(&mut self, crc: u32) {
        self.value = crc;
        self.updates = self.updates.wrapping_add(1);
    }
}

/// Collect-compute-report loop over a serial `link`.
pub struct Calculator<'b, L, D> {
    link: L,
    delay: D,
    collector: FrameCollector<'b>,
    last_crc: LastCrc,
}

impl<'b, L, D> Calculator<'b, L, D>
where
    L: ByteSource + ByteSink,
    D: Delay,
{
    pub fn new(link: L, delay: D, buffer: &'b mut [u8], config: CollectorConfig) -> Self {
        Self {
            link,
            delay,
            collector: FrameCollector::new(buffer, config),
            last_crc: LastCrc::new(),
        }
    }

    pub fn last_crc(&self) -> LastCrc {
        self.last_crc
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Send the startup banner.
    pub fn start(&mut self) -> Result<(), L::Error> {
        self.link.send_bytes(BANNER.as_bytes())
    }

    /// One pass: prompt, collect a frame, compute its CRC if it has any bytes, report.
    pub fn cycle(&mut self) -> Result<Report, L::Error> {
        log::trace!("cycle start");
        self.link.send_bytes(READY_PROMPT.as_bytes())?;

        let frame = self.collector.collect(&mut self.link, &mut self.delay);
        let report = if frame.is_empty() {
            if self.last_crc.is_computed() {
                log::debug!("no data received, holding {:08X}", self.last_crc.value());
            } else {
                log::debug!("no data received, no CRC computed yet");
            }
            Report::NoData(self.last_crc.value())
        } else {
            let crc = crc32::compute(frame.bytes);
            log::debug!(
                "{} byte frame ({:?}) -> {crc:08X}",
                frame.bytes.len(),
                frame.termination
            );
            self.last_crc.replace(crc);
            log::trace!("{} frames so far", self.last_crc.updates());
            Report::Updated(crc)
        };

        report.write_to(&mut self.link)?;
        Ok(report)
    }

    /// Runs forever; only returns if the link fails to send.
    pub fn run(&mut self) -> Result<Infallible, L::Error> {
        self.start()?;
        loop {
            self.cycle()?;
        }
    }
}
