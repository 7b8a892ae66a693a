//! Lines the device sends back. Existing terminal tooling matches on these verbatim:
//! ```txt
//! Sequential CRC Calculator Started\r\n                      once, at startup
//! UART Ready. Send data...\r\n                              every cycle
//! Updated CRC in Hex is : 0xCBF43926\r\n                    frame received
//! No Data Received, Last Calculated CRC in Hex is : 0xCBF43926\r\n
//! ```

use crate::io::ByteSink;
use core::fmt::{Display, Formatter};

pub const BANNER: &str = "Sequential CRC Calculator Started\r\n";
pub const READY_PROMPT: &str = "UART Ready. Send data...\r\n";
pub const UPDATED_PREFIX: &str = "Updated CRC in Hex is : 0x";
pub const NO_DATA_PREFIX: &str = "No Data Received, Last Calculated CRC in Hex is : 0x";
pub const LINE_END: &str = "\r\n";

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// `value` as 8 uppercase, zero-padded hex digits.
pub fn hex8(value: u32) -> [u8; 8] {
    let mut out = [0u8; 8];
    for (i, digit) in out.iter_mut().enumerate() {
        let nibble = (value >> (28 - 4 * i)) & 0xf;
        *digit = HEX_DIGITS[nibble as usize];
    }
    out
}

/// Result line of one cycle.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Report {
    /// A frame was received; this is its CRC.
    Updated(u32),
    /// Nothing was received; this is the CRC held over from an earlier cycle.
    NoData(u32),
}

impl Report {
    pub fn crc(&self) -> u32 {
        match *self {
            Report::Updated(crc) | Report::NoData(crc) => crc,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            Report::Updated(_) => UPDATED_PREFIX,
            Report::NoData(_) => NO_DATA_PREFIX,
        }
    }

    pub fn write_to<S: ByteSink + ?Sized>(&self, sink: &mut S) -> Result<(), S::Error> {
        sink.send_bytes(self.prefix().as_bytes())?;
        sink.send_bytes(&hex8(self.crc()))?;
        sink.send_bytes(LINE_END.as_bytes())
    }

    /// Parse a report line. Trailing `\r`/`\n` are ignored.
    pub fn parse(line: &str) -> Result<Self, ParseReportError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (make, digits): (fn(u32) -> Report, &str) =
            if let Some(digits) = line.strip_prefix(UPDATED_PREFIX) {
                (Report::Updated, digits)
            } else if let Some(digits) = line.strip_prefix(NO_DATA_PREFIX) {
                (Report::NoData, digits)
            } else {
                return Err(ParseReportError::NotAReport);
            };
        if digits.len() != 8 {
            return Err(ParseReportError::DigitCount(digits.len()));
        }
        if let Some(bad) = digits
            .bytes()
            .find(|b| !(b.is_ascii_digit() || (b'A'..=b'F').contains(b)))
        {
            return Err(ParseReportError::BadDigit(bad));
        }
        let crc = u32::from_str_radix(digits, 16).map_err(|_| ParseReportError::NotAReport)?;
        Ok(make(crc))
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{:08X}{LINE_END}", self.prefix(), self.crc())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ParseReportError {
    NotAReport,
    DigitCount(usize),
    BadDigit(u8),
}

impl Display for ParseReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseReportError::NotAReport => write!(f, "line is not a CRC report"),
            ParseReportError::DigitCount(n) => write!(f, "expected 8 hex digits, found {n}"),
            ParseReportError::BadDigit(b) => {
                write!(f, "invalid hex digit {:?}", char::from(*b))
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseReportError {}

/// Any line the device may emit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReportLine<'l> {
    Banner,
    ReadyPrompt,
    Report(Report),
    Other(&'l str),
}

impl<'l> ReportLine<'l> {
    pub fn classify(line: &'l str) -> Self {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == BANNER.trim_end() {
            ReportLine::Banner
        } else if trimmed == READY_PROMPT.trim_end() {
            ReportLine::ReadyPrompt
        } else if let Ok(report) = Report::parse(trimmed) {
            ReportLine::Report(report)
        } else {
            ReportLine::Other(trimmed)
        }
    }
}
