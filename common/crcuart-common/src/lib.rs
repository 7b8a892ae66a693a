#![cfg_attr(not(any(feature = "std", test)), no_std)]
//! Core of the sequential CRC calculator, shared by the `crcuart-device` firmware and the
//! `crcdude` host tool.

/// The baud rate the device runs its UART at (8N1, no flow control).
pub const BAUD_RATE: u32 = 937_500;

/// Largest frame a single CRC calculation covers.
pub const MAX_DATA_LEN: usize = 4096;

/// Number of consecutive empty polls after which a frame is considered complete.
pub const IDLE_TIMEOUT_MS: u32 = 500;

/// Delay between two empty polls of the byte source.
pub const IDLE_POLL_MS: u32 = 1;

/// Collect-compute-report loop.
pub mod calculator;
/// Idle-timeout frame assembly.
pub mod collect;
/// Bit-serial CRC-32 (Ethernet).
pub mod crc32;
/// Transport and timing traits the core is generic over.
pub mod io;
/// Text protocol spoken back to the host.
pub mod report;

pub use calculator::{Calculator, LastCrc};
pub use collect::{
    CollectStep, CollectorConfig, CollectorState, Frame, FrameCollector, Termination,
};
pub use io::{ByteSink, ByteSource, Delay};
pub use report::{ParseReportError, Report, ReportLine};

#[cfg(test)]
pub(crate) mod testing;
