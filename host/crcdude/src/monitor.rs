use crate::lines::LineReader;
use crate::tty::Tty;
use crcuart_common::ReportLine;
use std::io::{self, ErrorKind, Write};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Echo device output to stdout until the device goes away.
pub fn monitor(tty: Tty) -> eyre::Result<()> {
    let path = tty.path().to_path_buf();
    let mut lines = LineReader::new(tty);
    let mut stdout = io::stdout();
    loop {
        let line = match lines.next_line(POLL_INTERVAL) {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                tracing::info!("{} disconnected", path.display());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        match ReportLine::classify(&line) {
            ReportLine::Banner => tracing::info!("device (re)started"),
            ReportLine::ReadyPrompt => tracing::trace!("cycle start"),
            ReportLine::Report(report) => tracing::debug!("{report:?}"),
            ReportLine::Other(other) => tracing::warn!("unrecognised line: {other:?}"),
        }
        stdout.write_all(line.as_bytes())?;
        stdout.flush()?;
    }
}
