use std::io::{self, ErrorKind, Read};
use std::time::{Duration, Instant};

/// Longest partial line kept while waiting for its `\n`. Every line the device sends is far
/// shorter; anything longer is line noise (or a baud rate mismatch) and is handed out as is.
pub const MAX_LINE_LEN: usize = 512;

/// Splits a byte stream from the device into `\n`-terminated lines.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Next complete line, terminator included. `Ok(None)` if `timeout` passes, or the stream ends,
    /// before one is complete; partial data is kept for the next call. A partial line that reaches
    /// [`MAX_LINE_LEN`] bytes is returned without a terminator.
    pub fn next_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        let start = Instant::now();
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            if self.pending.len() >= MAX_LINE_LEN {
                tracing::warn!("no line break in {MAX_LINE_LEN} bytes, flushing partial line");
                let line: Vec<u8> = self.pending.drain(..MAX_LINE_LEN).collect();
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }
            if start.elapsed() > timeout {
                return Ok(None);
            }
            let mut buf = [0u8; 256];
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                    ) =>
                {
                    tracing::trace!("read timeout");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_newline() {
        let input: &[u8] = b"UART Ready. Send data...\r\nUpdated CRC in Hex is : 0xD3D99E8B\r\npart";
        let mut lines = LineReader::new(input);
        let t = Duration::from_millis(10);
        assert_eq!(
            lines.next_line(t).unwrap().as_deref(),
            Some("UART Ready. Send data...\r\n")
        );
        assert_eq!(
            lines.next_line(t).unwrap().as_deref(),
            Some("Updated CRC in Hex is : 0xD3D99E8B\r\n")
        );
        assert_eq!(lines.next_line(t).unwrap(), None);
        assert_eq!(lines.pending, b"part");
    }

    #[test]
    fn unterminated_noise_is_flushed_in_bounded_pieces() {
        let mut input = vec![0xAAu8; MAX_LINE_LEN * 2 + 10];
        input.extend_from_slice(b"UART Ready. Send data...\r\n");
        let mut lines = LineReader::new(input.as_slice());
        let t = Duration::from_millis(10);

        for _ in 0..2 {
            let noise = lines.next_line(t).unwrap().unwrap();
            assert!(!noise.ends_with('\n'));
            assert!(matches!(
                crcuart_common::ReportLine::classify(&noise),
                crcuart_common::ReportLine::Other(_)
            ));
            assert!(lines.pending.len() < MAX_LINE_LEN + 256);
        }
        // the last 10 noise bytes stay attached to the next real line
        let line = lines.next_line(t).unwrap().unwrap();
        assert!(line.ends_with("UART Ready. Send data...\r\n"));
        assert_eq!(lines.next_line(t).unwrap(), None);
    }
}
