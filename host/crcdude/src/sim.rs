//! The device loop, run on the host: stdin is the receive line, stdout the transmit line.

use crate::args::SimArgs;
use crcuart_common::{
    ByteSink, ByteSource, Calculator, CollectorConfig, Delay, Report, IDLE_POLL_MS,
};
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

/// Bytes from a reader thread on one side, any writer on the other.
pub struct ChannelLink<W> {
    rx: Receiver<u8>,
    tx: W,
    disconnected: bool,
}

impl<W: Write> ChannelLink<W> {
    pub fn new(rx: Receiver<u8>, tx: W) -> Self {
        Self {
            rx,
            tx,
            disconnected: false,
        }
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.tx
    }

    /// Whether the sending side has gone away and every byte it sent has been received.
    pub fn is_drained(&self) -> bool {
        self.disconnected
    }
}

impl<W: Write> ByteSource for ChannelLink<W> {
    fn try_receive_byte(&mut self) -> Option<u8> {
        match self.rx.try_recv() {
            Ok(b) => Some(b),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.disconnected {
                    tracing::debug!("input closed");
                    self.disconnected = true;
                }
                None
            }
        }
    }
}

impl<W: Write> ByteSink for ChannelLink<W> {
    type Error = io::Error;

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(bytes)?;
        self.tx.flush()
    }
}

/// Real-time delay.
#[derive(Debug, Default, Copy, Clone)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_millis(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

fn spawn_stdin_reader() -> Receiver<u8> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = [0u8; 256];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if buf[..n].iter().try_for_each(|&b| tx.send(b)).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("[sim]: failed to read from stdin: {e}");
                    break;
                }
            }
        }
    });
    rx
}

pub fn config_from(args: &SimArgs) -> CollectorConfig {
    CollectorConfig {
        capacity: args.capacity,
        idle_threshold: args.idle_ms / IDLE_POLL_MS,
    }
}

pub fn sim(args: &SimArgs) -> eyre::Result<()> {
    let config = config_from(args);
    tracing::info!(
        "simulating device: {} byte frames, {}ms idle timeout",
        config.capacity,
        args.idle_ms
    );
    let link = ChannelLink::new(spawn_stdin_reader(), io::stdout());
    let mut buffer = vec![0u8; config.capacity];
    let mut calculator = Calculator::new(link, ThreadDelay, &mut buffer, config);

    calculator.start()?;
    let mut cycles = 0u64;
    loop {
        let report = calculator.cycle()?;
        cycles += 1;
        if args.cycles.is_some_and(|limit| cycles >= limit) {
            return Ok(());
        }
        if matches!(report, Report::NoData(_)) && calculator.link().is_drained() {
            tracing::info!("stdin closed, stopping after {cycles} cycles");
            return Ok(());
        }
    }
}
