//! Deterministic link and clock for driving the collector without real time.

use crate::io::{ByteSink, ByteSource, Delay};
use std::cell::Cell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

/// Millisecond clock that only moves when something delays on it.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<u64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Delay for VirtualClock {
    fn delay_millis(&mut self, ms: u32) {
        self.now.set(self.now.get() + u64::from(ms));
    }
}

/// Serial link whose incoming bytes become available at scripted times on a [`VirtualClock`].
#[derive(Debug)]
pub struct ScriptedLink {
    clock: VirtualClock,
    incoming: VecDeque<(u64, u8)>,
    pub sent: Vec<u8>,
}

impl ScriptedLink {
    pub fn new(clock: &VirtualClock) -> Self {
        Self {
            clock: clock.clone(),
            incoming: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Queue `bytes` to arrive back-to-back at `at_ms`.
    pub fn schedule_at(&mut self, at_ms: u64, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().map(|&b| (at_ms, b)));
    }

    pub fn sent_text(&self) -> &str {
        std::str::from_utf8(&self.sent).expect("device output should be ASCII")
    }
}

impl ByteSource for ScriptedLink {
    fn try_receive_byte(&mut self) -> Option<u8> {
        match self.incoming.front() {
            Some(&(at, byte)) if at <= self.clock.now() => {
                self.incoming.pop_front();
                Some(byte)
            }
            _ => None,
        }
    }
}

impl ByteSink for ScriptedLink {
    type Error = Infallible;

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.sent.extend_from_slice(bytes);
        Ok(())
    }
}
