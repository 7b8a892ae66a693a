//! Frame assembly with an idle timeout.
//!
//! There is no framing on the wire: a frame is whatever arrives before the link has been silent for
//! `idle_threshold` consecutive polls (one poll per [`IDLE_POLL_MS`]), or until the buffer is full.
//! ```txt
//!        cycle start        byte               idle == threshold || len == capacity
//!  Idle ------------> Idle ------> Collecting ---------------------------------------> Done
//!                      |  \_____________^  ^___|  byte (idle := 0)                      ^
//!                      |_______________________________________________________________|
//!                                  idle == threshold (empty frame)
//! ```

use crate::io::{ByteSource, Delay};
use crate::{IDLE_POLL_MS, IDLE_TIMEOUT_MS, MAX_DATA_LEN};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CollectorConfig {
    /// Upper bound on the frame length. Clamped to the size of the backing storage.
    pub capacity: usize,
    /// Number of consecutive empty polls that ends a frame.
    pub idle_threshold: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_DATA_LEN,
            idle_threshold: IDLE_TIMEOUT_MS / IDLE_POLL_MS,
        }
    }
}

/// Why a frame ended.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Termination {
    IdleTimeout,
    BufferFull,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CollectorState {
    Idle,
    Collecting,
    Done(Termination),
}

/// Outcome of a single [`FrameCollector::step`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CollectStep {
    /// A byte was appended to the frame.
    Received(u8),
    /// Nothing was queued; waited one poll interval.
    Waited,
    /// The frame is complete. Further steps keep returning this until [`FrameCollector::reset`].
    Done(Termination),
}

/// A completed frame. Borrowed from the collector until the next cycle starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Frame<'f> {
    pub bytes: &'f [u8],
    pub termination: Termination,
}

impl Frame<'_> {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug)]
pub struct FrameCollector<'a> {
    storage: &'a mut [u8],
    capacity: usize,
    idle_threshold: u32,

    cursor: usize,
    idle_counter: u32,
    state: CollectorState,
}

impl<'a> FrameCollector<'a> {
    pub fn new(storage: &'a mut [u8], config: CollectorConfig) -> Self {
        let capacity = config.capacity.min(storage.len());
        Self {
            storage,
            capacity,
            idle_threshold: config.idle_threshold,
            cursor: 0,
            idle_counter: 0,
            state: CollectorState::Idle,
        }
    }

    /// Start a new cycle, forgetting the previous frame.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.idle_counter = 0;
        self.state = CollectorState::Idle;
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn idle_counter(&self) -> u32 {
        self.idle_counter
    }

    /// The bytes collected so far in this cycle.
    pub fn bytes(&self) -> &[u8] {
        &self.storage[..self.cursor]
    }

    fn exit_condition(&self) -> Option<Termination> {
        if self.cursor >= self.capacity {
            Some(Termination::BufferFull)
        } else if self.idle_counter >= self.idle_threshold {
            Some(Termination::IdleTimeout)
        } else {
            None
        }
    }

    /// Advance the state machine by one poll of `source`.
    pub fn step<S, D>(&mut self, source: &mut S, delay: &mut D) -> CollectStep
    where
        S: ByteSource + ?Sized,
        D: Delay + ?Sized,
    {
        if let CollectorState::Done(termination) = self.state {
            return CollectStep::Done(termination);
        }
        if let Some(termination) = self.exit_condition() {
            self.state = CollectorState::Done(termination);
            log::debug!(
                "frame complete: {} bytes ({termination:?})",
                self.cursor
            );
            return CollectStep::Done(termination);
        }
        match source.try_receive_byte() {
            Some(byte) => {
                self.storage[self.cursor] = byte;
                self.cursor += 1;
                self.idle_counter = 0;
                self.state = CollectorState::Collecting;
                CollectStep::Received(byte)
            }
            None => {
                delay.delay_millis(IDLE_POLL_MS);
                self.idle_counter += 1;
                CollectStep::Waited
            }
        }
    }

    /// Run one full cycle: reset, then step until the frame is done.
    pub fn collect<S, D>(&mut self, source: &mut S, delay: &mut D) -> Frame<'_>
    where
        S: ByteSource + ?Sized,
        D: Delay + ?Sized,
    {
        self.reset();
        let termination = loop {
            if let CollectStep::Done(termination) = self.step(source, delay) {
                break termination;
            }
        };
        Frame {
            bytes: &self.storage[..self.cursor],
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedLink, VirtualClock};

    fn collector(storage: &mut [u8]) -> FrameCollector<'_> {
        FrameCollector::new(storage, CollectorConfig::default())
    }

    #[test]
    fn default_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.capacity, 4096);
        assert_eq!(config.idle_threshold, 500);
    }

    #[test]
    fn silence_yields_empty_frame_after_threshold() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        let mut delay = clock.clone();
        let mut storage = [0u8; MAX_DATA_LEN];
        let mut fc = collector(&mut storage);

        let frame = fc.collect(&mut link, &mut delay);
        assert!(frame.is_empty());
        assert_eq!(frame.termination, Termination::IdleTimeout);
        assert_eq!(clock.now(), 500);
        assert_eq!(fc.state(), CollectorState::Done(Termination::IdleTimeout));
    }

    #[test]
    fn single_byte_then_silence() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        link.schedule_at(120, b"A");
        let mut delay = clock.clone();
        let mut storage = [0u8; MAX_DATA_LEN];
        let mut fc = collector(&mut storage);

        let frame = fc.collect(&mut link, &mut delay);
        assert_eq!(frame.bytes, b"A");
        assert_eq!(frame.termination, Termination::IdleTimeout);
        // idle counter restarts at the byte, so the frame ends 500ms after it
        assert_eq!(clock.now(), 620);
    }

    #[test]
    fn gap_below_threshold_keeps_frame_open() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        link.schedule_at(0, b"12345");
        link.schedule_at(499, b"6789");
        let mut delay = clock.clone();
        let mut storage = [0u8; MAX_DATA_LEN];
        let mut fc = collector(&mut storage);

        let frame = fc.collect(&mut link, &mut delay);
        assert_eq!(frame.bytes, b"123456789");
        assert_eq!(frame.termination, Termination::IdleTimeout);
    }

    #[test]
    fn gap_at_threshold_splits_frames() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        link.schedule_at(0, b"1234");
        link.schedule_at(501, b"5678");
        let mut delay = clock.clone();
        let mut storage = [0u8; MAX_DATA_LEN];
        let mut fc = collector(&mut storage);

        assert_eq!(fc.collect(&mut link, &mut delay).bytes, b"1234");
        assert_eq!(clock.now(), 500);
        assert_eq!(fc.collect(&mut link, &mut delay).bytes, b"5678");
    }

    #[test]
    fn stream_longer_than_buffer_is_cut_at_capacity() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        let data: std::vec::Vec<u8> = (0..5000u32).map(|i| (i * 7) as u8).collect();
        link.schedule_at(0, &data);
        let mut delay = clock.clone();
        let mut storage = [0u8; MAX_DATA_LEN];
        let mut fc = collector(&mut storage);

        let frame = fc.collect(&mut link, &mut delay);
        assert_eq!(frame.termination, Termination::BufferFull);
        assert_eq!(frame.bytes.len(), MAX_DATA_LEN);
        assert_eq!(frame.bytes, &data[..MAX_DATA_LEN]);
        // buffer-full ends the frame without waiting
        assert_eq!(clock.now(), 0);

        // the remainder forms the next frame
        let frame = fc.collect(&mut link, &mut delay);
        assert_eq!(frame.termination, Termination::IdleTimeout);
        assert_eq!(frame.bytes, &data[MAX_DATA_LEN..]);
    }

    #[test]
    fn capacity_clamped_to_storage() {
        let mut storage = [0u8; 16];
        let fc = FrameCollector::new(&mut storage, CollectorConfig::default());
        assert_eq!(fc.capacity(), 16);
    }

    #[test]
    fn stepping_reports_each_poll() {
        let clock = VirtualClock::new();
        let mut link = ScriptedLink::new(&clock);
        link.schedule_at(1, b"xy");
        let mut delay = clock.clone();
        let mut storage = [0u8; 8];
        let mut fc = FrameCollector::new(
            &mut storage,
            CollectorConfig {
                capacity: 8,
                idle_threshold: 3,
            },
        );

        assert_eq!(fc.state(), CollectorState::Idle);
        assert_eq!(fc.step(&mut link, &mut delay), CollectStep::Waited);
        assert_eq!(fc.idle_counter(), 1);
        assert_eq!(fc.state(), CollectorState::Idle);
        assert_eq!(fc.step(&mut link, &mut delay), CollectStep::Received(b'x'));
        assert_eq!(fc.idle_counter(), 0);
        assert_eq!(fc.state(), CollectorState::Collecting);
        assert_eq!(fc.step(&mut link, &mut delay), CollectStep::Received(b'y'));
        for _ in 0..3 {
            assert_eq!(fc.step(&mut link, &mut delay), CollectStep::Waited);
        }
        assert_eq!(
            fc.step(&mut link, &mut delay),
            CollectStep::Done(Termination::IdleTimeout)
        );
        assert_eq!(
            fc.step(&mut link, &mut delay),
            CollectStep::Done(Termination::IdleTimeout)
        );
        assert_eq!(fc.bytes(), b"xy");
        assert_eq!(fc.len(), 2);

        fc.reset();
        assert!(fc.is_empty());
        assert_eq!(fc.state(), CollectorState::Idle);
    }
}
