use crate::arch::dsb;
use bcm2835_lpa::SYSTMR;
use crcuart_common::Delay;

// no dsb()'s: used in tight loops that touch no other peripheral
fn __floating_time_unguarded(st: &SYSTMR) -> u64 {
    loop {
        let hi = st.chi().read().bits();
        let lo = st.clo().read().bits();
        // CLO wrapped between the two reads
        if st.chi().read().bits() == hi {
            return ((hi as u64) << 32) | lo as u64;
        }
    }
}

/// Blocking wait for (at least) `microseconds` microseconds.
pub fn delay_micros(st: &SYSTMR, microseconds: u64) {
    dsb();
    let start = __floating_time_unguarded(st);
    while __floating_time_unguarded(st).wrapping_sub(start) < microseconds {}
    dsb();
}

/// The system timer as the calculator's millisecond delay.
#[derive(Debug)]
pub struct SystemTimer<'p> {
    st: &'p SYSTMR,
}

impl<'p> SystemTimer<'p> {
    pub fn new(st: &'p SYSTMR) -> Self {
        Self { st }
    }
}

impl Delay for SystemTimer<'_> {
    fn delay_millis(&mut self, ms: u32) {
        delay_micros(self.st, u64::from(ms) * 1000);
    }
}
