use crate::arch::dsb;
use bcm2835_lpa::PM;

/// Watchdog ticks between arming and the reset. Short enough that nothing else gets to run.
const RESET_TICKS: u32 = 0x00f;

/// Load the watchdog counter and select a full chip reset for when it expires.
fn arm(pm: &PM, ticks: u32) {
    dsb();
    pm.wdog()
        .write(|w| w.passwd().passwd().time().variant(ticks));
    pm.rstc()
        .modify(|_, w| w.passwd().passwd().wrcfg().full_reset());
    dsb();
}

/// Reset the board. The calculator comes back up from `__symbol_kstart` with a fresh `LastCrc`.
pub fn restart(pm: &PM) -> ! {
    arm(pm, RESET_TICKS);
    loop {
        core::hint::spin_loop();
    }
}
