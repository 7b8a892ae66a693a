/// Data synchronization barrier. Required between accesses to different peripherals on the
/// BCM2835, since the bus does not keep them in order.
#[cfg(target_arch = "arm")]
#[inline]
pub fn dsb() {
    unsafe {
        core::arch::asm!(
            // DSB is marked as SBZ, Should Be Zero.
            // See: arm1176.pdf 3-70, 3-71
            "mcr p15,0,{tmp},c7,c10,4",
            tmp = in(reg) 0,
        );
    }
}

#[cfg(not(target_arch = "arm"))]
#[inline]
pub fn dsb() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
