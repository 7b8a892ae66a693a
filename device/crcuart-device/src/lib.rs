#![cfg_attr(target_os = "none", no_std)]
//! Sequential CRC calculator firmware for the BCM2835 (Raspberry Pi Zero).
//!
//! Reads whatever arrives on the mini UART until the line has been quiet for 500ms (or 4096 bytes
//! have arrived), and answers with the CRC-32 of it.

use bcm2835_lpa::Peripherals;
use crcuart_common::{Calculator, CollectorConfig, BAUD_RATE, MAX_DATA_LEN};

pub mod arch;
pub mod mini_uart;
pub mod timing;
pub mod watchdog;

#[no_mangle]
pub extern "C" fn __symbol_kstart() -> ! {
    // NOTE: BSS is zeroed in _start (boot.S), before we get here.
    let peripherals = unsafe { Peripherals::steal() };

    mini_uart::muart1_init(
        &peripherals.GPIO,
        &peripherals.AUX,
        &peripherals.UART1,
        mini_uart::baud_to_clock_divider(BAUD_RATE),
    );

    let link = mini_uart::MiniUart::new(&peripherals.UART1);
    let delay = timing::SystemTimer::new(&peripherals.SYSTMR);
    let mut rx_buffer = [0u8; MAX_DATA_LEN];
    let mut calculator = Calculator::new(link, delay, &mut rx_buffer, CollectorConfig::default());

    // The mini UART cannot fail to send, so this never returns.
    match calculator.run() {
        Ok(never) => match never {},
        Err(never) => match never {},
    }
}

#[no_mangle]
pub extern "C" fn __symbol_kreboot() -> ! {
    let peripherals = unsafe { Peripherals::steal() };
    mini_uart::mini_uart1_flush_tx(&peripherals.UART1);
    watchdog::restart(&peripherals.PM)
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    __symbol_kreboot();
}
