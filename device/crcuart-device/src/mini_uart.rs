use crate::arch::dsb;
use bcm2835_lpa::{AUX, GPIO, UART1};
use core::convert::Infallible;
use crcuart_common::{ByteSink, ByteSource};

const MINI_UART_CLOCK_RATE: u32 = 250_000_000;

/// Calculate a value for the Mini UART clock divider from the desired baud rate.
pub const fn baud_to_clock_divider(baud_rate: u32) -> u16 {
    ((MINI_UART_CLOCK_RATE / (8 * baud_rate)) - 1) as u16
}

/// Route UART1 to GPIO14/15 and bring it up in 8N1 with no flow control and interrupts off.
pub fn muart1_init(gpio: &GPIO, aux: &AUX, uart: &UART1, clock_divider: u16) {
    dsb();

    gpio.gpfsel1()
        .modify(|_, w| w.fsel14().txd1().fsel15().rxd1());

    dsb();

    aux.enables().modify(|_, w| w.uart_1().set_bit());

    dsb();

    uart.cntl()
        .write(|w| w.tx_enable().clear_bit().rx_enable().clear_bit());

    unsafe { uart.ier().write_with_zero(|w| w.bits(0)) };
    // names are wrong - functionality on writing is different from functionality on read.
    // writing 11 to bits 3:2 will clear both FIFOs
    uart.iir()
        .modify(|_, w| w.tx_ready().set_bit().data_ready().set_bit());
    uart.baud().write(|w| unsafe { w.bits(clock_divider) });
    uart.lcr().write(|w| w.data_size()._8bit());
    uart.mcr().write(|w| w.rts().clear_bit());
    uart.cntl().modify(|_, w| {
        w.cts_enable()
            .clear_bit()
            .rts_enable()
            .clear_bit()
            .tx_enable()
            .set_bit()
            .rx_enable()
            .set_bit()
    });

    dsb();
}

/// Block until the transmitter has shifted out everything, FIFO included.
pub fn mini_uart1_flush_tx(uart: &UART1) {
    dsb();
    while !uart.stat().read().tx_done().bit_is_set() {}
    dsb();
}

/// The mini UART as the calculator's serial link. Polled; no interrupts.
#[derive(Debug)]
pub struct MiniUart<'p> {
    uart: &'p UART1,
}

impl<'p> MiniUart<'p> {
    pub fn new(uart: &'p UART1) -> Self {
        Self { uart }
    }

    fn write8(&mut self, b: u8) {
        while !self.uart.stat().read().tx_ready().bit_is_set() {}
        self.uart.io().write(|w| unsafe { w.data().bits(b) });
    }
}

impl ByteSource for MiniUart<'_> {
    fn try_receive_byte(&mut self) -> Option<u8> {
        dsb();
        let r = if self.uart.stat().read().data_ready().bit_is_set() {
            Some(self.uart.io().read().data().bits())
        } else {
            None
        };
        dsb();
        r
    }
}

impl ByteSink for MiniUart<'_> {
    type Error = Infallible;

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        dsb();
        for &b in bytes {
            self.write8(b);
        }
        dsb();
        Ok(())
    }
}
