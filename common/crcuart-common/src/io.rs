/// Non-blocking receive side of the serial link.
pub trait ByteSource {
    /// Returns the next queued byte, or `None` if nothing has arrived yet. Never blocks.
    fn try_receive_byte(&mut self) -> Option<u8>;
}

/// Transmit side of the serial link.
pub trait ByteSink {
    type Error;

    /// Returns once every byte has been handed to the transport.
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Blocking millisecond wait. This is the only place the calculator suspends.
pub trait Delay {
    fn delay_millis(&mut self, ms: u32);
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn try_receive_byte(&mut self) -> Option<u8> {
        (**self).try_receive_byte()
    }
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    type Error = T::Error;

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).send_bytes(bytes)
    }
}

impl<T: Delay + ?Sized> Delay for &mut T {
    fn delay_millis(&mut self, ms: u32) {
        (**self).delay_millis(ms)
    }
}
