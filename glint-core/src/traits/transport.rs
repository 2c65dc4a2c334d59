//! Byte transport trait for the command link

/// Non-blocking source of command stream bytes
pub trait ByteSource {
    type Error;

    /// Copy whatever bytes are ready into `buf`
    ///
    /// Returns the number of bytes written, 0 when nothing is pending.
    /// Must not block waiting for data.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    type Error = T::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).read_available(buf)
    }
}
