//! UART command link
//!
//! Adapts the interrupt-driven buffered UART to the engine's non-blocking
//! byte source. Bytes land in the driver's ring buffer between polls.

use embassy_rp::uart::{BufferedUartRx, Error as UartError};
use embedded_io::{Read, ReadReady};

use glint_core::traits::ByteSource;

pub struct UartLink {
    rx: BufferedUartRx,
}

impl UartLink {
    pub fn new(rx: BufferedUartRx) -> Self {
        Self { rx }
    }
}

impl ByteSource for UartLink {
    type Error = UartError;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, UartError> {
        if buf.is_empty() || !self.rx.read_ready()? {
            return Ok(0);
        }
        // Data is buffered, so this returns without waiting
        self.rx.read(buf)
    }
}
