//! GC9A01 round TFT driver
//!
//! Driver for 240x240 GC9A01 panels over 4-wire SPI (SCK, MOSI, CS, DC)
//! with a hardware reset line. Pixels are RGB565, sent big-endian.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use glint_display::{DisplayError, PanelBackend};

/// Panel dimensions
pub const WIDTH: u16 = 240;
pub const HEIGHT: u16 = 240;

/// Pixels converted per SPI transfer
const CHUNK_PIXELS: usize = 64;

/// GC9A01 commands
#[allow(dead_code)]
mod cmd {
    pub const SLEEP_OUT: u8 = 0x11;
    pub const INVERT_ON: u8 = 0x21;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDR: u8 = 0x2A;
    pub const ROW_ADDR: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const TEARING_ON: u8 = 0x35;
    pub const MEMORY_ACCESS: u8 = 0x36;
    pub const PIXEL_FORMAT: u8 = 0x3A;
    pub const INTER_ENABLE_1: u8 = 0xFE;
    pub const INTER_ENABLE_2: u8 = 0xEF;
}

/// Vendor power-up sequence: (command, parameters)
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (cmd::INTER_ENABLE_2, &[]),
    (0xEB, &[0x14]),
    (cmd::INTER_ENABLE_1, &[]),
    (cmd::INTER_ENABLE_2, &[]),
    (0xEB, &[0x14]),
    (0x84, &[0x40]),
    (0x85, &[0xFF]),
    (0x86, &[0xFF]),
    (0x87, &[0xFF]),
    (0x88, &[0x0A]),
    (0x89, &[0x21]),
    (0x8A, &[0x00]),
    (0x8B, &[0x80]),
    (0x8C, &[0x01]),
    (0x8D, &[0x01]),
    (0x8E, &[0xFF]),
    (0x8F, &[0xFF]),
    (0xB6, &[0x00, 0x20]),
    (cmd::MEMORY_ACCESS, &[0x08]), // BGR order
    (cmd::PIXEL_FORMAT, &[0x05]),  // 16 bits per pixel
    (0x90, &[0x08, 0x08, 0x08, 0x08]),
    (0xBD, &[0x06]),
    (0xBC, &[0x00]),
    (0xFF, &[0x60, 0x01, 0x04]),
    (0xC3, &[0x13]),
    (0xC4, &[0x13]),
    (0xC9, &[0x22]),
    (0xBE, &[0x11]),
    (0xE1, &[0x10, 0x0E]),
    (0xDF, &[0x21, 0x0C, 0x02]),
    (0xF0, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF1, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xF2, &[0x45, 0x09, 0x08, 0x08, 0x26, 0x2A]),
    (0xF3, &[0x43, 0x70, 0x72, 0x36, 0x37, 0x6F]),
    (0xED, &[0x1B, 0x0B]),
    (0xAE, &[0x77]),
    (0xCD, &[0x63]),
    (
        0x70,
        &[0x07, 0x07, 0x04, 0x0E, 0x0F, 0x09, 0x07, 0x08, 0x03],
    ),
    (0xE8, &[0x34]),
    (
        0x62,
        &[
            0x18, 0x0D, 0x71, 0xED, 0x70, 0x70, 0x18, 0x0F, 0x71, 0xEF, 0x70, 0x70,
        ],
    ),
    (
        0x63,
        &[
            0x18, 0x11, 0x71, 0xF1, 0x70, 0x70, 0x18, 0x13, 0x71, 0xF3, 0x70, 0x70,
        ],
    ),
    (0x64, &[0x28, 0x29, 0xF1, 0x01, 0xF1, 0x00, 0x07]),
    (
        0x66,
        &[0x3C, 0x00, 0xCD, 0x67, 0x45, 0x45, 0x10, 0x00, 0x00, 0x00],
    ),
    (
        0x67,
        &[0x00, 0x3C, 0x00, 0x00, 0x00, 0x01, 0x54, 0x10, 0x32, 0x98],
    ),
    (0x74, &[0x10, 0x85, 0x80, 0x00, 0x00, 0x4E, 0x00]),
    (0x98, &[0x3E, 0x07]),
    (cmd::TEARING_ON, &[]),
    (cmd::INVERT_ON, &[]),
];

/// GC9A01 panel
pub struct Gc9a01<SPI, DC, CS, RST> {
    spi: SPI,
    dc: DC,
    cs: CS,
    rst: RST,
    initialized: bool,
}

impl<SPI, DC, CS, RST> Gc9a01<SPI, DC, CS, RST>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
{
    /// Create a new GC9A01 driver
    pub fn new(spi: SPI, dc: DC, cs: CS, rst: RST) -> Self {
        Self {
            spi,
            dc,
            cs,
            rst,
            initialized: false,
        }
    }

    /// Reset and initialize the panel
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), DisplayError> {
        self.cs.set_high().map_err(|_| DisplayError::Communication)?;
        self.rst.set_high().map_err(|_| DisplayError::Communication)?;
        delay.delay_ms(10);
        self.rst.set_low().map_err(|_| DisplayError::Communication)?;
        delay.delay_ms(10);
        self.rst.set_high().map_err(|_| DisplayError::Communication)?;
        delay.delay_ms(120);

        for &(command, params) in INIT_SEQUENCE {
            self.command(command, params)?;
        }

        self.command(cmd::SLEEP_OUT, &[])?;
        delay.delay_ms(120);
        self.command(cmd::DISPLAY_ON, &[])?;
        delay.delay_ms(20);

        self.initialized = true;
        Ok(())
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|_| DisplayError::Communication)?;
        let result = self.send(command, params);
        self.cs.set_high().map_err(|_| DisplayError::Communication)?;
        result
    }

    /// Send one command and its parameters with CS already asserted
    fn send(&mut self, command: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|_| DisplayError::Communication)?;
        self.spi
            .write(&[command])
            .map_err(|_| DisplayError::Communication)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(|_| DisplayError::Communication)?;
            self.spi
                .write(params)
                .map_err(|_| DisplayError::Communication)?;
        }
        self.spi.flush().map_err(|_| DisplayError::Communication)
    }

    /// Set the drawing window to the whole panel
    fn set_full_window(&mut self) -> Result<(), DisplayError> {
        let [xh, xl] = (WIDTH - 1).to_be_bytes();
        let [yh, yl] = (HEIGHT - 1).to_be_bytes();
        self.command(cmd::COLUMN_ADDR, &[0, 0, xh, xl])?;
        self.command(cmd::ROW_ADDR, &[0, 0, yh, yl])
    }

    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        self.dc.set_low().map_err(|_| DisplayError::Communication)?;
        self.spi
            .write(&[cmd::MEMORY_WRITE])
            .map_err(|_| DisplayError::Communication)?;
        self.dc.set_high().map_err(|_| DisplayError::Communication)?;

        let mut bytes = [0u8; CHUNK_PIXELS * 2];
        for chunk in pixels.chunks(CHUNK_PIXELS) {
            for (dst, &pixel) in bytes.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&pixel.to_be_bytes());
            }
            self.spi
                .write(&bytes[..chunk.len() * 2])
                .map_err(|_| DisplayError::Communication)?;
        }
        self.spi.flush().map_err(|_| DisplayError::Communication)
    }
}

impl<SPI, DC, CS, RST> PanelBackend for Gc9a01<SPI, DC, CS, RST>
where
    SPI: SpiBus,
    DC: OutputPin,
    CS: OutputPin,
    RST: OutputPin,
{
    fn dimensions(&self) -> (u16, u16) {
        (WIDTH, HEIGHT)
    }

    fn write_frame(&mut self, pixels: &[u16]) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::NotInitialized);
        }
        if pixels.len() != WIDTH as usize * HEIGHT as usize {
            return Err(DisplayError::InvalidDimensions);
        }

        self.set_full_window()?;
        self.cs.set_low().map_err(|_| DisplayError::Communication)?;
        let result = self.write_pixels(pixels);
        self.cs.set_high().map_err(|_| DisplayError::Communication)?;
        result
    }
}
