//! Glint - Serial-Driven Animated Display Firmware
//!
//! Main firmware binary for RP2040 boards with a GC9A01 round panel
//! (e.g. Waveshare RP2040-LCD-1.28). A host streams hex command frames over
//! UART0; the device builds a scene from them and loops its animation.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Instant, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use glint_core::config::{parse_config, DeviceConfig};
use glint_core::{Applied, Engine, PollReport, Runner};
use glint_display::Compositor;

use crate::gc9a01::Gc9a01;
use crate::transport::UartLink;

mod gc9a01;
mod transport;

// Heap allocator for the framebuffer, scene pixels and frame assembly
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 192KB (the 240x240 RGB565 framebuffer alone is 112.5KB)
const HEAP_SIZE: usize = 192 * 1024;

/// Embedded configuration (compiled into firmware)
/// Edit device.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Script shown at boot until the host sends its own scene
const SPLASH_SCRIPT: &[u8] = include_bytes!("../splash.glint");

/// Pause between loop iterations
const LOOP_YIELD_MS: u64 = 1;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 2048]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Glint firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Config: {}x{} panel, {} baud, frame limit {} bytes",
        config.display.width, config.display.height, config.link.baudrate, config.link.max_frame_len
    );

    // Command link on UART0 (GPIO0 TX, GPIO1 RX)
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.link.baudrate;

    let tx_buf = TX_BUF.init([0u8; 16]);
    let rx_buf = RX_BUF.init([0u8; 2048]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (_tx, rx) = uart.split();

    info!("UART initialized for command link");

    // GC9A01 on SPI1 (GPIO10 SCK, GPIO11 MOSI, GPIO9 CS, GPIO8 DC, GPIO12 RST)
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = 62_500_000;
    let spi = Spi::new_blocking_txonly(p.SPI1, p.PIN_10, p.PIN_11, spi_config);
    let dc = Output::new(p.PIN_8, Level::Low);
    let cs = Output::new(p.PIN_9, Level::High);
    let rst = Output::new(p.PIN_12, Level::High);
    let _backlight = Output::new(p.PIN_25, Level::High);

    let mut panel = Gc9a01::new(spi, dc, cs, rst);
    unwrap!(panel.init(&mut Delay));
    let compositor = unwrap!(Compositor::with_config(panel, &config.display));

    info!("Panel initialized");

    let mut runner = Runner::new(&config, UartLink::new(rx), compositor);

    if config.display.show_splash {
        match runner.engine_mut().apply_script(SPLASH_SCRIPT) {
            Ok(frames) => info!("Splash loaded ({} frames)", frames),
            Err(e) => warn!("Splash script rejected: {:?}", e),
        }
    }

    info!("Entering main loop");

    loop {
        let now_ns = Instant::now().as_micros().saturating_mul(1_000);
        match runner.poll(now_ns) {
            Ok(report) => log_report(runner.engine(), &report),
            Err(e) => warn!("Display refresh failed: {:?}", e),
        }
        Timer::after_millis(LOOP_YIELD_MS).await;
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Parse the embedded device.toml
///
/// build.rs rejects a bad file, so the fallback only guards against a
/// loader/validator mismatch during development.
fn load_config() -> DeviceConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using default configuration");
            DeviceConfig::default()
        }
    }
}

/// Log what one loop iteration did
fn log_report(engine: &Engine, report: &PollReport) {
    if report.is_quiet() {
        return;
    }
    trace!("RX: {} bytes", report.bytes_read);

    for applied in &report.applied {
        debug!("Applied: {}", applied);
        if matches!(applied, Applied::Cleared) {
            info!("Scene cleared: {}", engine.stats());
        }
    }
    for error in &report.errors {
        warn!("Frame dropped: {}", error);
    }
    if report.overflowed > 0 {
        warn!("{} more events not shown", report.overflowed);
    }
}
