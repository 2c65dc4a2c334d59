//! Build script for glint-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates device.toml and splash.glint at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use glint_core::config::{parse_config, DeviceConfig};
use glint_core::Engine;

/// Smallest frame that still holds one bitmap tile
const MIN_FRAME_LEN: u32 = 16 + 512;

/// UART 8N1: start bit, 8 data bits, stop bit
const BITS_PER_BYTE: u64 = 10;

fn main() {
    setup_linker();
    let config = validate_config();
    validate_splash(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate device.toml configuration at compile time
///
/// The file is read twice: by the `toml` crate into the typed config, and
/// by the firmware's own loader. Both must succeed and agree.
fn validate_config() -> DeviceConfig {
    println!("cargo:rerun-if-changed=device.toml");

    let config_path = Path::new("device.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: device.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds device.toml at build time.                  ║\n\
            ║  Please create one in the glint-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read device.toml", &[e.to_string()]),
    };

    let config: DeviceConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail(
            "Invalid device.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    match parse_config(&content) {
        Ok(parsed) if parsed == config => {}
        Ok(_) => fail(
            "device.toml uses syntax the firmware loader reads differently",
            &["Use plain integers, 0x hex and true/false only".to_string()],
        ),
        Err(e) => fail(
            "device.toml is not readable by the firmware loader",
            &[format!("Error: {}", e)],
        ),
    }

    let errors = check_ranges(&config);
    if !errors.is_empty() {
        fail("Invalid device configuration", &errors);
    }

    println!("cargo:warning=device.toml validated successfully");
    config
}

/// Check values the type system cannot
fn check_ranges(config: &DeviceConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if config.engine.time_unit_ns == 0 {
        errors.push("[engine] time_unit_ns must be greater than 0".to_string());
    }
    if config.engine.max_node_pixels == 0 {
        errors.push("[engine] max_node_pixels must be greater than 0".to_string());
    }
    if config.link.baudrate == 0 {
        errors.push("[link] baudrate must be greater than 0".to_string());
    } else if config.link.frame_timeout_ms != 0
        && u64::from(config.link.frame_timeout_ms) * u64::from(config.link.baudrate)
            < BITS_PER_BYTE * 1000
    {
        errors.push("[link] frame_timeout_ms is shorter than one byte on the wire".to_string());
    }
    if config.link.max_frame_len < MIN_FRAME_LEN {
        errors.push(format!(
            "[link] max_frame_len must be at least {}",
            MIN_FRAME_LEN
        ));
    }
    if config.link.max_bytes_per_poll == 0 {
        errors.push("[link] max_bytes_per_poll must be greater than 0".to_string());
    }
    if config.display.width == 0 || config.display.height == 0 {
        errors.push("[display] width and height must be greater than 0".to_string());
    }

    errors
}

/// Run the boot splash through a host-side engine so a broken script
/// fails the build instead of the boot
fn validate_splash(config: &DeviceConfig) {
    println!("cargo:rerun-if-changed=splash.glint");

    let script = match fs::read("splash.glint") {
        Ok(script) => script,
        Err(e) => fail("Failed to read splash.glint", &[e.to_string()]),
    };

    let mut engine = Engine::new(config.engine);
    if let Err(e) = engine.apply_script(&script) {
        fail("Invalid splash.glint", &[format!("Error: {}", e)]);
    }
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}
