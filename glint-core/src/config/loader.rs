//! Minimal TOML reader for the device configuration
//!
//! Handles only the subset the device file uses, not the whole TOML
//! language.
//!
//! Supported:
//! - `[engine]`, `[link]` and `[display]` section headers
//! - `key = value` with decimal or `0x` hex integers, and booleans
//! - `_` digit separators
//! - Comments (`# ...`), whole-line or trailing
//!
//! Keys outside a known section, and unknown keys, are rejected so a typo
//! never silently falls back to a default.

use super::types::DeviceConfig;

/// Configuration parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type or does not fit
    InvalidValue,
    /// Line is neither a header nor `key = value`
    Syntax,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::InvalidSection => f.write_str("invalid section header"),
            ConfigError::UnknownKey => f.write_str("unknown key"),
            ConfigError::InvalidValue => f.write_str("invalid value"),
            ConfigError::Syntax => f.write_str("syntax error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Engine,
    Link,
    Display,
}

/// Parse a TOML document into a DeviceConfig, starting from defaults
pub fn parse_config(input: &str) -> Result<DeviceConfig, ConfigError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::Syntax)?;
        apply_value(&mut config, section, key, value)?;
    }

    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "engine" => Ok(Section::Engine),
        "link" => Ok(Section::Link),
        "display" => Ok(Section::Display),
        _ => Err(ConfigError::InvalidSection),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse an unsigned integer, decimal or `0x` hex
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ConfigError> {
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ConfigError::InvalidValue)?;
    }

    let parsed = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => digits.parse::<u64>(),
    };
    let wide = parsed.map_err(|_| ConfigError::InvalidValue)?;
    T::try_from(wide).map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn apply_value(
    config: &mut DeviceConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    match (section, key) {
        (Section::Engine, "time_unit_ns") => config.engine.time_unit_ns = parse_int(value)?,
        (Section::Engine, "min_animated_tracks") => {
            config.engine.min_animated_tracks = parse_int(value)?
        }
        (Section::Engine, "max_node_pixels") => config.engine.max_node_pixels = parse_int(value)?,

        (Section::Link, "baudrate") => config.link.baudrate = parse_int(value)?,
        (Section::Link, "frame_timeout_ms") => config.link.frame_timeout_ms = parse_int(value)?,
        (Section::Link, "max_frame_len") => config.link.max_frame_len = parse_int(value)?,
        (Section::Link, "max_bytes_per_poll") => {
            config.link.max_bytes_per_poll = parse_int(value)?
        }

        (Section::Display, "width") => config.display.width = parse_int(value)?,
        (Section::Display, "height") => config.display.height = parse_int(value)?,
        (Section::Display, "background") => {
            let packed: u32 = parse_int(value)?;
            if packed > 0xFF_FFFF {
                return Err(ConfigError::InvalidValue);
            }
            config.display.background = packed;
        }
        (Section::Display, "show_splash") => config.display.show_splash = parse_bool(value)?,

        _ => return Err(ConfigError::UnknownKey),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::DEFAULT_TIME_UNIT_NS;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(parse_config(""), Ok(DeviceConfig::default()));
        assert_eq!(
            parse_config("# nothing here\n\n"),
            Ok(DeviceConfig::default())
        );
    }

    #[test]
    fn test_full_document() {
        let config = parse_config(
            r#"
# Glint device
[engine]
time_unit_ns = 33_333_333   # 30 Hz
min_animated_tracks = 1
max_node_pixels = 16384

[link]
baudrate = 921600
frame_timeout_ms = 250
max_frame_len = 4096
max_bytes_per_poll = 64

[display]
width = 128
height = 128
background = 0x102030
show_splash = false
"#,
        )
        .unwrap();

        assert_eq!(config.engine.time_unit_ns, 33_333_333);
        assert_eq!(config.engine.min_animated_tracks, 1);
        assert_eq!(config.engine.max_node_pixels, 16384);
        assert_eq!(config.link.baudrate, 921_600);
        assert_eq!(config.link.frame_timeout_ms, 250);
        assert_eq!(config.link.max_frame_len, 4096);
        assert_eq!(config.link.max_bytes_per_poll, 64);
        assert_eq!(config.display.width, 128);
        assert_eq!(config.display.height, 128);
        assert_eq!(config.display.background, 0x102030);
        assert!(!config.display.show_splash);
    }

    #[test]
    fn test_partial_keeps_defaults() {
        let config = parse_config("[link]\nbaudrate = 9600\n").unwrap();
        assert_eq!(config.link.baudrate, 9600);
        assert_eq!(config.engine.time_unit_ns, DEFAULT_TIME_UNIT_NS);
        assert_eq!(config.display.width, 240);
    }

    #[test]
    fn test_rejects_unknown_section_and_key() {
        assert_eq!(parse_config("[motor]"), Err(ConfigError::InvalidSection));
        assert_eq!(
            parse_config("[engine]\nspeed = 3"),
            Err(ConfigError::UnknownKey)
        );
        assert_eq!(parse_config("width = 3"), Err(ConfigError::UnknownKey));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            parse_config("[display]\nwidth = 70000"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[display]\nbackground = 0x1000000"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[display]\nshow_splash = yes"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(
            parse_config("[engine]\nmin_animated_tracks = -1"),
            Err(ConfigError::InvalidValue)
        );
        assert_eq!(parse_config("[link]\nbaudrate"), Err(ConfigError::Syntax));
    }
}
