//! Build script for memlcd-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates panel.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const MODELS: [&str; 3] = ["ls013b7dh03", "ls013b7dh05", "ls027b7dh01"];
const SPI0_SCK_PINS: [i64; 4] = [2, 6, 18, 22];
const SPI0_MOSI_PINS: [i64; 4] = [3, 7, 19, 23];
const GPIO_COUNT: i64 = 30;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate panel.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=panel.toml");

    let config_path = Path::new("panel.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: panel.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds its panel wiring from panel.toml.           ║\n\
            ║  Please create one in the memlcd-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read panel.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in panel.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let mut pins = Vec::new();

    validate_panel(&config, &mut errors, &mut pins);
    validate_spi(&config, &mut errors, &mut pins);
    validate_refresh(&config, &mut errors);

    for (i, (name, pin)) in pins.iter().enumerate() {
        if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
            errors.push(format!("{} and {} both use gpio{}", name, other, pin));
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid panel configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=panel.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a "gpioN" / "!gpioN" pin string
fn parse_pin(value: &str) -> Option<i64> {
    let value = value.strip_prefix('!').unwrap_or(value);
    let pin: i64 = value.strip_prefix("gpio")?.parse().ok()?;
    (pin < GPIO_COUNT).then_some(pin)
}

/// Look up a pin key, recording it for conflict detection
fn check_pin(
    table: &toml::value::Table,
    section: &str,
    key: &str,
    errors: &mut Vec<String>,
    pins: &mut Vec<(String, i64)>,
) -> Option<i64> {
    match table.get(key) {
        Some(toml::Value::String(s)) => match parse_pin(s) {
            Some(pin) => {
                pins.push((format!("[{}] {}", section, key), pin));
                Some(pin)
            }
            None => {
                errors.push(format!("[{}] {} '{}' is not a valid pin", section, key, s));
                None
            }
        },
        Some(_) => {
            errors.push(format!("[{}] {} must be a string", section, key));
            None
        }
        None => None,
    }
}

/// Validate the [panel] section
fn validate_panel(config: &toml::Value, errors: &mut Vec<String>, pins: &mut Vec<(String, i64)>) {
    let panel = match config.get("panel") {
        Some(toml::Value::Table(t)) => t,
        _ => {
            errors.push("Missing [panel] section".to_string());
            return;
        }
    };

    if let Some(model) = panel.get("model") {
        match model.as_str() {
            Some(name) if MODELS.contains(&name.to_ascii_lowercase().as_str()) => {}
            _ => errors.push(format!("[panel] unknown model {}", model)),
        }
    }

    if let Some(toml::Value::Integer(width)) = panel.get("width") {
        if *width <= 0 || width % 8 != 0 {
            errors.push("[panel] width must be a positive multiple of 8".to_string());
        }
    }

    if let Some(toml::Value::Integer(height)) = panel.get("height") {
        if *height <= 0 || *height > 255 {
            errors.push("[panel] height must be 1-255".to_string());
        }
    }

    let latch = check_pin(panel, "panel", "latch_pin", errors, pins)
        .or_else(|| check_pin(panel, "panel", "disp_pin", errors, pins));
    if latch.is_none() && !panel.contains_key("latch_pin") && !panel.contains_key("disp_pin") {
        errors.push("[panel] missing 'latch_pin'".to_string());
    }
}

/// Validate the [spi] section
fn validate_spi(config: &toml::Value, errors: &mut Vec<String>, pins: &mut Vec<(String, i64)>) {
    let spi = match config.get("spi") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    if let Some(sck) = check_pin(spi, "spi", "sck_pin", errors, pins) {
        if !SPI0_SCK_PINS.contains(&sck) {
            errors.push(format!("[spi] gpio{} cannot carry SPI0 SCK", sck));
        }
    }

    if let Some(mosi) = check_pin(spi, "spi", "mosi_pin", errors, pins) {
        if !SPI0_MOSI_PINS.contains(&mosi) {
            errors.push(format!("[spi] gpio{} cannot carry SPI0 TX", mosi));
        }
    }

    check_pin(spi, "spi", "cs_pin", errors, pins);

    if let Some(toml::Value::Integer(freq)) = spi.get("frequency") {
        if *freq <= 0 || *freq > 2_000_000 {
            errors.push("[spi] frequency must be 1-2000000 Hz".to_string());
        }
    }
}

/// Validate the [refresh] section
fn validate_refresh(config: &toml::Value, errors: &mut Vec<String>) {
    let refresh = match config.get("refresh") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    if let Some(toml::Value::Integer(ms)) = refresh.get("interval_ms") {
        if *ms <= 0 || *ms > i64::from(u16::MAX) {
            errors.push("[refresh] interval_ms must be 1-65535".to_string());
        }
    }
}
