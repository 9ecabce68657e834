//! Terminal output helpers shared by the CLI reports.
//!
//! All three tools print a colorized, human-readable report to stdout.
//! Colors are plain ANSI escapes and are suppressed when `NO_COLOR` is set.

use std::fmt::Display;

const RESET: &str = "\x1b[0m";

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn paint(code: &str, text: impl Display) -> String {
    if colors_enabled() {
        format!("\x1b[{code}m{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn green(text: impl Display) -> String {
    paint("32", text)
}

pub fn yellow(text: impl Display) -> String {
    paint("33", text)
}

pub fn red(text: impl Display) -> String {
    paint("31", text)
}

pub fn cyan(text: impl Display) -> String {
    paint("36", text)
}

pub fn dim(text: impl Display) -> String {
    paint("2", text)
}

pub fn bold(text: impl Display) -> String {
    paint("1", text)
}

/// Render a byte count as `B`, `KB` or `MB` with one decimal place.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Percentage saved going from `original` to `optimized` bytes.
///
/// Negative when the derivative is larger than its source. Zero-sized
/// sources report no savings.
pub fn savings_percent(original: u64, optimized: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - optimized as f64 / original as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(500_000), "488.3 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_savings_percent() {
        assert_eq!(savings_percent(1000, 250), 75.0);
        assert_eq!(savings_percent(1000, 1000), 0.0);
        assert!(savings_percent(1000, 1500) < 0.0);
        assert_eq!(savings_percent(0, 10), 0.0);
    }
}
