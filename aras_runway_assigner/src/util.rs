use std::sync::LazyLock;

use regex::Regex;

/// Absolute angle between two bearings, in `[0, 180]`.
pub fn diff_angle(a: u16, b: u16) -> u16 {
    let diff = (i32::from(a % 360) - i32::from(b % 360)).unsigned_abs() as u16;
    if diff > 180 { 360 - diff } else { diff }
}

/// Trims and upper-cases an airport or FIR identifier. Returns `None` if the
/// result is not four alphanumeric characters.
pub fn normalize_icao(raw: &str) -> Option<String> {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{4}$").unwrap());

    let icao = raw.trim().to_ascii_uppercase();
    RE.is_match(&icao).then_some(icao)
}
