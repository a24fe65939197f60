//! Small metadata parsing and formatting helpers.

/// Parse a `"N/M"` track-number value into `(number, total)`.
///
/// A bare `"N"` yields `(N, -1)`. Anything unparseable yields `(-1, -1)`;
/// this never errors because tag data in the wild is unreliable.
pub fn parse_track_pair(raw: &str) -> (i32, i32) {
    let mut parts = raw.trim().splitn(2, '/');
    let n = match parts.next().and_then(|s| s.trim().parse::<i32>().ok()) {
        Some(n) if n >= 0 => n,
        _ => return (-1, -1),
    };
    let m = parts
        .next()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|&m| m >= 0)
        .unwrap_or(-1);
    (n, m)
}

/// Render a bitrate in kbps as `"{n}k"`, empty when unknown.
pub fn format_bitrate(kbps: Option<u32>) -> String {
    match kbps {
        Some(n) => format!("{n}k"),
        None => String::new(),
    }
}

/// Parse a bitrate field as reported by the engine or a radio stream.
///
/// Non-digits are stripped first (some stations report `"128kbps"`).
/// Values that look like bits per second are scaled down to kbps.
pub fn parse_bitrate_field(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let value = digits.parse::<u64>().ok()?;
    if value == 0 {
        return None;
    }
    if value >= 10_000 {
        Some((value / 1000) as u32)
    } else {
        Some(value as u32)
    }
}

/// Render a 0..=5 rating as repeated `"* "`.
pub fn rating_stars(rating: u8) -> String {
    "* ".repeat(rating.min(5) as usize)
}
