//! VBO time-of-day values.
//!
//! The `time` column stores UTC time of day as a decimal number shaped like
//! `HHMMSS.SS`: hours, minutes and seconds are packed into the integer digits
//! and the fraction holds hundredths of a second.

/// Seconds in one day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decode a `HHMMSS.SS` value into seconds since midnight.
///
/// The fractional part is rounded to hundredths. Returns `None` for values
/// that are not finite non-negative numbers.
#[must_use]
pub fn decode(value: &str) -> Option<f64> {
    let raw: f64 = value.trim().parse().ok()?;
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let packed = raw.trunc() as u64;
    let hundredths = (raw.fract() * 100.0).round();

    let hours = packed / 10_000;
    let minutes = (packed / 100) % 100;
    let seconds = packed % 100;

    #[allow(clippy::cast_precision_loss)]
    let whole = (hours * 3600 + minutes * 60 + seconds) as f64;
    Some(whole + hundredths / 100.0)
}

/// Seconds elapsed from `start` to `at`, both seconds since midnight.
///
/// A time earlier than `start` means the log crossed midnight.
#[must_use]
pub fn elapsed(start: f64, at: f64) -> f64 {
    let delta = at - start;
    if delta < 0.0 {
        delta + SECONDS_PER_DAY
    } else {
        delta
    }
}

/// Video position in milliseconds for a row logged `elapsed_sec` after the
/// first row, when the log starts `offset_sec` into the video.
#[must_use]
pub fn sync_millis(offset_sec: f64, elapsed_sec: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let millis = ((offset_sec + elapsed_sec) * 1000.0).round() as i64;
    millis
}
