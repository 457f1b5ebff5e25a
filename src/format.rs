//! `%g`-style floating point formatting for trigger output lines (spec §6):
//! shortest representation at a given significant-digit count, matching
//! C's `printf("%.Ng", x)` rather than Rust's fixed/exponential defaults.

/// Format `value` with up to `precision` significant digits, trimming
/// trailing zeros, switching to exponential notation outside
/// `[1e-4, 10^precision)` the same way C's `%g` does.
pub fn format_g(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() { "nan".to_string() } else if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let exponent = value.abs().log10().floor() as i32;

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa_digits = precision.saturating_sub(1);
        let raw = format!("{:.*e}", mantissa_digits, value);
        let (mantissa, exp_str) = raw.split_once('e').expect("Rust {:e} always contains 'e'");
        let exp: i32 = exp_str.parse().expect("valid exponent");
        let mantissa = trim_trailing(mantissa);
        format!("{}e{}{:02}", mantissa, if exp >= 0 { "+" } else { "-" }, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        let raw = format!("{:.*}", decimals, value);
        trim_trailing(&raw)
    }
}

fn trim_trailing(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
