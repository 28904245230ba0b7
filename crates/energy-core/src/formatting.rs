/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let formatted = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut result = group_thousands(int_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    // Avoid "-0.00" for values that round to zero.
    let is_zero = result.chars().all(|c| matches!(c, '0' | '.' | ','));
    if value < 0.0 && !is_zero {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an energy amount with two decimals and a `kWh` unit.
///
/// ```
/// use energy_core::formatting::format_kwh;
///
/// assert_eq!(format_kwh(84213.456), "84,213.46 kWh");
/// ```
pub fn format_kwh(value: f64) -> String {
    format!("{} kWh", format_number(value, 2))
}

/// Format a share as a percentage, e.g. `"35.0%"`.
pub fn format_percent(value: f64, decimals: u32) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Format a relative change with an explicit sign, e.g. `"+4.2%"` / `"-1.0%"`.
///
/// ```
/// use energy_core::formatting::format_signed_percent;
///
/// assert_eq!(format_signed_percent(4.3), "+4.3%");
/// assert_eq!(format_signed_percent(-1.0), "-1.0%");
/// assert_eq!(format_signed_percent(0.0), "0.0%");
/// ```
pub fn format_signed_percent(value: f64) -> String {
    let body = format_percent(value, 1);
    if value > 0.0 && !body.starts_with("0.0") {
        format!("+{}", body)
    } else {
        body
    }
}

/// Format an hour of day as `"HH:00"`.
pub fn format_hour(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Format the one-hour window starting at `hour`, e.g. `"14:00 - 15:00"`.
///
/// The window after 23:00 ends at `"24:00"`.
pub fn format_hour_window(hour: u32) -> String {
    format!("{} - {:02}:00", format_hour(hour), hour + 1)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    let len = s.len();
    let mut result = String::with_capacity(len + len / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
