//! Human-readable formatting for transfer telemetry

/// Format a byte count for display ("1.2MB", "640KB").
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[(&str, u64)] = &[
        ("B", 1),
        ("KB", 1024),
        ("MB", 1024 * 1024),
        ("GB", 1024 * 1024 * 1024),
        ("TB", 1024 * 1024 * 1024 * 1024),
    ];

    for (i, &(unit, divisor)) in UNITS.iter().enumerate().rev() {
        if bytes >= divisor {
            let value = bytes / divisor;
            let remainder = bytes % divisor;

            if remainder == 0 || i == 0 {
                return format!("{}{}", value, unit);
            }
            let decimal = remainder * 10 / divisor;
            if decimal > 0 {
                return format!("{}.{}{}", value, decimal, unit);
            }
            return format!("{}{}", value, unit);
        }
    }

    format!("{}B", bytes)
}

/// Format a transfer rate ("2.5MB/s").
pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second.max(0.0) as u64))
}

/// Format an ETA in seconds ("1h02m", "4m10s", "35s").
pub fn format_eta(seconds: i64) -> String {
    if seconds < 0 {
        return "unknown".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h{:02}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
