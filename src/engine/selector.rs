//! Quality/format preference → provider selector string.
//!
//! Kept as a pure function so the precedence table is testable without
//! touching the engine. Precedence for a concrete quality (e.g. "1080"):
//! exact-quality+format, exact-quality, format-only-best, best.

/// Build the selector string for a requested quality and optional container
/// format.
pub fn format_selector(quality: &str, format: Option<&str>) -> String {
    match quality {
        "best" => match format {
            Some(ext) => format!("best[ext={}]/best", ext),
            None => "best".to_string(),
        },
        "worst" => match format {
            Some(ext) => format!("worst[ext={}]/worst", ext),
            None => "worst".to_string(),
        },
        quality => match format {
            Some(ext) => format!(
                "{q}[ext={e}]/{q}/best[ext={e}]/best",
                q = quality,
                e = ext
            ),
            None => format!("{}/best", quality),
        },
    }
}
