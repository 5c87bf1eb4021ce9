//! Netscape cookie-file format check.
//!
//! The engine accepts a cookies file for authenticated providers; before
//! handing it over we verify it actually looks like a Netscape cookie jar.
//! This is a format sniff, not a parser: a line counts as a cookie when it
//! has at least six tab-separated fields.

use std::path::Path;

use tracing::{debug, warn};

/// Returns true when the file exists, is non-empty and contains at least one
/// plausible cookie line.
pub fn validate_cookie_file(path: &Path) -> bool {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cookies file not readable");
            return false;
        }
    };

    let content = content.trim();
    if content.is_empty() {
        debug!(path = %path.display(), "Cookies file is empty");
        return false;
    }

    if !content.starts_with("# Netscape HTTP Cookie File") {
        warn!(
            path = %path.display(),
            "Cookies file is missing the Netscape header; trying it anyway"
        );
    }

    let valid_cookies = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| line.split('\t').count() >= 6)
        .count();

    debug!(path = %path.display(), valid_cookies, "Validated cookies file");
    valid_cookies > 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_cookies(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("cookies.txt");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(!validate_cookie_file(&dir.path().join("nope.txt")));
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_cookies(&dir, "");
        assert!(!validate_cookie_file(&path));
    }

    #[test]
    fn test_valid_netscape_file() {
        let dir = TempDir::new().unwrap();
        let path = write_cookies(
            &dir,
            "# Netscape HTTP Cookie File\n\
             .youtube.com\tTRUE\t/\tTRUE\t1893456000\tSID\tabc123\n",
        );
        assert!(validate_cookie_file(&path));
    }

    #[test]
    fn test_header_only_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_cookies(&dir, "# Netscape HTTP Cookie File\n# comment\n");
        assert!(!validate_cookie_file(&path));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = write_cookies(&dir, "not a cookie line\nanother bad line\n");
        assert!(!validate_cookie_file(&path));
    }

    #[test]
    fn test_missing_header_still_counts_cookies() {
        let dir = TempDir::new().unwrap();
        let path = write_cookies(
            &dir,
            ".example.com\tTRUE\t/\tFALSE\t1893456000\ttoken\txyz\n",
        );
        assert!(validate_cookie_file(&path));
    }
}
