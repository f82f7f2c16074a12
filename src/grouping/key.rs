//! Canonical grouping keys derived from song titles
//!
//! Two titles that name the same song in different presentations should
//! reduce to the same key. Only the markers in the deriver's list are
//! recognised; anything else ("live", "acoustic", ...) still splits
//! groups unless it is configured.

use regex_lite::Regex;
use std::sync::LazyLock;

/// Markers stripped when nothing else is configured
pub const DEFAULT_MARKERS: &[&str] = &["remix"];

/// First `(` through the last `)` on the same line; applied once per line
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(.*\)").expect("parenthetical pattern is valid")
});

/// Turns raw titles into grouping keys
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    markers: Vec<String>,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::with_markers(DEFAULT_MARKERS.iter().copied())
    }
}

impl KeyDeriver {
    /// Create a deriver with the default markers
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deriver that strips the given variant markers
    ///
    /// Markers are matched case-insensitively as plain substrings, so a
    /// short marker like "live" also eats the middle of "oliver".
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Markers in the order they are removed
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Derive the grouping key for a title
    ///
    /// Strips the parenthetical span on every line, lowercases, removes
    /// every marker and trims. Never fails; the key may be empty.
    pub fn derive_key(&self, title: &str) -> String {
        let mut key = PARENTHETICAL.replace_all(title, "").to_lowercase();

        // Removing one marker can splice together another ("remremixix"),
        // so repeat until nothing changes.
        loop {
            let before = key.len();
            for marker in &self.markers {
                key = key.replace(marker.as_str(), "");
            }
            if key.len() == before {
                break;
            }
        }

        key.trim().to_string()
    }
}

/// Derive a key with the default marker list
pub fn derive_key(title: &str) -> String {
    KeyDeriver::default().derive_key(title)
}
