//! Records and node handles in the item graph

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique handle for a node
///
/// Identity is by handle, not by value: two equal songs inserted twice
/// get two different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A song as decoded from an inbound request
///
/// The graph never looks inside a song; only the title is read, and only
/// by the key deriver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Display title, e.g. "Hurt (Live at Glastonbury)"
    pub title: String,
    /// Performing artists in credit order
    #[serde(default)]
    pub artists: Vec<String>,
}

impl Song {
    /// Create a song with the given title and no artists
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artists: Vec::new(),
        }
    }

    /// Add an artist credit
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artists.push(artist.into());
        self
    }

    /// Artist credits joined for display
    pub fn artist_line(&self) -> String {
        if self.artists.is_empty() {
            "Unknown Artist".to_string()
        } else {
            self.artists.join(", ")
        }
    }
}

impl std::fmt::Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.artist_line())
    }
}
