//! Group sinks: where the grouping traversal sends what it finds
//!
//! The traversal knows nothing about output formats. It calls
//! `begin_group` once per group, `member` once per song in pre-order, and
//! `end_group` when the group's subtree is exhausted.

use crate::graph::Song;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Receiver for the grouping traversal
pub trait GroupSink {
    /// A new group starts; `number` is 1-based, `head` is the group's root
    fn begin_group(&mut self, number: usize, head: &Song) -> std::fmt::Result;

    /// One member of the current group, the head included
    fn member(&mut self, song: &Song) -> std::fmt::Result;

    /// The current group is complete
    fn end_group(&mut self) -> std::fmt::Result;
}

/// Separator written after every group in the text report
pub const GROUP_SEPARATOR: &str = "----------------------------------------------------------";

/// Plain-text report in the `/GetSongGroups` format
///
/// ```text
/// Song Group: 1
/// Group Title: Hurt
///
/// Hurt by Nine Inch Nails
/// Hurt (Live) by Johnny Cash
///
/// ----------------------------------------------------------
/// ```
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    /// Write the report into `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer holding the finished report
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GroupSink for TextReport<W> {
    fn begin_group(&mut self, number: usize, head: &Song) -> std::fmt::Result {
        write!(self.out, "Song Group: {}\nGroup Title: {}\n\n", number, head.title)
    }

    fn member(&mut self, song: &Song) -> std::fmt::Result {
        writeln!(self.out, "{}", song)
    }

    fn end_group(&mut self) -> std::fmt::Result {
        write!(self.out, "\n{}\n", GROUP_SEPARATOR)
    }
}

/// One group of variants, as served by the JSON report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongGroup {
    /// 1-based, in order of first appearance
    pub number: usize,
    /// Title of the song that opened the group
    pub title: String,
    /// Members in traversal order, the head first
    pub songs: Vec<Song>,
}

/// Collects groups in memory
#[derive(Debug, Default)]
pub struct GroupCollector {
    groups: Vec<SongGroup>,
}

impl GroupCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups collected so far
    pub fn groups(&self) -> &[SongGroup] {
        &self.groups
    }

    /// Take ownership of the collected groups
    pub fn into_groups(self) -> Vec<SongGroup> {
        self.groups
    }
}

impl GroupSink for GroupCollector {
    fn begin_group(&mut self, number: usize, head: &Song) -> std::fmt::Result {
        self.groups.push(SongGroup {
            number,
            title: head.title.clone(),
            songs: Vec::new(),
        });
        Ok(())
    }

    fn member(&mut self, song: &Song) -> std::fmt::Result {
        // A member without an open group is a traversal bug
        let group = self.groups.last_mut().ok_or(std::fmt::Error)?;
        group.songs.push(song.clone());
        Ok(())
    }

    fn end_group(&mut self) -> std::fmt::Result {
        Ok(())
    }
}
