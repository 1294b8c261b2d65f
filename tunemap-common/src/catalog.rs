//! Static content catalog: islands and their songs
//!
//! The catalog is authored outside the core and consumed read-only. Only the
//! fields the core logic touches are modeled here; layout and artwork stay
//! with the presentation layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of submitted songs required to complete an island
pub const ISLAND_COMPLETION_THRESHOLD: usize = 2;

/// Quiz attached to a song: one question, fixed answer options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
}

/// One song entry in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    /// Song title; doubles as the progress-map key
    pub title: String,
    /// External media link opened when listening starts
    pub media_url: String,
    /// Optional lyric page link
    pub lyric_url: Option<String>,
    /// Blurb shown with the song
    pub info: String,
    pub quiz: Quiz,
    /// Canonical quiz answer, compared after trimming
    pub correct_answer: String,
    /// Structured note template with `【…】` blanks; absent = free-form note
    pub response_format: Option<String>,
}

/// A themed cluster of songs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Island {
    pub id: u32,
    pub name: String,
    /// Introduction text for the island
    pub blurb: String,
    /// Titles of the songs hidden on this island
    pub songs: Vec<String>,
}

/// Read-only lookup over the full island/song content set
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: HashMap<String, Song>,
    islands: Vec<Island>,
}

impl Catalog {
    pub fn new(songs: Vec<Song>, islands: Vec<Island>) -> Self {
        let songs = songs.into_iter().map(|s| (s.title.clone(), s)).collect();
        Self { songs, islands }
    }

    pub fn song(&self, title: &str) -> Option<&Song> {
        self.songs.get(title)
    }

    pub fn island(&self, id: u32) -> Option<&Island> {
        self.islands.iter().find(|i| i.id == id)
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }
}
