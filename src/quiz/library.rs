use std::collections::HashSet;
use std::{fs, path::Path};

use futures::future::BoxFuture;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::quiz::source::{CollectionInfo, Quiz, QuizError, QuizSource};

/// Errors that can occur while loading the song library from disk.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The library file could not be read.
    #[error("failed to read song library: {0}")]
    Io(#[from] std::io::Error),
    /// The library file is not valid JSON.
    #[error("failed to parse song library: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct SongEntry {
    title: String,
    artist: String,
    original_lyrics: String,
    translated_lyrics: String,
    hint: String,
    collections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    id: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
    #[serde(default)]
    songs: Vec<SongEntry>,
}

/// In-memory quiz source loaded once from a JSON song file.
#[derive(Debug)]
pub struct SongLibrary {
    collections: Vec<CollectionInfo>,
    songs: Vec<SongEntry>,
}

impl SongLibrary {
    /// Load the library from `path`.
    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let contents = fs::read_to_string(path)?;
        let raw: RawLibrary = serde_json::from_str(&contents)?;
        info!(
            path = %path.display(),
            songs = raw.songs.len(),
            collections = raw.collections.len(),
            "loaded song library"
        );
        Ok(Self::from_raw(raw))
    }

    /// An empty library; every quiz request reports no eligible songs.
    pub fn empty() -> Self {
        Self {
            collections: Vec::new(),
            songs: Vec::new(),
        }
    }

    /// Whether the library holds no songs at all.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    fn from_raw(raw: RawLibrary) -> Self {
        let collections = raw
            .collections
            .into_iter()
            .map(|entry| CollectionInfo {
                id: entry.id,
                display_name: entry.display_name,
            })
            .collect();
        Self {
            collections,
            songs: raw.songs,
        }
    }

    /// Resolve the display name shown with a quiz: prefer a collection the room
    /// actually selected, else the song's first collection.
    fn display_name_for(&self, song: &SongEntry, selected: &HashSet<String>) -> String {
        let id = song
            .collections
            .iter()
            .find(|id| selected.contains(*id))
            .or_else(|| song.collections.first());

        match id {
            Some(id) => self
                .collections
                .iter()
                .find(|info| &info.id == id)
                .map(|info| info.display_name.clone())
                .unwrap_or_else(|| id.clone()),
            None => "Unknown".into(),
        }
    }

    fn pick_quiz(&self, selected: &HashSet<String>) -> Result<Quiz, QuizError> {
        let eligible: Vec<&SongEntry> = self
            .songs
            .iter()
            .filter(|song| song.collections.iter().any(|id| selected.contains(id)))
            .collect();

        let song = eligible
            .choose(&mut rand::rng())
            .ok_or(QuizError::NoEligibleSongs)?;

        Ok(Quiz {
            title: song.title.clone(),
            artist: song.artist.clone(),
            original_lyrics: song.original_lyrics.clone(),
            translated_lyrics: song.translated_lyrics.clone(),
            hint: song.hint.clone(),
            collection_display_name: self.display_name_for(song, selected),
        })
    }
}

impl QuizSource for SongLibrary {
    fn fetch_random_quiz(
        &self,
        collections: &HashSet<String>,
    ) -> BoxFuture<'static, Result<Quiz, QuizError>> {
        let result = self.pick_quiz(collections);
        Box::pin(async move { result })
    }

    fn fetch_all_titles(&self) -> BoxFuture<'static, Vec<String>> {
        let titles: Vec<String> = self.songs.iter().map(|song| song.title.clone()).collect();
        Box::pin(async move { titles })
    }

    fn list_collections(&self) -> BoxFuture<'static, Vec<CollectionInfo>> {
        let collections = self.collections.clone();
        Box::pin(async move { collections })
    }
}
