use std::collections::HashSet;

use futures::future::BoxFuture;
use thiserror::Error;

/// A single quiz handed to the round engine: the answer plus its reveal fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    /// Song title, graded against submitted answers.
    pub title: String,
    /// Artist name, revealed as the second hint.
    pub artist: String,
    /// Lyrics in their original language, shown at reveal time.
    pub original_lyrics: String,
    /// Translated lyrics, shown at round start.
    pub translated_lyrics: String,
    /// Syllable/initial-consonant hint, revealed first.
    pub hint: String,
    /// Display name of the collection the quiz was drawn from.
    pub collection_display_name: String,
}

/// A selectable song collection as shown in the lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Stable identifier used in room settings.
    pub id: String,
    /// Human readable name.
    pub display_name: String,
}

/// Errors reported by a quiz source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// None of the selected collections contains an eligible song.
    #[error("no songs available in the selected collections")]
    NoEligibleSongs,
}

/// Abstraction over the layer that stores songs and their quizzes.
///
/// The round engine only ever consumes this narrow interface; song CRUD and
/// persistence live outside this crate.
pub trait QuizSource: Send + Sync {
    /// Draw one random quiz from the songs tagged with any of `collections`.
    fn fetch_random_quiz(
        &self,
        collections: &HashSet<String>,
    ) -> BoxFuture<'static, Result<Quiz, QuizError>>;

    /// Every known song title, used for answer autocompletion.
    fn fetch_all_titles(&self) -> BoxFuture<'static, Vec<String>>;

    /// Collections offered for selection in the lobby.
    fn list_collections(&self) -> BoxFuture<'static, Vec<CollectionInfo>>;
}
