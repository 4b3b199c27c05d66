//! Quiz source seam: the external collaborator supplying random quizzes,
//! autocomplete titles, and the collection listing.

/// In-memory song library backing the quiz source in this process.
pub mod library;
/// Quiz source trait and data types.
pub mod source;

pub use library::SongLibrary;
pub use source::{CollectionInfo, Quiz, QuizError, QuizSource};
