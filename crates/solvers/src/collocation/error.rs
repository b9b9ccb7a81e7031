use trellis_core::IterateError;

use crate::{
    nlp::{self, UnknownBackend},
    transcription::{TranscriptionError, UnknownScheme},
};

/// Errors that abort a direct-collocation solve before a solution exists.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid guess: {0}")]
    Guess(#[source] IterateError),

    #[error("transcription failed: {0}")]
    Transcription(#[from] TranscriptionError),

    #[error("NLP backend failed: {0}")]
    Backend(#[from] nlp::Error),

    #[error(transparent)]
    UnknownScheme(#[from] UnknownScheme),

    #[error(transparent)]
    UnknownBackend(#[from] UnknownBackend),
}
