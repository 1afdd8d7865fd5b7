use std::path::PathBuf;

use thiserror::Error;

use crate::labels::LabelError;
use crate::lm::LanguageModelError;
use crate::trie::TrieError;

/// Unified crate errors.
#[derive(Error, Debug)]
pub enum CtcError {
    #[error("Labels: {0}")]
    Label(#[from] LabelError),

    #[error("Trie: {0}")]
    Trie(#[from] TrieError),

    #[error("Failed to load language model from {path:?}: {source}")]
    LanguageModelLoad {
        path: PathBuf,
        #[source]
        source: LanguageModelError,
    },
}

impl CtcError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Label(e) => e.user_message(),
            Self::Trie(e) => e.user_message(),
            Self::LanguageModelLoad { source, .. } => source.user_message(),
        }
    }
}
