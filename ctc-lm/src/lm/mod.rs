//! Word-level language models consulted by the beam scorer and the trie
//! builder.
//!
//! Scores are base-10 log-probabilities, the convention of ARPA files.

mod arpa;
mod ngram;

pub use arpa::{parse_arpa, ArpaEntry, ArpaModel};
pub use ngram::{NgramContext, NgramModel, MAX_ORDER};

/// Index of a word in a language model's vocabulary.
pub type WordIndex = u32;

/// Index every model reserves for out-of-vocabulary words.
pub const UNKNOWN_WORD_INDEX: WordIndex = 0;

#[derive(thiserror::Error, Debug)]
pub enum LanguageModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ARPA parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("Unsupported n-gram order {0} (expected <= {max})", max = MAX_ORDER)]
    UnsupportedOrder(usize),
    #[error("Required token {0} is missing from the vocabulary")]
    MissingToken(&'static str),
    #[error("{order}-gram references {word:?}, which has no unigram entry")]
    UnigramMissing { order: usize, word: String },
}

impl LanguageModelError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Io(_) => "The language model file could not be read.",
            Self::Parse { .. } | Self::MissingToken(_) | Self::UnigramMissing { .. } => {
                "The language model file is not a valid ARPA model."
            }
            Self::UnsupportedOrder(_) => "The language model order is too high.",
        }
    }
}

/// Result of one transition query: the log-probability of the word given the
/// context, and the context to continue from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FullScore<C> {
    pub log_prob: f32,
    pub context: C,
}

/// What the scorer needs from an n-gram model.
///
/// Contexts are plain values; a query never mutates the model, so one model
/// can serve any number of beams and threads.
pub trait LanguageModel {
    type Context: Copy + PartialEq + std::fmt::Debug + Send + Sync;

    /// Context at the start of a sentence (after `<s>`).
    fn begin_sentence_context(&self) -> Self::Context;

    /// Context with no history at all.
    fn null_context(&self) -> Self::Context;

    fn score(&self, context: &Self::Context, word: WordIndex) -> FullScore<Self::Context>;

    fn end_sentence_index(&self) -> WordIndex;

    /// Never fails: unknown words map to [`UNKNOWN_WORD_INDEX`].
    fn vocabulary_index(&self, word: &str) -> WordIndex;
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    type Context = M::Context;

    fn begin_sentence_context(&self) -> Self::Context {
        (**self).begin_sentence_context()
    }

    fn null_context(&self) -> Self::Context {
        (**self).null_context()
    }

    fn score(&self, context: &Self::Context, word: WordIndex) -> FullScore<Self::Context> {
        (**self).score(context, word)
    }

    fn end_sentence_index(&self) -> WordIndex {
        (**self).end_sentence_index()
    }

    fn vocabulary_index(&self, word: &str) -> WordIndex {
        (**self).vocabulary_index(word)
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for std::sync::Arc<M> {
    type Context = M::Context;

    fn begin_sentence_context(&self) -> Self::Context {
        (**self).begin_sentence_context()
    }

    fn null_context(&self) -> Self::Context {
        (**self).null_context()
    }

    fn score(&self, context: &Self::Context, word: WordIndex) -> FullScore<Self::Context> {
        (**self).score(context, word)
    }

    fn end_sentence_index(&self) -> WordIndex {
        (**self).end_sentence_index()
    }

    fn vocabulary_index(&self, word: &str) -> WordIndex {
        (**self).vocabulary_index(word)
    }
}
