//! Language-model scoring for CTC beam search.
//!
//! - [`scorer`]: the beam-scoring strategies a CTC decoder calls while it
//!   grows beams, including the n-gram aware [`LanguageModelBeamScorer`].
//! - [`trie`]: the vocabulary prefix trie used to prune beams that cannot
//!   complete into a real word, and its text serialization.
//! - [`lm`]: the language-model contract and an ARPA back-off implementation.
//! - [`labels`]: decoder label alphabet configuration and translation.

pub mod error;
pub mod labels;
pub mod lm;
pub mod scorer;
pub mod trie;

pub use error::CtcError;
pub use labels::{Label, LabelConfig, LabelError, LabelTranslator, Symbol};
pub use lm::{LanguageModel, NgramModel, WordIndex};
pub use scorer::{BaseBeamScorer, BeamScorer, BeamState, LanguageModelBeamScorer};
pub use trie::{PrefixTrie, TrieError, VocabularyTrie};
