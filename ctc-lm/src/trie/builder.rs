use std::io::BufRead;

use super::{TrieError, VocabularyTrie};
use crate::lm::LanguageModel;

const PROGRESS_INTERVAL: usize = 100_000;

/// Streams vocabulary words into a trie.
///
/// Each word is stored with its vocabulary index and its unigram score, i.e.
/// scored against the model's null context rather than any sentence context.
struct TrieBuilder<'m, M: LanguageModel + ?Sized> {
    model: &'m M,
    null_context: M::Context,
    trie: VocabularyTrie,
    inserted: usize,
}

impl<'m, M: LanguageModel + ?Sized> TrieBuilder<'m, M> {
    fn new(model: &'m M) -> Self {
        Self {
            model,
            null_context: model.null_context(),
            trie: VocabularyTrie::new(),
            inserted: 0,
        }
    }

    fn push(&mut self, word: &str) -> Result<(), TrieError> {
        let index = self.model.vocabulary_index(word);
        let unigram_score = self.model.score(&self.null_context, index).log_prob;
        self.trie.insert(word, index, unigram_score)?;

        self.inserted += 1;
        if self.inserted % PROGRESS_INTERVAL == 0 {
            log::debug!(
                "Inserted {} words, {} nodes",
                self.inserted,
                self.trie.node_count()
            );
        }
        Ok(())
    }

    fn finish(self) -> VocabularyTrie {
        log::info!(
            "Built vocabulary trie: words={} nodes={}",
            self.inserted,
            self.trie.node_count()
        );
        self.trie
    }
}

/// Builds the vocabulary trie for `words`. The first word the trie rejects
/// aborts the whole build.
pub fn build_vocabulary_trie<M, I, S>(model: &M, words: I) -> Result<VocabularyTrie, TrieError>
where
    M: LanguageModel + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TrieBuilder::new(model);
    for word in words {
        builder.push(word.as_ref())?;
    }
    Ok(builder.finish())
}

/// Same as [`build_vocabulary_trie`], reading whitespace-separated words
/// until the end of `reader`.
pub fn build_vocabulary_trie_from_reader<M, R>(
    model: &M,
    reader: R,
) -> Result<VocabularyTrie, TrieError>
where
    M: LanguageModel + ?Sized,
    R: BufRead,
{
    let mut builder = TrieBuilder::new(model);
    for line in reader.lines() {
        let line = line?;
        for word in line.split_whitespace() {
            builder.push(word)?;
        }
    }
    Ok(builder.finish())
}
