use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::{
    parse_arpa, ArpaModel, FullScore, LanguageModel, LanguageModelError, WordIndex,
    UNKNOWN_WORD_INDEX,
};

pub const MAX_ORDER: usize = 6;

const UNKNOWN_WORD: &str = "<unk>";
const BEGIN_SENTENCE: &str = "<s>";
const END_SENTENCE: &str = "</s>";
const DEFAULT_UNKNOWN_LOG_PROB: f32 = -100.0;

/// History of an n-gram query, most recent word first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NgramContext {
    history: [WordIndex; MAX_ORDER - 1],
    len: u8,
}

impl NgramContext {
    fn extended(word: WordIndex, previous: &[WordIndex], max_len: usize) -> Self {
        let mut context = Self::default();
        if max_len == 0 {
            return context;
        }
        context.history[0] = word;
        let kept = previous.len().min(max_len - 1);
        context.history[1..=kept].copy_from_slice(&previous[..kept]);
        context.len = (kept + 1) as u8;
        context
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn history(&self) -> &[WordIndex] {
        &self.history[..self.len as usize]
    }
}

#[derive(Debug, Clone, Copy)]
struct NgramWeights {
    log_prob: f32,
    backoff: f32,
}

/// Back-off n-gram model held fully in memory.
#[derive(Debug)]
pub struct NgramModel {
    order: usize,
    words: Vec<String>,
    vocabulary: HashMap<String, WordIndex>,
    // Keys are oldest word first.
    ngrams: HashMap<Vec<WordIndex>, NgramWeights>,
    counts: Vec<usize>,
    unknown_log_prob: f32,
    begin_sentence: WordIndex,
    end_sentence: WordIndex,
}

impl NgramModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LanguageModelError> {
        let path = path.as_ref();
        log::info!("Loading ARPA language model from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LanguageModelError> {
        Self::from_arpa(parse_arpa(reader)?)
    }

    pub fn from_arpa_str(arpa: &str) -> Result<Self, LanguageModelError> {
        Self::from_reader(arpa.as_bytes())
    }

    pub fn from_arpa(arpa: ArpaModel) -> Result<Self, LanguageModelError> {
        let order = arpa.order();
        if order == 0 || order > MAX_ORDER {
            return Err(LanguageModelError::UnsupportedOrder(order));
        }

        let mut words = vec![UNKNOWN_WORD.to_string()];
        let mut vocabulary = HashMap::with_capacity(arpa.counts[0] + 1);
        vocabulary.insert(UNKNOWN_WORD.to_string(), UNKNOWN_WORD_INDEX);
        let mut ngrams = HashMap::with_capacity(arpa.counts.iter().sum());

        for entry in &arpa.grams[0] {
            let word = &entry.words[0];
            let index = match vocabulary.get(word) {
                Some(&index) => index,
                None => {
                    let index = words.len() as WordIndex;
                    words.push(word.clone());
                    vocabulary.insert(word.clone(), index);
                    index
                }
            };
            ngrams.insert(
                vec![index],
                NgramWeights {
                    log_prob: entry.log_prob,
                    backoff: entry.backoff,
                },
            );
        }

        let unknown_log_prob = match ngrams.get(&[UNKNOWN_WORD_INDEX][..]) {
            Some(weights) => weights.log_prob,
            None => {
                log::warn!(
                    "ARPA model has no {UNKNOWN_WORD} unigram, using {DEFAULT_UNKNOWN_LOG_PROB}"
                );
                ngrams.insert(
                    vec![UNKNOWN_WORD_INDEX],
                    NgramWeights {
                        log_prob: DEFAULT_UNKNOWN_LOG_PROB,
                        backoff: 0.0,
                    },
                );
                DEFAULT_UNKNOWN_LOG_PROB
            }
        };

        for (n, entries) in arpa.grams.iter().enumerate().skip(1) {
            for entry in entries {
                let key = entry
                    .words
                    .iter()
                    .map(|w| {
                        vocabulary
                            .get(w)
                            .copied()
                            .ok_or_else(|| LanguageModelError::UnigramMissing {
                                order: n + 1,
                                word: w.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ngrams.insert(
                    key,
                    NgramWeights {
                        log_prob: entry.log_prob,
                        backoff: entry.backoff,
                    },
                );
            }
        }

        let begin_sentence = *vocabulary
            .get(BEGIN_SENTENCE)
            .ok_or(LanguageModelError::MissingToken(BEGIN_SENTENCE))?;
        let end_sentence = *vocabulary
            .get(END_SENTENCE)
            .ok_or(LanguageModelError::MissingToken(END_SENTENCE))?;

        log::info!(
            "Loaded {order}-gram model: vocabulary={} counts={:?}",
            words.len(),
            arpa.counts
        );

        Ok(Self {
            order,
            words,
            vocabulary,
            ngrams,
            counts: arpa.counts,
            unknown_log_prob,
            begin_sentence,
            end_sentence,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn word(&self, index: WordIndex) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    fn backoff(&self, key: &[WordIndex]) -> f32 {
        self.ngrams.get(key).map_or(0.0, |w| w.backoff)
    }
}

impl LanguageModel for NgramModel {
    type Context = NgramContext;

    fn begin_sentence_context(&self) -> NgramContext {
        NgramContext::extended(self.begin_sentence, &[], self.order - 1)
    }

    fn null_context(&self) -> NgramContext {
        NgramContext::default()
    }

    fn score(&self, context: &NgramContext, word: WordIndex) -> FullScore<NgramContext> {
        let word = if (word as usize) < self.words.len() {
            word
        } else {
            UNKNOWN_WORD_INDEX
        };
        let history = context.history();
        let max_history = history.len().min(self.order - 1);

        let mut key = Vec::with_capacity(max_history + 1);
        let mut matched = None;
        for n in (0..=max_history).rev() {
            key.clear();
            key.extend(history[..n].iter().rev());
            key.push(word);
            if let Some(weights) = self.ngrams.get(&key) {
                matched = Some((n, weights.log_prob));
                break;
            }
        }
        let (matched_len, mut log_prob) = matched.unwrap_or((0, self.unknown_log_prob));

        for k in matched_len + 1..=max_history {
            key.clear();
            key.extend(history[..k].iter().rev());
            log_prob += self.backoff(&key);
        }

        let context = if word == UNKNOWN_WORD_INDEX {
            NgramContext::default()
        } else {
            NgramContext::extended(word, &history[..matched_len], self.order - 1)
        };
        FullScore { log_prob, context }
    }

    fn end_sentence_index(&self) -> WordIndex {
        self.end_sentence
    }

    fn vocabulary_index(&self, word: &str) -> WordIndex {
        self.vocabulary
            .get(word)
            .copied()
            .unwrap_or(UNKNOWN_WORD_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGRAM: &str = "\\data\\
ngram 1=5
ngram 2=3
ngram 3=1

\\1-grams:
-1.5\t<unk>
-99\t<s>\t-0.4
-1.0\t</s>
-0.8\ta\t-0.3
-0.9\tb\t-0.2

\\2-grams:
-0.5\t<s>\ta\t-0.1
-0.6\ta\tb\t-0.25
-0.3\tb\t</s>

\\3-grams:
-0.2\t<s>\ta\tb

\\end\\
";

    fn model() -> NgramModel {
        NgramModel::from_arpa_str(TRIGRAM).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn context_extends_with_matched_history() {
        let m = model();
        let a = m.vocabulary_index("a");
        let b = m.vocabulary_index("b");
        let s = m.begin_sentence_context();
        assert_eq!(s.history(), &[m.vocabulary_index("<s>")]);

        let after_a = m.score(&s, a);
        assert!(close(after_a.log_prob, -0.5));
        assert_eq!(after_a.context.history(), &[a, m.vocabulary_index("<s>")]);

        let after_b = m.score(&after_a.context, b);
        assert!(close(after_b.log_prob, -0.2));
        assert_eq!(after_b.context.history(), &[b, a]);
    }

    #[test]
    fn backs_off_through_unmatched_contexts() {
        let m = model();
        let a = m.vocabulary_index("a");
        let b = m.vocabulary_index("b");
        // History (b, a): no "a b a" trigram and no "b a" bigram.
        let ctx = m.score(&m.score(&m.null_context(), a).context, b).context;
        assert_eq!(ctx.history(), &[b, a]);
        let r = m.score(&ctx, a);
        // backoff("a b") + backoff("b") + p(a)
        assert!(close(r.log_prob, -0.25 - 0.2 - 0.8));
        assert_eq!(r.context.history(), &[a]);
    }

    #[test]
    fn unknown_word_resets_context() {
        let m = model();
        assert_eq!(m.vocabulary_index("zebra"), UNKNOWN_WORD_INDEX);
        let r = m.score(&m.begin_sentence_context(), UNKNOWN_WORD_INDEX);
        assert!(close(r.log_prob, -0.4 - 1.5));
        assert!(r.context.is_empty());
    }

    #[test]
    fn out_of_range_index_scores_as_unknown() {
        let m = model();
        let r = m.score(&m.null_context(), 9_999);
        assert!(close(r.log_prob, -1.5));
    }

    #[test]
    fn missing_sentence_markers_are_rejected() {
        let arpa = "\\data\\\nngram 1=1\n\n\\1-grams:\n-1.0\tword\n\n\\end\\\n";
        assert!(matches!(
            NgramModel::from_arpa_str(arpa),
            Err(LanguageModelError::MissingToken(_))
        ));
    }

    #[test]
    fn missing_unknown_gets_default() {
        let arpa = "\\data\\\nngram 1=2\n\n\\1-grams:\n-1.0\t<s>\n-1.0\t</s>\n\n\\end\\\n";
        let m = NgramModel::from_arpa_str(arpa).unwrap();
        let r = m.score(&m.null_context(), UNKNOWN_WORD_INDEX);
        assert!(close(r.log_prob, DEFAULT_UNKNOWN_LOG_PROB));
    }
}
