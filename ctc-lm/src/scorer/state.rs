/// Per-beam scoring state of [`LanguageModelBeamScorer`](super::LanguageModelBeamScorer).
///
/// `incomplete_word` holds the characters spelled since the last word
/// boundary; `model_context` only advances when a word is completed.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamState<C> {
    pub completed_words_score: f32,
    pub incomplete_word_score: f32,
    pub incomplete_word: String,
    pub model_context: C,
}

impl<C: Copy> BeamState<C> {
    pub fn new(model_context: C) -> Self {
        Self {
            completed_words_score: 0.0,
            incomplete_word_score: 0.0,
            incomplete_word: String::new(),
            model_context,
        }
    }

    /// Folds a finished word into the completed score and moves the model
    /// context past it.
    pub(crate) fn complete_word(&mut self, word_score: f32, next_context: C) {
        self.completed_words_score += word_score;
        self.incomplete_word_score = 0.0;
        self.incomplete_word.clear();
        self.model_context = next_context;
    }

    pub fn total_score(&self) -> f32 {
        self.completed_words_score + self.incomplete_word_score
    }
}
