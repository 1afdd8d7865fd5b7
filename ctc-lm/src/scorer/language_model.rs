use std::path::Path;

use crate::error::CtcError;
use crate::labels::{Label, LabelConfig, LabelError, LabelTranslator, Symbol};
use crate::lm::{FullScore, LanguageModel, NgramModel};

use super::state::BeamState;
use super::BeamScorer;

/// Scores beams by the n-gram likelihood of the words they spell.
///
/// The word being spelled is re-scored against the sentence context every
/// time it grows, so beams drift towards real words before the boundary is
/// reached. The scorer itself is immutable; share it by reference across
/// threads when the model is `Sync`.
pub struct LanguageModelBeamScorer<M: LanguageModel> {
    model: M,
    translator: LabelTranslator,
}

impl<M: LanguageModel> LanguageModelBeamScorer<M> {
    pub fn new(model: M, labels: LabelConfig) -> Result<Self, LabelError> {
        let translator = LabelTranslator::new(labels)?;
        Ok(Self { model, translator })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn translator(&self) -> &LabelTranslator {
        &self.translator
    }

    fn score_word(&self, context: &M::Context, word: &str) -> FullScore<M::Context> {
        self.model.score(context, self.model.vocabulary_index(word))
    }
}

impl LanguageModelBeamScorer<NgramModel> {
    pub fn from_arpa_file<P: AsRef<Path>>(
        path: P,
        labels: LabelConfig,
    ) -> Result<Self, CtcError> {
        let path = path.as_ref();
        let model = NgramModel::load(path).map_err(|source| CtcError::LanguageModelLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(model, labels)?)
    }
}

impl<M: LanguageModel> BeamScorer for LanguageModelBeamScorer<M> {
    type State = BeamState<M::Context>;

    fn initialize_state(&self) -> Self::State {
        BeamState::new(self.model.begin_sentence_context())
    }

    fn expand_state(
        &self,
        from_state: &Self::State,
        from_label: Label,
        to_label: Label,
    ) -> Result<Self::State, LabelError> {
        let mut to_state = from_state.clone();

        // CTC collapses repeats before anything else.
        if from_label == to_label {
            return Ok(to_state);
        }

        let symbol = self.translator.translate(to_label)?;
        match symbol {
            Symbol::Blank => return Ok(to_state),
            Symbol::Character(c) => to_state.incomplete_word.push(c),
            Symbol::WordBoundary => {}
        }

        let scored = self.score_word(&from_state.model_context, &to_state.incomplete_word);
        to_state.incomplete_word_score = scored.log_prob;
        log::trace!(
            "expand {from_label}->{to_label} word={:?} score={}",
            to_state.incomplete_word,
            scored.log_prob
        );

        if symbol == Symbol::WordBoundary {
            to_state.complete_word(to_state.incomplete_word_score, scored.context);
        }
        Ok(to_state)
    }

    fn expand_state_end(&self, mut state: Self::State) -> Self::State {
        if !state.incomplete_word.is_empty() {
            let scored = self.score_word(&state.model_context, &state.incomplete_word);
            state.complete_word(scored.log_prob, scored.context);
        }
        let end = self
            .model
            .score(&state.model_context, self.model.end_sentence_index());
        state.completed_words_score += end.log_prob;
        state
    }

    fn state_expansion_score(&self, state: &Self::State, previous_score: f32) -> f32 {
        previous_score + state.total_score()
    }

    fn state_end_expansion_score(&self, state: &Self::State) -> f32 {
        state.completed_words_score
    }
}
