//! Scoring strategies the CTC beam search consults while it grows beams.
//!
//! The decoder owns the beams and calls into a [`BeamScorer`] once per
//! parent → child expansion, once more when decoding ends, and reads the cached
//! scores when re-ranking. Scorer states are plain values: every expansion
//! yields a fresh copy, so sibling beams can be expanded concurrently.

use crate::labels::{Label, LabelError};

pub(crate) mod language_model;
pub(crate) mod search;
pub(crate) mod state;

pub use language_model::LanguageModelBeamScorer;
pub use search::{collapse_labels, score_label_sequence};
pub use state::BeamState;

pub trait BeamScorer {
    type State: Clone;

    fn initialize_state(&self) -> Self::State;

    /// Called at most once per child beam.
    fn expand_state(
        &self,
        from_state: &Self::State,
        from_label: Label,
        to_label: Label,
    ) -> Result<Self::State, LabelError>;

    /// Final scoring of a beam after decoding has finished, before the
    /// decoder re-sorts and extracts its top candidates. Called at most once
    /// per beam.
    fn expand_state_end(&self, state: Self::State) -> Self::State;

    /// Cheap read of the cached expansion score, combined with the network's
    /// score for the current step. Log-probability.
    fn state_expansion_score(&self, state: &Self::State, previous_score: f32) -> f32;

    /// Cheap read of the score cached by [`expand_state_end`](Self::expand_state_end).
    /// Log-probability.
    fn state_end_expansion_score(&self, state: &Self::State) -> f32;
}

/// Plain CTC decoding: no state, no extra score.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseBeamScorer;

impl BeamScorer for BaseBeamScorer {
    type State = ();

    fn initialize_state(&self) -> Self::State {}

    fn expand_state(&self, _: &(), _: Label, _: Label) -> Result<(), LabelError> {
        Ok(())
    }

    fn expand_state_end(&self, state: ()) -> Self::State {
        state
    }

    fn state_expansion_score(&self, _: &(), previous_score: f32) -> f32 {
        previous_score
    }

    fn state_end_expansion_score(&self, _: &()) -> f32 {
        0.0
    }
}
