use crate::labels::{Label, LabelError, LabelTranslator, Symbol, NO_LABEL};

use super::BeamScorer;

/// Runs one complete label path through `scorer`, the way a single surviving
/// beam would be driven, and returns its end-expansion score.
pub fn score_label_sequence<S: BeamScorer>(
    scorer: &S,
    labels: &[Label],
) -> Result<f32, LabelError> {
    let mut state = scorer.initialize_state();
    let mut from_label = NO_LABEL;
    for &to_label in labels {
        state = scorer.expand_state(&state, from_label, to_label)?;
        from_label = to_label;
    }
    let state = scorer.expand_state_end(state);
    Ok(scorer.state_end_expansion_score(&state))
}

/// Collapses a raw CTC label path into text: repeats merge, blanks vanish and
/// word boundaries become spaces.
pub fn collapse_labels(
    translator: &LabelTranslator,
    labels: &[Label],
) -> Result<String, LabelError> {
    let mut text = String::with_capacity(labels.len() / 2);
    let mut previous = NO_LABEL;
    for &label in labels {
        if label != previous {
            match translator.translate(label)? {
                Symbol::Blank => {}
                Symbol::WordBoundary => text.push(' '),
                Symbol::Character(c) => text.push(c),
            }
        }
        previous = label;
    }
    Ok(text)
}
