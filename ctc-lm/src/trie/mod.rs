//! Vocabulary prefix trie.
//!
//! Every node records how many vocabulary words pass through it and the best
//! word (lowest unigram score) among them, so a decoder can prune a partial
//! word at any depth. The tree is built once offline, serialized, and loaded
//! read-only at decode time.

mod builder;
mod io;

pub use builder::{build_vocabulary_trie, build_vocabulary_trie_from_reader};

use crate::lm::{WordIndex, UNKNOWN_WORD_INDEX};

/// Letters `a..=z` plus the apostrophe.
pub const ALPHABET_SIZE: usize = 27;

pub type VocabularyTrie = PrefixTrie<ALPHABET_SIZE>;

type NodeId = u32;

const ROOT: NodeId = 0;

#[derive(thiserror::Error, Debug)]
pub enum TrieError {
    #[error("Character {0:?} is outside the trie vocabulary")]
    InvalidVocabulary(char),
    #[error("Slot {slot} is outside the trie branching factor {branching}")]
    InvalidSlot { slot: usize, branching: usize },
    #[error("Malformed trie stream at token {token}: {reason}")]
    MalformedTrieStream { token: usize, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TrieError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidVocabulary(_) | Self::InvalidSlot { .. } => {
                "A vocabulary word contains characters the trie cannot store."
            }
            Self::MalformedTrieStream { .. } => {
                "The trie file is truncated or corrupted. Rebuild it from the vocabulary."
            }
            Self::Io(_) => "The trie could not be read or written.",
        }
    }
}

/// Maps a vocabulary character to its child slot.
pub fn char_to_slot(c: char) -> Result<usize, TrieError> {
    match c {
        'a'..='z' => Ok(c as usize - 'a' as usize),
        '\'' => Ok(26),
        _ => Err(TrieError::InvalidVocabulary(c)),
    }
}

#[derive(Debug, Clone)]
struct TrieNode<const N: usize> {
    prefix_count: u32,
    min_score_word_index: WordIndex,
    min_unigram_score: f32,
    children: [Option<NodeId>; N],
}

impl<const N: usize> TrieNode<N> {
    fn empty() -> Self {
        Self {
            prefix_count: 0,
            min_score_word_index: UNKNOWN_WORD_INDEX,
            min_unigram_score: f32::INFINITY,
            children: [None; N],
        }
    }

    fn record(&mut self, word_index: WordIndex, unigram_score: f32) {
        self.prefix_count += 1;
        if unigram_score < self.min_unigram_score {
            self.min_unigram_score = unigram_score;
            self.min_score_word_index = word_index;
        }
    }

    fn same_fields(&self, other: &Self) -> bool {
        self.prefix_count == other.prefix_count
            && self.min_score_word_index == other.min_score_word_index
            && self.min_unigram_score.to_bits() == other.min_unigram_score.to_bits()
    }
}

/// Prefix trie with a fixed branching factor `N`, stored as an arena.
///
/// Node 0 is the root; children are addressed by arena index, so the tree
/// can be walked without recursion.
#[derive(Debug, Clone)]
pub struct PrefixTrie<const N: usize> {
    nodes: Vec<TrieNode<N>>,
}

impl<const N: usize> Default for PrefixTrie<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PrefixTrie<N> {
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::empty()],
        }
    }

    fn from_nodes(nodes: Vec<TrieNode<N>>) -> Self {
        Self { nodes }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> TrieNodeRef<'_, N> {
        TrieNodeRef {
            trie: self,
            id: ROOT,
        }
    }

    /// Inserts a word given as child slots. The root and every node on the
    /// path count the word and compete for the minimum score.
    pub fn insert_slots(
        &mut self,
        slots: &[usize],
        word_index: WordIndex,
        unigram_score: f32,
    ) -> Result<(), TrieError> {
        if let Some(&slot) = slots.iter().find(|&&slot| slot >= N) {
            return Err(TrieError::InvalidSlot { slot, branching: N });
        }

        let mut current = ROOT;
        self.nodes[current as usize].record(word_index, unigram_score);
        for &slot in slots {
            let next = match self.nodes[current as usize].children[slot] {
                Some(child) => child,
                None => {
                    let child = self.nodes.len() as NodeId;
                    self.nodes.push(TrieNode::empty());
                    self.nodes[current as usize].children[slot] = Some(child);
                    child
                }
            };
            self.nodes[next as usize].record(word_index, unigram_score);
            current = next;
        }
        Ok(())
    }

    /// Inserts `word`, translating each character with `slot_of`. The whole
    /// word is translated before the tree is touched, so a rejected word
    /// leaves the trie unchanged.
    pub fn insert_with<F>(
        &mut self,
        word: &str,
        slot_of: F,
        word_index: WordIndex,
        unigram_score: f32,
    ) -> Result<(), TrieError>
    where
        F: Fn(char) -> Result<usize, TrieError>,
    {
        let slots = word.chars().map(slot_of).collect::<Result<Vec<_>, _>>()?;
        self.insert_slots(&slots, word_index, unigram_score)
    }

    pub fn find_slots(&self, slots: &[usize]) -> Option<TrieNodeRef<'_, N>> {
        slots
            .iter()
            .try_fold(self.root(), |node, &slot| node.child_at(slot))
    }

    pub fn find_with<F>(
        &self,
        prefix: &str,
        slot_of: F,
    ) -> Result<Option<TrieNodeRef<'_, N>>, TrieError>
    where
        F: Fn(char) -> Result<usize, TrieError>,
    {
        let slots = prefix.chars().map(slot_of).collect::<Result<Vec<_>, _>>()?;
        Ok(self.find_slots(&slots))
    }
}

impl PrefixTrie<ALPHABET_SIZE> {
    pub fn insert(
        &mut self,
        word: &str,
        word_index: WordIndex,
        unigram_score: f32,
    ) -> Result<(), TrieError> {
        self.insert_with(word, char_to_slot, word_index, unigram_score)
    }

    pub fn find(
        &self,
        prefix: &str,
    ) -> Result<Option<TrieNodeRef<'_, ALPHABET_SIZE>>, TrieError> {
        self.find_with(prefix, char_to_slot)
    }

    /// Number of inserted words starting with `prefix`; 0 when none do.
    pub fn frequency_of(&self, prefix: &str) -> Result<u32, TrieError> {
        Ok(self.find(prefix)?.map_or(0, |node| node.frequency()))
    }
}

/// Structural equality: same shape and same per-node statistics, regardless
/// of the order nodes were allocated in.
impl<const N: usize> PartialEq for PrefixTrie<N> {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(ROOT, ROOT)];
        while let Some((a, b)) = stack.pop() {
            let (a, b) = (&self.nodes[a as usize], &other.nodes[b as usize]);
            if !a.same_fields(b) {
                return false;
            }
            for (ca, cb) in a.children.iter().zip(b.children.iter()) {
                match (ca, cb) {
                    (None, None) => {}
                    (Some(ca), Some(cb)) => stack.push((*ca, *cb)),
                    _ => return false,
                }
            }
        }
        true
    }
}

/// Borrowed view of one trie node.
#[derive(Debug, Clone, Copy)]
pub struct TrieNodeRef<'a, const N: usize> {
    trie: &'a PrefixTrie<N>,
    id: NodeId,
}

impl<'a, const N: usize> TrieNodeRef<'a, N> {
    fn node(&self) -> &'a TrieNode<N> {
        &self.trie.nodes[self.id as usize]
    }

    pub fn frequency(&self) -> u32 {
        self.node().prefix_count
    }

    pub fn min_score_word_index(&self) -> WordIndex {
        self.node().min_score_word_index
    }

    pub fn min_unigram_score(&self) -> f32 {
        self.node().min_unigram_score
    }

    pub fn child_at(&self, slot: usize) -> Option<TrieNodeRef<'a, N>> {
        let child = (*self.node().children.get(slot)?)?;
        Some(TrieNodeRef {
            trie: self.trie,
            id: child,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = (usize, TrieNodeRef<'a, N>)> + 'a {
        let trie = self.trie;
        self.node()
            .children
            .iter()
            .enumerate()
            .filter_map(move |(slot, child)| child.map(|id| (slot, TrieNodeRef { trie, id })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_slots_cover_letters_and_apostrophe() {
        assert_eq!(char_to_slot('a').unwrap(), 0);
        assert_eq!(char_to_slot('z').unwrap(), 25);
        assert_eq!(char_to_slot('\'').unwrap(), 26);
        assert!(matches!(
            char_to_slot('A'),
            Err(TrieError::InvalidVocabulary('A'))
        ));
    }

    #[test]
    fn empty_trie_has_only_root() {
        let trie = VocabularyTrie::new();
        assert_eq!(trie.node_count(), 1);
        assert_eq!(trie.root().frequency(), 0);
        assert!(trie.root().min_unigram_score().is_infinite());
        assert_eq!(trie.root().children().count(), 0);
    }

    #[test]
    fn rejected_word_leaves_trie_untouched() {
        let mut trie = VocabularyTrie::new();
        trie.insert("ab", 1, -1.0).unwrap();
        let before = trie.clone();
        assert!(trie.insert("ab-c", 2, -0.5).is_err());
        assert_eq!(trie, before);
        assert_eq!(trie.node_count(), 3);
    }

    #[test]
    fn out_of_range_slot_is_rejected() {
        let mut trie = PrefixTrie::<4>::new();
        assert!(matches!(
            trie.insert_slots(&[1, 4], 1, -1.0),
            Err(TrieError::InvalidSlot { slot: 4, branching: 4 })
        ));
        assert_eq!(trie.root().frequency(), 0);
    }

    #[test]
    fn equality_ignores_allocation_order() {
        let mut a = PrefixTrie::<3>::new();
        a.insert_slots(&[0, 1], 1, -1.0).unwrap();
        a.insert_slots(&[2], 2, -2.0).unwrap();
        let mut b = PrefixTrie::<3>::new();
        b.insert_slots(&[2], 2, -2.0).unwrap();
        b.insert_slots(&[0, 1], 1, -1.0).unwrap();
        assert_eq!(a, b);

        b.insert_slots(&[0], 3, -0.5).unwrap();
        assert_ne!(a, b);
    }
}
