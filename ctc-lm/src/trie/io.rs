//! Text serialization of [`PrefixTrie`].
//!
//! Pre-order, one value per line: `prefix_count`, `min_score_word_index`,
//! `min_unigram_score`, then the `N` children in slot order. An absent child
//! is the single line `-1`. There is no header; reader and writer must agree
//! on `N`.

use std::collections::VecDeque;
use std::io::{BufRead, BufWriter, Write};
use std::str::FromStr;

use super::{NodeId, PrefixTrie, TrieError, TrieNode, ROOT};
use crate::lm::WordIndex;

const ABSENT: &str = "-1";

impl<const N: usize> PrefixTrie<N> {
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), TrieError> {
        let mut out = BufWriter::new(writer);
        let mut stack: Vec<Option<NodeId>> = vec![Some(ROOT)];

        while let Some(entry) = stack.pop() {
            let Some(id) = entry else {
                writeln!(out, "{ABSENT}")?;
                continue;
            };
            let node = &self.nodes[id as usize];
            writeln!(out, "{}", node.prefix_count)?;
            writeln!(out, "{}", node.min_score_word_index)?;
            writeln!(out, "{}", node.min_unigram_score)?;
            stack.extend(node.children.iter().rev());
        }

        out.flush()?;
        log::debug!("Serialized trie with {} nodes", self.nodes.len());
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, TrieError> {
        let mut tokens = Tokens::new(reader);

        let root = read_node::<N, R>(&mut tokens)?
            .ok_or_else(|| tokens.malformed("root node is absent"))?;
        let mut nodes = vec![root];
        // (node, next child slot to read)
        let mut stack: Vec<(NodeId, usize)> = vec![(ROOT, 0)];

        while let Some(top) = stack.last_mut() {
            if top.1 == N {
                stack.pop();
                continue;
            }
            let (parent, slot) = *top;
            top.1 += 1;

            if let Some(node) = read_node::<N, R>(&mut tokens)? {
                let id = NodeId::try_from(nodes.len())
                    .map_err(|_| tokens.malformed("too many nodes"))?;
                nodes.push(node);
                nodes[parent as usize].children[slot] = Some(id);
                stack.push((id, 0));
            }
        }

        if let Some(extra) = tokens.next()? {
            return Err(tokens.malformed(format!("trailing data {extra:?}")));
        }

        log::debug!("Deserialized trie with {} nodes", nodes.len());
        Ok(Self::from_nodes(nodes))
    }

    pub fn from_text(text: &str) -> Result<Self, TrieError> {
        Self::read_from(text.as_bytes())
    }
}

fn read_node<const N: usize, R: BufRead>(
    tokens: &mut Tokens<R>,
) -> Result<Option<TrieNode<N>>, TrieError> {
    let count = tokens.expect("prefix count")?;
    if count == ABSENT {
        return Ok(None);
    }
    let prefix_count: u32 = tokens.parse(&count, "prefix count")?;
    let index = tokens.expect("word index")?;
    let min_score_word_index: WordIndex = tokens.parse(&index, "word index")?;
    let score = tokens.expect("unigram score")?;
    let min_unigram_score: f32 = tokens.parse(&score, "unigram score")?;

    Ok(Some(TrieNode {
        prefix_count,
        min_score_word_index,
        min_unigram_score,
        children: [None; N],
    }))
}

/// Whitespace-separated tokens pulled lazily from a reader.
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
    consumed: usize,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            consumed: 0,
        }
    }

    fn next(&mut self) -> Result<Option<String>, TrieError> {
        let mut line = String::new();
        while self.pending.is_empty() {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(str::to_string));
        }
        self.consumed += 1;
        Ok(self.pending.pop_front())
    }

    fn expect(&mut self, field: &str) -> Result<String, TrieError> {
        self.next()?
            .ok_or_else(|| self.malformed(format!("stream ended while reading {field}")))
    }

    fn parse<T: FromStr>(&self, token: &str, field: &str) -> Result<T, TrieError> {
        token
            .parse()
            .map_err(|_| self.malformed(format!("invalid {field} {token:?}")))
    }

    fn malformed(&self, reason: impl Into<String>) -> TrieError {
        TrieError::MalformedTrieStream {
            token: self.consumed,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_layout() {
        let mut trie = PrefixTrie::<2>::new();
        trie.insert_slots(&[1], 7, -1.5).unwrap();
        assert_eq!(trie.to_text(), "1\n7\n-1.5\n-1\n1\n7\n-1.5\n-1\n-1\n");
    }

    #[test]
    fn empty_trie_round_trips() {
        let trie = PrefixTrie::<3>::new();
        let text = trie.to_text();
        assert_eq!(text, "0\n0\ninf\n-1\n-1\n-1\n");
        let back = PrefixTrie::<3>::from_text(&text).unwrap();
        assert_eq!(back, trie);
    }

    #[test]
    fn tokens_may_share_lines() {
        let trie = PrefixTrie::<2>::from_text("1 7 -1.5 -1\n1 7 -1.5 -1 -1").unwrap();
        assert_eq!(trie.node_count(), 2);
        assert_eq!(trie.root().child_at(1).unwrap().min_score_word_index(), 7);
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let err = PrefixTrie::<2>::from_text("1\n7\n-1.5\n-1\n1\n7\n").unwrap_err();
        assert!(matches!(err, TrieError::MalformedTrieStream { .. }));
    }

    #[test]
    fn absent_root_is_malformed() {
        assert!(matches!(
            PrefixTrie::<2>::from_text("-1\n"),
            Err(TrieError::MalformedTrieStream { token: 1, .. })
        ));
    }

    #[test]
    fn trailing_tokens_are_malformed() {
        let err = PrefixTrie::<1>::from_text("0\n0\ninf\n-1\n5\n").unwrap_err();
        assert!(err.to_string().contains("trailing"));
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let err = PrefixTrie::<1>::from_text("1\nseven\n-1.0\n-1\n").unwrap_err();
        assert!(matches!(err, TrieError::MalformedTrieStream { token: 2, .. }));
    }
}
