//! Definitions -- the interface of the multiplex de Bruijn graph toolkit.
//! The engine and the CLI talk to each other through one, possibly large, JSON-encoded
//! structure named [DataSet]: the compacted graph as an edge list plus the reads threaded
//! through it as sequences of edge indices. The result comes back as a [Resolution].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DataSet {
    /// The k-mer size the input graph was compacted at. Every vertex label has this length.
    pub start_k: usize,
    /// The edges of the compacted de Bruijn graph.
    pub edges: Vec<EdgeRecord>,
    /// The reads, threaded through the graph as paths of edge indices.
    /// Indices refer to the position of the edge in `edges`.
    pub reads: Vec<ReadPath>,
}

impl DataSet {
    pub fn new(start_k: usize, edges: Vec<EdgeRecord>, reads: Vec<ReadPath>) -> Self {
        Self {
            start_k,
            edges,
            reads,
        }
    }
    /// Sanity check function. Call it to ensure that some properties indeed hold.
    /// 1: Every edge sequence is long enough to span both endpoint labels minus their overlap.
    /// 2: Every read path refers only to edges that exist.
    /// These should hold at any step of the pipeline, so this is just a checking function.
    pub fn sanity_check(&self) -> bool {
        let long_enough = self.edges.iter().all(|e| e.sequence.len() > self.start_k);
        let edges_exist = self
            .reads
            .iter()
            .flat_map(|r| r.edges.iter())
            .all(|&e| (e as usize) < self.edges.len());
        long_enough && edges_exist
    }
}

/// One edge of the input graph, carrying its full nucleotide sequence.
/// The first and last `start_k` symbols are the labels of the endpoint vertices;
/// for very short edges the two labels overlap inside the sequence.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EdgeRecord {
    pub start: u64,
    pub end: u64,
    pub sequence: String,
    /// Set by an upstream classifier for edges believed to be single-copy.
    #[serde(default)]
    pub unique: bool,
}

/// A read threaded through the graph: the ordered list of edges it traverses.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReadPath {
    pub id: String,
    pub edges: Vec<u64>,
}

/// The outcome of repeat resolution: the rewritten edge list at the final k,
/// plus the fragments that became shorter than k and were frozen aside.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Resolution {
    pub k: usize,
    pub edges: Vec<EdgeRecord>,
    pub isolates: Vec<IsolateRecord>,
}

/// A fragment whose entire sequence fits inside one vertex label.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IsolateRecord {
    pub vertex: u64,
    pub sequence: String,
    pub edge_index: u64,
    pub unique: bool,
}

/// A nucleotide sequence that grows from both ends.
/// Vertex labels gain one symbol per round, sometimes at the front and sometimes at
/// the back, so the backing store is a deque rather than a plain vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DnaSeq(VecDeque<u8>);

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => unreachable!("not a nucleotide: {}", base as char),
    }
}

impl DnaSeq {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_bytes(seq: &[u8]) -> Self {
        seq.iter().copied().collect()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn push_front(&mut self, base: u8) {
        self.0.push_front(base);
    }
    pub fn push_back(&mut self, base: u8) {
        self.0.push_back(base);
    }
    pub fn pop_front(&mut self) -> Option<u8> {
        self.0.pop_front()
    }
    pub fn pop_back(&mut self) -> Option<u8> {
        self.0.pop_back()
    }
    pub fn first(&self) -> Option<u8> {
        self.0.front().copied()
    }
    pub fn last(&self) -> Option<u8> {
        self.0.back().copied()
    }
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
    /// Reverse complement: A<->T, C<->G, read backwards.
    pub fn rev_comp(&self) -> Self {
        self.0.iter().rev().map(|&b| complement(b)).collect()
    }
    /// A sequence is canonical iff it is lexicographically no greater than its
    /// reverse complement.
    pub fn is_canonical(&self) -> bool {
        *self <= self.rev_comp()
    }
}

impl std::ops::Index<usize> for DnaSeq {
    type Output = u8;
    fn index(&self, index: usize) -> &u8 {
        &self.0[index]
    }
}

impl std::iter::FromIterator<u8> for DnaSeq {
    fn from_iter<T: IntoIterator<Item = u8>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&str> for DnaSeq {
    fn from(seq: &str) -> Self {
        Self::from_bytes(seq.as_bytes())
    }
}

impl std::fmt::Display for DnaSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for &base in self.0.iter() {
            write!(f, "{}", base as char)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn rev_comp() {
        assert_eq!(DnaSeq::from("AATTCCGG").rev_comp(), DnaSeq::from("CCGGAATT"));
        assert_eq!(DnaSeq::new().rev_comp(), DnaSeq::new());
    }
    #[test]
    fn rev_comp_round_trip() {
        let seq = DnaSeq::from("ACGTTGCA");
        assert_eq!(seq.rev_comp().rev_comp(), seq);
    }
    #[test]
    fn canonical() {
        assert!(DnaSeq::from("AATTCCGG").is_canonical());
        assert!(!DnaSeq::from("CCGGAATT").is_canonical());
        assert!(DnaSeq::from("ACGT").is_canonical());
    }
    #[test]
    fn grows_both_ends() {
        let mut seq = DnaSeq::from("CG");
        seq.push_front(b'A');
        seq.push_back(b'T');
        assert_eq!(seq.to_string(), "ACGT");
        assert_eq!(seq.pop_front(), Some(b'A'));
        assert_eq!(seq.pop_back(), Some(b'T'));
        assert_eq!(seq.len(), 2);
    }
}
