//! The read-path index.
//! Every read is kept as a doubly linked list of the edges it traverses, and two
//! reverse indices point from an edge (or an adjacent edge pair) to every position
//! where it occurs. The graph rewrites consult the pair index to decide which
//! traversals through a branching vertex are supported by actual reads, and they
//! mutate the paths through [ReadPaths::add], [ReadPaths::remove], and
//! [ReadPaths::merge] so both views stay in lock-step.
use crate::EdgeIndex;
use definitions::ReadPath;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Position of one edge occurrence: (read number, slot in that read's arena).
/// Slots are never reused, so positions stay valid across splices.
type PathPos = (usize, usize);

#[derive(Debug, Clone)]
struct PathSlot {
    edge: EdgeIndex,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug, Clone)]
struct ThreadedRead {
    id: String,
    slots: Vec<PathSlot>,
    head: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ReadPaths {
    reads: Vec<ThreadedRead>,
    edge_to_pos: HashMap<EdgeIndex, HashSet<PathPos>>,
    pair_to_pos: HashMap<(EdgeIndex, EdgeIndex), HashSet<PathPos>>,
}

impl ReadPaths {
    pub fn from_reads(records: &[ReadPath]) -> Self {
        let reads: Vec<ThreadedRead> = records
            .iter()
            .map(|record| {
                let last = record.edges.len().wrapping_sub(1);
                let slots: Vec<PathSlot> = record
                    .edges
                    .iter()
                    .enumerate()
                    .map(|(at, &edge)| PathSlot {
                        edge,
                        prev: (at > 0).then(|| at - 1),
                        next: (at < last).then(|| at + 1),
                    })
                    .collect();
                ThreadedRead {
                    id: record.id.clone(),
                    head: (!slots.is_empty()).then(|| 0),
                    slots,
                }
            })
            .collect();
        let (edge_to_pos, pair_to_pos) = reads
            .par_iter()
            .enumerate()
            .map(|(read_at, read)| {
                let mut edges: HashMap<EdgeIndex, HashSet<PathPos>> = HashMap::new();
                let mut pairs: HashMap<(EdgeIndex, EdgeIndex), HashSet<PathPos>> = HashMap::new();
                for (at, slot) in read.slots.iter().enumerate() {
                    edges.entry(slot.edge).or_default().insert((read_at, at));
                    if let Some(next) = slot.next {
                        let key = (slot.edge, read.slots[next].edge);
                        pairs.entry(key).or_default().insert((read_at, at));
                    }
                }
                (edges, pairs)
            })
            .reduce(
                || (HashMap::new(), HashMap::new()),
                |(mut edges, mut pairs), (other_edges, other_pairs)| {
                    for (key, positions) in other_edges {
                        edges.entry(key).or_default().extend(positions);
                    }
                    for (key, positions) in other_pairs {
                        pairs.entry(key).or_default().extend(positions);
                    }
                    (edges, pairs)
                },
            );
        Self {
            reads,
            edge_to_pos,
            pair_to_pos,
        }
    }

    /// True iff `(first, second)` occurs adjacently in at least one read.
    pub fn contains_pair(&self, first: EdgeIndex, second: EdgeIndex) -> bool {
        self.pair_to_pos
            .get(&(first, second))
            .map_or(false, |set| !set.is_empty())
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }
    pub fn read_id(&self, read: usize) -> &str {
        &self.reads[read].id
    }
    /// The current edge sequence of one read, front to back.
    pub fn read_edges(&self, read: usize) -> Vec<EdgeIndex> {
        let read = &self.reads[read];
        let mut edges = vec![];
        let mut cursor = read.head;
        while let Some(slot) = cursor {
            edges.push(read.slots[slot].edge);
            cursor = read.slots[slot].next;
        }
        edges
    }
    /// Every edge index that still occurs on some read.
    pub fn edges_on_reads(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.edge_to_pos.keys().copied()
    }

    /// Delete every occurrence of `target` and splice its neighbors together.
    pub fn remove(&mut self, target: EdgeIndex) {
        let mut occurrences: Vec<PathPos> = match self.edge_to_pos.remove(&target) {
            Some(set) => set.into_iter().collect(),
            None => return,
        };
        occurrences.sort_unstable();
        for (read, slot) in occurrences {
            let prev = self.reads[read].slots[slot].prev;
            let next = self.reads[read].slots[slot].next;
            if let Some(before) = prev {
                let before_edge = self.edge_at(read, before);
                self.drop_pair((before_edge, target), (read, before));
            }
            if let Some(after) = next {
                let after_edge = self.edge_at(read, after);
                self.drop_pair((target, after_edge), (read, slot));
            }
            self.unlink(read, slot);
            if let (Some(before), Some(after)) = (prev, next) {
                let spliced = (self.edge_at(read, before), self.edge_at(read, after));
                self.insert_pair(spliced, (read, before));
            }
        }
    }

    /// Wherever `(first, second)` occurs adjacently, splice `fresh` between them.
    pub fn add(&mut self, first: EdgeIndex, second: EdgeIndex, fresh: EdgeIndex) {
        let mut occurrences: Vec<PathPos> = match self.pair_to_pos.get(&(first, second)) {
            Some(set) => set.iter().copied().collect(),
            None => return,
        };
        occurrences.sort_unstable();
        for (read, slot) in occurrences {
            let next = self.reads[read].slots[slot]
                .next
                .expect("indexed pair lost its second element");
            let fresh_slot = self.reads[read].slots.len();
            self.reads[read].slots.push(PathSlot {
                edge: fresh,
                prev: Some(slot),
                next: Some(next),
            });
            self.reads[read].slots[slot].next = Some(fresh_slot);
            self.reads[read].slots[next].prev = Some(fresh_slot);
            self.drop_pair((first, second), (read, slot));
            self.insert_pair((first, fresh), (read, slot));
            self.insert_pair((fresh, second), (read, fresh_slot));
            self.edge_to_pos
                .entry(fresh)
                .or_default()
                .insert((read, fresh_slot));
        }
    }

    /// Replace the adjacent pair `(kept, absorbed)` by `kept` alone. An occurrence
    /// of `absorbed` with a different predecessor denotes a read that starts inside
    /// the merged edge; it is renamed to `kept`.
    pub fn merge(&mut self, kept: EdgeIndex, absorbed: EdgeIndex) {
        assert_ne!(kept, absorbed);
        let mut occurrences: Vec<PathPos> = match self.edge_to_pos.get(&absorbed) {
            Some(set) => set.iter().copied().collect(),
            None => return,
        };
        occurrences.sort_unstable();
        for (read, slot) in occurrences {
            let prev = self.reads[read].slots[slot].prev;
            let next = self.reads[read].slots[slot].next;
            let follows_kept = prev.map_or(false, |before| self.edge_at(read, before) == kept);
            if follows_kept {
                let before = prev.unwrap();
                self.drop_pair((kept, absorbed), (read, before));
                if let Some(after) = next {
                    let after_edge = self.edge_at(read, after);
                    self.drop_pair((absorbed, after_edge), (read, slot));
                }
                self.unlink(read, slot);
                self.drop_edge(absorbed, (read, slot));
                if let Some(after) = next {
                    let after_edge = self.edge_at(read, after);
                    self.insert_pair((kept, after_edge), (read, before));
                }
            } else {
                if let Some(before) = prev {
                    let before_edge = self.edge_at(read, before);
                    self.drop_pair((before_edge, absorbed), (read, before));
                    self.insert_pair((before_edge, kept), (read, before));
                }
                if let Some(after) = next {
                    let after_edge = self.edge_at(read, after);
                    self.drop_pair((absorbed, after_edge), (read, slot));
                    self.insert_pair((kept, after_edge), (read, slot));
                }
                self.reads[read].slots[slot].edge = kept;
                self.drop_edge(absorbed, (read, slot));
                self.edge_to_pos
                    .entry(kept)
                    .or_default()
                    .insert((read, slot));
            }
        }
        assert!(
            !self.edge_to_pos.contains_key(&absorbed),
            "edge {} still on some read after merge",
            absorbed
        );
    }

    /// Recompute both reverse indices from the linked paths and compare.
    pub fn assert_validity(&self) {
        let mut edge_index: HashMap<EdgeIndex, HashSet<PathPos>> = HashMap::new();
        let mut pair_index: HashMap<(EdgeIndex, EdgeIndex), HashSet<PathPos>> = HashMap::new();
        for (read_at, read) in self.reads.iter().enumerate() {
            let mut cursor = read.head;
            while let Some(slot) = cursor {
                let here = &read.slots[slot];
                edge_index.entry(here.edge).or_default().insert((read_at, slot));
                if let Some(next) = here.next {
                    assert_eq!(read.slots[next].prev, Some(slot));
                    pair_index
                        .entry((here.edge, read.slots[next].edge))
                        .or_default()
                        .insert((read_at, slot));
                }
                cursor = here.next;
            }
        }
        assert_eq!(edge_index, self.edge_to_pos);
        assert_eq!(pair_index, self.pair_to_pos);
    }

    fn edge_at(&self, read: usize, slot: usize) -> EdgeIndex {
        self.reads[read].slots[slot].edge
    }

    fn unlink(&mut self, read: usize, slot: usize) {
        let (prev, next) = {
            let here = &self.reads[read].slots[slot];
            (here.prev, here.next)
        };
        match prev {
            Some(before) => self.reads[read].slots[before].next = next,
            None => self.reads[read].head = next,
        }
        if let Some(after) = next {
            self.reads[read].slots[after].prev = prev;
        }
        let here = &mut self.reads[read].slots[slot];
        here.prev = None;
        here.next = None;
    }

    fn insert_pair(&mut self, key: (EdgeIndex, EdgeIndex), pos: PathPos) {
        self.pair_to_pos.entry(key).or_default().insert(pos);
    }
    fn drop_pair(&mut self, key: (EdgeIndex, EdgeIndex), pos: PathPos) {
        if let Some(set) = self.pair_to_pos.get_mut(&key) {
            set.remove(&pos);
            if set.is_empty() {
                self.pair_to_pos.remove(&key);
            }
        }
    }
    fn drop_edge(&mut self, edge: EdgeIndex, pos: PathPos) {
        if let Some(set) = self.edge_to_pos.get_mut(&edge) {
            set.remove(&pos);
            if set.is_empty() {
                self.edge_to_pos.remove(&edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(raw: &[(&str, &[u64])]) -> ReadPaths {
        let records: Vec<ReadPath> = raw
            .iter()
            .map(|&(id, edges)| ReadPath {
                id: id.to_string(),
                edges: edges.to_vec(),
            })
            .collect();
        ReadPaths::from_reads(&records)
    }
    fn all_reads(paths: &ReadPaths) -> Vec<Vec<u64>> {
        (0..paths.read_count()).map(|at| paths.read_edges(at)).collect()
    }
    fn edge_counts(paths: &ReadPaths) -> Vec<(u64, usize)> {
        let mut counts: Vec<_> = paths
            .edge_to_pos
            .iter()
            .map(|(&edge, set)| (edge, set.len()))
            .collect();
        counts.sort_unstable();
        counts
    }
    fn pair_counts(paths: &ReadPaths) -> Vec<((u64, u64), usize)> {
        let mut counts: Vec<_> = paths
            .pair_to_pos
            .iter()
            .map(|(&pair, set)| (pair, set.len()))
            .collect();
        counts.sort_unstable();
        counts
    }

    #[test]
    fn remove_add_merge() {
        let mut paths = build(&[
            ("0", &[1, 2, 3, 4, 5, 2, 6, 7, 8, 9, 10]),
            ("1", &[11, 12, 2, 13, 14, 15, 2, 17, 18]),
            ("2", &[2]),
            ("3", &[2, 19]),
            ("4", &[5, 2]),
        ]);
        paths.assert_validity();
        assert_eq!(
            edge_counts(&paths),
            vec![
                (1, 1),
                (2, 7),
                (3, 1),
                (4, 1),
                (5, 2),
                (6, 1),
                (7, 1),
                (8, 1),
                (9, 1),
                (10, 1),
                (11, 1),
                (12, 1),
                (13, 1),
                (14, 1),
                (15, 1),
                (17, 1),
                (18, 1),
                (19, 1),
            ]
        );
        assert_eq!(
            pair_counts(&paths),
            vec![
                ((1, 2), 1),
                ((2, 3), 1),
                ((2, 6), 1),
                ((2, 13), 1),
                ((2, 17), 1),
                ((2, 19), 1),
                ((3, 4), 1),
                ((4, 5), 1),
                ((5, 2), 2),
                ((6, 7), 1),
                ((7, 8), 1),
                ((8, 9), 1),
                ((9, 10), 1),
                ((11, 12), 1),
                ((12, 2), 1),
                ((13, 14), 1),
                ((14, 15), 1),
                ((15, 2), 1),
                ((17, 18), 1),
            ]
        );

        paths.remove(2);
        paths.assert_validity();
        assert_eq!(
            all_reads(&paths),
            vec![
                vec![1, 3, 4, 5, 6, 7, 8, 9, 10],
                vec![11, 12, 13, 14, 15, 17, 18],
                vec![],
                vec![19],
                vec![5],
            ]
        );
        assert_eq!(
            pair_counts(&paths),
            vec![
                ((1, 3), 1),
                ((3, 4), 1),
                ((4, 5), 1),
                ((5, 6), 1),
                ((6, 7), 1),
                ((7, 8), 1),
                ((8, 9), 1),
                ((9, 10), 1),
                ((11, 12), 1),
                ((12, 13), 1),
                ((13, 14), 1),
                ((14, 15), 1),
                ((15, 17), 1),
                ((17, 18), 1),
            ]
        );

        paths.add(1, 3, 2);
        paths.assert_validity();
        assert_eq!(
            all_reads(&paths),
            vec![
                vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                vec![11, 12, 13, 14, 15, 17, 18],
                vec![],
                vec![19],
                vec![5],
            ]
        );
        assert_eq!(
            pair_counts(&paths),
            vec![
                ((1, 2), 1),
                ((2, 3), 1),
                ((3, 4), 1),
                ((4, 5), 1),
                ((5, 6), 1),
                ((6, 7), 1),
                ((7, 8), 1),
                ((8, 9), 1),
                ((9, 10), 1),
                ((11, 12), 1),
                ((12, 13), 1),
                ((13, 14), 1),
                ((14, 15), 1),
                ((15, 17), 1),
                ((17, 18), 1),
            ]
        );

        paths.merge(4, 5);
        paths.assert_validity();
        assert_eq!(
            all_reads(&paths),
            vec![
                vec![1, 2, 3, 4, 6, 7, 8, 9, 10],
                vec![11, 12, 13, 14, 15, 17, 18],
                vec![],
                vec![19],
                vec![4],
            ]
        );
        assert_eq!(
            edge_counts(&paths),
            vec![
                (1, 1),
                (2, 1),
                (3, 1),
                (4, 2),
                (6, 1),
                (7, 1),
                (8, 1),
                (9, 1),
                (10, 1),
                (11, 1),
                (12, 1),
                (13, 1),
                (14, 1),
                (15, 1),
                (17, 1),
                (18, 1),
                (19, 1),
            ]
        );
        assert_eq!(
            pair_counts(&paths),
            vec![
                ((1, 2), 1),
                ((2, 3), 1),
                ((3, 4), 1),
                ((4, 6), 1),
                ((6, 7), 1),
                ((7, 8), 1),
                ((8, 9), 1),
                ((9, 10), 1),
                ((11, 12), 1),
                ((12, 13), 1),
                ((13, 14), 1),
                ((14, 15), 1),
                ((15, 17), 1),
                ((17, 18), 1),
            ]
        );
    }

    #[test]
    fn merge_at_path_boundary() {
        // A read ending on `kept` and another starting on `absorbed`.
        let mut paths = build(&[("0", &[1, 2]), ("1", &[2, 3])]);
        paths.merge(1, 2);
        paths.assert_validity();
        assert_eq!(all_reads(&paths), vec![vec![1], vec![1, 3]]);
    }

    #[test]
    fn add_unrolls_self_adjacency() {
        let mut paths = build(&[("0", &[0, 1, 1, 2])]);
        assert!(paths.contains_pair(1, 1));
        paths.add(1, 1, 3);
        paths.assert_validity();
        assert_eq!(paths.read_edges(0), vec![0, 1, 3, 1, 2]);
        assert!(!paths.contains_pair(1, 1));
    }

    #[test]
    fn contains_pair_tracks_splices() {
        let mut paths = build(&[("0", &[4, 7, 9])]);
        assert!(paths.contains_pair(4, 7));
        assert!(!paths.contains_pair(4, 9));
        paths.remove(7);
        assert!(paths.contains_pair(4, 9));
        assert!(!paths.contains_pair(4, 7));
    }
}
