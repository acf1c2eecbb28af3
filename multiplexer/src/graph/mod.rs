//! The multiplex de Bruijn graph.
//! Vertices and edges live in flat arenas keyed by stable integer ids; every
//! adjacency is a list of edge indices, and any cursor into the graph is re-derived
//! by id lookup after a mutation. The graph owns the read-path index and the two are
//! only ever mutated together, through [MultiplexDbg::merge_edges],
//! [MultiplexDbg::add_connecting_edge], and [MultiplexDbg::collapse_edge].
use crate::paths::ReadPaths;
use crate::{EdgeIndex, VertexId};
use definitions::{DnaSeq, EdgeRecord, IsolateRecord, Resolution};
use std::collections::HashMap;

mod collapse;
mod dot;
mod rewrite;

/// The label of a vertex: `k + niter` symbols for live vertices, final output for
/// frozen ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexProperty {
    label: DnaSeq,
    frozen: bool,
}

impl VertexProperty {
    pub fn new(label: DnaSeq, frozen: bool) -> Self {
        Self { label, frozen }
    }
    pub fn len(&self) -> usize {
        self.label.len()
    }
    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }
    pub fn label(&self) -> &DnaSeq {
        &self.label
    }
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// What an edge stores between its endpoint labels.
///
/// `size` is signed: positive means `infix` holds that many symbols strictly
/// between the two labels, zero or negative means the infix is empty and the
/// endpoint labels overlap by `-size` symbols inside the full sequence. An edge
/// whose `-size` reaches the label length carries no symbols of its own and is
/// collapsed by the short-edge sweep.
#[derive(Debug, Clone)]
pub struct EdgeProperty {
    index: EdgeIndex,
    infix: DnaSeq,
    size: i64,
    unique: bool,
}

impl EdgeProperty {
    pub fn new(index: EdgeIndex, infix: DnaSeq, size: i64, unique: bool) -> Self {
        assert!(size <= 0 || infix.len() as i64 == size);
        assert!(size > 0 || infix.is_empty());
        Self {
            index,
            infix,
            size,
            unique,
        }
    }
    /// A fresh edge spanning the split of a vertex of label length `old_len`: one
    /// symbol of context on each side, so the endpoint labels overlap by `old_len`.
    fn bridge(index: EdgeIndex, old_len: usize) -> Self {
        Self {
            index,
            infix: DnaSeq::new(),
            size: -(old_len as i64),
            unique: false,
        }
    }
    pub fn index(&self) -> EdgeIndex {
        self.index
    }
    pub fn size(&self) -> i64 {
        self.size
    }
    pub fn infix(&self) -> &DnaSeq {
        &self.infix
    }
    pub fn is_unique(&self) -> bool {
        self.unique
    }
    /// One symbol moved from the front of this edge into its start label.
    fn trim_front(&mut self) {
        if self.size > 0 {
            self.infix.pop_front();
        }
        self.size -= 1;
    }
    /// One symbol moved from the back of this edge into its end label.
    fn trim_back(&mut self) {
        if self.size > 0 {
            self.infix.pop_back();
        }
        self.size -= 1;
    }
    /// Undo one split-time trim when a segment closes into a self-loop: the loop
    /// period is `label_len + size`, and rewiring the end back onto the start
    /// vertex hands one absorbed symbol back to the edge.
    fn widen_loop(&mut self, lead: u8) {
        self.size += 1;
        if self.size > 0 {
            self.infix.push_back(lead);
        }
    }
    /// Fuse `rhs` onto the right of this edge across the given endpoint labels,
    /// with `overlap` symbols shared between them. Keeps `self.index`. The full
    /// sequence of the result is the concatenation of both full sequences minus
    /// the overlap.
    fn merge(&mut self, rhs: EdgeProperty, left_label: &DnaSeq, right_label: &DnaSeq, overlap: usize) {
        let new_size = self.size
            + rhs.size
            + left_label.len() as i64
            + right_label.len() as i64
            - overlap as i64;
        self.infix = if new_size > 0 {
            let mut joined: Vec<u8> = Vec::new();
            joined.extend(self.infix.iter());
            joined.extend(left_label.iter());
            joined.extend(right_label.iter().skip(overlap));
            joined.extend(rhs.infix.iter());
            let drop_front = (-self.size).max(0) as usize;
            let drop_back = (-rhs.size).max(0) as usize;
            DnaSeq::from_bytes(&joined[drop_front..joined.len() - drop_back])
        } else {
            DnaSeq::new()
        };
        self.size = new_size;
        self.unique |= rhs.unique;
        debug_assert!(new_size <= 0 || self.infix.len() as i64 == new_size);
    }
}

#[derive(Debug, Clone)]
struct VertexEntry {
    prop: VertexProperty,
    ins: Vec<EdgeIndex>,
    outs: Vec<EdgeIndex>,
}

#[derive(Debug, Clone)]
struct EdgeEntry {
    start: VertexId,
    end: VertexId,
    prop: EdgeProperty,
}

pub struct MultiplexDbg {
    vertices: HashMap<VertexId, VertexEntry>,
    edges: HashMap<EdgeIndex, EdgeEntry>,
    next_vertex_index: VertexId,
    next_edge_index: EdgeIndex,
    start_k: usize,
    niter: u64,
    isolate_properties: HashMap<VertexId, EdgeProperty>,
    paths: ReadPaths,
}

impl MultiplexDbg {
    /// Build the graph from an edge list compacted at `start_k`. Panics on
    /// structurally broken input: sequences too short to span both labels,
    /// conflicting labels for one vertex, a read path mentioning an unknown edge,
    /// or a 1-in/1-out vertex that is not a self-loop.
    pub fn from_records(records: &[EdgeRecord], start_k: usize, paths: ReadPaths) -> Self {
        let mut graph = Self {
            vertices: HashMap::new(),
            edges: HashMap::new(),
            next_vertex_index: 0,
            next_edge_index: 0,
            start_k,
            niter: 0,
            isolate_properties: HashMap::new(),
            paths,
        };
        for record in records {
            let seq = DnaSeq::from(record.sequence.as_str());
            assert!(
                seq.len() > start_k,
                "edge {}->{} shorter than k+1",
                record.start,
                record.end
            );
            let start_label: DnaSeq = seq.iter().take(start_k).collect();
            let end_label: DnaSeq = seq.iter().skip(seq.len() - start_k).collect();
            graph.ensure_vertex(record.start, start_label);
            graph.ensure_vertex(record.end, end_label);
            let size = seq.len() as i64 - 2 * start_k as i64;
            let infix: DnaSeq = if size > 0 {
                seq.iter().skip(start_k).take(size as usize).collect()
            } else {
                DnaSeq::new()
            };
            let index = graph.next_edge_index;
            graph.next_edge_index += 1;
            graph.add_edge(
                record.start,
                record.end,
                EdgeProperty::new(index, infix, size, record.unique),
            );
        }
        for edge in graph.paths.edges_on_reads() {
            assert!(
                graph.edges.contains_key(&edge),
                "read path refers to unknown edge {}",
                edge
            );
        }
        graph.freeze_isolated_loops();
        graph.assert_validity();
        graph
    }

    fn ensure_vertex(&mut self, id: VertexId, label: DnaSeq) {
        self.next_vertex_index = self.next_vertex_index.max(id + 1);
        match self.vertices.get(&id) {
            Some(entry) => assert_eq!(
                entry.prop.label(),
                &label,
                "conflicting labels for vertex {}",
                id
            ),
            None => {
                self.vertices.insert(
                    id,
                    VertexEntry {
                        prop: VertexProperty::new(label, false),
                        ins: vec![],
                        outs: vec![],
                    },
                );
            }
        }
    }

    fn freeze_isolated_loops(&mut self) {
        for id in self.vertex_ids() {
            let entry = &self.vertices[&id];
            if entry.ins.len() == 1 && entry.outs.len() == 1 {
                assert_eq!(
                    entry.ins[0], entry.outs[0],
                    "1-in 1-out vertex {} is not a loop",
                    id
                );
                self.freeze_vertex(id);
            }
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
    pub fn niter(&self) -> u64 {
        self.niter
    }
    pub(crate) fn tick(&mut self) {
        self.niter += 1;
    }
    pub fn start_k(&self) -> usize {
        self.start_k
    }
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }
    pub fn contains_edge(&self, edge: EdgeIndex) -> bool {
        self.edges.contains_key(&edge)
    }
    /// Live vertex ids, ascending. The iteration snapshot of one round.
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<_> = self.vertices.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
    pub fn edge_ids(&self) -> Vec<EdgeIndex> {
        let mut ids: Vec<_> = self.edges.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
    pub fn node_prop(&self, id: VertexId) -> &VertexProperty {
        &self.vertices[&id].prop
    }
    pub(crate) fn label(&self, id: VertexId) -> &DnaSeq {
        self.vertices[&id].prop.label()
    }
    pub(crate) fn label_mut(&mut self, id: VertexId) -> &mut DnaSeq {
        &mut self.vertices.get_mut(&id).unwrap().prop.label
    }
    pub fn edge_prop(&self, edge: EdgeIndex) -> &EdgeProperty {
        &self.edges[&edge].prop
    }
    pub(crate) fn edge_prop_mut(&mut self, edge: EdgeIndex) -> &mut EdgeProperty {
        &mut self.edges.get_mut(&edge).unwrap().prop
    }
    pub fn edge_ends(&self, edge: EdgeIndex) -> (VertexId, VertexId) {
        let entry = &self.edges[&edge];
        (entry.start, entry.end)
    }
    pub fn in_edges(&self, id: VertexId) -> &[EdgeIndex] {
        &self.vertices[&id].ins
    }
    pub fn out_edges(&self, id: VertexId) -> &[EdgeIndex] {
        &self.vertices[&id].outs
    }
    pub fn in_degree(&self, id: VertexId) -> usize {
        self.vertices[&id].ins.len()
    }
    pub fn out_degree(&self, id: VertexId) -> usize {
        self.vertices[&id].outs.len()
    }
    pub fn isolate_properties(&self) -> &HashMap<VertexId, EdgeProperty> {
        &self.isolate_properties
    }
    pub fn paths(&self) -> &ReadPaths {
        &self.paths
    }
    pub fn is_frozen(&self) -> bool {
        self.vertices.values().all(|entry| entry.prop.is_frozen())
    }

    /// The whole nucleotide sequence the edge represents: start label, infix, end
    /// label, with the overlap removed when the labels share symbols.
    pub fn full_sequence(&self, edge: EdgeIndex) -> DnaSeq {
        let entry = &self.edges[&edge];
        let skip = (-entry.prop.size).max(0) as usize;
        self.label(entry.start)
            .iter()
            .chain(entry.prop.infix.iter())
            .chain(self.label(entry.end).iter().skip(skip))
            .collect()
    }

    /// The symbol of the edge directly after its start label.
    pub(crate) fn symbol_past_start(&self, edge: EdgeIndex) -> u8 {
        let entry = &self.edges[&edge];
        if entry.prop.size > 0 {
            entry.prop.infix[0]
        } else {
            self.label(entry.end)[(-entry.prop.size) as usize]
        }
    }
    /// The symbol of the edge directly before its end label.
    pub(crate) fn symbol_before_end(&self, edge: EdgeIndex) -> u8 {
        let entry = &self.edges[&edge];
        if entry.prop.size > 0 {
            entry.prop.infix[entry.prop.infix.len() - 1]
        } else {
            let label = self.label(entry.start);
            label[(label.len() as i64 + entry.prop.size - 1) as usize]
        }
    }

    pub(crate) fn get_new_vertex(&mut self, label: DnaSeq) -> VertexId {
        let id = self.next_vertex_index;
        self.next_vertex_index += 1;
        self.vertices.insert(
            id,
            VertexEntry {
                prop: VertexProperty::new(label, false),
                ins: vec![],
                outs: vec![],
            },
        );
        id
    }

    pub(crate) fn freeze_vertex(&mut self, id: VertexId) {
        self.vertices.get_mut(&id).unwrap().prop.frozen = true;
    }

    fn add_edge(&mut self, start: VertexId, end: VertexId, prop: EdgeProperty) {
        let index = prop.index;
        let stale = self.edges.insert(index, EdgeEntry { start, end, prop });
        assert!(stale.is_none(), "edge index {} reused", index);
        self.vertices.get_mut(&start).unwrap().outs.push(index);
        self.vertices.get_mut(&end).unwrap().ins.push(index);
    }

    fn detach_edge(&mut self, edge: EdgeIndex) -> EdgeEntry {
        let entry = self.edges.remove(&edge).expect("detaching unknown edge");
        let outs = &mut self.vertices.get_mut(&entry.start).unwrap().outs;
        let at = outs.iter().position(|&e| e == edge).unwrap();
        outs.remove(at);
        let ins = &mut self.vertices.get_mut(&entry.end).unwrap().ins;
        let at = ins.iter().position(|&e| e == edge).unwrap();
        ins.remove(at);
        entry
    }

    pub(crate) fn repoint_start(&mut self, edge: EdgeIndex, new_start: VertexId) {
        let old_start = {
            let entry = self.edges.get_mut(&edge).unwrap();
            std::mem::replace(&mut entry.start, new_start)
        };
        let outs = &mut self.vertices.get_mut(&old_start).unwrap().outs;
        let at = outs.iter().position(|&e| e == edge).unwrap();
        outs.remove(at);
        self.vertices.get_mut(&new_start).unwrap().outs.push(edge);
    }

    pub(crate) fn repoint_end(&mut self, edge: EdgeIndex, new_end: VertexId) {
        let old_end = {
            let entry = self.edges.get_mut(&edge).unwrap();
            std::mem::replace(&mut entry.end, new_end)
        };
        let ins = &mut self.vertices.get_mut(&old_end).unwrap().ins;
        let at = ins.iter().position(|&e| e == edge).unwrap();
        ins.remove(at);
        self.vertices.get_mut(&new_end).unwrap().ins.push(edge);
    }

    pub(crate) fn is_isolated(&self, id: VertexId) -> bool {
        let entry = &self.vertices[&id];
        entry.ins.is_empty() && entry.outs.is_empty()
    }

    pub(crate) fn remove_isolated_vertex(&mut self, id: VertexId) {
        assert!(self.is_isolated(id), "removing vertex {} with live edges", id);
        self.vertices.remove(&id);
    }

    /// Fuse `absorbed` onto the right end of `kept`, across `overlap` shared
    /// symbols. The path index is updated first; the two now-dangling interior
    /// vertices are deleted.
    pub(crate) fn merge_edges(&mut self, kept: EdgeIndex, absorbed: EdgeIndex, overlap: usize) {
        assert_ne!(kept, absorbed);
        let left_mid = self.edges[&kept].end;
        let right_mid = self.edges[&absorbed].start;
        assert!(
            !self.node_prop(right_mid).is_frozen(),
            "cannot merge edges through a frozen vertex"
        );
        self.paths.merge(kept, absorbed);
        let left_label = self.label(left_mid).clone();
        let right_label = self.label(right_mid).clone();
        let rhs = self.detach_edge(absorbed);
        let new_end = rhs.end;
        self.edges
            .get_mut(&kept)
            .unwrap()
            .prop
            .merge(rhs.prop, &left_label, &right_label, overlap);
        self.repoint_end(kept, new_end);
        if right_mid != left_mid && self.is_isolated(right_mid) {
            self.remove_isolated_vertex(right_mid);
        }
        if self.is_isolated(left_mid) {
            self.remove_isolated_vertex(left_mid);
        }
    }

    /// Bridge the gap from the end of `from_edge` to the start of `to_edge` with a
    /// fresh edge spanning the old vertex label, and splice it into every read
    /// that crosses the transition.
    pub(crate) fn add_connecting_edge(
        &mut self,
        from_edge: EdgeIndex,
        to_edge: EdgeIndex,
        old_vertex_len: usize,
    ) -> EdgeIndex {
        let start = self.edges[&from_edge].end;
        let end = self.edges[&to_edge].start;
        assert_ne!(start, end, "connecting edge between already joined segments");
        let index = self.next_edge_index;
        self.next_edge_index += 1;
        let prop = EdgeProperty::bridge(index, old_vertex_len);
        self.paths.add(from_edge, to_edge, index);
        self.add_edge(start, end, prop);
        index
    }

    /// Check every structural invariant the rewrites rely on. Called after each
    /// round in debug mode; a failure is a bug, not an input error.
    pub fn assert_validity(&self) {
        for (&id, entry) in self.vertices.iter() {
            assert!(id < self.next_vertex_index);
            for &edge in entry.outs.iter() {
                assert_eq!(self.edges[&edge].start, id);
            }
            for &edge in entry.ins.iter() {
                assert_eq!(self.edges[&edge].end, id);
            }
            if entry.ins.len() == 1 && entry.outs.len() == 1 {
                assert_eq!(
                    entry.ins[0], entry.outs[0],
                    "1-in 1-out vertex {} is not a loop",
                    id
                );
                assert!(entry.prop.is_frozen(), "isolated loop {} is not frozen", id);
            }
        }
        for (&index, entry) in self.edges.iter() {
            assert!(index < self.next_edge_index);
            assert_eq!(entry.prop.index, index);
            let start = &self.vertices[&entry.start];
            let end = &self.vertices[&entry.end];
            assert_eq!(start.outs.iter().filter(|&&e| e == index).count(), 1);
            assert_eq!(end.ins.iter().filter(|&&e| e == index).count(), 1);
            if entry.prop.size > 0 {
                assert_eq!(entry.prop.infix.len() as i64, entry.prop.size);
            } else {
                assert!(entry.prop.infix.is_empty());
                let overlap = (-entry.prop.size) as usize;
                assert!(overlap <= start.prop.len().min(end.prop.len()));
                // the shared stretch must read the same from both labels
                let suffix = start.prop.label().iter().skip(start.prop.len() - overlap);
                let prefix = end.prop.label().iter().take(overlap);
                assert!(suffix.eq(prefix), "endpoint labels of edge {} disagree", index);
            }
        }
        for edge in self.paths.edges_on_reads() {
            assert!(
                self.edges.contains_key(&edge),
                "read path refers to dead edge {}",
                edge
            );
        }
    }

    /// Export the graph for downstream consumers.
    pub fn to_resolution(&self) -> Resolution {
        let edges = self
            .edge_ids()
            .into_iter()
            .map(|edge| {
                let (start, end) = self.edge_ends(edge);
                EdgeRecord {
                    start,
                    end,
                    sequence: self.full_sequence(edge).to_string(),
                    unique: self.edge_prop(edge).is_unique(),
                }
            })
            .collect();
        let mut isolates: Vec<IsolateRecord> = self
            .isolate_properties
            .iter()
            .map(|(&vertex, prop)| IsolateRecord {
                vertex,
                sequence: self.label(vertex).to_string(),
                edge_index: prop.index(),
                unique: prop.is_unique(),
            })
            .collect();
        isolates.sort_unstable_by_key(|isolate| isolate.vertex);
        Resolution {
            k: self.start_k + self.niter as usize,
            edges,
            isolates,
        }
    }
}

impl std::fmt::Display for MultiplexDbg {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let frozen = self
            .vertices
            .values()
            .filter(|entry| entry.prop.is_frozen())
            .count();
        writeln!(
            f,
            "Node:{}, Edge:{}, Frozen:{}, Isolate:{}",
            self.vertices.len(),
            self.edges.len(),
            frozen,
            self.isolate_properties.len()
        )?;
        let degrees = {
            let mut degs: HashMap<usize, usize> = HashMap::new();
            for entry in self.vertices.values() {
                *degs.entry(entry.ins.len() + entry.outs.len()).or_default() += 1;
            }
            let mut degs: Vec<_> = degs.into_iter().collect();
            degs.sort_unstable();
            degs.into_iter()
                .map(|(deg, count)| format!("{}:{}", deg, count))
                .collect::<Vec<_>>()
        };
        write!(f, "[{}]", degrees.join(","))
    }
}
