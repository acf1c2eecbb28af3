//! Per-vertex rewrite rules. One pass over the vertex snapshot grows every live
//! label by one symbol; how the incident edges are rearranged depends on the
//! vertex degree class, and branching vertices with traffic on both sides are
//! split and reconnected along the transitions the reads actually support.
use super::MultiplexDbg;
use crate::{EdgeIndex, VertexId};
use std::collections::{HashMap, HashSet};

fn chased(merged_into: &HashMap<EdgeIndex, EdgeIndex>, mut edge: EdgeIndex) -> EdgeIndex {
    while let Some(&into) = merged_into.get(&edge) {
        edge = into;
    }
    edge
}

impl MultiplexDbg {
    pub(crate) fn process_vertex(&mut self, vertex: VertexId) {
        if !self.contains_vertex(vertex) {
            // removed as a side effect of an earlier rewrite in this round
            return;
        }
        if self.node_prop(vertex).is_frozen() {
            return;
        }
        let indeg = self.in_degree(vertex);
        let outdeg = self.out_degree(vertex);
        if indeg >= 2 && outdeg >= 2 {
            trace!("COMPLEX\t{}\t{}\t{}", vertex, indeg, outdeg);
            let (pairs, fan_out, fan_in) = self.supported_transitions(vertex);
            self.rewrite_complex_vertex(vertex, &pairs, &fan_out, &fan_in);
        } else {
            self.process_simple_vertex(vertex, indeg, outdeg);
        }
    }

    fn process_simple_vertex(&mut self, vertex: VertexId, indeg: usize, outdeg: usize) {
        assert!(
            indeg != 1 || outdeg != 1,
            "vertex {} sits on a non-branching path",
            vertex
        );
        match (indeg, outdeg) {
            (0, 0) => {} // bare isolate, nothing to grow into
            (0, 1) => {
                // tip: the label grows into the one outgoing edge
                let edge = self.out_edges(vertex)[0];
                let symbol = self.symbol_past_start(edge);
                self.edge_prop_mut(edge).trim_front();
                self.label_mut(vertex).push_back(symbol);
            }
            (1, 0) => {
                let edge = self.in_edges(vertex)[0];
                let symbol = self.symbol_before_end(edge);
                self.edge_prop_mut(edge).trim_back();
                self.label_mut(vertex).push_front(symbol);
            }
            (0, _) => {
                // source: every branch gets its own start vertex, one symbol longer
                for edge in self.out_edges(vertex).to_vec() {
                    let symbol = self.symbol_past_start(edge);
                    let mut label = self.label(vertex).clone();
                    label.push_back(symbol);
                    let private = self.get_new_vertex(label);
                    self.edge_prop_mut(edge).trim_front();
                    self.repoint_start(edge, private);
                }
                self.remove_isolated_vertex(vertex);
            }
            (_, 0) => {
                for edge in self.in_edges(vertex).to_vec() {
                    let symbol = self.symbol_before_end(edge);
                    let mut label = self.label(vertex).clone();
                    label.push_front(symbol);
                    let private = self.get_new_vertex(label);
                    self.edge_prop_mut(edge).trim_back();
                    self.repoint_end(edge, private);
                }
                self.remove_isolated_vertex(vertex);
            }
            (1, _) => {
                // the one in-edge hands its trailing symbol to every branch at once
                let edge = self.in_edges(vertex)[0];
                let symbol = self.symbol_before_end(edge);
                self.edge_prop_mut(edge).trim_back();
                self.label_mut(vertex).push_front(symbol);
            }
            (_, 1) => {
                let edge = self.out_edges(vertex)[0];
                let symbol = self.symbol_past_start(edge);
                self.edge_prop_mut(edge).trim_front();
                self.label_mut(vertex).push_back(symbol);
            }
            _ => unreachable!(),
        }
    }

    /// The transitions through `vertex` that some read takes, plus the supported
    /// fan-out of every in-edge and fan-in of every out-edge. The pair list is
    /// sorted so a full run is reproducible; the rewrite itself does not depend
    /// on the order.
    pub(crate) fn supported_transitions(
        &self,
        vertex: VertexId,
    ) -> (
        Vec<(EdgeIndex, EdgeIndex)>,
        HashMap<EdgeIndex, usize>,
        HashMap<EdgeIndex, usize>,
    ) {
        let mut successors: HashMap<EdgeIndex, HashSet<EdgeIndex>> = HashMap::new();
        let mut predecessors: HashMap<EdgeIndex, HashSet<EdgeIndex>> = HashMap::new();
        for &into in self.in_edges(vertex) {
            for &out in self.out_edges(vertex) {
                if self.paths().contains_pair(into, out) {
                    successors.entry(into).or_default().insert(out);
                    predecessors.entry(out).or_default().insert(into);
                }
            }
        }
        let mut pairs: Vec<(EdgeIndex, EdgeIndex)> = successors
            .iter()
            .flat_map(|(&into, outs)| outs.iter().map(move |&out| (into, out)))
            .collect();
        pairs.sort_unstable();
        let fan_out = successors
            .into_iter()
            .map(|(edge, set)| (edge, set.len()))
            .collect();
        let fan_in = predecessors
            .into_iter()
            .map(|(edge, set)| (edge, set.len()))
            .collect();
        (pairs, fan_out, fan_in)
    }

    /// Split `vertex` into one private endpoint per incident edge, then reconnect
    /// the supported transitions. Earlier reconnections may have fused either side
    /// of a pair into another edge, so every edge id is chased through
    /// `merged_into` to its current owner first; the rewrite is correct under any
    /// order of `pairs`.
    pub(crate) fn rewrite_complex_vertex(
        &mut self,
        vertex: VertexId,
        pairs: &[(EdgeIndex, EdgeIndex)],
        fan_out: &HashMap<EdgeIndex, usize>,
        fan_in: &HashMap<EdgeIndex, usize>,
    ) {
        let old_len = self.node_prop(vertex).len();
        for edge in self.in_edges(vertex).to_vec() {
            let symbol = self.symbol_before_end(edge);
            let mut label = self.label(vertex).clone();
            label.push_front(symbol);
            let private = self.get_new_vertex(label);
            self.edge_prop_mut(edge).trim_back();
            self.repoint_end(edge, private);
        }
        for edge in self.out_edges(vertex).to_vec() {
            let symbol = self.symbol_past_start(edge);
            let mut label = self.label(vertex).clone();
            label.push_back(symbol);
            let private = self.get_new_vertex(label);
            self.edge_prop_mut(edge).trim_front();
            self.repoint_start(edge, private);
        }
        let mut merged_into: HashMap<EdgeIndex, EdgeIndex> = HashMap::new();
        for &(from, to) in pairs {
            let kept_from = chased(&merged_into, from);
            let kept_to = chased(&merged_into, to);
            let out_count = fan_out[&from];
            let in_count = fan_in[&to];
            if out_count == 1 && in_count == 1 {
                if kept_from != kept_to {
                    self.merge_edges(kept_from, kept_to, old_len);
                    merged_into.insert(kept_to, kept_from);
                } else {
                    self.freeze_segment_as_loop(kept_from);
                }
            } else {
                let bridge = self.add_connecting_edge(kept_from, kept_to, old_len);
                if out_count == 1 {
                    // the in-side still has a unique route; pull it through the bridge
                    let shared = self.edge_ends(kept_from).1;
                    let overlap = self.node_prop(shared).len();
                    self.merge_edges(kept_from, bridge, overlap);
                    merged_into.insert(bridge, kept_from);
                } else if in_count == 1 {
                    let shared = self.edge_ends(kept_to).0;
                    let overlap = self.node_prop(shared).len();
                    self.merge_edges(bridge, kept_to, overlap);
                    merged_into.insert(kept_to, bridge);
                }
            }
        }
        assert!(
            self.is_isolated(vertex),
            "split vertex {} still has incident edges",
            vertex
        );
        self.remove_isolated_vertex(vertex);
    }

    /// Both sides of a pair chased to the same edge: the segment closes on itself.
    /// Rewire it as a self-loop on its start vertex and freeze it; the loop keeps
    /// its period by taking back the symbol the deleted end vertex had absorbed.
    fn freeze_segment_as_loop(&mut self, edge: EdgeIndex) {
        let (start, end) = self.edge_ends(edge);
        assert_ne!(start, end);
        let lead = self.label(end).first().unwrap();
        self.repoint_end(edge, start);
        self.remove_isolated_vertex(end);
        self.edge_prop_mut(edge).widen_loop(lead);
        self.freeze_vertex(start);
    }
}
