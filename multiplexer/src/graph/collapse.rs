//! The short-edge sweep that closes every round. An edge whose full sequence has
//! shrunk to exactly one endpoint label carries no information of its own any
//! more; it is removed and its endpoints fused.
use super::MultiplexDbg;
use crate::EdgeIndex;

impl MultiplexDbg {
    pub(crate) fn collapse_short_edges_into_vertices(&mut self) {
        for vertex in self.vertex_ids() {
            if !self.contains_vertex(vertex) {
                continue;
            }
            let degenerate: Vec<EdgeIndex> = self
                .out_edges(vertex)
                .iter()
                .copied()
                .filter(|&edge| {
                    let (start, end) = self.edge_ends(edge);
                    let size = self.edge_prop(edge).size();
                    size + self.node_prop(start).len() as i64 == 0
                        || size + self.node_prop(end).len() as i64 == 0
                })
                .collect();
            for edge in degenerate {
                // cursors do not survive a collapse; look everything up afresh
                if !self.contains_edge(edge) {
                    continue;
                }
                let (start, end) = self.edge_ends(edge);
                assert_eq!(self.node_prop(start).len(), self.node_prop(end).len());
                assert!(!self.node_prop(start).is_frozen());
                assert!(!self.node_prop(end).is_frozen());
                self.collapse_edge(edge);
            }
        }
    }

    /// Remove a degenerate `edge` and re-point the dead end-vertex's outgoing
    /// edges at the surviving start. When nothing else touches either endpoint the
    /// edge was a whole fragment; its property moves to `isolate_properties` and
    /// the start vertex, now carrying the full sequence in its label, is frozen.
    fn collapse_edge(&mut self, edge: EdgeIndex) {
        let (start, end) = self.edge_ends(edge);
        assert_ne!(start, end);
        assert_eq!(self.out_degree(start), 1);
        assert_eq!(self.in_degree(end), 1);
        trace!("COLLAPSE\t{}\t{}\t{}", edge, start, end);
        self.paths.remove(edge);
        let isolate = self.in_degree(start) == 0 && self.out_degree(end) == 0;
        let entry = self.detach_edge(edge);
        if isolate {
            self.isolate_properties.insert(start, entry.prop);
            self.freeze_vertex(start);
        }
        for moved in self.out_edges(end).to_vec() {
            self.repoint_start(moved, start);
        }
        self.remove_isolated_vertex(end);
    }
}
