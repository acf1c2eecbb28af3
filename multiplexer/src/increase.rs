//! The outer loop: one [MultiplexDbg::inc] per k-step, repeated until every
//! vertex is frozen or the k budget runs out.
use crate::graph::MultiplexDbg;
use crate::paths::ReadPaths;
use definitions::{DataSet, Resolution};

impl MultiplexDbg {
    /// One round: rewrite every vertex of the current snapshot, then collapse
    /// edges that became degenerate. Vertices deleted by an earlier rewrite of
    /// the same round are skipped; vertices created during the round wait for the
    /// next one.
    pub fn inc(&mut self, debug: bool) {
        if self.is_frozen() {
            return;
        }
        for vertex in self.vertex_ids() {
            self.process_vertex(vertex);
        }
        self.collapse_short_edges_into_vertices();
        self.tick();
        debug!(
            "ROUND\t{}\tnodes:{}\tedges:{}",
            self.niter(),
            self.vertex_count(),
            self.edge_count()
        );
        if debug {
            self.assert_validity();
            self.paths().assert_validity();
        }
    }
}

/// Drives [MultiplexDbg::inc] from `k_from` up to at most `k_to`.
pub struct KIncreaser {
    k_from: usize,
    k_to: usize,
    debug: bool,
}

impl KIncreaser {
    pub fn new(k_from: usize, k_to: usize, debug: bool) -> Self {
        assert!(k_from <= k_to);
        Self {
            k_from,
            k_to,
            debug,
        }
    }
    pub fn increase_until_saturation(&self, graph: &mut MultiplexDbg) {
        let budget = (self.k_to - self.k_from) as u64;
        while !graph.is_frozen() && graph.niter() < budget {
            graph.inc(self.debug);
        }
        info!(
            "SATURATION\tk:{}\trounds:{}\tfrozen:{}",
            self.k_from + graph.niter() as usize,
            graph.niter(),
            graph.is_frozen()
        );
    }
}

#[derive(Debug, Clone)]
pub struct ResolveConfig {
    pub k_final: usize,
    /// Re-check every invariant after each round. Cheap on anything that fits in
    /// memory for testing; turn off for large graphs.
    pub validate: bool,
}

impl ResolveConfig {
    pub fn new(k_final: usize, validate: bool) -> Self {
        Self { k_final, validate }
    }
}

pub trait ResolveRepeats {
    fn resolve_repeats(&self, config: &ResolveConfig) -> Resolution;
}

impl ResolveRepeats for DataSet {
    fn resolve_repeats(&self, config: &ResolveConfig) -> Resolution {
        debug!("START\tRepeatResolve\t{}\t{}", self.start_k, config.k_final);
        assert!(self.sanity_check(), "broken input dataset");
        let paths = ReadPaths::from_reads(&self.reads);
        let mut graph = MultiplexDbg::from_records(&self.edges, self.start_k, paths);
        let increaser = KIncreaser::new(self.start_k, config.k_final, config.validate);
        increaser.increase_until_saturation(&mut graph);
        graph.to_resolution()
    }
}
