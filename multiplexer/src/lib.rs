//! The multiplex de Bruijn graph engine.
//! Starting from a compacted de Bruijn graph and the reads threaded through it,
//! the engine grows the effective k-mer size one symbol per round, using the
//! read paths to decide which traversals through branching vertices are real.
pub mod graph;
pub mod increase;
pub mod paths;
#[macro_use]
extern crate log;
pub use graph::{EdgeProperty, MultiplexDbg, VertexProperty};
pub use increase::{KIncreaser, ResolveConfig, ResolveRepeats};
pub use paths::ReadPaths;

/// Stable identifier of a vertex. Never reused.
pub type VertexId = u64;
/// Stable index of an edge. Survives merges on the left-hand side; never reused.
pub type EdgeIndex = u64;
