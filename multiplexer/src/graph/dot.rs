//! Graphviz rendering, for eyeballing small graphs while debugging.
use super::MultiplexDbg;
use std::fmt::Write;

impl MultiplexDbg {
    /// Vertices come out as `id:label` (frozen ones marked with `*`), edges as
    /// `index:size`.
    pub fn write_dot<W: Write>(&self, wtr: &mut W) -> std::fmt::Result {
        writeln!(wtr, "digraph multiplex {{")?;
        for vertex in self.vertex_ids() {
            let prop = self.node_prop(vertex);
            let mark = if prop.is_frozen() { "*" } else { "" };
            writeln!(
                wtr,
                "  v{} [label=\"{}{}:{}\"];",
                vertex,
                vertex,
                mark,
                prop.label()
            )?;
        }
        for edge in self.edge_ids() {
            let (start, end) = self.edge_ends(edge);
            let prop = self.edge_prop(edge);
            writeln!(
                wtr,
                "  v{} -> v{} [label=\"{}:{}\"];",
                start,
                end,
                prop.index(),
                prop.size()
            )?;
        }
        writeln!(wtr, "}}")
    }
}
