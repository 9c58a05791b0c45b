use crate::types::EdgeId;

/// Chains the base edges of a node with the virtual edges attached to it
pub struct QueryGraphEdgeIterator<'a> {
    base_edges: std::slice::Iter<'a, EdgeId>,
    virtual_edges: std::slice::Iter<'a, EdgeId>,
}

impl<'a> QueryGraphEdgeIterator<'a> {
    pub fn new(base_edges: &'a [EdgeId], virtual_edges: &'a [EdgeId]) -> Self {
        QueryGraphEdgeIterator {
            base_edges: base_edges.iter(),
            virtual_edges: virtual_edges.iter(),
        }
    }
}

impl Iterator for QueryGraphEdgeIterator<'_> {
    type Item = EdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        self.base_edges
            .next()
            .or_else(|| self.virtual_edges.next())
            .copied()
    }
}
