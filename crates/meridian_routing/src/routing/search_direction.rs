use crate::edge_direction::EdgeDirection;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    /// Direction an edge is traversed in when the search reaches `adj` over it from a node
    /// whose outgoing direction is `outgoing`
    pub fn traversal(&self, outgoing: EdgeDirection) -> EdgeDirection {
        match self {
            SearchDirection::Forward => outgoing,
            SearchDirection::Backward => outgoing.opposite(),
        }
    }
}
