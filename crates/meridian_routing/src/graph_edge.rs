use crate::{
    distance::{Distance, Meters},
    properties::property_map::EdgePropertyMap,
    types::{EdgeId, NodeId},
};

pub trait GraphEdge {
    /// Id of the edge in the base graph. Virtual edges report the edge they were split from.
    fn id(&self) -> EdgeId;
    fn start_node(&self) -> NodeId;
    fn end_node(&self) -> NodeId;

    fn adj_node(&self, node: NodeId) -> NodeId {
        if self.start_node() == node {
            self.end_node()
        } else {
            self.start_node()
        }
    }

    fn distance(&self) -> Distance<Meters>;
    fn properties(&self) -> &EdgePropertyMap;
}
