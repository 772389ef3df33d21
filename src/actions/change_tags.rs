use crate::errors::EditResult;
use crate::graph::Graph;
use crate::types::{EntityId, Tags};

pub fn change_tags(graph: &Graph, id: EntityId, tags: Tags) -> EditResult<Graph> {
    let mut graph = graph.clone();
    graph.set_tags(id, tags)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::one_crossing;
    use crate::types::{tags, NodeId, WayId};

    #[test]
    fn replaces_all_tags() {
        let graph = one_crossing(tags([("highway", "residential"), ("name", "Main")]), tags([]));
        let result = change_tags(&graph, WayId(-1).into(), tags([("highway", "service")])).unwrap();
        assert_eq!(result.way(WayId(-1)).unwrap().tags, tags([("highway", "service")]));
        // input version untouched
        assert_eq!(graph.way(WayId(-1)).unwrap().tags.len(), 2);
        assert!(change_tags(&graph, NodeId(42).into(), tags([])).is_err());
    }
}
