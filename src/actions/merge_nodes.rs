use crate::errors::{EditError, EditResult};
use crate::graph::Graph;
use crate::tags::{has_interesting_tags, merge_tags};
use crate::types::{EntityId, Location, NodeId, WayId};

/// Collapses `ids` into a single node at `loc`.
///
/// The survivor is the first node that already exists upstream (positive
/// id), else the last one. Tags are merged, references in ways and relations
/// are redirected to the survivor, and ways left with too few nodes are
/// deleted.
pub fn merge_nodes(graph: &Graph, ids: &[NodeId], loc: Location) -> EditResult<Graph> {
    for &id in ids {
        graph.try_node(id)?;
    }
    let survivor_id = ids
        .iter()
        .copied()
        .find(|id| id.0 > 0)
        .or_else(|| ids.last().copied())
        .ok_or(EditError::EmptyMerge)?;

    let mut graph = graph.clone();
    let mut survivor = graph.try_node(survivor_id)?.clone();
    survivor.loc = loc;

    for &id in ids {
        if id == survivor_id {
            continue;
        }
        let Some(other) = graph.node(id).cloned() else { continue };
        merge_tags(&mut survivor.tags, &other.tags);

        let parents: Vec<_> = graph.parent_ways(id).into_iter().cloned().collect();
        for mut way in parents {
            way.replace_node(id, survivor_id);
            graph.replace_way(way);
        }

        let relations: Vec<_> = graph.parent_relations(id.into()).into_iter().cloned().collect();
        for mut relation in relations {
            for m in relation.members.iter_mut().filter(|m| m.id == EntityId::Node(id)) {
                m.id = survivor_id.into();
            }
            graph.replace_relation(relation);
        }
        graph.remove_node(id);
    }
    graph.replace_node(survivor);

    let degenerate: Vec<WayId> = graph
        .parent_ways(survivor_id)
        .into_iter()
        .filter(|w| w.is_degenerate())
        .map(|w| w.id)
        .collect();
    for way_id in degenerate {
        graph = delete_way(&graph, way_id)?;
    }
    Ok(graph)
}

/// Removes a way, its relation memberships, and any of its nodes that are
/// left unused and uninteresting.
pub fn delete_way(graph: &Graph, way_id: WayId) -> EditResult<Graph> {
    let way = graph.try_way(way_id)?.clone();
    let mut graph = graph.clone();

    let relations: Vec<_> = graph.parent_relations(way_id.into()).into_iter().cloned().collect();
    for mut relation in relations {
        relation.members.retain(|m| m.id != EntityId::Way(way_id));
        if relation.members.is_empty() {
            graph.remove_relation(relation.id);
        } else {
            graph.replace_relation(relation);
        }
    }
    graph.remove_way(way_id);

    for node_id in way.nodes {
        let Some(node) = graph.node(node_id) else { continue };
        let unused = graph.parent_ways(node_id).is_empty() && graph.parent_relations(node_id.into()).is_empty();
        if unused && !has_interesting_tags(&node.tags) {
            graph.remove_node(node_id);
        }
    }
    log::debug!("Deleted way {}", way_id);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;
    use crate::types::{tags, Node};

    #[test]
    fn merges_into_existing_node() {
        let mut graph = Graph::from_entities(
            vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 0.0, 1.0)],
            vec![way(1, &[1, 2], tags([])), way(2, &[3, 1], tags([]))],
            vec![],
        );
        let new_id = graph.new_node_id();
        graph.replace_node(Node::new(new_id, Location::new(0.0, 0.0)).with_tags(tags([("highway", "crossing")])));
        let mut w2 = graph.way(WayId(2)).unwrap().clone();
        w2.nodes = vec![NodeId(3), new_id];
        graph.replace_way(w2);

        let merged = merge_nodes(&graph, &[new_id, NodeId(1)], Location::new(0.0, 0.0)).unwrap();
        assert!(merged.node(new_id).is_none());
        assert_eq!(merged.node(NodeId(1)).unwrap().tags, tags([("highway", "crossing")]));
        assert_eq!(merged.way(WayId(2)).unwrap().nodes, vec![NodeId(3), NodeId(1)]);
        assert_eq!(merged.parent_ways(NodeId(1)).len(), 2);
    }

    #[test]
    fn new_nodes_keep_the_last() {
        let graph = Graph::from_entities(
            vec![node(-1, 0.0, 0.0), node(-2, 0.00001, 0.0)],
            vec![],
            vec![],
        );
        let merged = merge_nodes(&graph, &[NodeId(-1), NodeId(-2)], Location::new(0.0, 0.0)).unwrap();
        assert!(merged.node(NodeId(-1)).is_none());
        assert_eq!(merged.node(NodeId(-2)).unwrap().loc, Location::new(0.0, 0.0));
    }

    #[test]
    fn degenerate_ways_are_deleted() {
        let graph = Graph::from_entities(
            vec![node(1, 0.0, 0.0), node(2, 0.00001, 0.0), node(3, 1.0, 0.0)],
            vec![way(1, &[1, 2], tags([])), way(2, &[2, 3], tags([]))],
            vec![],
        );
        let merged = merge_nodes(&graph, &[NodeId(1), NodeId(2)], Location::new(0.0, 0.0)).unwrap();
        assert!(merged.way(WayId(1)).is_none());
        assert_eq!(merged.way(WayId(2)).unwrap().nodes, vec![NodeId(1), NodeId(3)]);
    }
}
