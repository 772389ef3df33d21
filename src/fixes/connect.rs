use crate::actions::{add_midpoint, merge_nodes, sync_crossing_tags};
use crate::config::ValidationConfig;
use crate::errors::{EditError, EditResult};
use crate::geom::closest_point;
use crate::graph::Graph;
use crate::tags::{has_interesting_tags, is_crossing_node};
use crate::types::{Edge, EntityId, Location, Node, Tags};

/// Joins the two crossing edges at `loc` with a single junction node.
///
/// An edge endpoint within the merge threshold is reused when it is untagged
/// or already a crossing; otherwise the new node is inserted into the edge.
/// Both edges must still be adjacent nodes of some way.
pub fn connect_ways(
    graph: &Graph,
    loc: Location,
    edges: &[Edge; 2],
    crossing_way_id: Option<EntityId>,
    tags: &Tags,
    config: &ValidationConfig,
) -> EditResult<Graph> {
    for edge in edges {
        graph.try_node(edge[0])?;
        graph.try_node(edge[1])?;
        if !graph.parent_ways(edge[0]).iter().any(|w| w.edge_position(edge).is_some()) {
            return Err(EditError::EdgeNotFound(edge[0], edge[1]));
        }
    }

    let mut graph = graph.clone();
    let new_id = graph.new_node_id();
    let junction = Node::new(new_id, loc).with_tags(tags.clone());
    graph.replace_node(junction.clone());

    let mut merge_ids = vec![new_id];
    for edge in edges {
        let ends = [graph.try_node(edge[0])?, graph.try_node(edge[1])?];
        let reusable = closest_point(&[ends[0].loc, ends[1].loc], &loc)
            .filter(|&(_, distance)| distance <= config.merge_threshold_m)
            .map(|(i, _)| ends[i])
            .filter(|n| !has_interesting_tags(&n.tags) || is_crossing_node(&n.tags))
            .map(|n| n.id);

        match reusable {
            Some(id) => {
                if !merge_ids.contains(&id) {
                    merge_ids.push(id);
                }
            }
            None => graph = add_midpoint(&graph, loc, *edge, junction.clone())?,
        }
    }

    if merge_ids.len() > 1 {
        graph = merge_nodes(&graph, &merge_ids, loc)?;
    }
    if let Some(way_id) = crossing_way_id.filter(|&id| graph.has_entity(id)) {
        graph = sync_crossing_tags(&graph, way_id)?;
    }
    Ok(graph)
}
