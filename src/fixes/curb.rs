use super::KerbType;
use crate::actions::{add_midpoint, change_tags, split};
use crate::config::ValidationConfig;
use crate::errors::{EditError, EditResult};
use crate::geom::position_along;
use crate::graph::Graph;
use crate::tags::{is_kerb_node, is_kerbed_crossing_way, tag_is};
use crate::types::{tags, Node, NodeId, Tags, WayId};

enum EndFix {
    /// The endpoint itself becomes the kerb.
    Retag,
    /// A kerb is inserted next to the endpoint and the crossing split there.
    Insert,
}

fn kerb_tags(kerb: KerbType) -> Tags {
    tags([("barrier", "kerb"), ("kerb", kerb.as_str())])
}

/// Puts kerbs at both ends of a crossing way.
///
/// An end that touches nothing else, or a traffic island, is tagged as the
/// kerb. Otherwise a kerb node goes in `curb_offset_m` along the crossing and
/// the piece between kerb and end takes the tags of the connected sidewalk.
pub fn add_curb_nodes(graph: &Graph, way_id: WayId, kerb: KerbType, config: &ValidationConfig) -> EditResult<Graph> {
    let way = graph.try_way(way_id)?;
    let (Some(first), Some(last)) = (way.first(), way.last()) else {
        return Err(EditError::DegenerateWay(way_id));
    };
    let mut ends = vec![first];
    if last != first {
        ends.push(last);
    }

    // decided on the untouched graph so the first split can't affect the second end
    let plan: Vec<(NodeId, EndFix)> = ends
        .into_iter()
        .map(|end| {
            let others: Vec<_> = graph.parent_ways(end).into_iter().filter(|w| w.id != way_id).collect();
            let on_island = others.iter().any(|w| tag_is(&w.tags, "footway", "traffic_island"));
            let fix = if others.is_empty() || on_island { EndFix::Retag } else { EndFix::Insert };
            (end, fix)
        })
        .collect();

    let mut graph = graph.clone();
    let mut fix_ways = vec![way_id];
    for (end, fix) in plan {
        graph = match fix {
            EndFix::Retag => {
                let mut node_tags = graph.try_node(end)?.tags.clone();
                node_tags.extend(kerb_tags(kerb));
                change_tags(&graph, end.into(), node_tags)?
            }
            EndFix::Insert => insert_kerb(graph, end, kerb, &mut fix_ways, config)?,
        };
    }
    Ok(graph)
}

fn insert_kerb(
    graph: Graph,
    end: NodeId,
    kerb: KerbType,
    fix_ways: &mut Vec<WayId>,
    config: &ValidationConfig,
) -> EditResult<Graph> {
    let end_node = graph.try_node(end)?;
    if is_kerb_node(&end_node.tags) {
        return Ok(graph);
    }

    let body = fix_ways
        .iter()
        .filter_map(|&id| graph.way(id))
        .find(|w| w.contains(end))
        .ok_or(EditError::MissingEntity(end.into()))?;
    let idx = body.nodes.iter().position(|&n| n == end).ok_or(EditError::MissingEntity(end.into()))?;
    let Some(adjacent) = body.nodes.get(idx + 1).or_else(|| idx.checked_sub(1).and_then(|i| body.nodes.get(i)))
    else {
        return Err(EditError::DegenerateWay(body.id));
    };
    let adjacent = graph.try_node(*adjacent)?;

    let Some(loc) = position_along(&end_node.loc, &adjacent.loc, config.curb_offset_m) else {
        log::debug!("No room for a kerb next to {}", end);
        return Ok(graph);
    };

    let sidewalk_tags = graph
        .parent_ways(end)
        .into_iter()
        .find(|w| !fix_ways.contains(&w.id) && !is_kerbed_crossing_way(&w.tags))
        .map(|w| w.tags.clone())
        .unwrap_or_else(|| tags([("highway", "footway"), ("footway", "sidewalk")]));

    let edge = [end, adjacent.id];
    let mut graph = graph;
    let kerb_id = graph.new_node_id();
    let kerb_node = Node::new(kerb_id, loc).with_tags(kerb_tags(kerb));
    let graph = add_midpoint(&graph, loc, edge, kerb_node)?;

    let (graph, created) = split(&graph, kerb_id, Some(fix_ways.as_slice()))?;
    fix_ways.extend(created);

    let outer = fix_ways
        .iter()
        .filter_map(|&id| graph.way(id))
        .find(|w| w.contains(end) && w.contains(kerb_id))
        .map(|w| w.id)
        .ok_or(EditError::AmbiguousSplit(kerb_id))?;
    log::debug!("Kerb {} cuts {} off the crossing", kerb_id, outer);
    change_tags(&graph, outer.into(), sidewalk_tags)
}
