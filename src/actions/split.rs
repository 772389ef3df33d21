use crate::errors::EditResult;
use crate::geom::distance_meters;
use crate::graph::Graph;
use crate::types::{EntityId, Member, NodeId, Way, WayId};

/// Splits the parent ways of `node_id` at that node.
///
/// Open ways are split only where the node is interior; closed ways are cut
/// at the node and at the vertex farthest away along the ring. With
/// `limit_ways`, only those ways are considered. Returns the new graph and
/// the ids of the ways created, in parent-way order.
pub fn split(graph: &Graph, node_id: NodeId, limit_ways: Option<&[WayId]>) -> EditResult<(Graph, Vec<WayId>)> {
    graph.try_node(node_id)?;

    let candidates: Vec<Way> = graph
        .parent_ways(node_id)
        .into_iter()
        .filter(|w| limit_ways.map_or(true, |limit| limit.contains(&w.id)))
        .filter(|w| w.is_closed() || interior_index(w, node_id).is_some())
        .cloned()
        .collect();

    let mut graph = graph.clone();
    let mut created = Vec::new();
    for way in candidates {
        let pieces = if way.is_closed() {
            split_ring(&graph, &way, node_id)
        } else {
            interior_index(&way, node_id).map(|i| (way.nodes[..=i].to_vec(), way.nodes[i..].to_vec()))
        };
        let Some((nodes_a, nodes_b)) = pieces else { continue };

        let new_id = graph.new_way_id();
        let new_way = Way { id: new_id, nodes: nodes_b, tags: way.tags.clone() };
        let original = Way { nodes: nodes_a, ..way };
        let original_id = original.id;

        graph.replace_way(original);
        graph.replace_way(new_way);
        add_to_parent_relations(&mut graph, original_id, new_id);
        created.push(new_id);
    }

    log::debug!("Split at {} created {:?}", node_id, created);
    Ok((graph, created))
}

fn interior_index(way: &Way, node_id: NodeId) -> Option<usize> {
    let last = way.nodes.len().checked_sub(1)?;
    way.nodes.iter().position(|&n| n == node_id).filter(|&i| i > 0 && i < last)
}

fn split_ring(graph: &Graph, way: &Way, node_id: NodeId) -> Option<(Vec<NodeId>, Vec<NodeId>)> {
    let ring = &way.nodes[..way.nodes.len() - 1];
    if ring.len() < 3 {
        return None;
    }
    let idx_a = ring.iter().position(|&n| n == node_id)?;
    let idx_b = farthest_along_ring(graph, ring, idx_a)?;

    let pieces = if idx_b < idx_a {
        (
            ring[idx_a..].iter().chain(&ring[..=idx_b]).copied().collect(),
            ring[idx_b..=idx_a].to_vec(),
        )
    } else {
        (
            ring[idx_a..=idx_b].to_vec(),
            ring[idx_b..].iter().chain(&ring[..=idx_a]).copied().collect(),
        )
    };
    Some(pieces)
}

/// Index whose shorter walk around the ring from `start` is longest.
fn farthest_along_ring(graph: &Graph, ring: &[NodeId], start: usize) -> Option<usize> {
    let n = ring.len();
    let step = |from: usize, to: usize| -> f64 {
        match (graph.node(ring[from]), graph.node(ring[to])) {
            (Some(a), Some(b)) => distance_meters(&a.loc, &b.loc),
            _ => 0.0,
        }
    };

    let mut forward = vec![0.0; n];
    let mut i = start;
    for _ in 1..n {
        let next = (i + 1) % n;
        forward[next] = forward[i] + step(i, next);
        i = next;
    }
    let mut backward = vec![0.0; n];
    let mut i = start;
    for _ in 1..n {
        let prev = (i + n - 1) % n;
        backward[prev] = backward[i] + step(i, prev);
        i = prev;
    }

    (0..n)
        .filter(|&i| i != start)
        .max_by(|&a, &b| {
            let da = forward[a].min(backward[a]);
            let db = forward[b].min(backward[b]);
            da.total_cmp(&db).then(b.cmp(&a))
        })
}

fn add_to_parent_relations(graph: &mut Graph, original: WayId, created: WayId) {
    let relations: Vec<_> = graph.parent_relations(original.into()).into_iter().cloned().collect();
    for mut relation in relations {
        let mut i = 0;
        while i < relation.members.len() {
            if relation.members[i].id == EntityId::Way(original) {
                let role = relation.members[i].role.clone();
                relation.members.insert(i + 1, Member { id: created.into(), role });
                i += 1;
            }
            i += 1;
        }
        graph.replace_relation(relation);
    }
}
