use crate::errors::{EditError, EditResult};
use crate::graph::Graph;
use crate::types::{Edge, Location, Node};

/// Places `node` at `loc` and inserts it between the two edge nodes of every
/// way that has them next to each other. Fails when no way does.
pub fn add_midpoint(graph: &Graph, loc: Location, edge: Edge, node: Node) -> EditResult<Graph> {
    graph.try_node(edge[0])?;
    graph.try_node(edge[1])?;

    let mut graph = graph.clone();
    let node_id = node.id;
    graph.replace_node(Node { loc, ..node });

    let ways: Vec<_> = graph
        .parent_ways(edge[0])
        .into_iter()
        .filter(|w| w.contains(edge[1]))
        .cloned()
        .collect();

    let mut inserted = 0;
    for mut way in ways {
        if let Some(i) = way.edge_position(&edge) {
            way.nodes.insert(i + 1, node_id);
            graph.replace_way(way);
            inserted += 1;
        }
    }
    if inserted == 0 {
        return Err(EditError::EdgeNotFound(edge[0], edge[1]));
    }
    Ok(graph)
}
