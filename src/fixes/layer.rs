use super::LayerChange;
use crate::actions::change_tags;
use crate::errors::{EditError, EditResult};
use crate::graph::Graph;
use crate::types::EntityId;

/// Moves the entity one layer up or down; an unset, zero or unreadable
/// layer becomes `1` or `-1`.
pub fn change_layer(graph: &Graph, id: EntityId, direction: LayerChange) -> EditResult<Graph> {
    let entity = graph.entity(id).ok_or(EditError::MissingEntity(id))?;
    let mut tags = entity.tags().clone();

    let current = tags
        .get("layer")
        .and_then(|l| l.trim().parse::<f64>().ok())
        .filter(|l| *l != 0.0 && l.is_finite());
    let step = match direction {
        LayerChange::Higher => 1.0,
        LayerChange::Lower => -1.0,
    };
    let layer = current.map_or(step, |l| l + step);

    tags.insert("layer".to_string(), format!("{}", layer));
    change_tags(graph, id, tags)
}
