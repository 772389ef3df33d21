use crate::errors::{EditError, EditResult};
use crate::graph::Graph;
use crate::tags::{is_crossing_way, is_road_highway, CROSSING_PATH_VALUES};
use crate::types::{EntityId, Geometry, NodeId, Tags, WayId};

/// Tags kept identical between a crossing way and its crossing nodes.
const CROSSING_KEYS: [&str; 6] = [
    "crossing",
    "crossing_ref",
    "crossing:continuous",
    "crossing:island",
    "crossing:markings",
    "crossing:signals",
];

/// Attribute-like keys that survive when only one side sets them.
const PRESERVE_KEYS: [&str; 3] = ["crossing_ref", "crossing:continuous", "crossing:island"];

type SyncedValues = Vec<(&'static str, Option<String>)>;

/// Cleans up the crossing tags of `id` and copies them across the crossing:
/// from a crossing way onto the junction nodes it shares with roads, or from
/// a crossing node onto its parent crossing ways.
pub fn sync_crossing_tags(graph: &Graph, id: EntityId) -> EditResult<Graph> {
    let geometry = graph.geometry(id).ok_or(EditError::MissingEntity(id))?;
    let mut graph = graph.clone();
    match (id, geometry) {
        (EntityId::Way(way_id), Geometry::Line) => sync_parent_to_children(&mut graph, way_id, None)?,
        (EntityId::Node(node_id), Geometry::Vertex) => sync_child_to_parents(&mut graph, node_id)?,
        _ => {}
    }
    Ok(graph)
}

fn is_path_way(tags: &Tags) -> bool {
    tags.get("highway").is_some_and(|v| CROSSING_PATH_VALUES.contains(&v.as_str()))
}

fn is_marked_crossing_node(tags: &Tags) -> bool {
    tags.get("crossing:markings").is_some_and(|v| !v.is_empty()) || highway_values(tags).iter().any(|v| v == "crossing")
}

/// `highway` split on `;`, in order, without empties or repeats.
fn highway_values(tags: &Tags) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for part in tags.get("highway").map(String::as_str).unwrap_or("").split(';') {
        if !part.is_empty() && !values.iter().any(|v| v == part) {
            values.push(part.to_string());
        }
    }
    values
}

fn strip_crossing_keys(tags: &mut Tags) {
    // `crossing` may still belong to a railway crossing
    for key in CROSSING_KEYS.iter().filter(|k| **k != "crossing") {
        tags.remove(*key);
    }
}

fn synced_values(tags: &Tags) -> SyncedValues {
    CROSSING_KEYS
        .iter()
        .map(|&k| (k, tags.get(k).filter(|v| !v.is_empty()).cloned()))
        .collect()
}

fn apply_synced(tags: &mut Tags, values: &SyncedValues) {
    for (key, value) in values {
        match value {
            Some(v) => {
                tags.insert(key.to_string(), v.clone());
            }
            None if !PRESERVE_KEYS.contains(key) => {
                tags.remove(*key);
            }
            None => {}
        }
    }
}

fn sync_parent_to_children(graph: &mut Graph, parent_id: WayId, skip_child: Option<NodeId>) -> EditResult<()> {
    let parent = graph.try_way(parent_id)?.clone();
    let mut parent_tags = clean_crossing_tags(&parent.tags);
    let is_parent_crossing = is_crossing_way(&parent_tags);
    let is_parent_path = is_path_way(&parent_tags);

    if !is_parent_path {
        strip_crossing_keys(&mut parent_tags);
    }
    graph.set_tags(parent_id.into(), parent_tags.clone())?;

    let values = synced_values(&parent_tags);
    let is_informal = matches!(parent_tags.get("crossing").map(String::as_str), Some("informal") | Some("no"));

    let mut children: Vec<NodeId> = Vec::new();
    for &node_id in &parent.nodes {
        if Some(node_id) == skip_child || graph.node(node_id).is_none() || children.contains(&node_id) {
            continue;
        }
        let mut is_candidate = false;
        for other in graph.parent_ways(node_id) {
            if other.id == parent_id {
                continue;
            }
            // a plain path meeting another path keeps its own tags
            if !is_parent_crossing && is_path_way(&other.tags) {
                is_candidate = false;
                break;
            }
            if is_road_highway(&other.tags) {
                is_candidate = true;
            }
        }
        if is_candidate {
            children.push(node_id);
        }
    }

    for child_id in children {
        let mut child_tags = graph.try_node(child_id)?.tags.clone();
        apply_synced(&mut child_tags, &values);

        let mut highway = highway_values(&child_tags);
        if is_parent_crossing {
            if is_informal {
                highway.retain(|v| v != "crossing");
            } else if !highway.iter().any(|v| v == "crossing") {
                highway.push("crossing".to_string());
            }
        } else if !is_parent_path {
            highway.retain(|v| v != "crossing");
        }

        if highway.is_empty() {
            child_tags.remove("highway");
        } else {
            child_tags.insert("highway".to_string(), highway.join(";"));
        }
        graph.set_tags(child_id.into(), child_tags)?;
    }
    Ok(())
}

fn sync_child_to_parents(graph: &mut Graph, child_id: NodeId) -> EditResult<()> {
    let mut child_tags = clean_crossing_tags(&graph.try_node(child_id)?.tags);
    let is_child_crossing = is_marked_crossing_node(&child_tags);

    if !is_child_crossing {
        strip_crossing_keys(&mut child_tags);
    }
    graph.set_tags(child_id.into(), child_tags.clone())?;

    let values = synced_values(&child_tags);
    let crossing_ways: Vec<WayId> = graph
        .parent_ways(child_id)
        .into_iter()
        .filter(|w| is_crossing_way(&w.tags))
        .map(|w| w.id)
        .collect();

    for way_id in crossing_ways {
        // the way's own footway=crossing is left alone; it may be a sidewalk running across
        let mut way_tags = graph.try_way(way_id)?.tags.clone();
        apply_synced(&mut way_tags, &values);
        graph.set_tags(way_id.into(), way_tags)?;

        if is_child_crossing {
            sync_parent_to_children(graph, way_id, Some(child_id))?;
        }
    }
    Ok(())
}

/// Fills in `crossing:markings`/`crossing:signals` defaults from `crossing_ref`
/// and the legacy `crossing` value, drops a legacy value that contradicts
/// them, and derives a legacy value when it is missing.
pub(crate) fn clean_crossing_tags(input: &Tags) -> Tags {
    let get = |k: &str| input.get(k).cloned().unwrap_or_default();
    let crossing = get("crossing");
    let crossing_ref = get("crossing_ref");
    let mut markings = get("crossing:markings");
    let mut signals = get("crossing:signals");

    if crossing.is_empty() && crossing_ref.is_empty() && markings.is_empty() && signals.is_empty() {
        return input.clone();
    }
    if [&crossing, &crossing_ref, &markings, &signals].iter().any(|v| v.contains(';')) {
        return input.clone();
    }

    let mut tags = input.clone();
    let set = |tags: &mut Tags, key: &str, value: &str| -> String {
        tags.insert(key.to_string(), value.to_string());
        value.to_string()
    };

    if !crossing_ref.is_empty() {
        if markings.is_empty() {
            let value = if crossing_ref == "zebra" { "zebra" } else { "yes" };
            markings = set(&mut tags, "crossing:markings", value);
        }
        if signals.is_empty() && matches!(crossing_ref.as_str(), "hawk" | "pelican" | "puffin" | "toucan" | "pegasus") {
            signals = set(&mut tags, "crossing:signals", "yes");
        }
    }

    if !crossing.is_empty() {
        if markings.is_empty() {
            let value = match crossing.as_str() {
                "island" | "pedestrian_signals" | "traffic_signals" => None,
                "informal" | "no" | "unmarked" => Some("no"),
                "zebra" => Some("zebra"),
                _ => Some("yes"),
            };
            if let Some(value) = value {
                markings = set(&mut tags, "crossing:markings", value);
            }
        }
        if signals.is_empty() {
            let value = match crossing.as_str() {
                "informal" | "no" | "uncontrolled" => Some("no"),
                "pedestrian_signals" | "traffic_signals" => Some("yes"),
                _ => None,
            };
            if let Some(value) = value {
                signals = set(&mut tags, "crossing:signals", value);
            }
        }

        let legacy_marked = !matches!(
            crossing.as_str(),
            "island" | "informal" | "no" | "traffic_signals" | "pedestrian_signals" | "unmarked"
        );
        let legacy_signaled = matches!(crossing.as_str(), "traffic_signals" | "pedestrian_signals");
        let modern_marked = !markings.is_empty() && markings != "no";
        let modern_signaled = !signals.is_empty() && signals != "no";
        if legacy_marked != modern_marked || legacy_signaled != modern_signaled {
            tags.remove("crossing");
        }
    }

    if tags.get("crossing").map_or(true, |v| v.is_empty()) {
        if !signals.is_empty() && signals != "no" {
            set(&mut tags, "crossing", "traffic_signals");
        } else if !markings.is_empty() {
            let value = if markings == "no" { "unmarked" } else { "marked" };
            set(&mut tags, "crossing", value);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;
    use crate::types::tags;

    // crossing way n1-n2 meets a road at n2
    fn junction(crossing_way: Tags, junction_node: Tags) -> Graph {
        let mut n2 = node(2, 0.0, 0.0);
        n2.tags = junction_node;
        Graph::from_entities(
            vec![node(1, 0.0, -0.001), n2, node(3, -0.001, 0.0), node(4, 0.001, 0.0)],
            vec![
                way(1, &[1, 2], crossing_way),
                way(2, &[3, 2, 4], tags([("highway", "residential")])),
            ],
            vec![],
        )
    }

    #[test]
    fn cleaning_fills_in_modern_and_legacy_tags() {
        assert_eq!(
            clean_crossing_tags(&tags([("crossing_ref", "zebra")])),
            tags([("crossing_ref", "zebra"), ("crossing:markings", "zebra"), ("crossing", "marked")])
        );
        assert_eq!(
            clean_crossing_tags(&tags([("crossing", "traffic_signals")])),
            tags([("crossing", "traffic_signals"), ("crossing:signals", "yes")])
        );
        // legacy value contradicting the modern one is replaced
        assert_eq!(
            clean_crossing_tags(&tags([("crossing", "unmarked"), ("crossing:markings", "zebra")])),
            tags([("crossing", "marked"), ("crossing:markings", "zebra")])
        );
        let multi = tags([("crossing", "zebra;marked")]);
        assert_eq!(clean_crossing_tags(&multi), multi);
        let plain = tags([("highway", "footway")]);
        assert_eq!(clean_crossing_tags(&plain), plain);
    }

    #[test]
    fn crossing_way_tags_reach_the_junction() {
        let way_tags = tags([("highway", "footway"), ("footway", "crossing"), ("crossing", "zebra")]);
        let graph = junction(way_tags, tags([]));
        let synced = sync_crossing_tags(&graph, WayId(1).into()).unwrap();

        let n2 = &synced.node(NodeId(2)).unwrap().tags;
        assert_eq!(n2.get("highway").map(String::as_str), Some("crossing"));
        assert_eq!(n2.get("crossing").map(String::as_str), Some("zebra"));
        assert_eq!(n2.get("crossing:markings").map(String::as_str), Some("zebra"));
        // the far end does not touch a road
        assert!(synced.node(NodeId(1)).unwrap().tags.is_empty());
    }

    #[test]
    fn informal_crossings_drop_highway_crossing() {
        let way_tags = tags([("highway", "footway"), ("footway", "crossing"), ("crossing", "informal")]);
        let graph = junction(way_tags, tags([("highway", "crossing;traffic_signals")]));
        let synced = sync_crossing_tags(&graph, WayId(1).into()).unwrap();
        let n2 = &synced.node(NodeId(2)).unwrap().tags;
        assert_eq!(n2.get("highway").map(String::as_str), Some("traffic_signals"));
        assert_eq!(n2.get("crossing:signals").map(String::as_str), Some("no"));
    }

    #[test]
    fn crossing_node_tags_reach_the_way() {
        let way_tags = tags([("highway", "footway"), ("footway", "crossing")]);
        let graph = junction(way_tags, tags([("highway", "crossing"), ("crossing:markings", "zebra")]));
        let synced = sync_crossing_tags(&graph, NodeId(2).into()).unwrap();
        let w1 = &synced.way(WayId(1)).unwrap().tags;
        assert_eq!(w1.get("crossing:markings").map(String::as_str), Some("zebra"));
        assert_eq!(w1.get("crossing").map(String::as_str), Some("marked"));
        assert_eq!(w1.get("footway").map(String::as_str), Some("crossing"));
    }

    #[test]
    fn non_paths_lose_crossing_details() {
        let way_tags = tags([("waterway", "ditch"), ("crossing:markings", "zebra")]);
        let graph = junction(way_tags, tags([]));
        let synced = sync_crossing_tags(&graph, WayId(1).into()).unwrap();
        let w1 = &synced.way(WayId(1)).unwrap().tags;
        assert!(!w1.contains_key("crossing:markings"));
    }
}
