//! Fixes are plain data; `apply_fix` turns one into a new graph version.

mod connect;
mod curb;
mod layer;
mod structure;

use serde::{Deserialize, Serialize};

use crate::config::ValidationConfig;
use crate::feature::FeatureType;
use crate::graph::Graph;
use crate::issue::{IssueData, ValidationIssue};
use crate::tags::tag_is;
use crate::types::{Edge, EntityId, Geometry, Location, Tags, WayId};

pub use connect::connect_ways;
pub use curb::add_curb_nodes;
pub use layer::change_layer;
pub use structure::{add_bridge_or_tunnel, structure_length_m};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Bridge,
    Tunnel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerChange {
    Higher,
    Lower,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KerbType {
    Unspecified,
    Flush,
    Lowered,
    Raised,
}

impl KerbType {
    pub const ALL: [KerbType; 4] = [KerbType::Unspecified, KerbType::Flush, KerbType::Lowered, KerbType::Raised];

    pub fn as_str(self) -> &'static str {
        match self {
            KerbType::Unspecified => "unspecified",
            KerbType::Flush => "flush",
            KerbType::Lowered => "lowered",
            KerbType::Raised => "raised",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FixAction {
    ConnectWays {
        loc: Location,
        edges: [Edge; 2],
        crossing_way_id: Option<EntityId>,
        tags: Tags,
    },
    AddStructure {
        structure: Structure,
    },
    ChangeLayer {
        direction: LayerChange,
    },
    AddCurbNodes {
        way_id: WayId,
        kerb: KerbType,
    },
}

/// One entry of the fix menu. Entries without an action only advise the user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationFix {
    pub icon: &'static str,
    pub title: String,
    pub action: Option<FixAction>,
}

/// What the user currently has selected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub select_mode: bool,
    pub selected_ids: Vec<EntityId>,
}

impl Selection {
    pub fn select(ids: Vec<EntityId>) -> Self {
        Selection { select_mode: true, selected_ids: ids }
    }

    /// The selected entity, when exactly one is selected in select mode.
    pub fn single(&self) -> Option<EntityId> {
        match self.selected_ids.as_slice() {
            [id] if self.select_mode => Some(*id),
            _ => None,
        }
    }
}

/// Result of a successful fix, ready to be committed as one edit.
#[derive(Clone, Debug)]
pub struct FixOutcome {
    pub graph: Graph,
    pub annotation: String,
    pub selected_ids: Vec<EntityId>,
}

fn connect_fix(connection_tags: &Tags, issue: &ValidationIssue, crossing_way_id: Option<EntityId>) -> Option<ValidationFix> {
    let loc = issue.loc?;
    let IssueData::CrossingWays { edges, .. } = &issue.data else { return None };
    let (icon, title) = if connection_tags.contains_key("ford") {
        ("rapid-icon-connect", "connect_using_ford")
    } else if tag_is(connection_tags, "highway", "crossing") {
        ("temaki-pedestrian", "connect_using_crossing")
    } else {
        ("rapid-icon-connect", "connect_features")
    };
    Some(ValidationFix {
        icon,
        title: title.to_string(),
        action: Some(FixAction::ConnectWays { loc, edges: *edges, crossing_way_id, tags: connection_tags.clone() }),
    })
}

fn advice(icon: &'static str, title: &str) -> ValidationFix {
    ValidationFix { icon, title: title.to_string(), action: None }
}

/// The fixes to offer for `issue` given the current graph and selection.
pub fn dynamic_fixes(issue: &ValidationIssue, graph: &Graph, selection: &Selection) -> Vec<ValidationFix> {
    match &issue.data {
        IssueData::CurbNodes { crossing_way_id } => KerbType::ALL
            .iter()
            .map(|&kerb| ValidationFix {
                icon: match kerb {
                    KerbType::Unspecified => "temaki-kerb-unspecified",
                    KerbType::Flush => "temaki-kerb-flush",
                    KerbType::Lowered => "temaki-kerb-lowered",
                    KerbType::Raised => "temaki-kerb-raised",
                },
                title: format!("add_curb_nodes:{}", kerb.as_str()),
                action: Some(FixAction::AddCurbNodes { way_id: *crossing_way_id, kerb }),
            })
            .collect(),
        IssueData::CrossingWays { feature_types, crossing_way_id, connection_tags, crossing_type_id, is_minor, .. } => {
            let Some(selected) = selection.single() else {
                return Vec::new();
            };
            let selected_index = if issue.entity_ids.first() == Some(&selected) { 0 } else { 1 };
            let selected_type = feature_types[selected_index];
            let other_type = feature_types[1 - selected_index];

            let mut fixes = Vec::new();
            if *is_minor {
                fixes.extend(connect_fix(&Tags::new(), issue, None));
            }
            if let Some(t) = connection_tags {
                fixes.extend(connect_fix(t, issue, *crossing_way_id));
            }

            let base_type = crossing_type_id.trim_end_matches("_connectable");
            let has_building = feature_types.contains(&FeatureType::Building);
            if base_type == "indoor-indoor" {
                fixes.push(advice("rapid-icon-layers", "use_different_levels"));
            } else if base_type == "tunnel-tunnel" || base_type == "bridge-bridge" || has_building {
                for (direction, icon, title) in [
                    (LayerChange::Higher, "rapid-icon-up", "tag_this_as_higher"),
                    (LayerChange::Lower, "rapid-icon-down", "tag_this_as_lower"),
                ] {
                    fixes.push(ValidationFix {
                        icon,
                        title: title.to_string(),
                        action: Some(FixAction::ChangeLayer { direction }),
                    });
                }
            } else if issue.entity_ids.iter().all(|&id| graph.geometry(id) == Some(Geometry::Line)) {
                // bridges on waterways and tunnels under them are rare
                if selected_type.allows_bridge() && selected_type != FeatureType::Waterway {
                    fixes.push(ValidationFix {
                        icon: "temaki-bridge",
                        title: "add_a_bridge".to_string(),
                        action: Some(FixAction::AddStructure { structure: Structure::Bridge }),
                    });
                }
                let skip_tunnel = other_type == FeatureType::Waterway && selected_type != FeatureType::Waterway;
                if selected_type.allows_tunnel() && !skip_tunnel {
                    fixes.push(ValidationFix {
                        icon: "temaki-tunnel",
                        title: "add_a_tunnel".to_string(),
                        action: Some(FixAction::AddStructure { structure: Structure::Tunnel }),
                    });
                }
            }

            fixes.push(advice("rapid-operation-move", "reposition_features"));
            fixes
        }
    }
}

/// Applies `action` to the current `graph`.
///
/// Returns `None`, leaving the graph untouched, when the issue's entities or
/// the selection no longer fit the fix.
pub fn apply_fix(
    action: &FixAction,
    issue: &ValidationIssue,
    graph: &Graph,
    selection: &Selection,
    config: &ValidationConfig,
) -> Option<FixOutcome> {
    if let Some(missing) = issue.entity_ids.iter().find(|&&id| !graph.has_entity(id)) {
        log::warn!("Fix for {} skipped, {} is gone", issue.id(), missing);
        return None;
    }
    let result = match action {
        FixAction::ConnectWays { loc, edges, crossing_way_id, tags } => {
            connect_ways(graph, *loc, edges, *crossing_way_id, tags, config).map(|graph| FixOutcome {
                graph,
                annotation: "Connected a crossing of two features.".to_string(),
                selected_ids: issue.entity_ids.clone(),
            })
        }
        FixAction::AddStructure { structure } => {
            let Some(EntityId::Way(way_id)) = selection.single() else {
                log::warn!("Structure fix for {} needs exactly one selected way", issue.id());
                return None;
            };
            add_bridge_or_tunnel(graph, issue, way_id, *structure, config).map(|(graph, result_way_ids)| {
                let annotation = match structure {
                    Structure::Bridge => "Added a bridge.",
                    Structure::Tunnel => "Added a tunnel.",
                };
                FixOutcome {
                    graph,
                    annotation: annotation.to_string(),
                    selected_ids: result_way_ids.into_iter().map(EntityId::from).collect(),
                }
            })
        }
        FixAction::ChangeLayer { direction } => {
            let Some(selected) = selection.single().filter(|id| issue.entity_ids.contains(id)) else {
                log::warn!("Layer fix for {} needs one of its features selected", issue.id());
                return None;
            };
            change_layer(graph, selected, *direction).map(|graph| FixOutcome {
                graph,
                annotation: "Changed tags.".to_string(),
                selected_ids: vec![selected],
            })
        }
        FixAction::AddCurbNodes { way_id, kerb } => {
            add_curb_nodes(graph, *way_id, *kerb, config).map(|graph| FixOutcome {
                graph,
                annotation: format!("Added {} curb nodes.", kerb.as_str()),
                selected_ids: vec![(*way_id).into()],
            })
        }
    };

    match result {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            log::warn!("Fix for {} left the graph unchanged: {}", issue.id(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_problem_crossings;
    use crate::graph::fixtures::*;
    use crate::issue::create_crossing_issue;
    use crate::spatial::SegmentTree;
    use crate::types::{tags, WayId};

    fn crossing_issue(graph: &Graph) -> ValidationIssue {
        let tree = SegmentTree::new(graph);
        let way = graph.way(WayId(-1)).unwrap();
        let crossings = detect_problem_crossings(way, graph, &tree);
        create_crossing_issue(&crossings[0], graph, &ValidationConfig::default()).unwrap()
    }

    fn titles(fixes: &[ValidationFix]) -> Vec<&str> {
        fixes.iter().map(|f| f.title.as_str()).collect()
    }

    #[test]
    fn no_fixes_without_a_single_selection() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("railway", "rail")]));
        let issue = crossing_issue(&graph);
        assert!(dynamic_fixes(&issue, &graph, &Selection::default()).is_empty());
        let two = Selection::select(vec![WayId(-1).into(), WayId(-2).into()]);
        assert!(dynamic_fixes(&issue, &graph, &two).is_empty());
    }

    #[test]
    fn road_over_rail_offers_connect_bridge_tunnel() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("railway", "rail")]));
        let issue = crossing_issue(&graph);
        let fixes = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-1).into()]));
        assert_eq!(
            titles(&fixes),
            vec!["connect_features", "add_a_bridge", "add_a_tunnel", "reposition_features"]
        );
        assert!(fixes.last().unwrap().action.is_none());
    }

    #[test]
    fn road_over_river_skips_tunnel() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("waterway", "river")]));
        let issue = crossing_issue(&graph);
        let road = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-1).into()]));
        assert_eq!(titles(&road), vec!["connect_using_ford", "add_a_bridge", "reposition_features"]);
        let river = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-2).into()]));
        assert_eq!(titles(&river), vec!["connect_using_ford", "add_a_tunnel", "reposition_features"]);
    }

    #[test]
    fn minor_crossing_offers_both_connections() {
        let graph = one_crossing(
            tags([("highway", "footway"), ("footway", "sidewalk")]),
            tags([("highway", "service")]),
        );
        let issue = crossing_issue(&graph);
        let fixes = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-1).into()]));
        assert_eq!(
            titles(&fixes),
            vec!["connect_features", "connect_using_crossing", "add_a_bridge", "add_a_tunnel", "reposition_features"]
        );
    }

    #[test]
    fn indoor_and_building_crossings() {
        let graph = one_crossing(tags([("highway", "corridor"), ("level", "1")]), tags([("highway", "corridor"), ("level", "1")]));
        let issue = crossing_issue(&graph);
        let fixes = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-1).into()]));
        assert_eq!(titles(&fixes), vec!["connect_features", "use_different_levels", "reposition_features"]);

        let graph = one_crossing(tags([("building", "yes")]), tags([("highway", "residential")]));
        let issue = crossing_issue(&graph);
        let fixes = dynamic_fixes(&issue, &graph, &Selection::select(vec![WayId(-1).into()]));
        assert_eq!(titles(&fixes), vec!["tag_this_as_higher", "tag_this_as_lower", "reposition_features"]);
    }

    #[test]
    fn stale_structure_fix_is_a_no_op() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("railway", "rail")]));
        let issue = crossing_issue(&graph);
        let action = FixAction::AddStructure { structure: Structure::Bridge };
        let config = ValidationConfig::default();
        assert!(apply_fix(&action, &issue, &graph, &Selection::default(), &config).is_none());

        let mut changed = graph.clone();
        changed.remove_way(WayId(-2));
        let selection = Selection::select(vec![WayId(-1).into()]);
        assert!(apply_fix(&action, &issue, &changed, &selection, &config).is_none());
    }

    #[test]
    fn autofix_applies_only_once() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("railway", "rail")]));
        let issue = crossing_issue(&graph);
        let action = issue.auto_fix.clone().unwrap();
        let config = ValidationConfig::default();

        let fixed = apply_fix(&action, &issue, &graph, &Selection::default(), &config).unwrap().graph;
        assert!(apply_fix(&action, &issue, &fixed, &Selection::default(), &config).is_none());

        // every node still sits on a way
        for id in fixed.entity_ids() {
            if let EntityId::Node(node) = id {
                assert!(!fixed.parent_ways(node).is_empty(), "{} is on no way", node);
            }
        }
    }
}
