use serde::Serialize;

use crate::config::ValidationConfig;
use crate::detect::{Crossing, WayInfo};
use crate::feature::{tagged_entity_for_way, FeatureType};
use crate::fixes::FixAction;
use crate::graph::Graph;
use crate::rules::{connection_tags, ConnectionSide, ConnectionTags};
use crate::tags::{has_tag, is_crossing_way, is_indoor, tag_is};
use crate::types::{Edge, EntityId, Geometry, Location, Tags, WayId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Suggestion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    CrossingWays,
    CurbNodes,
}

impl IssueType {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueType::CrossingWays => "crossing_ways",
            IssueType::CurbNodes => "curb_nodes",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueData {
    CrossingWays {
        edges: [Edge; 2],
        feature_types: [FeatureType; 2],
        /// Crossing way whose crossing tags go onto a new junction node.
        crossing_way_id: Option<EntityId>,
        connection_tags: ConnectionTags,
        /// Reference text key, e.g. `highway-railway` or `bridge-bridge_connectable`.
        crossing_type_id: String,
        is_minor: bool,
    },
    CurbNodes {
        crossing_way_id: WayId,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub subtype: String,
    pub severity: Severity,
    pub entity_ids: Vec<EntityId>,
    pub loc: Option<Location>,
    /// Tells apart several issues between the same entities.
    pub hash: Option<String>,
    pub data: IssueData,
    /// One-click fix, when there is an obvious one.
    pub auto_fix: Option<FixAction>,
}

impl ValidationIssue {
    /// `type:hash:subtype:ids`, with the entity ids sorted.
    pub fn id(&self) -> String {
        let mut parts = vec![self.issue_type.as_str().to_string()];
        if let Some(hash) = &self.hash {
            parts.push(hash.clone());
        }
        if !self.subtype.is_empty() {
            parts.push(self.subtype.clone());
        }
        let mut ids: Vec<String> = self.entity_ids.iter().map(|id| id.to_string()).collect();
        ids.sort();
        parts.extend(ids);
        parts.join(":")
    }
}

/// Waterways first, then by type name, then by way id.
fn issue_order(info: &WayInfo) -> (bool, FeatureType, WayId) {
    (info.feature_type != FeatureType::Waterway, info.feature_type, info.way_id)
}

/// Fixed-point text with ties rounded away from zero, so 0.03125 gives "0.0313".
fn to_fixed(value: f64, precision: usize) -> String {
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    // adding zero turns -0.0 into 0.0
    format!("{:.p$}", rounded + 0.0, p = precision)
}

fn crossing_hash(loc: &Location, precision: usize) -> String {
    format!("{},{}", to_fixed(loc.longitude, precision), to_fixed(loc.latitude, precision))
}

pub fn create_crossing_issue(crossing: &Crossing, graph: &Graph, config: &ValidationConfig) -> Option<ValidationIssue> {
    let mut infos = crossing.way_infos.clone();
    infos.sort_by_key(issue_order);
    let [info1, info2] = &infos;

    let entity1 = tagged_entity_for_way(graph.way(info1.way_id)?, graph);
    let entity2 = tagged_entity_for_way(graph.way(info2.way_id)?, graph);
    let (tags1, tags2) = (entity1.tags(), entity2.tags());
    let (type1, type2) = (info1.feature_type, info2.feature_type);

    let is_line = |id: EntityId| graph.geometry(id) == Some(Geometry::Line);
    let conn_tags = connection_tags(
        ConnectionSide { tags: tags1, feature_type: type1, is_line: is_line(entity1.id()) },
        ConnectionSide { tags: tags2, feature_type: type2, is_line: is_line(entity2.id()) },
    );
    let suggests_crossing_node = conn_tags.as_ref().is_some_and(|t| tag_is(t, "highway", "crossing"));

    let indoors = is_indoor(tags1) && is_indoor(tags2);
    let bridges = type1.allows_bridge() && has_tag(tags1, "bridge") && type2.allows_bridge() && has_tag(tags2, "bridge");
    let tunnels = type1.allows_tunnel() && has_tag(tags1, "tunnel") && type2.allows_tunnel() && has_tag(tags2, "tunnel");
    let is_minor =
        (tag_is(tags1, "highway", "service") || tag_is(tags2, "highway", "service")) && suggests_crossing_node;

    let crossing_way_id = if !suggests_crossing_node {
        None
    } else if is_crossing_way(tags1) {
        Some(entity1.id())
    } else if is_crossing_way(tags2) {
        Some(entity2.id())
    } else {
        None
    };

    let mut names = [type1.as_str(), type2.as_str()];
    names.sort_unstable();
    let subtype = names.join("-");

    let mut crossing_type_id = if indoors {
        "indoor-indoor".to_string()
    } else if tunnels {
        "tunnel-tunnel".to_string()
    } else if bridges {
        "bridge-bridge".to_string()
    } else {
        subtype.clone()
    };
    if conn_tags.is_some() && (indoors || tunnels || bridges) {
        crossing_type_id.push_str("_connectable");
    }

    let edges = [info1.edge, info2.edge];
    let loc = crossing.cross_point;
    let auto_fix = match &conn_tags {
        _ if is_minor => Some(FixAction::ConnectWays { loc, edges, crossing_way_id: None, tags: Tags::new() }),
        // fords are never applied without asking
        Some(t) if !t.contains_key("ford") => {
            Some(FixAction::ConnectWays { loc, edges, crossing_way_id, tags: t.clone() })
        }
        _ => None,
    };

    Some(ValidationIssue {
        issue_type: IssueType::CrossingWays,
        subtype,
        severity: Severity::Warning,
        entity_ids: vec![entity1.id(), entity2.id()],
        loc: Some(loc),
        hash: Some(crossing_hash(&loc, config.hash_precision)),
        data: IssueData::CrossingWays {
            edges,
            feature_types: [type1, type2],
            crossing_way_id,
            connection_tags: conn_tags,
            crossing_type_id,
            is_minor,
        },
        auto_fix,
    })
}

pub fn create_curb_issue(way_id: WayId) -> ValidationIssue {
    ValidationIssue {
        issue_type: IssueType::CurbNodes,
        subtype: "missing_curb_nodes".to_string(),
        severity: Severity::Suggestion,
        entity_ids: vec![way_id.into()],
        loc: None,
        hash: None,
        data: IssueData::CurbNodes { crossing_way_id: way_id },
        auto_fix: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_problem_crossings;
    use crate::graph::fixtures::*;
    use crate::spatial::SegmentTree;
    use crate::types::{tags, NodeId};

    fn issues_for(graph: &Graph, way: i64) -> Vec<ValidationIssue> {
        let tree = SegmentTree::new(graph);
        let way = graph.way(WayId(way)).unwrap();
        detect_problem_crossings(way, graph, &tree)
            .iter()
            .filter_map(|c| create_crossing_issue(c, graph, &ValidationConfig::default()))
            .collect()
    }

    #[test]
    fn rail_road_issue_is_stable() {
        let graph = one_crossing(tags([("railway", "rail")]), tags([("highway", "residential")]));
        let first = issues_for(&graph, -1);
        let again = issues_for(&graph, -1);
        let other_side = issues_for(&graph, -2);
        assert_eq!(first.len(), 1);
        assert_eq!(first, again);
        assert_eq!(first[0].id(), other_side[0].id());

        let issue = &first[0];
        assert_eq!(issue.hash.as_deref(), Some("0.0000,0.0000"));
        assert_eq!(issue.subtype, "highway-railway");
        assert_eq!(issue.entity_ids, vec![EntityId::Way(WayId(-2)), EntityId::Way(WayId(-1))]);
        assert_eq!(issue.id(), "crossing_ways:0.0000,0.0000:highway-railway:w-1:w-2");
        let IssueData::CrossingWays { edges, connection_tags, .. } = &issue.data else { panic!() };
        assert_eq!(edges[0], [NodeId(-3), NodeId(-4)]);
        assert_eq!(connection_tags, &Some(tags([("railway", "level_crossing")])));
        assert!(matches!(issue.auto_fix, Some(FixAction::ConnectWays { .. })));
    }

    #[test]
    fn waterways_come_first() {
        let graph = one_crossing(tags([("highway", "residential")]), tags([("waterway", "river")]));
        let issue = &issues_for(&graph, -1)[0];
        assert_eq!(issue.entity_ids[0], EntityId::Way(WayId(-2)));
        assert_eq!(issue.subtype, "highway-waterway");
        // ford is only offered, never applied automatically
        assert!(issue.auto_fix.is_none());
    }

    #[test]
    fn crossing_way_and_minor_crossings() {
        let crossing = tags([("highway", "footway"), ("footway", "crossing")]);
        let graph = one_crossing(crossing.clone(), tags([("highway", "residential")]));
        let issue = &issues_for(&graph, -1)[0];
        let IssueData::CrossingWays { crossing_way_id, is_minor, .. } = &issue.data else { panic!() };
        assert_eq!(*crossing_way_id, Some(EntityId::Way(WayId(-1))));
        assert!(!is_minor);

        let graph = one_crossing(crossing, tags([("highway", "service")]));
        let issue = &issues_for(&graph, -1)[0];
        let IssueData::CrossingWays { is_minor, .. } = &issue.data else { panic!() };
        assert!(*is_minor);
        let Some(FixAction::ConnectWays { tags: fix_tags, crossing_way_id, .. }) = &issue.auto_fix else { panic!() };
        assert!(fix_tags.is_empty());
        assert!(crossing_way_id.is_none());
    }

    #[test]
    fn crossing_type_ids() {
        let tunnel_road = tags([("highway", "residential"), ("tunnel", "yes")]);
        let tunnel_rail = tags([("railway", "rail"), ("tunnel", "yes")]);
        let graph = one_crossing(tunnel_road, tunnel_rail);
        let issue = &issues_for(&graph, -1)[0];
        let IssueData::CrossingWays { crossing_type_id, .. } = &issue.data else { panic!() };
        assert_eq!(crossing_type_id, "tunnel-tunnel_connectable");

        let graph = one_crossing(tags([("building", "yes")]), tags([("highway", "residential")]));
        let issue = &issues_for(&graph, -1)[0];
        assert_eq!(issue.subtype, "building-highway");
        let IssueData::CrossingWays { crossing_type_id, connection_tags, .. } = &issue.data else { panic!() };
        assert_eq!(crossing_type_id, "building-highway");
        assert!(connection_tags.is_none());
        assert!(issue.auto_fix.is_none());
    }

    #[test]
    fn hash_ties_round_away_from_zero() {
        assert_eq!(crossing_hash(&Location::new(0.03125, -0.03125), 4), "0.0313,-0.0313");
        assert_eq!(crossing_hash(&Location::new(-0.00001, 8.5), 2), "0.00,8.50");
    }

    #[test]
    fn curb_issue_id_has_no_hash() {
        assert_eq!(create_curb_issue(WayId(5)).id(), "curb_nodes:missing_curb_nodes:w5");
    }
}
