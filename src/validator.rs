use std::collections::HashSet;

use crate::config::ValidationConfig;
use crate::detect::detect_problem_crossings;
use crate::feature::ways_to_check;
use crate::graph::Graph;
use crate::issue::{create_crossing_issue, create_curb_issue, ValidationIssue};
use crate::spatial::{SegmentTree, SpatialIndex};
use crate::tags::{has_tag, is_kerb_node, is_kerbed_crossing_way};
use crate::types::{EntityId, EntityRef, Geometry};

/// Problem crossings of `id` (a way, or the member ways of a multipolygon).
pub fn validate_crossing_ways(
    id: EntityId,
    graph: &Graph,
    index: &dyn SpatialIndex,
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    ways_to_check(id, graph)
        .into_iter()
        .flat_map(|way| detect_problem_crossings(way, graph, index))
        .filter_map(|crossing| create_crossing_issue(&crossing, graph, config))
        .collect()
}

/// Crossing ways that have no kerb anywhere along them.
pub fn validate_curb_nodes(id: EntityId, graph: &Graph) -> Vec<ValidationIssue> {
    let Some(EntityRef::Way(way)) = graph.entity(id) else {
        return Vec::new();
    };
    if way.is_degenerate() || graph.geometry(id) == Some(Geometry::Area) {
        return Vec::new();
    }
    let routable = has_tag(&way.tags, "highway") || has_tag(&way.tags, "cycleway");
    if !routable || !is_kerbed_crossing_way(&way.tags) {
        return Vec::new();
    }
    if graph.child_nodes(way).iter().any(|n| is_kerb_node(&n.tags)) {
        return Vec::new();
    }
    vec![create_curb_issue(way.id)]
}

pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Validator { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Runs every validation on one entity.
    pub fn validate_entity(&self, id: EntityId, graph: &Graph, index: &dyn SpatialIndex) -> Vec<ValidationIssue> {
        let mut issues = validate_crossing_ways(id, graph, index, &self.config);
        issues.extend(validate_curb_nodes(id, graph));
        issues
    }

    /// Runs every validation on every way and relation, reporting each issue once.
    pub fn validate_graph(&self, graph: &Graph) -> Vec<ValidationIssue> {
        let tree = SegmentTree::new(graph);
        let mut seen = HashSet::new();
        let mut issues = Vec::new();
        for id in graph.entity_ids() {
            if matches!(id, EntityId::Node(_)) {
                continue;
            }
            for issue in self.validate_entity(id, graph, &tree) {
                if seen.insert(issue.id()) {
                    issues.push(issue);
                }
            }
        }
        log::debug!("Validated {} entities, {} issues", graph.entity_ids().len(), issues.len());
        issues
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new(ValidationConfig::default())
    }
}
