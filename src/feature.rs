use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::Graph;
use crate::tags;
use crate::types::{EntityId, EntityRef, Geometry, Way};

/// Semantic category that decides how two crossing features relate.
///
/// Declared in alphabetical order so `Ord` matches the name order used for
/// subtype keys like `highway-railway`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Aeroway,
    Building,
    Highway,
    Railway,
    Waterway,
}

impl FeatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Aeroway => "aeroway",
            FeatureType::Building => "building",
            FeatureType::Highway => "highway",
            FeatureType::Railway => "railway",
            FeatureType::Waterway => "waterway",
        }
    }

    pub fn allows_bridge(self) -> bool {
        matches!(
            self,
            FeatureType::Aeroway | FeatureType::Highway | FeatureType::Railway | FeatureType::Waterway
        )
    }

    pub fn allows_tunnel(self) -> bool {
        matches!(self, FeatureType::Highway | FeatureType::Railway | FeatureType::Waterway)
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn feature_type(entity: EntityRef<'_>, graph: &Graph) -> Option<FeatureType> {
    let geometry = graph.geometry(entity.id())?;
    if geometry != Geometry::Line && geometry != Geometry::Area {
        return None;
    }
    let t = entity.tags();

    if tags::is_routable_aeroway(t) {
        return Some(FeatureType::Aeroway);
    }
    if tags::is_building(t) {
        return Some(FeatureType::Building);
    }
    if tags::has_tag(t, "highway") && tags::is_routable_highway(t) {
        return Some(FeatureType::Highway);
    }

    // railway and waterway areas are not checked
    if geometry != Geometry::Line {
        return None;
    }
    if tags::has_tag(t, "railway") && tags::is_railway_track(t) {
        return Some(FeatureType::Railway);
    }
    if tags::has_tag(t, "waterway") && tags::is_flowing_waterway(t) {
        return Some(FeatureType::Waterway);
    }
    None
}

pub fn feature_type_of(id: EntityId, graph: &Graph) -> Option<FeatureType> {
    graph.entity(id).and_then(|e| feature_type(e, graph))
}

/// The way itself, or the first parent relation that gives it a feature type.
pub fn tagged_entity_for_way<'a>(way: &'a Way, graph: &'a Graph) -> EntityRef<'a> {
    let entity = EntityRef::Way(way);
    if feature_type(entity, graph).is_none() {
        for relation in graph.parent_relations(way.id.into()) {
            let candidate = EntityRef::Relation(relation);
            if feature_type(candidate, graph).is_some() {
                return candidate;
            }
        }
    }
    entity
}

/// Ways whose segments should be checked on behalf of `entity`.
pub fn ways_to_check<'a>(id: EntityId, graph: &'a Graph) -> Vec<&'a Way> {
    let Some(entity) = graph.entity(id) else {
        return Vec::new();
    };
    if feature_type(entity, graph).is_none() {
        return Vec::new();
    }
    match entity {
        EntityRef::Way(way) => vec![way],
        EntityRef::Relation(relation) if tags::tag_is(&relation.tags, "type", "multipolygon") => {
            let mut ways: Vec<&Way> = Vec::new();
            for member in &relation.members {
                // role-less members count as outer
                if !matches!(member.role.as_str(), "" | "outer" | "inner") {
                    continue;
                }
                let EntityId::Way(way_id) = member.id else { continue };
                if let Some(way) = graph.way(way_id) {
                    if !ways.iter().any(|w| w.id == way.id) {
                        ways.push(way);
                    }
                }
            }
            ways
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;
    use crate::types::{tags, Relation, RelationId, Tags, WayId};

    fn classify(t: Tags) -> Option<FeatureType> {
        let graph = one_crossing(t, tags([]));
        feature_type_of(WayId(-1).into(), &graph)
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(classify(tags([("highway", "residential")])), Some(FeatureType::Highway));
        assert_eq!(classify(tags([("railway", "rail")])), Some(FeatureType::Railway));
        assert_eq!(classify(tags([("waterway", "stream")])), Some(FeatureType::Waterway));
        assert_eq!(classify(tags([("aeroway", "runway")])), Some(FeatureType::Aeroway));
        assert_eq!(classify(tags([("building", "yes")])), Some(FeatureType::Building));
    }

    #[test]
    fn skips_non_routable_values() {
        assert_eq!(classify(tags([("highway", "services")])), None);
        assert_eq!(classify(tags([("railway", "abandoned")])), None);
        assert_eq!(classify(tags([("waterway", "fuel")])), None);
        assert_eq!(classify(tags([("building", "no")])), None);
        assert_eq!(classify(tags([("building", "razed")])), None);
        assert_eq!(classify(tags([("aeroway", "apron")])), None);
    }

    #[test]
    fn railway_areas_have_no_type() {
        let graph = Graph::from_entities(
            vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 1.0, 1.0)],
            vec![way(1, &[1, 2, 3, 1], tags([("railway", "rail"), ("area", "yes")]))],
            vec![],
        );
        assert_eq!(feature_type_of(WayId(1).into(), &graph), None);
    }

    #[test]
    fn untagged_member_inherits_relation() {
        let graph = Graph::from_entities(
            vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 1.0, 1.0)],
            vec![way(1, &[1, 2, 3], tags([])), way(2, &[3, 1], tags([]))],
            vec![Relation::new(RelationId(7), vec![member(1, "outer"), member(2, "")])
                .with_tags(tags([("type", "multipolygon"), ("building", "yes")]))],
        );
        let w1 = graph.way(WayId(1)).unwrap();
        assert_eq!(tagged_entity_for_way(w1, &graph).id(), RelationId(7).into());
        assert_eq!(ways_to_check(RelationId(7).into(), &graph).len(), 2);
        assert!(ways_to_check(WayId(1).into(), &graph).is_empty());
    }
}
