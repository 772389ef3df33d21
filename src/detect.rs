use std::collections::HashSet;

use crate::feature::{feature_type, tagged_entity_for_way, FeatureType};
use crate::geom::line_intersection;
use crate::graph::Graph;
use crate::rules::is_legit_crossing;
use crate::spatial::SpatialIndex;
use crate::types::{Edge, Extent, Location, Way, WayId};

/// One side of a crossing.
#[derive(Clone, Debug, PartialEq)]
pub struct WayInfo {
    pub way_id: WayId,
    pub feature_type: FeatureType,
    pub edge: Edge,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Crossing {
    pub way_infos: [WayInfo; 2],
    pub cross_point: Location,
}

/// Finds every problematic crossing between `way` and other ways.
///
/// Results follow the way's own node order. Pure: the same way and graph
/// always give the same crossings.
pub fn detect_problem_crossings(way: &Way, graph: &Graph, index: &dyn SpatialIndex) -> Vec<Crossing> {
    let entity1 = tagged_entity_for_way(way, graph);
    let Some(type1) = feature_type(entity1, graph) else {
        return Vec::new();
    };
    let tags1 = entity1.tags();

    let mut seen_way_ids: HashSet<WayId> = HashSet::new();
    let mut crossings = Vec::new();

    for edge in way.edges() {
        // a dangling ref breaks the edge rather than bridging over it
        let (Some(n1), Some(n2)) = (graph.node(edge[0]), graph.node(edge[1])) else {
            continue;
        };
        if n1.loc == n2.loc {
            continue;
        }
        let extent = Extent::from_corners(n1.loc, n2.loc);

        for segment in index.way_segments(&extent, graph) {
            // self-intersections are a different check
            if segment.way_id == way.id {
                continue;
            }
            if seen_way_ids.contains(&segment.way_id) {
                continue;
            }
            let [a_id, b_id] = segment.nodes;
            if a_id == n1.id || a_id == n2.id || b_id == n1.id || b_id == n2.id {
                continue;
            }
            let Some(way2) = graph.way(segment.way_id) else { continue };

            let entity2 = tagged_entity_for_way(way2, graph);
            let Some(type2) = feature_type(entity2, graph) else { continue };
            if is_legit_crossing(tags1, type1, entity2.tags(), type2) {
                continue;
            }

            let (Some(a), Some(b)) = (graph.node(a_id), graph.node(b_id)) else { continue };
            let Some(point) = line_intersection([n1.loc, n2.loc], [a.loc, b.loc]) else {
                continue;
            };

            crossings.push(Crossing {
                way_infos: [
                    WayInfo { way_id: way.id, feature_type: type1, edge: [n1.id, n2.id] },
                    WayInfo { way_id: way2.id, feature_type: type2, edge: [a_id, b_id] },
                ],
                cross_point: point,
            });

            // building outlines get one issue per way pair
            if type1 == FeatureType::Building || type2 == FeatureType::Building {
                seen_way_ids.insert(way2.id);
            }
        }
    }

    log::debug!("Way {} has {} problem crossings", way.id, crossings.len());
    crossings
}
