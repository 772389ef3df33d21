use std::f64::consts::PI;

use geo::Coord;

use super::Structure;
use crate::actions::{add_midpoint, change_tags, split};
use crate::config::ValidationConfig;
use crate::errors::{EditError, EditResult};
use crate::feature::{feature_type, feature_type_of, FeatureType};
use crate::geom::{distance_meters, project, unproject, vec_angle, vec_length};
use crate::graph::Graph;
use crate::issue::{IssueData, ValidationIssue};
use crate::tags::implied_line_width_m;
use crate::types::{Edge, EntityId, EntityRef, Geometry, Location, Node, NodeId, Tags, WayId};

/// Leading number of a tag value, so `"5 m"` reads as 5.
fn parse_leading_f64(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)))
        .map_or(value.len(), |(i, _)| i);
    value[..end].parse::<f64>().ok()
}

/// Span of a structure over a feature `crossed_width_m` wide, meeting it at
/// `crossing_angle` radians.
pub fn structure_length_m(crossed_width_m: f64, crossing_angle: f64, config: &ValidationConfig) -> f64 {
    let oblique = ((crossed_width_m / 2.0) / crossing_angle.sin()) * 2.0;
    let padded = oblique + config.structure_padding_m;
    if padded.is_nan() {
        return config.structure_max_length_m;
    }
    padded.clamp(config.structure_min_length_m, config.structure_max_length_m)
}

fn crossed_width_m(crossed: EntityRef<'_>, graph: &Graph, config: &ValidationConfig) -> f64 {
    let tags = crossed.tags();
    let width = tags
        .get("width")
        .and_then(|w| parse_leading_f64(w))
        .filter(|w| *w != 0.0 && w.is_finite())
        .or_else(|| implied_line_width_m(tags));

    match width {
        // bridges over rail span more than the track bed
        Some(w) if feature_type(crossed, graph) == Some(FeatureType::Railway) => w * 2.0,
        Some(w) => w,
        None => config.structure_fallback_length_m,
    }
}

/// Ends meeting at `node` over line ways that carry traffic.
fn intersection_edge_count(graph: &Graph, node: NodeId) -> usize {
    graph
        .parent_ways(node)
        .into_iter()
        .filter(|w| ["highway", "waterway", "railway", "aeroway"].iter().any(|k| w.tags.get(*k).is_some_and(|v| !v.is_empty())))
        .filter(|w| graph.geometry(w.id.into()) == Some(Geometry::Line))
        .map(|w| {
            w.nodes
                .iter()
                .filter(|&&n| n == node)
                .map(|_| {
                    let at_open_end = (w.first() == Some(node)) != (w.last() == Some(node));
                    if at_open_end { 1 } else { 2 }
                })
                .sum::<usize>()
        })
        .sum()
}

struct StructureBuilder<'a> {
    config: &'a ValidationConfig,
    crossing_loc: Location,
    projected_crossing: Coord<f64>,
    /// Planar metres per spherical metre along the selected edge.
    ratio: f64,
    half_length_m: f64,
    result_way_ids: Vec<WayId>,
}

impl StructureBuilder<'_> {
    fn loc_at(&self, angle: f64, distance_m: f64) -> Location {
        let d = distance_m * self.ratio;
        unproject(self.projected_crossing + Coord { x: angle.cos() * d, y: angle.sin() * d })
    }

    /// Picks or creates the structure end on `end_id`'s side and splits there.
    fn determine_endpoint(&mut self, graph: Graph, edge: Edge, end_id: NodeId, angle: f64) -> EditResult<(Graph, NodeId)> {
        let end_loc = graph.try_node(end_id)?.loc;
        let min_edge = self.config.min_edge_length_m;
        let to_end = distance_meters(&self.crossing_loc, &end_loc);

        let offset = if to_end - self.half_length_m > min_edge {
            Some(self.half_length_m)
        } else if intersection_edge_count(&graph, end_id) >= 3 && to_end - min_edge > min_edge {
            // leave a short plain segment before a junction
            Some(to_end - min_edge)
        } else {
            None
        };

        let mut graph = graph;
        let node_id = match offset {
            Some(d) => {
                let id = graph.new_node_id();
                let loc = self.loc_at(angle, d);
                graph = add_midpoint(&graph, loc, edge, Node::new(id, loc))?;
                id
            }
            None => end_id,
        };

        let (graph, created) = split(&graph, node_id, Some(self.result_way_ids.as_slice()))?;
        if let Some(&first) = created.first() {
            self.result_way_ids.push(first);
        }
        Ok((graph, node_id))
    }
}

/// Turns the part of the selected way around the crossing into a bridge or
/// tunnel. Returns the new graph and every way id the selected way became.
pub fn add_bridge_or_tunnel(
    graph: &Graph,
    issue: &ValidationIssue,
    selected_way: WayId,
    structure: Structure,
    config: &ValidationConfig,
) -> EditResult<(Graph, Vec<WayId>)> {
    let IssueData::CrossingWays { edges, .. } = &issue.data else {
        return Err(EditError::MissingEntity(selected_way.into()));
    };
    if let Some(&missing) = issue.entity_ids.iter().find(|&&id| !graph.has_entity(id)) {
        return Err(EditError::MissingEntity(missing));
    }
    let crossing_loc = issue.loc.ok_or(EditError::MissingEntity(selected_way.into()))?;
    graph.try_way(selected_way)?;

    let selected_first = issue.entity_ids.first() == Some(&EntityId::Way(selected_way));
    let (edge, crossed_edge, crossed_index) = if selected_first {
        (edges[0], edges[1], 1)
    } else {
        (edges[1], edges[0], 0)
    };
    let crossed_id = *issue
        .entity_ids
        .get(crossed_index)
        .ok_or(EditError::MissingEntity(selected_way.into()))?;

    let n0 = graph.try_node(edge[0])?.loc;
    let n1 = graph.try_node(edge[1])?.loc;
    let c0 = graph.try_node(crossed_edge[0])?.loc;
    let c1 = graph.try_node(crossed_edge[1])?.loc;
    let crossed = graph.entity(crossed_id).ok_or(EditError::MissingEntity(crossed_id))?;

    let (p0, p1) = (project(&n0), project(&n1));
    let a1 = vec_angle(p0, p1) + PI;
    let a2 = vec_angle(project(&c0), project(&c1)) + PI;
    let mut crossing_angle = a1.max(a2) - a1.min(a2);
    if crossing_angle > PI {
        crossing_angle -= PI;
    }
    let length_m = structure_length_m(crossed_width_m(crossed, graph, config), crossing_angle, config);

    let spherical = distance_meters(&n0, &n1);
    if spherical == 0.0 || !spherical.is_finite() {
        return Err(EditError::DegenerateGeometry(edge[0]));
    }
    let mut builder = StructureBuilder {
        config,
        crossing_loc,
        projected_crossing: project(&crossing_loc),
        ratio: vec_length(p0, p1) / spherical,
        half_length_m: length_m / 2.0,
        result_way_ids: vec![selected_way],
    };
    log::debug!("Adding a {:?} of {:.1} m to {}", structure, length_m, selected_way);

    let projected_angle = vec_angle(p0, p1);
    let (graph, end1) = builder.determine_endpoint(graph.clone(), edge, edge[1], projected_angle)?;
    let (graph, end2) = builder.determine_endpoint(graph, [edge[0], end1], edge[0], projected_angle + PI)?;

    let structure_way = builder
        .result_way_ids
        .iter()
        .filter_map(|&id| graph.way(id))
        .find(|w| w.contains(end1) && w.contains(end2))
        .ok_or(EditError::AmbiguousSplit(end1))?;

    let mut tags: Tags = structure_way.tags.clone();
    match structure {
        Structure::Bridge => {
            tags.insert("bridge".to_string(), "yes".to_string());
            tags.insert("layer".to_string(), "1".to_string());
        }
        Structure::Tunnel => {
            let is_waterway = feature_type_of(structure_way.id.into(), &graph) == Some(FeatureType::Waterway);
            let value = if is_waterway { "culvert" } else { "yes" };
            tags.insert("tunnel".to_string(), value.to_string());
            tags.insert("layer".to_string(), "-1".to_string());
        }
    }

    let graph = change_tags(&graph, structure_way.id.into(), tags)?;
    Ok((graph, builder.result_way_ids))
}
