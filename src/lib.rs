use wasm_bindgen::prelude::*;
use log::Level;
use serde_json::{Map, Value as JsonValue};

use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

pub mod actions;
pub mod config;
pub mod detect;
pub mod editor;
pub mod errors;
pub mod feature;
pub mod fixes;
pub mod geom;
pub mod graph;
pub mod issue;
pub mod osm_json;
pub mod rules;
pub mod spatial;
pub mod tags;
pub mod types;
pub mod validator;

use self::config::ValidationConfig;
use self::graph::Graph;
use self::issue::ValidationIssue;
use self::types::{EntityRef, Location};
use self::validator::Validator;

#[wasm_bindgen]
pub fn rust_init() {
    // a second call only finds the logger already installed
    if console_log::init_with_level(Level::Error).is_ok() {
        log::info!("Logger initialized from library");
    }
}

/// Where to draw an issue: its own location, or the middle of its first way.
fn issue_location(issue: &ValidationIssue, graph: &Graph) -> Option<Location> {
    if let Some(loc) = issue.loc {
        return Some(loc);
    }
    let Some(EntityRef::Way(way)) = graph.entity(*issue.entity_ids.first()?) else {
        return None;
    };
    let first = graph.node(way.first()?)?;
    let last = graph.node(way.last()?)?;
    Some(Location::new(
        (first.loc.longitude + last.loc.longitude) / 2.0,
        (first.loc.latitude + last.loc.latitude) / 2.0,
    ))
}

fn issue_properties(issue: &ValidationIssue) -> Result<Map<String, JsonValue>, serde_json::Error> {
    let mut properties = Map::new();
    properties.insert("id".to_string(), JsonValue::from(issue.id()));
    properties.insert("type".to_string(), JsonValue::from(issue.issue_type.as_str()));
    properties.insert("subtype".to_string(), JsonValue::from(issue.subtype.clone()));
    properties.insert("severity".to_string(), serde_json::to_value(issue.severity)?);
    let entity_ids: Vec<String> = issue.entity_ids.iter().map(|id| id.to_string()).collect();
    properties.insert("entity_ids".to_string(), JsonValue::from(entity_ids));
    properties.insert("data".to_string(), serde_json::to_value(&issue.data)?);
    properties.insert("auto_fix".to_string(), serde_json::to_value(&issue.auto_fix)?);
    Ok(properties)
}

/// One point feature per issue, with a bbox around all of them.
pub fn issues_to_geojson(issues: &[ValidationIssue], graph: &Graph) -> Result<String, serde_json::Error> {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let mut features = Vec::with_capacity(issues.len());
    for issue in issues {
        let geometry = issue_location(issue, graph).map(|loc| {
            min_x = min_x.min(loc.longitude);
            min_y = min_y.min(loc.latitude);
            max_x = max_x.max(loc.longitude);
            max_y = max_y.max(loc.latitude);
            Geometry::new(Value::Point(loc.to_tuple().to_vec()))
        });
        features.push(Feature {
            geometry,
            properties: Some(issue_properties(issue)?),
            ..Default::default()
        });
    }

    let bbox = (min_x <= max_x).then(|| vec![min_x, min_y, max_x, max_y]);
    let geojson = GeoJson::FeatureCollection(FeatureCollection {
        bbox,
        features,
        foreign_members: None,
    });
    serde_json::to_string(&geojson)
}

/// Parses an Overpass response, validates every way and relation in it and
/// returns the issues as GeoJSON.
pub fn validate_osm_json(osm_json: &str, config: ValidationConfig) -> Result<String, String> {
    let graph = osm_json::parse_overpass(osm_json).map_err(|e| e.to_string())?;
    let issues = Validator::new(config).validate_graph(&graph);
    log::info!("Found {} issues", issues.len());
    issues_to_geojson(&issues, &graph).map_err(|e| e.to_string())
}

#[wasm_bindgen]
pub fn validate_crossings(osm_json: String, config: JsValue) -> Result<String, JsValue> {
    let config: ValidationConfig = if config.is_undefined() || config.is_null() {
        ValidationConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)?
    };
    validate_osm_json(&osm_json, config).map_err(|e| JsValue::from_str(&e))
}
