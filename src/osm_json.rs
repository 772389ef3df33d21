use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::graph::Graph;
use crate::types::{EntityId, Location, Member, Node, NodeId, Relation, RelationId, Tags, Way, WayId};

fn malformed(element: &Value, what: &str) -> ParseError {
    ParseError::Malformed(format!("{} in {}", what, element))
}

fn parse_tags(element: &Value) -> Tags {
    match element.get("tags") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k.clone(), s.clone())),
                Value::Number(n) => Some((k.clone(), n.to_string())),
                _ => None,
            })
            .collect(),
        _ => Tags::new(),
    }
}

fn parse_member(member: &Value) -> Result<Member, ParseError> {
    let id = member["ref"].as_i64().ok_or_else(|| malformed(member, "member without ref"))?;
    let id = match member["type"].as_str() {
        Some("node") => EntityId::Node(NodeId(id)),
        Some("way") => EntityId::Way(WayId(id)),
        Some("relation") => EntityId::Relation(RelationId(id)),
        Some(other) => return Err(ParseError::UnknownType(other.to_string())),
        None => return Err(malformed(member, "member without type")),
    };
    let role = member["role"].as_str().unwrap_or_default().to_string();
    Ok(Member { id, role })
}

/// Builds a graph from an Overpass `[out:json]` response.
///
/// Elements may come in any order; ways are indexed only after every node
/// has been read.
pub fn parse_overpass(json: &str) -> Result<Graph, ParseError> {
    let json: Value = serde_json::from_str(json)?;
    let Value::Object(map) = &json else {
        return Err(ParseError::Malformed("response is not a JSON object".to_string()));
    };
    parse_elements(map)
}

fn parse_elements(map: &Map<String, Value>) -> Result<Graph, ParseError> {
    let elements = map
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::Malformed("missing elements array".to_string()))?;

    let mut nodes = Vec::new();
    let mut ways = Vec::new();
    let mut relations = Vec::new();
    for element in elements {
        let id = element["id"].as_i64().ok_or_else(|| malformed(element, "element without id"))?;
        match element["type"].as_str() {
            Some("node") => {
                let latitude = element["lat"].as_f64().ok_or_else(|| malformed(element, "node without lat"))?;
                let longitude = element["lon"].as_f64().ok_or_else(|| malformed(element, "node without lon"))?;
                nodes.push(Node::new(NodeId(id), Location { longitude, latitude }).with_tags(parse_tags(element)));
            }
            Some("way") => {
                let node_ids = element["nodes"]
                    .as_array()
                    .ok_or_else(|| malformed(element, "way without nodes"))?
                    .iter()
                    .map(|n| n.as_i64().map(NodeId).ok_or_else(|| malformed(element, "bad node ref")))
                    .collect::<Result<Vec<_>, _>>()?;
                ways.push(Way::new(WayId(id), node_ids).with_tags(parse_tags(element)));
            }
            Some("relation") => {
                let members = match element.get("members") {
                    Some(Value::Array(members)) => members.iter().map(parse_member).collect::<Result<Vec<_>, _>>()?,
                    _ => Vec::new(),
                };
                relations.push(Relation::new(RelationId(id), members).with_tags(parse_tags(element)));
            }
            Some(other) => return Err(ParseError::UnknownType(other.to_string())),
            None => return Err(malformed(element, "element without type")),
        }
    }

    log::debug!("Parsed {} nodes, {} ways, {} relations", nodes.len(), ways.len(), relations.len());
    Ok(Graph::from_entities(nodes, ways, relations))
}
