use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ** Coordinates **

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Location { longitude, latitude }
    }

    pub fn to_coord(self) -> Coord<f64> {
        Coord { x: self.longitude, y: self.latitude }
    }

    pub fn to_tuple(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

impl From<Coord<f64>> for Location {
    fn from(c: Coord<f64>) -> Self {
        Location { longitude: c.x, latitude: c.y }
    }
}

/// Axis-aligned lon/lat box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Location,
    pub max: Location,
}

impl Extent {
    pub fn from_corners(a: Location, b: Location) -> Self {
        Extent {
            min: Location::new(a.longitude.min(b.longitude), a.latitude.min(b.latitude)),
            max: Location::new(a.longitude.max(b.longitude), a.latitude.max(b.latitude)),
        }
    }
}

// ** OSM data types **

pub type OsmId = i64;
pub type Tags = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub OsmId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WayId(pub OsmId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationId(pub OsmId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum EntityId {
    Node(NodeId),
    Way(WayId),
    Relation(RelationId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Node(id) => id.fmt(f),
            EntityId::Way(id) => id.fmt(f),
            EntityId::Relation(id) => id.fmt(f),
        }
    }
}

impl From<NodeId> for EntityId {
    fn from(id: NodeId) -> Self {
        EntityId::Node(id)
    }
}

impl From<WayId> for EntityId {
    fn from(id: WayId) -> Self {
        EntityId::Way(id)
    }
}

impl From<RelationId> for EntityId {
    fn from(id: RelationId) -> Self {
        EntityId::Relation(id)
    }
}

/// Two adjacent node ids of a way.
pub type Edge = [NodeId; 2];

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub loc: Location,
    pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub id: EntityId,
    pub role: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    pub id: RelationId,
    pub members: Vec<Member>,
    pub tags: Tags,
}

/// Borrowed view over any entity in a graph.
#[derive(Clone, Copy, Debug)]
pub enum EntityRef<'a> {
    Node(&'a Node),
    Way(&'a Way),
    Relation(&'a Relation),
}

impl<'a> EntityRef<'a> {
    pub fn id(&self) -> EntityId {
        match self {
            EntityRef::Node(n) => n.id.into(),
            EntityRef::Way(w) => w.id.into(),
            EntityRef::Relation(r) => r.id.into(),
        }
    }

    pub fn tags(&self) -> &'a Tags {
        match self {
            EntityRef::Node(n) => &n.tags,
            EntityRef::Way(w) => &w.tags,
            EntityRef::Relation(r) => &r.tags,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&'a str> {
        self.tags().get(key).map(String::as_str)
    }
}

/// What an entity looks like when drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Geometry {
    Point,
    Vertex,
    Line,
    Area,
    Relation,
}

impl Node {
    pub fn new(id: NodeId, loc: Location) -> Self {
        Node { id, loc, tags: Tags::new() }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

impl Way {
    pub fn new(id: WayId, nodes: Vec<NodeId>) -> Self {
        Way { id, nodes, tags: Tags::new() }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.first() == self.last()
    }

    pub fn is_degenerate(&self) -> bool {
        let mut unique = self.nodes.clone();
        unique.sort();
        unique.dedup();
        unique.len() < if self.is_closed() { 3 } else { 2 }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.nodes.windows(2).map(|pair| [pair[0], pair[1]])
    }

    /// Index of the first node of `edge`, in either direction.
    pub fn edge_position(&self, edge: &Edge) -> Option<usize> {
        self.edges()
            .position(|[a, b]| (a == edge[0] && b == edge[1]) || (a == edge[1] && b == edge[0]))
    }

    /// Replaces `needle` with `replacement` everywhere, then drops consecutive duplicates.
    pub fn replace_node(&mut self, needle: NodeId, replacement: NodeId) {
        for id in self.nodes.iter_mut() {
            if *id == needle {
                *id = replacement;
            }
        }
        self.nodes.dedup();
    }
}

impl Relation {
    pub fn new(id: RelationId, members: Vec<Member>) -> Self {
        Relation { id, members, tags: Tags::new() }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }
}

/// Builds a tag map from literal pairs.
pub fn tags<const N: usize>(pairs: [(&str, &str); N]) -> Tags {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
