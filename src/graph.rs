use std::collections::{BTreeSet, HashMap};

use crate::errors::{EditError, EditResult};
use crate::tags::suggests_area;
use crate::types::{
    EntityId, EntityRef, Geometry, Location, Node, NodeId, Relation, RelationId, Tags, Way, WayId,
};

/// One immutable version of the map data.
///
/// Edits go through `replace_*`/`remove_*` on an owned copy; callers keep
/// the old value around if they need the previous version.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    ways: HashMap<WayId, Way>,
    relations: HashMap<RelationId, Relation>,
    parent_ways: HashMap<NodeId, BTreeSet<WayId>>,
    parent_relations: HashMap<EntityId, BTreeSet<RelationId>>,
    // Most recently issued negative id
    last_new_id: i64,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(nodes: Vec<Node>, ways: Vec<Way>, relations: Vec<Relation>) -> Self {
        let mut graph = Graph::new();
        for node in nodes {
            graph.replace_node(node);
        }
        for way in ways {
            graph.replace_way(way);
        }
        for relation in relations {
            graph.replace_relation(relation);
        }
        graph
    }

    // ** Lookup **

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        match id {
            EntityId::Node(id) => self.node(id).map(EntityRef::Node),
            EntityId::Way(id) => self.way(id).map(EntityRef::Way),
            EntityId::Relation(id) => self.relation(id).map(EntityRef::Relation),
        }
    }

    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entity(id).is_some()
    }

    pub fn try_node(&self, id: NodeId) -> EditResult<&Node> {
        self.node(id).ok_or(EditError::MissingEntity(id.into()))
    }

    pub fn try_way(&self, id: WayId) -> EditResult<&Way> {
        self.way(id).ok_or(EditError::MissingEntity(id.into()))
    }

    /// Every entity id, sorted, so passes over the graph are deterministic.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .nodes
            .keys()
            .map(|&id| EntityId::Node(id))
            .chain(self.ways.keys().map(|&id| EntityId::Way(id)))
            .chain(self.relations.keys().map(|&id| EntityId::Relation(id)))
            .collect();
        ids.sort();
        ids
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.ways.values()
    }

    /// Nodes of a way in order; ids missing from the graph are skipped.
    pub fn child_nodes(&self, way: &Way) -> Vec<&Node> {
        way.nodes.iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    pub fn parent_ways(&self, node: NodeId) -> Vec<&Way> {
        self.parent_ways
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.ways.get(id))
            .collect()
    }

    pub fn parent_relations(&self, entity: EntityId) -> Vec<&Relation> {
        self.parent_relations
            .get(&entity)
            .into_iter()
            .flatten()
            .filter_map(|id| self.relations.get(id))
            .collect()
    }

    pub fn geometry(&self, id: EntityId) -> Option<Geometry> {
        let geometry = match self.entity(id)? {
            EntityRef::Node(n) => {
                if self.parent_ways.get(&n.id).is_some_and(|p| !p.is_empty()) {
                    Geometry::Vertex
                } else {
                    Geometry::Point
                }
            }
            EntityRef::Way(w) => {
                if is_area(w) {
                    Geometry::Area
                } else {
                    Geometry::Line
                }
            }
            EntityRef::Relation(r) => {
                if r.tags.get("type").is_some_and(|t| t == "multipolygon") {
                    Geometry::Area
                } else {
                    Geometry::Relation
                }
            }
        };
        Some(geometry)
    }

    // ** Mutation of an owned version **

    pub fn replace_node(&mut self, node: Node) {
        self.note_id(node.id.0);
        self.nodes.insert(node.id, node);
    }

    pub fn replace_way(&mut self, way: Way) {
        self.note_id(way.id.0);
        if let Some(old) = self.ways.get(&way.id) {
            for n in old.nodes.clone() {
                if let Some(parents) = self.parent_ways.get_mut(&n) {
                    parents.remove(&way.id);
                }
            }
        }
        for &n in &way.nodes {
            self.parent_ways.entry(n).or_default().insert(way.id);
        }
        self.ways.insert(way.id, way);
    }

    pub fn replace_relation(&mut self, relation: Relation) {
        self.note_id(relation.id.0);
        if let Some(old) = self.relations.get(&relation.id) {
            for m in old.members.clone() {
                if let Some(parents) = self.parent_relations.get_mut(&m.id) {
                    parents.remove(&relation.id);
                }
            }
        }
        for m in &relation.members {
            self.parent_relations.entry(m.id).or_default().insert(relation.id);
        }
        self.relations.insert(relation.id, relation);
    }

    /// Removes a node that no way references any more.
    pub fn remove_node(&mut self, id: NodeId) {
        self.nodes.remove(&id);
        self.parent_ways.remove(&id);
        self.parent_relations.remove(&EntityId::Node(id));
    }

    pub fn remove_way(&mut self, id: WayId) {
        if let Some(old) = self.ways.remove(&id) {
            for n in old.nodes {
                if let Some(parents) = self.parent_ways.get_mut(&n) {
                    parents.remove(&id);
                }
            }
        }
        self.parent_relations.remove(&EntityId::Way(id));
    }

    pub fn remove_relation(&mut self, id: RelationId) {
        if let Some(old) = self.relations.remove(&id) {
            for m in old.members {
                if let Some(parents) = self.parent_relations.get_mut(&m.id) {
                    parents.remove(&id);
                }
            }
        }
        self.parent_relations.remove(&EntityId::Relation(id));
    }

    pub fn set_tags(&mut self, id: EntityId, tags: Tags) -> EditResult<()> {
        match id {
            EntityId::Node(nid) => self.nodes.get_mut(&nid).map(|n| n.tags = tags),
            EntityId::Way(wid) => self.ways.get_mut(&wid).map(|w| w.tags = tags),
            EntityId::Relation(rid) => self.relations.get_mut(&rid).map(|r| r.tags = tags),
        }
        .ok_or(EditError::MissingEntity(id))
    }

    pub fn move_node(&mut self, id: NodeId, loc: Location) -> EditResult<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditError::MissingEntity(id.into()))?;
        node.loc = loc;
        Ok(())
    }

    // ** Fresh ids for new entities **

    fn note_id(&mut self, id: i64) {
        if id < self.last_new_id {
            self.last_new_id = id;
        }
    }

    fn next_id(&mut self) -> i64 {
        self.last_new_id -= 1;
        self.last_new_id
    }

    pub fn new_node_id(&mut self) -> NodeId {
        NodeId(self.next_id())
    }

    pub fn new_way_id(&mut self) -> WayId {
        WayId(self.next_id())
    }
}

fn is_area(way: &Way) -> bool {
    match way.tags.get("area").map(String::as_str) {
        Some("yes") => true,
        Some("no") => false,
        _ => way.is_closed() && suggests_area(&way.tags),
    }
}
