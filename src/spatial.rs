use rstar::{RTree, RTreeObject, AABB};

use crate::graph::Graph;
use crate::types::{Edge, Extent, WayId};

/// One edge of one way, as returned by a spatial query.
#[derive(Clone, Debug, PartialEq)]
pub struct WaySegment {
    pub way_id: WayId,
    pub nodes: Edge,
}

/// Finds the way segments whose bounding boxes overlap an extent.
pub trait SpatialIndex {
    fn way_segments(&self, extent: &Extent, graph: &Graph) -> Vec<WaySegment>;
}

struct IndexedSegment {
    segment: WaySegment,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over every segment of every way in a graph version.
pub struct SegmentTree {
    tree: RTree<IndexedSegment>,
}

impl SegmentTree {
    pub fn new(graph: &Graph) -> Self {
        let mut segments = Vec::new();
        for way in graph.ways() {
            for edge in way.edges() {
                let (Some(a), Some(b)) = (graph.node(edge[0]), graph.node(edge[1])) else {
                    continue;
                };
                let extent = Extent::from_corners(a.loc, b.loc);
                segments.push(IndexedSegment {
                    segment: WaySegment { way_id: way.id, nodes: edge },
                    envelope: to_aabb(&extent),
                });
            }
        }
        log::debug!("Indexed {} way segments", segments.len());
        SegmentTree { tree: RTree::bulk_load(segments) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

fn to_aabb(extent: &Extent) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [extent.min.longitude, extent.min.latitude],
        [extent.max.longitude, extent.max.latitude],
    )
}

impl SpatialIndex for SegmentTree {
    /// Segments are checked against `graph` so a stale tree never yields edges that no longer exist.
    fn way_segments(&self, extent: &Extent, graph: &Graph) -> Vec<WaySegment> {
        let mut found: Vec<WaySegment> = self
            .tree
            .locate_in_envelope_intersecting(&to_aabb(extent))
            .filter(|indexed| {
                graph
                    .way(indexed.segment.way_id)
                    .is_some_and(|way| way.edges().any(|e| e == indexed.segment.nodes))
            })
            .map(|indexed| indexed.segment.clone())
            .collect();
        // R-tree iteration order is not meaningful; keep results reproducible
        found.sort_by_key(|s| (s.way_id, s.nodes));
        found
    }
}
