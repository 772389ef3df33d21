//! OSM tag vocabularies used by the crossing rules.

use crate::types::Tags;

pub const ROUTABLE_AEROWAY_VALUES: &[&str] = &["runway", "taxiway"];

pub const ROUTABLE_HIGHWAY_VALUES: &[&str] = &[
    "motorway", "trunk", "primary", "secondary", "tertiary", "residential",
    "motorway_link", "trunk_link", "primary_link", "secondary_link", "tertiary_link",
    "unclassified", "road", "service", "track", "living_street", "bus_guideway", "busway",
    "path", "footway", "cycleway", "bridleway", "pedestrian", "corridor", "steps", "ladder",
];

pub const PATH_HIGHWAY_VALUES: &[&str] = &[
    "path", "footway", "cycleway", "bridleway", "pedestrian", "corridor", "steps", "ladder",
];

pub const RAILWAY_TRACK_VALUES: &[&str] = &[
    "rail", "light_rail", "tram", "subway", "monorail", "funicular",
    "miniature", "narrow_gauge", "disused", "preserved",
];

pub const FLOWING_WATERWAY_VALUES: &[&str] = &[
    "canal", "ditch", "drain", "fish_pass", "river", "stream", "tidal_channel",
];

/// Road classes that never get a ford suggestion.
pub const MAJOR_HIGHWAY_VALUES: &[&str] = &[
    "motorway", "motorway_link", "trunk", "trunk_link",
    "primary", "primary_link",
];

/// Highway values a crossing way is drawn with (`highway=<v>` + `<v>=crossing`).
pub const CROSSING_PATH_VALUES: &[&str] = &["path", "footway", "cycleway", "bridleway", "pedestrian"];

pub const ROAD_HIGHWAY_VALUES: &[&str] = &[
    "motorway", "trunk", "primary", "secondary", "tertiary", "residential",
    "motorway_link", "trunk_link", "primary_link", "secondary_link", "tertiary_link",
    "unclassified", "road", "service", "track", "living_street", "bus_guideway", "busway",
];

const IGNORED_BUILDING_VALUES: &[&str] = &["demolished", "dismantled", "proposed", "razed"];

const UNINTERESTING_KEYS: &[&str] = &["attribution", "created_by", "source", "odbl", "area", "area:highway"];

/// Keys whose presence on a closed way makes it an area, minus values that stay lines.
const AREA_KEYS: &[(&str, &[&str])] = &[
    ("building", &[]),
    ("landuse", &[]),
    ("leisure", &["track", "slipway"]),
    ("amenity", &[]),
    ("shop", &[]),
    ("tourism", &[]),
    ("place", &[]),
    ("historic", &[]),
    ("military", &["trench"]),
    ("man_made", &["pier", "breakwater", "groyne", "embankment", "dyke", "cutline", "pipeline"]),
    ("natural", &["coastline", "cliff", "ridge", "arete", "tree_row", "earth_bank", "valley"]),
    ("aeroway", &["runway", "taxiway", "jet_bridge", "parking_position"]),
    ("power", &["line", "minor_line", "cable"]),
    ("area:highway", &[]),
];

/// Highway/railway/waterway values that make a closed way an area despite the key being linear.
const AREA_EXCEPTIONS: &[(&str, &[&str])] = &[
    ("highway", &["rest_area", "services", "platform"]),
    ("railway", &["platform", "roundhouse", "station", "turntable"]),
    ("waterway", &["dam", "riverbank", "boatyard", "dock"]),
    ("public_transport", &["platform", "station"]),
];

/// Typical carriageway width per lane or bed width, in metres.
const IMPLIED_WIDTHS: &[(&str, &[(&str, f64)])] = &[
    ("highway", &[
        ("motorway", 5.0), ("motorway_link", 3.0), ("trunk", 4.5), ("trunk_link", 3.0),
        ("primary", 4.0), ("secondary", 4.0), ("tertiary", 4.0),
        ("primary_link", 3.0), ("secondary_link", 3.0), ("tertiary_link", 3.0),
        ("unclassified", 4.0), ("road", 4.0), ("living_street", 4.0),
        ("bus_guideway", 4.0), ("busway", 4.0), ("pedestrian", 4.0),
        ("residential", 3.5), ("service", 3.5), ("track", 3.0),
        ("cycleway", 2.5), ("bridleway", 2.0), ("corridor", 2.0), ("steps", 2.0),
        ("path", 1.5), ("footway", 1.5), ("ladder", 0.5),
    ]),
    ("railway", &[
        ("rail", 2.5), ("light_rail", 2.5), ("tram", 2.5), ("subway", 2.5),
        ("monorail", 2.5), ("funicular", 2.5), ("disused", 2.5), ("preserved", 2.5),
        ("miniature", 1.5), ("narrow_gauge", 1.5),
    ]),
    ("waterway", &[
        ("river", 50.0), ("canal", 25.0), ("stream", 5.0), ("tidal_channel", 5.0),
        ("fish_pass", 2.5), ("drain", 2.5), ("ditch", 1.5),
    ]),
];

/// A tag counts when it is set to anything other than `no`.
pub fn has_tag(tags: &Tags, key: &str) -> bool {
    matches!(tags.get(key), Some(v) if v != "no")
}

pub fn tag_is(tags: &Tags, key: &str, value: &str) -> bool {
    tags.get(key).is_some_and(|v| v == value)
}

fn value_in(tags: &Tags, key: &str, values: &[&str]) -> bool {
    tags.get(key).is_some_and(|v| values.contains(&v.as_str()))
}

pub fn is_routable_aeroway(tags: &Tags) -> bool {
    value_in(tags, "aeroway", ROUTABLE_AEROWAY_VALUES)
}

pub fn is_routable_highway(tags: &Tags) -> bool {
    value_in(tags, "highway", ROUTABLE_HIGHWAY_VALUES)
}

pub fn is_path_highway(tags: &Tags) -> bool {
    value_in(tags, "highway", PATH_HIGHWAY_VALUES)
}

pub fn is_road_highway(tags: &Tags) -> bool {
    value_in(tags, "highway", ROAD_HIGHWAY_VALUES)
}

pub fn is_major_highway(tags: &Tags) -> bool {
    value_in(tags, "highway", MAJOR_HIGHWAY_VALUES)
}

pub fn is_railway_track(tags: &Tags) -> bool {
    value_in(tags, "railway", RAILWAY_TRACK_VALUES)
}

pub fn is_flowing_waterway(tags: &Tags) -> bool {
    value_in(tags, "waterway", FLOWING_WATERWAY_VALUES)
}

pub fn is_building(tags: &Tags) -> bool {
    has_tag(tags, "building") && !value_in(tags, "building", IGNORED_BUILDING_VALUES)
}

pub fn is_indoor(tags: &Tags) -> bool {
    has_tag(tags, "indoor") || has_tag(tags, "level") || tag_is(tags, "highway", "corridor")
}

/// `highway=footway` + `footway=crossing` and friends.
pub fn is_crossing_way(tags: &Tags) -> bool {
    CROSSING_PATH_VALUES
        .iter()
        .any(|k| tag_is(tags, "highway", k) && tag_is(tags, k, "crossing"))
}

/// `highway=crossing` (possibly among `;` values) or any `railway=*crossing*`.
pub fn is_crossing_node(tags: &Tags) -> bool {
    let highway_crossing = tags
        .get("highway")
        .is_some_and(|v| v.split(';').any(|part| part == "crossing"));
    highway_crossing || tags.get("railway").is_some_and(|v| v.contains("crossing"))
}

/// Crossing ways that are expected to end at kerbs.
pub fn is_kerbed_crossing_way(tags: &Tags) -> bool {
    (tag_is(tags, "highway", "footway") && tag_is(tags, "footway", "crossing"))
        || (tag_is(tags, "highway", "cycleway") && tag_is(tags, "cycleway", "crossing"))
}

pub fn is_kerb_node(tags: &Tags) -> bool {
    tags.contains_key("kerb") || tag_is(tags, "barrier", "kerb")
}

pub fn has_interesting_tags(tags: &Tags) -> bool {
    tags.keys().any(|k| {
        !UNINTERESTING_KEYS.contains(&k.as_str()) && !k.starts_with("source:") && !k.starts_with("tiger:")
    })
}

/// Whether the tags alone would make a closed way an area.
pub fn suggests_area(tags: &Tags) -> bool {
    let by_key = AREA_KEYS.iter().any(|(key, line_values)| {
        tags.get(*key)
            .is_some_and(|v| v != "no" && !line_values.contains(&v.as_str()))
    });
    by_key || AREA_EXCEPTIONS.iter().any(|(key, values)| value_in(tags, key, values))
}

/// Layer with the `"0"` default; compared as a string on purpose.
pub fn layer(tags: &Tags) -> &str {
    tags.get("layer").map(String::as_str).filter(|v| !v.is_empty()).unwrap_or("0")
}

pub fn level(tags: &Tags) -> &str {
    tags.get("level").map(String::as_str).filter(|v| !v.is_empty()).unwrap_or("0")
}

/// Approximate rendered width of a linear feature, from its classification and lane count.
pub fn implied_line_width_m(tags: &Tags) -> Option<f64> {
    for (key, widths) in IMPLIED_WIDTHS {
        let Some(value) = tags.get(*key) else { continue };
        let Some((_, width)) = widths.iter().find(|(v, _)| *v == value.as_str()) else { continue };
        if *key == "highway" {
            let lanes = tags
                .get("lanes")
                .and_then(|l| l.trim().parse::<u32>().ok())
                .filter(|l| *l > 0)
                .unwrap_or(if is_one_way(tags) { 1 } else { 2 });
            return Some(width * lanes as f64);
        }
        return Some(*width);
    }
    None
}

fn is_one_way(tags: &Tags) -> bool {
    match tags.get("oneway").map(String::as_str) {
        Some("yes") | Some("1") | Some("-1") | Some("reversible") | Some("alternating") => true,
        Some("no") => false,
        _ => {
            tag_is(tags, "junction", "roundabout")
                || tag_is(tags, "highway", "motorway")
                || tag_is(tags, "waterway", "river")
                || tag_is(tags, "waterway", "stream")
        }
    }
}

/// Merges `other` into `tags`; differing values are joined with `;`.
pub fn merge_tags(tags: &mut Tags, other: &Tags) {
    for (k, v) in other {
        match tags.get_mut(k) {
            None => {
                tags.insert(k.clone(), v.clone());
            }
            Some(existing) if existing == v => {}
            Some(existing) => {
                let joined = {
                    let mut values: Vec<&str> = existing.split(';').chain(v.split(';')).collect();
                    values.sort_unstable();
                    values.dedup();
                    values.join(";")
                };
                *existing = joined;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tags;

    #[test]
    fn has_tag_ignores_no() {
        assert!(has_tag(&tags([("bridge", "yes")]), "bridge"));
        assert!(has_tag(&tags([("bridge", "viaduct")]), "bridge"));
        assert!(!has_tag(&tags([("bridge", "no")]), "bridge"));
        assert!(!has_tag(&tags([]), "bridge"));
    }

    #[test]
    fn crossing_ways_need_matching_subkey() {
        assert!(is_crossing_way(&tags([("highway", "footway"), ("footway", "crossing")])));
        assert!(is_crossing_way(&tags([("highway", "cycleway"), ("cycleway", "crossing")])));
        assert!(!is_crossing_way(&tags([("highway", "footway"), ("cycleway", "crossing")])));
        assert!(!is_crossing_way(&tags([("highway", "footway"), ("footway", "sidewalk")])));
    }

    #[test]
    fn crossing_nodes_handle_multivalues() {
        assert!(is_crossing_node(&tags([("highway", "traffic_signals;crossing")])));
        assert!(is_crossing_node(&tags([("railway", "level_crossing")])));
        assert!(!is_crossing_node(&tags([("highway", "stop")])));
    }

    #[test]
    fn implied_width_uses_lanes() {
        assert_eq!(implied_line_width_m(&tags([("highway", "residential")])), Some(7.0));
        assert_eq!(implied_line_width_m(&tags([("highway", "residential"), ("lanes", "3")])), Some(10.5));
        assert_eq!(implied_line_width_m(&tags([("highway", "residential"), ("oneway", "yes")])), Some(3.5));
        assert_eq!(implied_line_width_m(&tags([("railway", "rail")])), Some(2.5));
        assert_eq!(implied_line_width_m(&tags([("waterway", "river")])), Some(50.0));
        assert_eq!(implied_line_width_m(&tags([("building", "yes")])), None);
    }

    #[test]
    fn interesting_tags_skip_metadata() {
        assert!(!has_interesting_tags(&tags([("source", "survey"), ("tiger:cfcc", "A41")])));
        assert!(has_interesting_tags(&tags([("barrier", "kerb")])));
    }

    #[test]
    fn merge_joins_conflicts() {
        let mut merged = tags([("highway", "crossing"), ("crossing", "zebra")]);
        merge_tags(&mut merged, &tags([("crossing", "marked"), ("kerb", "lowered")]));
        assert_eq!(merged["crossing"], "marked;zebra");
        assert_eq!(merged["kerb"], "lowered");
        assert_eq!(merged["highway"], "crossing");
    }
}
