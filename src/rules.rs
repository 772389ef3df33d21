//! Tagging conventions deciding whether two features may cross, and how to join them.

use crate::feature::FeatureType;
use crate::tags::{self, has_tag, is_indoor, layer, level, tag_is};
use crate::types::{tags as tag_map, Tags};

/// Tags for a junction node.
///
/// `None` means the features must not be joined; an empty map means they may
/// be joined with an untagged node.
pub type ConnectionTags = Option<Tags>;

/// Whether a crossing between the two features is fine as tagged.
///
/// Evaluated in the order the features were found, not in sorted order.
pub fn is_legit_crossing(tags1: &Tags, type1: FeatureType, tags2: &Tags, type2: FeatureType) -> bool {
    // indoor features on different levels
    if is_indoor(tags1) && is_indoor(tags2) && level(tags1) != level(tags2) {
        return true;
    }

    let layer1 = layer(tags1);
    let layer2 = layer(tags2);

    // highways on different layers, whatever their structure tags
    if type1 == FeatureType::Highway && type2 == FeatureType::Highway && layer1 != layer2 {
        return true;
    }

    let bridge1 = type1.allows_bridge() && has_tag(tags1, "bridge");
    let bridge2 = type2.allows_bridge() && has_tag(tags2, "bridge");
    if bridge1 != bridge2 {
        return true;
    }
    if bridge1 && bridge2 && layer1 != layer2 {
        return true;
    }

    let tunnel1 = type1.allows_tunnel() && has_tag(tags1, "tunnel");
    let tunnel2 = type2.allows_tunnel() && has_tag(tags2, "tunnel");
    if tunnel1 != tunnel2 {
        return true;
    }
    if tunnel1 && tunnel2 && layer1 != layer2 {
        return true;
    }

    if type1 == FeatureType::Waterway && type2 == FeatureType::Highway && tag_is(tags2, "man_made", "pier") {
        return true;
    }
    if type2 == FeatureType::Waterway && type1 == FeatureType::Highway && tag_is(tags1, "man_made", "pier") {
        return true;
    }

    (type1 == FeatureType::Building || type2 == FeatureType::Building) && layer1 != layer2
}

/// One side of a potential junction: its tags, type and whether it is drawn as a line.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionSide<'a> {
    pub tags: &'a Tags,
    pub feature_type: FeatureType,
    pub is_line: bool,
}

/// Suggested junction tags, independent of which side is passed first.
pub fn connection_tags(a: ConnectionSide<'_>, b: ConnectionSide<'_>) -> ConnectionTags {
    use FeatureType::*;

    let (first, second) = if a.feature_type <= b.feature_type { (a, b) } else { (b, a) };
    let both_lines = first.is_line && second.is_line;
    let either = |f: fn(&Tags) -> bool| f(first.tags) || f(second.tags);

    match (first.feature_type, second.feature_type) {
        (Aeroway, Aeroway) | (Railway, Railway) | (Waterway, Waterway) => Some(Tags::new()),

        (Aeroway, Highway) => {
            let is_service = either(|t| tag_is(t, "highway", "service"));
            if is_service || either(tags::is_path_highway) {
                Some(Tags::new())
            } else {
                Some(tag_map([("aeroway", "aircraft_crossing")]))
            }
        }
        (Aeroway, Railway) => Some(tag_map([("aeroway", "aircraft_crossing"), ("railway", "level_crossing")])),
        (Aeroway, Waterway) | (Railway, Waterway) => None,

        (Highway, Highway) => {
            let path1 = tags::is_path_highway(first.tags);
            let path2 = tags::is_path_highway(second.tags);
            if path1 == path2 {
                // road-road or path-path
                return Some(Tags::new());
            }
            let road = if path1 { second } else { first };
            if !both_lines || tag_is(road.tags, "highway", "track") {
                Some(Tags::new())
            } else {
                Some(tag_map([("highway", "crossing")]))
            }
        }

        (Highway, Railway) => {
            if !both_lines {
                return Some(Tags::new());
            }
            let is_tram = either(|t| tag_is(t, "railway", "tram"));
            let value = match (either(tags::is_path_highway), is_tram) {
                (true, true) => "tram_crossing",
                (true, false) => "crossing",
                (false, true) => "tram_level_crossing",
                (false, false) => "level_crossing",
            };
            Some(tag_map([("railway", value)]))
        }

        (Highway, Waterway) => {
            // no fords on structures or major roads
            let both = |key: &str| has_tag(first.tags, key) && has_tag(second.tags, key);
            if both("tunnel") || both("bridge") || either(tags::is_major_highway) {
                return None;
            }
            if both_lines {
                Some(tag_map([("ford", "yes")]))
            } else {
                Some(Tags::new())
            }
        }

        (Building, _) | (_, Building) => None,

        // pairs are sorted before matching
        (Highway, Aeroway) | (Railway, Aeroway) | (Railway, Highway) | (Waterway, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tags;
    use FeatureType::*;

    fn side(t: &Tags, ft: FeatureType) -> ConnectionSide<'_> {
        ConnectionSide { tags: t, feature_type: ft, is_line: true }
    }

    fn connect(t1: &Tags, f1: FeatureType, t2: &Tags, f2: FeatureType) -> ConnectionTags {
        let forward = connection_tags(side(t1, f1), side(t2, f2));
        let backward = connection_tags(side(t2, f2), side(t1, f1));
        assert_eq!(forward, backward, "connection tags depend on argument order");
        forward
    }

    #[test]
    fn one_bridge_is_always_legit() {
        let bridge = tags([("bridge", "yes")]);
        let plain = tags([("layer", "0")]);
        for ft in [Aeroway, Highway, Railway, Waterway] {
            for other in [Aeroway, Building, Highway, Railway, Waterway] {
                assert!(is_legit_crossing(&bridge, ft, &plain, other), "{ft} bridge vs {other}");
                assert!(is_legit_crossing(&plain, other, &bridge, ft), "{other} vs {ft} bridge");
            }
        }
        // buildings cannot carry a bridge
        assert!(!is_legit_crossing(&bridge, Building, &plain, Highway));
    }

    #[test]
    fn layers_compare_as_strings() {
        let a = tags([("highway", "residential"), ("layer", "1")]);
        let b = tags([("highway", "residential"), ("layer", "01")]);
        assert!(is_legit_crossing(&a, Highway, &b, Highway));
        let unset = tags([("highway", "residential")]);
        let zero = tags([("highway", "residential"), ("layer", "0")]);
        assert!(!is_legit_crossing(&unset, Highway, &zero, Highway));
    }

    #[test]
    fn legit_rules() {
        let corridor0 = tags([("highway", "corridor"), ("level", "0")]);
        let corridor1 = tags([("highway", "corridor"), ("level", "1")]);
        assert!(is_legit_crossing(&corridor0, Highway, &corridor1, Highway));
        assert!(!is_legit_crossing(&corridor0, Highway, &corridor0, Highway));

        let both_bridges = tags([("bridge", "yes")]);
        assert!(!is_legit_crossing(&both_bridges, Highway, &both_bridges, Railway));
        let high_bridge = tags([("bridge", "yes"), ("layer", "2")]);
        assert!(is_legit_crossing(&both_bridges, Railway, &high_bridge, Railway));

        let tunnel = tags([("tunnel", "culvert")]);
        assert!(is_legit_crossing(&tags([]), Railway, &tunnel, Waterway));
        // aeroways cannot be tunnels
        assert!(!is_legit_crossing(&tunnel, Aeroway, &tags([]), Highway));

        let pier = tags([("highway", "footway"), ("man_made", "pier")]);
        assert!(is_legit_crossing(&tags([]), Waterway, &pier, Highway));
        assert!(is_legit_crossing(&pier, Highway, &tags([]), Waterway));

        let upper = tags([("layer", "1")]);
        assert!(is_legit_crossing(&upper, Building, &tags([]), Waterway));
        assert!(!is_legit_crossing(&tags([]), Building, &tags([]), Building));
    }

    #[test]
    fn forbidden_pairs() {
        let empty = tags([]);
        assert_eq!(connect(&empty, Aeroway, &empty, Waterway), None);
        assert_eq!(connect(&empty, Railway, &empty, Waterway), None);
        assert_eq!(connect(&empty, Building, &empty, Highway), None);
        assert_eq!(connect(&empty, Building, &empty, Building), None);
    }

    #[test]
    fn highway_pairs() {
        let road = tags([("highway", "residential")]);
        let track = tags([("highway", "track")]);
        let footway = tags([("highway", "footway")]);
        let cycleway = tags([("highway", "cycleway")]);
        assert_eq!(connect(&road, Highway, &road, Highway), Some(Tags::new()));
        assert_eq!(connect(&road, Highway, &footway, Highway), Some(tags([("highway", "crossing")])));
        assert_eq!(connect(&track, Highway, &footway, Highway), Some(Tags::new()));
        assert_eq!(connect(&cycleway, Highway, &footway, Highway), Some(Tags::new()));

        let area = ConnectionSide { tags: &footway, feature_type: Highway, is_line: false };
        assert_eq!(connection_tags(side(&road, Highway), area), Some(Tags::new()));
    }

    #[test]
    fn rail_pairs() {
        let road = tags([("highway", "residential")]);
        let footway = tags([("highway", "footway")]);
        let rail = tags([("railway", "rail")]);
        let tram = tags([("railway", "tram")]);
        assert_eq!(connect(&road, Highway, &rail, Railway), Some(tags([("railway", "level_crossing")])));
        assert_eq!(connect(&road, Highway, &tram, Railway), Some(tags([("railway", "tram_level_crossing")])));
        assert_eq!(connect(&footway, Highway, &rail, Railway), Some(tags([("railway", "crossing")])));
        assert_eq!(connect(&footway, Highway, &tram, Railway), Some(tags([("railway", "tram_crossing")])));
        assert_eq!(
            connect(&tags([("aeroway", "taxiway")]), Aeroway, &rail, Railway),
            Some(tags([("aeroway", "aircraft_crossing"), ("railway", "level_crossing")]))
        );
        assert_eq!(connect(&rail, Railway, &rail, Railway), Some(Tags::new()));
    }

    #[test]
    fn water_and_air_pairs() {
        let river = tags([("waterway", "river")]);
        assert_eq!(connect(&tags([("highway", "residential")]), Highway, &river, Waterway), Some(tags([("ford", "yes")])));
        assert_eq!(connect(&tags([("highway", "motorway")]), Highway, &river, Waterway), None);
        assert_eq!(connect(&tags([("highway", "primary_link")]), Highway, &river, Waterway), None);
        assert_eq!(connect(&tags([("highway", "secondary")]), Highway, &river, Waterway), Some(tags([("ford", "yes")])));
        let road_tunnel = tags([("highway", "residential"), ("tunnel", "yes")]);
        let canal_tunnel = tags([("waterway", "canal"), ("tunnel", "yes")]);
        assert_eq!(connect(&road_tunnel, Highway, &canal_tunnel, Waterway), None);

        let runway = tags([("aeroway", "runway")]);
        assert_eq!(connect(&runway, Aeroway, &tags([("highway", "motorway")]), Highway), Some(tags([("aeroway", "aircraft_crossing")])));
        assert_eq!(connect(&runway, Aeroway, &tags([("highway", "service")]), Highway), Some(Tags::new()));
        assert_eq!(connect(&runway, Aeroway, &tags([("highway", "corridor")]), Highway), Some(Tags::new()));
        assert_eq!(connect(&runway, Aeroway, &runway, Aeroway), Some(Tags::new()));
    }
}
