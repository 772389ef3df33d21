//! Planar and spherical helpers over lon/lat coordinates.

use geo::Coord;

use crate::types::Location;

const EQUATORIAL_RADIUS: f64 = 6_378_137.0;
const POLAR_RADIUS: f64 = 6_356_752.314_245_179;

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersection point of two segments, computed from cross products.
///
/// Parallel, collinear and non-overlapping segments have no intersection.
pub fn line_intersection(a: [Location; 2], b: [Location; 2]) -> Option<Location> {
    let p = a[0].to_coord();
    let r = a[1].to_coord() - p;
    let q = b[0].to_coord();
    let s = b[1].to_coord() - q;

    let u_numerator = cross(q - p, r);
    let denominator = cross(r, s);
    if u_numerator == 0.0 || denominator == 0.0 {
        return None;
    }
    let u = u_numerator / denominator;
    let t = cross(q - p, s) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some((p + r * t).into())
    } else {
        None
    }
}

pub fn distance_meters(a: &Location, b: &Location) -> f64 {
    let ap = haversine_rs::point::Point { latitude: a.latitude, longitude: a.longitude };
    let bp = haversine_rs::point::Point { latitude: b.latitude, longitude: b.longitude };
    haversine_rs::distance(ap, bp, haversine_rs::units::Unit::Meters)
}

/// Index and distance of the point nearest to `to`.
pub fn closest_point(points: &[Location], to: &Location) -> Option<(usize, f64)> {
    points
        .iter()
        .map(|p| distance_meters(p, to))
        .enumerate()
        .fold(None, |best, (i, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((i, d)),
        })
}

pub fn lat_to_meters(dlat: f64) -> f64 {
    dlat * (std::f64::consts::TAU * POLAR_RADIUS / 360.0)
}

pub fn lon_to_meters(dlon: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        0.0
    } else {
        dlon * (std::f64::consts::TAU * EQUATORIAL_RADIUS / 360.0) * at_lat.to_radians().cos().abs()
    }
}

pub fn meters_to_lat(m: f64) -> f64 {
    m / (std::f64::consts::TAU * POLAR_RADIUS / 360.0)
}

pub fn meters_to_lon(m: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        0.0
    } else {
        m / (std::f64::consts::TAU * EQUATORIAL_RADIUS / 360.0) / at_lat.to_radians().cos().abs()
    }
}

/// Local metric frame: x grows east, y grows north.
pub fn project(loc: &Location) -> Coord<f64> {
    Coord {
        x: lon_to_meters(loc.longitude, loc.latitude),
        y: lat_to_meters(loc.latitude),
    }
}

pub fn unproject(c: Coord<f64>) -> Location {
    let latitude = meters_to_lat(c.y);
    Location { longitude: meters_to_lon(c.x, latitude), latitude }
}

pub fn vec_angle(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

pub fn vec_length(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Location `distance_m` metres from `start` towards `end`.
///
/// Returns `None` when the two points coincide.
pub fn position_along(start: &Location, end: &Location, distance_m: f64) -> Option<Location> {
    let from = project(start);
    let to = project(end);
    let length = vec_length(from, to);
    if length == 0.0 {
        return None;
    }
    let scale = distance_m / length;
    Some(unproject(from + (to - from) * scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lon: f64, lat: f64) -> Location {
        Location::new(lon, lat)
    }

    #[test]
    fn crossing_segments_intersect() {
        let p = line_intersection([loc(0.0, -1.0), loc(0.0, 1.0)], [loc(-1.0, 0.0), loc(1.0, 0.0)]);
        assert_eq!(p, Some(loc(0.0, 0.0)));
    }

    #[test]
    fn parallel_and_distant_segments_do_not() {
        assert!(line_intersection([loc(0.0, 0.0), loc(1.0, 0.0)], [loc(0.0, 1.0), loc(1.0, 1.0)]).is_none());
        assert!(line_intersection([loc(0.0, 0.0), loc(1.0, 0.0)], [loc(2.0, -1.0), loc(2.0, 1.0)]).is_none());
        // collinear overlap is not a crossing
        assert!(line_intersection([loc(0.0, 0.0), loc(2.0, 0.0)], [loc(1.0, 0.0), loc(3.0, 0.0)]).is_none());
    }

    #[test]
    fn closest_point_picks_nearest() {
        let points = [loc(0.0, 0.0), loc(0.001, 0.0)];
        let (index, distance) = closest_point(&points, &loc(0.0009, 0.0)).unwrap();
        assert_eq!(index, 1);
        assert!(distance < 12.0);
    }

    #[test]
    fn projection_round_trips() {
        let original = loc(8.54, 47.37);
        let back = unproject(project(&original));
        assert!((back.longitude - original.longitude).abs() < 1e-9);
        assert!((back.latitude - original.latitude).abs() < 1e-9);
    }

    #[test]
    fn position_along_is_metric() {
        let start = loc(8.54, 47.37);
        let end = loc(8.541, 47.37);
        let p = position_along(&start, &end, 1.0).unwrap();
        let d = distance_meters(&start, &p);
        assert!((d - 1.0).abs() < 0.05, "distance was {d}");
        assert!(position_along(&start, &start, 1.0).is_none());
    }
}
