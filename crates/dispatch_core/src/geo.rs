//! Geo kernel: great-circle distances and area-uniform disc sampling.
//!
//! All distances are kilometres on a spherical earth of radius
//! [`EARTH_RADIUS_KM`]. Coordinates are plain latitude/longitude degrees;
//! H3 cells are only derived for snapshot output (see [`Coordinate::cell`]).

use std::f64::consts::TAU;

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};

use crate::rng::LcgRng;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Resolution-9 H3 cell containing this coordinate (~240m cells).
    pub fn cell(&self) -> Option<CellIndex> {
        if !self.is_valid() {
            return None;
        }
        LatLng::new(self.lat, self.lng)
            .ok()
            .map(|ll| ll.to_cell(Resolution::Nine))
    }

    /// Linear interpolation in degree space; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Mean latitude/longitude of a set of points. `None` for an empty set.
    pub fn centroid<I>(points: I) -> Option<Coordinate>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let (count, lat, lng) = points
            .into_iter()
            .fold((0usize, 0.0, 0.0), |(n, lat, lng), p| (n + 1, lat + p.lat, lng + p.lng));
        (count > 0).then(|| Coordinate::new(lat / count as f64, lng / count as f64))
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// Haversine great-circle distance in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Point reached by travelling `distance_km` from `origin` along the initial
/// bearing `bearing_rad` (clockwise from north).
pub fn destination_point(origin: Coordinate, bearing_rad: f64, distance_km: f64) -> Coordinate {
    let delta = distance_km / EARTH_RADIUS_KM;
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing_rad.cos()).asin();
    let lng2 = lng1
        + (bearing_rad.sin() * delta.sin() * lat1.cos())
            .atan2(delta.cos() - lat1.sin() * lat2.sin());

    let lng_deg = (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(lat2.to_degrees(), lng_deg)
}

/// Sample a point uniformly by area inside the disc of `radius_km` around `center`.
///
/// Draws exactly two values from `rng`: the radius fraction `u` (used as
/// `radius_km * sqrt(u)`) and then the angle in [0, 2π).
pub fn sample_point_within_radius(rng: &mut LcgRng, center: Coordinate, radius_km: f64) -> Coordinate {
    let r = radius_km * rng.next_f64().sqrt();
    let theta = rng.next_f64() * TAU;
    destination_point(center, theta, r)
}

pub fn is_within_service_area(point: Coordinate, center: Coordinate, service_radius_km: f64) -> bool {
    distance_km(point, center) <= service_radius_km
}
