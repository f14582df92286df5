//! Spatial math: great-circle distances, local tangent planes and headings.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in decimal degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

// ==== ENU (East-North-Up) scaling ====

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Offset a position by meters in the north and east directions.
///
/// Returns `(lat, lon)` in degrees.
pub fn offset_position(lat: f64, lon: f64, north_m: f64, east_m: f64) -> (f64, f64) {
    let distance_m = (north_m * north_m + east_m * east_m).sqrt();
    if distance_m <= f64::EPSILON {
        return (lat, lon);
    }
    let bearing_rad = east_m.atan2(north_m);
    offset_by_bearing(lat, lon, distance_m, bearing_rad)
}

/// Bearing from point 1 to point 2 in radians (0 = north, π/2 = east).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Offset a position by distance (meters) along a bearing (radians).
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Normalize a heading into `[0, 360)` degrees.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    let wrapped = heading_deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed heading change from `from_deg` to `to_deg`, in `(-180, 180]` degrees.
pub fn heading_delta(from_deg: f64, to_deg: f64) -> f64 {
    let delta = (to_deg - from_deg).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Flat east/north frame anchored at a geodetic origin.
///
/// One unit along either axis is approximately one meter. Longitude is
/// scaled at the reference latitude, so the frame is only meaningful for
/// paths spanning a few kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTangentPlane {
    pub origin_lat: f64,
    pub origin_lon: f64,
    meters_per_deg_lat: f64,
    meters_per_deg_lon: f64,
}

impl LocalTangentPlane {
    pub fn new(origin_lat: f64, origin_lon: f64, reference_lat: f64) -> Self {
        Self {
            origin_lat,
            origin_lon,
            meters_per_deg_lat: meters_per_deg_lat(reference_lat).max(1e-9),
            meters_per_deg_lon: meters_per_deg_lon(reference_lat).max(1e-9),
        }
    }

    /// Plane anchored at the first point, scaled at the mean latitude.
    pub fn for_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (origin_lat, origin_lon) = iter.next()?;
        let mut lat_sum = origin_lat;
        let mut count = 1usize;
        for (lat, _) in iter {
            lat_sum += lat;
            count += 1;
        }
        Some(Self::new(origin_lat, origin_lon, lat_sum / count as f64))
    }

    /// Project to `(east_m, north_m)`.
    pub fn to_local(&self, lat: f64, lon: f64) -> (f64, f64) {
        (
            (lon - self.origin_lon) * self.meters_per_deg_lon,
            (lat - self.origin_lat) * self.meters_per_deg_lat,
        )
    }

    /// Inverse of [`to_local`](Self::to_local); returns `(lat, lon)`.
    pub fn to_geodetic(&self, east_m: f64, north_m: f64) -> (f64, f64) {
        (
            self.origin_lat + north_m / self.meters_per_deg_lat,
            self.origin_lon + east_m / self.meters_per_deg_lon,
        )
    }
}
