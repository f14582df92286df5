//! Flight-log analysis.
//!
//! Turns a table of waypoint rows (a recorded flight, or a generated one)
//! into per-segment geometry and aggregate statistics. Bad rows are dropped
//! with a warning; the warning list is part of the result and callers are
//! expected to show it.

use crate::error::{FlightPathError, Result};
use crate::models::{feet_to_meters, GeoPoint, RotationDirection, Waypoint};
use crate::spatial::{haversine_distance, heading_delta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng"];
const ALTITUDE_COLUMNS: &[&str] = &["altitude_ft", "altitude"];
/// Mission-file names first, then the serialized `Waypoint` field names.
const CURVE_SIZE_COLUMNS: &[&str] = &["curvesize_ft", "turn_radius_ft"];
const ROTATION_COLUMNS: &[&str] = &["rotationdir", "rotation"];

/// Lowercase a header and fold every run of non-alphanumerics into one `_`.
///
/// `"Altitude (ft)"` becomes `"altitude_ft"`.
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// One input row: normalized column name to raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Self::default();
        for (key, value) in pairs {
            row.insert(key.as_ref(), value);
        }
        row
    }

    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(normalize_column_name(column), value.into());
    }

    /// Cell text for a normalized column; blank cells count as absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn first_of(&self, columns: &[&'static str]) -> Option<(&'static str, &str)> {
        columns
            .iter()
            .find_map(|column| self.get(column).map(|value| (*column, value)))
    }
}

/// Convert a JSON array of objects into rows.
///
/// Numbers and booleans are rendered as text, nulls are treated as absent and
/// non-object array elements become empty rows (and are later rejected).
pub fn rows_from_json(value: &Value) -> Result<Vec<RawRow>> {
    let Value::Array(items) = value else {
        return Err(FlightPathError::config("expected a JSON array of row objects"));
    };
    Ok(items
        .iter()
        .map(|item| match item {
            Value::Object(map) => RawRow::from_pairs(map.iter().filter_map(|(key, cell)| {
                let text = match cell {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.as_str(), text))
            })),
            _ => RawRow::default(),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    Missing { field: String },
    NotNumeric { field: String, value: String },
    OutOfRange { field: String, value: f64 },
}

/// A dropped input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowWarning {
    pub row_index: usize,
    pub issue: RowIssue,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            RowIssue::Missing { field } => {
                write!(f, "row {}: missing {field}", self.row_index)
            }
            RowIssue::NotNumeric { field, value } => {
                write!(f, "row {}: {field} is not numeric ({value:?})", self.row_index)
            }
            RowIssue::OutOfRange { field, value } => {
                write!(f, "row {}: {field} out of range ({value})", self.row_index)
            }
        }
    }
}

/// A validated input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    /// Position of the row in the input table
    pub row_index: usize,
    pub lat: f64,
    pub lon: f64,
    pub altitude_ft: f64,
    pub heading_deg: f64,
    pub curve_size_ft: f64,
    pub rotation: RotationDirection,
    pub speed_m_s: f64,
    pub gimbal_mode: u32,
    pub gimbal_pitch_deg: f64,
    pub photo_time_interval_s: Option<f64>,
    pub photo_dist_interval_m: Option<f64>,
    pub point_of_interest: Option<GeoPoint>,
}

impl ParsedRow {
    pub fn parse(row_index: usize, row: &RawRow) -> std::result::Result<Self, RowWarning> {
        let required = |columns: &[&'static str], range: f64| -> std::result::Result<f64, RowWarning> {
            let warn = |issue| RowWarning { row_index, issue };
            let Some((field, text)) = row.first_of(columns) else {
                return Err(warn(RowIssue::Missing {
                    field: columns[0].to_string(),
                }));
            };
            let value = parse_number(text).ok_or_else(|| {
                warn(RowIssue::NotNumeric {
                    field: field.to_string(),
                    value: text.to_string(),
                })
            })?;
            check_range(row_index, field, value, range)
        };

        let lat = required(LATITUDE_COLUMNS, 90.0)?;
        let lon = required(LONGITUDE_COLUMNS, 180.0)?;
        let altitude_ft = required(ALTITUDE_COLUMNS, f64::INFINITY)?;

        let optional = |column: &str| row.get(column).and_then(parse_number);
        let point_of_interest = match (
            optional("poi_latitude"),
            optional("poi_longitude"),
            optional("poi_altitude_ft"),
        ) {
            (Some(lat), Some(lon), Some(altitude_ft)) => Some(GeoPoint::new(lat, lon, altitude_ft)),
            _ => None,
        };

        Ok(Self {
            row_index,
            lat,
            lon,
            altitude_ft,
            heading_deg: optional("heading_deg").unwrap_or(0.0),
            curve_size_ft: row
                .first_of(CURVE_SIZE_COLUMNS)
                .and_then(|(_, text)| parse_number(text))
                .unwrap_or(0.0),
            rotation: row
                .first_of(ROTATION_COLUMNS)
                .map(|(_, text)| RotationDirection::parse(text))
                .unwrap_or_default(),
            speed_m_s: optional("speed_m_s").unwrap_or(0.0),
            gimbal_mode: optional("gimbalmode")
                .filter(|code| *code >= 0.0)
                .map(|code| code as u32)
                .unwrap_or(0),
            gimbal_pitch_deg: optional("gimbalpitchangle").unwrap_or(0.0),
            photo_time_interval_s: optional("photo_timeinterval"),
            photo_dist_interval_m: optional("photo_distinterval"),
            point_of_interest,
        })
    }

    /// Apply the same coordinate checks a parsed row gets.
    fn from_waypoint(row_index: usize, wp: &Waypoint) -> std::result::Result<Self, RowWarning> {
        let checked = |field: &str, value: f64, range: f64| {
            if value.is_finite() {
                check_range(row_index, field, value, range)
            } else {
                Err(RowWarning {
                    row_index,
                    issue: RowIssue::NotNumeric {
                        field: field.to_string(),
                        value: value.to_string(),
                    },
                })
            }
        };
        let finite_or_zero = |value: f64| if value.is_finite() { value } else { 0.0 };

        Ok(Self {
            row_index,
            lat: checked("latitude", wp.lat, 90.0)?,
            lon: checked("longitude", wp.lon, 180.0)?,
            altitude_ft: checked("altitude_ft", wp.altitude_ft, f64::INFINITY)?,
            heading_deg: finite_or_zero(wp.heading_deg),
            curve_size_ft: finite_or_zero(wp.turn_radius_ft),
            rotation: wp.rotation,
            speed_m_s: 0.0,
            gimbal_mode: 0,
            gimbal_pitch_deg: 0.0,
            photo_time_interval_s: None,
            photo_dist_interval_m: None,
            point_of_interest: None,
        })
    }
}

fn check_range(
    row_index: usize,
    field: &str,
    value: f64,
    range: f64,
) -> std::result::Result<f64, RowWarning> {
    if value.abs() > range {
        return Err(RowWarning {
            row_index,
            issue: RowIssue::OutOfRange {
                field: field.to_string(),
                value,
            },
        });
    }
    Ok(value)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedWaypoint {
    #[serde(flatten)]
    pub row: ParsedRow,
    pub cumulative_distance_2d_m: f64,
    pub cumulative_distance_3d_m: f64,
}

/// Geometry between two consecutive retained rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSegment {
    pub from_row: usize,
    pub to_row: usize,
    pub horizontal_m: f64,
    pub vertical_m: f64,
    pub distance_3d_m: f64,
    /// None when the horizontal distance is zero
    pub slope_percent: Option<f64>,
    pub slope_deg: Option<f64>,
    pub heading_change_deg: f64,
    /// Inverse of the end waypoint's requested turn radius
    pub curvature_per_m: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TightestTurn {
    pub row_index: usize,
    pub radius_m: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathStatistics {
    pub waypoint_count: usize,
    pub segment_count: usize,
    pub total_horizontal_m: f64,
    pub total_distance_3d_m: f64,
    pub total_climb_m: f64,
    pub total_descent_m: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub min_curve_radius_m: Option<f64>,
    pub max_curve_radius_m: Option<f64>,
    pub tightest_turn: Option<TightestTurn>,
    pub average_speed_m_s: Option<f64>,
    pub estimated_duration_s: Option<f64>,
    pub max_abs_slope_percent: Option<f64>,
    pub avg_abs_slope_percent: Option<f64>,
    pub max_abs_slope_deg: Option<f64>,
    pub avg_abs_slope_deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ParsedRow>) -> Option<Self> {
        rows.into_iter().fold(None, |bounds: Option<Bounds>, row| {
            Some(match bounds {
                None => Bounds {
                    min_lat: row.lat,
                    max_lat: row.lat,
                    min_lon: row.lon,
                    max_lon: row.lon,
                },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(row.lat),
                    max_lat: b.max_lat.max(row.lat),
                    min_lon: b.min_lon.min(row.lon),
                    max_lon: b.max_lon.max(row.lon),
                },
            })
        })
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPathAnalysis {
    pub waypoints: Vec<AnalyzedWaypoint>,
    pub segments: Vec<FlightSegment>,
    pub statistics: PathStatistics,
    pub point_of_interest: Option<GeoPoint>,
    pub bounds: Bounds,
    pub warnings: Vec<RowWarning>,
}

/// Validate and analyze a table of rows.
///
/// Fails only when no row survives validation.
pub fn analyze_rows(rows: &[RawRow]) -> Result<FlightPathAnalysis> {
    let (parsed, warnings) = partition_rows(
        rows.iter()
            .enumerate()
            .map(|(index, row)| ParsedRow::parse(index, row)),
    );
    analyze_parsed(parsed, warnings)
}

/// Analyze finished waypoints, e.g. a generated, smoothed or recorded path.
///
/// Waypoints with non-finite or out-of-range coordinates are dropped with a
/// warning, exactly like table rows.
pub fn analyze_waypoints(waypoints: &[Waypoint]) -> Result<FlightPathAnalysis> {
    let (parsed, warnings) = partition_rows(
        waypoints
            .iter()
            .enumerate()
            .map(|(index, wp)| ParsedRow::from_waypoint(index, wp)),
    );
    analyze_parsed(parsed, warnings)
}

fn partition_rows(
    outcomes: impl Iterator<Item = std::result::Result<ParsedRow, RowWarning>>,
) -> (Vec<ParsedRow>, Vec<RowWarning>) {
    let mut parsed = Vec::new();
    let mut warnings = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(row) => parsed.push(row),
            Err(warning) => {
                tracing::warn!(row = warning.row_index, "dropping row: {warning}");
                warnings.push(warning);
            }
        }
    }
    (parsed, warnings)
}

fn analyze_parsed(rows: Vec<ParsedRow>, warnings: Vec<RowWarning>) -> Result<FlightPathAnalysis> {
    let Some(bounds) = Bounds::from_rows(&rows) else {
        return Err(FlightPathError::NoValidWaypoints {
            rejected: warnings.len(),
        });
    };

    let segments: Vec<FlightSegment> = rows
        .windows(2)
        .map(|pair| measure_segment(&pair[0], &pair[1]))
        .collect();

    let mut cumulative_2d = 0.0;
    let mut cumulative_3d = 0.0;
    let mut waypoints = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        if let Some(segment) = position.checked_sub(1).and_then(|i| segments.get(i)) {
            cumulative_2d += segment.horizontal_m;
            cumulative_3d += segment.distance_3d_m;
        }
        waypoints.push(AnalyzedWaypoint {
            row: row.clone(),
            cumulative_distance_2d_m: cumulative_2d,
            cumulative_distance_3d_m: cumulative_3d,
        });
    }

    let statistics = summarize(&rows, &segments);
    let point_of_interest = rows.iter().find_map(|row| row.point_of_interest);

    tracing::debug!(
        waypoints = statistics.waypoint_count,
        dropped = warnings.len(),
        total_m = statistics.total_distance_3d_m,
        "analyzed flight path"
    );

    Ok(FlightPathAnalysis {
        waypoints,
        segments,
        statistics,
        point_of_interest,
        bounds,
        warnings,
    })
}

fn measure_segment(from: &ParsedRow, to: &ParsedRow) -> FlightSegment {
    let horizontal_m = haversine_distance(from.lat, from.lon, to.lat, to.lon);
    let vertical_m = feet_to_meters(to.altitude_ft - from.altitude_ft);
    let has_run = horizontal_m > 0.0;
    FlightSegment {
        from_row: from.row_index,
        to_row: to.row_index,
        horizontal_m,
        vertical_m,
        distance_3d_m: horizontal_m.hypot(vertical_m),
        slope_percent: has_run.then(|| vertical_m / horizontal_m * 100.0),
        slope_deg: has_run.then(|| (vertical_m / horizontal_m).atan().to_degrees()),
        heading_change_deg: heading_delta(from.heading_deg, to.heading_deg),
        curvature_per_m: (to.curve_size_ft > 0.0).then(|| 1.0 / feet_to_meters(to.curve_size_ft)),
    }
}

fn summarize(rows: &[ParsedRow], segments: &[FlightSegment]) -> PathStatistics {
    let mut stats = PathStatistics {
        waypoint_count: rows.len(),
        segment_count: segments.len(),
        min_altitude_m: f64::INFINITY,
        max_altitude_m: f64::NEG_INFINITY,
        ..PathStatistics::default()
    };

    let mut speed_sum = 0.0;
    let mut speed_samples = 0usize;
    for row in rows {
        let altitude_m = feet_to_meters(row.altitude_ft);
        stats.min_altitude_m = stats.min_altitude_m.min(altitude_m);
        stats.max_altitude_m = stats.max_altitude_m.max(altitude_m);

        if row.curve_size_ft > 0.0 {
            let radius_m = feet_to_meters(row.curve_size_ft);
            stats.max_curve_radius_m = Some(stats.max_curve_radius_m.map_or(radius_m, |r| r.max(radius_m)));
            if stats.tightest_turn.map_or(true, |turn| radius_m < turn.radius_m) {
                stats.tightest_turn = Some(TightestTurn {
                    row_index: row.row_index,
                    radius_m,
                });
            }
        }

        if row.speed_m_s > 0.0 {
            speed_sum += row.speed_m_s;
            speed_samples += 1;
        }
    }
    stats.min_curve_radius_m = stats.tightest_turn.map(|turn| turn.radius_m);

    let mut slope_samples = 0usize;
    let mut slope_percent_sum = 0.0;
    let mut slope_deg_sum = 0.0;
    for segment in segments {
        stats.total_horizontal_m += segment.horizontal_m;
        stats.total_distance_3d_m += segment.distance_3d_m;
        if segment.vertical_m > 0.0 {
            stats.total_climb_m += segment.vertical_m;
        } else {
            stats.total_descent_m += -segment.vertical_m;
        }

        if let (Some(percent), Some(deg)) = (segment.slope_percent, segment.slope_deg) {
            let (percent, deg) = (percent.abs(), deg.abs());
            slope_samples += 1;
            slope_percent_sum += percent;
            slope_deg_sum += deg;
            stats.max_abs_slope_percent = Some(stats.max_abs_slope_percent.map_or(percent, |m| m.max(percent)));
            stats.max_abs_slope_deg = Some(stats.max_abs_slope_deg.map_or(deg, |m| m.max(deg)));
        }
    }
    if slope_samples > 0 {
        stats.avg_abs_slope_percent = Some(slope_percent_sum / slope_samples as f64);
        stats.avg_abs_slope_deg = Some(slope_deg_sum / slope_samples as f64);
    }

    if speed_samples > 0 {
        let average = speed_sum / speed_samples as f64;
        stats.average_speed_m_s = Some(average);
        stats.estimated_duration_s = Some(stats.total_horizontal_m / average);
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(lat: &str, lon: &str, alt: &str) -> RawRow {
        RawRow::from_pairs([("Latitude", lat), ("Longitude", lon), ("Altitude (ft)", alt)])
    }

    #[test]
    fn column_names_are_normalized() {
        assert_eq!(normalize_column_name("Altitude (ft)"), "altitude_ft");
        assert_eq!(normalize_column_name("  POI Latitude "), "poi_latitude");
        assert_eq!(normalize_column_name("speed(m/s)"), "speed_m_s");
        assert_eq!(normalize_column_name("curvesize_ft"), "curvesize_ft");
        assert_eq!(normalize_column_name("--heading--deg--"), "heading_deg");
    }

    #[test]
    fn non_numeric_latitude_drops_one_row() {
        let rows = vec![
            row("33.0", "-117.0", "100"),
            row("north", "-117.0", "100"),
            row("33.001", "-117.0", "120"),
        ];
        let analysis = analyze_rows(&rows).unwrap();
        assert_eq!(analysis.waypoints.len(), 2);
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].row_index, 1);
        assert!(matches!(
            &analysis.warnings[0].issue,
            RowIssue::NotNumeric { field, .. } if field == "latitude"
        ));
        assert_eq!(analysis.segments.len(), 1);
        assert_eq!(analysis.segments[0].from_row, 0);
        assert_eq!(analysis.segments[0].to_row, 2);
    }

    #[test]
    fn all_rows_invalid_is_an_error() {
        let rows = vec![row("", "-117.0", "100"), row("33", "x", "100")];
        assert_eq!(
            analyze_rows(&rows),
            Err(FlightPathError::NoValidWaypoints { rejected: 2 })
        );
        assert!(analyze_rows(&[]).is_err());
    }

    #[test]
    fn vertical_only_segment_has_no_slope() {
        let rows = vec![row("33.0", "-117.0", "100"), row("33.0", "-117.0", "200")];
        let analysis = analyze_rows(&rows).unwrap();
        let segment = &analysis.segments[0];
        assert_eq!(segment.horizontal_m, 0.0);
        assert!(segment.slope_percent.is_none());
        assert!(segment.slope_deg.is_none());
        assert!((segment.distance_3d_m - 30.48).abs() < 1e-9);
        assert!(analysis.statistics.max_abs_slope_percent.is_none());
        assert!(analysis.statistics.avg_abs_slope_deg.is_none());
    }

    #[test]
    fn climb_and_descent_accumulate_separately() {
        let rows = vec![
            row("33.0", "-117.0", "100"),
            row("33.001", "-117.0", "200"),
            row("33.002", "-117.0", "150"),
            row("33.003", "-117.0", "250"),
        ];
        let stats = analyze_rows(&rows).unwrap().statistics;
        assert!((stats.total_climb_m - feet_to_meters(200.0)).abs() < 1e-9);
        assert!((stats.total_descent_m - feet_to_meters(50.0)).abs() < 1e-9);
        assert!((stats.min_altitude_m - feet_to_meters(100.0)).abs() < 1e-9);
        assert!((stats.max_altitude_m - feet_to_meters(250.0)).abs() < 1e-9);
        assert!(stats.max_abs_slope_deg.unwrap() > stats.avg_abs_slope_deg.unwrap() - 1e-12);
    }

    #[test]
    fn cumulative_distances_and_triangle_inequality() {
        let rows = vec![
            row("33.0", "-117.0", "100"),
            row("33.002", "-117.001", "140"),
            row("33.001", "-116.998", "90"),
        ];
        let analysis = analyze_rows(&rows).unwrap();
        let last = analysis.waypoints.last().unwrap();
        let via_middle = analysis.segments[0].horizontal_m + analysis.segments[1].horizontal_m;
        assert!((last.cumulative_distance_2d_m - via_middle).abs() < 1e-9);
        assert!(last.cumulative_distance_3d_m >= last.cumulative_distance_2d_m);
        let direct = haversine_distance(33.0, -117.0, 33.001, -116.998);
        assert!(via_middle >= direct);
    }

    #[test]
    fn optional_fields_default_and_poi_comes_from_first_complete_row() {
        let rows = vec![
            RawRow::from_pairs([
                ("latitude", "33.0"),
                ("longitude", "-117.0"),
                ("altitude_ft", "100"),
                ("poi_latitude", "33.1"),
                ("poi_longitude", "-117.1"),
            ]),
            RawRow::from_pairs([
                ("latitude", "33.001"),
                ("longitude", "-117.0"),
                ("altitude_ft", "100"),
                ("poi_latitude", "33.2"),
                ("poi_longitude", "-117.2"),
                ("poi_altitude_ft", "10"),
                ("rotationdir", "1"),
            ]),
            RawRow::from_pairs([
                ("latitude", "33.002"),
                ("longitude", "-117.0"),
                ("altitude_ft", "100"),
                ("poi_latitude", "40.0"),
                ("poi_longitude", "-100.0"),
                ("poi_altitude_ft", "0"),
            ]),
        ];
        let analysis = analyze_rows(&rows).unwrap();
        assert_eq!(analysis.point_of_interest, Some(GeoPoint::new(33.2, -117.2, 10.0)));
        let first = &analysis.waypoints[0].row;
        assert_eq!(first.heading_deg, 0.0);
        assert_eq!(first.gimbal_mode, 0);
        assert!(first.photo_time_interval_s.is_none());
        assert_eq!(analysis.waypoints[1].row.rotation, RotationDirection::Left);
    }

    #[test]
    fn curvature_speed_and_heading_statistics() {
        let rows = rows_from_json(&json!([
            {"latitude": 33.0, "longitude": -117.0, "altitude_ft": 100, "heading_deg": 350, "speed_m_s": 0},
            {"latitude": 33.001, "longitude": -117.0, "altitude_ft": 100, "heading_deg": 10,
             "curvesize_ft": 50, "speed_m_s": 4},
            {"latitude": 33.002, "longitude": -117.0, "altitude_ft": 100, "heading_deg": 0,
             "curvesize_ft": 20, "speed_m_s": 6},
        ]))
        .unwrap();
        let analysis = analyze_rows(&rows).unwrap();
        assert_eq!(analysis.segments[0].heading_change_deg, 20.0);
        assert_eq!(analysis.segments[1].heading_change_deg, -10.0);
        let curvature = analysis.segments[1].curvature_per_m.unwrap();
        assert!((curvature - 1.0 / feet_to_meters(20.0)).abs() < 1e-12);

        let stats = &analysis.statistics;
        let tightest = stats.tightest_turn.unwrap();
        assert_eq!(tightest.row_index, 2);
        assert_eq!(stats.min_curve_radius_m, Some(feet_to_meters(20.0)));
        assert_eq!(stats.max_curve_radius_m, Some(feet_to_meters(50.0)));
        assert_eq!(stats.average_speed_m_s, Some(5.0));
        let duration = stats.estimated_duration_s.unwrap();
        assert!((duration - stats.total_horizontal_m / 5.0).abs() < 1e-9);
    }

    #[test]
    fn straight_path_reports_no_curvature_or_speed() {
        let rows = vec![row("33.0", "-117.0", "100"), row("33.001", "-117.0", "100")];
        let stats = analyze_rows(&rows).unwrap().statistics;
        assert!(stats.min_curve_radius_m.is_none());
        assert!(stats.tightest_turn.is_none());
        assert!(stats.average_speed_m_s.is_none());
        assert!(stats.estimated_duration_s.is_none());
    }

    #[test]
    fn bounds_cover_retained_rows_only() {
        let rows = vec![
            row("33.0", "-117.0", "100"),
            row("95.0", "-117.0", "100"),
            row("33.01", "-116.99", "100"),
        ];
        let analysis = analyze_rows(&rows).unwrap();
        assert!(matches!(analysis.warnings[0].issue, RowIssue::OutOfRange { .. }));
        assert_eq!(analysis.bounds.max_lat, 33.01);
        assert_eq!(analysis.bounds.min_lon, -117.0);
        assert!(analysis.bounds.contains(33.005, -116.995));
    }

    #[test]
    fn json_rows_tolerate_nulls_and_garbage() {
        let rows = rows_from_json(&json!([
            {"Latitude": "33.0", "Longitude": -117.0, "Altitude_ft": 100, "POI Latitude": null},
            42,
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("latitude"), Some("33.0"));
        assert_eq!(rows[0].get("poi_latitude"), None);
        let analysis = analyze_rows(&rows).unwrap();
        assert_eq!(analysis.warnings.len(), 1);
        assert!(rows_from_json(&json!({"latitude": 1})).is_err());
    }

    #[test]
    fn finished_waypoints_analyze_directly() {
        let waypoints = vec![
            Waypoint::new(0, 33.0, -117.0, 100.0),
            Waypoint::new(1, 33.001, -117.0, 120.0).with_turn_radius(40.0),
        ];
        let analysis = analyze_waypoints(&waypoints).unwrap();
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.statistics.tightest_turn.unwrap().row_index, 1);
        assert_eq!(
            analyze_waypoints(&[]),
            Err(FlightPathError::NoValidWaypoints { rejected: 0 })
        );
    }

    #[test]
    fn serialized_waypoint_fields_are_read_as_curve_columns() {
        let rows = rows_from_json(&json!([
            {"lat": 33.0, "lon": -117.0, "altitude_ft": 100.0, "turn_radius_ft": 0.0},
            {"lat": 33.001, "lon": -117.0, "altitude_ft": 100.0,
             "turn_radius_ft": 75.0, "rotation": "right"},
            {"lat": 33.001, "lon": -116.999, "altitude_ft": 100.0,
             "curvesize_ft": 40.0, "turn_radius_ft": 90.0, "rotationdir": "1", "rotation": "right"},
        ]))
        .unwrap();
        let analysis = analyze_rows(&rows).unwrap();
        let second = &analysis.waypoints[1].row;
        assert_eq!(second.curve_size_ft, 75.0);
        assert_eq!(second.rotation, RotationDirection::Right);
        // Mission-file columns win over the aliases.
        let third = &analysis.waypoints[2].row;
        assert_eq!(third.curve_size_ft, 40.0);
        assert_eq!(third.rotation, RotationDirection::Left);
    }

    #[test]
    fn invalid_waypoints_are_dropped_with_warnings() {
        let waypoints = vec![
            Waypoint::new(0, 33.0, -117.0, 100.0),
            Waypoint::new(1, f64::NAN, -117.0, 100.0),
            Waypoint::new(2, 95.0, -117.0, 100.0),
            Waypoint::new(3, 33.0, -181.0, 100.0),
            Waypoint::new(4, 33.0, -117.0, f64::INFINITY),
            Waypoint::new(5, 33.001, -117.0, 110.0).with_turn_radius(f64::NAN),
        ];
        let analysis = analyze_waypoints(&waypoints).unwrap();
        assert_eq!(analysis.waypoints.len(), 2);
        let dropped: Vec<usize> = analysis.warnings.iter().map(|w| w.row_index).collect();
        assert_eq!(dropped, vec![1, 2, 3, 4]);
        assert!(matches!(
            &analysis.warnings[0].issue,
            RowIssue::NotNumeric { field, .. } if field == "latitude"
        ));
        assert!(matches!(
            &analysis.warnings[1].issue,
            RowIssue::OutOfRange { field, value } if field == "latitude" && *value == 95.0
        ));
        assert!(analysis.statistics.total_horizontal_m.is_finite());
        assert!(analysis.statistics.total_horizontal_m > 100.0);
        assert_eq!(analysis.waypoints[1].row.curve_size_ft, 0.0);

        let all_bad = [
            Waypoint::new(0, f64::NAN, 0.0, 0.0),
            Waypoint::new(1, 0.0, 200.0, 0.0),
        ];
        assert_eq!(
            analyze_waypoints(&all_bad),
            Err(FlightPathError::NoValidWaypoints { rejected: 2 })
        );
    }
}
