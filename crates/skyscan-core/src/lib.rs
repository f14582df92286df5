pub mod altitude;
pub mod analyzer;
pub mod config;
pub mod curved_path;
pub mod error;
pub mod mission;
pub mod models;
pub mod spatial;
pub mod spiral;

pub use altitude::{AltitudeProfiler, AltitudeState, ProfiledPoint};
pub use analyzer::{
    analyze_rows, analyze_waypoints, normalize_column_name, rows_from_json, AnalyzedWaypoint,
    Bounds, FlightPathAnalysis, FlightSegment, ParsedRow, PathStatistics, RawRow, RowIssue,
    RowWarning, TightestTurn,
};
pub use config::{
    AltitudeLimits, AltitudePreset, AltitudeRates, BounceCountPolicy, BounceSource,
    LinearBouncePolicy, MissionConfig,
};
pub use curved_path::{
    ArcComputation, CornerReport, CurvedPath, CurvedPathBuilder, CurvedPathConfig, PathPoint,
    PathPointKind, SkipReason, TurnDirection,
};
pub use error::{FlightPathError, Result};
pub use mission::{generate_mission, project_slice, Mission, SliceFlight};
pub use models::{GeoPoint, Leg, Phase, RotationDirection, Waypoint};
pub use spatial::{haversine_distance, LocalTangentPlane};
pub use spiral::{DensityRegime, ScheduleDensity, SpiralGenerator, SpiralParameters, SpiralPoint};
