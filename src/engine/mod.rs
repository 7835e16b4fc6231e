//! Pure astrological computation. Nothing in here touches I/O; positions
//! arrive from an ephemeris snapshot and leave as chart data.

pub mod aspects;
pub mod chart;
pub mod compatibility;
pub mod coordinates;
pub mod dignities;
pub mod placement;

pub use aspects::{
    all_pairs_aspects, angular_distance, chart_aspects, detect_aspect, measure_aspect,
    signed_separation,
};
pub use chart::{
    age_in_years, assemble_chart, composite_midpoint, progressed_instant, solar_return_anchor,
    ChartFrame,
};
pub use compatibility::score_compatibility;
pub use coordinates::{normalize_coordinate, Axis, CoordinateInput};
pub use dignities::score_planet_dignity;
pub use placement::{planet_in_house, resolve_snapshot};
