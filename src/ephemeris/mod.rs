//! Ephemeris providers: where planetary longitudes and house cusps come from.
//!
//! The engine only ever sees an [`EphemerisSnapshot`]; it never calls into the
//! Swiss Ephemeris directly. Snapshots are checked for completeness before any
//! chart is assembled from them.

pub mod calculator;
pub mod fixed;
pub mod houses;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Body, Coordinates, HouseSystem};

pub use calculator::{datetime_to_julian_day, init_ephemeris, SwissEphemeris};
pub use fixed::FixedEphemeris;
pub use houses::{calc_houses, house_system_code, HousePositions};

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("Swiss Ephemeris error for {body}: {message}")]
    Calculation { body: Body, message: String },

    #[error("Failed to calculate houses: {0}")]
    Houses(String),

    #[error("{0} is not available from this ephemeris")]
    Unsupported(Body),

    #[error("Invalid ephemeris path: {0}")]
    Path(String),

    #[error("Ephemeris task failed: {0}")]
    Task(String),
}

/// Everything a provider needs to place bodies and houses for one moment
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisRequest {
    pub instant: DateTime<Utc>,
    pub location: Coordinates,
    pub house_system: HouseSystem,
    pub bodies: Vec<Body>,
}

/// Raw reading for one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyReading {
    pub body: Body,
    pub longitude: f64,
    pub latitude: f64,
    pub distance: f64,
    /// Speed in longitude (degrees per day)
    pub speed: f64,
}

impl BodyReading {
    /// A point with no latitude, distance or motion of its own
    pub fn point(body: Body, longitude: f64) -> Self {
        Self {
            body,
            longitude: longitude.rem_euclid(360.0),
            latitude: 0.0,
            distance: 0.0,
            speed: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EphemerisSnapshot {
    pub bodies: Vec<BodyReading>,
    /// House cusp longitudes, index 0 = 1st house
    pub cusps: Vec<f64>,
}

/// Source of body positions and house cusps.
///
/// Implementations must be safe to call concurrently; a caller that drops the
/// returned future abandons the request.
#[async_trait]
pub trait EphemerisProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn calculate(
        &self,
        request: &EphemerisRequest,
    ) -> Result<EphemerisSnapshot, EphemerisError>;
}
