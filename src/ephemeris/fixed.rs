//! Deterministic provider with linear motion, for offline runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BodyReading, EphemerisError, EphemerisProvider, EphemerisRequest, EphemerisSnapshot};
use crate::models::Body;

/// 2000-01-01 12:00 UTC as a Unix timestamp
const J2000_UNIX_SECONDS: i64 = 946_728_000;

#[derive(Debug, Clone, Copy)]
struct Motion {
    longitude: f64,
    speed: f64,
}

/// Each body moves at a constant speed from its longitude at the epoch
/// (J2000, 2000-01-01 12:00 UTC). Houses are equal houses from a fixed
/// ascendant unless explicit cusps are supplied.
#[derive(Debug, Clone)]
pub struct FixedEphemeris {
    motions: HashMap<Body, Motion>,
    ascendant: f64,
    cusps: Option<Vec<f64>>,
}

impl FixedEphemeris {
    pub fn new(ascendant: f64) -> Self {
        Self {
            motions: HashMap::new(),
            ascendant,
            cusps: None,
        }
    }

    /// A body that never moves
    pub fn with_body(self, body: Body, longitude: f64) -> Self {
        self.with_motion(body, longitude, 0.0)
    }

    pub fn with_motion(mut self, body: Body, longitude_at_epoch: f64, speed: f64) -> Self {
        self.motions.insert(
            body,
            Motion {
                longitude: longitude_at_epoch,
                speed,
            },
        );
        self
    }

    /// Report these cusps verbatim instead of equal houses
    pub fn with_cusps(mut self, cusps: Vec<f64>) -> Self {
        self.cusps = Some(cusps);
        self
    }

    fn days_since_epoch(&self, instant: DateTime<Utc>) -> f64 {
        (instant.timestamp() - J2000_UNIX_SECONDS) as f64 / 86_400.0
    }
}

#[async_trait]
impl EphemerisProvider for FixedEphemeris {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn calculate(
        &self,
        request: &EphemerisRequest,
    ) -> Result<EphemerisSnapshot, EphemerisError> {
        let days = self.days_since_epoch(request.instant);

        // Bodies without a configured motion are left out of the snapshot
        let bodies = request
            .bodies
            .iter()
            .filter_map(|body| self.motions.get(body).map(|motion| (*body, motion)))
            .map(|(body, motion)| BodyReading {
                body,
                longitude: (motion.longitude + motion.speed * days).rem_euclid(360.0),
                latitude: 0.0,
                distance: 1.0,
                speed: motion.speed,
            })
            .collect();

        let cusps = match &self.cusps {
            Some(cusps) => cusps.clone(),
            None => (0..12)
                .map(|i| (self.ascendant + 30.0 * i as f64).rem_euclid(360.0))
                .collect(),
        };

        Ok(EphemerisSnapshot { bodies, cusps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, HouseSystem};
    use chrono::TimeZone;

    fn request(instant: DateTime<Utc>, bodies: Vec<Body>) -> EphemerisRequest {
        EphemerisRequest {
            instant,
            location: Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
            house_system: HouseSystem::Equal,
            bodies,
        }
    }

    #[tokio::test]
    async fn test_linear_motion() {
        let provider = FixedEphemeris::new(0.0).with_motion(Body::Sun, 100.0, 1.0);
        let ten_days_later = Utc.with_ymd_and_hms(2000, 1, 11, 12, 0, 0).unwrap();
        let snapshot = provider
            .calculate(&request(ten_days_later, vec![Body::Sun]))
            .await
            .unwrap();
        assert!((snapshot.bodies[0].longitude - 110.0).abs() < 1e-9);
        assert_eq!(snapshot.cusps.len(), 12);
        assert!((snapshot.cusps[3] - 90.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unconfigured_bodies_are_left_out() {
        let provider = FixedEphemeris::new(0.0).with_body(Body::Sun, 120.5);
        let snapshot = provider
            .calculate(&request(Utc::now(), vec![Body::Moon, Body::Sun]))
            .await
            .unwrap();
        assert_eq!(snapshot.bodies.len(), 1);
        assert_eq!(snapshot.bodies[0].body, Body::Sun);
    }
}
