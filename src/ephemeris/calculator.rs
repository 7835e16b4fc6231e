//! Swiss Ephemeris wrapper for planetary calculations
//!
//! This module provides safe Rust wrappers around the libswisseph-sys FFI bindings.
//! The C library keeps global state, so every call goes through one mutex and
//! runs on the blocking pool.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Timelike};
use tracing::debug;

use super::houses::calc_houses;
use super::{BodyReading, EphemerisError, EphemerisProvider, EphemerisRequest, EphemerisSnapshot};
use crate::models::Body;

// Swiss Ephemeris constants
const SE_GREG_CAL: i32 = 1;
const SEFLG_SPEED: i32 = 256; // Include speed in calculations
const SEFLG_SWIEPH: i32 = 2; // Use Swiss Ephemeris

static INIT: Once = Once::new();

/// Initialize Swiss Ephemeris (first call wins).
///
/// Without a data path the library falls back to the Moshier analytical
/// ephemeris, which covers the planets but not the asteroids.
pub fn init_ephemeris(path: Option<&Path>) -> Result<(), EphemerisError> {
    let c_path = path
        .map(|p| CString::new(p.to_string_lossy().into_owned()))
        .transpose()
        .map_err(|e| EphemerisError::Path(e.to_string()))?;

    INIT.call_once(|| unsafe {
        match &c_path {
            Some(p) => libswisseph_sys::swe_set_ephe_path(p.as_ptr() as *mut _),
            None => libswisseph_sys::swe_set_ephe_path(std::ptr::null_mut()),
        }
    });
    Ok(())
}

/// Convert a UT date/time to Julian Day
pub fn datetime_to_julian_day(datetime: NaiveDateTime) -> f64 {
    let year = datetime.date().year();
    let month = datetime.date().month() as i32;
    let day = datetime.date().day() as i32;
    let hour = datetime.time().hour() as f64
        + datetime.time().minute() as f64 / 60.0
        + datetime.time().second() as f64 / 3600.0;

    unsafe { libswisseph_sys::swe_julday(year, month, day, hour, SE_GREG_CAL) }
}

/// Calculate position of a body with a Swiss Ephemeris id at a given Julian Day
pub fn calc_body_position(body: Body, julian_day: f64) -> Result<BodyReading, EphemerisError> {
    let swe_id = body.swe_id().ok_or(EphemerisError::Unsupported(body))?;

    let mut xx: [f64; 6] = [0.0; 6];
    let mut serr: [i8; 256] = [0; 256];

    let iflg = SEFLG_SPEED | SEFLG_SWIEPH;

    let ret = unsafe {
        libswisseph_sys::swe_calc_ut(julian_day, swe_id, iflg, xx.as_mut_ptr(), serr.as_mut_ptr())
    };

    if ret < 0 {
        let message = unsafe { CStr::from_ptr(serr.as_ptr()) }
            .to_string_lossy()
            .to_string();
        return Err(EphemerisError::Calculation { body, message });
    }

    Ok(BodyReading {
        body,
        longitude: xx[0],
        latitude: xx[1],
        distance: xx[2],
        speed: xx[3],
    })
}

/// Compute every requested body plus the house frame in one pass.
fn compute_snapshot(request: &EphemerisRequest) -> Result<EphemerisSnapshot, EphemerisError> {
    let julian_day = datetime_to_julian_day(request.instant.naive_utc());
    let houses = calc_houses(
        julian_day,
        request.location.latitude,
        request.location.longitude,
        request.house_system,
    )?;

    let mut bodies = Vec::with_capacity(request.bodies.len());
    for body in &request.bodies {
        let reading = match body {
            Body::SouthNode => {
                let node = calc_body_position(Body::NorthNode, julian_day)?;
                BodyReading {
                    body: Body::SouthNode,
                    longitude: (node.longitude + 180.0).rem_euclid(360.0),
                    latitude: -node.latitude,
                    ..node
                }
            }
            Body::PartOfFortune => {
                let sun = calc_body_position(Body::Sun, julian_day)?;
                let moon = calc_body_position(Body::Moon, julian_day)?;
                BodyReading {
                    speed: moon.speed - sun.speed,
                    ..BodyReading::point(
                        Body::PartOfFortune,
                        houses.ascendant + moon.longitude - sun.longitude,
                    )
                }
            }
            Body::Vertex => BodyReading::point(Body::Vertex, houses.vertex),
            other => calc_body_position(*other, julian_day)?,
        };
        bodies.push(reading);
    }

    Ok(EphemerisSnapshot {
        bodies,
        cusps: houses.cusps.to_vec(),
    })
}

/// Provider backed by the Swiss Ephemeris C library
#[derive(Clone)]
pub struct SwissEphemeris {
    lock: Arc<Mutex<()>>,
}

impl SwissEphemeris {
    pub fn new(ephemeris_path: Option<&Path>) -> Result<Self, EphemerisError> {
        init_ephemeris(ephemeris_path)?;
        Ok(Self {
            lock: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl EphemerisProvider for SwissEphemeris {
    fn name(&self) -> &str {
        "swiss_ephemeris"
    }

    async fn calculate(
        &self,
        request: &EphemerisRequest,
    ) -> Result<EphemerisSnapshot, EphemerisError> {
        debug!(
            instant = %request.instant,
            bodies = request.bodies.len(),
            "swiss ephemeris request"
        );
        let request = request.clone();
        let lock = Arc::clone(&self.lock);

        tokio::task::spawn_blocking(move || {
            let _guard = lock
                .lock()
                .map_err(|_| EphemerisError::Task("ephemeris lock poisoned".to_string()))?;
            compute_snapshot(&request)
        })
        .await
        .map_err(|e| EphemerisError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, HouseSystem};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_julian_day_conversion() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        // J2000.0 epoch is Julian Day 2451545.0 at noon
        assert!((datetime_to_julian_day(date) - 2451544.5).abs() < 0.01);
    }

    #[test]
    fn test_planet_calculation() {
        init_ephemeris(None).unwrap();
        let jd = datetime_to_julian_day(
            NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        );
        let sun = calc_body_position(Body::Sun, jd).unwrap();

        // Sun should be around 280° (Capricorn) on Jan 1, 2000
        assert!(sun.longitude > 270.0 && sun.longitude < 290.0);
        assert!(sun.speed > 0.9 && sun.speed < 1.1);
    }

    #[test]
    fn test_derived_points_have_no_swe_id() {
        assert!(matches!(
            calc_body_position(Body::SouthNode, 2451545.0),
            Err(EphemerisError::Unsupported(Body::SouthNode))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_with_derived_points() {
        let provider = SwissEphemeris::new(None).unwrap();
        let request = EphemerisRequest {
            instant: Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap(),
            location: Coordinates {
                latitude: 51.5,
                longitude: -0.1,
            },
            house_system: HouseSystem::Placidus,
            bodies: vec![Body::NorthNode, Body::SouthNode, Body::PartOfFortune],
        };
        let snapshot = provider.calculate(&request).await.unwrap();

        assert_eq!(snapshot.cusps.len(), 12);
        assert_eq!(snapshot.bodies.len(), 3);
        let north = snapshot.bodies[0].longitude;
        let south = snapshot.bodies[1].longitude;
        assert!(((south - north).rem_euclid(360.0) - 180.0).abs() < 1e-9);
    }
}
