//! Turns a provider snapshot into placed positions and house cusps.

use crate::ephemeris::EphemerisSnapshot;
use crate::error::{AstroError, Result};
use crate::models::{Body, CelestialPosition, HouseCusp};

/// Determine which house (1-12) a longitude falls in.
/// A body is in a house if its longitude is between that cusp and the next one.
pub fn planet_in_house(longitude: f64, cusps: &[f64]) -> Option<u8> {
    if cusps.len() != 12 {
        return None;
    }
    let lon = longitude.rem_euclid(360.0);

    for i in 0..12 {
        let cusp_start = cusps[i];
        let cusp_end = cusps[(i + 1) % 12];

        // Handle wrap-around at 360°/0°
        let in_house = if cusp_start <= cusp_end {
            lon >= cusp_start && lon < cusp_end
        } else {
            lon >= cusp_start || lon < cusp_end
        };

        if in_house {
            return Some((i + 1) as u8);
        }
    }

    None
}

/// Check a snapshot and place the requested bodies it carries, in request order.
///
/// Bodies the provider left out are skipped. Fails when none of the requested
/// bodies came back, when a reading is non-finite, or when there are not
/// exactly twelve cusps.
pub fn resolve_snapshot(
    snapshot: &EphemerisSnapshot,
    requested: &[Body],
) -> Result<(Vec<CelestialPosition>, Vec<HouseCusp>)> {
    if snapshot.cusps.len() != 12 {
        return Err(AstroError::computation(format!(
            "ephemeris returned {} house cusps, expected 12",
            snapshot.cusps.len()
        )));
    }
    if snapshot.cusps.iter().any(|c| !c.is_finite()) {
        return Err(AstroError::computation(
            "ephemeris returned a non-finite house cusp",
        ));
    }

    let cusps: Vec<f64> = snapshot.cusps.iter().map(|c| c.rem_euclid(360.0)).collect();
    let houses = cusps
        .iter()
        .enumerate()
        .map(|(i, cusp)| HouseCusp::new((i + 1) as u8, *cusp))
        .collect();

    let positions = requested
        .iter()
        .filter_map(|body| snapshot.bodies.iter().find(|r| r.body == *body))
        .map(|reading| {
            let values = [
                reading.longitude,
                reading.latitude,
                reading.distance,
                reading.speed,
            ];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(AstroError::computation(format!(
                    "ephemeris returned a non-finite reading for {}",
                    reading.body
                )));
            }
            Ok(CelestialPosition::new(
                reading.body,
                reading.longitude,
                reading.latitude,
                reading.distance,
                reading.speed,
                planet_in_house(reading.longitude, &cusps),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    if positions.is_empty() && !requested.is_empty() {
        return Err(AstroError::computation(
            "ephemeris returned none of the requested bodies",
        ));
    }

    Ok((positions, houses))
}
