//! Chart assembly and the time arithmetic behind derived charts.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde_json::{Map, Value};

use crate::error::{AstroError, Result};
use crate::models::{
    Aspect, CelestialPosition, ChartData, ChartType, Coordinates, HouseCusp, HouseSystem,
};

/// Days in a tropical year; one day of progression per year of life
pub const TROPICAL_YEAR_DAYS: f64 = 365.2422;

/// When and where a chart is cast
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub chart_type: ChartType,
    pub instant: DateTime<Utc>,
    pub timezone: String,
    pub coordinates: Coordinates,
    pub house_system: HouseSystem,
}

pub fn assemble_chart(
    frame: ChartFrame,
    positions: Vec<CelestialPosition>,
    houses: Vec<HouseCusp>,
    aspects: Vec<Aspect>,
    metadata: Map<String, Value>,
) -> Result<ChartData> {
    if positions.is_empty() {
        return Err(AstroError::ChartAssembly("no celestial positions".to_string()));
    }
    if houses.is_empty() {
        return Err(AstroError::ChartAssembly("no house cusps".to_string()));
    }

    Ok(ChartData {
        chart_type: frame.chart_type,
        date_time: frame.instant,
        timezone: frame.timezone,
        coordinates: frame.coordinates,
        house_system: frame.house_system,
        planets: positions,
        houses,
        aspects,
        metadata,
    })
}

/// Arithmetic midpoint in time and space of two birth moments.
///
/// Latitude and longitude are averaged as plain numbers, so two places on
/// either side of the antimeridian meet near longitude 0.
pub fn composite_midpoint(
    a: (DateTime<Utc>, Coordinates),
    b: (DateTime<Utc>, Coordinates),
) -> (DateTime<Utc>, Coordinates) {
    let (time_a, place_a) = a;
    let (time_b, place_b) = b;

    let instant = time_a + (time_b - time_a) / 2;
    let coordinates = Coordinates {
        latitude: (place_a.latitude + place_b.latitude) / 2.0,
        longitude: (place_a.longitude + place_b.longitude) / 2.0,
    };
    (instant, coordinates)
}

/// Age in tropical years between two instants
pub fn age_in_years(birth: DateTime<Utc>, target: DateTime<Utc>) -> f64 {
    (target - birth).num_seconds() as f64 / 86_400.0 / TROPICAL_YEAR_DAYS
}

/// Secondary progression: the moment `age` days after birth.
pub fn progressed_instant(birth: DateTime<Utc>, target: DateTime<Utc>) -> DateTime<Utc> {
    let offset_seconds = (target - birth).num_seconds() as f64 / TROPICAL_YEAR_DAYS;
    birth + Duration::seconds(offset_seconds.round() as i64)
}

/// Birthday in `year` at the birth time of day. 29 February falls back to the 28th.
pub fn solar_return_anchor(birth: DateTime<Utc>, year: i32) -> Result<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, birth.month(), birth.day() - 1))
        .ok_or_else(|| AstroError::validation(format!("No birthday exists in year {}", year)))?;
    Ok(date.and_time(birth.time()).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Body;
    use chrono::TimeZone;

    fn frame() -> ChartFrame {
        ChartFrame {
            chart_type: ChartType::Natal,
            instant: Utc.with_ymd_and_hms(1990, 6, 15, 14, 30, 0).unwrap(),
            timezone: "UTC".to_string(),
            coordinates: Coordinates {
                latitude: 40.7,
                longitude: -74.0,
            },
            house_system: HouseSystem::Placidus,
        }
    }

    #[test]
    fn test_assemble_requires_positions_and_houses() {
        let sun = CelestialPosition::new(Body::Sun, 84.0, 0.0, 1.0, 0.95, Some(10));
        let cusps: Vec<HouseCusp> = (0..12).map(|i| HouseCusp::new(i + 1, i as f64 * 30.0)).collect();

        let err = assemble_chart(frame(), vec![], cusps.clone(), vec![], Map::new()).unwrap_err();
        assert!(matches!(err, AstroError::ChartAssembly(_)));
        let err = assemble_chart(frame(), vec![sun.clone()], vec![], vec![], Map::new()).unwrap_err();
        assert!(matches!(err, AstroError::ChartAssembly(_)));

        let chart = assemble_chart(frame(), vec![sun], cusps, vec![], Map::new()).unwrap();
        assert_eq!(chart.planets.len(), 1);
        assert_eq!(chart.houses.len(), 12);
    }

    #[test]
    fn test_composite_midpoint() {
        let a = (
            Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap(),
            Coordinates { latitude: 40.0, longitude: -74.0 },
        );
        let b = (
            Utc.with_ymd_and_hms(1990, 1, 3, 0, 0, 0).unwrap(),
            Coordinates { latitude: 50.0, longitude: 2.0 },
        );
        let (instant, place) = composite_midpoint(a, b);
        assert_eq!(instant, Utc.with_ymd_and_hms(1990, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(place.latitude, 45.0);
        assert_eq!(place.longitude, -36.0);

        let (reversed, _) = composite_midpoint(b, a);
        assert_eq!(reversed, instant);
    }

    #[test]
    fn test_progression_one_day_per_year() {
        let birth = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
        let thirty_years = birth + Duration::seconds((30.0 * TROPICAL_YEAR_DAYS * 86_400.0) as i64);
        let progressed = progressed_instant(birth, thirty_years);
        assert_eq!(progressed, Utc.with_ymd_and_hms(1990, 1, 31, 0, 0, 0).unwrap());
        assert!((age_in_years(birth, thirty_years) - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_solar_return_anchor() {
        let birth = Utc.with_ymd_and_hms(1992, 2, 29, 8, 15, 0).unwrap();
        assert_eq!(
            solar_return_anchor(birth, 2025).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 28, 8, 15, 0).unwrap()
        );
        assert_eq!(
            solar_return_anchor(birth, 2028).unwrap(),
            Utc.with_ymd_and_hms(2028, 2, 29, 8, 15, 0).unwrap()
        );
    }
}
