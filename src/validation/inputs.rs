//! Typed tool arguments. Their JSON Schemas are what `tools/list` advertises.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_datetime, parse_house_system, parse_objects, validate_timezone};
use crate::config::Settings;
use crate::engine::{normalize_coordinate, Axis, CoordinateInput};
use crate::error::Result;
use crate::models::{Body, Coordinates, HouseSystem};

/// Birth moment and place for one person
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NatalChartInput {
    #[schemars(
        description = "Birth date and time, e.g. '1990-06-15 14:30:00' or ISO 8601 with an offset"
    )]
    pub date_time: String,
    #[schemars(description = "Latitude in decimal degrees or as '32n43'")]
    pub latitude: CoordinateInput,
    #[schemars(description = "Longitude in decimal degrees or as '117w09'")]
    pub longitude: CoordinateInput,
    #[schemars(
        description = "IANA timezone (e.g. 'America/New_York') or UTC offset; naive times default to UTC"
    )]
    pub timezone: Option<String>,
    #[schemars(description = "House system (default: placidus)")]
    pub house_system: Option<String>,
    #[schemars(description = "Celestial objects to include (default: the ten planets)")]
    pub objects: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LocationInput {
    #[schemars(description = "Latitude in decimal degrees or as '32n43'")]
    pub latitude: CoordinateInput,
    #[schemars(description = "Longitude in decimal degrees or as '117w09'")]
    pub longitude: CoordinateInput,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProgressedChartInput {
    #[schemars(description = "Natal chart data as returned by generate_natal_chart")]
    pub natal_chart: Value,
    #[schemars(description = "Date to progress the chart to")]
    pub progression_date: String,
    #[schemars(description = "House system (default: the natal chart's)")]
    pub house_system: Option<String>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SolarReturnInput {
    #[schemars(description = "Birth data of the chart owner")]
    pub birth_data: NatalChartInput,
    #[schemars(description = "Year of the solar return")]
    pub return_year: i32,
    #[schemars(description = "Where the owner spends the birthday (default: birth place)")]
    pub return_location: Option<LocationInput>,
    #[schemars(description = "House system (default: placidus)")]
    pub house_system: Option<String>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CompositeChartInput {
    #[schemars(description = "Birth data of the first person")]
    pub person1: NatalChartInput,
    #[schemars(description = "Birth data of the second person")]
    pub person2: NatalChartInput,
    #[schemars(description = "House system for the composite chart (default: placidus)")]
    pub house_system: Option<String>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SynastryInput {
    #[schemars(description = "Birth data of the first person")]
    pub person1: NatalChartInput,
    #[schemars(description = "Birth data of the second person")]
    pub person2: NatalChartInput,
    #[schemars(description = "Orb overrides by aspect type, e.g. {\"trine\": 6}")]
    pub aspect_orbs: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TransitsInput {
    #[schemars(description = "Natal chart data as returned by generate_natal_chart")]
    pub natal_chart: Value,
    #[schemars(description = "Date of the transits; naive times use the natal timezone")]
    pub transit_date: String,
    #[schemars(description = "Transiting objects to include (default: the ten planets)")]
    pub objects: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InterpretAspectsInput {
    #[schemars(description = "Chart data containing aspects")]
    pub chart_data: Value,
    #[schemars(description = "Aspect types to include (default: all)")]
    pub aspect_types: Option<Vec<String>>,
    #[schemars(description = "basic, medium or detailed (default: medium)")]
    pub detail_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DignitiesInput {
    #[schemars(description = "Chart data containing planetary positions")]
    pub chart_data: Value,
}

/// A validated request to cast one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub instant: DateTime<Utc>,
    pub timezone: String,
    pub coordinates: Coordinates,
    pub house_system: HouseSystem,
    pub bodies: Vec<Body>,
}

impl LocationInput {
    pub fn to_coordinates(&self) -> Result<Coordinates> {
        Ok(Coordinates {
            latitude: normalize_coordinate(&self.latitude, Axis::Latitude)?,
            longitude: normalize_coordinate(&self.longitude, Axis::Longitude)?,
        })
    }
}

impl NatalChartInput {
    pub fn to_request(&self, settings: &Settings) -> Result<ChartRequest> {
        let timezone = self
            .timezone
            .as_deref()
            .map(str::trim)
            .filter(|tz| !tz.is_empty());
        if let Some(tz) = timezone {
            validate_timezone(tz)?;
        }

        Ok(ChartRequest {
            instant: parse_datetime(&self.date_time, timezone)?,
            timezone: timezone.unwrap_or("UTC").to_string(),
            coordinates: Coordinates {
                latitude: normalize_coordinate(&self.latitude, Axis::Latitude)?,
                longitude: normalize_coordinate(&self.longitude, Axis::Longitude)?,
            },
            house_system: parse_house_system(self.house_system.as_deref(), settings)?,
            bodies: parse_objects(self.objects.as_deref(), settings)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AstroError;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_natal_input_to_request() {
        let input: NatalChartInput = serde_json::from_value(json!({
            "date_time": "1990-06-15 14:30:00",
            "latitude": "40n42",
            "longitude": -74.006,
            "timezone": "America/New_York",
            "house_system": "koch"
        }))
        .unwrap();
        let request = input.to_request(&Settings::default()).unwrap();
        assert_eq!(
            request.instant,
            Utc.with_ymd_and_hms(1990, 6, 15, 18, 30, 0).unwrap()
        );
        assert!((request.coordinates.latitude - 40.7).abs() < 1e-9);
        assert_eq!(request.house_system, HouseSystem::Koch);
        assert_eq!(request.bodies.len(), 10);
        assert_eq!(request.timezone, "America/New_York");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<NatalChartInput, _> = serde_json::from_value(json!({
            "date_time": "1990-06-15",
            "latitude": 0,
            "longitude": 0,
            "planet": "x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_coordinate_is_reported() {
        let input: NatalChartInput = serde_json::from_value(json!({
            "date_time": "1990-06-15",
            "latitude": "not-a-coord",
            "longitude": 0
        }))
        .unwrap();
        assert!(matches!(
            input.to_request(&Settings::default()),
            Err(AstroError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_schema_lists_required_fields() {
        let schema = serde_json::to_value(schemars::schema_for!(NatalChartInput)).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("date_time")));
        assert!(required.contains(&json!("latitude")));
        assert!(!required.contains(&json!("timezone")));
    }
}
