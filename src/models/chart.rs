use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::{degree_in_sign, Aspect, Body, ZodiacSign};

/// Geographic location in decimal degrees (north and east positive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseSystem {
    Placidus,
    Koch,
    Porphyrius,
    Regiomontanus,
    Campanus,
    Equal,
    WholeSign,
    Alcabitus,
    Krusinski,
    Morinus,
}

impl HouseSystem {
    pub const ALL: [HouseSystem; 10] = [
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::Porphyrius,
        HouseSystem::Regiomontanus,
        HouseSystem::Campanus,
        HouseSystem::Equal,
        HouseSystem::WholeSign,
        HouseSystem::Alcabitus,
        HouseSystem::Krusinski,
        HouseSystem::Morinus,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            HouseSystem::Placidus => "placidus",
            HouseSystem::Koch => "koch",
            HouseSystem::Porphyrius => "porphyrius",
            HouseSystem::Regiomontanus => "regiomontanus",
            HouseSystem::Campanus => "campanus",
            HouseSystem::Equal => "equal",
            HouseSystem::WholeSign => "whole_sign",
            HouseSystem::Alcabitus => "alcabitus",
            HouseSystem::Krusinski => "krusinski",
            HouseSystem::Morinus => "morinus",
        }
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HouseSystem::Placidus => "Placidus",
            HouseSystem::Koch => "Koch",
            HouseSystem::Porphyrius => "Porphyry",
            HouseSystem::Regiomontanus => "Regiomontanus",
            HouseSystem::Campanus => "Campanus",
            HouseSystem::Equal => "Equal",
            HouseSystem::WholeSign => "Whole Sign",
            HouseSystem::Alcabitus => "Alcabitius",
            HouseSystem::Krusinski => "Krusinski",
            HouseSystem::Morinus => "Morinus",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for HouseSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HouseSystem::ALL
            .iter()
            .copied()
            .find(|system| system.key() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = HouseSystem::ALL.iter().map(|s| s.key()).collect();
                format!(
                    "Invalid house system: {}. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Natal,
    Progressed,
    SolarReturn,
    Composite,
    Synastry,
    Transits,
}

/// A body placed on the ecliptic, with its sign and house resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialPosition {
    pub name: Body,
    /// Ecliptic longitude (0-360 degrees)
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub distance: f64,
    /// Speed in longitude (degrees per day, negative = retrograde)
    #[serde(default)]
    pub speed: f64,
    pub sign: ZodiacSign,
    /// Degree within the sign (0-29.999...)
    #[serde(default)]
    pub degree: f64,
    #[serde(default)]
    pub house: Option<u8>,
    #[serde(default)]
    pub retrograde: bool,
}

impl CelestialPosition {
    pub fn new(
        name: Body,
        longitude: f64,
        latitude: f64,
        distance: f64,
        speed: f64,
        house: Option<u8>,
    ) -> Self {
        let longitude = longitude.rem_euclid(360.0);
        Self {
            name,
            longitude,
            latitude,
            distance,
            speed,
            sign: ZodiacSign::from_longitude(longitude),
            degree: degree_in_sign(longitude),
            house,
            retrograde: speed < 0.0,
        }
    }

    /// Recompute the fields that follow from longitude and speed.
    pub fn refreshed(self) -> Self {
        Self::new(
            self.name,
            self.longitude,
            self.latitude,
            self.distance,
            self.speed,
            self.house,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusp {
    pub number: u8,
    /// Cusp longitude (0-360 degrees)
    pub cusp: f64,
    pub sign: ZodiacSign,
}

impl HouseCusp {
    pub fn new(number: u8, cusp: f64) -> Self {
        let cusp = cusp.rem_euclid(360.0);
        Self {
            number,
            cusp,
            sign: ZodiacSign::from_longitude(cusp),
        }
    }
}

/// A fully assembled chart, as returned by every chart tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub chart_type: ChartType,
    pub date_time: DateTime<Utc>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub coordinates: Coordinates,
    #[serde(default = "default_house_system")]
    pub house_system: HouseSystem,
    pub planets: Vec<CelestialPosition>,
    pub houses: Vec<HouseCusp>,
    #[serde(default)]
    pub aspects: Vec<Aspect>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_house_system() -> HouseSystem {
    HouseSystem::Placidus
}

impl ChartData {
    pub fn position(&self, body: Body) -> Option<&CelestialPosition> {
        self.planets.iter().find(|p| p.name == body)
    }

    pub fn cusp_longitudes(&self) -> Vec<f64> {
        self.houses.iter().map(|h| h.cusp).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_derives_sign_and_retrograde() {
        let pos = CelestialPosition::new(Body::Mercury, 365.0, 0.0, 1.0, -0.4, Some(3));
        assert!((pos.longitude - 5.0).abs() < 1e-9);
        assert_eq!(pos.sign, ZodiacSign::Aries);
        assert!(pos.retrograde);
    }

    #[test]
    fn test_house_system_names() {
        assert_eq!("Whole_Sign".parse::<HouseSystem>(), Ok(HouseSystem::WholeSign));
        let err = "topocentric".parse::<HouseSystem>().unwrap_err();
        assert!(err.contains("placidus"));
    }

    #[test]
    fn test_chart_data_defaults_on_deserialize() {
        let chart: ChartData = serde_json::from_value(serde_json::json!({
            "chart_type": "natal",
            "date_time": "2000-01-01T12:00:00Z",
            "coordinates": {"latitude": 51.5, "longitude": -0.1},
            "planets": [],
            "houses": []
        }))
        .unwrap();
        assert_eq!(chart.timezone, "UTC");
        assert_eq!(chart.house_system, HouseSystem::Placidus);
        assert!(chart.aspects.is_empty());
    }
}
