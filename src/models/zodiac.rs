use serde::{Deserialize, Serialize};
use std::fmt;

/// Zodiac signs in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    /// Sign containing an ecliptic longitude; any finite input is wrapped into [0, 360).
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized = longitude.rem_euclid(360.0);
        let sign_index = (normalized / 30.0).floor() as usize;
        Self::from_index(sign_index)
    }

    /// Get sign from index (0 = Aries, 11 = Pisces)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Get sign index (0 = Aries, 11 = Pisces)
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn element(&self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    pub fn modality(&self) -> Modality {
        match self.index() % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        };
        write!(f, "{}", name)
    }
}

/// Degree within the sign, in [0, 30).
pub fn degree_in_sign(longitude: f64) -> f64 {
    longitude.rem_euclid(360.0) % 30.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zodiac_sign() {
        assert_eq!(ZodiacSign::from_longitude(280.0), ZodiacSign::Capricorn);
        assert_eq!(ZodiacSign::from_longitude(45.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(120.5), ZodiacSign::Leo);
    }

    #[test]
    fn test_wraps_out_of_range_longitudes() {
        assert_eq!(ZodiacSign::from_longitude(360.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(-1.0), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(725.0), ZodiacSign::Aries);
    }

    #[test]
    fn test_element_and_modality() {
        assert_eq!(ZodiacSign::Leo.element(), Element::Fire);
        assert_eq!(ZodiacSign::Scorpio.element(), Element::Water);
        assert_eq!(ZodiacSign::Capricorn.modality(), Modality::Cardinal);
        assert_eq!(ZodiacSign::Pisces.modality(), Modality::Mutable);
        assert!((degree_in_sign(120.5) - 0.5).abs() < 1e-9);
    }
}
