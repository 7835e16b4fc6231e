use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Body;

/// The five major aspects, in detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectType {
    Conjunction,
    Sextile,
    Square,
    Trine,
    Opposition,
}

/// Whether an aspect is counted as supportive or as tension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectNature {
    Harmonious,
    Challenging,
}

impl AspectType {
    /// Fixed evaluation order; the first type within orb wins.
    pub const ALL: [AspectType; 5] = [
        AspectType::Conjunction,
        AspectType::Sextile,
        AspectType::Square,
        AspectType::Trine,
        AspectType::Opposition,
    ];

    /// Get the exact angle for this aspect
    pub fn angle(&self) -> f64 {
        match self {
            AspectType::Conjunction => 0.0,
            AspectType::Sextile => 60.0,
            AspectType::Square => 90.0,
            AspectType::Trine => 120.0,
            AspectType::Opposition => 180.0,
        }
    }

    /// Get the default orb (tolerance) for this aspect
    pub fn default_orb(&self) -> f64 {
        match self {
            AspectType::Sextile => 6.0,
            _ => 8.0,
        }
    }

    pub fn nature(&self) -> AspectNature {
        match self {
            AspectType::Square | AspectType::Opposition => AspectNature::Challenging,
            _ => AspectNature::Harmonious,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AspectType::Conjunction => "conjunction",
            AspectType::Sextile => "sextile",
            AspectType::Square => "square",
            AspectType::Trine => "trine",
            AspectType::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for AspectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AspectType::ALL
            .iter()
            .copied()
            .find(|aspect| aspect.key() == wanted)
            .ok_or_else(|| format!("Unknown aspect type: {}", s))
    }
}

/// Orb tolerance per aspect type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbTable {
    orbs: [f64; 5],
}

impl Default for OrbTable {
    fn default() -> Self {
        let mut orbs = [0.0; 5];
        for aspect in AspectType::ALL {
            orbs[aspect as usize] = aspect.default_orb();
        }
        Self { orbs }
    }
}

impl OrbTable {
    pub fn get(&self, aspect: AspectType) -> f64 {
        self.orbs[aspect as usize]
    }

    pub fn with_orb(mut self, aspect: AspectType, orb: f64) -> Self {
        self.orbs[aspect as usize] = orb;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (AspectType, f64)> + '_ {
        AspectType::ALL.iter().map(move |aspect| (*aspect, self.get(*aspect)))
    }
}

/// An aspect detected between two placements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aspect {
    pub planet1: Body,
    pub planet2: Body,
    pub aspect_type: AspectType,
    /// Signed separation `planet2 - planet1`, folded into (-180, 180]
    pub separation: f64,
    /// Exact angle of the aspect type
    pub angle: f64,
    /// Distance from exact, in degrees
    pub orb: f64,
    pub applying: bool,
    pub separating: bool,
}

impl Aspect {
    pub fn nature(&self) -> AspectNature {
        self.aspect_type.nature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_orbs() {
        let table = OrbTable::default();
        assert_eq!(table.get(AspectType::Conjunction), 8.0);
        assert_eq!(table.get(AspectType::Sextile), 6.0);
        assert_eq!(table.get(AspectType::Opposition), 8.0);
        assert!(table.iter().all(|(_, orb)| orb <= 8.0));
    }

    #[test]
    fn test_override_keeps_other_orbs() {
        let table = OrbTable::default().with_orb(AspectType::Trine, 2.5);
        assert_eq!(table.get(AspectType::Trine), 2.5);
        assert_eq!(table.get(AspectType::Square), 8.0);
    }

    #[test]
    fn test_nature() {
        assert_eq!(AspectType::Conjunction.nature(), AspectNature::Harmonious);
        assert_eq!(AspectType::Square.nature(), AspectNature::Challenging);
        assert_eq!("Trine".parse::<AspectType>(), Ok(AspectType::Trine));
        assert!("quintile".parse::<AspectType>().is_err());
    }
}
