use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Celestial bodies and calculated points a chart can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    /// True lunar node
    NorthNode,
    SouthNode,
    Chiron,
    /// Mean lunar apogee (Black Moon Lilith)
    Lilith,
    Ceres,
    Pallas,
    Juno,
    Vesta,
    PartOfFortune,
    Vertex,
}

impl Body {
    pub const ALL: [Body; 20] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::NorthNode,
        Body::SouthNode,
        Body::Chiron,
        Body::Lilith,
        Body::Ceres,
        Body::Pallas,
        Body::Juno,
        Body::Vesta,
        Body::PartOfFortune,
        Body::Vertex,
    ];

    /// The ten planets used when a request names no objects
    pub fn planets() -> &'static [Body] {
        &Self::ALL[..10]
    }

    /// Get Swiss Ephemeris body ID; derived points have none
    pub fn swe_id(&self) -> Option<i32> {
        let id = match self {
            Body::Sun => 0,
            Body::Moon => 1,
            Body::Mercury => 2,
            Body::Venus => 3,
            Body::Mars => 4,
            Body::Jupiter => 5,
            Body::Saturn => 6,
            Body::Uranus => 7,
            Body::Neptune => 8,
            Body::Pluto => 9,
            Body::NorthNode => 11, // SE_TRUE_NODE
            Body::Lilith => 12,    // SE_MEAN_APOG
            Body::Chiron => 15,
            Body::Ceres => 17,
            Body::Pallas => 18,
            Body::Juno => 19,
            Body::Vesta => 20,
            Body::SouthNode | Body::PartOfFortune | Body::Vertex => return None,
        };
        Some(id)
    }

    /// Minor bodies gated behind the asteroid setting
    pub fn is_asteroid(&self) -> bool {
        matches!(
            self,
            Body::Chiron | Body::Ceres | Body::Pallas | Body::Juno | Body::Vesta
        )
    }

    /// Points that exist only as a function of other readings or the house frame
    pub fn is_derived(&self) -> bool {
        self.swe_id().is_none()
    }

    /// Wire name, matching the serde representation
    pub fn key(&self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
            Body::NorthNode => "north_node",
            Body::SouthNode => "south_node",
            Body::Chiron => "chiron",
            Body::Lilith => "lilith",
            Body::Ceres => "ceres",
            Body::Pallas => "pallas",
            Body::Juno => "juno",
            Body::Vesta => "vesta",
            Body::PartOfFortune => "part_of_fortune",
            Body::Vertex => "vertex",
        }
    }
}

impl FromStr for Body {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Body::ALL
            .iter()
            .copied()
            .find(|body| body.key() == wanted)
            .ok_or_else(|| format!("Unknown celestial object: {}", s))
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::NorthNode => "North Node",
            Body::SouthNode => "South Node",
            Body::Chiron => "Chiron",
            Body::Lilith => "Lilith",
            Body::Ceres => "Ceres",
            Body::Pallas => "Pallas",
            Body::Juno => "Juno",
            Body::Vesta => "Vesta",
            Body::PartOfFortune => "Part of Fortune",
            Body::Vertex => "Vertex",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("sun".parse::<Body>(), Ok(Body::Sun));
        assert_eq!(" North_Node ".parse::<Body>(), Ok(Body::NorthNode));
        assert!("planet_x".parse::<Body>().is_err());
    }

    #[test]
    fn test_key_matches_serde() {
        for body in Body::ALL {
            let json = serde_json::to_value(body).unwrap();
            assert_eq!(json.as_str(), Some(body.key()));
        }
    }

    #[test]
    fn test_derived_points() {
        assert!(Body::SouthNode.is_derived());
        assert!(Body::PartOfFortune.is_derived());
        assert!(!Body::Chiron.is_derived());
        assert_eq!(Body::planets().len(), 10);
        assert_eq!(Body::planets().last(), Some(&Body::Pluto));
    }
}
