use serde::{Deserialize, Serialize};

use super::{Body, ZodiacSign};

/// Essential dignity breakdown for one placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DignityScore {
    pub planet: Body,
    pub sign: ZodiacSign,
    pub house: Option<u8>,
    pub ruler: i32,
    pub exalted: i32,
    pub triplicity: i32,
    pub term: i32,
    pub face: i32,
    pub detriment: i32,
    pub fall: i32,
    pub total_score: i32,
}

impl DignityScore {
    pub fn empty(planet: Body, sign: ZodiacSign, house: Option<u8>) -> Self {
        Self {
            planet,
            sign,
            house,
            ruler: 0,
            exalted: 0,
            triplicity: 0,
            term: 0,
            face: 0,
            detriment: 0,
            fall: 0,
            total_score: 0,
        }
    }

    /// Sum of every component
    pub fn component_sum(&self) -> i32 {
        self.ruler
            + self.exalted
            + self.triplicity
            + self.term
            + self.face
            + self.detriment
            + self.fall
    }
}
