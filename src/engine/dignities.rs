//! Essential dignities from a static (body, sign) table.

use crate::models::{Body, DignityScore, ZodiacSign};

const RULERSHIP: i32 = 5;
const EXALTATION: i32 = 4;
const DETRIMENT: i32 = -5;
const FALL: i32 = -4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dignity {
    Ruler,
    Exalted,
}

fn dignity(body: Body, sign: ZodiacSign) -> Option<Dignity> {
    use Body::*;
    use ZodiacSign::*;

    match (body, sign) {
        (Sun, Leo)
        | (Moon, Cancer)
        | (Mercury, Gemini | Virgo)
        | (Venus, Taurus | Libra)
        | (Mars, Aries | Scorpio)
        | (Jupiter, Sagittarius | Pisces)
        | (Saturn, Capricorn | Aquarius) => Some(Dignity::Ruler),
        (Sun, Aries)
        | (Moon, Taurus)
        | (Venus, Pisces)
        | (Mars, Capricorn)
        | (Jupiter, Cancer)
        | (Saturn, Libra) => Some(Dignity::Exalted),
        _ => None,
    }
}

fn in_detriment(body: Body, sign: ZodiacSign) -> bool {
    use Body::*;
    use ZodiacSign::*;

    matches!(
        (body, sign),
        (Sun, Aquarius)
            | (Moon, Capricorn)
            | (Mercury, Sagittarius | Pisces)
            | (Venus, Aries | Scorpio)
            | (Mars, Libra | Taurus)
            | (Jupiter, Gemini | Virgo)
            | (Saturn, Cancer | Leo)
    )
}

fn in_fall(body: Body, sign: ZodiacSign) -> bool {
    use Body::*;
    use ZodiacSign::*;

    matches!(
        (body, sign),
        (Sun, Libra)
            | (Moon, Scorpio)
            | (Mercury, Pisces)
            | (Venus, Virgo)
            | (Mars, Cancer)
            | (Jupiter, Capricorn)
            | (Saturn, Aries)
    )
}

/// Score a body in a sign. Bodies or signs outside the table score all zero.
pub fn score_planet_dignity(body: Body, sign: ZodiacSign, house: Option<u8>) -> DignityScore {
    let mut score = DignityScore::empty(body, sign, house);

    match dignity(body, sign) {
        Some(Dignity::Ruler) => score.ruler = RULERSHIP,
        Some(Dignity::Exalted) => score.exalted = EXALTATION,
        None => {}
    }
    if in_detriment(body, sign) {
        score.detriment = DETRIMENT;
    }
    if in_fall(body, sign) {
        score.fall = FALL;
    }

    score.total_score = score.component_sum();
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_in_leo_rules() {
        let score = score_planet_dignity(Body::Sun, ZodiacSign::Leo, Some(5));
        assert_eq!(score.ruler, 5);
        assert_eq!(score.exalted, 0);
        assert_eq!(score.total_score, 5);
        assert_eq!(score.house, Some(5));
    }

    #[test]
    fn test_exaltation() {
        let score = score_planet_dignity(Body::Sun, ZodiacSign::Aries, None);
        assert_eq!((score.ruler, score.exalted, score.total_score), (0, 4, 4));
    }

    #[test]
    fn test_mercury_in_virgo_is_ruler_only() {
        let score = score_planet_dignity(Body::Mercury, ZodiacSign::Virgo, None);
        assert_eq!(score.ruler, 5);
        assert_eq!(score.exalted, 0);
    }

    #[test]
    fn test_debilities() {
        let score = score_planet_dignity(Body::Mercury, ZodiacSign::Pisces, None);
        assert_eq!((score.detriment, score.fall), (-5, -4));
        assert_eq!(score.total_score, -9);
        assert_eq!(score_planet_dignity(Body::Sun, ZodiacSign::Libra, None).total_score, -4);
    }

    #[test]
    fn test_absent_entries_score_zero() {
        let score = score_planet_dignity(Body::Pluto, ZodiacSign::Scorpio, Some(8));
        assert_eq!(score.component_sum(), 0);
        assert_eq!(score.total_score, 0);
        let score = score_planet_dignity(Body::Sun, ZodiacSign::Gemini, None);
        assert_eq!(score.total_score, 0);
    }

    #[test]
    fn test_total_always_equals_component_sum() {
        for body in Body::ALL {
            for sign in ZodiacSign::ALL {
                let score = score_planet_dignity(body, sign, None);
                assert_eq!(score.total_score, score.component_sum());
                assert!(!(score.ruler != 0 && score.exalted != 0));
            }
        }
    }
}
