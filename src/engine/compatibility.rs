use crate::models::{Aspect, AspectNature};

/// Balance of harmonious against challenging aspects, on a 0-100 scale.
///
/// An empty list scores 0. Otherwise the score is
/// `((harmonious - challenging) / total + 1) * 50`, clamped to [0, 100].
pub fn score_compatibility(aspects: &[Aspect]) -> f64 {
    if aspects.is_empty() {
        return 0.0;
    }

    let (harmonious, challenging) =
        aspects
            .iter()
            .fold((0usize, 0usize), |(h, c), aspect| match aspect.nature() {
                AspectNature::Harmonious => (h + 1, c),
                AspectNature::Challenging => (h, c + 1),
            });

    let raw = (harmonious as f64 - challenging as f64) / aspects.len() as f64;
    ((raw + 1.0) * 50.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AspectType, Body};

    fn aspect(aspect_type: AspectType) -> Aspect {
        Aspect {
            planet1: Body::Sun,
            planet2: Body::Moon,
            aspect_type,
            separation: aspect_type.angle(),
            angle: aspect_type.angle(),
            orb: 0.0,
            applying: false,
            separating: false,
        }
    }

    #[test]
    fn test_empty_scores_zero() {
        assert_eq!(score_compatibility(&[]), 0.0);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(score_compatibility(&[aspect(AspectType::Trine)]), 100.0);
        assert_eq!(score_compatibility(&[aspect(AspectType::Square)]), 0.0);
    }

    #[test]
    fn test_balanced_is_fifty() {
        let aspects = [aspect(AspectType::Sextile), aspect(AspectType::Opposition)];
        assert_eq!(score_compatibility(&aspects), 50.0);
    }

    #[test]
    fn test_adding_harmonious_never_lowers_score() {
        let mut aspects = vec![
            aspect(AspectType::Square),
            aspect(AspectType::Trine),
            aspect(AspectType::Opposition),
        ];
        let mut previous = score_compatibility(&aspects);
        for _ in 0..5 {
            aspects.push(aspect(AspectType::Conjunction));
            let next = score_compatibility(&aspects);
            assert!(next >= previous);
            previous = next;
        }
    }

    #[test]
    fn test_adding_challenging_never_raises_score() {
        let mut aspects = vec![aspect(AspectType::Trine), aspect(AspectType::Sextile)];
        let mut previous = score_compatibility(&aspects);
        for _ in 0..5 {
            aspects.push(aspect(AspectType::Square));
            let next = score_compatibility(&aspects);
            assert!(next <= previous);
            previous = next;
        }
    }
}
