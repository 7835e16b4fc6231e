use crate::models::{Aspect, AspectType, CelestialPosition, OrbTable};

/// Shortest arc between two longitudes, in [0, 180]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// `to - from` folded into (-180, 180]
pub fn signed_separation(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// Measure how far a pair sits from the exact angle of `aspect_type`.
///
/// Applying and separating compare raw longitudinal speeds only.
pub fn measure_aspect(
    a: &CelestialPosition,
    b: &CelestialPosition,
    aspect_type: AspectType,
) -> Aspect {
    let distance = angular_distance(a.longitude, b.longitude);
    Aspect {
        planet1: a.name,
        planet2: b.name,
        aspect_type,
        separation: signed_separation(a.longitude, b.longitude),
        angle: aspect_type.angle(),
        orb: (distance - aspect_type.angle()).abs(),
        applying: a.speed > b.speed,
        separating: a.speed < b.speed,
    }
}

/// First aspect type, in table order, whose orb admits the pair.
pub fn detect_aspect(
    a: &CelestialPosition,
    b: &CelestialPosition,
    orbs: &OrbTable,
) -> Option<Aspect> {
    AspectType::ALL
        .iter()
        .map(|aspect| measure_aspect(a, b, *aspect))
        .find(|found| found.orb <= orbs.get(found.aspect_type))
}

/// Aspects within one chart, one per unordered pair, in position order.
pub fn chart_aspects(positions: &[CelestialPosition], orbs: &OrbTable) -> Vec<Aspect> {
    let mut aspects = Vec::new();
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            if let Some(aspect) = detect_aspect(a, b, orbs) {
                aspects.push(aspect);
            }
        }
    }
    aspects
}

/// Aspects between every body of `a` and every body of `b`.
pub fn all_pairs_aspects(
    a: &[CelestialPosition],
    b: &[CelestialPosition],
    orbs: &OrbTable,
) -> Vec<Aspect> {
    a.iter()
        .flat_map(|pa| b.iter().filter_map(move |pb| detect_aspect(pa, pb, orbs)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Body;

    fn pos(body: Body, longitude: f64, speed: f64) -> CelestialPosition {
        CelestialPosition::new(body, longitude, 0.0, 1.0, speed, None)
    }

    #[test]
    fn test_opposition_across_zero() {
        let aspect = detect_aspect(
            &pos(Body::Sun, 10.0, 1.0),
            &pos(Body::Moon, 190.0, 13.0),
            &OrbTable::default(),
        )
        .unwrap();
        assert_eq!(aspect.aspect_type, AspectType::Opposition);
        assert!(aspect.orb.abs() < 1e-9);
        assert!(!aspect.applying);
        assert!(aspect.separating);
    }

    #[test]
    fn test_orb_boundary_is_inclusive() {
        let orbs = OrbTable::default();
        let at_limit = detect_aspect(&pos(Body::Sun, 0.0, 1.0), &pos(Body::Mars, 8.0, 0.5), &orbs);
        assert_eq!(at_limit.map(|a| a.aspect_type), Some(AspectType::Conjunction));

        let outside = detect_aspect(&pos(Body::Sun, 0.0, 1.0), &pos(Body::Mars, 8.5, 0.5), &orbs);
        assert!(outside.is_none());
    }

    #[test]
    fn test_measure_reports_distance_from_exact() {
        let aspect = measure_aspect(
            &pos(Body::Sun, 350.0, 1.0),
            &pos(Body::Jupiter, 105.0, 0.1),
            AspectType::Trine,
        );
        assert!((aspect.orb - 5.0).abs() < 1e-9);
        assert!((aspect.separation - 115.0).abs() < 1e-9);
        assert!(aspect.applying);
    }

    #[test]
    fn test_shortest_arc_wraps() {
        assert!((angular_distance(355.0, 5.0) - 10.0).abs() < 1e-9);
        assert!((signed_separation(355.0, 5.0) - 10.0).abs() < 1e-9);
        assert!((signed_separation(5.0, 355.0) + 10.0).abs() < 1e-9);
        assert_eq!(signed_separation(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_first_match_wins_when_orbs_overlap() {
        let orbs = OrbTable::default()
            .with_orb(AspectType::Conjunction, 30.0)
            .with_orb(AspectType::Sextile, 30.0);
        let aspect =
            detect_aspect(&pos(Body::Sun, 0.0, 1.0), &pos(Body::Venus, 30.0, 1.2), &orbs).unwrap();
        assert_eq!(aspect.aspect_type, AspectType::Conjunction);
        assert!(!aspect.applying && aspect.separating);
    }

    #[test]
    fn test_chart_aspects_skip_self_and_mirror_pairs() {
        let positions = vec![
            pos(Body::Sun, 0.0, 1.0),
            pos(Body::Moon, 120.0, 13.0),
            pos(Body::Mars, 240.0, 0.5),
        ];
        let aspects = chart_aspects(&positions, &OrbTable::default());
        assert_eq!(aspects.len(), 3);
        assert!(aspects.iter().all(|a| a.planet1 != a.planet2));
        assert!(aspects.iter().all(|a| a.aspect_type == AspectType::Trine));
    }

    #[test]
    fn test_all_pairs_include_same_body_across_charts() {
        let a = vec![pos(Body::Sun, 100.0, 1.0)];
        let b = vec![pos(Body::Sun, 102.0, 1.0), pos(Body::Moon, 50.0, 12.0)];
        let aspects = all_pairs_aspects(&a, &b, &OrbTable::default());
        assert_eq!(aspects.len(), 1);
        assert_eq!(aspects[0].planet2, Body::Sun);
        assert!(!aspects[0].applying && !aspects[0].separating);
    }
}
