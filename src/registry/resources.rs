//! Static reference data served through `resources/read`.

use serde_json::{json, Map, Value};

use super::catalog::{ResourceDescriptor, JSON_MIME_TYPE};
use crate::config::Settings;
use crate::models::{AspectType, Body, HouseSystem, OrbTable, ZodiacSign};

pub fn descriptors() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor {
            uri: "astrological_objects",
            name: "Astrological Objects",
            description: "Planets, asteroids and calculated points a chart can include",
            mime_type: JSON_MIME_TYPE,
        },
        ResourceDescriptor {
            uri: "house_systems",
            name: "House Systems",
            description: "House division systems accepted by the chart tools",
            mime_type: JSON_MIME_TYPE,
        },
        ResourceDescriptor {
            uri: "aspect_patterns",
            name: "Aspect Patterns",
            description: "Aspect angles, default orbs and their nature",
            mime_type: JSON_MIME_TYPE,
        },
        ResourceDescriptor {
            uri: "sign_meanings",
            name: "Zodiac Sign Meanings",
            description: "Element, modality, ruler and keywords of each sign",
            mime_type: JSON_MIME_TYPE,
        },
        ResourceDescriptor {
            uri: "planet_meanings",
            name: "Planet Meanings",
            description: "Keywords and rulerships of each planet",
            mime_type: JSON_MIME_TYPE,
        },
        ResourceDescriptor {
            uri: "house_meanings",
            name: "House Meanings",
            description: "Themes of the twelve houses",
            mime_type: JSON_MIME_TYPE,
        },
    ]
}

/// Content for `uri`, or `None` when no generator exists for it.
pub fn content(uri: &str, settings: &Settings) -> Option<Value> {
    let value = match uri {
        "astrological_objects" => astrological_objects(settings),
        "house_systems" => house_systems(settings),
        "aspect_patterns" => aspect_patterns(),
        "sign_meanings" => sign_meanings(),
        "planet_meanings" => planet_meanings(),
        "house_meanings" => house_meanings(),
        _ => return None,
    };
    Some(value)
}

fn keys(bodies: &[Body]) -> Vec<&'static str> {
    bodies.iter().map(Body::key).collect()
}

fn astrological_objects(settings: &Settings) -> Value {
    let asteroids: Vec<Body> = Body::ALL.iter().copied().filter(Body::is_asteroid).collect();
    let points: Vec<Body> = Body::ALL[10..]
        .iter()
        .copied()
        .filter(|b| !b.is_asteroid())
        .collect();

    json!({
        "planets": keys(Body::planets()),
        "asteroids": keys(&asteroids),
        "points": keys(&points),
        "luminaries": keys(&[Body::Sun, Body::Moon]),
        "personal_planets": keys(&Body::planets()[..5]),
        "social_planets": keys(&[Body::Jupiter, Body::Saturn]),
        "outer_planets": keys(&[Body::Uranus, Body::Neptune, Body::Pluto]),
        "default_objects": keys(&settings.default_objects),
        "asteroids_enabled": settings.enable_asteroids,
    })
}

fn house_system_description(system: HouseSystem) -> &'static str {
    match system {
        HouseSystem::Placidus => "Time-based trisection of the diurnal arcs; the most widely used system",
        HouseSystem::Koch => "Birthplace system built from the Midheaven's oblique ascension",
        HouseSystem::Porphyrius => "Each quadrant divided into three equal parts",
        HouseSystem::Regiomontanus => "Equal divisions of the celestial equator projected onto the ecliptic",
        HouseSystem::Campanus => "Equal divisions of the prime vertical",
        HouseSystem::Equal => "Twelve 30 degree houses counted from the Ascendant",
        HouseSystem::WholeSign => "Each sign is one house, starting with the rising sign",
        HouseSystem::Alcabitus => "Medieval semi-arc system dividing the Ascendant's diurnal arc",
        HouseSystem::Krusinski => "Great circle system through the Ascendant and the zenith",
        HouseSystem::Morinus => "Equal divisions of the equator measured from the east point",
    }
}

fn house_systems(settings: &Settings) -> Value {
    let descriptions: Map<String, Value> = HouseSystem::ALL
        .iter()
        .map(|s| (s.key().to_string(), json!(house_system_description(*s))))
        .collect();

    json!({
        "systems": HouseSystem::ALL.iter().map(HouseSystem::key).collect::<Vec<_>>(),
        "default": settings.default_house_system.key(),
        "descriptions": descriptions,
    })
}

fn aspect_patterns() -> Value {
    let orbs = OrbTable::default();
    let major: Map<String, Value> = AspectType::ALL
        .iter()
        .map(|aspect| {
            (
                aspect.key().to_string(),
                json!({
                    "degrees": aspect.angle(),
                    "orb": orbs.get(*aspect),
                    "nature": aspect.nature(),
                }),
            )
        })
        .collect();

    json!({
        "major_aspects": major,
        // Listed for reference only; detection covers the major aspects
        "minor_aspects": {
            "quincunx": { "degrees": 150.0, "orb": 3.0, "nature": "challenging" },
            "semisextile": { "degrees": 30.0, "orb": 3.0, "nature": "neutral" },
        },
    })
}

/// Modern rulers: the outer planets take Scorpio, Aquarius and Pisces.
fn modern_ruler(sign: ZodiacSign) -> Body {
    match sign {
        ZodiacSign::Aries => Body::Mars,
        ZodiacSign::Taurus | ZodiacSign::Libra => Body::Venus,
        ZodiacSign::Gemini | ZodiacSign::Virgo => Body::Mercury,
        ZodiacSign::Cancer => Body::Moon,
        ZodiacSign::Leo => Body::Sun,
        ZodiacSign::Scorpio => Body::Pluto,
        ZodiacSign::Sagittarius => Body::Jupiter,
        ZodiacSign::Capricorn => Body::Saturn,
        ZodiacSign::Aquarius => Body::Uranus,
        ZodiacSign::Pisces => Body::Neptune,
    }
}

fn sign_keywords(sign: ZodiacSign) -> [&'static str; 3] {
    match sign {
        ZodiacSign::Aries => ["initiative", "courage", "drive"],
        ZodiacSign::Taurus => ["stability", "sensuality", "persistence"],
        ZodiacSign::Gemini => ["communication", "curiosity", "adaptability"],
        ZodiacSign::Cancer => ["nurturing", "intuition", "home"],
        ZodiacSign::Leo => ["creativity", "pride", "generosity"],
        ZodiacSign::Virgo => ["service", "analysis", "precision"],
        ZodiacSign::Libra => ["balance", "harmony", "partnership"],
        ZodiacSign::Scorpio => ["transformation", "intensity", "depth"],
        ZodiacSign::Sagittarius => ["philosophy", "adventure", "truth"],
        ZodiacSign::Capricorn => ["ambition", "structure", "responsibility"],
        ZodiacSign::Aquarius => ["innovation", "community", "independence"],
        ZodiacSign::Pisces => ["compassion", "imagination", "transcendence"],
    }
}

fn sign_meanings() -> Value {
    let signs: Map<String, Value> = ZodiacSign::ALL
        .iter()
        .map(|sign| {
            (
                sign.to_string().to_ascii_lowercase(),
                json!({
                    "element": sign.element(),
                    "modality": sign.modality(),
                    "ruler": modern_ruler(*sign).key(),
                    "keywords": sign_keywords(*sign),
                }),
            )
        })
        .collect();
    json!({ "signs": signs })
}

fn planet_keywords(body: Body) -> [&'static str; 3] {
    match body {
        Body::Sun => ["identity", "vitality", "purpose"],
        Body::Moon => ["emotions", "instinct", "security"],
        Body::Mercury => ["communication", "thought", "learning"],
        Body::Venus => ["love", "beauty", "values"],
        Body::Mars => ["action", "desire", "courage"],
        Body::Jupiter => ["expansion", "wisdom", "fortune"],
        Body::Saturn => ["discipline", "structure", "limits"],
        Body::Uranus => ["innovation", "disruption", "freedom"],
        Body::Neptune => ["spirituality", "illusion", "dissolution"],
        _ => ["transformation", "power", "renewal"],
    }
}

fn planet_meanings() -> Value {
    let planets: Map<String, Value> = Body::planets()
        .iter()
        .map(|body| {
            let rules: Vec<String> = ZodiacSign::ALL
                .iter()
                .filter(|sign| modern_ruler(**sign) == *body)
                .map(|sign| sign.to_string().to_ascii_lowercase())
                .collect();
            (
                body.key().to_string(),
                json!({ "keywords": planet_keywords(*body), "rules": rules }),
            )
        })
        .collect();
    json!({ "planets": planets })
}

const HOUSE_THEMES: [(&str, [&str; 3]); 12] = [
    ("Self", ["identity", "appearance", "first impressions"]),
    ("Resources", ["money", "possessions", "self-worth"]),
    ("Communication", ["siblings", "learning", "short journeys"]),
    ("Home", ["family", "roots", "private life"]),
    ("Creativity", ["children", "romance", "play"]),
    ("Service", ["work", "health", "routine"]),
    ("Partnership", ["marriage", "contracts", "open rivals"]),
    ("Transformation", ["shared resources", "intimacy", "endings"]),
    ("Philosophy", ["higher learning", "long journeys", "belief"]),
    ("Career", ["reputation", "authority", "public life"]),
    ("Community", ["friends", "groups", "aspirations"]),
    ("Seclusion", ["the unconscious", "retreat", "hidden matters"]),
];

fn house_meanings() -> Value {
    let houses: Map<String, Value> = HOUSE_THEMES
        .iter()
        .enumerate()
        .map(|(i, (name, keywords))| {
            ((i + 1).to_string(), json!({ "name": name, "keywords": keywords }))
        })
        .collect();
    json!({ "houses": houses })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_descriptor_has_content() {
        let settings = Settings::default();
        for descriptor in descriptors() {
            let value = content(descriptor.uri, &settings).unwrap();
            assert!(value.as_object().is_some_and(|o| !o.is_empty()), "{}", descriptor.uri);
        }
        assert!(content("nonexistent", &settings).is_none());
    }

    #[test]
    fn test_objects_grouping() {
        let value = astrological_objects(&Settings::default());
        assert_eq!(value["planets"].as_array().unwrap().len(), 10);
        assert_eq!(value["asteroids"].as_array().unwrap().len(), 5);
        assert_eq!(
            value["points"],
            json!(["north_node", "south_node", "lilith", "part_of_fortune", "vertex"])
        );
        assert_eq!(value["asteroids_enabled"], json!(false));
    }

    #[test]
    fn test_rulerships_are_consistent() {
        let signs = sign_meanings();
        assert_eq!(signs["signs"]["scorpio"]["ruler"], json!("pluto"));
        assert_eq!(signs["signs"]["virgo"]["element"], json!("earth"));

        let planets = planet_meanings();
        assert_eq!(planets["planets"]["mercury"]["rules"], json!(["gemini", "virgo"]));
        assert_eq!(planets["planets"]["mars"]["rules"], json!(["aries"]));
    }

    #[test]
    fn test_aspect_patterns_follow_orb_table() {
        let value = aspect_patterns();
        assert_eq!(value["major_aspects"]["sextile"]["orb"], json!(6.0));
        assert_eq!(value["major_aspects"]["square"]["nature"], json!("challenging"));
        assert_eq!(value["major_aspects"].as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_house_meanings_cover_twelve_houses() {
        let value = house_meanings();
        assert_eq!(value["houses"].as_object().unwrap().len(), 12);
        assert_eq!(value["houses"]["10"]["name"], json!("Career"));
    }
}
