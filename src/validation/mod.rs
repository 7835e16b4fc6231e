//! Input sanitization and argument checks, run before any computation.

pub mod inputs;

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::Settings;
use crate::error::{AstroError, Result};
use crate::engine::{assemble_chart, measure_aspect, ChartFrame};
use crate::models::{
    Aspect, AspectType, Body, CelestialPosition, ChartData, HouseCusp, HouseSystem, OrbTable,
    ZodiacSign,
};

pub use inputs::*;

pub const MAX_STRING_LENGTH: usize = 1000;
pub const MIN_YEAR: i32 = 1800;
pub const MAX_ORB: f64 = 30.0;

/// Allowed drift between a supplied orb and the one measured from positions
const ORB_TOLERANCE: f64 = 0.01;

const STRIPPED_CHARS: [char; 7] = ['<', '>', '&', '"', '\'', '`', '\0'];

const OFFSET_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

static UTC_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").expect("static offset pattern"));

/// Strip markup characters from every string in `value`, recursively.
///
/// A string still longer than [`MAX_STRING_LENGTH`] characters once stripped
/// is rejected; survivors are trimmed.
pub fn sanitize_input(value: Value) -> Result<Value> {
    match value {
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
            if cleaned.chars().count() > MAX_STRING_LENGTH {
                return Err(AstroError::validation(format!(
                    "Input too long: maximum {} characters",
                    MAX_STRING_LENGTH
                )));
            }
            Ok(Value::String(cleaned.trim().to_string()))
        }
        Value::Array(items) => items
            .into_iter()
            .map(sanitize_input)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| sanitize_input(v).map(|v| (k, v)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other),
    }
}

/// Parse a date/time string into UTC.
///
/// Strings with a `Z` or numeric offset are taken as given. Naive strings are
/// read in `timezone` (IANA name or `+HH:MM`), or UTC when none is supplied.
/// A bare date means midnight.
pub fn parse_datetime(raw: &str, timezone: Option<&str>) -> Result<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AstroError::validation("date_time is required"));
    }

    let normalized = match text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => text.to_string(),
    };

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
    {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| {
            AstroError::validation(format!(
                "Invalid datetime format: {}. Expected ISO 8601, e.g. 1990-06-15 14:30:00",
                raw
            ))
        })?;

    localize(naive, timezone)
}

fn localize(naive: NaiveDateTime, timezone: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(name) = timezone.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(naive.and_utc());
    };

    if let Some(offset) = parse_utc_offset(name) {
        return offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AstroError::validation("Invalid local time"));
    }

    let tz: Tz = name
        .parse()
        .map_err(|_| AstroError::validation(format!("Invalid timezone: {}", name)))?;

    // Convert local time to UTC
    tz.from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AstroError::validation(format!(
                "Ambiguous or invalid local time {} in {}",
                naive, name
            ))
        })
}

fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let caps = UTC_OFFSET.captures(text)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    if hours > 14 || minutes >= 60 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    if &caps[1] == "-" {
        FixedOffset::west_opt(seconds)
    } else {
        FixedOffset::east_opt(seconds)
    }
}

/// Check that `timezone` names something [`parse_datetime`] can use.
pub fn validate_timezone(timezone: &str) -> Result<()> {
    let name = timezone.trim();
    if parse_utc_offset(name).is_some() || name.parse::<Tz>().is_ok() {
        Ok(())
    } else {
        Err(AstroError::validation(format!("Invalid timezone: {}", timezone)))
    }
}

pub fn parse_house_system(raw: Option<&str>, settings: &Settings) -> Result<HouseSystem> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(settings.default_house_system),
        Some(name) => name.parse().map_err(AstroError::Validation),
    }
}

/// Resolve requested objects, falling back to the configured defaults.
/// Duplicates are dropped, keeping the first occurrence.
pub fn parse_objects(raw: Option<&[String]>, settings: &Settings) -> Result<Vec<Body>> {
    let names = match raw {
        None => return Ok(settings.default_objects.clone()),
        Some([]) => return Err(AstroError::validation("objects must name at least one body")),
        Some(names) => names,
    };

    let mut bodies = Vec::with_capacity(names.len());
    for name in names {
        let body: Body = name.parse().map_err(AstroError::Validation)?;
        if body.is_asteroid() && !settings.enable_asteroids {
            return Err(AstroError::validation(format!(
                "Asteroid {} requested but asteroids are disabled",
                body.key()
            )));
        }
        if !bodies.contains(&body) {
            bodies.push(body);
        }
    }
    Ok(bodies)
}

/// Merge caller orbs over the default table.
pub fn parse_orbs(raw: Option<&BTreeMap<String, f64>>) -> Result<OrbTable> {
    let mut table = OrbTable::default();
    for (name, orb) in raw.into_iter().flatten() {
        let aspect: AspectType = name.parse().map_err(AstroError::Validation)?;
        if !orb.is_finite() || *orb < 0.0 || *orb > MAX_ORB {
            return Err(AstroError::validation(format!(
                "Invalid orb for {}: must be between 0 and {}",
                name, MAX_ORB
            )));
        }
        table = table.with_orb(aspect, *orb);
    }
    Ok(table)
}

pub fn parse_aspect_types(raw: Option<&[String]>) -> Result<Option<Vec<AspectType>>> {
    raw.map(|names| {
        names
            .iter()
            .map(|name| name.parse::<AspectType>().map_err(AstroError::Validation))
            .collect::<Result<Vec<_>>>()
    })
    .transpose()
}

pub fn validate_year(year: i32) -> Result<i32> {
    let max_year = Utc::now().year() + 100;
    if (MIN_YEAR..=max_year).contains(&year) {
        Ok(year)
    } else {
        Err(AstroError::validation(format!(
            "Year {} out of range: must be between {} and {}",
            year, MIN_YEAR, max_year
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    Basic,
    #[default]
    Medium,
    Detailed,
}

impl DetailLevel {
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") => Ok(DetailLevel::Medium),
            Some("basic") => Ok(DetailLevel::Basic),
            Some("medium") => Ok(DetailLevel::Medium),
            Some("detailed") => Ok(DetailLevel::Detailed),
            Some(other) => Err(AstroError::validation(format!(
                "Invalid detail level: {}. Valid options: basic, medium, detailed",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Basic => "basic",
            DetailLevel::Medium => "medium",
            DetailLevel::Detailed => "detailed",
        }
    }
}

const CHART_FIELDS: [&str; 5] = ["chart_type", "date_time", "coordinates", "planets", "houses"];

/// Shape-check a chart produced earlier (by this server or a client) and
/// rebuild it as [`ChartData`].
pub fn chart_from_value(value: &Value) -> Result<ChartData> {
    let object = value
        .as_object()
        .ok_or_else(|| AstroError::validation("Chart data must be an object"))?;
    for field in CHART_FIELDS {
        if !object.contains_key(field) {
            return Err(AstroError::validation(format!(
                "Missing required field in chart data: {}",
                field
            )));
        }
    }

    let chart: ChartData = serde_json::from_value(value.clone())
        .map_err(|e| AstroError::validation(format!("Invalid chart data: {}", e)))?;

    let place = chart.coordinates;
    if !(place.latitude.is_finite() && place.latitude.abs() <= 90.0)
        || !(place.longitude.is_finite() && place.longitude.abs() <= 180.0)
    {
        return Err(AstroError::validation("Invalid chart coordinates"));
    }

    for position in &chart.planets {
        check_longitude(position.longitude, position.sign, position.name.key())?;
        if matches!(position.house, Some(h) if !(1..=12).contains(&h)) {
            return Err(AstroError::validation(format!(
                "Invalid house for {}",
                position.name.key()
            )));
        }
    }

    let mut seen_houses = [false; 12];
    for cusp in &chart.houses {
        if !(1..=12).contains(&cusp.number) || seen_houses[cusp.number as usize - 1] {
            return Err(AstroError::validation(format!(
                "Invalid house cusp {}",
                cusp.number
            )));
        }
        seen_houses[cusp.number as usize - 1] = true;
        check_longitude(cusp.cusp, cusp.sign, &format!("house {}", cusp.number))?;
    }

    let planets: Vec<CelestialPosition> =
        chart.planets.into_iter().map(|p| p.refreshed()).collect();
    let aspects = chart
        .aspects
        .iter()
        .map(|aspect| remeasure_aspect(aspect, &planets))
        .collect::<Result<Vec<_>>>()?;

    let frame = ChartFrame {
        chart_type: chart.chart_type,
        instant: chart.date_time,
        timezone: chart.timezone,
        coordinates: chart.coordinates,
        house_system: chart.house_system,
    };
    let houses = chart
        .houses
        .iter()
        .map(|h| HouseCusp::new(h.number, h.cusp))
        .collect();
    assemble_chart(frame, planets, houses, aspects, chart.metadata)
}

/// A longitude in [0, 360) that falls in the sign it claims.
fn check_longitude(longitude: f64, sign: ZodiacSign, label: &str) -> Result<()> {
    if !longitude.is_finite() || !(0.0..360.0).contains(&longitude) {
        return Err(AstroError::validation(format!(
            "Invalid longitude for {}: {}",
            label, longitude
        )));
    }
    if ZodiacSign::from_longitude(longitude) != sign {
        return Err(AstroError::validation(format!(
            "Sign {} does not match longitude {} for {}",
            sign, longitude, label
        )));
    }
    Ok(())
}

/// Recompute a supplied aspect from the chart's own positions. The bodies
/// must be in the chart, the orb must be within [`MAX_ORB`] and agree with
/// the one supplied.
fn remeasure_aspect(aspect: &Aspect, planets: &[CelestialPosition]) -> Result<Aspect> {
    let find = |body: Body| {
        planets.iter().find(|p| p.name == body).ok_or_else(|| {
            AstroError::validation(format!(
                "Aspect {} {} {} names a body missing from the chart",
                aspect.planet1.key(),
                aspect.aspect_type,
                aspect.planet2.key()
            ))
        })
    };
    let measured = measure_aspect(find(aspect.planet1)?, find(aspect.planet2)?, aspect.aspect_type);

    if measured.orb > MAX_ORB || (measured.orb - aspect.orb).abs() > ORB_TOLERANCE {
        return Err(AstroError::validation(format!(
            "Aspect {} {} {} does not match the chart positions (orb {:.2})",
            aspect.planet1.key(),
            aspect.aspect_type,
            aspect.planet2.key(),
            measured.orb
        )));
    }
    Ok(measured)
}
