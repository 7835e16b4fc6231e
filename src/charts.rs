//! Chart construction: validated requests in, assembled charts out.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::Settings;
use crate::engine::{
    age_in_years, all_pairs_aspects, assemble_chart, chart_aspects, composite_midpoint,
    planet_in_house, progressed_instant, resolve_snapshot, score_compatibility, score_planet_dignity,
    signed_separation, solar_return_anchor, ChartFrame,
};
use crate::ephemeris::{EphemerisProvider, EphemerisRequest};
use crate::error::{AstroError, Result};
use crate::models::{
    AspectInterpretation, AspectNature, AspectType, Body, CelestialPosition, ChartData, ChartType,
    ClassifiedAspect, Coordinates, DignityReport, HouseCusp, HouseSystem, OrbTable, ProgressedChart,
    SolarReturnChart, SynastryAnalysis, TransitReport,
};
use crate::validation::{ChartRequest, DetailLevel};

/// How far either side of the birthday the solar return search looks
const SOLAR_RETURN_WINDOW_DAYS: i64 = 3;
/// Bisection stops once the bracket is narrower than this
const SOLAR_RETURN_PRECISION_SECS: i64 = 60;
const SOLAR_RETURN_TOLERANCE_DEG: f64 = 1e-6;

pub struct ChartService {
    settings: Arc<Settings>,
    provider: Arc<dyn EphemerisProvider>,
}

impl ChartService {
    pub fn new(settings: Arc<Settings>, provider: Arc<dyn EphemerisProvider>) -> Self {
        Self { settings, provider }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ask the provider for one moment and turn the answer into placements.
    async fn place(
        &self,
        instant: DateTime<Utc>,
        location: Coordinates,
        house_system: HouseSystem,
        bodies: &[Body],
    ) -> Result<(Vec<CelestialPosition>, Vec<HouseCusp>)> {
        let request = EphemerisRequest {
            instant,
            location,
            house_system,
            bodies: bodies.to_vec(),
        };
        debug!(provider = self.provider.name(), %instant, "ephemeris request");
        let snapshot = self.provider.calculate(&request).await?;
        resolve_snapshot(&snapshot, bodies)
    }

    fn metadata(&self, extra: Value) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("generated_at".into(), json!(Utc::now().to_rfc3339()));
        metadata.insert("ephemeris".into(), json!(self.provider.name()));
        metadata.insert("engine_version".into(), json!(env!("CARGO_PKG_VERSION")));
        if let Value::Object(extra) = extra {
            metadata.extend(extra);
        }
        metadata
    }

    async fn cast(
        &self,
        frame: ChartFrame,
        bodies: &[Body],
        orbs: &OrbTable,
        extra: Value,
    ) -> Result<ChartData> {
        let (positions, houses) = self
            .place(frame.instant, frame.coordinates, frame.house_system, bodies)
            .await?;
        let aspects = chart_aspects(&positions, orbs);
        assemble_chart(frame, positions, houses, aspects, self.metadata(extra))
    }

    pub async fn natal_chart(&self, request: &ChartRequest) -> Result<ChartData> {
        self.natal_chart_with_orbs(request, &OrbTable::default()).await
    }

    async fn natal_chart_with_orbs(
        &self,
        request: &ChartRequest,
        orbs: &OrbTable,
    ) -> Result<ChartData> {
        info!(instant = %request.instant, house_system = %request.house_system, "casting natal chart");
        let frame = ChartFrame {
            chart_type: ChartType::Natal,
            instant: request.instant,
            timezone: request.timezone.clone(),
            coordinates: request.coordinates,
            house_system: request.house_system,
        };
        self.cast(frame, &request.bodies, orbs, Value::Null).await
    }

    /// Secondary progression of `natal` to `target`, houses at the natal place.
    pub async fn progressed_chart(
        &self,
        natal: &ChartData,
        target: DateTime<Utc>,
        house_system: Option<HouseSystem>,
    ) -> Result<ProgressedChart> {
        if natal.planets.is_empty() {
            return Err(AstroError::validation("Natal chart has no planets"));
        }
        let instant = progressed_instant(natal.date_time, target);
        let age_years = age_in_years(natal.date_time, target);
        info!(%target, progressed = %instant, "casting progressed chart");

        let bodies: Vec<Body> = natal.planets.iter().map(|p| p.name).collect();
        let frame = ChartFrame {
            chart_type: ChartType::Progressed,
            instant,
            timezone: natal.timezone.clone(),
            coordinates: natal.coordinates,
            house_system: house_system.unwrap_or(natal.house_system),
        };
        let extra = json!({
            "natal_date_time": natal.date_time.to_rfc3339(),
            "progression_date": target.to_rfc3339(),
            "method": "secondary",
        });
        let chart = self
            .cast(frame, &bodies, &OrbTable::default(), extra)
            .await?;
        let natal_to_progressed_aspects =
            all_pairs_aspects(&natal.planets, &chart.planets, &OrbTable::default());

        Ok(ProgressedChart {
            progressed_chart: chart,
            progression_date: target,
            age_years,
            natal_to_progressed_aspects,
        })
    }

    /// Sun's signed distance from `target` longitude at `instant`.
    async fn sun_offset(
        &self,
        instant: DateTime<Utc>,
        location: Coordinates,
        target: f64,
    ) -> Result<f64> {
        let (positions, _) = self
            .place(instant, location, HouseSystem::Equal, &[Body::Sun])
            .await?;
        let sun = positions
            .first()
            .ok_or_else(|| AstroError::computation("ephemeris returned no Sun"))?;
        Ok(signed_separation(target, sun.longitude))
    }

    /// Instant near the birthday in `year` when the Sun is back at `natal_sun`.
    async fn find_solar_return(
        &self,
        birth: DateTime<Utc>,
        year: i32,
        location: Coordinates,
        natal_sun: f64,
    ) -> Result<DateTime<Utc>> {
        let anchor = solar_return_anchor(birth, year)?;
        if self.sun_offset(anchor, location, natal_sun).await?.abs() < SOLAR_RETURN_TOLERANCE_DEG {
            return Ok(anchor);
        }

        let mut low = anchor - Duration::days(SOLAR_RETURN_WINDOW_DAYS);
        let mut high = anchor + Duration::days(SOLAR_RETURN_WINDOW_DAYS);
        let low_offset = self.sun_offset(low, location, natal_sun).await?;
        let high_offset = self.sun_offset(high, location, natal_sun).await?;
        if !(low_offset < 0.0 && high_offset >= 0.0) {
            return Err(AstroError::computation(format!(
                "Sun does not return to {:.4} within {} days of the {} birthday",
                natal_sun, SOLAR_RETURN_WINDOW_DAYS, year
            )));
        }

        while (high - low).num_seconds() > SOLAR_RETURN_PRECISION_SECS {
            let mid = low + (high - low) / 2;
            if self.sun_offset(mid, location, natal_sun).await? < 0.0 {
                low = mid;
            } else {
                high = mid;
            }
        }
        Ok(high)
    }

    pub async fn solar_return(
        &self,
        birth: &ChartRequest,
        year: i32,
        return_location: Option<Coordinates>,
        house_system: HouseSystem,
    ) -> Result<SolarReturnChart> {
        let mut natal_bodies = birth.bodies.clone();
        if !natal_bodies.contains(&Body::Sun) {
            natal_bodies.insert(0, Body::Sun);
        }
        let natal_request = ChartRequest {
            bodies: natal_bodies,
            ..birth.clone()
        };
        let natal = self.natal_chart(&natal_request).await?;
        let natal_sun = natal
            .position(Body::Sun)
            .map(|sun| sun.longitude)
            .ok_or_else(|| AstroError::computation("natal chart has no Sun"))?;

        let location = return_location.unwrap_or(birth.coordinates);
        let instant = self
            .find_solar_return(birth.instant, year, location, natal_sun)
            .await?;
        info!(year, %instant, "casting solar return");

        let frame = ChartFrame {
            chart_type: ChartType::SolarReturn,
            instant,
            timezone: birth.timezone.clone(),
            coordinates: location,
            house_system,
        };
        let extra = json!({ "return_year": year, "natal_sun_longitude": natal_sun });
        let chart = self
            .cast(frame, &natal_request.bodies, &OrbTable::default(), extra)
            .await?;
        let solar_return_to_natal_aspects =
            all_pairs_aspects(&chart.planets, &natal.planets, &OrbTable::default());

        Ok(SolarReturnChart {
            solar_return_chart: chart,
            return_year: year,
            natal_sun_longitude: natal_sun,
            solar_return_to_natal_aspects,
        })
    }

    /// Chart cast at the time and space midpoint of two births.
    pub async fn composite_chart(
        &self,
        person1: &ChartRequest,
        person2: &ChartRequest,
        house_system: HouseSystem,
    ) -> Result<ChartData> {
        let (instant, coordinates) = composite_midpoint(
            (person1.instant, person1.coordinates),
            (person2.instant, person2.coordinates),
        );
        info!(%instant, "casting composite chart");

        let mut bodies = person1.bodies.clone();
        for body in &person2.bodies {
            if !bodies.contains(body) {
                bodies.push(*body);
            }
        }

        let frame = ChartFrame {
            chart_type: ChartType::Composite,
            instant,
            timezone: "UTC".to_string(),
            coordinates,
            house_system,
        };
        let extra = json!({
            "midpoint_method": "arithmetic",
            "person1_date_time": person1.instant.to_rfc3339(),
            "person2_date_time": person2.instant.to_rfc3339(),
        });
        self.cast(frame, &bodies, &OrbTable::default(), extra).await
    }

    pub async fn synastry(
        &self,
        person1: &ChartRequest,
        person2: &ChartRequest,
        orbs: &OrbTable,
    ) -> Result<SynastryAnalysis> {
        let person1_chart = self.natal_chart_with_orbs(person1, orbs).await?;
        let person2_chart = self.natal_chart_with_orbs(person2, orbs).await?;
        let interaspects = all_pairs_aspects(&person1_chart.planets, &person2_chart.planets, orbs);
        let composite_chart = self
            .composite_chart(person1, person2, person1.house_system)
            .await?;
        let compatibility_score = score_compatibility(&interaspects);
        info!(
            interaspects = interaspects.len(),
            compatibility_score, "synastry complete"
        );

        Ok(SynastryAnalysis {
            person1_chart,
            person2_chart,
            interaspects,
            composite_chart,
            compatibility_score,
        })
    }

    /// Transiting bodies at `instant`, placed in the natal houses.
    pub async fn transits(
        &self,
        natal: &ChartData,
        instant: DateTime<Utc>,
        bodies: &[Body],
    ) -> Result<TransitReport> {
        let (mut transiting, _) = self
            .place(instant, natal.coordinates, natal.house_system, bodies)
            .await?;
        let natal_cusps = natal.cusp_longitudes();
        for position in &mut transiting {
            position.house = planet_in_house(position.longitude, &natal_cusps);
        }
        let transit_aspects = all_pairs_aspects(&transiting, &natal.planets, &OrbTable::default());
        info!(%instant, aspects = transit_aspects.len(), "transits calculated");

        Ok(TransitReport {
            transit_date: instant,
            transiting_positions: transiting,
            transit_aspects,
        })
    }

    /// Structured classification of a chart's aspects.
    pub fn interpret_aspects(
        &self,
        chart: &ChartData,
        aspect_types: Option<&[AspectType]>,
        detail: DetailLevel,
    ) -> AspectInterpretation {
        let selected: Vec<_> = chart
            .aspects
            .iter()
            .filter(|a| aspect_types.map_or(true, |types| types.contains(&a.aspect_type)))
            .cloned()
            .collect();

        let mut counts_by_type = BTreeMap::new();
        for aspect in &selected {
            *counts_by_type.entry(aspect.aspect_type).or_insert(0) += 1;
        }
        let harmonious = selected
            .iter()
            .filter(|a| a.nature() == AspectNature::Harmonious)
            .count();
        let tightest_aspect = selected
            .iter()
            .min_by(|a, b| a.orb.total_cmp(&b.orb))
            .cloned();

        let aspects = (detail != DetailLevel::Basic).then(|| {
            selected
                .iter()
                .map(|aspect| ClassifiedAspect {
                    aspect: aspect.clone(),
                    nature: aspect.nature(),
                })
                .collect()
        });
        let body_involvement = (detail == DetailLevel::Detailed).then(|| {
            let mut tally = BTreeMap::new();
            for aspect in &selected {
                *tally.entry(aspect.planet1).or_insert(0) += 1;
                *tally.entry(aspect.planet2).or_insert(0) += 1;
            }
            tally
        });

        AspectInterpretation {
            detail_level: detail.as_str().to_string(),
            total_aspects: selected.len(),
            counts_by_type,
            harmonious,
            challenging: selected.len() - harmonious,
            harmony_score: score_compatibility(&selected),
            tightest_aspect,
            aspects,
            body_involvement,
        }
    }

    pub fn dignities(&self, chart: &ChartData) -> DignityReport {
        let dignities: Vec<_> = chart
            .planets
            .iter()
            .map(|p| score_planet_dignity(p.name, p.sign, p.house))
            .collect();
        let total_score = dignities.iter().map(|d| d.total_score).sum();
        DignityReport {
            dignities,
            total_score,
        }
    }
}
