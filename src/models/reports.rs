//! Composite results returned by the multi-chart tools.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Aspect, AspectNature, AspectType, Body, ChartData, DignityScore};

#[derive(Debug, Clone, Serialize)]
pub struct ProgressedChart {
    pub progressed_chart: ChartData,
    pub progression_date: DateTime<Utc>,
    /// Age in tropical years at the progression date
    pub age_years: f64,
    pub natal_to_progressed_aspects: Vec<Aspect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolarReturnChart {
    pub solar_return_chart: ChartData,
    pub return_year: i32,
    pub natal_sun_longitude: f64,
    pub solar_return_to_natal_aspects: Vec<Aspect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SynastryAnalysis {
    pub person1_chart: ChartData,
    pub person2_chart: ChartData,
    pub interaspects: Vec<Aspect>,
    pub composite_chart: ChartData,
    pub compatibility_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransitReport {
    pub transit_date: DateTime<Utc>,
    /// Transiting bodies placed in the natal houses
    pub transiting_positions: Vec<super::CelestialPosition>,
    pub transit_aspects: Vec<Aspect>,
}

/// Aspect with its classification attached
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedAspect {
    #[serde(flatten)]
    pub aspect: Aspect,
    pub nature: AspectNature,
}

#[derive(Debug, Clone, Serialize)]
pub struct AspectInterpretation {
    pub detail_level: String,
    pub total_aspects: usize,
    pub counts_by_type: BTreeMap<AspectType, usize>,
    pub harmonious: usize,
    pub challenging: usize,
    /// Same 0-100 scale as the compatibility score
    pub harmony_score: f64,
    pub tightest_aspect: Option<Aspect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspects: Option<Vec<ClassifiedAspect>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_involvement: Option<BTreeMap<Body, usize>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DignityReport {
    pub dignities: Vec<DignityScore>,
    pub total_score: i32,
}
