//! Tool executors. Each one parses its typed input, runs the chart service and
//! returns the result as JSON.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::catalog::ToolDescriptor;
use crate::charts::ChartService;
use crate::error::{AstroError, Result};
use crate::models::{ChartData, HouseSystem};
use crate::validation::{
    chart_from_value, parse_aspect_types, parse_datetime, parse_house_system, parse_objects,
    parse_orbs, validate_year, CompositeChartInput, DetailLevel, DignitiesInput,
    InterpretAspectsInput, NatalChartInput, ProgressedChartInput, SolarReturnInput,
    SynastryInput, TransitsInput,
};

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, arguments: Value) -> Result<Value>;
}

fn schema_to_value<T: JsonSchema>() -> Result<Arc<Map<String, Value>>> {
    let schema = schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => Ok(Arc::new(map)),
        Ok(_) => Err(AstroError::Configuration(
            "tool schema is not an object".to_string(),
        )),
        Err(e) => Err(AstroError::Configuration(e.to_string())),
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments)
        .map_err(|e| AstroError::validation(format!("Invalid arguments: {}", e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| AstroError::computation(e.to_string()))
}

/// Explicit house system if given, otherwise `fallback`.
fn house_system_or(
    raw: Option<&str>,
    fallback: HouseSystem,
    service: &ChartService,
) -> Result<HouseSystem> {
    match raw {
        Some(name) => parse_house_system(Some(name), service.settings()),
        None => Ok(fallback),
    }
}

/// A chart passed back in by the client. Naive dates are read in its timezone.
fn chart_and_date(chart: &Value, raw_date: &str) -> Result<(ChartData, DateTime<Utc>)> {
    let chart = chart_from_value(chart)?;
    let instant = parse_datetime(raw_date, Some(chart.timezone.as_str()))?;
    Ok((chart, instant))
}

pub struct NatalChartTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for NatalChartTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: NatalChartInput = parse_args(arguments)?;
        let request = input.to_request(self.0.settings())?;
        to_json(&self.0.natal_chart(&request).await?)
    }
}

pub struct ProgressedChartTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for ProgressedChartTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: ProgressedChartInput = parse_args(arguments)?;
        let (natal, target) = chart_and_date(&input.natal_chart, &input.progression_date)?;
        let house_system = input
            .house_system
            .as_deref()
            .map(|name| parse_house_system(Some(name), self.0.settings()))
            .transpose()?;
        to_json(&self.0.progressed_chart(&natal, target, house_system).await?)
    }
}

pub struct SolarReturnTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for SolarReturnTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: SolarReturnInput = parse_args(arguments)?;
        let birth = input.birth_data.to_request(self.0.settings())?;
        let year = validate_year(input.return_year)?;
        let location = input
            .return_location
            .as_ref()
            .map(|place| place.to_coordinates())
            .transpose()?;
        let house_system =
            house_system_or(input.house_system.as_deref(), birth.house_system, &self.0)?;
        to_json(
            &self
                .0
                .solar_return(&birth, year, location, house_system)
                .await?,
        )
    }
}

pub struct CompositeChartTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for CompositeChartTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: CompositeChartInput = parse_args(arguments)?;
        let person1 = input.person1.to_request(self.0.settings())?;
        let person2 = input.person2.to_request(self.0.settings())?;
        let house_system =
            house_system_or(input.house_system.as_deref(), person1.house_system, &self.0)?;
        to_json(&self.0.composite_chart(&person1, &person2, house_system).await?)
    }
}

pub struct SynastryTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for SynastryTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: SynastryInput = parse_args(arguments)?;
        let person1 = input.person1.to_request(self.0.settings())?;
        let person2 = input.person2.to_request(self.0.settings())?;
        let orbs = parse_orbs(input.aspect_orbs.as_ref())?;
        to_json(&self.0.synastry(&person1, &person2, &orbs).await?)
    }
}

pub struct TransitsTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for TransitsTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: TransitsInput = parse_args(arguments)?;
        let (natal, instant) = chart_and_date(&input.natal_chart, &input.transit_date)?;
        let bodies = parse_objects(input.objects.as_deref(), self.0.settings())?;
        to_json(&self.0.transits(&natal, instant, &bodies).await?)
    }
}

pub struct InterpretAspectsTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for InterpretAspectsTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: InterpretAspectsInput = parse_args(arguments)?;
        let chart = chart_from_value(&input.chart_data)?;
        let aspect_types = parse_aspect_types(input.aspect_types.as_deref())?;
        let detail = DetailLevel::parse(input.detail_level.as_deref())?;
        to_json(&self.0.interpret_aspects(&chart, aspect_types.as_deref(), detail))
    }
}

pub struct DignitiesTool(Arc<ChartService>);

#[async_trait]
impl ToolExecutor for DignitiesTool {
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let input: DignitiesInput = parse_args(arguments)?;
        let chart = chart_from_value(&input.chart_data)?;
        to_json(&self.0.dignities(&chart))
    }
}

pub type ToolEntry = (ToolDescriptor, Arc<dyn ToolExecutor>);

fn entry<T: JsonSchema>(
    name: &'static str,
    description: &'static str,
    executor: Arc<dyn ToolExecutor>,
) -> Result<ToolEntry> {
    let descriptor = ToolDescriptor {
        name,
        description,
        input_schema: schema_to_value::<T>()?,
    };
    Ok((descriptor, executor))
}

/// The tool catalog in declaration order.
pub fn builtin_tools(service: Arc<ChartService>) -> Result<Vec<ToolEntry>> {
    let shared = || service.clone();
    Ok(vec![
        entry::<NatalChartInput>(
            "generate_natal_chart",
            "Generate a natal chart: planetary positions, house cusps and aspects for a birth moment and place.",
            Arc::new(NatalChartTool(shared())),
        )?,
        entry::<ProgressedChartInput>(
            "generate_progressed_chart",
            "Progress a natal chart to a date by secondary progression (one day per year of life).",
            Arc::new(ProgressedChartTool(shared())),
        )?,
        entry::<SolarReturnInput>(
            "generate_solar_return",
            "Cast the solar return chart for a year: the moment the Sun regains its natal longitude.",
            Arc::new(SolarReturnTool(shared())),
        )?,
        entry::<CompositeChartInput>(
            "generate_composite_chart",
            "Cast a composite chart at the time and place midpoint of two births.",
            Arc::new(CompositeChartTool(shared())),
        )?,
        entry::<SynastryInput>(
            "calculate_synastry",
            "Compare two natal charts: interaspects, composite chart and a compatibility score.",
            Arc::new(SynastryTool(shared())),
        )?,
        entry::<TransitsInput>(
            "get_transits",
            "Positions of transiting planets on a date and their aspects to a natal chart.",
            Arc::new(TransitsTool(shared())),
        )?,
        entry::<InterpretAspectsInput>(
            "interpret_aspects",
            "Classify a chart's aspects: counts by type, harmonious and challenging totals, tightest aspect.",
            Arc::new(InterpretAspectsTool(shared())),
        )?,
        entry::<DignitiesInput>(
            "calculate_dignities",
            "Essential dignity scores (rulership, exaltation, detriment, fall) for each planet in a chart.",
            Arc::new(DignitiesTool(shared())),
        )?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::ephemeris::FixedEphemeris;
    use crate::models::Body;
    use serde_json::json;

    fn service() -> Arc<ChartService> {
        let provider = FixedEphemeris::new(0.0)
            .with_body(Body::Sun, 120.5)
            .with_body(Body::Moon, 240.5)
            .with_body(Body::Mars, 30.0);
        Arc::new(ChartService::new(Arc::new(Settings::default()), Arc::new(provider)))
    }

    #[test]
    fn test_catalog_order_and_schemas() {
        let tools = builtin_tools(service()).unwrap();
        let names: Vec<_> = tools.iter().map(|(d, _)| d.name).collect();
        assert_eq!(
            names,
            [
                "generate_natal_chart",
                "generate_progressed_chart",
                "generate_solar_return",
                "generate_composite_chart",
                "calculate_synastry",
                "get_transits",
                "interpret_aspects",
                "calculate_dignities",
            ]
        );
        for (descriptor, _) in &tools {
            assert_eq!(descriptor.input_schema.get("type"), Some(&json!("object")));
        }
    }

    #[tokio::test]
    async fn test_natal_tool_returns_chart() {
        let result = NatalChartTool(service())
            .execute(json!({
                "date_time": "1990-05-15 14:30:00",
                "latitude": "32n43",
                "longitude": "117w09",
                "objects": ["sun", "moon"]
            }))
            .await
            .unwrap();
        assert_eq!(result["planets"].as_array().unwrap().len(), 2);
        assert_eq!(result["planets"][0]["name"], json!("sun"));
        // Sun and Moon 120 degrees apart
        assert_eq!(result["aspects"][0]["aspect_type"], json!("trine"));
    }

    #[tokio::test]
    async fn test_bad_arguments_are_validation_errors() {
        let err = NatalChartTool(service())
            .execute(json!({"latitude": 10}))
            .await
            .unwrap_err();
        assert!(matches!(err, AstroError::Validation(_)));
    }

    #[tokio::test]
    async fn test_chart_round_trips_into_dignities() {
        let chart = NatalChartTool(service())
            .execute(json!({
                "date_time": "1990-05-15",
                "latitude": 0,
                "longitude": 0,
                "objects": ["sun", "mars"]
            }))
            .await
            .unwrap();
        let report = DignitiesTool(service())
            .execute(json!({ "chart_data": chart }))
            .await
            .unwrap();
        // Sun in Leo rules, Mars in Taurus is in detriment
        assert_eq!(report["total_score"], json!(0));
        assert_eq!(report["dignities"][0]["ruler"], json!(5));
        assert_eq!(report["dignities"][1]["detriment"], json!(-5));
    }

    #[tokio::test]
    async fn test_solar_return_rejects_out_of_range_year() {
        let err = SolarReturnTool(service())
            .execute(json!({
                "birth_data": {"date_time": "1990-05-15", "latitude": 0, "longitude": 0},
                "return_year": 1700
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, AstroError::Validation(_)));
    }
}
