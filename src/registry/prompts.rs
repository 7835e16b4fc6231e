//! Prompt templates rendered by `prompts/get`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::catalog::{PromptArgument, PromptDescriptor, PromptMessage};
use crate::error::{AstroError, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("static placeholder pattern"));

fn required(name: &'static str, description: &'static str) -> PromptArgument {
    PromptArgument {
        name,
        description,
        required: true,
        default: "",
    }
}

fn optional(
    name: &'static str,
    description: &'static str,
    default: &'static str,
) -> PromptArgument {
    PromptArgument {
        name,
        description,
        required: false,
        default,
    }
}

pub fn descriptors() -> Vec<PromptDescriptor> {
    vec![
        PromptDescriptor {
            name: "natal_chart_interpretation",
            description: "Interpret a natal chart in depth",
            arguments: vec![
                required("chart_data", "Natal chart data from generate_natal_chart"),
                optional(
                    "focus_areas",
                    "Life areas to emphasise",
                    "General interpretation covering all major areas",
                ),
                optional("detail_level", "basic, medium or detailed", "medium"),
            ],
        },
        PromptDescriptor {
            name: "transit_report",
            description: "Report on current transits to a natal chart",
            arguments: vec![
                required("natal_chart", "Reference natal chart"),
                required("transit_data", "Output of get_transits"),
                optional("time_period", "Period the report covers", "current"),
            ],
        },
        PromptDescriptor {
            name: "compatibility_analysis",
            description: "Analyse relationship compatibility from synastry",
            arguments: vec![
                required("synastry_data", "Output of calculate_synastry"),
                optional("relationship_type", "Kind of relationship", "romantic"),
            ],
        },
        PromptDescriptor {
            name: "progression_forecast",
            description: "Forecast from a progressed chart",
            arguments: vec![
                required("progressed_chart", "Output of generate_progressed_chart"),
                required("natal_chart", "Reference natal chart"),
                optional("time_frame", "Period the forecast covers", "year ahead"),
            ],
        },
    ]
}

/// Text substituted for one argument: strings verbatim, anything else as JSON.
fn argument_text(
    arguments: &Map<String, Value>,
    argument: &PromptArgument,
    prompt: &str,
) -> Result<String> {
    match arguments.get(argument.name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None if argument.required => Err(AstroError::validation(format!(
            "Missing required argument '{}' for prompt '{}'",
            argument.name, prompt
        ))),
        Some(Value::Null) | None => Ok(argument.default.to_string()),
        Some(other) => Ok(other.to_string()),
    }
}

fn template(name: &str) -> Option<&'static str> {
    let layout = match name {
        "natal_chart_interpretation" => {
            "Interpret the natal chart below.\n\n\
             Chart data: {chart_data}\n\n\
             Focus areas: {focus_areas}\n\
             Detail level: {detail_level}\n\n\
             Cover:\n\
             1. An overview of the personality\n\
             2. The key planetary placements\n\
             3. The strongest aspects and how they combine\n\
             4. Emphasised houses and life themes\n\
             5. Strengths and challenges\n\
             6. Direction and lessons\n\n\
             Keep the interpretation clear and grounded in the placements given."
        }
        "transit_report" => {
            "Write a transit report for the period requested.\n\n\
             Natal chart: {natal_chart}\n\
             Transit data: {transit_data}\n\
             Time period: {time_period}\n\n\
             Cover:\n\
             1. The transits in effect\n\
             2. The most significant transit aspects\n\
             3. Which areas of life are activated\n\
             4. Opportunities and pressures\n\
             5. Timing of the major transits\n\
             6. Practical guidance for the period\n\n\
             Prioritise the transits with the tightest orbs."
        }
        "compatibility_analysis" => {
            "Analyse the compatibility shown by the synastry below.\n\n\
             Synastry data: {synastry_data}\n\
             Relationship type: {relationship_type}\n\n\
             Cover:\n\
             1. Overall compatibility\n\
             2. The strongest connections\n\
             3. Likely friction points\n\
             4. Communication styles\n\
             5. Long-term potential\n\
             6. Advice for the relationship\n\n\
             Weigh harmonious and challenging interaspects evenly."
        }
        "progression_forecast" => {
            "Forecast from the progressed chart below.\n\n\
             Progressed chart: {progressed_chart}\n\
             Natal chart: {natal_chart}\n\
             Time frame: {time_frame}\n\n\
             Cover:\n\
             1. Key progressed movements\n\
             2. Progressed aspects forming or separating\n\
             3. Shifting priorities and themes\n\
             4. Growth opportunities\n\
             5. Challenges ahead\n\
             6. A timeline of notable developments\n\n\
             Concentrate on the progressions with the clearest significance."
        }
        _ => return None,
    };
    Some(layout)
}

/// Render `descriptor` with `arguments` into a single user message.
pub fn render(
    descriptor: &PromptDescriptor,
    arguments: &Map<String, Value>,
) -> Result<Vec<PromptMessage>> {
    let layout = template(descriptor.name).ok_or_else(|| {
        AstroError::computation(format!("No template for prompt '{}'", descriptor.name))
    })?;

    let values = descriptor
        .arguments
        .iter()
        .map(|argument| {
            argument_text(arguments, argument, descriptor.name).map(|text| (argument.name, text))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    // Single pass, so argument text that looks like a placeholder stays literal
    let text = PLACEHOLDER.replace_all(layout, |caps: &Captures| {
        values
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });
    Ok(vec![PromptMessage::user(text.into_owned())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str) -> PromptDescriptor {
        descriptors().into_iter().find(|d| d.name == name).unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_every_prompt_has_a_template() {
        for d in descriptors() {
            assert!(template(d.name).is_some(), "{}", d.name);
            for arg in &d.arguments {
                assert!(template(d.name).unwrap().contains(&format!("{{{}}}", arg.name)));
            }
        }
    }

    #[test]
    fn test_defaults_fill_missing_optional_arguments() {
        let messages = render(
            &descriptor("transit_report"),
            &args(json!({"natal_chart": "N", "transit_data": {"transit_aspects": []}})),
        )
        .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        let text = &messages[0].content.text;
        assert!(text.contains("Natal chart: N"));
        assert!(text.contains("Transit data: {\"transit_aspects\":[]}"));
        assert!(text.contains("Time period: current"));
    }

    #[test]
    fn test_supplied_arguments_override_defaults() {
        let messages = render(
            &descriptor("compatibility_analysis"),
            &args(json!({"synastry_data": "S", "relationship_type": "business"})),
        )
        .unwrap();
        assert!(messages[0].content.text.contains("Relationship type: business"));
    }

    #[test]
    fn test_argument_text_is_not_expanded() {
        let messages = render(
            &descriptor("transit_report"),
            &args(json!({"natal_chart": "{transit_data}", "transit_data": "T"})),
        )
        .unwrap();
        assert!(messages[0].content.text.contains("Natal chart: {transit_data}"));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = render(&descriptor("progression_forecast"), &args(json!({"natal_chart": "N"})))
            .unwrap_err();
        assert!(matches!(err, AstroError::Validation(_)));
        assert!(err.to_string().contains("progressed_chart"));
    }
}
