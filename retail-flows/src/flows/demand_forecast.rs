//! Neighbourhood-level demand forecasting.

use retail_adapters::traits::ModelAdapter;
use retail_primitives::FieldViolation;
use retail_prompts::{PromptTemplate, PromptVars, TemplateResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use super::JSON_INSTRUCTION;
use crate::error::FlowResult;
use crate::flow::Flow;
use crate::invoker::invoke;
use crate::validate::{Checker, Validate};

const MIN_ZIP_LEN: usize = 5;
const MIN_SIGNAL_LEN: usize = 10;

/// Signals used to forecast demand for one product in one neighbourhood.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DemandForecastInput {
    /// The name of the product.
    pub product_name: String,
    /// Postal (PIN) code of the neighbourhood.
    pub zip_code: String,
    /// Historical sales narrative for the neighbourhood.
    pub historical_sales_data: String,
    /// Social media trend narrative for the neighbourhood.
    pub social_media_trends: String,
    /// Local event narrative for the neighbourhood.
    pub local_event_data: String,
}

impl Validate for DemandForecastInput {
    fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        Checker::new()
            .min_len("productName", &self.product_name, 1)
            .min_len("zipCode", &self.zip_code, MIN_ZIP_LEN)
            .min_len("historicalSalesData", &self.historical_sales_data, MIN_SIGNAL_LEN)
            .min_len("socialMediaTrends", &self.social_media_trends, MIN_SIGNAL_LEN)
            .min_len("localEventData", &self.local_event_data, MIN_SIGNAL_LEN)
            .finish()
    }
}

/// Forecast returned by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DemandForecastOutput {
    /// Predicted demand, nominally at most 20 words.
    pub predicted_demand: String,
    /// Confidence of the prediction, nominally within `[0, 1]`.
    pub confidence_level: f64,
    /// Factors influencing the demand, nominally at most 30 words.
    pub factors_influencing_demand: String,
}

impl DemandForecastOutput {
    /// Whether the confidence lies within `[0, 1]`.
    #[must_use]
    pub fn confidence_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence_level)
    }

    /// A result is suspect when the model ignored the confidence bound.
    ///
    /// The bound is a prompt instruction only, so suspect results are still
    /// returned; callers decide how to present them.
    #[must_use]
    pub fn is_suspect(&self) -> bool {
        !self.confidence_in_range()
    }
}

/// Marker type for the demand forecast flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandForecastFlow;

impl Flow for DemandForecastFlow {
    const NAME: &'static str = "demandForecast";
    type Input = DemandForecastInput;
    type Output = DemandForecastOutput;

    fn template() -> TemplateResult<PromptTemplate> {
        PromptTemplate::builder()
            .text(
                "You are an expert in demand forecasting for the Indian retail market, \
                 specializing in predicting demand at the neighborhood level for specific products.",
            )
            .text(
                "Based on the historical sales data, social media trends, and local event data \
                 provided, predict the demand for \"{{productName}}\" in the given Pincode.",
            )
            .text(
                "Product Name: {{productName}}\n\
                 Pincode: {{zipCode}}\n\
                 Historical Sales Data: {{historicalSalesData}}\n\
                 Social Media Trends: {{socialMediaTrends}}\n\
                 Local Event Data: {{localEventData}}",
            )
            .text(
                "Provide the predicted demand, a confidence level (0-1), and the factors \
                 influencing the demand.\n\
                 predictedDemand should be a string, be concise, and be no more than 20 words.\n\
                 factorsInfluencingDemand should be a string, be concise, and be no more than 30 words.",
            )
            .text(JSON_INSTRUCTION)
            .build()
    }

    fn vars(input: &DemandForecastInput) -> PromptVars {
        PromptVars::new()
            .with("productName", &input.product_name)
            .with("zipCode", &input.zip_code)
            .with("historicalSalesData", &input.historical_sales_data)
            .with("socialMediaTrends", &input.social_media_trends)
            .with("localEventData", &input.local_event_data)
    }

    fn output_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "predictedDemand": {
                    "type": "string",
                    "description": "The predicted demand for the neighborhood."
                },
                "confidenceLevel": {
                    "type": "number",
                    "description": "The confidence level of the prediction (0-1)."
                },
                "factorsInfluencingDemand": {
                    "type": "string",
                    "description": "The factors influencing the demand."
                }
            },
            "required": ["predictedDemand", "confidenceLevel", "factorsInfluencingDemand"],
            "additionalProperties": false
        })
    }

    fn review(output: &DemandForecastOutput) -> Result<(), String> {
        if output.is_suspect() {
            warn!(
                confidence = output.confidence_level,
                "confidence level outside [0, 1]; returning result flagged as suspect"
            );
        }
        Ok(())
    }
}

/// Predicts neighbourhood demand for a product.
///
/// # Errors
///
/// See [`crate::invoke`].
pub async fn demand_forecast(
    adapter: &dyn ModelAdapter,
    input: &DemandForecastInput,
) -> FlowResult<DemandForecastOutput> {
    invoke::<DemandForecastFlow>(adapter, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::render_prompt;

    fn input() -> DemandForecastInput {
        DemandForecastInput {
            product_name: "Premium Cricket Bat".into(),
            zip_code: "400050".into(),
            historical_sales_data: "Averaging 20 units per week.".into(),
            social_media_trends: "High engagement on cricket fan pages.".into(),
            local_event_data: "Upcoming local cricket tournament.".into(),
        }
    }

    #[test]
    fn accepts_form_defaults() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn short_signals_are_rejected() {
        let mut bad = input();
        bad.zip_code = "4000".into();
        bad.local_event_data = "none".into();

        let violations = bad.validate().expect_err("two violations");
        let fields: Vec<_> = violations.iter().map(FieldViolation::field).collect();
        assert_eq!(fields, vec!["zipCode", "localEventData"]);
    }

    #[test]
    fn prompt_interpolates_every_field() {
        let input = input();
        let prompt = render_prompt::<DemandForecastFlow>(&input).unwrap();
        for value in [
            &input.product_name,
            &input.zip_code,
            &input.historical_sales_data,
            &input.social_media_trends,
            &input.local_event_data,
        ] {
            assert!(prompt.contains(value.as_str()), "missing {value}");
        }
        assert!(prompt.ends_with(JSON_INSTRUCTION));
    }

    #[test]
    fn template_placeholders_match_vars() {
        let template = DemandForecastFlow::template().unwrap();
        let vars = DemandForecastFlow::vars(&input());
        let mut bound: Vec<_> = vars.names().map(str::to_owned).collect();
        let mut used = template.placeholders();
        bound.sort();
        used.sort();
        assert_eq!(bound, used);
    }

    #[test]
    fn out_of_range_confidence_is_suspect_not_rejected() {
        let output = DemandForecastOutput {
            predicted_demand: "High".into(),
            confidence_level: 1.4,
            factors_influencing_demand: "Festival".into(),
        };
        assert!(output.is_suspect());
        assert!(DemandForecastFlow::review(&output).is_ok());
    }

    #[test]
    fn boundary_confidence_is_in_range() {
        for confidence in [0.0, 1.0] {
            let output = DemandForecastOutput {
                predicted_demand: "Flat".into(),
                confidence_level: confidence,
                factors_influencing_demand: "None".into(),
            };
            assert!(output.confidence_in_range());
        }
    }
}
