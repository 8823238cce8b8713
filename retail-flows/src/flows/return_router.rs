//! Disposition routing for returned items.

use retail_adapters::traits::{MediaPart, ModelAdapter};
use retail_primitives::{Disposition, FieldViolation, ImageDataUri};
use retail_prompts::{PromptTemplate, PromptVars, TemplateResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::JSON_INSTRUCTION;
use crate::error::FlowResult;
use crate::flow::Flow;
use crate::invoker::invoke;
use crate::validate::{Checker, Validate};

/// A returned item and the context for routing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReturnRouterInput {
    /// Description of the returned product, including condition.
    pub product_description: String,
    /// Original price of the product.
    pub original_price: f64,
    /// Reason for the return provided by the customer.
    pub return_reason: String,
    /// Local demand for the product.
    pub local_demand: String,
    /// Logistics, warehousing and other cost factors.
    pub cost_effectiveness_factors: String,
    /// Optional photo of the returned product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data_uri: Option<ImageDataUri>,
}

impl Validate for ReturnRouterInput {
    fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        Checker::new()
            .min_len("productDescription", &self.product_description, 1)
            .non_negative("originalPrice", self.original_price)
            .min_len("returnReason", &self.return_reason, 1)
            .min_len("localDemand", &self.local_demand, 1)
            .min_len("costEffectivenessFactors", &self.cost_effectiveness_factors, 1)
            .finish()
    }
}

/// Routing decision returned by the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReturnRouterOutput {
    /// Recommended disposition of the returned item.
    pub disposition: Disposition,
    /// Explanation for the disposition, nominally at most 40 words.
    pub reasoning: String,
}

/// Marker type for the return routing flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnRouterFlow;

impl Flow for ReturnRouterFlow {
    const NAME: &'static str = "returnRouter";
    type Input = ReturnRouterInput;
    type Output = ReturnRouterOutput;

    fn template() -> TemplateResult<PromptTemplate> {
        PromptTemplate::builder()
            .text(
                "You are an expert in reverse logistics, tasked with determining the best course \
                 of action for returned items. Analyze the product description, return reason, \
                 local demand, and cost-effectiveness factors to decide whether the item should be \
                 resold, donated, or liquidated. Provide a clear explanation for your decision.",
            )
            .text(
                "Product Description: {{productDescription}}\n\
                 Original Price: {{originalPrice}}\n\
                 Return Reason: {{returnReason}}\n\
                 Local Demand: {{localDemand}}\n\
                 Cost Effectiveness Factors: {{costEffectivenessFactors}}",
            )
            .when(
                "photoDataUri",
                "Product Photo: the attached {{photoMimeType}} image shows the returned item.",
            )
            .text(
                "Based on this information, recommend a disposition (resale, donation, or \
                 liquidation) and explain your reasoning. The reasoning should be concise and no \
                 more than 40 words.",
            )
            .text(JSON_INSTRUCTION)
            .build()
    }

    fn vars(input: &ReturnRouterInput) -> PromptVars {
        let photo = input.photo_data_uri.as_ref();
        PromptVars::new()
            .with("productDescription", &input.product_description)
            .with("originalPrice", input.original_price)
            .with("returnReason", &input.return_reason)
            .with("localDemand", &input.local_demand)
            .with("costEffectivenessFactors", &input.cost_effectiveness_factors)
            .with_optional("photoDataUri", photo.map(ImageDataUri::as_str))
            .with_optional("photoMimeType", photo.map(ImageDataUri::mime_type))
    }

    fn media(input: &ReturnRouterInput) -> Vec<MediaPart> {
        input
            .photo_data_uri
            .iter()
            .map(MediaPart::from)
            .collect()
    }

    fn output_schema() -> Value {
        let dispositions: Vec<&str> = Disposition::ALL.iter().map(|d| d.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "disposition": {
                    "type": "string",
                    "enum": dispositions,
                    "description": "Recommended disposition of the returned item."
                },
                "reasoning": {
                    "type": "string",
                    "description": "Explanation for the recommended disposition."
                }
            },
            "required": ["disposition", "reasoning"],
            "additionalProperties": false
        })
    }
}

/// Decides whether a returned item is resold, donated or liquidated.
///
/// # Errors
///
/// See [`crate::invoke`]. A disposition outside the closed set is a
/// [`crate::FlowError::SchemaMismatch`].
pub async fn return_router(
    adapter: &dyn ModelAdapter,
    input: &ReturnRouterInput,
) -> FlowResult<ReturnRouterOutput> {
    invoke::<ReturnRouterFlow>(adapter, input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::render_prompt;

    const PHOTO: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    fn input() -> ReturnRouterInput {
        ReturnRouterInput {
            product_description: "43-inch 4K Smart TV, used - like new".into(),
            original_price: 35999.0,
            return_reason: "Customer upgraded to a larger model.".into(),
            local_demand: "High demand for used electronics.".into(),
            cost_effectiveness_factors: "Low logistics cost to a nearby resale partner.".into(),
            photo_data_uri: None,
        }
    }

    #[test]
    fn prompt_without_photo_has_no_image_section() {
        let prompt = render_prompt::<ReturnRouterFlow>(&input()).unwrap();
        assert!(!prompt.contains("Product Photo"));
        assert!(!prompt.contains("image"));
        assert!(!prompt.contains("\n\n\n"));
        assert!(ReturnRouterFlow::media(&input()).is_empty());
    }

    #[test]
    fn prompt_with_photo_references_attachment() {
        let mut with_photo = input();
        with_photo.photo_data_uri = Some(ImageDataUri::parse(PHOTO).unwrap());

        let prompt = render_prompt::<ReturnRouterFlow>(&with_photo).unwrap();
        assert!(prompt.contains("Product Photo: the attached image/jpeg image"));
        assert!(!prompt.contains("/9j/4AAQ"), "payload travels as media, not text");

        let media = ReturnRouterFlow::media(&with_photo);
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].mime_type(), "image/jpeg");
    }

    #[test]
    fn prompt_interpolates_every_field() {
        let input = input();
        let prompt = render_prompt::<ReturnRouterFlow>(&input).unwrap();
        assert!(prompt.contains("Original Price: 35999"));
        for value in [
            &input.product_description,
            &input.return_reason,
            &input.local_demand,
            &input.cost_effectiveness_factors,
        ] {
            assert!(prompt.contains(value.as_str()), "missing {value}");
        }
    }

    #[test]
    fn missing_photo_passes_validation() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn schema_enumerates_dispositions() {
        let schema = ReturnRouterFlow::output_schema();
        assert_eq!(
            schema["properties"]["disposition"]["enum"],
            json!(["resale", "donation", "liquidation"])
        );
    }

    #[test]
    fn output_rejects_unknown_disposition() {
        let decoded = serde_json::from_str::<ReturnRouterOutput>(
            r#"{"disposition": "refurbish", "reasoning": "x"}"#,
        );
        assert!(decoded.is_err());
    }
}
