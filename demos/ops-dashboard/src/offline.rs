//! Canned backend for running the dashboard without network access.

use async_trait::async_trait;
use retail_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, GenerationRequest, GenerationResponse,
    ModelAdapter,
};
use retail_flows::{DemandForecastFlow, DynamicPricerFlow, Flow, ReturnRouterFlow};
use serde_json::json;

use crate::inventory::Condition;

/// Answers each flow with a fixed, plausible response derived from the prompt.
pub struct OfflineAdapter {
    metadata: AdapterMetadata,
}

impl OfflineAdapter {
    pub fn new() -> Self {
        Self {
            metadata: AdapterMetadata::new("offline", "canned"),
        }
    }
}

#[async_trait]
impl ModelAdapter for OfflineAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn generate(&self, request: GenerationRequest) -> AdapterResult<GenerationResponse> {
        let contract = request
            .contract()
            .ok_or_else(|| AdapterError::invalid_request("offline backend needs an output contract"))?;
        let prompt = request.prompt();

        let body = match contract.name() {
            DemandForecastFlow::NAME => json!({
                "predictedDemand": "High demand expected over the next four weeks.",
                "confidenceLevel": 0.82,
                "factorsInfluencingDemand": "Seasonal spike and strong social engagement in the neighbourhood.",
            }),
            DynamicPricerFlow::NAME => {
                let original = original_price(prompt).ok_or_else(|| {
                    AdapterError::invalid_request("prompt carries no original price")
                })?;
                json!({
                    "suggestedPrice": (original * 90.0).round() / 100.0,
                    "reasoning": "Price adjusted to stay competitive with online sellers while maximizing margin based on current market trends.",
                })
            }
            ReturnRouterFlow::NAME => route(prompt),
            other => {
                return Err(AdapterError::invalid_request(format!(
                    "offline backend has no answer for `{other}`"
                )));
            }
        };
        Ok(GenerationResponse::text(body.to_string()))
    }
}

fn original_price(prompt: &str) -> Option<f64> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Original Price: "))
        .map(|value| value.trim_start_matches('₹'))
        .and_then(|value| value.trim().parse().ok())
}

fn route(prompt: &str) -> serde_json::Value {
    let mentions = |condition: Condition| prompt.contains(&format!("Condition: {condition}."));
    if mentions(Condition::Damaged) {
        json!({
            "disposition": "liquidation",
            "reasoning": "Significant damage reported. Liquidation is the most cost-effective path to recover value.",
        })
    } else if mentions(Condition::New) {
        json!({
            "disposition": "resale",
            "reasoning": "Returned unused in original condition. Restock and resell at full price.",
        })
    } else if mentions(Condition::UsedGood) {
        json!({
            "disposition": "resale",
            "reasoning": "Minor cosmetic wear but fully functional. High local demand justifies resale at a discounted price.",
        })
    } else {
        json!({
            "disposition": "resale",
            "reasoning": "Item is in like-new condition and local demand is high. Recommend for immediate resale at 90% of original price.",
        })
    }
}
