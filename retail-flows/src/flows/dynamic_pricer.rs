//! Price recommendations from market signals.

use retail_adapters::traits::ModelAdapter;
use retail_primitives::FieldViolation;
use retail_prompts::{PromptTemplate, PromptVars, TemplateResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::JSON_INSTRUCTION;
use crate::error::FlowResult;
use crate::flow::Flow;
use crate::invoker::invoke;
use crate::validate::{Checker, Validate};

/// Product economics and market context for a pricing decision. Amounts are in INR.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicPricerInput {
    /// Detailed description of the product.
    pub product_description: String,
    /// Unit cost of the product.
    pub cost: f64,
    /// Original selling price of the product.
    pub original_price: f64,
    /// Summary of competitor prices for similar products.
    pub competitor_prices: String,
    /// Current market trends relevant to the product category.
    pub market_trends: String,
}

impl Validate for DynamicPricerInput {
    fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        Checker::new()
            .min_len("productDescription", &self.product_description, 1)
            .non_negative("cost", self.cost)
            .non_negative("originalPrice", self.original_price)
            .min_len("competitorPrices", &self.competitor_prices, 1)
            .min_len("marketTrends", &self.market_trends, 1)
            .finish()
    }
}

/// Recommended price and its justification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DynamicPricerOutput {
    /// Recommended selling price in INR.
    pub suggested_price: f64,
    /// Explanation citing market data and potential ROI, nominally at most 40 words.
    pub reasoning: String,
}

/// Marker type for the dynamic pricing flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicPricerFlow;

impl Flow for DynamicPricerFlow {
    const NAME: &'static str = "dynamicPricer";
    type Input = DynamicPricerInput;
    type Output = DynamicPricerOutput;

    fn template() -> TemplateResult<PromptTemplate> {
        PromptTemplate::builder()
            .text(
                "You are an expert pricing analyst for a large retail company in India. Your task \
                 is to recommend the optimal price for a product based on the provided data.",
            )
            .text(
                "Analyze the following information to determine a suggested price that balances \
                 competitiveness and profitability in the Indian market.",
            )
            .text(
                "Product Description: {{productDescription}}\n\
                 Original Price: ₹{{originalPrice}}\n\
                 Product Cost: ₹{{cost}}\n\
                 Competitor Prices: {{competitorPrices}}\n\
                 Market Trends: {{marketTrends}}",
            )
            .text(
                "Based on this data, provide a suggested price (in INR) and a brief reasoning for \
                 your recommendation. The reasoning should be concise and no more than 40 words.",
            )
            .text(JSON_INSTRUCTION)
            .build()
    }

    fn vars(input: &DynamicPricerInput) -> PromptVars {
        PromptVars::new()
            .with("productDescription", &input.product_description)
            .with("cost", input.cost)
            .with("originalPrice", input.original_price)
            .with("competitorPrices", &input.competitor_prices)
            .with("marketTrends", &input.market_trends)
    }

    fn output_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "suggestedPrice": {
                    "type": "number",
                    "description": "The recommended selling price for the product in INR."
                },
                "reasoning": {
                    "type": "string",
                    "description": "Explanation for the recommended price, citing market data and potential ROI."
                }
            },
            "required": ["suggestedPrice", "reasoning"],
            "additionalProperties": false
        })
    }
}

/// Recommends a selling price.
///
/// # Errors
///
/// See [`crate::invoke`].
pub async fn dynamic_pricer(
    adapter: &dyn ModelAdapter,
    input: &DynamicPricerInput,
) -> FlowResult<DynamicPricerOutput> {
    invoke::<DynamicPricerFlow>(adapter, input).await
}
