use std::sync::Mutex;

use async_trait::async_trait;
use futures::executor::block_on;
use proptest::prelude::*;
use retail_adapters::traits::{
    AdapterMetadata, AdapterResult, GenerationRequest, GenerationResponse, ModelAdapter,
};
use retail_flows::{
    DemandForecastFlow, DemandForecastInput, DemandForecastOutput, DynamicPricerFlow,
    DynamicPricerInput, DynamicPricerOutput, ReturnRouterFlow, ReturnRouterInput,
    ReturnRouterOutput, demand_forecast, dynamic_pricer, render_prompt, return_router,
};
use retail_primitives::{Disposition, ImageDataUri};

/// Replies with a fixed body and keeps the request it was sent.
struct FixedAdapter {
    metadata: AdapterMetadata,
    body: String,
    seen: Mutex<Option<GenerationRequest>>,
}

impl FixedAdapter {
    fn new(body: String) -> Self {
        Self {
            metadata: AdapterMetadata::new("fixed", "test-model"),
            body,
            seen: Mutex::new(None),
        }
    }

    fn seen(&self) -> GenerationRequest {
        self.seen.lock().unwrap().clone().expect("adapter was called")
    }
}

#[async_trait]
impl ModelAdapter for FixedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn generate(&self, request: GenerationRequest) -> AdapterResult<GenerationResponse> {
        *self.seen.lock().unwrap() = Some(request);
        Ok(GenerationResponse::text(self.body.clone()))
    }
}

fn short_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.]{0,30}"
}

fn signal_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]{10,16}[A-Za-z0-9 ,.%-]{0,60}"
}

fn rupees() -> impl Strategy<Value = f64> {
    (0u32..10_000_000).prop_map(|paise| f64::from(paise) / 100.0)
}

fn forecast_input() -> impl Strategy<Value = DemandForecastInput> {
    (short_text(), "[1-9][0-9]{5}", signal_text(), signal_text(), signal_text()).prop_map(
        |(product_name, zip_code, historical_sales_data, social_media_trends, local_event_data)| {
            DemandForecastInput {
                product_name,
                zip_code,
                historical_sales_data,
                social_media_trends,
                local_event_data,
            }
        },
    )
}

fn pricing_input() -> impl Strategy<Value = DynamicPricerInput> {
    (short_text(), rupees(), rupees(), signal_text(), signal_text()).prop_map(
        |(product_description, cost, original_price, competitor_prices, market_trends)| {
            DynamicPricerInput {
                product_description,
                cost,
                original_price,
                competitor_prices,
                market_trends,
            }
        },
    )
}

fn photo() -> impl Strategy<Value = Option<ImageDataUri>> {
    prop::option::of(
        (prop::sample::select(vec!["image/png", "image/jpeg", "image/webp"]), "[A-Za-z0-9+/]{4,40}")
            .prop_map(|(mime, payload)| {
                ImageDataUri::parse(format!("data:{mime};base64,{payload}")).unwrap()
            }),
    )
}

fn return_input() -> impl Strategy<Value = ReturnRouterInput> {
    (short_text(), rupees(), signal_text(), signal_text(), signal_text(), photo()).prop_map(
        |(
            product_description,
            original_price,
            return_reason,
            local_demand,
            cost_effectiveness_factors,
            photo_data_uri,
        )| ReturnRouterInput {
            product_description,
            original_price,
            return_reason,
            local_demand,
            cost_effectiveness_factors,
            photo_data_uri,
        },
    )
}

fn disposition() -> impl Strategy<Value = Disposition> {
    prop::sample::select(Disposition::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    #[test]
    fn forecast_prompt_carries_every_field(input in forecast_input()) {
        let prompt = render_prompt::<DemandForecastFlow>(&input).unwrap();
        for value in [
            &input.product_name,
            &input.zip_code,
            &input.historical_sales_data,
            &input.social_media_trends,
            &input.local_event_data,
        ] {
            prop_assert!(prompt.contains(value.as_str()), "`{}` missing from prompt", value);
        }
    }

    #[test]
    fn pricing_prompt_carries_every_field(input in pricing_input()) {
        let prompt = render_prompt::<DynamicPricerFlow>(&input).unwrap();
        let cost = format!("Product Cost: ₹{}", input.cost);
        let original = format!("Original Price: ₹{}", input.original_price);
        for value in [
            &input.product_description,
            &cost,
            &original,
            &input.competitor_prices,
            &input.market_trends,
        ] {
            prop_assert!(prompt.contains(value.as_str()), "`{}` missing from prompt", value);
        }
    }

    #[test]
    fn return_prompt_carries_every_field(input in return_input()) {
        let prompt = render_prompt::<ReturnRouterFlow>(&input).unwrap();
        let original = input.original_price.to_string();
        for value in [
            &input.product_description,
            &original,
            &input.return_reason,
            &input.local_demand,
            &input.cost_effectiveness_factors,
        ] {
            prop_assert!(prompt.contains(value.as_str()), "`{}` missing from prompt", value);
        }
        match &input.photo_data_uri {
            Some(uri) => prop_assert!(prompt.contains(uri.mime_type())),
            None => prop_assert!(!prompt.contains("Product Photo")),
        }
    }

    #[test]
    fn forecast_output_is_delivered_unchanged(
        input in forecast_input(),
        predicted_demand in short_text(),
        confidence in (0u32..=100).prop_map(|pct| f64::from(pct) / 100.0),
        factors_influencing_demand in short_text(),
    ) {
        let expected = DemandForecastOutput {
            predicted_demand,
            confidence_level: confidence,
            factors_influencing_demand,
        };
        let adapter = FixedAdapter::new(serde_json::to_string(&expected).unwrap());

        let output = block_on(demand_forecast(&adapter, &input)).unwrap();
        prop_assert_eq!(output, expected);
    }

    #[test]
    fn pricing_output_is_delivered_unchanged(
        input in pricing_input(),
        suggested_price in rupees(),
        reasoning in short_text(),
    ) {
        let expected = DynamicPricerOutput { suggested_price, reasoning };
        let adapter = FixedAdapter::new(serde_json::to_string(&expected).unwrap());

        let output = block_on(dynamic_pricer(&adapter, &input)).unwrap();
        prop_assert_eq!(output, expected);
    }

    #[test]
    fn routing_output_is_delivered_unchanged(
        input in return_input(),
        disposition in disposition(),
        reasoning in short_text(),
    ) {
        let expected = ReturnRouterOutput { disposition, reasoning };
        let adapter = FixedAdapter::new(serde_json::to_string(&expected).unwrap());

        let output = block_on(return_router(&adapter, &input)).unwrap();
        prop_assert_eq!(output, expected);
        prop_assert_eq!(adapter.seen().media().len(), usize::from(input.photo_data_uri.is_some()));
    }
}
