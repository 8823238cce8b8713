//! The three retail flows.

pub mod demand_forecast;
pub mod dynamic_pricer;
pub mod return_router;

/// Closing instruction shared by every template.
pub(crate) const JSON_INSTRUCTION: &str =
    "Respond with a valid JSON object that conforms to the output schema.";
