//! Structured prompt invocation for retail operations.
//!
//! A [`Flow`] pairs a typed input record, a prompt template and a typed
//! output record. [`invoke`] drives one round trip: validate the input,
//! render the prompt, call the backend once, then decode the response
//! strictly against the output schema. Nothing is cached or retried and no
//! state is shared between calls.
//!
//! Three flows ship with the crate: [`demand_forecast`], [`dynamic_pricer`]
//! and [`return_router`].

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod flow;
pub mod flows;
mod invoker;
mod supersede;
pub mod validate;

pub use error::{FlowError, FlowResult};
pub use flow::Flow;
pub use flows::demand_forecast::{
    DemandForecastFlow, DemandForecastInput, DemandForecastOutput, demand_forecast,
};
pub use flows::dynamic_pricer::{
    DynamicPricerFlow, DynamicPricerInput, DynamicPricerOutput, dynamic_pricer,
};
pub use flows::return_router::{ReturnRouterFlow, ReturnRouterInput, ReturnRouterOutput, return_router};
pub use invoker::{Invoker, invoke, invoke_json, render_prompt};
pub use supersede::{Superseded, SupersedeGuard, Ticket};
pub use validate::Validate;
