//! The shared invocation routine behind every flow.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use retail_adapters::traits::{GenerationRequest, ModelAdapter, OutputContract};
use retail_primitives::InvocationId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{FlowError, FlowResult};
use crate::flow::Flow;
use crate::validate::{Validate, decode_input};

/// Renders the prompt a flow would send for `input`, without calling a backend.
///
/// # Errors
///
/// Returns [`FlowError::Validation`] for invalid input and
/// [`FlowError::Template`] if rendering fails.
pub fn render_prompt<F: Flow>(input: &F::Input) -> FlowResult<String> {
    input
        .validate()
        .map_err(|violations| FlowError::Validation { violations })?;
    Ok(F::template()?.render(&F::vars(input))?)
}

/// Runs one flow invocation against `adapter`.
///
/// Validation happens before anything else; an invalid input never reaches
/// the backend. The call is made exactly once, with no timeout or retry
/// beyond what the adapter itself is configured with.
///
/// # Errors
///
/// - [`FlowError::Validation`] when the input breaks its constraints.
/// - [`FlowError::Template`] when the prompt cannot be rendered.
/// - [`FlowError::Generation`] when the backend fails or returns nothing.
/// - [`FlowError::SchemaMismatch`] when the response does not decode into
///   the output schema.
pub async fn invoke<F: Flow>(adapter: &dyn ModelAdapter, input: &F::Input) -> FlowResult<F::Output> {
    invoke_with::<F>(adapter, input, RequestTuning::default()).await
}

/// Like [`invoke`], but takes an untyped input record.
///
/// # Errors
///
/// Returns [`FlowError::Validation`] when the record cannot be decoded
/// into `F::Input`, plus every error [`invoke`] can return.
pub async fn invoke_json<F>(adapter: &dyn ModelAdapter, input: Value) -> FlowResult<F::Output>
where
    F: Flow,
    F::Input: DeserializeOwned,
{
    let input: F::Input = decode_input(input)?;
    invoke::<F>(adapter, &input).await
}

#[derive(Clone, Copy, Debug, Default)]
struct RequestTuning {
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

async fn invoke_with<F: Flow>(
    adapter: &dyn ModelAdapter,
    input: &F::Input,
    tuning: RequestTuning,
) -> FlowResult<F::Output> {
    let id = InvocationId::random();
    let metadata = adapter.metadata();
    let span = info_span!(
        "flow",
        flow = F::NAME,
        invocation = %id,
        provider = metadata.provider(),
        model = metadata.model(),
    );

    async move {
        if let Err(violations) = input.validate() {
            warn!(count = violations.len(), "input rejected before backend call");
            return Err(FlowError::Validation { violations });
        }

        let prompt = F::template()?.render(&F::vars(input))?;
        debug!(prompt_len = prompt.len(), "prompt rendered");

        let mut request = GenerationRequest::new(prompt)?
            .with_contract(OutputContract::new(F::NAME, F::output_schema()));
        for part in F::media(input) {
            request = request.with_media(part);
        }
        if let Some(temperature) = tuning.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(tokens) = tuning.max_output_tokens {
            request = request.with_max_output_tokens(tokens);
        }

        let response = adapter.generate(request).await.map_err(|err| {
            warn!(error = %err, "backend call failed");
            FlowError::from(err)
        })?;

        let text = response.into_text().ok_or_else(|| {
            warn!("backend returned no output");
            FlowError::no_output()
        })?;

        let output = decode_output::<F>(&text)?;
        info!("flow completed");
        Ok(output)
    }
    .instrument(span)
    .await
}

fn decode_output<F: Flow>(text: &str) -> FlowResult<F::Output> {
    let body = strip_code_fence(text);
    let output: F::Output = serde_json::from_str(body).map_err(|err| {
        warn!(error = %err, "response rejected by output schema");
        FlowError::SchemaMismatch {
            flow: F::NAME,
            reason: err.to_string(),
        }
    })?;

    F::review(&output).map_err(|reason| FlowError::SchemaMismatch {
        flow: F::NAME,
        reason,
    })?;
    Ok(output)
}

/// Some models wrap JSON in a Markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// A flow bound to a backend, for call sites that hold on to one.
///
/// Cloning is cheap and clones share only the adapter handle; concurrent
/// calls through the same invoker are independent.
pub struct Invoker<F: Flow> {
    adapter: Arc<dyn ModelAdapter>,
    tuning: RequestTuning,
    _flow: PhantomData<fn() -> F>,
}

impl<F: Flow> Clone for Invoker<F> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            tuning: self.tuning,
            _flow: PhantomData,
        }
    }
}

impl<F: Flow> fmt::Debug for Invoker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("Invoker")
            .field("flow", &F::NAME)
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .finish_non_exhaustive()
    }
}

impl<F: Flow> Invoker<F> {
    /// Binds the flow to `adapter`.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter,
            tuning: RequestTuning::default(),
            _flow: PhantomData,
        }
    }

    /// Sets the sampling temperature sent with every call.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.tuning.temperature = Some(temperature);
        self
    }

    /// Caps the response length sent with every call.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.tuning.max_output_tokens = Some(tokens);
        self
    }

    /// Returns the bound adapter.
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn ModelAdapter> {
        &self.adapter
    }

    /// Runs one invocation. See [`invoke`].
    ///
    /// # Errors
    ///
    /// Propagates every [`FlowError`] produced by [`invoke`].
    pub async fn call(&self, input: &F::Input) -> FlowResult<F::Output> {
        invoke_with::<F>(self.adapter.as_ref(), input, self.tuning).await
    }
}
