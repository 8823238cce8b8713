use retail_adapters::traits::AdapterError;
use retail_primitives::FieldViolation;
use retail_prompts::TemplateError;
use thiserror::Error;

/// Result alias for flow invocations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Why a flow invocation failed. No variant carries a partial result.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The input record broke its schema constraints. The backend was not called.
    #[error("input validation failed: {}", list_violations(.violations))]
    Validation {
        /// Every offending field.
        violations: Vec<FieldViolation>,
    },

    /// The prompt template could not be rendered from the input.
    #[error("prompt rendering failed: {source}")]
    Template {
        /// Underlying template error.
        #[from]
        source: TemplateError,
    },

    /// The backend was unreachable, rate limited, errored, or produced no output.
    #[error("generation failed: {reason}")]
    Generation {
        /// Human-readable failure description.
        reason: String,
        /// Adapter error, when the failure came from the transport.
        #[source]
        source: Option<AdapterError>,
    },

    /// The backend answered but the answer does not fit the output schema.
    #[error("response does not match the {flow} output schema: {reason}")]
    SchemaMismatch {
        /// Flow whose schema was violated.
        flow: &'static str,
        /// Decoder or post-check message.
        reason: String,
    },
}

impl FlowError {
    /// Offending fields for a validation failure, empty otherwise.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Validation { violations } => violations,
            _ => &[],
        }
    }

    /// Whether the backend was reached before the failure.
    #[must_use]
    pub const fn reached_backend(&self) -> bool {
        matches!(self, Self::Generation { .. } | Self::SchemaMismatch { .. })
    }

    pub(crate) fn no_output() -> Self {
        Self::Generation {
            reason: "backend returned no structured output".into(),
            source: None,
        }
    }
}

impl From<AdapterError> for FlowError {
    fn from(err: AdapterError) -> Self {
        Self::Generation {
            reason: err.to_string(),
            source: Some(err),
        }
    }
}

fn list_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
