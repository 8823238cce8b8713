//! Explicit input validation.
//!
//! Each input record implements [`Validate`] by running its field rules
//! through a [`Checker`], which collects every violation instead of
//! stopping at the first.

use retail_primitives::FieldViolation;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FlowError, FlowResult};

/// Implemented by flow input records.
pub trait Validate {
    /// Checks every declared constraint.
    ///
    /// # Errors
    ///
    /// Returns all violations found, in field declaration order.
    fn validate(&self) -> Result<(), Vec<FieldViolation>>;
}

/// Accumulates field violations.
#[derive(Debug, Default)]
pub struct Checker {
    violations: Vec<FieldViolation>,
}

impl Checker {
    /// Creates an empty checker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires at least `min` non-whitespace-trimmed characters.
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            self.violations
                .push(FieldViolation::new(field, "must not be empty"));
        } else if len < min {
            self.violations.push(FieldViolation::new(
                field,
                format!("must be at least {min} characters (got {len})"),
            ));
        }
        self
    }

    /// Requires a finite number `>= 0`.
    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() {
            self.violations
                .push(FieldViolation::new(field, "must be a finite number"));
        } else if value < 0.0 {
            self.violations
                .push(FieldViolation::new(field, format!("must be >= 0 (got {value})")));
        }
        self
    }

    /// Consumes the collected violations.
    ///
    /// # Errors
    ///
    /// Returns the violations when at least one rule failed.
    pub fn finish(&mut self) -> Result<(), Vec<FieldViolation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.violations))
        }
    }
}

/// Decodes an untyped record and validates it.
///
/// Decoding failures (missing field, wrong primitive type, unknown field)
/// are reported as [`FlowError::Validation`] so untyped callers see the
/// same error kind as typed ones.
///
/// # Errors
///
/// Returns [`FlowError::Validation`] when the value cannot be decoded or
/// fails its constraints.
pub fn decode_input<T>(value: Value) -> FlowResult<T>
where
    T: DeserializeOwned + Validate,
{
    let input: T = serde_path_to_error::deserialize(value).map_err(|err| FlowError::Validation {
        violations: vec![decode_violation(&err)],
    })?;
    input
        .validate()
        .map_err(|violations| FlowError::Validation { violations })?;
    Ok(input)
}

/// Names the field a decode failure belongs to.
///
/// Type errors carry a path to the offending value. Missing and unknown
/// fields fail at the enclosing record, so their name comes from the message.
fn decode_violation(err: &serde_path_to_error::Error<serde_json::Error>) -> FieldViolation {
    let message = err.inner().to_string();
    let field = if err.path().iter().next().is_some() {
        err.path().to_string()
    } else {
        message
            .split('`')
            .nth(1)
            .filter(|_| message.starts_with("missing field") || message.starts_with("unknown field"))
            .unwrap_or("input")
            .to_owned()
    };
    FieldViolation::new(field, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct Sample {
        product_name: String,
        cost: f64,
    }

    impl Validate for Sample {
        fn validate(&self) -> Result<(), Vec<FieldViolation>> {
            Checker::new()
                .min_len("productName", &self.product_name, 1)
                .non_negative("cost", self.cost)
                .finish()
        }
    }

    #[test]
    fn collects_every_violation() {
        let violations = Checker::new()
            .min_len("productName", "   ", 1)
            .min_len("zipCode", "123", 5)
            .non_negative("cost", -1.0)
            .non_negative("originalPrice", f64::NAN)
            .finish()
            .expect_err("four violations");

        let fields: Vec<_> = violations.iter().map(FieldViolation::field).collect();
        assert_eq!(fields, vec!["productName", "zipCode", "cost", "originalPrice"]);
        assert_eq!(violations[0].reason(), "must not be empty");
    }

    #[test]
    fn zero_is_non_negative() {
        assert!(Checker::new().non_negative("cost", 0.0).finish().is_ok());
    }

    #[test]
    fn min_len_counts_characters_not_bytes() {
        assert!(Checker::new().min_len("zipCode", "₹₹₹₹₹", 5).finish().is_ok());
    }

    #[test]
    fn decode_reports_missing_field() {
        let err = decode_input::<Sample>(json!({"cost": 1.0})).expect_err("missing");
        assert_eq!(err.violations()[0].field(), "productName");
    }

    #[test]
    fn decode_reports_wrong_type() {
        let err = decode_input::<Sample>(json!({"productName": "Bat", "cost": "cheap"}))
            .expect_err("mistyped");
        assert!(matches!(err, FlowError::Validation { .. }));
        assert_eq!(err.violations()[0].field(), "cost");
        assert!(err.violations()[0].reason().contains("expected f64"));
    }

    #[test]
    fn decode_reports_unknown_field() {
        let err = decode_input::<Sample>(json!({"productName": "Bat", "cost": 1.0, "sku": "X"}))
            .expect_err("unknown");
        assert_eq!(err.violations()[0].field(), "sku");
    }

    #[test]
    fn decode_runs_constraints() {
        let err = decode_input::<Sample>(json!({"productName": "", "cost": 1.0}))
            .expect_err("empty");
        assert_eq!(err.violations()[0].field(), "productName");

        let ok = decode_input::<Sample>(json!({"productName": "Bat", "cost": 8000}));
        assert!(ok.is_ok());
    }
}
