use retail_adapters::traits::MediaPart;
use retail_prompts::{PromptTemplate, PromptVars, TemplateResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::validate::Validate;

/// One schema pair plus the template that connects them.
///
/// Implementors are zero-sized markers; all behaviour lives in associated
/// functions so a flow carries no state between invocations.
pub trait Flow: Send + Sync + 'static {
    /// Stable name used for logs and as the output contract name.
    const NAME: &'static str;

    /// Typed input record.
    type Input: Validate + Sync;

    /// Typed output record, decoded strictly from the backend response.
    type Output: DeserializeOwned + Send;

    /// The fixed prompt template for this flow.
    ///
    /// # Errors
    ///
    /// Returns a template error if the built-in template text is malformed.
    fn template() -> TemplateResult<PromptTemplate>;

    /// Binds every input field to its template variable.
    fn vars(input: &Self::Input) -> PromptVars;

    /// Binary attachments sent alongside the prompt.
    fn media(_input: &Self::Input) -> Vec<MediaPart> {
        Vec::new()
    }

    /// JSON schema of [`Self::Output`] sent as the structured-output contract.
    fn output_schema() -> Value;

    /// Post-decode checks serde cannot express.
    ///
    /// # Errors
    ///
    /// An `Err` is surfaced as a schema mismatch.
    fn review(_output: &Self::Output) -> Result<(), String> {
        Ok(())
    }
}
