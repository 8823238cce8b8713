//! Prompt templating for structured model invocations.
//!
//! Templates are sequences of [`Section`]s. Plain sections always render;
//! guarded sections render only when their guard variable carries a value,
//! so an absent optional field drops the whole fragment instead of leaving
//! an empty line behind.

#![warn(missing_docs, clippy::pedantic)]

pub mod template;
pub mod vars;

pub use template::{PromptTemplate, Section, TemplateBuilder, TemplateError, TemplateResult};
pub use vars::PromptVars;
