//! Section-based prompt templates with `{{variable}}` substitution.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::vars::PromptVars;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur during template construction or rendering.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder referenced a variable that was not bound.
    #[error("missing required variable: {name}")]
    MissingVariable {
        /// Name of the missing variable.
        name: String,
    },

    /// The template text contained an unterminated or empty placeholder.
    #[error("malformed template: {reason}")]
    Malformed {
        /// Reason for the failure.
        reason: String,
    },
}

/// One fragment of a prompt template.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Section {
    /// Always rendered.
    Text(String),
    /// Rendered only when `guard` is bound to a value.
    When {
        /// Variable whose presence enables the section.
        guard: String,
        /// Section text.
        body: String,
    },
}

impl Section {
    fn body(&self) -> &str {
        match self {
            Self::Text(body) | Self::When { body, .. } => body,
        }
    }

    fn is_enabled(&self, vars: &PromptVars) -> bool {
        match self {
            Self::Text(_) => true,
            Self::When { guard, .. } => vars.is_set(guard),
        }
    }
}

/// A prompt assembled from ordered sections.
///
/// Rendered sections are separated by a single blank line. Omitted sections
/// contribute nothing, not even a separator.
///
/// # Examples
///
/// ```
/// use retail_prompts::{PromptTemplate, PromptVars};
///
/// let template = PromptTemplate::builder()
///     .text("Product: {{name}}")
///     .when("photo", "Photo: attached {{photo}}")
///     .text("Respond in JSON.")
///     .build()
///     .unwrap();
///
/// let rendered = template
///     .render(&PromptVars::new().with("name", "Kettle"))
///     .unwrap();
/// assert_eq!(rendered, "Product: Kettle\n\nRespond in JSON.");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptTemplate {
    sections: Vec<Section>,
}

impl PromptTemplate {
    /// Returns a builder for constructing templates.
    #[must_use]
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Returns the template sections in order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Lists every variable referenced by a placeholder or guard, in first-use order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_owned());
            }
        };

        for section in &self.sections {
            if let Section::When { guard, .. } = section {
                push(guard);
            }
            // Sections are validated at build time.
            if let Ok(tokens) = tokenize(section.body()) {
                for token in tokens {
                    if let Token::Var(name) = token {
                        push(name);
                    }
                }
            }
        }

        names
    }

    /// Renders the template against the supplied bindings.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingVariable`] if an enabled section
    /// references a variable that is absent or unset.
    pub fn render(&self, vars: &PromptVars) -> TemplateResult<String> {
        let mut rendered = Vec::with_capacity(self.sections.len());

        for section in &self.sections {
            if !section.is_enabled(vars) {
                trace!(section = ?section, "skipping guarded prompt section");
                continue;
            }
            rendered.push(substitute(section.body(), vars)?);
        }

        Ok(rendered.join("\n\n"))
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, section) in self.sections.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n\n")?;
            }
            match section {
                Section::Text(body) => f.write_str(body)?,
                Section::When { guard, body } => write!(f, "[if {guard}] {body}")?,
            }
        }
        Ok(())
    }
}

/// Builder for [`PromptTemplate`].
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    sections: Vec<Section>,
}

impl TemplateBuilder {
    /// Appends an unconditional section.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.sections.push(Section::Text(body.into()));
        self
    }

    /// Appends a section rendered only when `guard` is bound.
    #[must_use]
    pub fn when(mut self, guard: impl Into<String>, body: impl Into<String>) -> Self {
        self.sections.push(Section::When {
            guard: guard.into(),
            body: body.into(),
        });
        self
    }

    /// Builds the template, checking every placeholder is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Malformed`] for unterminated or empty
    /// placeholders, or a guarded section with an empty guard name.
    pub fn build(self) -> TemplateResult<PromptTemplate> {
        for section in &self.sections {
            if let Section::When { guard, .. } = section {
                if guard.trim().is_empty() {
                    return Err(TemplateError::Malformed {
                        reason: "guarded section requires a variable name".into(),
                    });
                }
            }
            tokenize(section.body())?;
        }

        Ok(PromptTemplate {
            sections: self.sections,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Var(&'a str),
}

fn tokenize(body: &str) -> TemplateResult<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = body;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            tokens.push(Token::Literal(&rest[..open]));
        }
        let after_open = &rest[open + 2..];
        let close = after_open.find("}}").ok_or_else(|| TemplateError::Malformed {
            reason: format!("unterminated placeholder near `{}`", preview(&rest[open..])),
        })?;

        let name = after_open[..close].trim();
        if name.is_empty() || name.contains('{') {
            return Err(TemplateError::Malformed {
                reason: format!("invalid placeholder near `{}`", preview(&rest[open..])),
            });
        }
        tokens.push(Token::Var(name));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Literal(rest));
    }

    Ok(tokens)
}

fn substitute(body: &str, vars: &PromptVars) -> TemplateResult<String> {
    let mut out = String::with_capacity(body.len());
    for token in tokenize(body)? {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Var(name) => {
                let value = vars.get(name).ok_or_else(|| TemplateError::MissingVariable {
                    name: name.to_owned(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

fn preview(text: &str) -> String {
    text.chars().take(24).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routing_template() -> PromptTemplate {
        PromptTemplate::builder()
            .text("Product: {{product}}\nReason: {{reason}}")
            .when("photo", "Product Photo: see attached {{photoType}} image.")
            .text("Respond with JSON.")
            .build()
            .unwrap()
    }

    #[test]
    fn renders_plain_sections() {
        let template = PromptTemplate::builder()
            .text("Hello {{name}}!")
            .build()
            .unwrap();

        let rendered = template
            .render(&PromptVars::new().with("name", "World"))
            .unwrap();
        assert_eq!(rendered, "Hello World!");
    }

    #[test]
    fn guarded_section_included_when_set() {
        let vars = PromptVars::new()
            .with("product", "Smart TV")
            .with("reason", "Upgraded")
            .with("photo", "data:image/png;base64,AAAA")
            .with("photoType", "image/png");

        let rendered = routing_template().render(&vars).unwrap();
        assert!(rendered.contains("Product Photo: see attached image/png image."));
        assert!(rendered.ends_with("Respond with JSON."));
    }

    #[test]
    fn guarded_section_omitted_without_residue() {
        let vars = PromptVars::new()
            .with("product", "Smart TV")
            .with("reason", "Upgraded")
            .with_optional("photo", None::<String>);

        let rendered = routing_template().render(&vars).unwrap();
        assert!(!rendered.contains("Photo"));
        assert!(!rendered.contains("\n\n\n"));
        assert_eq!(
            rendered,
            "Product: Smart TV\nReason: Upgraded\n\nRespond with JSON."
        );
    }

    #[test]
    fn missing_variable_in_enabled_section_errors() {
        let err = routing_template()
            .render(&PromptVars::new().with("product", "Smart TV"))
            .expect_err("reason missing");
        assert_eq!(
            err,
            TemplateError::MissingVariable {
                name: "reason".into()
            }
        );
    }

    #[test]
    fn unterminated_placeholder_fails_build() {
        let err = PromptTemplate::builder()
            .text("Price: {{price")
            .build()
            .expect_err("malformed");
        assert!(matches!(err, TemplateError::Malformed { .. }));
    }

    #[test]
    fn empty_placeholder_fails_build() {
        let err = PromptTemplate::builder()
            .text("Price: {{ }}")
            .build()
            .expect_err("malformed");
        assert!(matches!(err, TemplateError::Malformed { .. }));
    }

    #[test]
    fn single_braces_are_literal() {
        let template = PromptTemplate::builder()
            .text("Return {\"price\": {{price}}}")
            .build()
            .unwrap();
        let rendered = template
            .render(&PromptVars::new().with("price", 10))
            .unwrap();
        assert_eq!(rendered, "Return {\"price\": 10}");
    }

    #[test]
    fn placeholders_lists_guards_and_vars_once() {
        let names = routing_template().placeholders();
        assert_eq!(names, vec!["product", "reason", "photo", "photoType"]);
    }

    #[test]
    fn values_are_not_rescanned() {
        let template = PromptTemplate::builder()
            .text("Note: {{note}}")
            .build()
            .unwrap();
        let rendered = template
            .render(&PromptVars::new().with("note", "{{secret}}"))
            .unwrap();
        assert_eq!(rendered, "Note: {{secret}}");
    }
}
