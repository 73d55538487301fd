//! # Template Module
//!
//! Contract for the template engine used by templated webhook fields, plus a
//! [minijinja](https://docs.rs/minijinja) backed implementation.
//!
//! Webhook templates are rendered against real event data at delivery time.
//! At validation time there is no event, so templates are evaluated against a
//! synthetic [`TemplateContext`] in which every payload lookup yields an
//! empty string. A [`TemplateFailure::Error`] means the template is broken; a
//! [`TemplateFailure::Warning`] only means the synthetic context could not
//! prove it correct.

use minijinja::{
    context,
    value::{Object, Value},
    Environment, ErrorKind, UndefinedBehavior,
};
use std::{collections::HashMap, sync::Arc};

/// Alert group identifier exposed to templates during validation
pub const SYNTHETIC_ALERT_GROUP_ID: &str = "alert_group_1";

/// Values exposed to a template
///
/// Templates see `alert_payload` (a mapping in which unknown keys yield
/// `""`) and `alert_group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub payload: HashMap<String, String>,
    pub alert_group_id: String,
}

impl TemplateContext {
    /// Context used to check templates without a real event
    pub fn synthetic() -> Self {
        Self {
            payload: HashMap::new(),
            alert_group_id: SYNTHETIC_ALERT_GROUP_ID.to_string(),
        }
    }

    /// Add a payload entry
    pub fn with_payload_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Why a template could not be rendered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateFailure {
    /// The template is invalid; `message` is safe to show to the user
    #[error("{message}")]
    Error { message: String },

    /// Rendering failed against this context only
    #[error("Template warning: {message}")]
    Warning { message: String },
}

/// Pure template evaluation: template and context in, rendered text out
pub trait TemplateEvaluator: Send + Sync {
    /// Render `template` against `context`
    ///
    /// # Errors
    /// - `TemplateFailure::Error` - The template is malformed
    /// - `TemplateFailure::Warning` - The template could not render this context
    fn evaluate(&self, template: &str, context: &TemplateContext)
        -> Result<String, TemplateFailure>;
}

impl<T: TemplateEvaluator + ?Sized> TemplateEvaluator for &T {
    fn evaluate(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateFailure> {
        (**self).evaluate(template, context)
    }
}

// ============================================================================
// minijinja implementation
// ============================================================================

/// Payload mapping where missing keys render as the empty string
#[derive(Debug)]
struct DefaultingPayload(HashMap<String, String>);

impl Object for DefaultingPayload {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let value = key
            .as_str()
            .and_then(|k| self.0.get(k))
            .cloned()
            .unwrap_or_default();
        Some(Value::from(value))
    }
}

/// Evaluates Jinja style templates with minijinja
///
/// Compile failures, and render failures caused by an unknown filter, test
/// or function, become [`TemplateFailure::Error`] with a
/// `Template Error: <detail>` message. Other render failures depend on the
/// event payload and become [`TemplateFailure::Warning`].
pub struct JinjaTemplateEvaluator {
    env: Environment<'static>,
}

impl JinjaTemplateEvaluator {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        Self { env }
    }
}

impl Default for JinjaTemplateEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEvaluator for JinjaTemplateEvaluator {
    fn evaluate(
        &self,
        template: &str,
        context: &TemplateContext,
    ) -> Result<String, TemplateFailure> {
        let compiled = self
            .env
            .template_from_str(template)
            .map_err(|e| TemplateFailure::Error {
                message: format!("Template Error: {}", describe(&e)),
            })?;

        let ctx = context! {
            alert_payload => Value::from_object(DefaultingPayload(context.payload.clone())),
            alert_group_id => context.alert_group_id.clone(),
        };

        compiled.render(ctx).map_err(|e| classify_render_failure(&e))
    }
}

/// Failures that no event payload can fix are errors; the rest are warnings
fn classify_render_failure(err: &minijinja::Error) -> TemplateFailure {
    match err.kind() {
        ErrorKind::SyntaxError
        | ErrorKind::UnknownFilter
        | ErrorKind::UnknownTest
        | ErrorKind::UnknownFunction => TemplateFailure::Error {
            message: format!("Template Error: {}", describe(err)),
        },
        _ => TemplateFailure::Warning {
            message: describe(err),
        },
    }
}

fn describe(err: &minijinja::Error) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
