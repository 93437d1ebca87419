//! Upload token resolution.

use std::fmt;

use covup_platform::Environment;

use crate::config::non_blank;
use crate::error::{Result, TaskError};

/// Token values supplied by the host, before precedence is applied.
#[derive(Clone, Default)]
pub struct TokenInputs {
    pub explicit:          Option<String>,
    pub pipeline_variable: Option<String>,
}

impl fmt::Debug for TokenInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInputs")
            .field("explicit", &self.explicit.as_ref().map(|_| "<redacted>"))
            .field("pipeline_variable", &self.pipeline_variable.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Input,
    PipelineVariable,
    Environment,
}

/// The token chosen for this run. Its `Debug` output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    value:  String,
    source: TokenSource,
}

impl ResolvedToken {
    pub fn value(&self) -> &str { &self.value }

    pub fn source(&self) -> TokenSource { self.source }
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the token: explicit input, then pipeline variable, then whatever
/// `key` already holds in `env`. Blank values count as absent.
pub fn resolve_token<E: Environment + ?Sized>(inputs: &TokenInputs, env: &E, key: &str) -> Result<ResolvedToken> {
    let existing = env.get(key);
    let candidates = [
        (inputs.explicit.as_deref(), TokenSource::Input),
        (inputs.pipeline_variable.as_deref(), TokenSource::PipelineVariable),
        (existing.as_deref(), TokenSource::Environment),
    ];
    candidates
        .into_iter()
        .find_map(|(value, source)| {
            non_blank(value).map(|v| ResolvedToken {
                value: v.to_string(),
                source,
            })
        })
        .ok_or(TaskError::MissingToken)
}
