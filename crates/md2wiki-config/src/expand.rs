//! Environment variable expansion for configuration strings.
//!
//! Only the braced forms are expanded:
//! - `${VAR}` - value of VAR, error if unset
//! - `${VAR:-default}` - value of VAR, or `default` when unset

use crate::ConfigError;

/// Expand `${VAR}` references in `value`.
///
/// `field` names the configuration key and ends up in the error message.
/// Only the `${...}` spans are handed to the expander; everything else,
/// including bare `$name` text in API keys, is copied verbatim.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(open) = rest.find("${") {
        let Some(len) = rest[open..].find('}').map(|close| close + 1) else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&expand_reference(&rest[open..open + len], field)?);
        rest = &rest[open + len..];
    }

    out.push_str(rest);
    Ok(out)
}

fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env_with_context(reference, |name| -> Result<Option<String>, UnsetVar> {
        std::env::var(name).map(Some).map_err(|_| UnsetVar(name.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_deref() {
        *value = Some(expand_env(raw, field)?);
    }
    Ok(())
}

/// Name of an environment variable that was referenced but not set.
struct UnsetVar(String);
