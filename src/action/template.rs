//! Placeholder substitution for command templates.
//!
//! A template such as `grep -i %s notes.txt` is resolved against the input
//! text before it is handed to the shell. `%%s` escapes the marker.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::ActionError;

/// Placeholder marker standing for the input text.
pub const PLACEHOLDER: &str = "%s";

/// A marker preceded by any character other than `%`.
///
/// The preceding character is part of the match, so a marker at the very
/// start of the template never counts as a substitution site.
static SUBSTITUTION_SITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^%])%s").expect("valid placeholder pattern"));

/// Escaped markers first, then substitution sites, scanning left to right.
static SUBSTITUTION_OR_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%s|([^%])%s").expect("valid placeholder pattern"));

/// Returns `true` if the template contains at least one substitution site.
pub fn has_placeholder(template: &str) -> bool {
    SUBSTITUTION_SITE.is_match(template)
}

/// Resolve placeholders in `template` against `input`.
///
/// Templates without a substitution site are returned unchanged, whatever
/// the input. When a site exists the input must be non-empty; every site is
/// replaced by its preceding character followed by the input, and escaped
/// `%%s` sequences become a literal `%s`.
///
/// # Errors
/// Returns [`ActionError::MissingInput`] if the template needs input and
/// `input` is empty.
pub fn resolve(template: &str, input: &str) -> Result<String, ActionError> {
    if !has_placeholder(template) {
        return Ok(template.to_string());
    }

    if input.is_empty() {
        return Err(ActionError::MissingInput);
    }

    let resolved = SUBSTITUTION_OR_ESCAPE.replace_all(template, |caps: &Captures<'_>| {
        caps.get(1).map_or_else(
            || PLACEHOLDER.to_string(),
            |prefix| format!("{}{input}", prefix.as_str()),
        )
    });

    Ok(resolved.into_owned())
}
