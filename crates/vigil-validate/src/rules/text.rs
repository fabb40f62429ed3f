//! String format constraints backed by regular expressions.

use crate::error::{ConfigError, EvaluationFault};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;
use regex::{Regex, RegexBuilder};
use std::sync::{Arc, OnceLock};

// Pre-compiled formats
static EMAIL_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static URL_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
const URL_PATTERN: &str = r"^(https?|ftp)://[^\s/$.?#].[^\s]*$";

fn builtin_regex(
    cell: &'static OnceLock<Result<Regex, regex::Error>>,
    kind: &str,
    pattern: &str,
) -> Result<Regex, ConfigError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map(Regex::clone)
        .map_err(|e| invalid_pattern(kind, pattern, e))
}

fn invalid_pattern(kind: &str, pattern: &str, err: &regex::Error) -> ConfigError {
    ConfigError::InvalidPattern {
        kind: kind.to_string(),
        pattern: pattern.to_string(),
        reason: err.to_string(),
    }
}

/// Compile `pattern` so that it must match the whole input.
fn compile_whole(kind: &str, pattern: &str, flags: &[&str]) -> Result<Regex, ConfigError> {
    let mut builder = RegexBuilder::new(&format!("^(?:{pattern})$"));
    for flag in flags {
        match *flag {
            "case_insensitive" => builder.case_insensitive(true),
            "multiline" => builder.multi_line(true),
            "dot_matches_new_line" => builder.dot_matches_new_line(true),
            other => {
                return Err(ConfigError::invalid_parameter(
                    kind,
                    "flags",
                    format!("unknown flag '{other}'"),
                ))
            }
        };
    }
    builder
        .build()
        .map_err(|e| invalid_pattern(kind, pattern, &e))
}

fn read_str<'v>(value: &'v Value<'_>, ctx: &ConstraintContext<'_>) -> Result<Option<&'v str>, EvaluationFault> {
    match value {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s.as_ref())),
        other => Err(ctx.unsupported(other)),
    }
}

/// Whole-string regular expression match.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
}

impl ConstraintValidator for PatternRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        Ok(read_str(value, ctx)?.map_or(true, |s| self.regex.is_match(s)))
    }
}

fn pattern_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let pattern = params.get_str("regexp").unwrap_or_default();
    let regex = compile_whole(kind, pattern, &params.get_str_list("flags"))?;
    Ok(Arc::new(PatternRule { regex }))
}

/// Email address format, optionally narrowed by an extra pattern.
///
/// The empty string is accepted; pair with `not_blank` to require a value.
#[derive(Debug, Clone)]
pub struct EmailRule {
    format: Regex,
    extra: Option<Regex>,
}

impl ConstraintValidator for EmailRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        Ok(match read_str(value, ctx)? {
            None => true,
            Some("") => true,
            Some(s) => {
                self.format.is_match(s) && self.extra.as_ref().map_or(true, |re| re.is_match(s))
            }
        })
    }
}

fn email_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let format = builtin_regex(&EMAIL_REGEX, kind, EMAIL_PATTERN)?;
    let extra = params
        .get_str("regexp")
        .map(|pattern| compile_whole(kind, pattern, &params.get_str_list("flags")))
        .transpose()?;
    Ok(Arc::new(EmailRule { format, extra }))
}

/// http, https or ftp URL.
#[derive(Debug, Clone)]
pub struct UrlRule {
    format: Regex,
}

impl ConstraintValidator for UrlRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        Ok(read_str(value, ctx)?.map_or(true, |s| self.format.is_match(s)))
    }
}

fn url_factory(kind: &str, _: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let format = builtin_regex(&URL_REGEX, kind, URL_PATTERN)?;
    Ok(Arc::new(UrlRule { format }))
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![
        ConstraintKind::new("pattern", pattern_factory)
            .schema(
                ParamSchema::empty()
                    .param(ParamSpec::required("regexp", ParamType::String))
                    .param(ParamSpec::with_default("flags", ParamType::StringList, Vec::<String>::new())),
            )
            .message("must match \"{regexp}\""),
        ConstraintKind::new("email", email_factory)
            .schema(
                ParamSchema::empty()
                    .param(ParamSpec::optional("regexp", ParamType::String))
                    .param(ParamSpec::with_default("flags", ParamType::StringList, Vec::<String>::new())),
            )
            .message("must be a well-formed email address"),
        ConstraintKind::new("url", url_factory).message("must be a valid URL"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyPath;
    use crate::validator::SystemClock;

    fn rule(name: &str, declared: Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
        let kind = kinds()
            .into_iter()
            .find(|k| k.name() == name)
            .unwrap();
        kind.instantiate(&declared).map(|(_, v)| v)
    }

    fn check(rule: &Arc<dyn ConstraintValidator>, input: &str) -> bool {
        let params = Params::new();
        let path = PropertyPath::root();
        let ctx = ConstraintContext {
            kind: "text",
            params: &params,
            path: &path,
            clock: &SystemClock,
        };
        rule.is_valid(&Value::Str(input.into()), &ctx).unwrap()
    }

    #[test]
    fn pattern_matches_whole_string() {
        let digits = rule("pattern", Params::new().with("regexp", "[0-9]+")).unwrap();
        assert!(check(&digits, "12345"));
        assert!(!check(&digits, "12a45"));
        assert!(!check(&digits, "a12345"));
    }

    #[test]
    fn pattern_alternation_is_anchored() {
        let either = rule("pattern", Params::new().with("regexp", "ab|cd")).unwrap();
        assert!(check(&either, "ab"));
        assert!(!check(&either, "abcd"));
    }

    #[test]
    fn pattern_flags() {
        let declared = Params::new()
            .with("regexp", "hello")
            .with("flags", vec!["case_insensitive"]);
        let hello = rule("pattern", declared).unwrap();
        assert!(check(&hello, "HeLLo"));

        let bad_flag = Params::new()
            .with("regexp", "x")
            .with("flags", vec!["unicode_soup"]);
        assert!(matches!(
            rule("pattern", bad_flag),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn invalid_regexp_is_config_error() {
        let result = rule("pattern", Params::new().with("regexp", "(unclosed"));
        assert!(matches!(result, Err(ConfigError::InvalidPattern { ref kind, .. }) if kind == "pattern"));
    }

    #[test]
    fn email_format() {
        let email = rule("email", Params::new()).unwrap();
        assert!(check(&email, "john.doe@example.com"));
        assert!(check(&email, ""));
        assert!(!check(&email, "john.doe"));
        assert!(!check(&email, "@example.com"));
        assert!(!check(&email, "john@-example.com"));
    }

    #[test]
    fn email_extra_pattern() {
        let corporate = rule("email", Params::new().with("regexp", ".*@acme\\.com")).unwrap();
        assert!(check(&corporate, "wile@acme.com"));
        assert!(!check(&corporate, "wile@example.com"));
    }

    #[test]
    fn url_format() {
        let url = rule("url", Params::new()).unwrap();
        assert!(check(&url, "https://example.com/path?q=1"));
        assert!(check(&url, "ftp://files.example.com"));
        assert!(!check(&url, "example.com"));
        assert!(!check(&url, "mailto:someone@example.com"));
    }
}
