mod error;
mod fixes;

pub use error::YamlParseError;
pub use fixes::{fix_tabs, fix_trailing_commas, strip_fences};

use async_trait::async_trait;
use serde_json::Value;

/// Stage-4 collaborator: given the stripped text and the first parse
/// error's message, attempts to produce valid YAML text. Out of scope for
/// this crate's own implementation (spec.md's "out of scope" external
/// collaborator) — any real client wires a model call in here.
#[async_trait]
pub trait YamlRepairer: Send + Sync {
    async fn repair(
        &self,
        text: &str,
        error: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// A repairer that always fails, matching the original's placeholder
/// `_llm_repair` before Milestone 3 wired up a real model call.
pub struct UnimplementedRepairer;

#[async_trait]
impl YamlRepairer for UnimplementedRepairer {
    async fn repair(
        &self,
        _text: &str,
        error: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("LLM repair not implemented: {error}").into())
    }
}

fn try_parse(text: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(text)
}

/// `text` is one of the literal forms a model is expected to use for an
/// intentional null document, rather than e.g. a comment-only blob that
/// happens to parse to nothing.
fn is_explicit_null(text: &str) -> bool {
    matches!(text.trim(), "null" | "~" | "")
}

/// Parses `text` and applies the stage-2 null rule: a bare `Value::Null`
/// only counts as a real parse if the source text was literally one of the
/// accepted null spellings. Anything else that parses to null (a
/// comment-only blob, for instance) is treated as a parse failure so later
/// stages get a chance to recover real content.
fn parse_accepted(text: &str) -> Option<Value> {
    match try_parse(text) {
        Ok(Value::Null) if !is_explicit_null(text) => None,
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

/// Runs the four-stage repair pipeline over `raw_output` and returns the
/// parsed value plus whether any repair stage had to kick in.
pub async fn parse(
    raw_output: &str,
    repairer: &dyn YamlRepairer,
) -> Result<(Value, bool), YamlParseError> {
    if raw_output.trim().is_empty() {
        return Err(YamlParseError::Empty);
    }

    let stripped = strip_fences(raw_output);

    if let Some(value) = parse_accepted(&stripped) {
        return Ok((value, false));
    }
    let first_error = try_parse(&stripped)
        .err()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "document parsed to null".to_string());

    if let Some((value, _fixed_text)) = attempt_deterministic_fixes(&stripped) {
        return Ok((value, true));
    }

    match repairer.repair(&stripped, &first_error).await {
        Ok(repaired) => match parse_accepted(&repaired) {
            Some(value) => Ok((value, true)),
            None => {
                let repair_error = try_parse(&repaired)
                    .err()
                    .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
                    .unwrap_or_else(|| "repaired document parsed to null".into());
                Err(YamlParseError::AllStagesFailed {
                    original: first_error,
                    repair_error,
                })
            }
        },
        Err(e) => Err(YamlParseError::AllStagesFailed {
            original: first_error,
            repair_error: e,
        }),
    }
}

/// Applies `fix_tabs` then `fix_trailing_commas`, re-parsing after each and
/// keeping whichever accumulation of fixes got furthest; if neither alone
/// parses, tries the combination once more before giving up.
fn attempt_deterministic_fixes(raw: &str) -> Option<(Value, String)> {
    let mut current = raw.to_string();
    for fix_fn in [fix_tabs as fn(&str) -> String, fix_trailing_commas] {
        let fixed = fix_fn(&current);
        if fixed != current {
            if let Some(value) = parse_accepted(&fixed) {
                return Some((value, fixed));
            }
            current = fixed;
        }
    }

    parse_accepted(&current).map(|value| (value, current))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRepairer;

    #[async_trait]
    impl YamlRepairer for FailingRepairer {
        async fn repair(
            &self,
            _text: &str,
            error: &str,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err(format!("no repair: {error}").into())
        }
    }

    #[tokio::test]
    async fn rejects_empty_input() {
        let err = parse("   \n", &FailingRepairer).await.unwrap_err();
        assert!(matches!(err, YamlParseError::Empty));
    }

    #[tokio::test]
    async fn parses_clean_yaml_without_repair() {
        let (value, repaired) = parse("key: value\n", &FailingRepairer).await.unwrap();
        assert!(!repaired);
        assert_eq!(value["key"], "value");
    }

    #[tokio::test]
    async fn strips_fences_before_parsing() {
        let raw = "```yaml\nkey: value\n```";
        let (value, repaired) = parse(raw, &FailingRepairer).await.unwrap();
        assert!(!repaired);
        assert_eq!(value["key"], "value");
    }

    #[tokio::test]
    async fn deterministic_fix_repairs_trailing_comma() {
        let raw = "items:\n  - a\n  - b,\n";
        let (value, repaired) = parse(raw, &FailingRepairer).await.unwrap();
        assert!(repaired);
        assert_eq!(value["items"][1], "b");
    }

    #[tokio::test]
    async fn falls_through_to_model_repair_when_deterministic_fixes_fail() {
        struct FixedRepairer;
        #[async_trait]
        impl YamlRepairer for FixedRepairer {
            async fn repair(
                &self,
                _text: &str,
                _error: &str,
            ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
                Ok("key: value".to_string())
            }
        }

        let raw = "key: [unterminated";
        let (value, repaired) = parse(raw, &FixedRepairer).await.unwrap();
        assert!(repaired);
        assert_eq!(value["key"], "value");
    }

    #[tokio::test]
    async fn raises_when_every_stage_fails() {
        let raw = "key: [unterminated";
        let err = parse(raw, &FailingRepairer).await.unwrap_err();
        assert!(matches!(err, YamlParseError::AllStagesFailed { .. }));
    }

    #[tokio::test]
    async fn explicit_null_spellings_parse_as_null() {
        for raw in ["null", "~"] {
            let (value, repaired) = parse(raw, &FailingRepairer).await.unwrap();
            assert!(!repaired);
            assert!(value.is_null());
        }
    }

    #[tokio::test]
    async fn comment_only_input_is_treated_as_parse_failure_not_null() {
        let raw = "# just a comment, no content\n";
        let err = parse(raw, &FailingRepairer).await.unwrap_err();
        assert!(matches!(err, YamlParseError::AllStagesFailed { .. }));
    }

    #[tokio::test]
    async fn model_repair_recovers_comment_only_input() {
        struct FixedRepairer;
        #[async_trait]
        impl YamlRepairer for FixedRepairer {
            async fn repair(
                &self,
                _text: &str,
                _error: &str,
            ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
                Ok("key: value".to_string())
            }
        }

        let raw = "# just a comment, no content\n";
        let (value, repaired) = parse(raw, &FixedRepairer).await.unwrap();
        assert!(repaired);
        assert_eq!(value["key"], "value");
    }
}
