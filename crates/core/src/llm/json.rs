use std::fmt;

/// Failure to recover a JSON object from free-form model text.
#[derive(Debug)]
pub enum ExtractError {
    /// No `{` ... `}` span exists in the text.
    NoJsonObject,

    /// The brace-delimited span is not valid JSON.
    Invalid(serde_json::Error),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJsonObject => write!(f, "no JSON object found"),
            Self::Invalid(err) => write!(f, "invalid JSON object: {err}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoJsonObject => None,
            Self::Invalid(err) => Some(err),
        }
    }
}

/// Best-effort extraction of the first top-level JSON object in `text`: the
/// span from the first `{` to the last `}`, inclusive. Tolerates leading and
/// trailing prose or code fences, but assumes neither contains a stray
/// brace. No bracket-matching repair is attempted.
pub fn extract_json(text: &str) -> Result<serde_json::Value, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoJsonObject)?;
    let end = text.rfind('}').ok_or(ExtractError::NoJsonObject)?;
    if end < start {
        return Err(ExtractError::NoJsonObject);
    }

    serde_json::from_str(&text[start..=end]).map_err(ExtractError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let text = "Here is the result:\n{\"stocks\": [], \"市場觀點\": \"flat\"}\nThanks.";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!({"stocks": [], "市場觀點": "flat"}));
    }

    #[test]
    fn extracts_object_inside_code_fence() {
        let text = "```json\n{\"stocks\": []}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!({"stocks": []}));
    }

    #[test]
    fn bare_object_passes_through() {
        let value = extract_json("{\"a\": 1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn text_without_braces_is_no_json_object() {
        let err = extract_json("I cannot comply.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonObject));
        assert_eq!(err.to_string(), "no JSON object found");
    }

    #[test]
    fn inverted_braces_are_no_json_object() {
        let err = extract_json("} nothing here {").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonObject));
    }

    #[test]
    fn malformed_span_carries_the_parser_message() {
        let err = extract_json("reply: {\"a\": } done").unwrap_err();
        match err {
            ExtractError::Invalid(inner) => {
                assert!(!inner.to_string().is_empty());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn nested_objects_survive_outermost_brace_span() {
        let text = "前言 {\"a\": {\"b\": {\"c\": 3}}} 後記";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"]["b"]["c"], 3);
    }
}
