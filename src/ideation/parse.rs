//! Shape validation for generated candidate lists.
//!
//! A response is accepted only if it is a JSON array whose every element is
//! an object carrying non-empty string `goal`, `vision` and `mutation`. One
//! bad element rejects the whole batch.

use serde_json::Value;

use super::{Candidate, GenerationError};

const FIELDS: [&str; 3] = ["goal", "vision", "mutation"];

pub fn parse_candidates(text: &str) -> Result<Vec<Candidate>, GenerationError> {
    let body = strip_fences(text);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(format!("invalid json: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| GenerationError::Malformed("expected a JSON array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| candidate_from(idx, item))
        .collect()
}

fn candidate_from(idx: usize, item: &Value) -> Result<Candidate, GenerationError> {
    let obj = item
        .as_object()
        .ok_or_else(|| GenerationError::Malformed(format!("item {} is not an object", idx)))?;

    let mut out: [String; 3] = Default::default();
    for (slot, field) in out.iter_mut().zip(FIELDS) {
        let text = obj
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GenerationError::Malformed(format!("item {} missing string `{}`", idx, field)))?;
        *slot = text.to_string();
    }
    let [goal, vision, mutation] = out;
    Ok(Candidate { goal, vision, mutation })
}

// Models sometimes wrap JSON in a markdown code fence despite the mime type.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_array() {
        let text = r#"[
            {"goal": "A", "vision": "va", "mutation": "ma"},
            {"goal": "B", "vision": "vb", "mutation": "mb", "extra": 1}
        ]"#;
        let out = parse_candidates(text).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].goal, "B");
        assert_eq!(out[1].mutation, "mb");
    }

    #[test]
    fn test_parse_empty_array_is_ok() {
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let text = "```json\n[{\"goal\":\"A\",\"vision\":\"v\",\"mutation\":\"m\"}]\n```";
        assert_eq!(parse_candidates(text).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse_candidates(r#"{"goal":"A"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_rejects_missing_field() {
        let err = parse_candidates(r#"[{"goal":"A","vision":"v"}]"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(ref m) if m.contains("mutation")));
    }

    #[test]
    fn test_rejects_non_string_field() {
        let err = parse_candidates(r#"[{"goal":1,"vision":"v","mutation":"m"}]"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_rejects_blank_field() {
        let err = parse_candidates(r#"[{"goal":"  ","vision":"v","mutation":"m"}]"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn test_rejects_invalid_json() {
        assert!(matches!(parse_candidates("not json"), Err(GenerationError::Malformed(_))));
        assert!(matches!(parse_candidates("   "), Err(GenerationError::EmptyResponse)));
    }
}
