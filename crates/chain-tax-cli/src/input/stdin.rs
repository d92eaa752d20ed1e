//! Piped run documents. `ctax` accepts the same documents on stdin as from
//! `--input`: JSON is tried first, then YAML, so `ctax seed | ctax simulate`
//! and `cat run.yaml | ctax simulate` both work.

use serde_json::Value;
use std::io::{self, Read};

/// Read a run document from stdin when data is piped; `None` on an
/// interactive terminal or empty input.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_document(&buffer)
}

fn parse_document(text: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(_) => serde_yaml::from_str(trimmed)
            .map(Some)
            .map_err(|e| format!("stdin is neither JSON nor YAML: {e}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_and_yaml_documents() {
        let json = parse_document(r#"{"config": {"funder_id": "f1"}}"#).unwrap().unwrap();
        let yaml = parse_document("config:\n  funder_id: f1\n").unwrap().unwrap();
        assert_eq!(json, yaml);
        assert!(parse_document("  \n").unwrap().is_none());
    }
}
