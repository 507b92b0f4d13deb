//! Loads business rules from a JSON file on disk.

use std::path::Path;

use crate::domain::rules::{Rule, RuleLoadError, parse_rules};

/// Read and validate the rules in `path`.
///
/// The whole file is rejected if any rule is invalid.
pub fn load_rules_from_file(path: impl AsRef<Path>) -> Result<Vec<Rule>, RuleLoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| RuleLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let rules = parse_rules(&content)?;
    tracing::info!(path = %path.display(), count = rules.len(), "business rules loaded");
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_rules(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_valid_rules() {
        let file = write_rules(
            r#"[
              {
                "name": "intercept-big",
                "conditions": {"all": [
                  {"fact": "payload", "path": "$.amount.amount", "operator": "greaterThan", "value": 1000}
                ]},
                "event": {"type": "INTERCEPT_QUOTE"}
              }
            ]"#,
        );

        let rules = load_rules_from_file(file.path()).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].name.as_deref(), Some("intercept-big"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_rules_from_file("/nonexistent/rules.json").unwrap_err();
        assert!(matches!(err, RuleLoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/rules.json"));
    }

    #[test]
    fn one_bad_rule_rejects_the_file() {
        let file = write_rules(
            r#"[
              {"conditions": {"all": []}, "event": {"type": "INTERCEPT_QUOTE"}},
              {"conditions": {"all": [{"fact": "payload", "operator": "approximately", "value": 1}]},
               "event": {"type": "INTERCEPT_QUOTE"}}
            ]"#,
        );

        let err = load_rules_from_file(file.path()).unwrap_err();
        assert!(matches!(err, RuleLoadError::InvalidRule { index: 1, .. }));
    }

    #[test]
    fn object_instead_of_array_is_rejected() {
        let file = write_rules(r#"{"rules": []}"#);
        assert!(matches!(
            load_rules_from_file(file.path()),
            Err(RuleLoadError::NotAnArray)
        ));
    }
}
