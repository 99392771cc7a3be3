//! Static knowledge text fed to the completion provider as its system prompt.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub company_name: String,
    /// Human contact address quoted in apology and deflection replies.
    pub contact_email: String,
    pub system_prompt: String,
}

impl KnowledgeBase {
    /// Minimal knowledge used when no file is available (tests, CLI analysis).
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            company_name: "Our team".to_string(),
            contact_email: "hello@example.com".to_string(),
            system_prompt: "You are a helpful assistant for a B2B software company. \
                            Answer concisely and invite the visitor to talk to the team."
                .to_string(),
        }
    }
}

/// Load and validate the knowledge base from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_knowledge(path: &Path) -> Result<KnowledgeBase, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KnowledgeFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_knowledge(&content)
}

fn parse_knowledge(content: &str) -> Result<KnowledgeBase, ConfigError> {
    let knowledge: KnowledgeBase =
        serde_yaml::from_str(content).map_err(ConfigError::KnowledgeFileParse)?;

    if knowledge.system_prompt.trim().is_empty() {
        return Err(ConfigError::Validation(
            "system_prompt must be non-empty".to_string(),
        ));
    }
    if !knowledge.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "contact_email '{}' is not an email address",
            knowledge.contact_email
        )));
    }

    Ok(knowledge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_document() {
        let yaml = "company_name: Acme AI\n\
                    contact_email: sales@acme.test\n\
                    system_prompt: |\n  You are the Acme assistant.\n";
        let kb = parse_knowledge(yaml).expect("parse");
        assert_eq!(kb.company_name, "Acme AI");
        assert_eq!(kb.contact_email, "sales@acme.test");
        assert!(kb.system_prompt.starts_with("You are the Acme assistant."));
    }

    #[test]
    fn rejects_blank_prompt() {
        let yaml = "company_name: Acme\ncontact_email: a@b.test\nsystem_prompt: '  '\n";
        assert!(matches!(
            parse_knowledge(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_bad_contact_email() {
        let yaml = "company_name: Acme\ncontact_email: nobody\nsystem_prompt: hi\n";
        assert!(matches!(
            parse_knowledge(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_knowledge(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::KnowledgeFileIo { .. }));
    }
}
