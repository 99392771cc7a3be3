//! System prompt assembly: static knowledge text plus a short visitor block.

use leadbot_core::KnowledgeBase;
use leadbot_intel::ConversationContext;

/// Longest value copied from visitor-supplied data into the prompt.
const MAX_FIELD_CHARS: usize = 200;

/// What the assistant is told about the current visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext<'a> {
    pub page: Option<&'a str>,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub company: Option<&'a str>,
}

impl<'a> PromptContext<'a> {
    #[must_use]
    pub fn from_conversation(context: &'a ConversationContext, page: Option<&'a str>) -> Self {
        Self {
            page,
            name: context.name.as_deref(),
            email: context.email.as_deref(),
            company: context.company_name.as_deref(),
        }
    }
}

#[must_use]
pub fn build_system_prompt(knowledge: &KnowledgeBase, context: &PromptContext<'_>) -> String {
    let mut prompt = knowledge.system_prompt.trim_end().to_string();

    let lines: Vec<String> = [
        ("Current page", context.page),
        ("Visitor name", context.name),
        ("Visitor email", context.email),
        ("Visitor company", context.company),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        let value = one_line(value?);
        (!value.is_empty()).then(|| format!("- {label}: {value}"))
    })
    .collect();

    if !lines.is_empty() {
        prompt.push_str("\n\n## Visitor context\n");
        prompt.push_str(&lines.join("\n"));
    }
    prompt
}

/// Collapse whitespace (including newlines) and cap the length, so a field
/// cannot open a new prompt section.
fn one_line(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_FIELD_CHARS)
        .collect()
}
