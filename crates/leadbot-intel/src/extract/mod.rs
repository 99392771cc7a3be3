//! Rule-based extraction of visitor details and intent from free text.

mod intent;
mod patterns;

use serde::{Deserialize, Serialize};

use crate::text::{contains_keyword, is_stopword, normalize, title_case};

pub use intent::{detect_buying_signals, detect_intent, BuyingSignal, Intent};

/// Everything a single message revealed. Empty fields mean "not mentioned".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_frameworks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_cases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_existing_ai: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_agent_count: Option<u32>,
}

impl ExtractedEntities {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Pull every recognisable entity out of one message.
#[must_use]
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let normalized = normalize(text);
    let ai_agent_count = extract_agent_count(text);
    let has_existing_ai = extract_existing_ai(text).or(match ai_agent_count {
        Some(n) if n > 0 => Some(true),
        _ => None,
    });

    ExtractedEntities {
        email: extract_email(text),
        phone: extract_phone(text),
        name: extract_name(text),
        company: extract_company(text),
        job_title: extract_job_title(text),
        industry: first_label(&normalized, patterns::INDUSTRIES).map(str::to_string),
        company_size: extract_company_size(text, &normalized),
        pain_points: all_labels(&normalized, patterns::PAIN_POINTS),
        compliance_frameworks: patterns::COMPLIANCE_FRAMEWORKS
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(label, _)| (*label).to_string())
            .collect(),
        use_cases: all_labels(&normalized, patterns::USE_CASES),
        has_existing_ai,
        ai_agent_count,
    }
}

fn extract_email(text: &str) -> Option<String> {
    patterns::EMAIL
        .find(text)
        .map(|m| m.as_str().to_lowercase())
}

fn extract_phone(text: &str) -> Option<String> {
    patterns::PHONE.find(text).map(|m| m.as_str().trim().to_string())
}

fn extract_name(text: &str) -> Option<String> {
    patterns::NAME_RULES
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| clean_name(caps.get(1)?.as_str()))
}

/// Keep leading name-like words; reject the candidate if the first word is
/// not one.
fn clean_name(candidate: &str) -> Option<String> {
    let words: Vec<&str> = candidate
        .split_whitespace()
        .take_while(|w| is_name_word(w))
        .collect();
    if words.is_empty() {
        return None;
    }
    Some(title_case(&words.join(" ")))
}

fn is_name_word(word: &str) -> bool {
    let lowered = word.to_lowercase();
    if is_stopword(word) || patterns::NAME_REJECT.contains(&lowered.as_str()) {
        return false;
    }
    // Gerunds ("evaluating", "exploring") are far more common than names here.
    !(lowered.len() >= 6 && lowered.ends_with("ing"))
}

fn extract_company(text: &str) -> Option<String> {
    // "at john@acme.io" must not read as a company.
    let text = patterns::EMAIL.replace_all(text, " ");
    patterns::COMPANY_RULES
        .iter()
        .filter_map(|re| re.captures(&text))
        .find_map(|caps| clean_company(caps.get(1)?.as_str()))
}

fn clean_company(candidate: &str) -> Option<String> {
    let mut words: Vec<&str> = Vec::new();
    for word in candidate.split_whitespace() {
        if is_stopword(word) {
            break;
        }
        words.push(word);
        if word.ends_with('.') && !is_company_suffix(word) {
            break;
        }
    }
    let first = words.first()?;
    let first_lower = first.trim_end_matches('.').to_lowercase();
    if patterns::COMPANY_REJECT.contains(&first_lower.as_str()) {
        return None;
    }

    let joined = words.join(" ");
    let cleaned = if words.last().is_some_and(|w| is_company_suffix(w)) {
        joined
    } else {
        joined.trim_end_matches(['.', '\'', '-']).to_string()
    };
    (!cleaned.is_empty()).then_some(cleaned)
}

fn is_company_suffix(word: &str) -> bool {
    patterns::COMPANY_SUFFIXES.contains(&word.to_lowercase().as_str())
}

fn extract_job_title(text: &str) -> Option<String> {
    patterns::JOB_TITLE_RULES
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| caps.get(1).map(|m| format_job_title(m.as_str())))
}

fn format_job_title(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let trimmed = word.trim_end_matches(',');
            let lowered = trimmed.to_lowercase();
            if patterns::TITLE_ACRONYMS.contains(&lowered.as_str()) {
                lowered.to_uppercase()
            } else if lowered == "of" {
                lowered
            } else {
                title_case(trimmed)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_company_size(text: &str, normalized: &str) -> Option<String> {
    let headcount = patterns::COMPANY_SIZE_RULES
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| caps.get(1)?.as_str().replace(',', "").parse::<u64>().ok());

    if let Some(n) = headcount {
        return Some(size_bucket(n).to_string());
    }
    patterns::ENTERPRISE_MARKERS
        .iter()
        .any(|m| contains_keyword(normalized, m))
        .then(|| "1000+".to_string())
}

fn size_bucket(headcount: u64) -> &'static str {
    match headcount {
        0..=10 => "1-10",
        11..=50 => "11-50",
        51..=200 => "51-200",
        201..=1000 => "201-1000",
        _ => "1000+",
    }
}

fn extract_existing_ai(text: &str) -> Option<bool> {
    if patterns::NO_AI_RULES.iter().any(|re| re.is_match(text)) {
        return Some(false);
    }
    patterns::HAS_AI_RULES
        .iter()
        .any(|re| re.is_match(text))
        .then_some(true)
}

fn extract_agent_count(text: &str) -> Option<u32> {
    patterns::AGENT_COUNT
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse().ok())
}

fn first_label(normalized: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(normalized, k)))
        .map(|(label, _)| *label)
}

fn all_labels(normalized: &str, table: &[(&str, &[&str])]) -> Vec<String> {
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_keyword(normalized, k)))
        .map(|(label, _)| (*label).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introduction_with_pricing_question() {
        let e = extract_entities("Hi, I'm John Smith from Acme Corp, what's your pricing?");
        assert_eq!(e.name.as_deref(), Some("John Smith"));
        assert_eq!(e.company.as_deref(), Some("Acme Corp"));
        assert_eq!(e.email, None);
    }

    #[test]
    fn names_are_title_cased() {
        let e = extract_entities("my name is jANE doe");
        assert_eq!(e.name.as_deref(), Some("Jane Doe"));
        let e = extract_entities("call me BOB");
        assert_eq!(e.name.as_deref(), Some("Bob"));
    }

    #[test]
    fn name_stops_at_stopword() {
        let e = extract_entities("I'm Priya from Globex");
        assert_eq!(e.name.as_deref(), Some("Priya"));
        assert_eq!(e.company.as_deref(), Some("Globex"));
    }

    #[test]
    fn stoplisted_candidates_are_rejected() {
        assert_eq!(extract_entities("I'm interested in a demo").name, None);
        assert_eq!(extract_entities("I'm the CTO at Initech").name, None);
        assert_eq!(extract_entities("I'm evaluating vendors").name, None);
        assert_eq!(extract_entities("this is a great product").name, None);
    }

    #[test]
    fn name_here_phrasing() {
        let e = extract_entities("Hey there. Maria here, quick question");
        assert_eq!(e.name.as_deref(), Some("Maria"));
    }

    #[test]
    fn earlier_rule_wins_over_later_one() {
        // "my name is" outranks "I'm".
        let e = extract_entities("I'm confused, my name is Sam Lee");
        assert_eq!(e.name.as_deref(), Some("Sam Lee"));
    }

    #[test]
    fn company_rules() {
        assert_eq!(
            extract_entities("our company is called Hooli").company.as_deref(),
            Some("Hooli")
        );
        assert_eq!(
            extract_entities("I work at Stark Industries and we need help").company.as_deref(),
            Some("Stark Industries")
        );
        assert_eq!(
            extract_entities("We are Wayne Enterprises Inc. and want a quote")
                .company
                .as_deref(),
            Some("Wayne Enterprises Inc.")
        );
        assert_eq!(extract_entities("can we talk at Monday").company, None);
        assert_eq!(extract_entities("pricing at scale").company, None);
    }

    #[test]
    fn email_and_phone() {
        let e = extract_entities("Reach me at John.Smith@Acme.io or +1 (555) 123-4567");
        assert_eq!(e.email.as_deref(), Some("john.smith@acme.io"));
        assert_eq!(e.phone.as_deref(), Some("+1 (555) 123-4567"));
    }

    #[test]
    fn job_title_only_when_self_described() {
        assert_eq!(
            extract_entities("I'm the CTO at Initech").job_title.as_deref(),
            Some("CTO")
        );
        assert_eq!(
            extract_entities("I am a senior security engineer").job_title.as_deref(),
            Some("Senior Security Engineer")
        );
        assert_eq!(
            extract_entities("my role is head of compliance").job_title.as_deref(),
            Some("Head of Compliance")
        );
        assert_eq!(extract_entities("our CTO wants a demo").job_title, None);
    }

    #[test]
    fn profiling_fields() {
        let e = extract_entities(
            "We're a hospital network with 4,500 employees. Audits are painful and \
             we need HIPAA and SOC 2 coverage for our customer support bots.",
        );
        assert_eq!(e.industry.as_deref(), Some("healthcare"));
        assert_eq!(e.company_size.as_deref(), Some("1000+"));
        assert_eq!(e.pain_points, vec!["audit burden"]);
        assert_eq!(e.compliance_frameworks, vec!["SOC 2", "HIPAA"]);
        assert_eq!(e.use_cases, vec!["customer support"]);
    }

    #[test]
    fn company_size_buckets() {
        assert_eq!(
            extract_entities("we have 35 people").company_size.as_deref(),
            Some("11-50")
        );
        assert_eq!(
            extract_entities("a team of 8").company_size.as_deref(),
            Some("1-10")
        );
        assert_eq!(
            extract_entities("large enterprise").company_size.as_deref(),
            Some("1000+")
        );
    }

    #[test]
    fn existing_ai_tri_state() {
        assert_eq!(
            extract_entities("we already use ChatGPT internally").has_existing_ai,
            Some(true)
        );
        assert_eq!(
            extract_entities("we don't use any AI today").has_existing_ai,
            Some(false)
        );
        assert_eq!(extract_entities("what is this?").has_existing_ai, None);
    }

    #[test]
    fn agent_count_implies_existing_ai() {
        let e = extract_entities("There are about 40 agents in production");
        assert_eq!(e.ai_agent_count, Some(40));
        assert_eq!(e.has_existing_ai, Some(true));
    }

    #[test]
    fn plain_message_extracts_nothing() {
        assert!(extract_entities("what does it do?").is_empty());
    }
}
