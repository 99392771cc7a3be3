//! Heuristic prompt-injection filter for inbound chat messages.
//!
//! A cheap substring check handles the common case. Only messages that trip
//! one of the high-confidence markers pay for the weighted regex scan.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Upper bound on the length of sanitized text, in characters.
pub const MAX_SANITIZED_CHARS: usize = 2_000;

/// Lowercase markers that send a message to the full scan. Every weighted
/// pattern contains at least one of these once whitespace is collapsed.
const FAST_PATH_MARKERS: &[&str] = &[
    "ignore",
    "skip",
    "bypass",
    "disregard",
    "forget",
    "prompt",
    "instructions",
    "you are now",
    "jailbreak",
    "dan mode",
    "developer mode",
    "act as",
    "pretend",
    "api key",
    "secret key",
    "password",
    "credentials",
    "base64",
    "rot13",
    "hex",
    "<|",
    "inst]",
    "###",
];

/// Weighted patterns for the full scan. The score is the sum of the weights
/// of every pattern that matches at least once.
const WEIGHTED_PATTERNS: &[(&str, u32)] = &[
    (
        r"(?i)\b(?:ignore|skip|bypass)\s+(?:all\s+|any\s+|the\s+|your\s+)?(?:previous|prior|above|earlier|preceding)\s+(?:instructions|prompts|rules|directions)",
        10,
    ),
    (
        r"(?i)\bdisregard\s+(?:all\s+|any\s+|the\s+|your\s+)?(?:previous\s+|prior\s+)?(?:instructions|rules|guidelines|programming)",
        10,
    ),
    (
        r"(?i)\bforget\s+(?:everything|all\s+(?:previous|prior)|your\s+(?:instructions|rules|training))",
        8,
    ),
    (
        r"(?i)\b(?:reveal|show|print|repeat|output|leak)\s+(?:me\s+)?(?:your|the)\s+(?:system\s+|initial\s+|hidden\s+)?(?:prompt|instructions)",
        8,
    ),
    (r"(?i)\b(?:jailbreak|dan\s+mode|developer\s+mode)\b", 8),
    (
        r"(?i)<\|(?:im_start|im_end|system|user|assistant)\|>|\[/?inst\]|###\s*(?:system|instruction)",
        7,
    ),
    (r"(?i)\bnew\s+instructions\s*:", 6),
    (r"(?i)\byou\s+are\s+now\b", 5),
    (r"(?i)\bsystem\s+prompt\b", 4),
    (r"(?i)\b(?:act\s+as|pretend\s+(?:to\s+be|you\s+are))\b", 3),
    (
        r"(?i)\b(?:api\s+keys?|secret\s+keys?|passwords?|credentials)\b",
        3,
    ),
    (r"(?i)\b(?:base64|rot13|hex[-\s]?encoded)\b", 2),
];

/// Chat-template control tokens, stripped from sanitized text regardless of score.
static ROLE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\|[a-z_]+\|>|\[/?inst\]|###\s*(?:system|instruction|assistant|user)\s*:?")
        .expect("valid role marker regex")
});

static COMPILED_PATTERNS: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    WEIGHTED_PATTERNS
        .iter()
        .map(|&(pattern, weight)| (Regex::new(pattern).expect("valid safety regex"), weight))
        .collect()
});

const CRITICAL_THRESHOLD: u32 = 10;
const HIGH_THRESHOLD: u32 = 6;
const MEDIUM_THRESHOLD: u32 = 3;
const LOW_THRESHOLD: u32 = 1;

/// Patterns lighter than this are left in place by [`sanitize`]: credential
/// and encoding mentions are legitimate in sales questions.
const REDACT_MIN_WEIGHT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    fn from_score(score: u32) -> Self {
        match score {
            s if s >= CRITICAL_THRESHOLD => Self::Critical,
            s if s >= HIGH_THRESHOLD => Self::High,
            s if s >= MEDIUM_THRESHOLD => Self::Medium,
            s if s >= LOW_THRESHOLD => Self::Low,
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyVerdict {
    pub safe: bool,
    pub threat_level: ThreatLevel,
    pub score: u32,
    pub sanitized_text: String,
}

impl SafetyVerdict {
    /// The caller must refuse the message outright.
    #[must_use]
    pub fn must_block(&self) -> bool {
        self.threat_level == ThreatLevel::Critical
    }

    /// Text that may be used for prompt construction. High-threat messages
    /// only ever expose their sanitized form.
    #[must_use]
    pub fn prompt_text<'a>(&'a self, raw: &'a str) -> &'a str {
        if self.threat_level >= ThreatLevel::High {
            &self.sanitized_text
        } else {
            raw
        }
    }
}

/// Classify a raw inbound message.
#[must_use]
pub fn classify(raw: &str) -> SafetyVerdict {
    let lowered = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if !FAST_PATH_MARKERS.iter().any(|m| lowered.contains(m)) {
        return SafetyVerdict {
            safe: true,
            threat_level: ThreatLevel::None,
            score: 0,
            sanitized_text: truncate_chars(raw.trim(), MAX_SANITIZED_CHARS),
        };
    }

    let score: u32 = COMPILED_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(raw))
        .map(|&(_, weight)| weight)
        .sum();
    let threat_level = ThreatLevel::from_score(score);

    SafetyVerdict {
        safe: threat_level <= ThreatLevel::Medium,
        threat_level,
        score,
        sanitized_text: sanitize(raw),
    }
}

/// Remove every matched injection span, role markers, and control characters.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut text = ROLE_MARKERS.replace_all(raw, " ").into_owned();
    for (re, weight) in COMPILED_PATTERNS.iter() {
        if *weight >= REDACT_MIN_WEIGHT {
            text = re.replace_all(&text, "[removed]").into_owned();
        }
    }
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, MAX_SANITIZED_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
