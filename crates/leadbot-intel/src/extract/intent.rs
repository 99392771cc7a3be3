use serde::{Deserialize, Serialize};

use crate::context::ConversationContext;
use crate::text::{contains_keyword, normalize};

/// Coarse classification of what the visitor is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Pricing,
    Compliance,
    Technical,
    Demo,
    Comparison,
    Contact,
    Greeting,
    General,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pricing => "pricing",
            Self::Compliance => "compliance",
            Self::Technical => "technical",
            Self::Demo => "demo",
            Self::Comparison => "comparison",
            Self::Contact => "contact",
            Self::Greeting => "greeting",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const INTENT_RULES: &[(Intent, &[&str])] = &[
    (
        Intent::Contact,
        &[
            "talk to sales", "speak to someone", "speak with someone", "talk to a human",
            "contact", "reach out", "representative", "book a call", "schedule a call",
            "email me",
        ],
    ),
    (
        Intent::Demo,
        &["demo", "trial", "see it in action", "walkthrough", "pilot"],
    ),
    (
        Intent::Pricing,
        &[
            "price", "prices", "pricing", "cost", "costs", "budget", "quote", "roi",
            "how much", "plans", "subscription", "license", "licensing",
        ],
    ),
    (
        Intent::Comparison,
        &[
            "competitor", "competitors", "vs", "versus", "alternative", "alternatives",
            "compare", "comparison", "better than", "difference between",
        ],
    ),
    (
        Intent::Compliance,
        &[
            "compliance", "compliant", "soc 2", "soc2", "hipaa", "gdpr", "iso 27001",
            "audit", "audits", "regulation", "regulations", "regulatory", "ai act", "fedramp",
        ],
    ),
    (
        Intent::Technical,
        &[
            "api", "apis", "integration", "integrate", "sdk", "deploy", "deployment",
            "architecture", "sso", "okta", "siem", "self-host", "on-prem", "kubernetes",
            "latency", "encryption", "webhook", "webhooks",
        ],
    ),
];

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "good morning", "good afternoon", "good evening",
];

const FOLLOW_UPS: &[&str] = &[
    "yes", "yeah", "yep", "sure", "ok", "okay", "tell me more", "go on", "more", "continue",
    "interesting", "how so", "why", "and", "really", "got it", "makes sense",
];

/// Messages this short with no keyword hit are treated as follow-ups.
const FOLLOW_UP_MAX_WORDS: usize = 4;

/// Classify a message. Short follow-ups ("yes", "tell me more") inherit the
/// intent already recorded on the context.
#[must_use]
pub fn detect_intent(text: &str, context: &ConversationContext) -> Intent {
    let normalized = normalize(text);
    if let Some(intent) = INTENT_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&normalized, k)))
        .map(|(intent, _)| *intent)
    {
        return intent;
    }

    let stripped = normalized.trim_end_matches(['?', '!', '.']);
    let word_count = stripped.split_whitespace().count();
    if word_count <= FOLLOW_UP_MAX_WORDS {
        if let Some(previous) = context.current_intent {
            if previous != Intent::Greeting
                && FOLLOW_UPS.iter().any(|f| contains_keyword(stripped, f))
            {
                return previous;
            }
        }
        if GREETINGS
            .iter()
            .any(|g| stripped.starts_with(g) && contains_keyword(stripped, g))
        {
            return Intent::Greeting;
        }
    }
    Intent::General
}

/// Phrases that suggest the visitor is moving toward a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuyingSignal {
    PricingInquiry,
    Budget,
    Timeline,
    DecisionMaker,
    DemoRequest,
    Procurement,
    ActiveEvaluation,
}

impl BuyingSignal {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PricingInquiry => "pricing_inquiry",
            Self::Budget => "budget",
            Self::Timeline => "timeline",
            Self::DecisionMaker => "decision_maker",
            Self::DemoRequest => "demo_request",
            Self::Procurement => "procurement",
            Self::ActiveEvaluation => "active_evaluation",
        }
    }
}

const SIGNAL_RULES: &[(BuyingSignal, &[&str])] = &[
    (
        BuyingSignal::PricingInquiry,
        &["pricing", "price", "quote", "how much", "cost"],
    ),
    (
        BuyingSignal::Budget,
        &["budget", "budgeted", "allocated", "approved spend", "funding for"],
    ),
    (
        BuyingSignal::Timeline,
        &[
            "this quarter", "next quarter", "this month", "next month", "asap", "by end of",
            "deadline", "timeline", "q1", "q2", "q3", "q4", "urgent", "right away",
        ],
    ),
    (
        BuyingSignal::DecisionMaker,
        &[
            "i decide", "decision maker", "final say", "sign off", "my call",
            "i own the budget", "i'm the ceo", "i'm the cto", "i'm the ciso",
        ],
    ),
    (
        BuyingSignal::DemoRequest,
        &["demo", "trial", "pilot", "proof of concept", "poc"],
    ),
    (
        BuyingSignal::Procurement,
        &[
            "contract", "procurement", "purchase order", "rfp", "security questionnaire",
            "vendor assessment", "msa",
        ],
    ),
    (
        BuyingSignal::ActiveEvaluation,
        &[
            "evaluating", "shortlist", "shortlisted", "comparing", "alternatives",
            "vendor selection",
        ],
    ),
];

/// Every signal the message mentions, in table order.
#[must_use]
pub fn detect_buying_signals(text: &str) -> Vec<BuyingSignal> {
    let normalized = normalize(text);
    SIGNAL_RULES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&normalized, k)))
        .map(|(signal, _)| *signal)
        .collect()
}
