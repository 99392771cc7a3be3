//! Card ("content morph") and profiling-question selection for one turn.
//!
//! A turn shows at most one of the two. [`decide`] encodes that rule; the
//! individual functions are exposed for diagnostics and the CLI.

use serde::{Deserialize, Serialize};

use crate::context::{AiAdoption, ConversationContext};
use crate::text::{contains_keyword, normalize};

/// Cards below this confidence are never surfaced.
pub const CARD_CONFIDENCE_THRESHOLD: f32 = 0.70;

/// Profiling stops for the session after this many questions.
pub const MAX_PROFILING_QUESTIONS: usize = 4;

/// Profiling starts on this turn (1-based).
const FIRST_PROFILING_TURN: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    Demo,
    Comparison,
    Roi,
    Compliance,
    CaseStudy,
    Integration,
    Overview,
}

impl CardType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Comparison => "comparison",
            Self::Roi => "roi",
            Self::Compliance => "compliance",
            Self::CaseStudy => "case_study",
            Self::Integration => "integration",
            Self::Overview => "overview",
        }
    }

    /// Sentence appended to the reply when this card is shown.
    #[must_use]
    pub fn follow_up(self) -> &'static str {
        match self {
            Self::Demo => "I've opened a quick way to book a live walkthrough with our team.",
            Self::Comparison => "Here's a side-by-side comparison so you can see how we stack up.",
            Self::Roi => "I've opened our ROI calculator so you can estimate the impact for your team.",
            Self::Compliance => "Here's a summary of the frameworks we map our controls to.",
            Self::CaseStudy => "Here's how a team like yours rolled this out.",
            Self::Integration => "Here's an overview of the integrations available out of the box.",
            Self::Overview => "Here's a quick tour of the platform.",
        }
    }
}

struct CardBucket {
    card: CardType,
    confidence: f32,
    keywords: &'static [&'static str],
}

const CARD_BUCKETS: &[CardBucket] = &[
    CardBucket {
        card: CardType::Demo,
        confidence: 0.90,
        keywords: &["demo", "trial", "see it in action", "walkthrough", "pilot"],
    },
    CardBucket {
        card: CardType::Comparison,
        confidence: 0.85,
        keywords: &[
            "competitor", "competitors", "vs", "versus", "alternative", "alternatives",
            "compare", "comparison", "better than",
        ],
    },
    CardBucket {
        card: CardType::Roi,
        confidence: 0.85,
        keywords: &[
            "roi", "pricing", "price", "cost", "costs", "budget", "savings",
            "return on investment", "how much",
        ],
    },
    CardBucket {
        card: CardType::Compliance,
        confidence: 0.80,
        keywords: &[
            "compliance", "soc 2", "hipaa", "gdpr", "audit", "iso 27001", "ai act",
            "regulation", "regulatory",
        ],
    },
    CardBucket {
        card: CardType::CaseStudy,
        confidence: 0.75,
        keywords: &[
            "case study", "case studies", "customers like", "who uses", "references",
            "success story",
        ],
    },
    CardBucket {
        card: CardType::Integration,
        confidence: 0.72,
        keywords: &["integration", "integrations", "integrate", "api", "sso", "okta", "siem", "sdk"],
    },
    CardBucket {
        card: CardType::Overview,
        confidence: 0.60,
        keywords: &["platform", "overview", "what do you do", "how does it work"],
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTrigger {
    pub card_type: CardType,
    pub confidence: f32,
    pub reason: String,
}

#[must_use]
pub fn passes_confidence_gate(confidence: f32) -> bool {
    confidence >= CARD_CONFIDENCE_THRESHOLD
}

/// Pick a card for this turn.
///
/// Only buckets that pass the confidence gate and whose card has not been
/// shown this session are eligible. They are tried in priority order against
/// the visitor's `message` first, then against `draft_response`. A hit in the
/// message always wins over a hit in the reply.
///
/// Conversation history is not consulted: repetition across turns is
/// governed by `context.cards_shown` alone.
#[must_use]
pub fn detect_card_trigger(
    message: &str,
    draft_response: &str,
    context: &ConversationContext,
) -> Option<CardTrigger> {
    let candidates: Vec<&CardBucket> = CARD_BUCKETS
        .iter()
        .filter(|b| passes_confidence_gate(b.confidence))
        .filter(|b| !context.cards_shown.contains(&b.card))
        .collect();

    let sources = [("message", normalize(message)), ("reply", normalize(draft_response))];
    let (bucket, keyword, source) = sources.iter().find_map(|(source, text)| {
        candidates.iter().find_map(|bucket| {
            bucket
                .keywords
                .iter()
                .find(|k| contains_keyword(text, k))
                .map(|k| (*bucket, *k, *source))
        })
    })?;

    Some(CardTrigger {
        card_type: bucket.card,
        confidence: bucket.confidence,
        reason: format!("keyword \"{keyword}\" in {source}"),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfilingQuestion {
    pub id: &'static str,
    pub question: &'static str,
}

const PROFILING_QUESTIONS: &[ProfilingQuestion] = &[
    ProfilingQuestion {
        id: "industry",
        question: "What industry is your organization in?",
    },
    ProfilingQuestion {
        id: "company_size",
        question: "Roughly how many people work at your company?",
    },
    ProfilingQuestion {
        id: "pain_points",
        question: "What's the biggest challenge you're facing with AI governance right now?",
    },
    ProfilingQuestion {
        id: "compliance",
        question: "Are there specific compliance frameworks you need to meet, like SOC 2 or HIPAA?",
    },
    ProfilingQuestion {
        id: "existing_ai",
        question: "Is your team already using AI tools or agents today?",
    },
    ProfilingQuestion {
        id: "agent_count",
        question: "About how many AI agents or assistants do you have running?",
    },
    ProfilingQuestion {
        id: "use_cases",
        question: "What are the main use cases you're exploring for AI?",
    },
];

fn already_known(id: &str, context: &ConversationContext) -> bool {
    match id {
        "industry" => context.industry.is_some(),
        "company_size" => context.company_size.is_some(),
        "pain_points" => !context.pain_points.is_empty(),
        "compliance" => !context.compliance_frameworks.is_empty(),
        "existing_ai" => context.has_existing_ai.is_known(),
        // Only worth asking once the visitor has said they run AI.
        "agent_count" => {
            context.has_existing_ai != AiAdoption::Yes || context.ai_agent_count.is_some()
        }
        "use_cases" => !context.use_cases.is_empty(),
        _ => true,
    }
}

#[must_use]
pub fn should_ask_profiling_question(
    context: &ConversationContext,
    turn_count: u32,
    draft_response: &str,
) -> bool {
    turn_count >= FIRST_PROFILING_TURN
        && !draft_response.trim_end().ends_with('?')
        && context.questions_asked.len() < MAX_PROFILING_QUESTIONS
}

/// Next unanswered question, or `None` once profiling is exhausted.
///
/// `recent_replies` are the assistant's latest messages; a question whose
/// text already appears there is skipped.
#[must_use]
pub fn next_profiling_question(
    context: &ConversationContext,
    recent_replies: &[&str],
) -> Option<ProfilingQuestion> {
    let recent: Vec<String> = recent_replies.iter().map(|r| r.to_lowercase()).collect();
    PROFILING_QUESTIONS.iter().copied().find(|q| {
        !context.questions_asked.iter().any(|asked| asked == q.id)
            && !already_known(q.id, context)
            && !recent
                .iter()
                .any(|r| r.contains(&q.question.to_lowercase()))
    })
}

/// What, if anything, to append to this turn's reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphDecision {
    Card(CardTrigger),
    Question(ProfilingQuestion),
    Nothing,
}

/// Card first; a profiling question only when no card fired.
#[must_use]
pub fn decide(
    message: &str,
    draft_response: &str,
    context: &ConversationContext,
    recent_replies: &[&str],
) -> MorphDecision {
    if let Some(card) = detect_card_trigger(message, draft_response, context) {
        return MorphDecision::Card(card);
    }
    if should_ask_profiling_question(context, context.turn_count, draft_response) {
        if let Some(question) = next_profiling_question(context, recent_replies) {
            return MorphDecision::Question(question);
        }
    }
    MorphDecision::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextUpdate;

    fn ctx_at_turn(turns: u32) -> ConversationContext {
        let mut ctx = ConversationContext::create_initial("s");
        for _ in 0..turns {
            ctx = ctx.update(ContextUpdate {
                new_turn: true,
                ..ContextUpdate::default()
            });
        }
        ctx
    }

    #[test]
    fn pricing_message_triggers_roi_card() {
        let trigger = detect_card_trigger(
            "Hi, I'm John Smith from Acme Corp, what's your pricing?",
            "Happy to help with that.",
            &ctx_at_turn(1),
        )
        .expect("card");
        assert_eq!(trigger.card_type, CardType::Roi);
        assert!((trigger.confidence - 0.85).abs() < f32::EPSILON);
        assert!(trigger.reason.contains("pricing"));
    }

    #[test]
    fn message_hit_outranks_reply_hit() {
        let trigger = detect_card_trigger(
            "how does this compare to other vendors?",
            "We'd love to set up a demo.",
            &ctx_at_turn(1),
        )
        .expect("card");
        assert_eq!(trigger.card_type, CardType::Comparison);
    }

    #[test]
    fn reply_text_can_trigger() {
        let trigger = detect_card_trigger(
            "Interesting, go on",
            "Most teams start with a two-week pilot.",
            &ctx_at_turn(1),
        )
        .expect("card");
        assert_eq!(trigger.card_type, CardType::Demo);
        assert!(trigger.reason.ends_with("in reply"));
    }

    #[test]
    fn shown_cards_are_skipped() {
        let ctx = ctx_at_turn(1).update(ContextUpdate {
            cards_shown: vec![CardType::Roi],
            ..ContextUpdate::default()
        });
        assert_eq!(detect_card_trigger("what's the pricing?", "", &ctx), None);
    }

    #[test]
    fn low_confidence_bucket_is_never_surfaced() {
        assert_eq!(
            detect_card_trigger("tell me about the platform", "", &ctx_at_turn(1)),
            None
        );
    }

    #[test]
    fn gated_out_message_hit_falls_through_to_reply() {
        let trigger = detect_card_trigger(
            "How does it work?",
            "Most teams start with a two-week pilot.",
            &ctx_at_turn(1),
        )
        .expect("card");
        assert_eq!(trigger.card_type, CardType::Demo);
        assert!(trigger.reason.ends_with("in reply"));
    }

    #[test]
    fn message_still_preferred_when_both_pass_the_gate() {
        let trigger = detect_card_trigger(
            "what's your pricing?",
            "We can also set up a demo.",
            &ctx_at_turn(1),
        )
        .expect("card");
        assert_eq!(trigger.card_type, CardType::Roi);
    }

    #[test]
    fn confidence_gate_boundary() {
        assert!(passes_confidence_gate(0.70));
        assert!(!passes_confidence_gate(0.69));
        assert!(CARD_BUCKETS
            .iter()
            .all(|b| b.card == CardType::Overview || passes_confidence_gate(b.confidence)));
    }

    #[test]
    fn profiling_gates() {
        let ctx = ctx_at_turn(1);
        assert!(!should_ask_profiling_question(&ctx, 1, "Sure."));
        assert!(should_ask_profiling_question(&ctx, 2, "Sure."));
        assert!(!should_ask_profiling_question(&ctx, 2, "Want to know more? "));

        let exhausted = ctx.update(ContextUpdate {
            questions_asked: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..ContextUpdate::default()
        });
        assert!(!should_ask_profiling_question(&exhausted, 5, "Sure."));
    }

    #[test]
    fn next_question_skips_asked_and_known() {
        let mut ctx = ctx_at_turn(2);
        assert_eq!(next_profiling_question(&ctx, &[]).map(|q| q.id), Some("industry"));

        ctx.industry = Some("healthcare".into());
        ctx.questions_asked.push("company_size".into());
        assert_eq!(
            next_profiling_question(&ctx, &[]).map(|q| q.id),
            Some("pain_points")
        );
    }

    #[test]
    fn next_question_skips_text_already_in_history() {
        let ctx = ctx_at_turn(2);
        let recent = ["Great. What industry is your organization in?"];
        assert_eq!(
            next_profiling_question(&ctx, &recent).map(|q| q.id),
            Some("company_size")
        );
    }

    #[test]
    fn agent_count_waits_for_existing_ai() {
        let mut ctx = ctx_at_turn(2);
        ctx.industry = Some("x".into());
        ctx.company_size = Some("1-10".into());
        ctx.pain_points = vec!["x".into()];
        ctx.compliance_frameworks = vec!["GDPR".into()];
        ctx.has_existing_ai = AiAdoption::No;
        assert_eq!(next_profiling_question(&ctx, &[]).map(|q| q.id), Some("use_cases"));

        ctx.has_existing_ai = AiAdoption::Yes;
        assert_eq!(
            next_profiling_question(&ctx, &[]).map(|q| q.id),
            Some("agent_count")
        );
    }

    #[test]
    fn exhausted_questions_return_none() {
        let mut ctx = ctx_at_turn(2);
        ctx.questions_asked = PROFILING_QUESTIONS.iter().map(|q| q.id.to_string()).collect();
        assert_eq!(next_profiling_question(&ctx, &[]), None);
    }

    #[test]
    fn card_and_question_are_exclusive() {
        let ctx = ctx_at_turn(3);
        match decide("what does a pilot cost?", "It depends.", &ctx, &[]) {
            MorphDecision::Card(card) => assert_eq!(card.card_type, CardType::Demo),
            other => panic!("expected card, got {other:?}"),
        }
        match decide("we are a small team", "Got it.", &ctx, &[]) {
            MorphDecision::Question(q) => assert_eq!(q.id, "industry"),
            other => panic!("expected question, got {other:?}"),
        }
    }
}
