//! Per-session visitor context, threaded between turns as an opaque string.
//!
//! The context only ever gets richer within a session: scalar facts are
//! first-write-wins and list facts are unions. Nothing here performs I/O;
//! the chat handler deserializes the payload the client sent, applies this
//! turn's changes, and hands the re-serialized form back.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::{BuyingSignal, ExtractedEntities, Intent};
use crate::morph::CardType;

/// Version tag written into every serialized context.
pub const CONTEXT_SCHEMA_VERSION: u32 = 1;

/// Payloads larger than this are discarded rather than parsed.
pub const MAX_SERIALIZED_BYTES: usize = 16 * 1024;

/// Whether the visitor already runs AI tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiAdoption {
    #[default]
    Unknown,
    Yes,
    No,
}

impl AiAdoption {
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl From<bool> for AiAdoption {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

const ENGAGEMENT_TURN_CAP: usize = 6;
const ENGAGEMENT_MEDIUM: usize = 4;
const ENGAGEMENT_HIGH: usize = 8;

const INDUSTRY_WEIGHT: u8 = 20;
const COMPANY_SIZE_WEIGHT: u8 = 10;
const PAIN_POINTS_WEIGHT: u8 = 25;
const FRAMEWORKS_WEIGHT: u8 = 15;
const USE_CASES_WEIGHT: u8 = 15;
const AI_ADOPTION_WEIGHT: u8 = 5;
const AGENT_COUNT_WEIGHT: u8 = 5;
const EMAIL_WEIGHT: u8 = 5;

const _: () = assert!(
    INDUSTRY_WEIGHT
        + COMPANY_SIZE_WEIGHT
        + PAIN_POINTS_WEIGHT
        + FRAMEWORKS_WEIGHT
        + USE_CASES_WEIGHT
        + AI_ADOPTION_WEIGHT
        + AGENT_COUNT_WEIGHT
        + EMAIL_WEIGHT
        == 100
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationContext {
    pub session_id: String,

    pub name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,

    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub pain_points: Vec<String>,
    pub compliance_frameworks: Vec<String>,
    pub use_cases: Vec<String>,
    pub has_existing_ai: AiAdoption,
    pub ai_agent_count: Option<u32>,

    /// Append-only, in first-seen order.
    pub topics_discussed: Vec<String>,
    pub buying_signals: Vec<BuyingSignal>,
    /// Profiling question ids already put to the visitor.
    pub questions_asked: Vec<String>,
    pub cards_shown: Vec<CardType>,
    pub current_intent: Option<Intent>,
    pub engagement_level: EngagementLevel,
    pub turn_count: u32,
}

/// Bookkeeping changes for one turn. Empty fields leave the context alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextUpdate {
    pub intent: Option<Intent>,
    pub topics: Vec<String>,
    pub buying_signals: Vec<BuyingSignal>,
    pub questions_asked: Vec<String>,
    pub cards_shown: Vec<CardType>,
    /// Count this update as one processed visitor message.
    pub new_turn: bool,
}

/// Diagnostic view returned to the caller with every chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSummary {
    pub completeness: u8,
    pub engagement_level: EngagementLevel,
    pub intent: Option<Intent>,
    pub turn_count: u32,
    pub questions_asked: usize,
    pub cards_shown: usize,
}

#[derive(Serialize)]
struct Envelope<'a> {
    schema_version: u32,
    #[serde(flatten)]
    context: &'a ConversationContext,
}

#[derive(Deserialize)]
struct VersionHeader {
    schema_version: Option<u32>,
}

impl ConversationContext {
    #[must_use]
    pub fn create_initial(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Apply one turn's bookkeeping and recompute engagement.
    #[must_use]
    pub fn update(mut self, update: ContextUpdate) -> Self {
        if let Some(intent) = update.intent {
            self.current_intent = Some(intent);
        }
        union_into(&mut self.topics_discussed, update.topics);
        union_into(&mut self.buying_signals, update.buying_signals);
        union_into(&mut self.questions_asked, update.questions_asked);
        union_into(&mut self.cards_shown, update.cards_shown);
        if update.new_turn {
            self.turn_count = self.turn_count.saturating_add(1);
        }
        self.engagement_level = self.compute_engagement();
        self
    }

    /// Fold extracted entities in. Scalars already set are never replaced;
    /// list fields are unioned.
    #[must_use]
    pub fn merge_entities(mut self, entities: &ExtractedEntities) -> Self {
        set_once(&mut self.name, entities.name.as_ref());
        set_once(
            &mut self.email,
            entities.email.as_ref().map(|e| e.to_lowercase()).as_ref(),
        );
        set_once(&mut self.company_name, entities.company.as_ref());
        set_once(&mut self.job_title, entities.job_title.as_ref());
        set_once(&mut self.phone, entities.phone.as_ref());
        set_once(&mut self.industry, entities.industry.as_ref());
        set_once(&mut self.company_size, entities.company_size.as_ref());

        union_into(&mut self.pain_points, entities.pain_points.iter().cloned());
        union_into(
            &mut self.compliance_frameworks,
            entities.compliance_frameworks.iter().cloned(),
        );
        union_into(&mut self.use_cases, entities.use_cases.iter().cloned());

        if !self.has_existing_ai.is_known() {
            if let Some(known) = entities.has_existing_ai {
                self.has_existing_ai = known.into();
            }
        }
        if self.ai_agent_count.is_none() {
            self.ai_agent_count = entities.ai_agent_count;
        }

        self.engagement_level = self.compute_engagement();
        self
    }

    /// 0-100 weighted count of populated profiling fields.
    #[must_use]
    pub fn completeness(&self) -> u8 {
        [
            (self.industry.is_some(), INDUSTRY_WEIGHT),
            (self.company_size.is_some(), COMPANY_SIZE_WEIGHT),
            (!self.pain_points.is_empty(), PAIN_POINTS_WEIGHT),
            (!self.compliance_frameworks.is_empty(), FRAMEWORKS_WEIGHT),
            (!self.use_cases.is_empty(), USE_CASES_WEIGHT),
            (self.has_existing_ai.is_known(), AI_ADOPTION_WEIGHT),
            (self.ai_agent_count.is_some(), AGENT_COUNT_WEIGHT),
            (self.email.is_some(), EMAIL_WEIGHT),
        ]
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum()
    }

    fn compute_engagement(&self) -> EngagementLevel {
        let turns = usize::try_from(self.turn_count).unwrap_or(usize::MAX);
        let score = turns.min(ENGAGEMENT_TURN_CAP)
            + 2 * self.pain_points.len()
            + 2 * self.compliance_frameworks.len()
            + if self.email.is_some() { 4 } else { 0 };
        match score {
            s if s < ENGAGEMENT_MEDIUM => EngagementLevel::Low,
            s if s < ENGAGEMENT_HIGH => EngagementLevel::Medium,
            _ => EngagementLevel::High,
        }
    }

    #[must_use]
    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            completeness: self.completeness(),
            engagement_level: self.engagement_level,
            intent: self.current_intent,
            turn_count: self.turn_count,
            questions_asked: self.questions_asked.len(),
            cards_shown: self.cards_shown.len(),
        }
    }

    /// Versioned JSON form handed back to the client.
    #[must_use]
    pub fn serialize(&self) -> String {
        let envelope = Envelope {
            schema_version: CONTEXT_SCHEMA_VERSION,
            context: self,
        };
        serde_json::to_string(&envelope).unwrap_or_else(|e| {
            warn!(session_id = %self.session_id, error = %e, "context serialization failed");
            String::new()
        })
    }

    /// Parse a payload produced by [`serialize`](Self::serialize). Anything
    /// unusable yields a fresh context for `session_id`; this never fails.
    /// A payload recorded for another session is discarded.
    #[must_use]
    pub fn deserialize(payload: &str, session_id: &str) -> Self {
        match Self::restore(payload) {
            Some(ctx) if ctx.session_id == session_id => ctx,
            Some(_) => {
                debug!(session_id, "context belongs to another session, resetting");
                Self::create_initial(session_id)
            }
            None => Self::create_initial(session_id),
        }
    }

    /// Parse a payload without an expected session. Used when the caller
    /// sent no session id and the payload's own id is adopted.
    #[must_use]
    pub fn restore(payload: &str) -> Option<Self> {
        if payload.trim().is_empty() {
            return None;
        }
        if payload.len() > MAX_SERIALIZED_BYTES {
            debug!(bytes = payload.len(), "context payload too large, ignoring");
            return None;
        }

        match serde_json::from_str::<VersionHeader>(payload) {
            Ok(VersionHeader {
                schema_version: Some(CONTEXT_SCHEMA_VERSION),
            }) => {}
            Ok(header) => {
                debug!(version = ?header.schema_version, "unsupported context version, ignoring");
                return None;
            }
            Err(e) => {
                debug!(error = %e, "malformed context payload, ignoring");
                return None;
            }
        }

        match serde_json::from_str::<Self>(payload) {
            Ok(ctx) if ctx.session_id.trim().is_empty() => {
                debug!("context payload has no session id, ignoring");
                None
            }
            Ok(ctx) => Some(ctx),
            Err(e) => {
                debug!(error = %e, "context payload did not match schema, ignoring");
                None
            }
        }
    }
}

fn set_once(slot: &mut Option<String>, value: Option<&String>) {
    if slot.is_none() {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            *slot = Some(v.clone());
        }
    }
}

fn union_into<T: PartialEq>(target: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_entities;

    fn entities(name: Option<&str>, pains: &[&str]) -> ExtractedEntities {
        ExtractedEntities {
            name: name.map(str::to_string),
            pain_points: pains.iter().map(|p| (*p).to_string()).collect(),
            ..ExtractedEntities::default()
        }
    }

    #[test]
    fn scalar_fields_are_first_write_wins() {
        let ctx = ConversationContext::create_initial("s")
            .merge_entities(&extract_entities("Hi, I'm John"))
            .merge_entities(&extract_entities("actually my name is Jane"));
        assert_eq!(ctx.name.as_deref(), Some("John"));
    }

    #[test]
    fn merge_never_clears_fields() {
        let ctx = ConversationContext::create_initial("s")
            .merge_entities(&ExtractedEntities {
                email: Some("Ops@Acme.io".into()),
                company: Some("Acme".into()),
                ..ExtractedEntities::default()
            })
            .merge_entities(&ExtractedEntities::default());
        assert_eq!(ctx.email.as_deref(), Some("ops@acme.io"));
        assert_eq!(ctx.company_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn repeated_merge_does_not_duplicate_lists() {
        let e = entities(None, &["audit burden", "shadow ai"]);
        let once = ConversationContext::create_initial("s").merge_entities(&e);
        let twice = once.clone().merge_entities(&e);
        assert_eq!(once, twice);
        assert_eq!(twice.pain_points, vec!["audit burden", "shadow ai"]);
    }

    #[test]
    fn existing_ai_moves_from_unknown_only() {
        let yes = ExtractedEntities {
            has_existing_ai: Some(true),
            ..ExtractedEntities::default()
        };
        let no = ExtractedEntities {
            has_existing_ai: Some(false),
            ..ExtractedEntities::default()
        };
        let ctx = ConversationContext::create_initial("s")
            .merge_entities(&yes)
            .merge_entities(&no);
        assert_eq!(ctx.has_existing_ai, AiAdoption::Yes);
    }

    #[test]
    fn update_unions_bookkeeping_and_counts_turns() {
        let ctx = ConversationContext::create_initial("s")
            .update(ContextUpdate {
                intent: Some(Intent::Pricing),
                topics: vec!["pricing".into()],
                buying_signals: vec![BuyingSignal::PricingInquiry],
                new_turn: true,
                ..ContextUpdate::default()
            })
            .update(ContextUpdate {
                intent: Some(Intent::Demo),
                topics: vec!["pricing".into(), "demo".into()],
                buying_signals: vec![BuyingSignal::PricingInquiry, BuyingSignal::DemoRequest],
                cards_shown: vec![CardType::Roi],
                questions_asked: vec!["industry".into()],
                new_turn: true,
            });
        assert_eq!(ctx.turn_count, 2);
        assert_eq!(ctx.current_intent, Some(Intent::Demo));
        assert_eq!(ctx.topics_discussed, vec!["pricing", "demo"]);
        assert_eq!(
            ctx.buying_signals,
            vec![BuyingSignal::PricingInquiry, BuyingSignal::DemoRequest]
        );
        assert_eq!(ctx.cards_shown, vec![CardType::Roi]);
        assert_eq!(ctx.questions_asked, vec!["industry"]);
    }

    #[test]
    fn engagement_is_recomputed_from_scratch() {
        let mut ctx = ConversationContext::create_initial("s");
        assert_eq!(ctx.engagement_level, EngagementLevel::Low);

        // 3 turns + one pain point = 5.
        for _ in 0..3 {
            ctx = ctx.update(ContextUpdate {
                new_turn: true,
                ..ContextUpdate::default()
            });
        }
        ctx = ctx.merge_entities(&entities(None, &["audit burden"]));
        assert_eq!(ctx.engagement_level, EngagementLevel::Medium);

        // + email = 9.
        ctx = ctx.merge_entities(&ExtractedEntities {
            email: Some("a@b.io".into()),
            ..ExtractedEntities::default()
        });
        assert_eq!(ctx.engagement_level, EngagementLevel::High);
    }

    #[test]
    fn completeness_is_bounded_and_monotonic() {
        let steps = [
            ExtractedEntities {
                industry: Some("healthcare".into()),
                ..ExtractedEntities::default()
            },
            ExtractedEntities {
                company_size: Some("51-200".into()),
                ..ExtractedEntities::default()
            },
            entities(None, &["audit burden"]),
            ExtractedEntities {
                compliance_frameworks: vec!["HIPAA".into()],
                ..ExtractedEntities::default()
            },
            ExtractedEntities {
                use_cases: vec!["customer support".into()],
                ..ExtractedEntities::default()
            },
            ExtractedEntities {
                has_existing_ai: Some(true),
                ai_agent_count: Some(3),
                ..ExtractedEntities::default()
            },
            ExtractedEntities {
                email: Some("cto@clinic.io".into()),
                ..ExtractedEntities::default()
            },
        ];

        let mut ctx = ConversationContext::create_initial("s");
        let mut last = ctx.completeness();
        assert_eq!(last, 0);
        for step in &steps {
            ctx = ctx.merge_entities(step);
            let now = ctx.completeness();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn serialize_round_trips() {
        let ctx = ConversationContext::create_initial("sess-42")
            .merge_entities(&extract_entities(
                "I'm Ana from Globex, we need SOC 2 and have 12 agents",
            ))
            .update(ContextUpdate {
                intent: Some(Intent::Compliance),
                cards_shown: vec![CardType::Compliance],
                new_turn: true,
                ..ContextUpdate::default()
            });
        let payload = ctx.serialize();
        assert!(payload.contains("\"schema_version\":1"));
        assert_eq!(ConversationContext::deserialize(&payload, "sess-42"), ctx);
    }

    #[test]
    fn unusable_payloads_reset_to_initial() {
        let fresh = ConversationContext::create_initial("s");
        assert_eq!(ConversationContext::deserialize("not json", "s"), fresh);
        assert_eq!(ConversationContext::deserialize("", "s"), fresh);
        assert_eq!(
            ConversationContext::deserialize(r#"{"session_id":"s","name":"X"}"#, "s"),
            fresh
        );
        assert_eq!(
            ConversationContext::deserialize(
                r#"{"schema_version":2,"session_id":"s","name":"X"}"#,
                "s"
            ),
            fresh
        );
        assert_eq!(
            ConversationContext::deserialize(
                r#"{"schema_version":1,"session_id":"s","turn_count":"many"}"#,
                "s"
            ),
            fresh
        );
    }

    #[test]
    fn payload_for_other_session_is_discarded() {
        let other = ConversationContext::create_initial("other")
            .merge_entities(&entities(Some("Eve"), &[]))
            .serialize();
        let ctx = ConversationContext::deserialize(&other, "mine");
        assert_eq!(ctx, ConversationContext::create_initial("mine"));
    }

    #[test]
    fn restore_adopts_the_payload_session() {
        let saved = ConversationContext::create_initial("abc-123")
            .merge_entities(&entities(Some("John"), &[]))
            .serialize();
        let ctx = ConversationContext::restore(&saved).expect("restored");
        assert_eq!(ctx.session_id, "abc-123");
        assert_eq!(ctx.name.as_deref(), Some("John"));

        assert_eq!(ConversationContext::restore(""), None);
        assert_eq!(ConversationContext::restore("not json"), None);
        assert_eq!(
            ConversationContext::restore(r#"{"schema_version":1,"session_id":"  "}"#),
            None
        );
    }

    #[test]
    fn oversized_payload_is_discarded() {
        let huge = format!(
            r#"{{"schema_version":1,"session_id":"s","name":"{}"}}"#,
            "x".repeat(MAX_SERIALIZED_BYTES)
        );
        assert_eq!(
            ConversationContext::deserialize(&huge, "s"),
            ConversationContext::create_initial("s")
        );
    }

    #[test]
    fn summary_reports_counts() {
        let ctx = ConversationContext::create_initial("s").update(ContextUpdate {
            questions_asked: vec!["industry".into(), "company_size".into()],
            new_turn: true,
            ..ContextUpdate::default()
        });
        let summary = ctx.summary();
        assert_eq!(summary.turn_count, 1);
        assert_eq!(summary.questions_asked, 2);
        assert_eq!(summary.cards_shown, 0);
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["engagementLevel"], "low");
    }
}
