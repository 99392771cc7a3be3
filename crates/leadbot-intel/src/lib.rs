//! Conversational lead intelligence for the website chat.
//!
//! Everything in this crate is a pure function of its inputs: the safety
//! filter, the entity/intent extractors, the conversation context merge
//! rules, the card/profiling selector, and the lead tier policy. I/O lives
//! in the server and provider crates.

pub mod context;
pub mod extract;
pub mod morph;
pub mod safety;
pub mod scoring;
pub mod text;

pub use context::{
    AiAdoption, ContextSummary, ContextUpdate, ConversationContext, EngagementLevel,
    CONTEXT_SCHEMA_VERSION, MAX_SERIALIZED_BYTES,
};
pub use extract::{
    detect_buying_signals, detect_intent, extract_entities, BuyingSignal, ExtractedEntities,
    Intent,
};
pub use morph::{
    decide, detect_card_trigger, next_profiling_question, passes_confidence_gate,
    should_ask_profiling_question, CardTrigger, CardType, MorphDecision, ProfilingQuestion,
    CARD_CONFIDENCE_THRESHOLD, MAX_PROFILING_QUESTIONS,
};
pub use safety::{classify, SafetyVerdict, ThreatLevel};
pub use scoring::{assess, LeadAssessment, SignalTierPolicy, TierPolicy};
