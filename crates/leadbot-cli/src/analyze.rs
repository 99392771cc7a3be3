//! Offline pipeline inspection: everything a chat turn computes except the
//! provider reply and the database writes.

use leadbot_intel::{
    assess, classify, decide, detect_buying_signals, detect_intent, extract_entities,
    BuyingSignal, CardTrigger, ContextSummary, ContextUpdate, ConversationContext,
    ExtractedEntities, Intent, LeadAssessment, MorphDecision, SafetyVerdict, SignalTierPolicy,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Analysis {
    pub safety: SafetyVerdict,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<ExtractedEntities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    pub buying_signals: Vec<BuyingSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_trigger: Option<CardTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiling_question: Option<&'static str>,
    pub assessment: LeadAssessment,
    pub context_summary: ContextSummary,
    pub user_context: String,
}

/// Blocked messages stop after the safety verdict, as in a live turn.
/// With no provider reply, card detection sees only the visitor message.
pub(crate) fn analyze(message: &str, prior: Option<&str>, session_id: &str) -> Analysis {
    let context = ConversationContext::deserialize(prior.unwrap_or_default(), session_id);
    let policy = SignalTierPolicy::default();
    let safety = classify(message);

    if safety.must_block() {
        return Analysis {
            blocked: true,
            safety,
            entities: None,
            intent: None,
            buying_signals: Vec::new(),
            card_trigger: None,
            profiling_question: None,
            assessment: assess(&context, &policy),
            context_summary: context.summary(),
            user_context: context.serialize(),
        };
    }

    let text = safety.prompt_text(message).to_string();
    let entities = extract_entities(&text);
    let intent = detect_intent(&text, &context);
    let buying_signals = detect_buying_signals(&text);
    let mut context = context.merge_entities(&entities).update(ContextUpdate {
        intent: Some(intent),
        buying_signals: buying_signals.clone(),
        new_turn: true,
        ..ContextUpdate::default()
    });

    let mut card_trigger = None;
    let mut profiling_question = None;
    match decide(&text, "", &context, &[]) {
        MorphDecision::Card(card) => {
            context = context.update(ContextUpdate {
                cards_shown: vec![card.card_type],
                ..ContextUpdate::default()
            });
            card_trigger = Some(card);
        }
        MorphDecision::Question(question) => {
            context = context.update(ContextUpdate {
                questions_asked: vec![question.id.to_string()],
                ..ContextUpdate::default()
            });
            profiling_question = Some(question.question);
        }
        MorphDecision::Nothing => {}
    }

    Analysis {
        blocked: false,
        safety,
        entities: Some(entities),
        intent: Some(intent),
        buying_signals,
        card_trigger,
        profiling_question,
        assessment: assess(&context, &policy),
        context_summary: context.summary(),
        user_context: context.serialize(),
    }
}

pub(crate) fn run_analyze(message: &str, prior: Option<&str>, session_id: &str) -> anyhow::Result<()> {
    let analysis = analyze(message, prior, session_id);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
