//! Lead tiering. The weighting is a business policy, so it sits behind
//! [`TierPolicy`]; [`SignalTierPolicy`] is the default.

use leadbot_core::PriorityTier;
use serde::Serialize;

use crate::context::{ConversationContext, EngagementLevel};
use crate::extract::BuyingSignal;

pub trait TierPolicy: Send + Sync {
    fn tier(&self, context: &ConversationContext) -> PriorityTier;
}

/// Additive score over buying signals, compliance mentions, and how much
/// of the visitor's identity is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTierPolicy {
    pub hot_threshold: u32,
    pub warm_threshold: u32,
}

impl Default for SignalTierPolicy {
    fn default() -> Self {
        Self {
            hot_threshold: 10,
            warm_threshold: 5,
        }
    }
}

impl SignalTierPolicy {
    #[must_use]
    pub fn score(&self, context: &ConversationContext) -> u32 {
        let signals: u32 = context.buying_signals.iter().map(|s| signal_weight(*s)).sum();
        let frameworks = 2 * u32::try_from(context.compliance_frameworks.len()).unwrap_or(u32::MAX);
        let identity = u32::from(context.email.is_some()) * 3
            + u32::from(context.company_name.is_some()) * 2
            + u32::from(context.job_title.is_some());
        let engagement = match context.engagement_level {
            EngagementLevel::High => 2,
            EngagementLevel::Medium => 1,
            EngagementLevel::Low => 0,
        };
        signals
            .saturating_add(frameworks)
            .saturating_add(identity)
            .saturating_add(engagement)
    }
}

fn signal_weight(signal: BuyingSignal) -> u32 {
    match signal {
        BuyingSignal::Budget | BuyingSignal::Procurement | BuyingSignal::DecisionMaker => 4,
        BuyingSignal::DemoRequest | BuyingSignal::Timeline => 3,
        BuyingSignal::PricingInquiry | BuyingSignal::ActiveEvaluation => 2,
    }
}

impl TierPolicy for SignalTierPolicy {
    fn tier(&self, context: &ConversationContext) -> PriorityTier {
        let score = self.score(context);
        if score >= self.hot_threshold {
            PriorityTier::Tier1
        } else if score >= self.warm_threshold {
            PriorityTier::Tier2
        } else {
            PriorityTier::Tier3
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadAssessment {
    pub tier: PriorityTier,
    /// Sales should be emailed about this session.
    pub notify: bool,
}

#[must_use]
pub fn assess(context: &ConversationContext, policy: &dyn TierPolicy) -> LeadAssessment {
    let tier = policy.tier(context);
    LeadAssessment {
        tier,
        notify: tier == PriorityTier::Tier1 && context.email.is_some(),
    }
}
