//! Live chat reward and gas-efficiency estimator.
//!
//! Pure arithmetic over the session's messages; recomputed after every
//! chat turn. The result is guidance for the user only: the single hard
//! gate on claiming is [`super::chat::MIN_CLAIM_MESSAGES`].

use serde::Serialize;
use utoipa::ToSchema;

use super::chat::{ChatMessage, ChatRole};

/// POOL earned per user message before multipliers.
pub const BASE_REWARD_PER_MESSAGE: f64 = 0.15;

/// Ceiling of the length bonus.
pub const MAX_LENGTH_BONUS: f64 = 1.5;

/// Ceiling of the quality multiplier.
pub const MAX_QUALITY_MULTIPLIER: f64 = 1.8;

/// Conversation-length bonus reported once a conversation has more than
/// three user messages. It is informational and not part of the earnings.
pub const CONVERSATION_BONUS: f64 = 1.2;

/// Projection factor for a conversation that keeps going.
pub const CONTINUATION_FACTOR: f64 = 1.4;

/// Ratio at which claiming is considered optimal.
pub const OPTIMAL_EFFICIENCY: f64 = 5.0;

/// Ratio at which claiming is considered decent.
pub const DECENT_EFFICIENCY: f64 = 3.0;

/// Within the decent band, claiming is recommended from this ratio on.
pub const RECOMMENDED_EFFICIENCY: f64 = 4.0;

/// Market assumptions used to price the claim transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasAssumptions {
    /// Average claim gas cost in USD.
    pub gas_cost_usd: f64,
    /// POOL token price in USD.
    pub pool_price_usd: f64,
}

impl GasAssumptions {
    /// Gas cost expressed in POOL, or `None` when the price is unusable.
    #[must_use]
    pub fn gas_cost_in_pool(&self) -> Option<f64> {
        let cost = self.gas_cost_usd / self.pool_price_usd;
        (self.pool_price_usd > 0.0 && cost.is_finite() && cost > 0.0).then_some(cost)
    }
}

impl Default for GasAssumptions {
    fn default() -> Self {
        Self {
            gas_cost_usd: 0.11,
            pool_price_usd: 0.25,
        }
    }
}

/// How worthwhile claiming is right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyLevel {
    /// Gas would eat most of the reward.
    Low,
    /// Acceptable.
    Decent,
    /// Claim now.
    Optimal,
}

/// Estimator output for one conversation state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionRewards {
    /// POOL earned so far (3 decimals).
    pub current_earnings: f64,
    /// Quality score, 0–100 (1 decimal).
    pub quality_score: f64,
    /// Number of user messages.
    pub message_count: usize,
    /// Projected earnings if the conversation continues (3 decimals).
    pub estimated_final: f64,
    /// Earnings divided by gas cost in POOL (1 decimal).
    pub gas_efficiency: f64,
    /// Whether claiming now is recommended.
    pub optimal_claim: bool,
    /// Efficiency bucket.
    pub efficiency_level: EfficiencyLevel,
    /// Length bonus applied.
    pub length_bonus: f64,
    /// Quality multiplier applied.
    pub quality_multiplier: f64,
    /// Conversation-length bonus, reported only.
    pub conversation_bonus: f64,
    /// Average POOL per user message (3 decimals).
    pub average_per_message: f64,
}

/// Computes the reward estimate for a conversation.
#[must_use]
pub fn estimate(messages: &[ChatMessage], gas: GasAssumptions) -> SessionRewards {
    let (message_count, total_length) = messages
        .iter()
        .filter(|m| m.role == ChatRole::User)
        .fold((0usize, 0usize), |(count, len), m| {
            (count + 1, len + m.content.chars().count())
        });

    #[allow(clippy::cast_precision_loss)]
    let avg_length = if message_count > 0 {
        total_length as f64 / message_count as f64
    } else {
        0.0
    };

    let length_bonus = (avg_length / 100.0).min(MAX_LENGTH_BONUS);
    let quality_multiplier = (1.0 + avg_length / 200.0).min(MAX_QUALITY_MULTIPLIER);
    let conversation_bonus = if message_count > 3 {
        CONVERSATION_BONUS
    } else {
        1.0
    };

    #[allow(clippy::cast_precision_loss)]
    let current_earnings = (message_count as f64
        * BASE_REWARD_PER_MESSAGE
        * length_bonus
        * quality_multiplier)
        .max(0.0);
    let quality_score = ((length_bonus + quality_multiplier - 1.0) * 40.0).clamp(0.0, 100.0);
    let estimated_final = current_earnings * CONTINUATION_FACTOR;

    let gas_efficiency = gas
        .gas_cost_in_pool()
        .map_or(0.0, |cost| current_earnings / cost);

    let (efficiency_level, optimal_claim) = if gas_efficiency >= OPTIMAL_EFFICIENCY {
        (EfficiencyLevel::Optimal, true)
    } else if gas_efficiency >= DECENT_EFFICIENCY {
        (
            EfficiencyLevel::Decent,
            gas_efficiency >= RECOMMENDED_EFFICIENCY,
        )
    } else {
        (EfficiencyLevel::Low, false)
    };

    #[allow(clippy::cast_precision_loss)]
    let average_per_message = if message_count > 0 {
        current_earnings / message_count as f64
    } else {
        0.0
    };

    SessionRewards {
        current_earnings: round_to(current_earnings, 3),
        quality_score: round_to(quality_score, 1),
        message_count,
        estimated_final: round_to(estimated_final, 3),
        gas_efficiency: round_to(gas_efficiency, 1),
        optimal_claim,
        efficiency_level,
        length_bonus,
        quality_multiplier,
        conversation_bonus,
        average_per_message: round_to(average_per_message, 3),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::User,
            content: content.to_string(),
            timestamp: 0,
        }
    }

    fn assistant(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn empty_conversation_earns_nothing() {
        let r = estimate(&[assistant("hello")], GasAssumptions::default());
        assert_eq!(r.message_count, 0);
        assert_eq!(r.current_earnings, 0.0);
        assert_eq!(r.gas_efficiency, 0.0);
        assert_eq!(r.efficiency_level, EfficiencyLevel::Low);
        assert!(!r.optimal_claim);
        // quality_multiplier is 1 and length_bonus 0 => score 0
        assert_eq!(r.quality_score, 0.0);
    }

    #[test]
    fn single_hundred_char_message() {
        let msg = "a".repeat(100);
        let r = estimate(&[user(&msg)], GasAssumptions::default());
        // 1 * 0.15 * 1.0 * 1.5 = 0.225
        assert_eq!(r.current_earnings, 0.225);
        assert_eq!(r.estimated_final, 0.315);
        // (1.0 + 1.5 - 1) * 40 = 60
        assert_eq!(r.quality_score, 60.0);
        // 0.225 / 0.44 = 0.511..
        assert_eq!(r.gas_efficiency, 0.5);
        assert_eq!(r.conversation_bonus, 1.0);
    }

    #[test]
    fn long_sustained_conversation_is_optimal() {
        let msg = "x".repeat(500);
        let messages: Vec<_> = (0..10).map(|_| user(&msg)).collect();
        let r = estimate(&messages, GasAssumptions::default());
        // 10 * 0.15 * 1.5 * 1.8 = 4.05
        assert_eq!(r.current_earnings, 4.05);
        assert_eq!(r.efficiency_level, EfficiencyLevel::Optimal);
        assert!(r.optimal_claim);
        assert_eq!(r.conversation_bonus, CONVERSATION_BONUS);
    }

    #[test]
    fn quality_score_is_capped_for_arbitrarily_long_input() {
        let huge = "q".repeat(1_000_000);
        let r = estimate(&[user(&huge), user(&huge)], GasAssumptions::default());
        assert!(r.quality_score <= 100.0);
        assert!(r.current_earnings >= 0.0);
        assert!(r.length_bonus <= MAX_LENGTH_BONUS);
        assert!(r.quality_multiplier <= MAX_QUALITY_MULTIPLIER);
    }

    #[test]
    fn decent_band_recommends_claim_from_four() {
        let msg = "y".repeat(500);

        // 4 * 0.15 * 1.5 * 1.8 = 1.62 POOL against 0.44 POOL of gas: 3.7x
        let four: Vec<_> = (0..4).map(|_| user(&msg)).collect();
        let r = estimate(&four, GasAssumptions::default());
        assert_eq!(r.efficiency_level, EfficiencyLevel::Decent);
        assert!(!r.optimal_claim);

        // 5 * 0.15 * 1.5 * 1.8 = 2.025 POOL: 4.6x
        let five: Vec<_> = (0..5).map(|_| user(&msg)).collect();
        let r = estimate(&five, GasAssumptions::default());
        assert_eq!(r.efficiency_level, EfficiencyLevel::Decent);
        assert!(r.optimal_claim);
    }

    #[test]
    fn conversation_bonus_is_reported_but_not_earned() {
        let msg = "m".repeat(100);
        let messages: Vec<_> = (0..4).map(|_| user(&msg)).collect();
        let r = estimate(&messages, GasAssumptions::default());
        assert_eq!(r.conversation_bonus, CONVERSATION_BONUS);
        // 4 * 0.15 * 1.0 * 1.5
        assert_eq!(r.current_earnings, 0.9);
        assert_eq!(r.average_per_message, 0.225);
    }

    #[test]
    fn unusable_price_yields_zero_efficiency() {
        let gas = GasAssumptions {
            gas_cost_usd: 0.11,
            pool_price_usd: 0.0,
        };
        let r = estimate(&[user(&"z".repeat(300))], gas);
        assert_eq!(r.gas_efficiency, 0.0);
        assert!(r.current_earnings > 0.0);
    }

    #[test]
    fn assistant_messages_do_not_count() {
        let msg = "w".repeat(200);
        let with = estimate(
            &[user(&msg), assistant(&"long reply ".repeat(200))],
            GasAssumptions::default(),
        );
        let without = estimate(&[user(&msg)], GasAssumptions::default());
        assert_eq!(with.current_earnings, without.current_earnings);
        assert_eq!(with.message_count, 1);
    }
}
