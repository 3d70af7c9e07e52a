//! Prompt submissions, categories and reward tiers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::WalletAddress;
use crate::error::GatewayError;

/// Minimum prompt length, in characters.
pub const MIN_PROMPT_LENGTH: usize = 20;

/// Prompt category as stored on-chain (`uint8`, 0–5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PromptCategory {
    /// Creative writing.
    CreativeWriting = 0,
    /// Technical / programming.
    TechnicalProgramming = 1,
    /// Educational.
    Educational = 2,
    /// Conversational. Chat session transcripts are filed here.
    Conversational = 3,
    /// Analytical / research.
    AnalyticalResearch = 4,
    /// Anything else.
    Other = 5,
}

impl PromptCategory {
    /// All categories in on-chain order.
    pub const ALL: [Self; 6] = [
        Self::CreativeWriting,
        Self::TechnicalProgramming,
        Self::Educational,
        Self::Conversational,
        Self::AnalyticalResearch,
        Self::Other,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreativeWriting => "Creative Writing",
            Self::TechnicalProgramming => "Technical/Programming",
            Self::Educational => "Educational",
            Self::Conversational => "Conversational",
            Self::AnalyticalResearch => "Analytical/Research",
            Self::Other => "Other",
        }
    }

    /// On-chain discriminant.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PromptCategory {
    type Error = GatewayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown category {value}")))
    }
}

impl From<PromptCategory> for u8 {
    fn from(category: PromptCategory) -> Self {
        category.as_u8()
    }
}

/// Reward bracket assigned by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Tier 0.
    Bronze,
    /// Tier 1.
    Silver,
    /// Tier 2.
    Gold,
    /// Tier 3.
    Platinum,
}

impl Tier {
    /// Maps the contract's `uint8`; unknown values fall back to Bronze.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Silver,
            2 => Self::Gold,
            3 => Self::Platinum,
            _ => Self::Bronze,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }

    /// Badge emoji.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Bronze => "🥉",
            Self::Silver => "🥈",
            Self::Gold => "🥇",
            Self::Platinum => "💎",
        }
    }
}

/// Lifecycle of a cached submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Pinned; transaction not yet settled.
    Pending,
    /// Transaction receipt reported success.
    Confirmed,
    /// Transaction reverted.
    Failed,
}

/// Fields read back from the contract once a submission settles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OnChainFields {
    /// Contract-side prompt id, when known.
    pub prompt_id: Option<u64>,
    /// Tier (0–3).
    pub tier: Option<u8>,
    /// Reward in POOL, formatted.
    pub reward: Option<String>,
    /// Approved by the contract's review.
    pub is_approved: bool,
    /// Reward paid out.
    pub is_paid: bool,
    /// Quality score assigned on-chain.
    pub quality_score: Option<u8>,
}

/// A prompt submission as cached per wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CachedPrompt {
    /// Local identifier.
    pub id: uuid::Uuid,
    /// Prompt title.
    pub title: String,
    /// Prompt body.
    pub content: String,
    /// Category (0–5).
    #[schema(value_type = u8)]
    pub category: PromptCategory,
    /// Submitting wallet.
    #[schema(value_type = String)]
    pub author: WalletAddress,
    /// Unix timestamp in milliseconds.
    pub submitted_at: i64,
    /// IPFS content hash.
    pub ipfs_hash: String,
    /// Public gateway URL.
    pub ipfs_url: String,
    /// The hash is simulated (pinning unavailable).
    pub is_demo: bool,
    /// Settlement status.
    pub status: SubmissionStatus,
    /// Hash of the `submitPrompt` transaction once the wallet sent it.
    pub tx_hash: Option<String>,
    /// Blockchain-confirmed fields.
    #[serde(default)]
    pub on_chain: OnChainFields,
}

impl CachedPrompt {
    /// Prompt length as sent to the contract.
    #[must_use]
    pub fn length(&self) -> usize {
        self.content.chars().count()
    }
}

/// A validated prompt draft, ready to pin.
#[derive(Debug, Clone)]
pub struct PromptDraft {
    /// Trimmed title.
    pub title: String,
    /// Content as typed.
    pub content: String,
    /// Category.
    pub category: PromptCategory,
    /// Author wallet.
    pub author: WalletAddress,
    /// Unix timestamp in milliseconds.
    pub submitted_at: i64,
}

impl PromptDraft {
    /// Validates a submission before any network call is made.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the title is blank or
    /// the content is shorter than [`MIN_PROMPT_LENGTH`] characters.
    pub fn validate(
        title: &str,
        content: &str,
        category: PromptCategory,
        author: WalletAddress,
    ) -> Result<Self, GatewayError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GatewayError::InvalidRequest("title is required".to_string()));
        }
        let length = content.chars().count();
        if length < MIN_PROMPT_LENGTH {
            return Err(GatewayError::InvalidRequest(format!(
                "prompt content must be at least {MIN_PROMPT_LENGTH} characters (got {length})"
            )));
        }
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            category,
            author,
            submitted_at: Utc::now().timestamp_millis(),
        })
    }

    /// Prompt length in characters.
    #[must_use]
    pub fn length(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn author() -> WalletAddress {
        let Ok(a) = WalletAddress::parse("0x2D6048916FD4017D9348563d442a3476a710D335") else {
            panic!("valid address");
        };
        a
    }

    #[test]
    fn short_content_is_rejected() {
        let result = PromptDraft::validate(
            "Title",
            "too short",
            PromptCategory::Educational,
            author(),
        );
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 19 multi-byte characters stay below the minimum.
        let content = "é".repeat(19);
        assert!(
            PromptDraft::validate("Title", &content, PromptCategory::Other, author()).is_err()
        );
        let content = "é".repeat(20);
        assert!(PromptDraft::validate("Title", &content, PromptCategory::Other, author()).is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let result = PromptDraft::validate(
            "   ",
            "a perfectly long prompt body here",
            PromptCategory::CreativeWriting,
            author(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn category_round_trips_through_u8() {
        for category in PromptCategory::ALL {
            let back = PromptCategory::try_from(category.as_u8());
            assert!(back.is_ok_and(|c| c == category));
        }
        assert!(PromptCategory::try_from(6).is_err());
    }

    #[test]
    fn category_deserializes_from_number() {
        let ok: Result<PromptCategory, _> = serde_json::from_str("4");
        assert!(ok.is_ok_and(|c| c == PromptCategory::AnalyticalResearch));
        let bad: Result<PromptCategory, _> = serde_json::from_str("9");
        assert!(bad.is_err());
    }

    #[test]
    fn unknown_tier_falls_back_to_bronze() {
        assert_eq!(Tier::from_u8(2).name(), "Gold");
        assert_eq!(Tier::from_u8(42), Tier::Bronze);
        assert_eq!(Tier::from_u8(3).emoji(), "💎");
    }
}
