//! Solidity bindings for the PromptPool contract.
//!
//! Only the functions the gateway reads or builds calldata for are
//! declared. Generated call and return types live in [`prompt_pool`].

#[allow(missing_docs, missing_debug_implementations)]
pub mod prompt_pool {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug)]
        struct PromptRecord {
            address contributor;
            string ipfsHash;
            string title;
            uint8 category;
            uint8 tier;
            uint256 rewardAmount;
            uint256 submittedAt;
            bool isApproved;
            bool isPaid;
            uint8 qualityScore;
        }

        function submitPrompt(string ipfsHash, string title, uint8 category, uint256 promptLength) external;

        function submitChatSession(
            string conversationHash,
            uint256 messageCount,
            uint256 qualityScore,
            uint256 sessionDuration,
            string category,
            bool allowTraining
        ) external;

        function claimReferralRewards() external;

        function paySubscription() external;

        function getUserStats(address user) external view returns (
            uint256 totalSubmissions,
            uint256 approvedSubmissions,
            uint256 totalRewards,
            uint256 reputationScore,
            uint8 currentTier,
            uint256 lastSubmissionTime,
            uint256 consecutiveApprovals
        );

        function getTotalSubmissions() external view returns (uint256);

        function getContractBalance() external view returns (uint256);

        function canSubmit(address user) external view returns (bool);

        function getRewardEstimate(uint256 promptLength, uint8 category, address user)
            external view returns (uint8 tier, uint256 rewardAmount);

        function getPrompt(uint256 promptId) external view returns (PromptRecord);

        function getUserChatStats(address user) external view returns (
            uint256 totalSessions,
            uint256 totalMessages,
            uint256 totalEarned,
            uint256 lastSessionTime
        );

        function getReferralStats(address user) external view returns (
            address referrer,
            uint256 totalReferrals,
            uint256 totalEarned,
            uint256 pendingRewards
        );

        function getSubscriptionStatus(address user) external view returns (
            bool active,
            uint256 dueAt,
            uint256 lastMonthEarnings
        );
    }
}

pub use prompt_pool::PromptRecord;
