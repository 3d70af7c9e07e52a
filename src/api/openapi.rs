//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::handlers::{chat, contract, legacy, prompts, referrals, system, transactions, wallets};

/// Generated OpenAPI 3.1 document.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "PromptPool Gateway",
        description = "LLM chat proxy, IPFS pinning, PromptPool contract reads and referral bookkeeping."
    ),
    paths(
        system::health_handler,
        system::client_config_handler,
        system::categories_handler,
        legacy::chat_groq,
        legacy::test_groq,
        legacy::upload_to_ipfs,
        wallets::connect_wallet,
        wallets::disconnect_wallet,
        wallets::get_wallet,
        wallets::wallet_stats,
        wallets::can_submit,
        wallets::chat_stats,
        wallets::referral_rewards,
        wallets::subscription,
        prompts::submit_prompt,
        prompts::list_prompts,
        prompts::get_prompt,
        prompts::attach_transaction,
        prompts::refresh_prompt,
        prompts::estimate_prompt,
        prompts::fetch_ipfs,
        chat::start_session,
        chat::get_session,
        chat::send_message,
        chat::session_rewards,
        chat::end_session,
        chat::estimate_rewards,
        contract::contract_stats,
        contract::get_onchain_prompt,
        contract::claim_referral_rewards,
        contract::pay_subscription,
        transactions::track_transaction,
        transactions::get_transaction,
        referrals::create_user,
        referrals::get_user,
        referrals::get_user_by_code,
        referrals::track_referral,
        referrals::get_referral,
        referrals::pay_bonus,
        referrals::referral_stats,
    ),
    components(schemas(crate::domain::Notification, crate::domain::NotificationKind)),
    tags(
        (name = "System", description = "Health and client configuration"),
        (name = "Legacy", description = "Original `/api/*` endpoints"),
        (name = "Wallets", description = "Wallet connection and account reads"),
        (name = "Prompts", description = "Prompt submissions and IPFS"),
        (name = "Chat", description = "Pool AI chat sessions and reward estimates"),
        (name = "Contract", description = "Contract statistics and write transactions"),
        (name = "Transactions", description = "Receipt tracking"),
        (name = "Referrals", description = "Referral bookkeeping"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_versioned_and_legacy_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/chat-groq"));
        assert!(paths.contains_key("/api/v1/chat/sessions/{id}/end"));
        assert!(paths.contains_key("/api/v1/referrals/stats/{address}"));
        assert!(paths.contains_key("/health"));
    }
}
