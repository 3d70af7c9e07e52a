//! REST endpoint handlers organized by resource.

pub mod chat;
pub mod contract;
pub mod legacy;
pub mod prompts;
pub mod referrals;
pub mod system;
pub mod transactions;
pub mod wallets;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(wallets::routes())
        .merge(prompts::routes())
        .merge(chat::routes())
        .merge(contract::routes())
        .merge(transactions::routes())
        .merge(referrals::routes())
}
