//! Data Transfer Objects for REST request/response serialization.
//!
//! Wallet addresses arrive as strings and are validated in the handlers.
//! The legacy `/api/*` DTOs keep their camelCase field names.

pub mod chat_dto;
pub mod legacy_dto;
pub mod prompt_dto;
pub mod referral_dto;
pub mod transaction_dto;
pub mod wallet_dto;

pub use chat_dto::*;
pub use legacy_dto::*;
pub use prompt_dto::*;
pub use referral_dto::*;
pub use transaction_dto::*;
pub use wallet_dto::*;
