//! Service layer: business logic orchestration.
//!
//! Services coordinate the domain stores and the outbound clients, and
//! emit notifications through the [`super::domain::EventBus`].

pub mod chat_service;
pub mod contract_monitor;
pub mod prompt_service;
pub mod referral_service;
pub mod wallet_service;

pub use chat_service::ChatService;
pub use contract_monitor::{ContractMonitor, PollIntervals};
pub use prompt_service::PromptService;
pub use referral_service::ReferralService;
pub use wallet_service::WalletService;
