//! # promptpool-gateway
//!
//! Server-side gateway for PromptPool, a platform that pays users in POOL
//! tokens for AI prompts and chat conversations.
//!
//! The gateway proxies chat turns to an OpenAI-compatible LLM, pins
//! prompts and chat transcripts to IPFS, reads the PromptPool contract on
//! Polygon over JSON-RPC, builds the unsigned write transactions wallets
//! sign, tracks their receipts, and keeps referral bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Wallet / Prompt / Chat / Referral services (service/)
//!     ├── ContractMonitor pollers (service/)
//!     ├── EventBus, caches, reward estimator (domain/)
//!     │
//!     ├── Groq, Pinata, JSON-RPC clients (client/)
//!     │
//!     └── PostgreSQL Persistence
//! ```

pub mod api;
pub mod app_state;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
