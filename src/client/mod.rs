//! Outbound clients: the LLM provider, the IPFS pinning service, and the
//! PromptPool contract over JSON-RPC.

pub mod abi;
pub mod chain;
pub mod groq;
pub mod pinata;

pub use chain::{ChainClient, ChainError, UnsignedTx};
pub use groq::{GroqClient, LlmError};
pub use pinata::{PinError, PinResult, PinataClient, PromptPin};
