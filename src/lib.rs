//! ChainTicket - Solana client for the on-chain ticketing program
//!
//! This library turns logical ticketing actions (create an event, sell,
//! refund, revoke) into signed transactions against the deployed program.
//! The layering is strict: [`addresses`] derives the account set,
//! [`instructions`] builds program instructions, [`assembler`] compiles them
//! under a fresh blockhash, [`submitter`] signs and submits exactly once,
//! [`client`] adds bounded recovery, and [`bulk`] fans a single action out
//! across every current ticket holder. All network traffic flows through
//! the [`node::LedgerNode`] trait so every layer can be tested against a
//! scripted in-memory node.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

pub mod addresses;
pub mod assembler;
pub mod bulk;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod metrics;
pub mod node;
pub mod observability;
pub mod state;
pub mod submitter;
pub mod test_utils;
pub mod wallet;

// Re-export commonly used types
pub use solana_sdk::{message::VersionedMessage, pubkey::Pubkey, signature::Signature};

pub use assembler::{Assembler, FreshnessPolicy, TransactionEnvelope};
pub use bulk::{BulkAction, BulkFailure, BulkOrchestrator, BulkPolicy, BulkReport};
pub use client::{SubmitPolicy, TicketClient};
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use instructions::{AmendEventFields, InitEventFields, TicketAction};
pub use node::{LedgerNode, RpcNode};
pub use state::Event;
pub use wallet::Wallet;
