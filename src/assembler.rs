//! Transaction assembly: fresh blockhash acquisition plus message compilation.
//!
//! The freshness fetch is a small explicit state machine rather than a bare
//! loop so the retry bound is checkable at a glance: `Fetching` either
//! succeeds, moves to `Retrying` while attempts remain, or moves to `Failed`.
//! The delay sits on the `Retrying` edge only, so a run that exhausts its
//! attempts never sleeps after the final failure.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::AssemblerConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics::{metrics, Timer};
use crate::node::LedgerNode;

/// How persistently to chase a freshness token before giving up.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    /// Total fetch attempts, first try included.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl FreshnessPolicy {
    pub fn from_config(config: &AssemblerConfig) -> Self {
        Self {
            max_attempts: config.max_blockhash_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// A compiled, unsigned transaction together with the inputs that shaped it.
///
/// The blockhash is carried alongside the message so callers can reason about
/// freshness without digging into the message header.
#[derive(Debug, Clone)]
pub struct TransactionEnvelope {
    pub fee_payer: Pubkey,
    pub blockhash: Hash,
    pub message: VersionedMessage,
}

enum FetchState {
    Fetching { attempt: u32 },
    Retrying { attempt: u32 },
    Failed { attempts: u32, last_error: String },
}

/// Compiles instructions into submittable envelopes.
#[derive(Clone)]
pub struct Assembler {
    node: Arc<dyn LedgerNode>,
    policy: FreshnessPolicy,
}

impl Assembler {
    pub fn new(node: Arc<dyn LedgerNode>) -> Self {
        Self::with_policy(node, FreshnessPolicy::default())
    }

    pub fn with_policy(node: Arc<dyn LedgerNode>, policy: FreshnessPolicy) -> Self {
        Self { node, policy }
    }

    /// Compile `instructions` into a v0 envelope under a fresh blockhash.
    pub async fn assemble(
        &self,
        fee_payer: &Pubkey,
        instructions: &[Instruction],
    ) -> ClientResult<TransactionEnvelope> {
        let timer = Timer::new();
        let blockhash = self.fresh_blockhash().await?;

        let message = v0::Message::try_compile(fee_payer, instructions, &[], blockhash)
            .map_err(|e| ClientError::invalid_argument(format!("message compile: {e}")))?;

        timer.observe_duration(&metrics().assemble_latency);
        debug!(%blockhash, fee_payer = %fee_payer, "transaction assembled");

        Ok(TransactionEnvelope {
            fee_payer: *fee_payer,
            blockhash,
            message: VersionedMessage::V0(message),
        })
    }

    async fn fresh_blockhash(&self) -> ClientResult<Hash> {
        let mut state = FetchState::Fetching { attempt: 1 };
        loop {
            state = match state {
                FetchState::Fetching { attempt } => match self.node.latest_blockhash().await {
                    Ok(hash) => return Ok(hash),
                    Err(err) if attempt < self.policy.max_attempts => {
                        warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            error = %err,
                            "freshness token fetch failed, retrying"
                        );
                        metrics().blockhash_fetch_retries.inc();
                        FetchState::Retrying { attempt }
                    }
                    Err(err) => FetchState::Failed {
                        attempts: attempt,
                        last_error: err.to_string(),
                    },
                },
                FetchState::Retrying { attempt } => {
                    sleep(self.policy.retry_delay).await;
                    FetchState::Fetching {
                        attempt: attempt + 1,
                    }
                }
                FetchState::Failed {
                    attempts,
                    last_error,
                } => {
                    return Err(ClientError::FreshnessUnavailable {
                        attempts,
                        last_error,
                    });
                }
            };
        }
    }
}
