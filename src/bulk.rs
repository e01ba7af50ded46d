//! Bulk operations across every current ticket holder of an event.
//!
//! A run is scan-then-fan-out: one node-side scan discovers the holders,
//! then each holder gets an isolated pipeline (build, assemble, sign,
//! submit, with the client's usual recovery) under a shared concurrency
//! limit and a per-pipeline deadline. Pipelines never abort each other;
//! the run always joins every spawned task and reports per-holder
//! outcomes. Only a failed scan aborts the run as a whole.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::addresses::{event_address, mint_address};
use crate::client::TicketClient;
use crate::config::BulkConfig;
use crate::error::{ClientError, ClientResult};
use crate::instructions::TicketAction;
use crate::metrics::{metrics, Timer};
use crate::observability::CorrelationId;
use crate::state::token_account_owner;

/// What to do with each discovered holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Return the ticket price to the holder and burn the ticket.
    Refund,
    /// Burn the ticket without compensation.
    Revoke,
}

impl BulkAction {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::Revoke => "revoke",
        }
    }
}

/// One holder's failed pipeline.
///
/// `holder` is the holder wallet, except for token accounts whose owner
/// could not be read, where it is the token account address itself.
#[derive(Debug)]
pub struct BulkFailure {
    pub holder: Pubkey,
    pub error: ClientError,
}

/// The complete outcome of one bulk run.
#[derive(Debug)]
pub struct BulkReport {
    pub correlation_id: CorrelationId,
    pub confirmed: Vec<Signature>,
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.confirmed.len() + self.failed.len()
    }
}

/// Concurrency and deadline limits for a bulk run.
#[derive(Debug, Clone)]
pub struct BulkPolicy {
    /// Holder pipelines allowed in flight at once.
    pub max_concurrency: usize,
    /// Wall-clock budget for a single pipeline, recovery included.
    pub pipeline_deadline: Duration,
}

impl Default for BulkPolicy {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            pipeline_deadline: Duration::from_secs(30),
        }
    }
}

impl BulkPolicy {
    pub fn from_config(config: &BulkConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            pipeline_deadline: Duration::from_secs(config.pipeline_deadline_secs),
        }
    }
}

/// Drives one bulk action over all holders of the client wallet's event.
pub struct BulkOrchestrator {
    client: TicketClient,
    policy: BulkPolicy,
}

impl BulkOrchestrator {
    pub fn new(client: TicketClient, policy: BulkPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn run(&self, action: BulkAction) -> ClientResult<BulkReport> {
        let correlation_id = CorrelationId::new();
        let authority = self.client.wallet().pubkey();
        let (event, _) = event_address(&authority)?;
        let (mint, _) = mint_address(&event)?;

        metrics().bulk_runs_total.inc();
        info!(
            correlation_id = %correlation_id,
            action = action.describe(),
            %event,
            %mint,
            "bulk operation started"
        );

        let accounts = self.client.node().token_accounts_by_mint(&mint).await?;

        let mut holders = Vec::with_capacity(accounts.len());
        let mut failed: Vec<BulkFailure> = Vec::new();
        for (address, data) in &accounts {
            match token_account_owner(data) {
                Ok(owner) => holders.push(owner),
                Err(error) => {
                    warn!(
                        correlation_id = %correlation_id,
                        account = %address,
                        %error,
                        "token account unreadable, recording as failed"
                    );
                    failed.push(BulkFailure {
                        holder: *address,
                        error,
                    });
                }
            }
        }
        metrics().bulk_holders_discovered.inc_by(holders.len() as u64);
        info!(
            correlation_id = %correlation_id,
            holders = holders.len(),
            "holder scan complete"
        );

        let semaphore = Arc::new(Semaphore::new(self.policy.max_concurrency));
        let mut handles = Vec::with_capacity(holders.len());
        for holder in holders {
            let client = self.client.clone();
            let semaphore = semaphore.clone();
            let deadline = self.policy.pipeline_deadline;
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| ClientError::internal("pipeline semaphore closed"))?;
                metrics().active_pipelines.inc();
                let timer = Timer::new();
                let outcome = match timeout(deadline, run_pipeline(&client, action, &holder)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ClientError::Timeout {
                        secs: deadline.as_secs(),
                    }),
                };
                timer.observe_duration(&metrics().pipeline_latency);
                metrics().active_pipelines.dec();
                outcome
            });
            handles.push((holder, handle));
        }

        // Join everything that was spawned; one outcome never decides another.
        let mut confirmed = Vec::new();
        let mut completions: FuturesUnordered<_> = handles
            .into_iter()
            .map(|(holder, handle)| async move { (holder, handle.await) })
            .collect();
        while let Some((holder, joined)) = completions.next().await {
            match joined {
                Ok(Ok(signature)) => confirmed.push(signature),
                Ok(Err(error)) => {
                    metrics().bulk_pipeline_failures.inc();
                    warn!(
                        correlation_id = %correlation_id,
                        %holder,
                        %error,
                        "holder pipeline failed"
                    );
                    failed.push(BulkFailure { holder, error });
                }
                Err(join_error) => {
                    metrics().bulk_pipeline_failures.inc();
                    failed.push(BulkFailure {
                        holder,
                        error: ClientError::internal(format!(
                            "pipeline task aborted: {join_error}"
                        )),
                    });
                }
            }
        }

        let report = BulkReport {
            correlation_id: correlation_id.clone(),
            confirmed,
            failed,
        };
        info!(
            correlation_id = %correlation_id,
            confirmed = report.confirmed.len(),
            failed = report.failed.len(),
            "bulk operation complete"
        );
        Ok(report)
    }
}

async fn run_pipeline(
    client: &TicketClient,
    action: BulkAction,
    holder: &Pubkey,
) -> ClientResult<Signature> {
    let authority = client.wallet().pubkey();
    let ticket_action = match action {
        BulkAction::Refund => TicketAction::RefundTicket {
            authority,
            buyer: *holder,
        },
        BulkAction::Revoke => TicketAction::DelegateBurn {
            authority,
            target_wallet: *holder,
        },
    };
    client.execute(&ticket_action).await
}
