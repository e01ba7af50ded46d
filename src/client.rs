//! The client façade: one call per logical action, recovery included.
//!
//! [`TicketClient::execute`] owns the only retry loop in the single-action
//! path. Two independent budgets drive it: a stale transaction is rebuilt
//! from scratch under a fresh blockhash (new signature, so the old one can
//! never land twice), while a transport failure resubmits the identical
//! signed bytes, which the node deduplicates by signature. Everything else
//! is terminal and propagates unchanged.

use std::sync::Arc;
use std::time::Duration;

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::addresses::event_address;
use crate::assembler::{Assembler, FreshnessPolicy};
use crate::bulk::{BulkAction, BulkOrchestrator, BulkPolicy, BulkReport};
use crate::config::{Config, SubmitConfig};
use crate::error::{ClientError, ClientResult};
use crate::instructions::{self, AmendEventFields, InitEventFields, TicketAction};
use crate::metrics::metrics;
use crate::node::{LedgerNode, RpcNode};
use crate::state::Event;
use crate::submitter::Submitter;
use crate::wallet::Wallet;

/// Recovery budgets for one [`TicketClient::execute`] call.
#[derive(Debug, Clone)]
pub struct SubmitPolicy {
    /// How many times a stale transaction is rebuilt before giving up.
    pub max_stale_rebuilds: u32,
    /// How many times an unreachable node is retried before giving up.
    pub max_transport_retries: u32,
    /// Pause between transport retries.
    pub transport_retry_delay: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self {
            max_stale_rebuilds: 2,
            max_transport_retries: 3,
            transport_retry_delay: Duration::from_millis(500),
        }
    }
}

impl SubmitPolicy {
    pub fn from_config(config: &SubmitConfig) -> Self {
        Self {
            max_stale_rebuilds: config.max_stale_rebuilds,
            max_transport_retries: config.max_transport_retries,
            transport_retry_delay: Duration::from_millis(config.transport_retry_delay_ms),
        }
    }
}

/// High-level client over one wallet and one node.
#[derive(Clone)]
pub struct TicketClient {
    node: Arc<dyn LedgerNode>,
    wallet: Wallet,
    assembler: Assembler,
    submitter: Submitter,
    policy: SubmitPolicy,
    bulk_policy: BulkPolicy,
}

impl TicketClient {
    pub fn new(node: Arc<dyn LedgerNode>, wallet: Wallet) -> Self {
        Self::with_policies(
            node,
            wallet,
            FreshnessPolicy::default(),
            SubmitPolicy::default(),
            BulkPolicy::default(),
        )
    }

    pub fn with_policies(
        node: Arc<dyn LedgerNode>,
        wallet: Wallet,
        freshness: FreshnessPolicy,
        submit: SubmitPolicy,
        bulk: BulkPolicy,
    ) -> Self {
        Self {
            assembler: Assembler::with_policy(node.clone(), freshness),
            submitter: Submitter::new(node.clone()),
            node,
            wallet,
            policy: submit,
            bulk_policy: bulk,
        }
    }

    /// Wire up a client from file-based configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let node = Arc::new(RpcNode::from_config(&config.rpc)?);
        let wallet = Wallet::from_file(&config.wallet.keypair_path)?;
        Ok(Self::with_policies(
            node,
            wallet,
            FreshnessPolicy::from_config(&config.assembler),
            SubmitPolicy::from_config(&config.submit),
            BulkPolicy::from_config(&config.bulk),
        ))
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn node(&self) -> &Arc<dyn LedgerNode> {
        &self.node
    }

    pub fn bulk_policy(&self) -> &BulkPolicy {
        &self.bulk_policy
    }

    /// Run one action end to end: build, assemble fresh, sign, submit,
    /// and recover within the policy budgets.
    pub async fn execute(&self, action: &TicketAction) -> ClientResult<Signature> {
        let instruction = instructions::build(action)?;
        let fee_payer = self.wallet.pubkey();

        let mut stale_rebuilds = 0u32;
        let mut transport_retries = 0u32;

        'rebuild: loop {
            let envelope = self
                .assembler
                .assemble(&fee_payer, std::slice::from_ref(&instruction))
                .await?;
            loop {
                match self.submitter.submit(&envelope, self.wallet.keypair()).await {
                    Ok(signature) => {
                        info!(
                            method = action.method_name(),
                            %signature,
                            "action accepted by node"
                        );
                        return Ok(signature);
                    }
                    Err(ClientError::StaleTransaction)
                        if stale_rebuilds < self.policy.max_stale_rebuilds =>
                    {
                        stale_rebuilds += 1;
                        metrics().stale_rebuilds.inc();
                        warn!(
                            method = action.method_name(),
                            rebuild = stale_rebuilds,
                            "transaction expired in flight, rebuilding with a fresh blockhash"
                        );
                        continue 'rebuild;
                    }
                    Err(ClientError::Unreachable(reason))
                        if transport_retries < self.policy.max_transport_retries =>
                    {
                        transport_retries += 1;
                        metrics().transport_retries.inc();
                        warn!(
                            method = action.method_name(),
                            retry = transport_retries,
                            %reason,
                            "node unreachable, resubmitting the same transaction"
                        );
                        sleep(self.policy.transport_retry_delay).await;
                    }
                    Err(err) => {
                        metrics().submissions_failed.inc();
                        return Err(err);
                    }
                }
            }
        }
    }

    /// Create the event owned by this wallet.
    pub async fn init_event(&self, fields: InitEventFields) -> ClientResult<Signature> {
        self.execute(&TicketAction::InitEvent {
            authority: self.wallet.pubkey(),
            fields,
        })
        .await
    }

    /// Amend mutable fields of this wallet's event.
    pub async fn amend_event(&self, fields: AmendEventFields) -> ClientResult<Signature> {
        self.execute(&TicketAction::AmendEvent {
            authority: self.wallet.pubkey(),
            fields,
        })
        .await
    }

    /// Open this wallet's event for purchases.
    pub async fn start_sale(&self) -> ClientResult<Signature> {
        self.execute(&TicketAction::StartSale {
            authority: self.wallet.pubkey(),
        })
        .await
    }

    /// Buy one ticket for `event_authority`'s event; this wallet pays.
    pub async fn buy_ticket(&self, event_authority: &Pubkey) -> ClientResult<Signature> {
        self.execute(&TicketAction::BuyTicket {
            authority: *event_authority,
            buyer: self.wallet.pubkey(),
        })
        .await
    }

    /// Refund `buyer`'s ticket from this wallet's event.
    pub async fn refund_ticket(&self, buyer: &Pubkey) -> ClientResult<Signature> {
        self.execute(&TicketAction::RefundTicket {
            authority: self.wallet.pubkey(),
            buyer: *buyer,
        })
        .await
    }

    /// Burn this wallet's own ticket for `event_authority`'s event.
    pub async fn burn_ticket(&self, event_authority: &Pubkey) -> ClientResult<Signature> {
        self.execute(&TicketAction::BurnTicket {
            authority: *event_authority,
            holder: self.wallet.pubkey(),
        })
        .await
    }

    /// As the organizer, revoke the ticket held by `target_wallet`.
    pub async fn delegate_burn(&self, target_wallet: &Pubkey) -> ClientResult<Signature> {
        self.execute(&TicketAction::DelegateBurn {
            authority: self.wallet.pubkey(),
            target_wallet: *target_wallet,
        })
        .await
    }

    /// Withdraw proceeds from this wallet's event vault.
    pub async fn withdraw_funds(&self) -> ClientResult<Signature> {
        self.execute(&TicketAction::WithdrawFunds {
            authority: self.wallet.pubkey(),
        })
        .await
    }

    /// Cancel this wallet's event.
    pub async fn cancel_event(&self) -> ClientResult<Signature> {
        self.execute(&TicketAction::CancelEvent {
            authority: self.wallet.pubkey(),
        })
        .await
    }

    /// Close out this wallet's event after it has taken place.
    pub async fn end_event(&self) -> ClientResult<Signature> {
        self.execute(&TicketAction::EndEvent {
            authority: self.wallet.pubkey(),
        })
        .await
    }

    /// Read and decode the event account for `authority`.
    pub async fn fetch_event(&self, authority: &Pubkey) -> ClientResult<Event> {
        let (event, _) = event_address(authority)?;
        let data = self.node.account_data(&event).await?;
        Event::try_deserialize(&data)
    }

    /// Refund every current ticket holder of this wallet's event.
    pub async fn refund_all(&self) -> ClientResult<BulkReport> {
        BulkOrchestrator::new(self.clone(), self.bulk_policy.clone())
            .run(BulkAction::Refund)
            .await
    }

    /// Revoke every outstanding ticket of this wallet's event.
    pub async fn revoke_all(&self) -> ClientResult<BulkReport> {
        BulkOrchestrator::new(self.clone(), self.bulk_policy.clone())
            .run(BulkAction::Revoke)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EVENT_DISCRIMINATOR;
    use crate::test_utils::MockNode;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;

    #[tokio::test]
    async fn test_execute_happy_path_is_one_assemble_one_submit() {
        let node = Arc::new(MockNode::new());
        let client = TicketClient::new(node.clone(), Wallet::from_keypair(Keypair::new()));

        let signature = client.start_sale().await.unwrap();

        assert_ne!(signature, Signature::default());
        assert_eq!(node.blockhash_calls(), 1);
        assert_eq!(node.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_event_decodes_the_account() {
        let organizer = Keypair::new();
        let (event_pda, bump) = event_address(&organizer.pubkey()).unwrap();
        let stored = Event {
            bump,
            authority: organizer.pubkey(),
            vault: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            allow_purchase: true,
            event_date: 1_767_225_600,
            ticket_price: 3_300_000_000,
            refund_period: 604_800,
            num_tickets: 100,
        };
        let mut data = EVENT_DISCRIMINATOR.to_vec();
        data.extend(borsh::to_vec(&stored).unwrap());

        let node = Arc::new(MockNode::new().with_account(event_pda, data));
        let client = TicketClient::new(node, Wallet::from_keypair(Keypair::new()));

        let fetched = client.fetch_event(&organizer.pubkey()).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_fetch_event_rejects_foreign_account_data() {
        let organizer = Keypair::new();
        let (event_pda, _) = event_address(&organizer.pubkey()).unwrap();
        // A token account's 165 bytes carry no event discriminator.
        let node = Arc::new(MockNode::new().with_account(event_pda, vec![0u8; 165]));
        let client = TicketClient::new(node, Wallet::from_keypair(Keypair::new()));

        let err = client.fetch_event(&organizer.pubkey()).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedAccount(_)));
    }
}
