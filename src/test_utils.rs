//! Test Utilities Module
//!
//! This module provides a scriptable in-memory [`LedgerNode`] so the
//! assembly, submission, and bulk paths can be tested deterministically
//! without a network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Signature, transaction::VersionedTransaction,
};

use crate::addresses::holder_token_address;
use crate::constants::{TOKEN_ACCOUNT_MINT_OFFSET, TOKEN_ACCOUNT_OWNER_OFFSET, TOKEN_ACCOUNT_SIZE};
use crate::error::{ClientError, ClientResult};
use crate::node::LedgerNode;

/// How an injected failure should present itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    /// The node reports the transaction's blockhash as expired.
    Stale,
    /// The node cannot be reached at all.
    Unreachable,
    /// The node rejects the transaction outright.
    Rejected,
    /// The call never completes; only a caller-side deadline ends it.
    Hang,
}

#[derive(Debug, Clone, Copy)]
enum BlockhashFailures {
    None,
    Always,
    Count(u32),
}

struct MockState {
    blockhash: Hash,
    blockhash_failures: BlockhashFailures,
    submit_failures: VecDeque<FailKind>,
    fail_holders: HashMap<Pubkey, FailKind>,
    holders: Vec<(Pubkey, u64)>,
    raw_token_accounts: Vec<(Pubkey, Vec<u8>)>,
    accounts: HashMap<Pubkey, Vec<u8>>,
    scan_failure: bool,
    submitted: Vec<VersionedTransaction>,
}

/// Scriptable [`LedgerNode`] with per-call failure injection and counters.
pub struct MockNode {
    state: Mutex<MockState>,
    blockhash_calls: AtomicU32,
    submit_calls: AtomicU32,
}

impl MockNode {
    /// A node where everything succeeds.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                blockhash: Hash::new_unique(),
                blockhash_failures: BlockhashFailures::None,
                submit_failures: VecDeque::new(),
                fail_holders: HashMap::new(),
                holders: Vec::new(),
                raw_token_accounts: Vec::new(),
                accounts: HashMap::new(),
                scan_failure: false,
                submitted: Vec::new(),
            }),
            blockhash_calls: AtomicU32::new(0),
            submit_calls: AtomicU32::new(0),
        }
    }

    /// A node whose blockhash fetch never succeeds.
    pub fn failing_blockhash() -> Self {
        let node = Self::new();
        node.state.lock().blockhash_failures = BlockhashFailures::Always;
        node
    }

    /// A node whose first `count` blockhash fetches fail, then succeed.
    pub fn with_blockhash_failures(count: u32) -> Self {
        let node = Self::new();
        node.state.lock().blockhash_failures = BlockhashFailures::Count(count);
        node
    }

    /// Add a ticket holder the scan will discover.
    pub fn with_holder(self, owner: Pubkey) -> Self {
        self.state.lock().holders.push((owner, 1));
        self
    }

    /// Add a holder whose submissions always fail as unreachable.
    pub fn with_unreachable_holder(self, owner: Pubkey) -> Self {
        self.state
            .lock()
            .fail_holders
            .insert(owner, FailKind::Unreachable);
        self.with_holder(owner)
    }

    /// Add a holder whose submissions the node always rejects.
    pub fn with_rejected_holder(self, owner: Pubkey) -> Self {
        self.state
            .lock()
            .fail_holders
            .insert(owner, FailKind::Rejected);
        self.with_holder(owner)
    }

    /// Add a holder whose submissions never complete.
    pub fn with_hanging_holder(self, owner: Pubkey) -> Self {
        self.state.lock().fail_holders.insert(owner, FailKind::Hang);
        self.with_holder(owner)
    }

    /// Add a token account that is returned by the scan byte-for-byte.
    pub fn with_raw_token_account(self, address: Pubkey, data: Vec<u8>) -> Self {
        self.state.lock().raw_token_accounts.push((address, data));
        self
    }

    /// Store account data for [`LedgerNode::account_data`].
    pub fn with_account(self, address: Pubkey, data: Vec<u8>) -> Self {
        self.state.lock().accounts.insert(address, data);
        self
    }

    /// Make the holder scan itself fail.
    pub fn with_scan_failure(self) -> Self {
        self.state.lock().scan_failure = true;
        self
    }

    /// Fail the next `count` submissions with `kind`, then succeed.
    pub fn fail_next_submissions(&self, kind: FailKind, count: u32) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state.submit_failures.push_back(kind);
        }
    }

    /// Script the outcomes of upcoming submissions one call at a time.
    pub fn fail_submission_sequence(&self, kinds: impl IntoIterator<Item = FailKind>) {
        self.state.lock().submit_failures.extend(kinds);
    }

    /// The hash the next successful blockhash fetch will serve.
    pub fn current_blockhash(&self) -> Hash {
        self.state.lock().blockhash
    }

    /// Every transaction the node has seen, in submission order.
    pub fn submitted(&self) -> Vec<VersionedTransaction> {
        self.state.lock().submitted.clone()
    }

    pub fn blockhash_calls(&self) -> u32 {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    fn fail_kind_to_error(kind: FailKind) -> ClientError {
        match kind {
            FailKind::Stale => ClientError::StaleTransaction,
            FailKind::Unreachable => ClientError::unreachable("mock: connection refused"),
            FailKind::Rejected => ClientError::rejected("mock: custom program error"),
            FailKind::Hang => ClientError::internal("mock: hang cannot be rendered as an error"),
        }
    }

    fn synthesize_token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
        let mut data = vec![0u8; TOKEN_ACCOUNT_SIZE];
        data[TOKEN_ACCOUNT_MINT_OFFSET..TOKEN_ACCOUNT_MINT_OFFSET + 32]
            .copy_from_slice(mint.as_ref());
        data[TOKEN_ACCOUNT_OWNER_OFFSET..TOKEN_ACCOUNT_OWNER_OFFSET + 32]
            .copy_from_slice(owner.as_ref());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        // Account state byte: initialized.
        data[108] = 1;
        data
    }
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerNode for MockNode {
    async fn latest_blockhash(&self) -> ClientResult<Hash> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        match state.blockhash_failures {
            BlockhashFailures::Always => {
                return Err(ClientError::unreachable("mock: blockhash outage"));
            }
            BlockhashFailures::Count(remaining) if remaining > 0 => {
                state.blockhash_failures = BlockhashFailures::Count(remaining - 1);
                return Err(ClientError::unreachable("mock: blockhash outage"));
            }
            _ => {}
        }
        // Serve the advertised hash, then rotate so consecutive fetches
        // observe distinct hashes.
        let served = state.blockhash;
        state.blockhash = Hash::new_unique();
        Ok(served)
    }

    async fn submit_transaction(&self, tx: &VersionedTransaction) -> ClientResult<Signature> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        // Decide under the lock, act after releasing it.
        let decision = {
            let mut state = self.state.lock();
            state.submitted.push(tx.clone());
            let holder_kind = tx
                .message
                .static_account_keys()
                .iter()
                .find_map(|key| state.fail_holders.get(key).copied());
            match holder_kind {
                Some(kind) => Some(kind),
                None => state.submit_failures.pop_front(),
            }
        };

        match decision {
            Some(FailKind::Hang) => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            Some(kind) => Err(Self::fail_kind_to_error(kind)),
            None => Ok(tx.signatures.first().copied().unwrap_or_default()),
        }
    }

    async fn account_data(&self, address: &Pubkey) -> ClientResult<Vec<u8>> {
        self.state
            .lock()
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| ClientError::rejected(format!("AccountNotFound: pubkey={address}")))
    }

    async fn token_accounts_by_mint(
        &self,
        mint: &Pubkey,
    ) -> ClientResult<Vec<(Pubkey, Vec<u8>)>> {
        let state = self.state.lock();
        if state.scan_failure {
            return Err(ClientError::unreachable("mock: scan outage"));
        }
        let mut accounts: Vec<(Pubkey, Vec<u8>)> = state
            .holders
            .iter()
            .map(|(owner, amount)| {
                (
                    holder_token_address(owner, mint),
                    Self::synthesize_token_account(mint, owner, *amount),
                )
            })
            .collect();
        accounts.extend(state.raw_token_accounts.iter().cloned());
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::token_account_owner;

    #[tokio::test]
    async fn test_scan_synthesizes_parseable_token_accounts() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let node = MockNode::new().with_holder(owner);

        let accounts = node.token_accounts_by_mint(&mint).await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0, holder_token_address(&owner, &mint));
        assert_eq!(token_account_owner(&accounts[0].1).unwrap(), owner);
    }

    #[tokio::test]
    async fn test_blockhash_failure_budget_counts_down() {
        let node = MockNode::with_blockhash_failures(2);
        assert!(node.latest_blockhash().await.is_err());
        assert!(node.latest_blockhash().await.is_err());
        assert!(node.latest_blockhash().await.is_ok());
        assert_eq!(node.blockhash_calls(), 3);
    }

    #[tokio::test]
    async fn test_blockhash_rotates_after_each_fetch() {
        let node = MockNode::new();
        let first = node.latest_blockhash().await.unwrap();
        let second = node.latest_blockhash().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_submission_failure_budget_counts_down() {
        let node = MockNode::new();
        node.fail_next_submissions(FailKind::Stale, 1);

        let tx = VersionedTransaction::default();
        assert!(matches!(
            node.submit_transaction(&tx).await,
            Err(ClientError::StaleTransaction)
        ));
        assert!(node.submit_transaction(&tx).await.is_ok());
        assert_eq!(node.submit_calls(), 2);
    }
}
