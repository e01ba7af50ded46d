//! The node boundary: every network interaction goes through [`LedgerNode`].
//!
//! Keeping the surface to four operations (blockhash fetch, transaction
//! submission, account read, token-account scan) lets the rest of the crate
//! run against a mock node in tests and keeps error classification in one
//! place. [`RpcNode`] is the production implementation over the nonblocking
//! JSON-RPC client.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use solana_client::{
    client_error::{ClientError as RpcClientError, ClientErrorKind},
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
    rpc_request::{RpcError, RpcResponseErrorData},
};
use solana_account_decoder::UiAccountEncoding;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::TransactionError, transaction::VersionedTransaction,
};
use tracing::debug;

use crate::config::RpcConfig;
use crate::constants::{TOKEN_ACCOUNT_MINT_OFFSET, TOKEN_ACCOUNT_SIZE};
use crate::error::{ClientError, ClientResult};

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// The operations the client needs from a node.
///
/// Implementations must be safe to share across tasks; the bulk orchestrator
/// clones one `Arc<dyn LedgerNode>` into every pipeline.
#[async_trait]
pub trait LedgerNode: Send + Sync {
    /// Fetch the current freshness token for transaction assembly.
    async fn latest_blockhash(&self) -> ClientResult<Hash>;

    /// Hand a signed transaction to the node. One call, one submission;
    /// callers own any retry decision.
    async fn submit_transaction(&self, tx: &VersionedTransaction) -> ClientResult<Signature>;

    /// Read the raw data of a single account.
    async fn account_data(&self, address: &Pubkey) -> ClientResult<Vec<u8>>;

    /// Scan the token program for accounts of the given mint, filtered
    /// node-side by account size and by the mint bytes at their known offset.
    async fn token_accounts_by_mint(
        &self,
        mint: &Pubkey,
    ) -> ClientResult<Vec<(Pubkey, Vec<u8>)>>;
}

/// Production [`LedgerNode`] backed by a single JSON-RPC endpoint.
pub struct RpcNode {
    client: RpcClient,
}

impl RpcNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self::new_with_timeout_and_commitment(url, DEFAULT_RPC_TIMEOUT, CommitmentConfig::confirmed())
    }

    pub fn new_with_timeout_and_commitment(
        url: impl Into<String>,
        timeout: Duration,
        commitment: CommitmentConfig,
    ) -> Self {
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url.into(), timeout, commitment),
        }
    }

    pub fn from_config(config: &RpcConfig) -> ClientResult<Self> {
        let commitment = CommitmentConfig::from_str(&config.commitment).map_err(|_| {
            ClientError::invalid_argument(format!(
                "unknown commitment level '{}'",
                config.commitment
            ))
        })?;
        Ok(Self::new_with_timeout_and_commitment(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            commitment,
        ))
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerNode for RpcNode {
    async fn latest_blockhash(&self) -> ClientResult<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(classify_rpc_error)
    }

    async fn submit_transaction(&self, tx: &VersionedTransaction) -> ClientResult<Signature> {
        let signature = self
            .client
            .send_transaction(tx)
            .await
            .map_err(classify_rpc_error)?;
        debug!(%signature, "transaction handed to node");
        Ok(signature)
    }

    async fn account_data(&self, address: &Pubkey) -> ClientResult<Vec<u8>> {
        self.client
            .get_account_data(address)
            .await
            .map_err(classify_rpc_error)
    }

    async fn token_accounts_by_mint(
        &self,
        mint: &Pubkey,
    ) -> ClientResult<Vec<(Pubkey, Vec<u8>)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(TOKEN_ACCOUNT_SIZE as u64),
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
                    TOKEN_ACCOUNT_MINT_OFFSET,
                    mint.to_bytes().to_vec(),
                )),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            ..Default::default()
        };
        let accounts = self
            .client
            .get_program_accounts_with_config(&spl_token::id(), config)
            .await
            .map_err(classify_rpc_error)?;
        debug!(mint = %mint, count = accounts.len(), "token account scan complete");
        Ok(accounts
            .into_iter()
            .map(|(address, account)| (address, account.data))
            .collect())
    }
}

/// Map a raw RPC client error onto the crate taxonomy.
///
/// Structured variants are matched first; the message scan at the bottom
/// catches endpoints that report staleness or connectivity problems only as
/// text.
pub(crate) fn classify_rpc_error(err: RpcClientError) -> ClientError {
    match &err.kind {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
            return ClientError::unreachable(err.to_string());
        }
        ClientErrorKind::SigningError(e) => return ClientError::Signing(e.to_string()),
        ClientErrorKind::TransactionError(TransactionError::BlockhashNotFound) => {
            return ClientError::StaleTransaction;
        }
        ClientErrorKind::TransactionError(te) => return ClientError::rejected(te.to_string()),
        ClientErrorKind::RpcError(RpcError::RpcResponseError {
            data: RpcResponseErrorData::SendTransactionPreflightFailure(result),
            ..
        }) if result.err == Some(TransactionError::BlockhashNotFound) => {
            return ClientError::StaleTransaction;
        }
        _ => {}
    }

    let text = err.to_string();
    let lowered = text.to_lowercase();
    if lowered.contains("blockhash not found")
        || lowered.contains("block height exceeded")
        || lowered.contains("transaction expired")
    {
        ClientError::StaleTransaction
    } else if lowered.contains("connection")
        || lowered.contains("timed out")
        || lowered.contains("timeout")
        || lowered.contains("dns")
    {
        ClientError::unreachable(text)
    } else {
        ClientError::rejected(text)
    }
}
