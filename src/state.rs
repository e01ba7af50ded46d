//! On-chain account layouts the client reads back.
//!
//! The Event account is the program's per-event state; its discriminator and
//! field order are fixed by the deployment. Holder token accounts are plain
//! SPL token accounts and are only ever inspected at two fixed offsets, which
//! is exactly what the bulk discovery filter relies on.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::constants::{TOKEN_ACCOUNT_OWNER_OFFSET, TOKEN_ACCOUNT_SIZE};
use crate::error::{ClientError, ClientResult};

/// Discriminator prefix of the Event account, `sha256("account:Event")[..8]`.
pub const EVENT_DISCRIMINATOR: [u8; 8] = [125, 192, 125, 158, 9, 115, 152, 233];

/// Per-event state as stored by the program.
///
/// Field order is the deployed borsh layout; reordering breaks decoding.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub bump: u8,
    pub authority: Pubkey,
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub allow_purchase: bool,
    pub event_date: i64,
    pub ticket_price: u64,
    pub refund_period: i64,
    pub num_tickets: u32,
}

impl Event {
    /// Decode an Event from raw account bytes, discriminator included.
    pub fn try_deserialize(data: &[u8]) -> ClientResult<Self> {
        if data.len() < 8 {
            return Err(ClientError::malformed_account(format!(
                "event account too short: {} bytes",
                data.len()
            )));
        }
        if data[..8] != EVENT_DISCRIMINATOR {
            return Err(ClientError::malformed_account(
                "event account discriminator mismatch",
            ));
        }
        let mut payload = &data[8..];
        Event::deserialize(&mut payload)
            .map_err(|e| ClientError::malformed_account(format!("event state decode: {e}")))
    }
}

/// Extract the owner wallet from a 165-byte token holder account.
pub fn token_account_owner(data: &[u8]) -> ClientResult<Pubkey> {
    if data.len() != TOKEN_ACCOUNT_SIZE {
        return Err(ClientError::malformed_account(format!(
            "token account has {} bytes, expected {}",
            data.len(),
            TOKEN_ACCOUNT_SIZE
        )));
    }
    let owner_bytes = &data[TOKEN_ACCOUNT_OWNER_OFFSET..TOKEN_ACCOUNT_OWNER_OFFSET + 32];
    Pubkey::try_from(owner_bytes)
        .map_err(|_| ClientError::malformed_account("token account owner is not 32 bytes"))
}
