//! Address derivation for the ChainTicket program.
//!
//! Pure, deterministic bump-searched derivation: seeds are hashed together
//! with a trailing bump byte (searched downward from 255), the deriving
//! program id, and the PDA domain marker; the first candidate that is not a
//! valid curve point wins. Seed bytes, ordering, and the deriving program are
//! all part of the deployed interface, so every helper here is a thin, named
//! wrapper over one fixed seed tuple.

use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use crate::constants::{
    CHAIN_TICKET_PROGRAM_ID, EVENT_SEED, METADATA_SEED, MINT_SEED, MPL_TOKEN_METADATA_PROGRAM_ID,
    VAULT_SEED,
};
use crate::error::{ClientError, ClientResult};

/// Derive a program address for an ordered seed tuple.
///
/// Fails with [`ClientError::DerivationExhausted`] if no bump in 0-255 yields
/// an off-curve candidate. That outcome is astronomically unlikely but it is
/// checked, not assumed.
pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> ClientResult<(Pubkey, u8)> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or(ClientError::DerivationExhausted {
        program: *program_id,
    })
}

/// Event state account for an organizer wallet.
pub fn event_address(authority: &Pubkey) -> ClientResult<(Pubkey, u8)> {
    derive_address(&[EVENT_SEED, authority.as_ref()], &CHAIN_TICKET_PROGRAM_ID)
}

/// Escrow vault for an event.
pub fn vault_address(event: &Pubkey) -> ClientResult<(Pubkey, u8)> {
    derive_address(&[VAULT_SEED, event.as_ref()], &CHAIN_TICKET_PROGRAM_ID)
}

/// Ticket mint for an event.
pub fn mint_address(event: &Pubkey) -> ClientResult<(Pubkey, u8)> {
    derive_address(&[MINT_SEED, event.as_ref()], &CHAIN_TICKET_PROGRAM_ID)
}

/// Metadata account for a ticket mint, derived under the metadata program.
pub fn metadata_address(mint: &Pubkey) -> ClientResult<(Pubkey, u8)> {
    derive_address(
        &[
            METADATA_SEED,
            MPL_TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &MPL_TOKEN_METADATA_PROGRAM_ID,
    )
}

/// Associated token account holding a wallet's tickets for one mint.
pub fn holder_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(wallet, mint)
}

/// The full derived account set for one event, resolved from the organizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAccounts {
    pub authority: Pubkey,
    pub event: Pubkey,
    pub event_bump: u8,
    pub vault: Pubkey,
    pub mint: Pubkey,
    pub metadata: Pubkey,
}

/// Resolve event, vault, mint, and metadata addresses from the organizer.
pub fn resolve_event_accounts(authority: &Pubkey) -> ClientResult<EventAccounts> {
    let (event, event_bump) = event_address(authority)?;
    let (vault, _) = vault_address(&event)?;
    let (mint, _) = mint_address(&event)?;
    let (metadata, _) = metadata_address(&mint)?;
    Ok(EventAccounts {
        authority: *authority,
        event,
        event_bump,
        vault,
        mint,
        metadata,
    })
}
