//! Seed registry and fixed on-chain identities for the ChainTicket program.
//!
//! Everything in this module is part of the deployed program's external
//! contract: seed labels feed the address deriver, the program ids anchor
//! derivation and instruction targeting, and the byte-layout facts drive the
//! holder scan filter and account decoding. None of these values can change
//! without breaking compatibility with the deployment.

use solana_sdk::pubkey::Pubkey;

/// Seed label for an event state account, paired with the organizer wallet.
pub const EVENT_SEED: &[u8] = b"event";

/// Seed label for an event's escrow vault, paired with the event address.
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed label for an event's ticket mint, paired with the event address.
pub const MINT_SEED: &[u8] = b"mint";

/// Seed label for the mint's metadata account under the metadata program.
pub const METADATA_SEED: &[u8] = b"metadata";

/// The deployed ChainTicket program.
pub const CHAIN_TICKET_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("4uXFs66eEYQ8u51coqaypjF4wtRL4LQTML2kA5zMXUy4");

/// Metaplex Token Metadata program, owner of ticket-mint metadata accounts.
pub const MPL_TOKEN_METADATA_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Platform fee wallet hard-wired into `WithdrawFunds` and `CancelEvent`.
pub const PLATFORM_OWNER: Pubkey =
    Pubkey::from_str_const("FAwHWq8AQzhw1vfCUEUnZuBZd5hKbR3EdybAtctX5ph");

/// Base units per whole SOL, the scale factor for ticket prices.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Borsh payload size of the Event account, discriminator excluded.
pub const EVENT_STATE_SIZE: usize = 126;

/// Fixed size of an SPL token holder account; the scan filters on it.
pub const TOKEN_ACCOUNT_SIZE: usize = 165;

/// Byte offset of the mint address inside a token holder account.
pub const TOKEN_ACCOUNT_MINT_OFFSET: usize = 0;

/// Byte offset of the owner wallet inside a token holder account.
pub const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;
