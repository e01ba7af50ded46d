//! Instruction building against the deployed ChainTicket interface.
//!
//! Every action maps to one instruction with a fixed account list (order and
//! writable/signer flags are the program's contract, reproduced here exactly)
//! and a fixed argument schema. Instruction data is the Anchor wire form: an
//! 8-byte discriminator derived from the method name, followed by the borsh
//! encoding of the arguments (length-prefixed UTF-8 strings, fixed-width
//! little-endian integers, one presence byte per optional field).
//!
//! Builders are stateless and pure: address resolution happens through the
//! deriver, nothing is fetched, and nothing is validated beyond what encoding
//! itself requires. Business rules stay with the program.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
    sysvar::rent,
};

use crate::addresses::{holder_token_address, resolve_event_accounts};
use crate::constants::{CHAIN_TICKET_PROGRAM_ID, LAMPORTS_PER_SOL, PLATFORM_OWNER};
use crate::error::{ClientError, ClientResult};

/// Arguments for [`TicketAction::InitEvent`], in deployed field order.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitEventFields {
    pub event_name: String,
    pub event_symbol: String,
    pub image_uri: String,
    pub metadata_uri: String,
    pub event_date: i64,
    pub ticket_price: u64,
    pub num_tickets: u32,
    pub refund_period: i64,
}

/// Arguments for [`TicketAction::AmendEvent`]; `None` means "leave unchanged".
///
/// Absence is encoded as a zero presence byte, never as a sentinel value.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AmendEventFields {
    pub event_date: Option<i64>,
    pub ticket_price: Option<u64>,
    pub num_tickets: Option<u32>,
}

/// A logical action against the program, with every involved party explicit.
///
/// `authority` is always the event organizer the account set derives from;
/// the second wallet, where present, is the counterparty the action touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketAction {
    InitEvent {
        authority: Pubkey,
        fields: InitEventFields,
    },
    AmendEvent {
        authority: Pubkey,
        fields: AmendEventFields,
    },
    StartSale {
        authority: Pubkey,
    },
    BuyTicket {
        authority: Pubkey,
        buyer: Pubkey,
    },
    RefundTicket {
        authority: Pubkey,
        buyer: Pubkey,
    },
    BurnTicket {
        authority: Pubkey,
        holder: Pubkey,
    },
    DelegateBurn {
        authority: Pubkey,
        target_wallet: Pubkey,
    },
    WithdrawFunds {
        authority: Pubkey,
    },
    CancelEvent {
        authority: Pubkey,
    },
    EndEvent {
        authority: Pubkey,
    },
}

impl TicketAction {
    /// The program method name, as hashed into the discriminator.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::InitEvent { .. } => "init_event",
            Self::AmendEvent { .. } => "amend_event",
            Self::StartSale { .. } => "start_sale",
            Self::BuyTicket { .. } => "buy_ticket",
            Self::RefundTicket { .. } => "refund_ticket",
            Self::BurnTicket { .. } => "burn_ticket",
            Self::DelegateBurn { .. } => "delegate_burn",
            Self::WithdrawFunds { .. } => "withdraw_funds",
            Self::CancelEvent { .. } => "cancel_event",
            Self::EndEvent { .. } => "end_event",
        }
    }
}

/// 8-byte instruction discriminator: `sha256("global:<name>")[..8]`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// 8-byte account discriminator: `sha256("account:<name>")[..8]`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("account:{name}").as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Convert a human-facing SOL price to lamports, exactly.
///
/// Rounds to the nearest base unit and verifies the result converts back to
/// the input; anything that loses sub-lamport precision, overflows u64, or is
/// negative or non-finite is rejected rather than silently truncated.
pub fn sol_to_lamports(sol: f64) -> ClientResult<u64> {
    if !sol.is_finite() {
        return Err(ClientError::invalid_argument(format!(
            "price {sol} is not a finite number"
        )));
    }
    if sol < 0.0 {
        return Err(ClientError::invalid_argument(format!(
            "price {sol} is negative"
        )));
    }
    let scaled = sol * LAMPORTS_PER_SOL as f64;
    if scaled >= u64::MAX as f64 {
        return Err(ClientError::invalid_argument(format!(
            "price {sol} overflows the base-unit width"
        )));
    }
    let lamports = scaled.round() as u64;
    if lamports_to_sol(lamports) != sol {
        return Err(ClientError::invalid_argument(format!(
            "price {sol} is not representable in whole base units"
        )));
    }
    Ok(lamports)
}

/// Convert lamports back to a human-facing SOL value.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Build the instruction for an action, resolving derived accounts on the fly.
pub fn build(action: &TicketAction) -> ClientResult<Instruction> {
    match action {
        TicketAction::InitEvent { authority, fields } => init_event(authority, fields),
        TicketAction::AmendEvent { authority, fields } => amend_event(authority, fields),
        TicketAction::StartSale { authority } => start_sale(authority),
        TicketAction::BuyTicket { authority, buyer } => buy_ticket(authority, buyer),
        TicketAction::RefundTicket { authority, buyer } => refund_ticket(authority, buyer),
        TicketAction::BurnTicket { authority, holder } => burn_ticket(authority, holder),
        TicketAction::DelegateBurn {
            authority,
            target_wallet,
        } => delegate_burn(authority, target_wallet),
        TicketAction::WithdrawFunds { authority } => withdraw_funds(authority),
        TicketAction::CancelEvent { authority } => cancel_event(authority),
        TicketAction::EndEvent { authority } => end_event(authority),
    }
}

fn encode_args<T: BorshSerialize>(method: &str, args: &T) -> ClientResult<Vec<u8>> {
    let mut data = instruction_discriminator(method).to_vec();
    let payload = borsh::to_vec(args)
        .map_err(|e| ClientError::invalid_argument(format!("{method} args encode: {e}")))?;
    data.extend(payload);
    Ok(data)
}

fn encode_bare(method: &str) -> Vec<u8> {
    instruction_discriminator(method).to_vec()
}

fn init_event(authority: &Pubkey, fields: &InitEventFields) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new(accounts.metadata, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(crate::constants::MPL_TOKEN_METADATA_PROGRAM_ID, false),
            AccountMeta::new_readonly(rent::id(), false),
        ],
        data: encode_args("init_event", fields)?,
    })
}

fn amend_event(authority: &Pubkey, fields: &AmendEventFields) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(accounts.event, false),
        ],
        data: encode_args("amend_event", fields)?,
    })
}

fn start_sale(authority: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode_bare("start_sale"),
    })
}

fn buy_ticket(authority: &Pubkey, buyer: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    let buyer_token = holder_token_address(buyer, &accounts.mint);
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new(*buyer, true),
            AccountMeta::new(buyer_token, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        ],
        data: encode_bare("buy_ticket"),
    })
}

fn refund_ticket(authority: &Pubkey, buyer: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    let buyer_token = holder_token_address(buyer, &accounts.mint);
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new(*buyer, false),
            AccountMeta::new(buyer_token, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: encode_bare("refund_ticket"),
    })
}

fn burn_ticket(authority: &Pubkey, holder: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    let holder_token = holder_token_address(holder, &accounts.mint);
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new_readonly(accounts.event, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new(*holder, true),
            AccountMeta::new(holder_token, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: encode_bare("burn_ticket"),
    })
}

fn delegate_burn(authority: &Pubkey, target_wallet: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    let target_token = holder_token_address(target_wallet, &accounts.mint);
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(accounts.event, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new_readonly(*target_wallet, false),
            AccountMeta::new(target_token, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: encode_bare("delegate_burn"),
    })
}

fn withdraw_funds(authority: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(PLATFORM_OWNER, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new_readonly(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
        ],
        data: encode_bare("withdraw_funds"),
    })
}

fn cancel_event(authority: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(PLATFORM_OWNER, false),
            AccountMeta::new(*authority, true),
            AccountMeta::new(accounts.event, false),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode_bare("cancel_event"),
    })
}

fn end_event(authority: &Pubkey) -> ClientResult<Instruction> {
    let accounts = resolve_event_accounts(authority)?;
    Ok(Instruction {
        program_id: CHAIN_TICKET_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(accounts.event, false),
            AccountMeta::new(accounts.vault, false),
            AccountMeta::new(accounts.mint, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode_bare("end_event"),
    })
}
