//! Byte-exact vectors for the deployed program interface.
//!
//! If one of these assertions breaks, the client no longer speaks the
//! format the deployed program decodes. That is an interface change,
//! not a refactor.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::constants::CHAIN_TICKET_PROGRAM_ID;
use crate::instructions::{
    build, instruction_discriminator, AmendEventFields, InitEventFields, TicketAction,
};
use crate::test_utils::MockNode;

use super::test_helpers::{client_for, first_instruction_data};

#[test]
fn test_init_event_args_encode_to_the_pinned_bytes() {
    let fields = InitEventFields {
        event_name: "GALA".to_string(),
        event_symbol: "GL".to_string(),
        image_uri: "i".to_string(),
        metadata_uri: "m".to_string(),
        event_date: 1_700_000_000,
        ticket_price: 2_500_000_000,
        num_tickets: 500,
        refund_period: 86_400,
    };
    let ix = build(&TicketAction::InitEvent {
        authority: Pubkey::new_from_array([9u8; 32]),
        fields,
    })
    .unwrap();

    let expected: [u8; 52] = [
        // "GALA"
        4, 0, 0, 0, b'G', b'A', b'L', b'A',
        // "GL"
        2, 0, 0, 0, b'G', b'L',
        // "i"
        1, 0, 0, 0, b'i',
        // "m"
        1, 0, 0, 0, b'm',
        // event_date = 1_700_000_000
        0x00, 0xF1, 0x53, 0x65, 0, 0, 0, 0,
        // ticket_price = 2_500_000_000
        0x00, 0xF9, 0x02, 0x95, 0, 0, 0, 0,
        // num_tickets = 500
        0xF4, 0x01, 0, 0,
        // refund_period = 86_400
        0x80, 0x51, 0x01, 0, 0, 0, 0, 0,
    ];
    assert_eq!(&ix.data[..8], &instruction_discriminator("init_event"));
    assert_eq!(&ix.data[8..], &expected);
}

#[test]
fn test_amend_event_presence_bytes_encode_to_the_pinned_bytes() {
    let fields = AmendEventFields {
        event_date: None,
        ticket_price: Some(1_000_000_000),
        num_tickets: Some(42),
    };
    let ix = build(&TicketAction::AmendEvent {
        authority: Pubkey::new_from_array([9u8; 32]),
        fields,
    })
    .unwrap();

    let expected: [u8; 15] = [
        0, // event_date absent
        1, 0x00, 0xCA, 0x9A, 0x3B, 0, 0, 0, 0, // ticket_price = 1 SOL
        1, 42, 0, 0, 0, // num_tickets = 42
    ];
    assert_eq!(&ix.data[..8], &instruction_discriminator("amend_event"));
    assert_eq!(&ix.data[8..], &expected);
}

#[tokio::test]
async fn test_submitted_transaction_carries_the_program_instruction() {
    let node = Arc::new(MockNode::new());
    let client = client_for(node.clone());

    client.start_sale().await.unwrap();

    let submitted = node.submitted();
    assert_eq!(submitted.len(), 1);
    let tx = &submitted[0];
    let keys = tx.message.static_account_keys();
    assert_eq!(keys[0], client.wallet().pubkey());
    let ix = &tx.message.instructions()[0];
    assert_eq!(*ix.program_id(keys), CHAIN_TICKET_PROGRAM_ID);
    assert_eq!(
        first_instruction_data(tx),
        instruction_discriminator("start_sale").to_vec()
    );
}
