//! Bulk refund and revoke runs against a scripted node: full sweeps,
//! per-holder isolation, deadline enforcement, and scan failures.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::assembler::FreshnessPolicy;
use crate::bulk::BulkPolicy;
use crate::client::{SubmitPolicy, TicketClient};
use crate::error::ClientError;
use crate::instructions::instruction_discriminator;
use crate::test_utils::MockNode;
use crate::wallet::Wallet;

use super::test_helpers::{client_for, first_instruction_data};

fn client_with_bulk(node: Arc<MockNode>, bulk: BulkPolicy) -> TicketClient {
    TicketClient::with_policies(
        node,
        Wallet::from_keypair(Keypair::new()),
        FreshnessPolicy::default(),
        SubmitPolicy::default(),
        bulk,
    )
}

#[tokio::test]
async fn test_refund_all_sweeps_every_holder() {
    let node = Arc::new(
        MockNode::new()
            .with_holder(Pubkey::new_unique())
            .with_holder(Pubkey::new_unique())
            .with_holder(Pubkey::new_unique()),
    );
    let client = client_for(node.clone());

    let report = client.refund_all().await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.confirmed.len(), 3);
    assert_eq!(node.submit_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_holder_does_not_stop_the_others() {
    let reachable_a = Pubkey::new_unique();
    let reachable_b = Pubkey::new_unique();
    let dead = Pubkey::new_unique();
    let node = Arc::new(
        MockNode::new()
            .with_holder(reachable_a)
            .with_unreachable_holder(dead)
            .with_holder(reachable_b),
    );
    let client = client_for(node.clone());

    let report = client.refund_all().await.unwrap();

    assert_eq!(report.confirmed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].holder, dead);
    assert!(matches!(report.failed[0].error, ClientError::Unreachable(_)));
    // Two clean submissions, plus the dead holder's initial attempt and
    // its three resubmissions.
    assert_eq!(node.submit_calls(), 6);
}

#[tokio::test]
async fn test_rejected_holders_are_reported_individually() {
    let holders: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
    let mut node = MockNode::new();
    for (i, holder) in holders.iter().enumerate() {
        node = if i < 2 {
            node.with_rejected_holder(*holder)
        } else {
            node.with_holder(*holder)
        };
    }
    let node = Arc::new(node);
    let client = client_for(node.clone());

    let report = client.revoke_all().await.unwrap();

    assert_eq!(report.confirmed.len(), 4);
    assert_eq!(report.failed.len(), 2);
    let failed: HashSet<Pubkey> = report.failed.iter().map(|f| f.holder).collect();
    let expected: HashSet<Pubkey> = holders[..2].iter().copied().collect();
    assert_eq!(failed, expected);
    for failure in &report.failed {
        assert!(matches!(failure.error, ClientError::RejectedByNode(_)));
    }
    assert_eq!(node.submit_calls(), 6);
}

#[tokio::test]
async fn test_scan_failure_aborts_the_run_before_any_submission() {
    let node = Arc::new(
        MockNode::new()
            .with_holder(Pubkey::new_unique())
            .with_scan_failure(),
    );
    let client = client_for(node.clone());

    let err = client.refund_all().await.unwrap_err();

    assert!(matches!(err, ClientError::Unreachable(_)));
    assert_eq!(node.submit_calls(), 0);
}

#[tokio::test]
async fn test_unreadable_token_account_is_recorded_not_skipped() {
    let opaque = Pubkey::new_unique();
    let good = Pubkey::new_unique();
    let node = Arc::new(
        MockNode::new()
            .with_holder(good)
            .with_raw_token_account(opaque, vec![0u8; 10]),
    );
    let client = client_for(node.clone());

    let report = client.refund_all().await.unwrap();

    assert_eq!(report.confirmed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    // The owner wallet is unknown, so the failure carries the token
    // account address itself.
    assert_eq!(report.failed[0].holder, opaque);
    assert!(matches!(
        report.failed[0].error,
        ClientError::MalformedAccount(_)
    ));
    assert_eq!(node.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_pipeline_is_cut_off_at_the_deadline() {
    let hanging = Pubkey::new_unique();
    let prompt = Pubkey::new_unique();
    let node = Arc::new(
        MockNode::new()
            .with_holder(prompt)
            .with_hanging_holder(hanging),
    );
    let client = client_with_bulk(
        node.clone(),
        BulkPolicy {
            max_concurrency: 8,
            pipeline_deadline: Duration::from_secs(5),
        },
    );

    let report = client.revoke_all().await.unwrap();

    assert_eq!(report.confirmed.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].holder, hanging);
    assert!(matches!(
        report.failed[0].error,
        ClientError::Timeout { secs: 5 }
    ));
    // The hang consumed exactly one submission attempt.
    assert_eq!(node.submit_calls(), 2);
}

#[tokio::test]
async fn test_empty_event_reports_success_without_work() {
    let node = Arc::new(MockNode::new());
    let client = client_for(node.clone());

    let report = client.refund_all().await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.total(), 0);
    assert_eq!(node.submit_calls(), 0);
}

#[tokio::test]
async fn test_revoke_all_issues_delegate_burns_for_the_target() {
    let holder = Pubkey::new_unique();
    let node = Arc::new(MockNode::new().with_holder(holder));
    let client = client_for(node.clone());

    let report = client.revoke_all().await.unwrap();
    assert_eq!(report.confirmed.len(), 1);

    let submitted = node.submitted();
    assert_eq!(submitted.len(), 1);
    let data = first_instruction_data(&submitted[0]);
    assert_eq!(&data[..8], &instruction_discriminator("delegate_burn"));
    assert!(submitted[0].message.static_account_keys().contains(&holder));
}

#[tokio::test]
async fn test_concurrency_limit_still_completes_the_whole_set() {
    let mut node = MockNode::new();
    for _ in 0..5 {
        node = node.with_holder(Pubkey::new_unique());
    }
    let node = Arc::new(node);
    let client = client_with_bulk(
        node.clone(),
        BulkPolicy {
            max_concurrency: 2,
            pipeline_deadline: Duration::from_secs(30),
        },
    );

    let report = client.refund_all().await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.confirmed.len(), 5);
    assert_eq!(node.submit_calls(), 5);
}
