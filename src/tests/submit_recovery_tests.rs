//! Recovery behavior of the execute path, end to end: stale rebuilds,
//! transport resubmission, terminal rejections, and freshness exhaustion,
//! each pinned by node-side call counts.

use std::sync::Arc;

use crate::error::ClientError;
use crate::test_utils::{FailKind, MockNode};

use super::test_helpers::client_for;

#[tokio::test]
async fn test_stale_submission_is_rebuilt_under_a_fresh_blockhash() {
    let node = Arc::new(MockNode::new());
    node.fail_submission_sequence([FailKind::Stale]);
    let client = client_for(node.clone());

    client.start_sale().await.unwrap();

    assert_eq!(node.submit_calls(), 2);
    assert_eq!(node.blockhash_calls(), 2);
    // The rebuilt envelope runs under a different blockhash and therefore
    // a different signature; the expired attempt can never land late.
    let submitted = node.submitted();
    assert_ne!(
        submitted[0].message.recent_blockhash(),
        submitted[1].message.recent_blockhash()
    );
    assert_ne!(submitted[0].signatures, submitted[1].signatures);
}

#[tokio::test]
async fn test_stale_rebuild_budget_is_exhausted_after_max_rebuilds() {
    let node = Arc::new(MockNode::new());
    node.fail_next_submissions(FailKind::Stale, 10);
    let client = client_for(node.clone());

    let err = client.start_sale().await.unwrap_err();

    assert!(matches!(err, ClientError::StaleTransaction));
    // Initial attempt plus two rebuilds, then the verdict stands.
    assert_eq!(node.submit_calls(), 3);
    assert_eq!(node.blockhash_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transport_retry_resubmits_the_identical_transaction() {
    let node = Arc::new(MockNode::new());
    node.fail_next_submissions(FailKind::Unreachable, 2);
    let client = client_for(node.clone());

    client.start_sale().await.unwrap();

    assert_eq!(node.submit_calls(), 3);
    assert_eq!(node.blockhash_calls(), 1);
    // Identical bytes each attempt; only staleness forces a new envelope.
    let submitted = node.submitted();
    assert_eq!(submitted[0].signatures, submitted[1].signatures);
    assert_eq!(submitted[1].signatures, submitted[2].signatures);
}

#[tokio::test(start_paused = true)]
async fn test_transport_budget_exhaustion_surfaces_unreachable() {
    let node = Arc::new(MockNode::new());
    node.fail_next_submissions(FailKind::Unreachable, 10);
    let client = client_for(node.clone());

    let err = client.start_sale().await.unwrap_err();

    assert!(matches!(err, ClientError::Unreachable(_)));
    // Initial attempt plus three retries, all against the same envelope.
    assert_eq!(node.submit_calls(), 4);
    assert_eq!(node.blockhash_calls(), 1);
}

#[tokio::test]
async fn test_rejection_is_terminal_without_retry() {
    let node = Arc::new(MockNode::new());
    node.fail_next_submissions(FailKind::Rejected, 1);
    let client = client_for(node.clone());

    let err = client.start_sale().await.unwrap_err();

    assert!(matches!(err, ClientError::RejectedByNode(_)));
    assert_eq!(node.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_freshness_outage_fails_before_anything_is_submitted() {
    let node = Arc::new(MockNode::failing_blockhash());
    let client = client_for(node.clone());

    let err = client.start_sale().await.unwrap_err();

    match err {
        ClientError::FreshnessUnavailable { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected FreshnessUnavailable, got {other:?}"),
    }
    assert_eq!(node.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_then_unreachable_recovers_across_both_budgets() {
    let node = Arc::new(MockNode::new());
    node.fail_submission_sequence([FailKind::Stale, FailKind::Unreachable]);
    let client = client_for(node.clone());

    client.start_sale().await.unwrap();

    assert_eq!(node.submit_calls(), 3);
    assert_eq!(node.blockhash_calls(), 2);
    // Rebuild changed the signature; the transport retry did not.
    let submitted = node.submitted();
    assert_ne!(submitted[0].signatures, submitted[1].signatures);
    assert_eq!(submitted[1].signatures, submitted[2].signatures);
}
