//! Submission: sign an assembled envelope and hand it to the node once.
//!
//! The submitter never retries. Each call is exactly one signing pass and
//! exactly one submission request, so recovery policy lives in one place
//! (the client) and duplicate submissions cannot happen below it.

use std::sync::Arc;

use solana_sdk::{
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use tracing::debug;

use crate::assembler::TransactionEnvelope;
use crate::error::{ClientError, ClientResult};
use crate::metrics::{metrics, Timer};
use crate::node::LedgerNode;

#[derive(Clone)]
pub struct Submitter {
    node: Arc<dyn LedgerNode>,
}

impl Submitter {
    pub fn new(node: Arc<dyn LedgerNode>) -> Self {
        Self { node }
    }

    /// Sign `envelope` with `signer` and submit it. One node call per
    /// invocation; any error comes back to the caller unwrapped.
    pub async fn submit(
        &self,
        envelope: &TransactionEnvelope,
        signer: &Keypair,
    ) -> ClientResult<Signature> {
        let tx = VersionedTransaction::try_new(envelope.message.clone(), &[signer])
            .map_err(|e| ClientError::Signing(e.to_string()))?;

        metrics().submissions_total.inc();
        let timer = Timer::new();
        let signature = self.node.submit_transaction(&tx).await?;
        timer.observe_duration(&metrics().submit_latency);
        metrics().submissions_confirmed.inc();
        debug!(%signature, blockhash = %envelope.blockhash, "submission accepted");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::instructions::{build, TicketAction};
    use crate::test_utils::MockNode;
    use solana_sdk::signer::Signer;

    async fn envelope_for(node: Arc<MockNode>, signer: &Keypair) -> TransactionEnvelope {
        let assembler = Assembler::new(node);
        let instruction = build(&TicketAction::StartSale {
            authority: signer.pubkey(),
        })
        .unwrap();
        assembler
            .assemble(&signer.pubkey(), &[instruction])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_signs_with_the_given_keypair() {
        let node = Arc::new(MockNode::new());
        let signer = Keypair::new();
        let envelope = envelope_for(node.clone(), &signer).await;

        let signature = Submitter::new(node.clone())
            .submit(&envelope, &signer)
            .await
            .unwrap();

        let serialized = envelope.message.serialize();
        assert!(signature.verify(signer.pubkey().as_ref(), &serialized));
        assert_eq!(node.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_makes_exactly_one_node_call_even_on_failure() {
        let node = Arc::new(MockNode::new());
        node.fail_next_submissions(crate::test_utils::FailKind::Unreachable, 5);
        let signer = Keypair::new();
        let envelope = envelope_for(node.clone(), &signer).await;

        let err = Submitter::new(node.clone())
            .submit(&envelope, &signer)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unreachable(_)));
        assert_eq!(node.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_keypair_fails_before_reaching_the_node() {
        let node = Arc::new(MockNode::new());
        let signer = Keypair::new();
        let envelope = envelope_for(node.clone(), &signer).await;

        let err = Submitter::new(node.clone())
            .submit(&envelope, &Keypair::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Signing(_)));
        assert_eq!(node.submit_calls(), 0);
    }
}
