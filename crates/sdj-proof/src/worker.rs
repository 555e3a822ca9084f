//! # Disclosure Worker
//!
//! Async front end for [`SelectiveDisclosure`]. Suite operations are CPU
//! bound, so each call runs on tokio's blocking pool and is bounded by the
//! configured `crypto_timeout`. A timeout or a panicked task surfaces as
//! `CryptoFailure` instead of stalling the caller.
//!
//! A timed-out task keeps running on the blocking pool until the suite
//! returns; its result is discarded.

use std::sync::Arc;

use serde_json::Value;

use sdj_crypto::{KeyPair, ProofValue, PublicKey, Signature, SignatureSuite};

use crate::error::ProtocolError;
use crate::protocol::{DerivedProof, SelectiveDisclosure};

/// Runs protocol operations off the async executor.
#[derive(Debug)]
pub struct DisclosureWorker<S> {
    engine: Arc<SelectiveDisclosure<S>>,
}

impl<S> Clone for DisclosureWorker<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: SignatureSuite + 'static> DisclosureWorker<S> {
    /// Wrap an engine.
    pub fn new(engine: SelectiveDisclosure<S>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &SelectiveDisclosure<S> {
        &self.engine
    }

    /// [`SelectiveDisclosure::sign`] on the blocking pool.
    pub async fn sign(&self, document: Value, key_pair: KeyPair) -> Result<Signature, ProtocolError> {
        self.run("sign", move |engine| engine.sign(&document, &key_pair))
            .await
    }

    /// [`SelectiveDisclosure::verify`] on the blocking pool.
    pub async fn verify(
        &self,
        document: Value,
        public_key: PublicKey,
        signature: Signature,
    ) -> Result<bool, ProtocolError> {
        self.run("verify", move |engine| {
            engine.verify(&document, &public_key, &signature)
        })
        .await
    }

    /// [`SelectiveDisclosure::create_proof`] on the blocking pool.
    pub async fn create_proof(
        &self,
        document: Value,
        public_key: PublicKey,
        signature: Signature,
        nonce: String,
        queries: Vec<String>,
    ) -> Result<DerivedProof, ProtocolError> {
        self.run("create_proof", move |engine| {
            engine.create_proof(&document, &public_key, &signature, &nonce, &queries)
        })
        .await
    }

    /// [`SelectiveDisclosure::verify_proof`] on the blocking pool.
    pub async fn verify_proof(
        &self,
        payload: Value,
        public_key: PublicKey,
        nonce: String,
        proof_value: ProofValue,
    ) -> Result<bool, ProtocolError> {
        self.run("verify_proof", move |engine| {
            engine.verify_proof(&payload, &public_key, &nonce, &proof_value)
        })
        .await
    }

    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T, ProtocolError>
    where
        T: Send + 'static,
        F: FnOnce(&SelectiveDisclosure<S>) -> Result<T, ProtocolError> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let limit = engine.config().crypto_timeout;
        let task = tokio::task::spawn_blocking(move || f(&engine));
        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::warn!(operation, error = %join_err, "disclosure worker task failed");
                Err(ProtocolError::CryptoFailure(format!(
                    "{operation} task failed: {join_err}"
                )))
            }
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = limit.as_millis() as u64,
                    "disclosure worker timed out"
                );
                Err(ProtocolError::CryptoFailure(format!(
                    "{operation} timed out after {} ms",
                    limit.as_millis()
                )))
            }
        }
    }
}
