//! The per-region context shared by enumerators and the orchestrator.
use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{config::SweepConfig, remote::ApiError, SkipPolicy};

/// Everything a sweep of one region needs: the region, a client for it and
/// the limits every remote call runs under.
///
/// The context is shared read-only by all enumerators and the orchestrator
/// of a region.
#[derive(Debug, Clone)]
pub struct SweepContext<C> {
    region: String,
    client: C,
    cancel: CancellationToken,
    call_timeout: Duration,
    concurrency: usize,
    skip: SkipPolicy,
}

impl<C> SweepContext<C> {
    pub fn new(region: impl Into<String>, client: C) -> Self {
        Self {
            region: region.into(),
            client,
            cancel: CancellationToken::new(),
            call_timeout: crate::DEFAULT_CALL_TIMEOUT,
            concurrency: crate::DEFAULT_CONCURRENCY,
            skip: SkipPolicy::default(),
        }
    }

    /// Create a context with the limits and skip patterns of `config`.
    pub fn from_config(region: impl Into<String>, client: C, config: &SweepConfig) -> Self {
        Self::new(region, client)
            .with_concurrency(config.concurrency)
            .with_call_timeout(config.call_timeout())
            .with_skip_policy(SkipPolicy::default().with_patterns(config.skip.iter().cloned()))
    }

    /// Bound the number of resources destroyed at the same time. Zero is
    /// treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Tie this context to a cancellation token, usually a child of the
    /// token of the whole run.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_skip_policy(mut self, skip: SkipPolicy) -> Self {
        self.skip = skip;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn skip_policy(&self) -> &SkipPolicy {
        &self.skip
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one remote call under this context's limits.
    ///
    /// The call is abandoned as soon as the context is cancelled, and fails
    /// with [`ApiError::TimedOut`] after the call timeout.
    pub async fn call<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled {});
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled {}),
            result = tokio::time::timeout(self.call_timeout, call) => match result {
                Ok(result) => result,
                Err(_elapsed) => {
                    log::warn!("remote call in {} timed out after {:?}", self.region, self.call_timeout);
                    Err(ApiError::TimedOut { after: self.call_timeout })
                }
            },
        }
    }
}
