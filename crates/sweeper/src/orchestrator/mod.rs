//! Destroys sweepable handles and aggregates their failures.
use futures::{future::LocalBoxFuture, StreamExt};

use crate::{remote::ApiError, Error, Result, SkipPolicy, SweepContext};

/// The destroy operation of one resource kind.
///
/// Receives the region context, the handle identifier and the handle's
/// `ignore_errors` flag.
pub type DestroyFn<C> =
    for<'a> fn(&'a SweepContext<C>, &'a str, bool) -> LocalBoxFuture<'a, Result<(), ApiError>>;

/// A unit of deletable work produced by an enumerator.
///
/// Pairs the identifier of a remote resource with the operation that
/// destroys it. Consumed exactly once by [`sweep_orchestrator`].
pub struct SweepResource<C> {
    kind: &'static str,
    id: String,
    ignore_errors: bool,
    destroy: DestroyFn<C>,
}

impl<C> core::fmt::Debug for SweepResource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepResource")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("ignore_errors", &self.ignore_errors)
            .finish_non_exhaustive()
    }
}

impl<C> SweepResource<C> {
    pub fn new(kind: &'static str, id: impl Into<String>, destroy: DestroyFn<C>) -> Self {
        Self {
            kind,
            id: id.into(),
            ignore_errors: false,
            destroy,
        }
    }

    /// Tolerate failures destroying this resource. They are logged and
    /// counted as ignored instead of failing the sweep.
    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    async fn destroy(self, ctx: &SweepContext<C>) -> Outcome {
        let Self {
            kind,
            id,
            ignore_errors,
            destroy,
        } = self;
        if ctx.is_cancelled() {
            return Outcome::NotAttempted;
        }

        log::debug!("destroying {kind} '{id}'");
        match destroy(ctx, &id, ignore_errors).await {
            Ok(()) => {
                log::info!("  {kind} '{id}' is destroyed");
                Outcome::Destroyed
            }
            Err(source) => {
                let error = Error::Destroy { kind, id, source };
                if error.is_skippable(ctx.skip_policy()) {
                    log::warn!("skipping in {}: {error}", ctx.region());
                    Outcome::Skipped
                } else if ignore_errors {
                    log::warn!("ignoring in {}: {error}", ctx.region());
                    Outcome::Ignored
                } else {
                    log::error!("{error}");
                    Outcome::Failed(error)
                }
            }
        }
    }
}

enum Outcome {
    Destroyed,
    Skipped,
    Ignored,
    Failed(Error),
    NotAttempted,
}

/// Counts of what happened during a sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SweepSummary {
    pub destroyed: usize,
    pub skipped: usize,
    pub ignored: usize,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.destroyed + self.skipped + self.ignored
    }
}

impl core::ops::AddAssign for SweepSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.destroyed += rhs.destroyed;
        self.skipped += rhs.skipped;
        self.ignored += rhs.ignored;
    }
}

impl core::fmt::Display for SweepSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} destroyed, {} skipped, {} ignored",
            self.destroyed, self.skipped, self.ignored
        )
    }
}

/// A collected set of errors.
#[derive(Debug, Default)]
pub struct Errors {
    inner: Vec<Error>,
}

impl Errors {
    /// Record an error. Combined errors are flattened.
    pub fn push(&mut self, error: Error) {
        match error {
            Error::Multiple { errors } => self.inner.extend(errors),
            error => self.inner.push(error),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.inner.iter()
    }

    /// Split off the errors the policy classifies as skips.
    pub fn take_skippable(&mut self, policy: &SkipPolicy) -> Vec<Error> {
        let (skipped, kept) = std::mem::take(&mut self.inner)
            .into_iter()
            .partition(|e| e.is_skippable(policy));
        self.inner = kept;
        skipped
    }

    /// `Ok` when empty, otherwise one combined error.
    pub fn into_result(self) -> Result<()> {
        if self.inner.is_empty() {
            Ok(())
        } else {
            Err(Error::Multiple { errors: self.inner })
        }
    }
}

impl Extend<Error> for Errors {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        for error in iter {
            self.push(error);
        }
    }
}

impl IntoIterator for Errors {
    type Item = Error;

    type IntoIter = <Vec<Error> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

async fn orchestrate<C>(
    ctx: &SweepContext<C>,
    resources: Vec<SweepResource<C>>,
) -> (SweepSummary, Errors) {
    let mut summary = SweepSummary::default();
    let mut errors = Errors::default();
    if resources.is_empty() {
        return (summary, errors);
    }

    log::info!(
        "sweeping {} resource(s) in {} ({} at a time)",
        resources.len(),
        ctx.region(),
        ctx.concurrency()
    );
    let outcomes: Vec<Outcome> = futures::stream::iter(resources)
        .map(|resource| resource.destroy(ctx))
        .buffer_unordered(ctx.concurrency())
        .collect()
        .await;

    let mut pending = 0;
    for outcome in outcomes {
        match outcome {
            Outcome::Destroyed => summary.destroyed += 1,
            Outcome::Skipped => summary.skipped += 1,
            Outcome::Ignored => summary.ignored += 1,
            Outcome::Failed(error) => errors.push(error),
            Outcome::NotAttempted => pending += 1,
        }
    }
    if pending > 0 {
        errors.push(Error::Cancelled {
            region: ctx.region().to_owned(),
            pending,
        });
    }
    (summary, errors)
}

/// Destroys every handle, at most `ctx.concurrency()` at a time.
///
/// Every handle gets exactly one attempt, regardless of how the others fare.
/// Failures that match the context's skip policy, and failures of handles
/// flagged `ignore_errors`, are logged but do not fail the sweep. All other
/// failures are returned together as one [`Error::Multiple`].
///
/// Handles are independent, so no order is guaranteed. After the context is
/// cancelled no new handle is started.
pub async fn sweep_orchestrator<C>(
    ctx: &SweepContext<C>,
    resources: Vec<SweepResource<C>>,
) -> Result<SweepSummary> {
    let (summary, errors) = orchestrate(ctx, resources).await;
    errors.into_result().map(|()| summary)
}

/// The tail of every enumerator: destroys what was enumerated, merges the
/// enumeration errors with the destroy errors and drops the skippable ones.
///
/// `what` names the swept resources in logs and errors, eg. "Service Catalog
/// Products".
pub async fn complete_sweep<C>(
    ctx: &SweepContext<C>,
    what: &str,
    resources: Vec<SweepResource<C>>,
    mut errors: Errors,
) -> Result<SweepSummary> {
    let (summary, destroy_errors) = orchestrate(ctx, resources).await;
    if !destroy_errors.is_empty() {
        errors.push(Error::Sweeping {
            what: what.to_owned(),
            region: ctx.region().to_owned(),
            source: Box::new(Error::Multiple {
                errors: destroy_errors.into_iter().collect(),
            }),
        });
    }

    for skipped in errors.take_skippable(ctx.skip_policy()) {
        log::warn!("Skipping {what} sweep for {}: {skipped}", ctx.region());
    }
    errors.into_result()?;
    log::info!("swept {what} in {}: {summary}", ctx.region());
    Ok(summary)
}
