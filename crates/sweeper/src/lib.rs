//! # Sweeper
//!
//! Sweeper is a library for cleaning up cloud resources that acceptance
//! test runs leave behind. Test suites create real infrastructure, and when a
//! test panics, times out or is cancelled that infrastructure keeps existing
//! (and keeps costing money). A *sweep* is a pass over a region that finds
//! those leftovers and deletes them.
//!
//! ## Concepts
//!
//! - **Enumerators** list remote resources of one kind, page by page, and turn
//!   every well formed entry into a [`SweepResource`] handle. Entries missing
//!   an identifier are dropped.
//! - **The orchestrator** ([`sweep_orchestrator`]) takes an unordered bag of
//!   handles and destroys them with bounded concurrency. One failure never
//!   stops the others. Failures are collected into one combined
//!   [`Error::Multiple`].
//! - **Skips**: sweeps run across many regions and accounts, and some
//!   services simply do not exist everywhere. Errors that match the
//!   [`SkipPolicy`] are logged and treated as success.
//! - **The registry** ([`Registry`]) names every sweeper together with the
//!   sweepers that must run before it, and schedules them as a DAG.
//!
//! All remote calls go through a [`SweepContext`], which carries the region,
//! the client, a cancellation token and a per-call timeout. There is no global
//! state.
//!
//! An AWS Service Catalog implementation lives in [`servicecatalog`] (the
//! enumerators) and [`aws`] (the SDK backed client).
//!
//! ## Error Handling
//!
//! Sweeper exposes an error enum [`Error`], and [`ApiError`] for failures
//! reported by a remote call. Functions that can fail return a `Result`
//! with [`Error`].
use std::time::Duration;

pub use ids::ResourceId;
pub use sweeper_derive::ResourceId;

pub mod arn;
pub mod aws;
pub mod config;
mod context;
pub mod ids;
mod orchestrator;
mod registry;
pub mod remote;
pub mod servicecatalog;
pub mod verify;

pub use context::SweepContext;
pub use orchestrator::{
    complete_sweep, sweep_orchestrator, DestroyFn, Errors, SweepResource, SweepSummary,
};
pub use registry::{RegionReport, Registry, SweepFn};
pub use remote::{ApiError, Page, SkipPattern, SkipPolicy};

/// Top-level error enum that encompasses all errors.
#[derive(snafu::Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not create a client for region '{region}': {msg}"))]
    Client { region: String, msg: String },

    #[snafu(display("Could not list {what} in {region}: {source}"))]
    List {
        what: String,
        region: String,
        source: ApiError,
    },

    #[snafu(display("Could not parse {what} '{value}': {msg}"))]
    Parse {
        what: &'static str,
        value: String,
        msg: String,
    },

    #[snafu(display("Could not destroy {kind} '{id}': {source}"))]
    Destroy {
        kind: &'static str,
        id: String,
        source: ApiError,
    },

    #[snafu(display("Sweep in {region} was cancelled with {pending} resource(s) left"))]
    Cancelled { region: String, pending: usize },

    #[snafu(display("Could not sweep {what} in {region}: {source}"))]
    Sweeping {
        what: String,
        region: String,
        source: Box<Error>,
    },

    #[snafu(display("Sweeper '{name}' failed in {region}: {source}"))]
    Sweeper {
        name: &'static str,
        region: String,
        source: Box<Error>,
    },

    #[snafu(display("{} error(s) occurred:\n{}",
                errors.len(),
                errors.iter()
                    .map(|e| format!(" -> {e}"))
                    .collect::<Vec<_>>()
                    .join("\n")))]
    Multiple { errors: Vec<Error> },

    #[snafu(display("Sweeper '{name}' is already registered"))]
    DuplicateSweeper { name: &'static str },

    #[snafu(display("Could not find a sweeper by the name '{name}'"))]
    UnknownSweeper { name: String },

    #[snafu(display("Sweeper '{sweeper}' depends on '{dependency}', which is not registered"))]
    UnknownDependency {
        sweeper: &'static str,
        dependency: &'static str,
    },

    #[snafu(display("Could not build schedule: {msg}"))]
    Schedule { msg: String },

    #[snafu(display("Could not read config file '{path:?}': {source}"))]
    ConfigRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not parse config: {source}"))]
    ConfigParse { source: toml::de::Error },

    #[snafu(display("Invalid config: {msg}"))]
    ConfigInvalid { msg: String },
}

impl Error {
    /// Returns `true` if this error only says that the sweep cannot run in this
    /// environment, eg. the service is unavailable in the region.
    ///
    /// A combined error is skippable when every one of its errors is.
    pub fn is_skippable(&self, policy: &SkipPolicy) -> bool {
        match self {
            Error::List { source, .. } | Error::Destroy { source, .. } => policy.matches(source),
            Error::Sweeping { source, .. } | Error::Sweeper { source, .. } => {
                source.is_skippable(policy)
            }
            Error::Multiple { errors } => {
                !errors.is_empty() && errors.iter().all(|e| e.is_skippable(policy))
            }
            _ => false,
        }
    }

    /// The number of leaf errors contained in this error.
    pub fn count(&self) -> usize {
        match self {
            Error::Multiple { errors } => errors.iter().map(Error::count).sum(),
            Error::Sweeping { source, .. } | Error::Sweeper { source, .. } => source.count(),
            _ => 1,
        }
    }
}

impl From<ids::ParseIdError> for Error {
    fn from(e: ids::ParseIdError) -> Self {
        Error::Parse {
            what: "identifier",
            value: e.id().to_owned(),
            msg: e.to_string(),
        }
    }
}

impl From<arn::ParseArnError> for Error {
    fn from(e: arn::ParseArnError) -> Self {
        Error::Parse {
            what: "ARN",
            value: e.arn().to_owned(),
            msg: e.to_string(),
        }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Default bound on how many resources are destroyed at the same time.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default upper bound on the duration of a single remote call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10 * 60);
