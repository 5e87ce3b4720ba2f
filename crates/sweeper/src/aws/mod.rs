//! Sweeping AWS.
pub use aws_config::SdkConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use tokio_util::sync::CancellationToken;

use crate::{config::SweepConfig, Error, SweepContext};

pub mod servicecatalog;


/// Load the shared AWS configuration (credentials chain, retries) for one
/// region.
pub async fn load_region_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}

/// Resolve credentials once, so a region without any fails up front
/// instead of on every listing.
async fn check_credentials(
    region: &str,
    provider: Option<&impl ProvideCredentials>,
    timeout: std::time::Duration,
) -> crate::Result<()> {
    let client_error = |msg: String| Error::Client {
        region: region.to_owned(),
        msg,
    };
    let provider =
        provider.ok_or_else(|| client_error("no credentials provider found".to_owned()))?;
    match tokio::time::timeout(timeout, provider.provide_credentials()).await {
        Ok(Ok(_credentials)) => Ok(()),
        Ok(Err(e)) => Err(client_error(format!(
            "could not load credentials: {}",
            aws_sdk_servicecatalog::error::DisplayErrorContext(&e)
        ))),
        Err(_elapsed) => Err(client_error(format!(
            "timed out loading credentials after {timeout:?}"
        ))),
    }
}

/// Build the context of a Service Catalog sweep of `region` from an already
/// loaded SDK configuration.
///
/// ## Errors
/// Errs when the region is empty or no credentials can be resolved.
pub async fn context_from_sdk(
    region: &str,
    sdk: &SdkConfig,
    config: &SweepConfig,
    cancel: CancellationToken,
) -> crate::Result<SweepContext<servicecatalog::Catalog>> {
    if region.is_empty() {
        return Err(Error::Client {
            region: region.to_owned(),
            msg: "region is empty".to_owned(),
        });
    }
    check_credentials(
        region,
        sdk.credentials_provider().as_ref(),
        config.call_timeout(),
    )
    .await?;
    log::debug!("created Service Catalog client for {region}");
    let client = servicecatalog::Catalog::new(sdk);
    Ok(SweepContext::from_config(region, client, config).with_cancellation(cancel))
}

/// Build the context of a Service Catalog sweep of `region`.
///
/// ## Errors
/// Errs when no client can be built for the region. This is the only error
/// that aborts a region before anything is listed.
pub async fn regional_context(
    region: &str,
    config: &SweepConfig,
    cancel: CancellationToken,
) -> crate::Result<SweepContext<servicecatalog::Catalog>> {
    if region.is_empty() {
        return Err(Error::Client {
            region: region.to_owned(),
            msg: "region is empty".to_owned(),
        });
    }
    let sdk = load_region_config(region).await;
    context_from_sdk(region, &sdk, config, cancel).await
}
