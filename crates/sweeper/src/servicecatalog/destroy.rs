//! The destroy operation of each Service Catalog resource kind.
//!
//! Each one parses the handle identifier with the same type that composed
//! it. A resource that is already gone counts as destroyed.
use futures::{future::LocalBoxFuture, FutureExt};

use super::*;
use crate::SweepContext;

type Destroyed<'a> = LocalBoxFuture<'a, Result<(), ApiError>>;

/// Treat "already gone" as success.
fn gone_is_ok(result: Result<(), ApiError>) -> Result<(), ApiError> {
    match result {
        Err(e) if e.is_not_found() => {
            log::debug!("  already gone: {e}");
            Ok(())
        }
        result => result,
    }
}

/// An identifier that does not parse can never be destroyed; report it the
/// way the service reports a bad parameter.
fn invalid_id(e: sweep::ids::ParseIdError) -> ApiError {
    ApiError::service("InvalidParametersException", e.to_string())
}

pub(super) fn budget_resource_association<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let id: BudgetResourceAssociationId = id.parse().map_err(invalid_id)?;
        let call = ctx
            .client()
            .disassociate_budget_from_resource(&id.budget_name, &id.resource_id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn constraint<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let call = ctx.client().delete_constraint(ACCEPT_LANGUAGE_ENGLISH, id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn principal_portfolio_association<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let id: PrincipalPortfolioAssociationId = id.parse().map_err(invalid_id)?;
        let call = ctx.client().disassociate_principal_from_portfolio(&id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn product_portfolio_association<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let id: ProductPortfolioAssociationId = id.parse().map_err(invalid_id)?;
        let call = ctx.client().disassociate_product_from_portfolio(&id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn product<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let call = ctx.client().delete_product(ACCEPT_LANGUAGE_ENGLISH, id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn provisioned_product<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let call =
            ctx.client()
                .terminate_provisioned_product(ACCEPT_LANGUAGE_ENGLISH, id, ignore_errors);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn provisioning_artifact<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let id: ProvisioningArtifactId = id.parse().map_err(invalid_id)?;
        let call = ctx
            .client()
            .delete_provisioning_artifact(ACCEPT_LANGUAGE_ENGLISH, &id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn service_action<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let call = ctx.client().delete_service_action(ACCEPT_LANGUAGE_ENGLISH, id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn tag_option_resource_association<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let id: TagOptionResourceAssociationId = id.parse().map_err(invalid_id)?;
        let call = ctx.client().disassociate_tag_option_from_resource(&id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}

pub(super) fn tag_option<'a, C: ServiceCatalog>(
    ctx: &'a SweepContext<C>,
    id: &'a str,
    _ignore_errors: bool,
) -> Destroyed<'a> {
    async move {
        let call = ctx.client().delete_tag_option(id);
        gone_is_ok(ctx.call(call).await)
    }
    .boxed_local()
}
