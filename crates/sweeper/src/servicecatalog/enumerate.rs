//! One enumerator per Service Catalog resource kind.
//!
//! Every enumerator walks its listing calls page by page, turns each well
//! formed entry into a handle and finishes with [`complete_sweep`].
//! Listing failures are recorded; when a nested listing (the children of
//! one parent) fails, enumeration moves on to the next parent.
use std::future::Future;

use futures::StreamExt;

use super::{destroy, *};
use crate::{
    arn::Arn, complete_sweep, remote::pages, Error, Errors, SweepContext, SweepResource,
    SweepSummary,
};

/// Walks every page of a list call and returns the items it yielded.
///
/// A failure is pushed onto `errors` as an [`Error::List`] and ends the
/// walk. Items of the pages before the failure are kept.
async fn list_all<'a, C, T, F, Fut>(
    ctx: &'a SweepContext<C>,
    what: &str,
    fetch: F,
    errors: &mut Errors,
) -> Vec<T>
where
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, ApiError>> + 'a,
    T: 'a,
{
    list_until(ctx, what, fetch, |_| false, errors)
        .await
        .unwrap_or_default()
}

/// Like [`list_all`], except that a failure matching `stop` is returned
/// instead of recorded.
async fn list_until<'a, C, T, F, Fut>(
    ctx: &'a SweepContext<C>,
    what: &str,
    fetch: F,
    stop: impl Fn(&ApiError) -> bool,
    errors: &mut Errors,
) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<String>) -> Fut + 'a,
    Fut: Future<Output = Result<Page<T>, ApiError>> + 'a,
    T: 'a,
{
    let mut items = vec![];
    let mut stream = std::pin::pin!(pages(ctx, fetch));
    while let Some(page) = stream.next().await {
        match page {
            Ok(page) => items.extend(page),
            Err(e) if stop(&e) => return Err(e),
            Err(source) => {
                errors.push(Error::List {
                    what: what.to_owned(),
                    region: ctx.region().to_owned(),
                    source,
                });
                break;
            }
        }
    }
    Ok(items)
}

/// Non-empty identifier or nothing.
fn present(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}

async fn portfolio_ids<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
    errors: &mut Errors,
) -> Vec<String> {
    list_all(
        ctx,
        "Service Catalog Portfolios",
        move |token| ctx.client().list_portfolios(token),
        errors,
    )
    .await
    .into_iter()
    .filter_map(|portfolio| portfolio.id.filter(|id| !id.is_empty()))
    .collect()
}

async fn products<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
    errors: &mut Errors,
) -> Vec<ProductViewDetail> {
    list_all(
        ctx,
        "Service Catalog Products",
        move |token| ctx.client().search_products_as_admin(token),
        errors,
    )
    .await
}

async fn product_ids<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
    errors: &mut Errors,
) -> Vec<String> {
    products(ctx, errors)
        .await
        .iter()
        .filter_map(|product| present(product.product_id()).map(str::to_owned))
        .collect()
}

/// Errs with the listing error when the account's tag options were never
/// migrated to Service Catalog.
async fn tag_option_ids<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
    errors: &mut Errors,
) -> Result<Vec<String>, ApiError> {
    let tag_options = list_until(
        ctx,
        "Service Catalog Tag Options",
        move |token| ctx.client().list_tag_options(token),
        |e| e.code_equals(TAG_OPTION_NOT_MIGRATED),
        errors,
    )
    .await?;
    Ok(tag_options
        .into_iter()
        .filter_map(|tag_option| tag_option.id.filter(|id| !id.is_empty()))
        .collect())
}

/// Budgets associated with portfolios and with products.
pub async fn sweep_budget_resource_associations<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let mut resources = vec![];

    let mut parents = portfolio_ids(ctx, &mut errors).await;
    parents.extend(product_ids(ctx, &mut errors).await);
    for resource_id in parents {
        let id = resource_id.as_str();
        let budgets = list_all(
            ctx,
            &format!("Service Catalog Budgets for {id}"),
            move |token| ctx.client().list_budgets_for_resource(id, token),
            &mut errors,
        )
        .await;
        for budget in budgets {
            let Some(budget_name) = budget.budget_name.filter(|name| !name.is_empty()) else {
                continue;
            };
            let id = BudgetResourceAssociationId {
                budget_name,
                resource_id: resource_id.clone(),
            };
            resources.push(SweepResource::new(
                BUDGET_RESOURCE_ASSOCIATION,
                id.to_string(),
                destroy::budget_resource_association::<C>,
            ));
        }
    }

    complete_sweep(
        ctx,
        "Service Catalog Budget Resource Associations",
        resources,
        errors,
    )
    .await
}

pub async fn sweep_constraints<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let mut resources = vec![];

    // constraints can only be listed per portfolio
    for portfolio_id in portfolio_ids(ctx, &mut errors).await {
        let id = portfolio_id.as_str();
        let constraints = list_all(
            ctx,
            &format!("Service Catalog Constraints for portfolio {id}"),
            move |token| ctx.client().list_constraints_for_portfolio(id, token),
            &mut errors,
        )
        .await;
        for constraint in constraints {
            if let Some(id) = present(constraint.constraint_id.as_deref()) {
                resources.push(SweepResource::new(CONSTRAINT, id, destroy::constraint::<C>));
            }
        }
    }

    complete_sweep(ctx, "Service Catalog Constraints", resources, errors).await
}

pub async fn sweep_principal_portfolio_associations<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let mut resources = vec![];

    for portfolio_id in portfolio_ids(ctx, &mut errors).await {
        let id = portfolio_id.as_str();
        let principals = list_all(
            ctx,
            &format!("Service Catalog Principals for portfolio {id}"),
            move |token| ctx.client().list_principals_for_portfolio(id, token),
            &mut errors,
        )
        .await;
        for principal in principals {
            let (Some(principal_arn), Some(principal_type)) = (
                principal.principal_arn.filter(|arn| !arn.is_empty()),
                principal.principal_type.filter(|ty| !ty.is_empty()),
            ) else {
                continue;
            };
            let id = PrincipalPortfolioAssociationId {
                accept_language: ACCEPT_LANGUAGE_ENGLISH.to_owned(),
                principal_arn,
                portfolio_id: portfolio_id.clone(),
                principal_type,
            };
            resources.push(SweepResource::new(
                PRINCIPAL_PORTFOLIO_ASSOCIATION,
                id.to_string(),
                destroy::principal_portfolio_association::<C>,
            ));
        }
    }

    complete_sweep(
        ctx,
        "Service Catalog Principal Portfolio Associations",
        resources,
        errors,
    )
    .await
}

/// Product IDs are taken from the product ARN, eg.
/// `arn:aws:catalog:us-west-2:187416307283:product/prod-t5thhvquxw2x2`.
fn product_id_from_arn(arn: &str) -> sweep::Result<String> {
    let parsed: Arn = arn.parse()?;
    let (_, id) = parsed.resource_type_and_id().ok_or_else(|| Error::Parse {
        what: "product ARN resource",
        value: arn.to_owned(),
        msg: "expected <type>/<id>".to_owned(),
    })?;
    Ok(id.to_owned())
}

pub async fn sweep_product_portfolio_associations<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let mut resources = vec![];

    // associations can only be listed per product
    for product in products(ctx, &mut errors).await {
        let Some(product_arn) = product.product_arn.as_deref() else {
            continue;
        };
        let product_id = match product_id_from_arn(product_arn) {
            Ok(product_id) => product_id,
            Err(e) => {
                log::warn!("  {e}");
                errors.push(e);
                continue;
            }
        };

        let id = product_id.as_str();
        let portfolios = list_all(
            ctx,
            &format!("Service Catalog Portfolios for product {id}"),
            move |token| ctx.client().list_portfolios_for_product(id, token),
            &mut errors,
        )
        .await;
        for portfolio in portfolios {
            let Some(portfolio_id) = portfolio.id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let id = ProductPortfolioAssociationId {
                accept_language: ACCEPT_LANGUAGE_ENGLISH.to_owned(),
                portfolio_id,
                product_id: product_id.clone(),
            };
            resources.push(SweepResource::new(
                PRODUCT_PORTFOLIO_ASSOCIATION,
                id.to_string(),
                destroy::product_portfolio_association::<C>,
            ));
        }
    }

    complete_sweep(
        ctx,
        "Service Catalog Product Portfolio Associations",
        resources,
        errors,
    )
    .await
}

pub async fn sweep_products<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let resources = product_ids(ctx, &mut errors)
        .await
        .into_iter()
        .map(|id| SweepResource::new(PRODUCT, id, destroy::product::<C>))
        .collect();

    complete_sweep(ctx, "Service Catalog Products", resources, errors).await
}

/// Provisioned products are terminated with `ignore_errors`, so a product
/// whose stack cannot be torn down does not fail the sweep.
pub async fn sweep_provisioned_products<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let resources = list_all(
        ctx,
        "Service Catalog Provisioned Products",
        move |token| ctx.client().search_provisioned_products(token),
        &mut errors,
    )
    .await
    .into_iter()
    .filter_map(|provisioned| provisioned.id.filter(|id| !id.is_empty()))
    .map(|id| {
        SweepResource::new(PROVISIONED_PRODUCT, id, destroy::provisioned_product::<C>)
            .with_ignore_errors(true)
    })
    .collect();

    complete_sweep(
        ctx,
        "Service Catalog Provisioned Products",
        resources,
        errors,
    )
    .await
}

pub async fn sweep_provisioning_artifacts<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let mut resources = vec![];

    for product_id in product_ids(ctx, &mut errors).await {
        // the remote call has no page token, one fetch per product
        let call = ctx.client().list_provisioning_artifacts(&product_id);
        let artifacts = match ctx.call(call).await {
            Ok(artifacts) => artifacts,
            Err(source) => {
                errors.push(Error::List {
                    what: format!("Service Catalog Provisioning Artifacts for product {product_id}"),
                    region: ctx.region().to_owned(),
                    source,
                });
                continue;
            }
        };
        for artifact in artifacts {
            let Some(artifact_id) = artifact.id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let id = ProvisioningArtifactId {
                artifact_id,
                product_id: product_id.clone(),
            };
            resources.push(SweepResource::new(
                PROVISIONING_ARTIFACT,
                id.to_string(),
                destroy::provisioning_artifact::<C>,
            ));
        }
    }

    complete_sweep(
        ctx,
        "Service Catalog Provisioning Artifacts",
        resources,
        errors,
    )
    .await
}

pub async fn sweep_service_actions<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let mut errors = Errors::default();
    let resources = list_all(
        ctx,
        "Service Catalog Service Actions",
        move |token| ctx.client().list_service_actions(token),
        &mut errors,
    )
    .await
    .into_iter()
    .filter_map(|action| action.id.filter(|id| !id.is_empty()))
    .map(|id| SweepResource::new(SERVICE_ACTION, id, destroy::service_action::<C>))
    .collect();

    complete_sweep(ctx, "Service Catalog Service Actions", resources, errors).await
}

pub async fn sweep_tag_option_resource_associations<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let what = "Service Catalog Tag Option Resource Associations";
    let mut errors = Errors::default();
    let mut resources = vec![];

    let tag_option_ids = match tag_option_ids(ctx, &mut errors).await {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("Skipping {what} sweep for {}: {e}", ctx.region());
            return Ok(SweepSummary::default());
        }
    };
    for tag_option_id in tag_option_ids {
        let id = tag_option_id.as_str();
        let details = list_all(
            ctx,
            &format!("Service Catalog Resources for tag option {id}"),
            move |token| ctx.client().list_resources_for_tag_option(id, token),
            &mut errors,
        )
        .await;
        for detail in details {
            let Some(resource_id) = detail.id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let id = TagOptionResourceAssociationId {
                tag_option_id: tag_option_id.clone(),
                resource_id,
            };
            resources.push(SweepResource::new(
                TAG_OPTION_RESOURCE_ASSOCIATION,
                id.to_string(),
                destroy::tag_option_resource_association::<C>,
            ));
        }
    }

    complete_sweep(ctx, what, resources, errors).await
}

pub async fn sweep_tag_options<C: ServiceCatalog>(
    ctx: &SweepContext<C>,
) -> sweep::Result<SweepSummary> {
    let what = "Service Catalog Tag Options";
    let mut errors = Errors::default();

    let resources = match tag_option_ids(ctx, &mut errors).await {
        Ok(ids) => ids
            .into_iter()
            .map(|id| SweepResource::new(TAG_OPTION, id, destroy::tag_option::<C>))
            .collect(),
        Err(e) => {
            log::warn!("Skipping {what} sweep for {}: {e}", ctx.region());
            return Ok(SweepSummary::default());
        }
    };

    complete_sweep(ctx, what, resources, errors).await
}
