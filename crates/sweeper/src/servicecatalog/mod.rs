//! Sweepers for AWS Service Catalog.
//!
//! Service Catalog has no "delete everything" call, and several of its
//! resources (budgets, constraints, principals and product associations)
//! can only be listed through the portfolio or product they hang off. The
//! enumerators in this module walk those parents, build one
//! [`SweepResource`](crate::SweepResource) per child and hand them all to
//! the orchestrator.
//!
//! The remote API is abstracted by [`ServiceCatalog`]; the SDK backed
//! implementation is [`crate::aws::servicecatalog::Catalog`].
use std::future::Future;

use crate::{self as sweep, remote::ApiError, Page, Registry, ResourceId};

mod destroy;
mod enumerate;
#[cfg(test)]
mod test;

pub use enumerate::*;

/// The language code sent with calls that accept one.
pub const ACCEPT_LANGUAGE_ENGLISH: &str = "en";

pub const BUDGET_RESOURCE_ASSOCIATION: &str = "aws_servicecatalog_budget_resource_association";
pub const CONSTRAINT: &str = "aws_servicecatalog_constraint";
pub const PRINCIPAL_PORTFOLIO_ASSOCIATION: &str =
    "aws_servicecatalog_principal_portfolio_association";
pub const PRODUCT_PORTFOLIO_ASSOCIATION: &str = "aws_servicecatalog_product_portfolio_association";
pub const PRODUCT: &str = "aws_servicecatalog_product";
pub const PROVISIONED_PRODUCT: &str = "aws_servicecatalog_provisioned_product";
pub const PROVISIONING_ARTIFACT: &str = "aws_servicecatalog_provisioning_artifact";
pub const SERVICE_ACTION: &str = "aws_servicecatalog_service_action";
pub const TAG_OPTION_RESOURCE_ASSOCIATION: &str =
    "aws_servicecatalog_tag_option_resource_association";
pub const TAG_OPTION: &str = "aws_servicecatalog_tag_option";

/// Returned by tag option calls in accounts whose tag options were never
/// migrated to Service Catalog.
pub const TAG_OPTION_NOT_MIGRATED: &str = "TagOptionNotMigratedException";

/// `budget_name:resource_id`
#[derive(ResourceId, Debug, Clone, PartialEq, Eq)]
pub struct BudgetResourceAssociationId {
    pub budget_name: String,
    pub resource_id: String,
}

/// `accept_language,principal_arn,portfolio_id,principal_type`
///
/// Principal ARNs contain colons, hence the comma. IAM names may contain
/// commas too, so the ARN takes whatever is left between the other parts.
#[derive(ResourceId, Debug, Clone, PartialEq, Eq)]
#[resource_id(separator = ",")]
pub struct PrincipalPortfolioAssociationId {
    pub accept_language: String,
    #[resource_id(rest)]
    pub principal_arn: String,
    pub portfolio_id: String,
    pub principal_type: String,
}

/// `accept_language:portfolio_id:product_id`
#[derive(ResourceId, Debug, Clone, PartialEq, Eq)]
pub struct ProductPortfolioAssociationId {
    pub accept_language: String,
    pub portfolio_id: String,
    pub product_id: String,
}

/// `artifact_id:product_id`
#[derive(ResourceId, Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningArtifactId {
    pub artifact_id: String,
    pub product_id: String,
}

/// `tag_option_id:resource_id`
#[derive(ResourceId, Debug, Clone, PartialEq, Eq)]
pub struct TagOptionResourceAssociationId {
    pub tag_option_id: String,
    pub resource_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioDetail {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductViewSummary {
    pub product_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductViewDetail {
    pub product_arn: Option<String>,
    pub summary: Option<ProductViewSummary>,
}

impl ProductViewDetail {
    pub fn product_id(&self) -> Option<&str> {
        self.summary.as_ref()?.product_id.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetDetail {
    pub budget_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintDetail {
    pub constraint_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    pub principal_arn: Option<String>,
    pub principal_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisionedProduct {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningArtifactDetail {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceActionSummary {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagOptionDetail {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDetail {
    pub id: Option<String>,
}

/// The Service Catalog calls the sweepers use.
///
/// List calls take the token of the page to fetch and return one
/// [`Page`]. Delete calls take already parsed identifier parts.
pub trait ServiceCatalog {
    fn list_portfolios(
        &self,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<PortfolioDetail>, ApiError>>;

    fn search_products_as_admin(
        &self,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<ProductViewDetail>, ApiError>>;

    fn list_budgets_for_resource(
        &self,
        resource_id: &str,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<BudgetDetail>, ApiError>>;

    fn list_constraints_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<ConstraintDetail>, ApiError>>;

    fn list_principals_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<Principal>, ApiError>>;

    fn list_portfolios_for_product(
        &self,
        product_id: &str,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<PortfolioDetail>, ApiError>>;

    /// Provisioned products visible to the calling account.
    fn search_provisioned_products(
        &self,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<ProvisionedProduct>, ApiError>>;

    /// The remote call takes no page token, so this is always a single
    /// fetch.
    fn list_provisioning_artifacts(
        &self,
        product_id: &str,
    ) -> impl Future<Output = Result<Vec<ProvisioningArtifactDetail>, ApiError>>;

    fn list_service_actions(
        &self,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<ServiceActionSummary>, ApiError>>;

    fn list_tag_options(
        &self,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<TagOptionDetail>, ApiError>>;

    fn list_resources_for_tag_option(
        &self,
        tag_option_id: &str,
        page_token: Option<String>,
    ) -> impl Future<Output = Result<Page<ResourceDetail>, ApiError>>;

    fn disassociate_budget_from_resource(
        &self,
        budget_name: &str,
        resource_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn delete_constraint(
        &self,
        accept_language: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn disassociate_principal_from_portfolio(
        &self,
        id: &PrincipalPortfolioAssociationId,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn disassociate_product_from_portfolio(
        &self,
        id: &ProductPortfolioAssociationId,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn delete_product(
        &self,
        accept_language: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn terminate_provisioned_product(
        &self,
        accept_language: &str,
        id: &str,
        ignore_errors: bool,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn delete_provisioning_artifact(
        &self,
        accept_language: &str,
        id: &ProvisioningArtifactId,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn delete_service_action(
        &self,
        accept_language: &str,
        id: &str,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn disassociate_tag_option_from_resource(
        &self,
        id: &TagOptionResourceAssociationId,
    ) -> impl Future<Output = Result<(), ApiError>>;

    fn delete_tag_option(&self, id: &str) -> impl Future<Output = Result<(), ApiError>>;
}

/// Registers every Service Catalog sweeper.
///
/// Provisioning artifacts are swept before products.
pub fn register_sweepers<C: ServiceCatalog + 'static>(
    registry: &mut Registry<C>,
) -> sweep::Result<()> {
    use futures::FutureExt;

    registry
        .add(BUDGET_RESOURCE_ASSOCIATION, &[], |ctx| {
            sweep_budget_resource_associations(ctx).boxed_local()
        })?
        .add(CONSTRAINT, &[], |ctx| sweep_constraints(ctx).boxed_local())?
        .add(PRINCIPAL_PORTFOLIO_ASSOCIATION, &[], |ctx| {
            sweep_principal_portfolio_associations(ctx).boxed_local()
        })?
        .add(PRODUCT_PORTFOLIO_ASSOCIATION, &[], |ctx| {
            sweep_product_portfolio_associations(ctx).boxed_local()
        })?
        .add(PRODUCT, &[PROVISIONING_ARTIFACT], |ctx| {
            sweep_products(ctx).boxed_local()
        })?
        .add(PROVISIONED_PRODUCT, &[], |ctx| {
            sweep_provisioned_products(ctx).boxed_local()
        })?
        .add(PROVISIONING_ARTIFACT, &[], |ctx| {
            sweep_provisioning_artifacts(ctx).boxed_local()
        })?
        .add(SERVICE_ACTION, &[], |ctx| {
            sweep_service_actions(ctx).boxed_local()
        })?
        .add(TAG_OPTION_RESOURCE_ASSOCIATION, &[], |ctx| {
            sweep_tag_option_resource_associations(ctx).boxed_local()
        })?
        .add(TAG_OPTION, &[], |ctx| sweep_tag_options(ctx).boxed_local())?;
    Ok(())
}
