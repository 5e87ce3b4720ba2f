//! AWS Service Catalog through the SDK.
use aws_config::SdkConfig;
use aws_sdk_servicecatalog::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types as aws,
};

use crate::{
    remote::ApiError,
    servicecatalog::{
        BudgetDetail, ConstraintDetail, PortfolioDetail, Principal,
        PrincipalPortfolioAssociationId, ProductPortfolioAssociationId, ProductViewDetail,
        ProductViewSummary, ProvisionedProduct, ProvisioningArtifactDetail, ProvisioningArtifactId,
        ResourceDetail, ServiceActionSummary, ServiceCatalog, TagOptionDetail,
        TagOptionResourceAssociationId,
    },
    Page,
};

/// Convert an SDK error, keeping the service's error code.
fn api_error<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => {
            let e = service.err();
            ApiError::service(
                e.code().unwrap_or("Unknown"),
                e.message().unwrap_or_default(),
            )
        }
        _ => ApiError::transport(DisplayErrorContext(&err).to_string()),
    }
}

fn owned(s: Option<&str>) -> Option<String> {
    s.map(str::to_owned)
}

impl From<&aws::PortfolioDetail> for PortfolioDetail {
    fn from(value: &aws::PortfolioDetail) -> Self {
        PortfolioDetail {
            id: owned(value.id()),
            display_name: owned(value.display_name()),
        }
    }
}

impl From<&aws::ProductViewDetail> for ProductViewDetail {
    fn from(value: &aws::ProductViewDetail) -> Self {
        ProductViewDetail {
            product_arn: owned(value.product_arn()),
            summary: value
                .product_view_summary()
                .map(|summary| ProductViewSummary {
                    product_id: owned(summary.product_id()),
                    name: owned(summary.name()),
                }),
        }
    }
}

/// Service Catalog client for one region.
#[derive(Debug, Clone)]
pub struct Catalog(pub aws_sdk_servicecatalog::Client);

impl Catalog {
    pub fn new(cfg: &SdkConfig) -> Self {
        Catalog(aws_sdk_servicecatalog::Client::new(cfg))
    }
}

impl ServiceCatalog for Catalog {
    async fn list_portfolios(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<PortfolioDetail>, ApiError> {
        let out = self
            .0
            .list_portfolios()
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        Ok(Page::new(
            out.portfolio_details().iter().map(Into::into).collect(),
            owned(out.next_page_token()),
        ))
    }

    async fn search_products_as_admin(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ProductViewDetail>, ApiError> {
        let out = self
            .0
            .search_products_as_admin()
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        Ok(Page::new(
            out.product_view_details().iter().map(Into::into).collect(),
            owned(out.next_page_token()),
        ))
    }

    async fn list_budgets_for_resource(
        &self,
        resource_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<BudgetDetail>, ApiError> {
        let out = self
            .0
            .list_budgets_for_resource()
            .resource_id(resource_id)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let budgets = out
            .budgets()
            .iter()
            .map(|budget| BudgetDetail {
                budget_name: owned(budget.budget_name()),
            })
            .collect();
        Ok(Page::new(budgets, owned(out.next_page_token())))
    }

    async fn list_constraints_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ConstraintDetail>, ApiError> {
        let out = self
            .0
            .list_constraints_for_portfolio()
            .portfolio_id(portfolio_id)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let constraints = out
            .constraint_details()
            .iter()
            .map(|constraint| ConstraintDetail {
                constraint_id: owned(constraint.constraint_id()),
            })
            .collect();
        Ok(Page::new(constraints, owned(out.next_page_token())))
    }

    async fn list_principals_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<Principal>, ApiError> {
        let out = self
            .0
            .list_principals_for_portfolio()
            .portfolio_id(portfolio_id)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let principals = out
            .principals()
            .iter()
            .map(|principal| Principal {
                principal_arn: owned(principal.principal_arn()),
                principal_type: principal.principal_type().map(|ty| ty.as_str().to_owned()),
            })
            .collect();
        Ok(Page::new(principals, owned(out.next_page_token())))
    }

    async fn list_portfolios_for_product(
        &self,
        product_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<PortfolioDetail>, ApiError> {
        let out = self
            .0
            .list_portfolios_for_product()
            .product_id(product_id)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        Ok(Page::new(
            out.portfolio_details().iter().map(Into::into).collect(),
            owned(out.next_page_token()),
        ))
    }

    async fn search_provisioned_products(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ProvisionedProduct>, ApiError> {
        // "self" is the only value the account filter supports
        let filter = aws::AccessLevelFilter::builder()
            .key(aws::AccessLevelFilterKey::Account)
            .value("self")
            .build();
        let out = self
            .0
            .search_provisioned_products()
            .access_level_filter(filter)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let provisioned = out
            .provisioned_products()
            .iter()
            .map(|product| ProvisionedProduct {
                id: owned(product.id()),
                name: owned(product.name()),
            })
            .collect();
        Ok(Page::new(provisioned, owned(out.next_page_token())))
    }

    async fn list_provisioning_artifacts(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProvisioningArtifactDetail>, ApiError> {
        let out = self
            .0
            .list_provisioning_artifacts()
            .product_id(product_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(out
            .provisioning_artifact_details()
            .iter()
            .map(|artifact| ProvisioningArtifactDetail {
                id: owned(artifact.id()),
            })
            .collect())
    }

    async fn list_service_actions(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ServiceActionSummary>, ApiError> {
        let out = self
            .0
            .list_service_actions()
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let actions = out
            .service_action_summaries()
            .iter()
            .map(|action| ServiceActionSummary {
                id: owned(action.id()),
            })
            .collect();
        Ok(Page::new(actions, owned(out.next_page_token())))
    }

    async fn list_tag_options(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<TagOptionDetail>, ApiError> {
        let out = self
            .0
            .list_tag_options()
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let tag_options = out
            .tag_option_details()
            .iter()
            .map(|tag_option| TagOptionDetail {
                id: owned(tag_option.id()),
            })
            .collect();
        Ok(Page::new(tag_options, owned(out.page_token())))
    }

    async fn list_resources_for_tag_option(
        &self,
        tag_option_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ResourceDetail>, ApiError> {
        let out = self
            .0
            .list_resources_for_tag_option()
            .tag_option_id(tag_option_id)
            .set_page_token(page_token)
            .send()
            .await
            .map_err(api_error)?;
        let resources = out
            .resource_details()
            .iter()
            .map(|resource| ResourceDetail {
                id: owned(resource.id()),
            })
            .collect();
        Ok(Page::new(resources, owned(out.page_token())))
    }

    async fn disassociate_budget_from_resource(
        &self,
        budget_name: &str,
        resource_id: &str,
    ) -> Result<(), ApiError> {
        self.0
            .disassociate_budget_from_resource()
            .budget_name(budget_name)
            .resource_id(resource_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn delete_constraint(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        self.0
            .delete_constraint()
            .accept_language(accept_language)
            .id(id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn disassociate_principal_from_portfolio(
        &self,
        id: &PrincipalPortfolioAssociationId,
    ) -> Result<(), ApiError> {
        self.0
            .disassociate_principal_from_portfolio()
            .accept_language(&id.accept_language)
            .portfolio_id(&id.portfolio_id)
            .principal_arn(&id.principal_arn)
            .principal_type(aws::PrincipalType::from(id.principal_type.as_str()))
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn disassociate_product_from_portfolio(
        &self,
        id: &ProductPortfolioAssociationId,
    ) -> Result<(), ApiError> {
        self.0
            .disassociate_product_from_portfolio()
            .accept_language(&id.accept_language)
            .portfolio_id(&id.portfolio_id)
            .product_id(&id.product_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn delete_product(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        self.0
            .delete_product()
            .accept_language(accept_language)
            .id(id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn terminate_provisioned_product(
        &self,
        accept_language: &str,
        id: &str,
        ignore_errors: bool,
    ) -> Result<(), ApiError> {
        self.0
            .terminate_provisioned_product()
            .accept_language(accept_language)
            .provisioned_product_id(id)
            .ignore_errors(ignore_errors)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn delete_provisioning_artifact(
        &self,
        accept_language: &str,
        id: &ProvisioningArtifactId,
    ) -> Result<(), ApiError> {
        self.0
            .delete_provisioning_artifact()
            .accept_language(accept_language)
            .product_id(&id.product_id)
            .provisioning_artifact_id(&id.artifact_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn delete_service_action(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        self.0
            .delete_service_action()
            .accept_language(accept_language)
            .id(id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn disassociate_tag_option_from_resource(
        &self,
        id: &TagOptionResourceAssociationId,
    ) -> Result<(), ApiError> {
        self.0
            .disassociate_tag_option_from_resource()
            .resource_id(&id.resource_id)
            .tag_option_id(&id.tag_option_id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }

    async fn delete_tag_option(&self, id: &str) -> Result<(), ApiError> {
        self.0
            .delete_tag_option()
            .id(id)
            .send()
            .await
            .map_err(api_error)?;
        Ok(())
    }
}
