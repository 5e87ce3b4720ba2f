use std::{collections::BTreeMap, sync::Mutex};

use pretty_assertions::assert_eq;

use super::*;
use crate::{Error, SweepContext, SweepResource, SweepSummary};

const PAGE_SIZE: usize = 2;

/// Serves `items` two at a time. The token is the index of the next item.
fn page<T: Clone>(items: &[T], token: Option<String>) -> Page<T> {
    let start = token.map(|t| t.parse::<usize>().unwrap()).unwrap_or(0);
    let end = (start + PAGE_SIZE).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Page::new(items[start..end].to_vec(), next)
}

/// An in-memory Service Catalog.
#[derive(Default)]
struct FakeCatalog {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    portfolios: Vec<PortfolioDetail>,
    products: Vec<ProductViewDetail>,
    budgets: BTreeMap<String, Vec<BudgetDetail>>,
    constraints: BTreeMap<String, Vec<ConstraintDetail>>,
    principals: BTreeMap<String, Vec<Principal>>,
    product_portfolios: BTreeMap<String, Vec<PortfolioDetail>>,
    provisioned: Vec<ProvisionedProduct>,
    artifacts: BTreeMap<String, Vec<ProvisioningArtifactDetail>>,
    service_actions: Vec<ServiceActionSummary>,
    tag_options: Vec<TagOptionDetail>,
    tag_option_resources: BTreeMap<String, Vec<ResourceDetail>>,
    /// Calls (`"<call> <argument>"` or just `"<call>"`) that fail.
    failures: BTreeMap<String, ApiError>,
    calls: Vec<String>,
    deleted: Vec<String>,
}

impl FakeCatalog {
    fn with(f: impl FnOnce(&mut State)) -> Self {
        let catalog = FakeCatalog::default();
        f(&mut catalog.state.lock().unwrap());
        catalog
    }

    /// Record a call, failing it if it was set up to fail.
    fn call(&self, call: &str, arg: Option<&str>) -> Result<(), ApiError> {
        let key = match arg {
            Some(arg) => format!("{call} {arg}"),
            None => call.to_owned(),
        };
        let mut state = self.state.lock().unwrap();
        state.calls.push(key.clone());
        match state.failures.get(&key).or_else(|| state.failures.get(call)) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn delete(&self, call: &str, id: impl core::fmt::Display) -> Result<(), ApiError> {
        let id = id.to_string();
        self.call(call, Some(&id))?;
        self.state
            .lock()
            .unwrap()
            .deleted
            .push(format!("{call} {id}"));
        Ok(())
    }

    fn deleted(&self) -> Vec<String> {
        let mut deleted = self.state.lock().unwrap().deleted.clone();
        deleted.sort();
        deleted
    }

    fn count_calls(&self, key: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.iter().filter(|c| *c == key).count()
    }
}

fn from_map<T: Clone>(map: &BTreeMap<String, Vec<T>>, key: &str, token: Option<String>) -> Page<T> {
    page(map.get(key).map(Vec::as_slice).unwrap_or_default(), token)
}

impl ServiceCatalog for FakeCatalog {
    async fn list_portfolios(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<PortfolioDetail>, ApiError> {
        self.call("list_portfolios", None)?;
        Ok(page(&self.state.lock().unwrap().portfolios, page_token))
    }

    async fn search_products_as_admin(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ProductViewDetail>, ApiError> {
        self.call("search_products_as_admin", None)?;
        Ok(page(&self.state.lock().unwrap().products, page_token))
    }

    async fn list_budgets_for_resource(
        &self,
        resource_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<BudgetDetail>, ApiError> {
        self.call("list_budgets_for_resource", Some(resource_id))?;
        Ok(from_map(&self.state.lock().unwrap().budgets, resource_id, page_token))
    }

    async fn list_constraints_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ConstraintDetail>, ApiError> {
        self.call("list_constraints_for_portfolio", Some(portfolio_id))?;
        Ok(from_map(
            &self.state.lock().unwrap().constraints,
            portfolio_id,
            page_token,
        ))
    }

    async fn list_principals_for_portfolio(
        &self,
        portfolio_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<Principal>, ApiError> {
        self.call("list_principals_for_portfolio", Some(portfolio_id))?;
        Ok(from_map(
            &self.state.lock().unwrap().principals,
            portfolio_id,
            page_token,
        ))
    }

    async fn list_portfolios_for_product(
        &self,
        product_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<PortfolioDetail>, ApiError> {
        self.call("list_portfolios_for_product", Some(product_id))?;
        Ok(from_map(
            &self.state.lock().unwrap().product_portfolios,
            product_id,
            page_token,
        ))
    }

    async fn search_provisioned_products(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ProvisionedProduct>, ApiError> {
        self.call("search_provisioned_products", None)?;
        Ok(page(&self.state.lock().unwrap().provisioned, page_token))
    }

    async fn list_provisioning_artifacts(
        &self,
        product_id: &str,
    ) -> Result<Vec<ProvisioningArtifactDetail>, ApiError> {
        self.call("list_provisioning_artifacts", Some(product_id))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .artifacts
            .get(product_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_service_actions(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<ServiceActionSummary>, ApiError> {
        self.call("list_service_actions", None)?;
        Ok(page(&self.state.lock().unwrap().service_actions, page_token))
    }

    async fn list_tag_options(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<TagOptionDetail>, ApiError> {
        self.call("list_tag_options", None)?;
        Ok(page(&self.state.lock().unwrap().tag_options, page_token))
    }

    async fn list_resources_for_tag_option(
        &self,
        tag_option_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ResourceDetail>, ApiError> {
        self.call("list_resources_for_tag_option", Some(tag_option_id))?;
        Ok(from_map(
            &self.state.lock().unwrap().tag_option_resources,
            tag_option_id,
            page_token,
        ))
    }

    async fn disassociate_budget_from_resource(
        &self,
        budget_name: &str,
        resource_id: &str,
    ) -> Result<(), ApiError> {
        self.delete(
            "disassociate_budget_from_resource",
            format!("{budget_name} {resource_id}"),
        )
    }

    async fn delete_constraint(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        assert_eq!(ACCEPT_LANGUAGE_ENGLISH, accept_language);
        self.delete("delete_constraint", id)
    }

    async fn disassociate_principal_from_portfolio(
        &self,
        id: &PrincipalPortfolioAssociationId,
    ) -> Result<(), ApiError> {
        self.delete("disassociate_principal_from_portfolio", id)
    }

    async fn disassociate_product_from_portfolio(
        &self,
        id: &ProductPortfolioAssociationId,
    ) -> Result<(), ApiError> {
        self.delete("disassociate_product_from_portfolio", id)
    }

    async fn delete_product(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        assert_eq!(ACCEPT_LANGUAGE_ENGLISH, accept_language);
        self.delete("delete_product", id)
    }

    async fn terminate_provisioned_product(
        &self,
        accept_language: &str,
        id: &str,
        ignore_errors: bool,
    ) -> Result<(), ApiError> {
        assert_eq!(ACCEPT_LANGUAGE_ENGLISH, accept_language);
        self.delete(
            "terminate_provisioned_product",
            format!("{id} ignore_errors={ignore_errors}"),
        )
    }

    async fn delete_provisioning_artifact(
        &self,
        accept_language: &str,
        id: &ProvisioningArtifactId,
    ) -> Result<(), ApiError> {
        assert_eq!(ACCEPT_LANGUAGE_ENGLISH, accept_language);
        self.delete("delete_provisioning_artifact", id)
    }

    async fn delete_service_action(&self, accept_language: &str, id: &str) -> Result<(), ApiError> {
        assert_eq!(ACCEPT_LANGUAGE_ENGLISH, accept_language);
        self.delete("delete_service_action", id)
    }

    async fn disassociate_tag_option_from_resource(
        &self,
        id: &TagOptionResourceAssociationId,
    ) -> Result<(), ApiError> {
        self.delete("disassociate_tag_option_from_resource", id)
    }

    async fn delete_tag_option(&self, id: &str) -> Result<(), ApiError> {
        self.delete("delete_tag_option", id)
    }
}

fn portfolio(id: &str) -> PortfolioDetail {
    PortfolioDetail {
        id: Some(id.to_owned()),
        display_name: Some(format!("tf-acc-test-{id}")),
    }
}

fn product(id: &str) -> ProductViewDetail {
    ProductViewDetail {
        product_arn: Some(format!(
            "arn:aws:catalog:us-west-2:187416307283:product/{id}"
        )),
        summary: Some(ProductViewSummary {
            product_id: Some(id.to_owned()),
            name: Some(format!("tf-acc-test-{id}")),
        }),
    }
}

fn ctx(catalog: FakeCatalog) -> SweepContext<FakeCatalog> {
    SweepContext::new("us-west-2", catalog)
}

#[tokio::test]
async fn budget_associations_of_portfolios_and_products() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        s.portfolios = vec![portfolio("port-1"), PortfolioDetail::default()];
        s.products = vec![product("prod-1")];
        s.budgets.insert(
            "port-1".into(),
            vec![BudgetDetail {
                budget_name: Some("budget-a".into()),
            }],
        );
        s.budgets.insert(
            "prod-1".into(),
            vec![
                BudgetDetail {
                    budget_name: Some("budget-b".into()),
                },
                BudgetDetail { budget_name: None },
            ],
        );
    }));
    let summary = sweep_budget_resource_associations(&ctx).await.unwrap();
    assert_eq!(2, summary.destroyed);
    assert_eq!(
        vec![
            "disassociate_budget_from_resource budget-a port-1",
            "disassociate_budget_from_resource budget-b prod-1",
        ],
        ctx.client().deleted()
    );
}

#[tokio::test]
async fn constraints_are_listed_across_pages() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.portfolios = vec![portfolio("port-1"), portfolio("port-2"), portfolio("port-3")];
        s.constraints.insert(
            "port-1".into(),
            ["cons-1", "cons-2", "cons-3"]
                .into_iter()
                .map(|id| ConstraintDetail {
                    constraint_id: Some(id.into()),
                })
                .chain(Some(ConstraintDetail {
                    constraint_id: Some(String::new()),
                }))
                .collect(),
        );
        s.constraints.insert(
            "port-3".into(),
            vec![ConstraintDetail {
                constraint_id: Some("cons-4".into()),
            }],
        );
    }));
    let summary = sweep_constraints(&ctx).await.unwrap();
    assert_eq!(4, summary.destroyed);
    assert_eq!(
        vec![
            "delete_constraint cons-1",
            "delete_constraint cons-2",
            "delete_constraint cons-3",
            "delete_constraint cons-4",
        ],
        ctx.client().deleted()
    );
    // port-1 has four constraints, two per page
    assert_eq!(
        2,
        ctx.client()
            .count_calls("list_constraints_for_portfolio port-1")
    );
    assert_eq!(2, ctx.client().count_calls("list_portfolios"));
}

#[tokio::test]
async fn nested_listing_failure_moves_on_to_the_next_parent() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        s.portfolios = vec![portfolio("port-1"), portfolio("port-2")];
        for id in ["port-1", "port-2"] {
            s.constraints.insert(
                id.into(),
                vec![ConstraintDetail {
                    constraint_id: Some(format!("cons-{id}")),
                }],
            );
        }
        s.failures.insert(
            "list_constraints_for_portfolio port-1".into(),
            ApiError::service("ThrottlingException", "Rate exceeded"),
        );
    }));
    let err = sweep_constraints(&ctx).await.unwrap_err();
    assert_eq!(vec!["delete_constraint cons-port-2"], ctx.client().deleted());
    let Error::Multiple { errors } = &err else {
        panic!("expected a combined error, got {err}");
    };
    assert!(
        matches!(errors.as_slice(), [Error::List { what, .. }] if what.contains("port-1")),
        "{err}"
    );
}

#[tokio::test]
async fn principal_associations_use_commas() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.portfolios = vec![portfolio("port-1")];
        s.principals.insert(
            "port-1".into(),
            vec![
                Principal {
                    principal_arn: Some("arn:aws:iam::123456789012:user/tester".into()),
                    principal_type: Some("IAM".into()),
                },
                Principal {
                    principal_arn: None,
                    principal_type: Some("IAM".into()),
                },
            ],
        );
    }));
    sweep_principal_portfolio_associations(&ctx).await.unwrap();
    assert_eq!(
        vec![
            "disassociate_principal_from_portfolio \
             en,arn:aws:iam::123456789012:user/tester,port-1,IAM"
        ],
        ctx.client().deleted()
    );
}

#[tokio::test]
async fn product_associations_skip_only_malformed_arns() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        let mut bad = product("prod-bad");
        bad.product_arn = Some("not-an-arn".into());
        let mut no_id = product("prod-no-id");
        no_id.product_arn = Some("arn:aws:catalog:us-west-2:187416307283:product".into());
        s.products = vec![bad, product("prod-1"), no_id];
        s.product_portfolios
            .insert("prod-1".into(), vec![portfolio("port-1"), portfolio("port-2")]);
    }));
    let err = sweep_product_portfolio_associations(&ctx).await.unwrap_err();
    assert_eq!(
        vec![
            "disassociate_product_from_portfolio en:port-1:prod-1",
            "disassociate_product_from_portfolio en:port-2:prod-1",
        ],
        ctx.client().deleted()
    );
    assert_eq!(2, err.count(), "{err}");
    let msg = err.to_string();
    assert!(msg.contains("Could not parse ARN 'not-an-arn'"), "{msg}");
    assert!(msg.contains("product ARN resource"), "{msg}");
}

#[tokio::test]
async fn products_without_a_summary_are_dropped() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.products = vec![
            product("prod-1"),
            ProductViewDetail {
                product_arn: Some("arn:aws:catalog:us-west-2:1:product/prod-2".into()),
                summary: None,
            },
            product("prod-3"),
        ];
    }));
    sweep_products(&ctx).await.unwrap();
    assert_eq!(
        vec!["delete_product prod-1", "delete_product prod-3"],
        ctx.client().deleted()
    );
}

#[tokio::test]
async fn provisioned_products_ignore_errors() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        s.provisioned = vec![
            ProvisionedProduct {
                id: Some("pp-1".into()),
                name: None,
            },
            ProvisionedProduct {
                id: Some("pp-2".into()),
                name: None,
            },
        ];
        s.failures.insert(
            "terminate_provisioned_product pp-2 ignore_errors=true".into(),
            ApiError::service("InvalidStateException", "stack is busy"),
        );
    }));
    let summary = sweep_provisioned_products(&ctx).await.unwrap();
    assert_eq!(
        SweepSummary {
            destroyed: 1,
            skipped: 0,
            ignored: 1
        },
        summary
    );
    assert_eq!(
        vec!["terminate_provisioned_product pp-1 ignore_errors=true"],
        ctx.client().deleted()
    );
}

#[tokio::test]
async fn provisioning_artifacts_are_fetched_once_per_product() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.products = vec![product("prod-1"), product("prod-2")];
        s.artifacts.insert(
            "prod-1".into(),
            ["pa-1", "pa-2", "pa-3"]
                .into_iter()
                .map(|id| ProvisioningArtifactDetail {
                    id: Some(id.into()),
                })
                .collect(),
        );
    }));
    let summary = sweep_provisioning_artifacts(&ctx).await.unwrap();
    assert_eq!(3, summary.destroyed);
    assert_eq!(
        vec![
            "delete_provisioning_artifact pa-1:prod-1",
            "delete_provisioning_artifact pa-2:prod-1",
            "delete_provisioning_artifact pa-3:prod-1",
        ],
        ctx.client().deleted()
    );
    assert_eq!(
        1,
        ctx.client()
            .count_calls("list_provisioning_artifacts prod-1")
    );
    assert_eq!(
        1,
        ctx.client()
            .count_calls("list_provisioning_artifacts prod-2")
    );
}

#[tokio::test]
async fn service_actions() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.service_actions = vec![
            ServiceActionSummary {
                id: Some("act-1".into()),
            },
            ServiceActionSummary { id: None },
        ];
    }));
    sweep_service_actions(&ctx).await.unwrap();
    assert_eq!(vec!["delete_service_action act-1"], ctx.client().deleted());
}

#[tokio::test]
async fn tag_options_and_their_associations() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.tag_options = vec![
            TagOptionDetail {
                id: Some("tag-1".into()),
            },
            TagOptionDetail {
                id: Some("tag-2".into()),
            },
        ];
        s.tag_option_resources.insert(
            "tag-1".into(),
            vec![
                ResourceDetail {
                    id: Some("port-1".into()),
                },
                ResourceDetail {
                    id: Some("prod-1".into()),
                },
            ],
        );
    }));
    sweep_tag_option_resource_associations(&ctx).await.unwrap();
    sweep_tag_options(&ctx).await.unwrap();
    assert_eq!(
        vec![
            "delete_tag_option tag-1",
            "delete_tag_option tag-2",
            "disassociate_tag_option_from_resource tag-1:port-1",
            "disassociate_tag_option_from_resource tag-1:prod-1",
        ],
        ctx.client().deleted()
    );
}

#[tokio::test]
async fn tag_options_not_migrated_skips_the_sweep() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        s.tag_options = vec![TagOptionDetail {
            id: Some("tag-1".into()),
        }];
        s.failures.insert(
            "list_tag_options".into(),
            ApiError::service(TAG_OPTION_NOT_MIGRATED, "Tag options are not migrated"),
        );
    }));
    assert_eq!(
        SweepSummary::default(),
        sweep_tag_options(&ctx).await.unwrap()
    );
    assert_eq!(
        SweepSummary::default(),
        sweep_tag_option_resource_associations(&ctx).await.unwrap()
    );
    assert!(ctx.client().deleted().is_empty());
}

#[tokio::test]
async fn other_tag_option_listing_failures_are_reported() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.failures.insert(
            "list_tag_options".into(),
            ApiError::service("ThrottlingException", "Rate exceeded"),
        );
    }));
    let err = sweep_tag_options(&ctx).await.unwrap_err();
    let Error::Multiple { errors } = &err else {
        panic!("expected a combined error, got {err}");
    };
    assert!(
        matches!(
            errors.as_slice(),
            [Error::List { what, .. }] if what == "Service Catalog Tag Options"
        ),
        "{err}"
    );
}

#[tokio::test]
async fn unsupported_region_is_a_skip() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.failures.insert(
            "list_portfolios".into(),
            ApiError::service("AccessDeniedException", ""),
        );
        s.failures.insert(
            "search_products_as_admin".into(),
            ApiError::transport("dispatch failure: dns error: failed to lookup address information"),
        );
    }));
    sweep_constraints(&ctx).await.unwrap();
    sweep_budget_resource_associations(&ctx).await.unwrap();
    sweep_products(&ctx).await.unwrap();
}

#[tokio::test]
async fn already_deleted_counts_as_destroyed() {
    let ctx = ctx(FakeCatalog::with(|s| {
        s.service_actions = vec![ServiceActionSummary {
            id: Some("act-1".into()),
        }];
        s.failures.insert(
            "delete_service_action act-1".into(),
            ApiError::service("ResourceNotFoundException", "gone"),
        );
    }));
    let summary = sweep_service_actions(&ctx).await.unwrap();
    assert_eq!(1, summary.destroyed);
}

#[tokio::test]
async fn malformed_handle_id_fails_to_destroy() {
    let ctx = ctx(FakeCatalog::default());
    let resource = SweepResource::new(
        PROVISIONING_ARTIFACT,
        "missing-product",
        destroy::provisioning_artifact::<FakeCatalog>,
    );
    let err = crate::sweep_orchestrator(&ctx, vec![resource])
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("InvalidParametersException: unexpected format for ID (missing-product)"),
        "{err}"
    );
    assert!(ctx.client().deleted().is_empty());
}

#[test]
fn composite_ids_round_trip() {
    let budget = BudgetResourceAssociationId {
        budget_name: "budget".into(),
        resource_id: "port-1".into(),
    };
    assert_eq!(budget, budget.to_string().parse().unwrap());

    let principal = PrincipalPortfolioAssociationId {
        accept_language: "en".into(),
        principal_arn: "arn:aws:iam::123456789012:role/tester".into(),
        portfolio_id: "port-1".into(),
        principal_type: "IAM_PATTERN".into(),
    };
    assert_eq!(principal, principal.to_string().parse().unwrap());

    let comma_in_name = PrincipalPortfolioAssociationId {
        principal_arn: "arn:aws:iam::123456789012:role/team,ops".into(),
        portfolio_id: "port-abc".into(),
        principal_type: "IAM".into(),
        ..principal.clone()
    };
    assert_eq!(
        "en,arn:aws:iam::123456789012:role/team,ops,port-abc,IAM",
        comma_in_name.to_string()
    );
    assert_eq!(comma_in_name, comma_in_name.to_string().parse().unwrap());

    let product = ProductPortfolioAssociationId {
        accept_language: "en".into(),
        portfolio_id: "port-1".into(),
        product_id: "prod-1".into(),
    };
    assert_eq!("en:port-1:prod-1", product.to_string());
    assert_eq!(product, product.to_string().parse().unwrap());

    let artifact = ProvisioningArtifactId {
        artifact_id: "pa-1".into(),
        product_id: "prod-1".into(),
    };
    assert_eq!(artifact, artifact.to_string().parse().unwrap());

    let tag = TagOptionResourceAssociationId {
        tag_option_id: "tag-1".into(),
        resource_id: "port-1".into(),
    };
    assert_eq!(tag, tag.to_string().parse().unwrap());

    assert_eq!(
        "accept_language,principal_arn,portfolio_id,principal_type",
        PrincipalPortfolioAssociationId::expected_format()
    );
}

#[test]
fn every_sweeper_is_registered_and_ordered() {
    let mut registry = Registry::<FakeCatalog>::default();
    register_sweepers(&mut registry).unwrap();
    assert_eq!(10, registry.len());
    assert_eq!(
        Some(&[PROVISIONING_ARTIFACT][..]),
        registry.dependencies(PRODUCT)
    );

    let schedule = registry.schedule(&[PRODUCT.to_owned()]).unwrap();
    assert_eq!(vec![vec![PROVISIONING_ARTIFACT], vec![PRODUCT]], schedule);

    assert!(matches!(
        register_sweepers(&mut registry),
        Err(Error::DuplicateSweeper { .. })
    ));
}

#[tokio::test]
async fn full_region_sweep() {
    let _ = env_logger::builder().try_init();
    let ctx = ctx(FakeCatalog::with(|s| {
        s.portfolios = vec![portfolio("port-1")];
        s.products = vec![product("prod-1")];
        s.artifacts.insert(
            "prod-1".into(),
            vec![ProvisioningArtifactDetail {
                id: Some("pa-1".into()),
            }],
        );
        s.product_portfolios
            .insert("prod-1".into(), vec![portfolio("port-1")]);
    }));
    let mut registry = Registry::default();
    register_sweepers(&mut registry).unwrap();
    let report = registry.sweep_region(&ctx, &[], false).await.unwrap();
    assert!(report.is_success(), "{:?}", report.results);
    assert_eq!(10, report.results.len());

    let deleted = ctx.client().state.lock().unwrap().deleted.clone();
    let artifact = deleted
        .iter()
        .position(|d| d == "delete_provisioning_artifact pa-1:prod-1")
        .unwrap();
    let product = deleted
        .iter()
        .position(|d| d == "delete_product prod-1")
        .unwrap();
    assert!(artifact < product, "{deleted:?}");
    assert_eq!(3, report.summary().destroyed);
}
