use std::sync::Mutex;

use futures::FutureExt;

use crate::{remote::ApiError, Error, Registry, SweepContext, SweepSummary};

/// Every sweeper appends its name to the client.
type Ran = Mutex<Vec<&'static str>>;

fn registry() -> Registry<Ran> {
    let mut registry = Registry::default();
    registry
        .add("product", &["artifact"], |ctx: &SweepContext<Ran>| {
            async move {
                ctx.client().lock().unwrap().push("product");
                Ok(SweepSummary {
                    destroyed: 2,
                    ..Default::default()
                })
            }
            .boxed_local()
        })
        .unwrap()
        .add("artifact", &[], |ctx: &SweepContext<Ran>| {
            async move {
                ctx.client().lock().unwrap().push("artifact");
                Ok(SweepSummary {
                    destroyed: 1,
                    ..Default::default()
                })
            }
            .boxed_local()
        })
        .unwrap()
        .add("tag_option", &[], |ctx: &SweepContext<Ran>| {
            async move {
                ctx.client().lock().unwrap().push("tag_option");
                Ok(SweepSummary {
                    skipped: 1,
                    ..Default::default()
                })
            }
            .boxed_local()
        })
        .unwrap();
    registry
}

fn batch_of(schedule: &[Vec<&'static str>], name: &str) -> usize {
    schedule
        .iter()
        .position(|batch| batch.contains(&name))
        .unwrap_or_else(|| panic!("{name} is not scheduled"))
}

#[test]
fn dependencies_run_first() {
    let _ = env_logger::builder().try_init();
    let registry = registry();
    let schedule = registry.schedule(&[]).unwrap();
    log::info!("schedule:\n{}", registry.schedule_string(&[]).unwrap());
    assert!(batch_of(&schedule, "artifact") < batch_of(&schedule, "product"));
    assert_eq!(3, schedule.iter().map(Vec::len).sum::<usize>());
}

#[test]
fn filter_pulls_in_dependencies() {
    let registry = registry();
    let schedule = registry.schedule(&["product".to_owned()]).unwrap();
    pretty_assertions::assert_eq!(vec![vec!["artifact"], vec!["product"]], schedule);

    let schedule = registry.schedule(&["tag_option".to_owned()]).unwrap();
    pretty_assertions::assert_eq!(vec![vec!["tag_option"]], schedule);
}

#[test]
fn unknown_names() {
    let registry = registry();
    let err = registry.schedule(&["nope".to_owned()]).unwrap_err();
    assert!(matches!(err, Error::UnknownSweeper { ref name } if name == "nope"));

    let mut registry = registry;
    registry
        .add("orphan", &["missing"], |_: &SweepContext<Ran>| {
            async { Ok(SweepSummary::default()) }.boxed_local()
        })
        .unwrap();
    let err = registry.schedule(&[]).unwrap_err();
    assert_eq!(
        "Sweeper 'orphan' depends on 'missing', which is not registered",
        err.to_string()
    );
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = registry();
    let result = registry.add("artifact", &[], |_: &SweepContext<Ran>| {
        async { Ok(SweepSummary::default()) }.boxed_local()
    });
    assert!(matches!(
        result,
        Err(Error::DuplicateSweeper { name: "artifact" })
    ));
    assert_eq!(3, registry.len());
}

#[tokio::test]
async fn sweep_region_runs_in_schedule_order() {
    let _ = env_logger::builder().try_init();
    let registry = registry();
    let ctx = SweepContext::new("us-west-2", Ran::default());
    let report = registry.sweep_region(&ctx, &[], false).await.unwrap();
    assert!(report.is_success());

    let ran = ctx.client().lock().unwrap().clone();
    let artifact = ran.iter().position(|n| *n == "artifact").unwrap();
    let product = ran.iter().position(|n| *n == "product").unwrap();
    assert!(artifact < product, "{ran:?}");

    let summary = report.into_result().unwrap();
    assert_eq!(
        SweepSummary {
            destroyed: 3,
            skipped: 1,
            ignored: 0
        },
        summary
    );
}

fn failing_registry() -> Registry<Ran> {
    let mut registry = Registry::default();
    registry
        .add("first", &[], |ctx: &SweepContext<Ran>| {
            async move {
                ctx.client().lock().unwrap().push("first");
                Err(Error::List {
                    what: "things".to_owned(),
                    region: ctx.region().to_owned(),
                    source: ApiError::service("ThrottlingException", "slow down"),
                })
            }
            .boxed_local()
        })
        .unwrap()
        .add("second", &["first"], |ctx: &SweepContext<Ran>| {
            async move {
                ctx.client().lock().unwrap().push("second");
                Ok(SweepSummary::default())
            }
            .boxed_local()
        })
        .unwrap();
    registry
}

#[tokio::test]
async fn failed_batch_stops_the_region() {
    let _ = env_logger::builder().try_init();
    let registry = failing_registry();
    let ctx = SweepContext::new("us-west-2", Ran::default());
    let report = registry.sweep_region(&ctx, &[], false).await.unwrap();
    assert!(!report.is_success());
    assert_eq!(vec!["first"], *ctx.client().lock().unwrap());
    assert_eq!(vec!["first"], report.failures().map(|(n, _)| n).collect::<Vec<_>>());

    let err = report.into_result().unwrap_err();
    assert_eq!(1, err.count());
    assert!(
        err.to_string().contains("Sweeper 'first' failed in us-west-2"),
        "{err}"
    );
}

#[tokio::test]
async fn allow_failures_keeps_going() {
    let registry = failing_registry();
    let ctx = SweepContext::new("us-west-2", Ran::default());
    let report = registry.sweep_region(&ctx, &[], true).await.unwrap();
    assert_eq!(vec!["first", "second"], *ctx.client().lock().unwrap());
    assert_eq!(2, report.results.len());
    assert_eq!(1, report.failures().count());
}
