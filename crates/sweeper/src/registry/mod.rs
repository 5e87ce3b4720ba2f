//! Named sweepers and the order they run in.
//!
//! Every sweeper declares the sweepers that must finish before it starts,
//! eg. provisioning artifacts before the products that own them. The
//! registry turns those declarations into a DAG and runs it batch by batch.
use futures::future::LocalBoxFuture;

use crate::{Error, Result, SweepContext, SweepSummary};

/// Entry point of one sweeper.
pub type SweepFn<C> =
    Box<dyn for<'a> Fn(&'a SweepContext<C>) -> LocalBoxFuture<'a, Result<SweepSummary>>>;

struct Sweeper<C> {
    name: &'static str,
    dependencies: &'static [&'static str],
    run: SweepFn<C>,
}

/// All known sweepers for clients of type `C`.
pub struct Registry<C> {
    sweepers: Vec<Sweeper<C>>,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self { sweepers: vec![] }
    }
}

impl<C> core::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.sweepers.iter().map(|s| (s.name, s.dependencies)))
            .finish()
    }
}

impl<C> Registry<C> {
    /// Register a sweeper under `name`, to be run after every sweeper in
    /// `dependencies`.
    ///
    /// ## Errors
    /// Errs if a sweeper by that name is already registered.
    pub fn add<F>(
        &mut self,
        name: &'static str,
        dependencies: &'static [&'static str],
        run: F,
    ) -> Result<&mut Self>
    where
        F: for<'a> Fn(&'a SweepContext<C>) -> LocalBoxFuture<'a, Result<SweepSummary>> + 'static,
    {
        if self.get(name).is_some() {
            return Err(Error::DuplicateSweeper { name });
        }
        self.sweepers.push(Sweeper {
            name,
            dependencies,
            run: Box::new(run),
        });
        Ok(self)
    }

    /// Names of all registered sweepers, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sweepers.iter().map(|s| s.name)
    }

    pub fn dependencies(&self, name: &str) -> Option<&'static [&'static str]> {
        self.get(name).map(|s| s.dependencies)
    }

    pub fn len(&self) -> usize {
        self.sweepers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sweepers.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Sweeper<C>> {
        self.sweepers.iter().find(|s| s.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sweepers.iter().position(|s| s.name == name)
    }

    /// The sweepers named in `filter` plus everything they depend on, or
    /// every sweeper when `filter` is empty.
    fn select(&self, filter: &[String]) -> Result<Vec<bool>> {
        for sweeper in self.sweepers.iter() {
            for dependency in sweeper.dependencies {
                if self.get(dependency).is_none() {
                    return Err(Error::UnknownDependency {
                        sweeper: sweeper.name,
                        dependency: *dependency,
                    });
                }
            }
        }

        if filter.is_empty() {
            return Ok(vec![true; self.sweepers.len()]);
        }
        let mut selected = vec![false; self.sweepers.len()];
        let mut pending = vec![];
        for name in filter {
            let index = self
                .position(name)
                .ok_or_else(|| Error::UnknownSweeper { name: name.clone() })?;
            pending.push(index);
        }
        while let Some(index) = pending.pop() {
            if std::mem::replace(&mut selected[index], true) {
                continue;
            }
            for dependency in self.sweepers[index].dependencies {
                if let Some(dep_index) = self.position(dependency) {
                    pending.push(dep_index);
                }
            }
        }
        Ok(selected)
    }

    fn dag(&self, filter: &[String]) -> Result<dagga::Dag<&'static str, usize>> {
        let selected = self.select(filter)?;
        let mut dag = dagga::Dag::default();
        for (index, sweeper) in self.sweepers.iter().enumerate() {
            if !selected[index] {
                continue;
            }
            let reads = sweeper
                .dependencies
                .iter()
                .filter_map(|dependency| self.position(dependency))
                .collect::<Vec<_>>();
            dag.add_node(
                dagga::Node::new(sweeper.name)
                    .with_name(sweeper.name.to_owned())
                    .with_reads(reads)
                    .with_results([index]),
            );
        }
        Ok(dag)
    }

    /// Batches of sweeper names. Every batch runs after the one before
    /// it; sweepers within a batch do not depend on each other.
    ///
    /// ## Errors
    /// Errs if `filter` names an unknown sweeper, if a sweeper depends on
    /// one that is not registered, or if the dependencies form a cycle.
    pub fn schedule(&self, filter: &[String]) -> Result<Vec<Vec<&'static str>>> {
        let schedule = self
            .dag(filter)?
            .build_schedule()
            .map_err(|e| Error::Schedule { msg: e.to_string() })?;
        Ok(schedule
            .batches
            .into_iter()
            .map(|batch| batch.into_iter().map(|node| node.into_inner()).collect())
            .collect())
    }

    /// The schedule in human readable form.
    pub fn schedule_string(&self, filter: &[String]) -> Result<String> {
        struct Proxy {
            batches: Vec<Vec<&'static str>>,
        }

        impl core::fmt::Display for Proxy {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.batches.is_empty() {
                    f.write_str("--- No sweepers.\n")?;
                }
                for (i, batch) in self.batches.iter().enumerate() {
                    f.write_str("--- step ")?;
                    f.write_fmt(format_args!("{i}\n"))?;
                    for name in batch.iter() {
                        f.write_str("  ")?;
                        f.write_str(name)?;
                        f.write_str("\n")?;
                    }
                    f.write_str("---\n")?;
                }
                Ok(())
            }
        }

        let proxy = Proxy {
            batches: self.schedule(filter)?,
        };
        Ok(proxy.to_string())
    }

    /// Run the sweepers selected by `filter` against one region.
    ///
    /// Batches run one after the other and the sweepers of a batch run
    /// concurrently. When a batch has failures the remaining batches are
    /// not run, unless `allow_failures` is set. Cancellation also stops
    /// the run between batches.
    ///
    /// ## Errors
    /// Errs only if the schedule cannot be built. Sweeper failures are
    /// collected in the returned report.
    pub async fn sweep_region(
        &self,
        ctx: &SweepContext<C>,
        filter: &[String],
        allow_failures: bool,
    ) -> Result<RegionReport> {
        let batches = self.schedule(filter)?;
        let mut report = RegionReport {
            region: ctx.region().to_owned(),
            results: vec![],
        };
        let mut batches = batches.into_iter().enumerate();
        for (i, batch) in batches.by_ref() {
            log::debug!("running batch {i} in {}: {batch:?}", ctx.region());
            let runs = batch.into_iter().filter_map(|name| {
                let sweeper = self.get(name)?;
                Some(async move {
                    log::info!("running sweeper {name} in {}", ctx.region());
                    (name, (sweeper.run)(ctx).await)
                })
            });
            let results = futures::future::join_all(runs).await;
            let failed = results.iter().any(|(_, result)| result.is_err());
            report.results.extend(results);

            if ctx.is_cancelled() {
                log::warn!("sweep of {} was cancelled", ctx.region());
                break;
            }
            if failed && !allow_failures {
                log::error!(
                    "sweepers failed in {}, not running the remaining batches",
                    ctx.region()
                );
                break;
            }
        }
        for (_, batch) in batches {
            for name in batch {
                log::warn!("  sweeper {name} was not run in {}", ctx.region());
            }
        }
        Ok(report)
    }
}

/// What happened to each sweeper run in one region.
#[derive(Debug)]
pub struct RegionReport {
    pub region: String,
    pub results: Vec<(&'static str, Result<SweepSummary>)>,
}

impl RegionReport {
    /// The sum of all successful sweeps.
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for (_, result) in self.results.iter() {
            if let Ok(s) = result {
                summary += *s;
            }
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|(_, result)| result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &Error)> + '_ {
        self.results
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (*name, e)))
    }

    /// `Ok` with the summary when every sweeper succeeded, otherwise one
    /// combined error naming the failed sweepers.
    pub fn into_result(self) -> Result<SweepSummary> {
        let summary = self.summary();
        let region = self.region;
        let errors = self
            .results
            .into_iter()
            .filter_map(|(name, result)| {
                result.err().map(|e| Error::Sweeper {
                    name,
                    region: region.clone(),
                    source: Box::new(e),
                })
            })
            .collect::<Vec<_>>();
        if errors.is_empty() {
            Ok(summary)
        } else {
            Err(Error::Multiple { errors })
        }
    }
}

#[cfg(test)]
mod test;
