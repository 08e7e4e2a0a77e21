// ABOUTME: Scan orchestrator: one bounded, fully awaited pass over every resolved project.
// ABOUTME: Holds the shared collaborators and fans project workers out under a semaphore.

use crate::cloud::{Compute, ProjectDirectory};
use crate::config::{IssuerOptions, Targets};
use crate::projects::resolve_projects;
use crate::rate_limit::RateLimiter;
use hostca_ssh::CertificateAuthority;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything a pass needs. Cheap to share: workers hold it behind an `Arc`.
pub struct Issuer {
    pub(crate) compute: Arc<dyn Compute>,
    pub(crate) directory: Arc<dyn ProjectDirectory>,
    pub(crate) authority: Arc<CertificateAuthority>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) targets: Targets,
    pub(crate) options: IssuerOptions,
}

impl Issuer {
    pub fn new(
        compute: Arc<dyn Compute>,
        directory: Arc<dyn ProjectDirectory>,
        authority: Arc<CertificateAuthority>,
        limiter: Arc<RateLimiter>,
        targets: Targets,
        options: IssuerOptions,
    ) -> Self {
        Self {
            compute,
            directory,
            authority,
            limiter,
            targets,
            options,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Run one pass: resolve projects, sign each under the parallelism cap,
    /// and return once every worker has finished.
    ///
    /// Worker failures, including panics, are logged and never surface here.
    pub async fn run_pass(self: &Arc<Self>) {
        let projects = resolve_projects(self.directory.as_ref(), &self.targets).await;
        let semaphore = Arc::new(Semaphore::new(self.options.parallelism.max(1)));
        let mut workers = JoinSet::new();

        for project_id in projects {
            // Admission blocks here once `parallelism` workers are in flight
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let issuer = Arc::clone(self);
            workers.spawn(async move {
                // Dropped with the task, including on panic
                let _permit = permit;
                let stats = issuer.sign_project(&project_id).await;
                (project_id, stats)
            });
        }

        let mut projects_done = 0usize;
        let mut signed = 0usize;
        while let Some(result) = workers.join_next().await {
            match result {
                Ok((project_id, stats)) => {
                    projects_done += 1;
                    signed += stats.signed;
                    tracing::debug!(project = %project_id, ?stats, "project finished");
                }
                Err(e) => {
                    tracing::error!(error = %e, "project worker died");
                }
            }
        }

        tracing::info!(projects = projects_done, signed, "pass complete");
    }
}
