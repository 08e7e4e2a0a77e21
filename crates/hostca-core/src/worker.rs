// ABOUTME: Per-project issuance worker.
// ABOUTME: Lists instances, reads published host keys, signs them, and writes certificates back.

use crate::ip::eligible_principals;
use crate::scan::Issuer;
use crate::types::Instance;

/// Guest attribute path instances publish their host key under.
pub const GUEST_ATTRIBUTE_PATH: &str = "hostkeys/ssh-ed25519";

/// Metadata key the signed certificate is written to.
pub const METADATA_CERT_KEY: &str = "hostkeys-signed-ssh-ed25519";

/// What happened in one project during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectStats {
    /// Instances returned by the listing.
    pub instances: usize,
    /// Certificates written to metadata.
    pub signed: usize,
    /// Certificates built in simulate mode and not written.
    pub simulated: usize,
    /// Instances passed over (cool-down, no key, bad key, no principals).
    pub skipped: usize,
    /// Listing failed or a metadata write failed and the loop stopped.
    pub aborted: bool,
}

enum Outcome {
    Signed,
    Simulated,
    Skipped,
    /// Stop processing this project.
    Abort,
}

impl Issuer {
    /// Sign every eligible instance in `project_id`, one at a time.
    ///
    /// Never fails: listing errors abandon the project, metadata write errors
    /// stop the loop, and everything per-instance is a skip.
    pub async fn sign_project(&self, project_id: &str) -> ProjectStats {
        let mut stats = ProjectStats::default();
        tracing::debug!(project = %project_id, "processing project");

        let instances = match self.compute.list_instances(project_id).await {
            Ok(instances) => instances,
            Err(e) => {
                tracing::warn!(project = %project_id, error = %e, "failed to list instances");
                stats.aborted = true;
                return stats;
            }
        };
        stats.instances = instances.len();

        for instance in instances {
            match self.sign_instance(project_id, instance).await {
                Outcome::Signed => stats.signed += 1,
                Outcome::Simulated => stats.simulated += 1,
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Abort => {
                    stats.aborted = true;
                    break;
                }
            }
        }

        stats
    }

    async fn sign_instance(&self, project_id: &str, mut instance: Instance) -> Outcome {
        let simulate = self.options.simulate;

        if !simulate && !self.limiter.is_signable(&instance.id) {
            tracing::debug!(
                project = %project_id,
                instance = %instance.name,
                "skipping instance signed within the cool-down window"
            );
            return Outcome::Skipped;
        }

        tracing::info!(project = %project_id, instance = %instance.name, "EvaluatingInstance");

        let candidate = match self
            .compute
            .read_guest_attribute(project_id, &instance.zone, &instance.name, GUEST_ATTRIBUTE_PATH)
            .await
        {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                tracing::debug!(
                    instance = %instance.name,
                    path = GUEST_ATTRIBUTE_PATH,
                    "no host key published, skipping"
                );
                return Outcome::Skipped;
            }
            Err(e) => {
                tracing::warn!(
                    project = %project_id,
                    instance = %instance.name,
                    error = %e,
                    "failed to read guest attributes, skipping"
                );
                return Outcome::Skipped;
            }
        };
        tracing::debug!(instance = %instance.name, key = %candidate, "host key found");

        let principals = eligible_principals(&instance, &self.options);
        if principals.is_empty() {
            if self.options.skip_empty_principals {
                tracing::debug!(
                    project = %project_id,
                    instance = %instance.name,
                    "no eligible addresses, skipping"
                );
                return Outcome::Skipped;
            }
            tracing::warn!(
                project = %project_id,
                instance = %instance.name,
                "no eligible addresses, certificate will carry no principals"
            );
        }

        let issued = match self
            .authority
            .sign_host_key(&candidate, &principals, self.options.validity)
        {
            Ok(issued) => issued,
            Err(e) if e.is_candidate_error() => {
                tracing::info!(
                    project = %project_id,
                    instance = %instance.name,
                    error = %e,
                    "published host key is unusable, skipping"
                );
                return Outcome::Skipped;
            }
            Err(e) => {
                tracing::error!(
                    project = %project_id,
                    instance = %instance.name,
                    error = %e,
                    "failed to sign host key"
                );
                return Outcome::Skipped;
            }
        };
        tracing::info!(
            project = %project_id,
            instance = %instance.name,
            ips = ?principals,
            host_key = %issued.host_key_fingerprint(),
            "SignedKey"
        );

        if simulate {
            tracing::info!(
                project = %project_id,
                instance = %instance.name,
                "simulate mode, not setting metadata"
            );
            return Outcome::Simulated;
        }

        instance.metadata.upsert(METADATA_CERT_KEY, issued.encoded());
        if let Err(e) = self
            .compute
            .set_metadata(project_id, &instance.zone, &instance.name, &instance.metadata)
            .await
        {
            tracing::error!(
                project = %project_id,
                instance = %instance.name,
                error = %e,
                "failed to set metadata, abandoning project for this pass"
            );
            return Outcome::Abort;
        }

        tracing::info!(project = %project_id, instance = %instance.name, ips = ?principals, "SetMetadata");
        self.limiter.record_signed(&instance.id);
        Outcome::Signed
    }
}
