// ABOUTME: In-memory collaborators shared by the hostca-core integration tests.
// ABOUTME: FakeCompute and FakeDirectory record every call and can be told to fail.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use hostca_core::{
    AccessConfig, CloudError, Compute, Instance, InstanceId, Issuer, IssuerOptions, Metadata,
    NetworkInterface, ProjectDirectory, RateLimiter, Targets,
};
use hostca_ssh::ssh_key::{Algorithm, PrivateKey};
use hostca_ssh::CertificateAuthority;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn generate_key() -> PrivateKey {
    PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
        .expect("should generate ed25519 key")
}

/// Base64 wire-format public key, the way instances publish it.
pub fn published_key(key: &PrivateKey) -> String {
    let blob = key.public_key().to_bytes().expect("should encode public key");
    base64::engine::general_purpose::STANDARD.encode(blob)
}

pub fn authority() -> Arc<CertificateAuthority> {
    Arc::new(CertificateAuthority::new(generate_key()))
}

pub fn instance(id: u64, name: &str, internal: &str, external: &[&str]) -> Instance {
    Instance {
        id: InstanceId::from(id),
        name: name.to_string(),
        zone: "us-central1-a".to_string(),
        network_interfaces: vec![NetworkInterface {
            internal_ip: Some(internal.to_string()),
            access_configs: external
                .iter()
                .map(|ip| AccessConfig {
                    external_ip: Some(ip.to_string()),
                })
                .collect(),
        }],
        metadata: Metadata::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataWrite {
    pub project: String,
    pub zone: String,
    pub instance: String,
    pub metadata: Metadata,
}

#[derive(Default)]
pub struct FakeCompute {
    instances: Mutex<HashMap<String, Vec<Instance>>>,
    attributes: HashMap<(String, String), String>,
    failing_listings: HashSet<String>,
    failing_writes: HashSet<String>,
    failing_reads: HashSet<(String, String)>,
    panicking: HashSet<String>,
    listing_delay: Option<Duration>,
    pub writes: Mutex<Vec<MetadataWrite>>,
    pub attribute_reads: AtomicUsize,
    pub listings: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeCompute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, project: &str, instance: Instance) -> Self {
        self.instances
            .lock()
            .unwrap()
            .entry(project.to_string())
            .or_default()
            .push(instance);
        self
    }

    pub fn with_host_key(mut self, project: &str, instance: &str, key: &str) -> Self {
        self.attributes
            .insert((project.to_string(), instance.to_string()), key.to_string());
        self
    }

    pub fn failing_listing(mut self, project: &str) -> Self {
        self.failing_listings.insert(project.to_string());
        self
    }

    pub fn failing_writes(mut self, project: &str) -> Self {
        self.failing_writes.insert(project.to_string());
        self
    }

    pub fn failing_reads(mut self, project: &str, instance: &str) -> Self {
        self.failing_reads
            .insert((project.to_string(), instance.to_string()));
        self
    }

    pub fn panicking(mut self, project: &str) -> Self {
        self.panicking.insert(project.to_string());
        self
    }

    pub fn with_listing_delay(mut self, delay: Duration) -> Self {
        self.listing_delay = Some(delay);
        self
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn writes(&self) -> Vec<MetadataWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn listed_projects(&self) -> Vec<String> {
        self.listings.lock().unwrap().clone()
    }
}

#[async_trait]
impl Compute for FakeCompute {
    async fn list_instances(&self, project_id: &str) -> Result<Vec<Instance>, CloudError> {
        self.listings.lock().unwrap().push(project_id.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.listing_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panicking.contains(project_id) {
            panic!("listing exploded for {project_id}");
        }
        if self.failing_listings.contains(project_id) {
            return Err(CloudError::Api {
                operation: "aggregatedList".to_string(),
                status: 403,
                message: "permission denied".to_string(),
            });
        }
        Ok(self
            .instances
            .lock()
            .unwrap()
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn read_guest_attribute(
        &self,
        project_id: &str,
        _zone: &str,
        instance: &str,
        _query_path: &str,
    ) -> Result<Option<String>, CloudError> {
        self.attribute_reads.fetch_add(1, Ordering::SeqCst);
        let key = (project_id.to_string(), instance.to_string());
        if self.failing_reads.contains(&key) {
            return Err(CloudError::Api {
                operation: "getGuestAttributes".to_string(),
                status: 400,
                message: "guest attributes are disabled".to_string(),
            });
        }
        Ok(self.attributes.get(&key).cloned())
    }

    async fn set_metadata(
        &self,
        project_id: &str,
        zone: &str,
        instance: &str,
        metadata: &Metadata,
    ) -> Result<(), CloudError> {
        if self.failing_writes.contains(project_id) {
            return Err(CloudError::Api {
                operation: "setMetadata".to_string(),
                status: 429,
                message: "quota exceeded".to_string(),
            });
        }

        self.writes.lock().unwrap().push(MetadataWrite {
            project: project_id.to_string(),
            zone: zone.to_string(),
            instance: instance.to_string(),
            metadata: metadata.clone(),
        });

        if let Some(stored) = self
            .instances
            .lock()
            .unwrap()
            .get_mut(project_id)
            .and_then(|list| list.iter_mut().find(|i| i.name == instance))
        {
            stored.metadata = metadata.clone();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    projects: HashMap<String, Vec<String>>,
    sub_folders: HashMap<String, Vec<String>>,
    failing_projects: HashSet<String>,
    failing_sub_folders: HashSet<String>,
    pub project_lookups: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(mut self, folder: &str, projects: &[&str]) -> Self {
        self.projects.insert(
            folder.to_string(),
            projects.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    pub fn with_sub_folders(mut self, folder: &str, children: &[&str]) -> Self {
        self.sub_folders.insert(
            folder.to_string(),
            children.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn failing_projects(mut self, folder: &str) -> Self {
        self.failing_projects.insert(folder.to_string());
        self
    }

    pub fn failing_sub_folders(mut self, folder: &str) -> Self {
        self.failing_sub_folders.insert(folder.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.project_lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjectDirectory for FakeDirectory {
    async fn list_active_projects(&self, folder_id: &str) -> Result<Vec<String>, CloudError> {
        self.project_lookups
            .lock()
            .unwrap()
            .push(folder_id.to_string());
        if self.failing_projects.contains(folder_id) {
            return Err(CloudError::Transport("connection reset".to_string()));
        }
        Ok(self.projects.get(folder_id).cloned().unwrap_or_default())
    }

    async fn list_sub_folders(&self, folder_id: &str) -> Result<Vec<String>, CloudError> {
        if self.failing_sub_folders.contains(folder_id) {
            return Err(CloudError::Api {
                operation: "folders.list".to_string(),
                status: 400,
                message: "bad request".to_string(),
            });
        }
        Ok(self.sub_folders.get(folder_id).cloned().unwrap_or_default())
    }
}

pub fn targets(projects: &[&str], folders: &[&str]) -> Targets {
    Targets::new(
        projects.iter().map(|p| p.to_string()).collect(),
        folders.iter().map(|f| f.to_string()).collect(),
    )
    .expect("targets should be valid")
}

pub fn issuer(
    compute: Arc<FakeCompute>,
    directory: Arc<FakeDirectory>,
    targets: Targets,
    options: IssuerOptions,
) -> Arc<Issuer> {
    Arc::new(Issuer::new(
        compute,
        directory,
        authority(),
        Arc::new(RateLimiter::default()),
        targets,
        options,
    ))
}
