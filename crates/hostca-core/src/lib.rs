// ABOUTME: Issuance pipeline for SSH host certificates across a fleet of cloud instances.
// ABOUTME: Resolves projects, rate limits per instance, signs published keys, writes them back.

pub mod cloud;
pub mod config;
pub mod error;
pub mod ip;
pub mod projects;
pub mod rate_limit;
pub mod scan;
pub mod types;
pub mod worker;

pub use cloud::{Compute, ProjectDirectory};
pub use config::{
    normalize_folder_id, IssuerOptions, Targets, DEFAULT_PARALLELISM, DEFAULT_VALIDITY_DAYS,
};
pub use error::{CloudError, ConfigError};
pub use ip::{eligible_principals, is_valid_ipv4, is_valid_private_ipv4};
pub use projects::{active_projects_in_folders, resolve_projects, unique};
pub use rate_limit::{RateLimiter, DEFAULT_COOLDOWN};
pub use scan::Issuer;
pub use types::{AccessConfig, Instance, InstanceId, Metadata, MetadataItem, NetworkInterface};
pub use worker::{ProjectStats, GUEST_ATTRIBUTE_PATH, METADATA_CERT_KEY};
