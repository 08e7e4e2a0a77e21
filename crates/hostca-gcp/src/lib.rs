// ABOUTME: Google Cloud implementations of the hostca collaborator traits.
// ABOUTME: Compute Engine for instances, guest attributes and metadata; Resource Manager for folders.

pub mod auth;
pub mod client;
pub mod compute;
pub mod resource_manager;

pub use auth::{select_source, Source, TokenSource, SCOPES, TOKEN_ENV};
pub use client::{Endpoints, GcpClient, DEFAULT_REQUEST_TIMEOUT};
