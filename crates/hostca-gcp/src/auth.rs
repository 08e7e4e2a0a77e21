// ABOUTME: OAuth access tokens for Google Cloud API calls.
// ABOUTME: A fixed token from the environment, or Application Default Credentials via gcp_auth.

use gcp_auth::TokenProvider;
use hostca_core::CloudError;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Environment variable holding a ready-made access token.
pub const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Compute and Resource Manager both accept the platform-wide scope.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Where bearer tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Always the same token, never refreshed.
    Fixed(String),
    /// `GOOGLE_APPLICATION_CREDENTIALS`, gcloud user credentials, or the
    /// metadata server, in the order gcp_auth probes them.
    ApplicationDefault,
}

/// A non-blank `GOOGLE_OAUTH_ACCESS_TOKEN` wins; otherwise Application Default Credentials.
pub fn select_source(env_token: Option<&str>) -> Source {
    match env_token.map(str::trim).filter(|token| !token.is_empty()) {
        Some(token) => Source::Fixed(token.to_string()),
        None => Source::ApplicationDefault,
    }
}

pub struct TokenSource {
    source: Source,
    provider: OnceCell<Arc<dyn TokenProvider>>,
}

impl TokenSource {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            provider: OnceCell::new(),
        }
    }

    /// Always hand out `token`.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::new(Source::Fixed(token.into()))
    }

    pub fn application_default() -> Self {
        Self::new(Source::ApplicationDefault)
    }

    /// Pick the source from the process environment.
    pub fn from_env() -> Self {
        let source = select_source(std::env::var(TOKEN_ENV).ok().as_deref());
        match &source {
            Source::Fixed(_) => tracing::debug!("using access token from {}", TOKEN_ENV),
            Source::ApplicationDefault => tracing::debug!("using application default credentials"),
        }
        Self::new(source)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// A bearer token for [`SCOPES`]. The credential provider is discovered on
    /// first use and caches and refreshes tokens itself.
    pub async fn token(&self) -> Result<String, CloudError> {
        match &self.source {
            Source::Fixed(token) => Ok(token.clone()),
            Source::ApplicationDefault => {
                let provider = self
                    .provider
                    .get_or_try_init(|| async {
                        let provider = gcp_auth::provider().await.map_err(|e| {
                            CloudError::Auth(format!("no application default credentials: {e}"))
                        })?;
                        tracing::info!("found application default credentials");
                        Ok::<_, CloudError>(provider)
                    })
                    .await?;
                let token = provider
                    .token(SCOPES)
                    .await
                    .map_err(|e| CloudError::Auth(format!("failed to get access token: {e}")))?;
                Ok(token.as_str().to_string())
            }
        }
    }
}
