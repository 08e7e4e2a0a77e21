// ABOUTME: Startup and poll loop for the hostca service.
// ABOUTME: Builds the issuer from CLI flags and runs passes until oneshot completes or ctrl-c.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use hostca_core::{
    Issuer, IssuerOptions, RateLimiter, Targets, DEFAULT_PARALLELISM, DEFAULT_VALIDITY_DAYS,
};
use hostca_gcp::GcpClient;
use hostca_ssh::CertificateAuthority;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "hostca")]
#[command(about = "Signs SSH host keys published by cloud instances")]
pub struct Cli {
    /// OpenSSH private key used to sign host certificates
    #[arg(long, env = "HOSTCA_CA_KEYFILE", default_value = "./ca_key")]
    pub ca_keyfile: PathBuf,

    /// YAML file listing Projects and Folders to scan
    #[arg(long, env = "HOSTCA_CONFIG_FILE", default_value = "./config.yaml")]
    pub config_file: PathBuf,

    /// Verbose logging
    #[arg(long, env = "HOSTCA_DEBUG")]
    pub debug: bool,

    /// Run a single pass and exit
    #[arg(long, env = "HOSTCA_ONESHOT")]
    pub oneshot: bool,

    /// Include RFC 1918 internal addresses as principals
    #[arg(long, env = "HOSTCA_SIGN_INTERNAL_IPS", default_value_t = true, action = ArgAction::Set)]
    pub sign_internal_ips: bool,

    /// Include external addresses as principals
    #[arg(long, env = "HOSTCA_SIGN_EXTERNAL_IPS", default_value_t = true, action = ArgAction::Set)]
    pub sign_external_ips: bool,

    /// Number of projects signed concurrently
    #[arg(long, env = "HOSTCA_PARALLELISM", default_value_t = DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    /// Build and log certificates without writing metadata
    #[arg(long, env = "HOSTCA_SIMULATE")]
    pub simulate: bool,

    /// Certificate validity in days
    #[arg(long, env = "HOSTCA_VALIDITY", default_value_t = DEFAULT_VALIDITY_DAYS)]
    pub validity: u32,

    /// Minimum hours between two signings of the same instance
    #[arg(long, env = "HOSTCA_COOLDOWN_HOURS", default_value_t = 12)]
    pub cooldown_hours: u64,

    /// Seconds to sleep between passes
    #[arg(long, env = "HOSTCA_POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Skip instances with no eligible address instead of signing them
    #[arg(long, env = "HOSTCA_SKIP_EMPTY_PRINCIPALS")]
    pub skip_empty_principals: bool,

    /// Deadline for each cloud API request
    #[arg(long, env = "HOSTCA_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

impl Cli {
    pub fn issuer_options(&self) -> IssuerOptions {
        IssuerOptions {
            sign_internal_ips: self.sign_internal_ips,
            sign_external_ips: self.sign_external_ips,
            parallelism: self.parallelism,
            simulate: self.simulate,
            validity: hostca_ssh::days(self.validity),
            skip_empty_principals: self.skip_empty_principals,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours.saturating_mul(60 * 60))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Everything from the command line that can fail before the first pass.
pub struct Startup {
    pub authority: CertificateAuthority,
    pub targets: Targets,
    pub options: IssuerOptions,
}

/// Load the CA key and targets and check the options. Any error here is fatal.
pub fn prepare(cli: &Cli) -> Result<Startup> {
    let options = cli.issuer_options();
    options.validate().context("Invalid options")?;

    let key = hostca_ssh::load_ca_key(&cli.ca_keyfile)
        .with_context(|| format!("Failed to load CA key from {}", cli.ca_keyfile.display()))?;
    tracing::info!(
        fingerprint = %hostca_ssh::ca_fingerprint(&key),
        path = %cli.ca_keyfile.display(),
        "loaded CA key"
    );

    let targets = Targets::load(&cli.config_file).with_context(|| {
        format!("Failed to load config from {}", cli.config_file.display())
    })?;
    if targets.is_empty() {
        tracing::warn!(path = %cli.config_file.display(), "no projects or folders configured");
    }

    Ok(Startup {
        authority: CertificateAuthority::new(key),
        targets,
        options,
    })
}

/// Run the issuer until a oneshot pass completes or the process is interrupted.
pub async fn run(cli: Cli) -> Result<()> {
    let startup = prepare(&cli)?;
    let gcp = Arc::new(
        GcpClient::new(cli.request_timeout()).context("Failed to create Google Cloud client")?,
    );

    tracing::info!(
        projects = startup.targets.projects.len(),
        folders = startup.targets.folders.len(),
        parallelism = startup.options.parallelism,
        simulate = startup.options.simulate,
        oneshot = cli.oneshot,
        "starting hostca"
    );

    let issuer = Arc::new(Issuer::new(
        gcp.clone(),
        gcp,
        Arc::new(startup.authority),
        Arc::new(RateLimiter::new(cli.cooldown())),
        startup.targets,
        startup.options,
    ));

    loop {
        issuer.run_pass().await;
        tracing::info!("Ran successfully");

        if cli.oneshot {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(cli.poll_interval()) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }
    }

    Ok(())
}
