// ABOUTME: Shared logging setup for the hostca binary
// ABOUTME: init() logs to stderr at INFO, or DEBUG when verbose output is requested

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Pick the default level for the issuer's own output.
pub fn default_level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Directives used when RUST_LOG is unset: hostca crates at the default
/// level, everything else at WARN.
pub fn default_directives(debug: bool) -> String {
    let level = default_level(debug).to_string().to_lowercase();
    let mut directives = vec!["warn".to_string()];
    for krate in ["hostca", "hostca_core", "hostca_ssh", "hostca_gcp"] {
        directives.push(format!("{krate}={level}"));
    }
    directives.join(",")
}

/// Filter for `init`. A valid RUST_LOG replaces the defaults entirely.
pub fn filter(debug: bool) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), debug)
}

/// Filter from an explicit RUST_LOG value. Blank or unparseable values fall
/// back to the defaults.
pub fn filter_from(rust_log: Option<&str>, debug: bool) -> EnvFilter {
    if let Some(spec) = rust_log.map(str::trim).filter(|spec| !spec.is_empty()) {
        match EnvFilter::try_new(spec) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("ignoring invalid {}: {e}", EnvFilter::DEFAULT_ENV),
        }
    }
    EnvFilter::new(default_directives(debug))
}

/// Standard logging to stderr. Default: INFO level, DEBUG with `debug`, RUST_LOG override.
pub fn init(debug: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(debug))
        .with_target(false)
        .init();
}
