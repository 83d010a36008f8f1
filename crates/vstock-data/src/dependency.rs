//! Guard for sources that live behind optional Cargo features.
//!
//! The base build ships only the TCBS adapter. `yfinance` and `bigquery` are
//! opt-in features (`all` enables both), so a facade bound to one of them must
//! check that the adapter was compiled in before it is used.

use tracing::warn;

use crate::{ProviderId, SourceError};

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

/// Cargo feature that compiles in the adapter for `provider`, if any.
pub const fn required_feature(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Tcbs => None,
        ProviderId::Yfinance => Some("yfinance"),
        ProviderId::Bigquery => Some("bigquery"),
    }
}

/// Whether the adapter for `provider` is part of this build.
pub const fn is_available(provider: ProviderId) -> bool {
    match provider {
        ProviderId::Tcbs => true,
        ProviderId::Yfinance => cfg!(feature = "yfinance"),
        ProviderId::Bigquery => cfg!(feature = "bigquery"),
    }
}

/// Shell command that enables the feature `provider` needs.
pub fn install_hint(provider: ProviderId) -> Option<String> {
    required_feature(provider)
        .map(|feature| format!("cargo add {CRATE_NAME} --features {feature}"))
}

/// Fail fast when the adapter for `provider` was not compiled in.
///
/// # Errors
///
/// Returns [`missing`] for `provider` when its feature is disabled.
pub fn ensure_available(provider: ProviderId) -> Result<(), SourceError> {
    if is_available(provider) {
        return Ok(());
    }
    Err(missing(provider))
}

/// Missing-dependency error naming the feature and the command enabling it.
pub fn missing(provider: ProviderId) -> SourceError {
    let feature = required_feature(provider).unwrap_or(provider.as_str());
    let hint = install_hint(provider).unwrap_or_default();
    warn!(source = %provider, feature, "source adapter not compiled in");
    SourceError::missing_dependency(format!(
        "source '{provider}' requires the optional '{feature}' feature. Please run: {hint}"
    ))
}
