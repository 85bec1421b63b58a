use url::Url;

use crate::config::ConfigError;

/// Normalize a user supplied endpoint into the identifier used everywhere else.
///
/// Without an explicit scheme, `http` is assumed for authorities ending in `:80`
/// and `https` for everything else.
pub fn normalize_endpoint(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: "empty endpoint".to_string(),
        });
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        let rest = raw.trim_start_matches("//");
        let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
        let scheme = if authority.ends_with(":80") {
            "http"
        } else {
            "https"
        };
        format!("{scheme}://{rest}")
    };

    let url = Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url.to_string())
}
