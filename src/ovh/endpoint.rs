//! OVH API endpoint resolution.

use crate::error::ApiError;

/// Known endpoint aliases and their base URLs.
const ENDPOINT_ALIASES: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Resolve an endpoint alias or URL to a base URL without trailing slash.
pub fn resolve_endpoint(endpoint: &str) -> Result<String, ApiError> {
    let endpoint = endpoint.trim();

    if let Some((_, url)) = ENDPOINT_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(endpoint))
    {
        return Ok((*url).to_string());
    }

    let parsed = reqwest::Url::parse(endpoint)
        .map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
    }

    Ok(endpoint.trim_end_matches('/').to_string())
}
