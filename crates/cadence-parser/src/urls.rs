use crate::error::ConfigError;
use url::Url;

const PASS_THROUGH_SCHEMES: [&str; 5] = ["about:", "data:", "file:", "chrome:", "javascript:"];

/// Accepts URLs without a scheme, defaulting them to `https://`.
///
/// The value is validated but kept as written, apart from the added scheme.
pub fn parse_fuzzy_url(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::new("Empty URL"));
    }
    if PASS_THROUGH_SCHEMES
        .iter()
        .any(|scheme| raw.starts_with(scheme))
    {
        return Ok(raw.to_string());
    }
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let parsed =
        Url::parse(&candidate).map_err(|e| ConfigError::new(format!("Invalid URL '{}': {}", raw, e)))?;
    if parsed.host_str().is_none() {
        return Err(ConfigError::new(format!("URL '{}' has no host", raw)));
    }
    Ok(candidate)
}

/// Short human label derived from a URL, used when a page has no label.
pub fn url_label(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    match parsed.scheme() {
        "about" => return parsed.path().to_string(),
        "file" => {
            if let Some(name) = parsed
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            {
                return name.to_string();
            }
        }
        _ => {}
    }
    match parsed.host_str() {
        Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
        None => url.to_string(),
    }
}
