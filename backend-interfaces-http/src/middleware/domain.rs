use axum::http::HeaderMap;

use backend_domain::{DomainId, RuntimeConfig};

use crate::error::HttpError;
use crate::middleware::authorize;

pub const DOMAIN_HEADER: &str = "X-Domain-Id";
const MAX_DOMAIN_LEN: usize = 64;

/// Tenant of the request: the `X-Domain-Id` header, else the configured default.
pub fn request_domain(config: &RuntimeConfig, headers: &HeaderMap) -> Result<DomainId, HttpError> {
    let Some(value) = headers.get(DOMAIN_HEADER) else {
        return Ok(DomainId::new(config.default_domain.clone()));
    };
    let raw = value
        .to_str()
        .map_err(|_| HttpError::BadRequest("X-Domain-Id must be ASCII".to_string()))?
        .trim();
    if raw.is_empty() {
        return Ok(DomainId::new(config.default_domain.clone()));
    }
    let valid = raw.len() <= MAX_DOMAIN_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(HttpError::BadRequest(format!("invalid domain id '{}'", raw)));
    }
    Ok(DomainId::new(raw))
}

/// Bearer check followed by tenant resolution.
pub fn authorized_domain(config: &RuntimeConfig, headers: &HeaderMap) -> Result<DomainId, HttpError> {
    if !authorize(config, headers) {
        return Err(HttpError::Unauthorized);
    }
    request_domain(config, headers)
}
