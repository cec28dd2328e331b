use std::io::Read;

use anyhow::{anyhow, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use backend_domain::{ObservationEnvelope, RuntimeConfig};

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

pub fn parse_envelope(headers: &HeaderMap, body: &[u8]) -> Result<ObservationEnvelope> {
    let content = maybe_gunzip(headers, body)?;
    let envelope: ObservationEnvelope = serde_json::from_str(&content)?;
    if envelope.schema_version.trim() != "v2" {
        return Err(anyhow!(
            "unsupported schema_version '{}', expected 'v2'",
            envelope.schema_version
        ));
    }
    Ok(envelope)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if let Some(encoding) = headers.get("Content-Encoding") {
        if encoding.to_str().unwrap_or("") == "gzip" {
            let mut decoder = GzDecoder::new(body);
            let mut out = String::new();
            decoder.read_to_string(&mut out)?;
            return Ok(out);
        }
    }
    Ok(String::from_utf8(body.to_vec())?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use axum::http::HeaderValue;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    const BODY: &str = r#"{
        "schema_version": "v2",
        "game_server_id": "gs-1",
        "locations": [{"game_id": "g1", "x": 1.0, "y": 2.0, "z": 3.0}],
        "inventories": [{"game_id": "g1", "items": [{"code": "wood", "amount": 3}]}]
    }"#;

    #[test]
    fn token_is_required_only_when_configured() {
        let mut config = RuntimeConfig::default();
        let mut headers = HeaderMap::new();
        assert!(authorize(&config, &headers));

        config.api_token = Some("secret".to_string());
        assert!(!authorize(&config, &headers));
        headers.insert("Authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(!authorize(&config, &headers));
        headers.insert("Authorization", HeaderValue::from_static("Bearer secret"));
        assert!(authorize(&config, &headers));
    }

    #[test]
    fn parses_plain_and_gzip_bodies() {
        let plain = parse_envelope(&HeaderMap::new(), BODY.as_bytes()).unwrap();
        assert_eq!(plain.locations.len(), 1);
        assert_eq!(plain.inventories[0].items[0].amount, Some(3));

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        let unzipped = parse_envelope(&headers, &compressed).unwrap();
        assert_eq!(unzipped.game_server_id.as_deref(), Some("gs-1"));
    }

    #[test]
    fn rejects_other_schema_versions() {
        let body = r#"{"schema_version": "v1"}"#;
        assert!(parse_envelope(&HeaderMap::new(), body.as_bytes()).is_err());
    }
}
