//! JSON bodies returned by the sitemap backend.

use serde::{de, Deserialize, Deserializer};

use crate::{ApiError, ApiFailureKind, StatusReport};

#[derive(Debug, Deserialize)]
struct StartWire {
    #[serde(default)]
    token: Option<String>,
}

/// Status body. Field names follow the backend; anything else is rejected.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusWire {
    #[serde(rename = "rootURL", default)]
    root_url: Option<String>,
    #[serde(rename = "maxLevel", default, deserialize_with = "count")]
    max_level: Option<u64>,
    #[serde(rename = "foundURLs", alias = "crawled", default, deserialize_with = "count")]
    found_urls: Option<u64>,
    #[serde(rename = "scanQueue", alias = "queued", default, deserialize_with = "count")]
    scan_queue: Option<u64>,
    #[serde(rename = "lastModifyQueue", default, deserialize_with = "count")]
    last_modify_queue: Option<u64>,
    done: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountRepr {
    Number(u64),
    Text(String),
}

/// Counts arrive as JSON numbers from current backends and as strings from older ones.
fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<CountRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(CountRepr::Number(n)) => Ok(Some(n)),
        Some(CountRepr::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a count, got {text:?}"))),
    }
}

pub(crate) fn decode_token(body: &[u8]) -> Result<String, ApiError> {
    // The backend answers a rejected request with an empty 200.
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::new(
            ApiFailureKind::MissingToken,
            "start response was empty",
        ));
    }
    let wire: StartWire = serde_json::from_slice(body)
        .map_err(|err| ApiError::new(ApiFailureKind::Decode, err.to_string()))?;
    match wire.token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err(ApiError::new(
            ApiFailureKind::MissingToken,
            "start response carried no token",
        )),
    }
}

pub(crate) fn decode_status(body: &[u8]) -> Result<StatusReport, ApiError> {
    let wire: StatusWire = serde_json::from_slice(body)
        .map_err(|err| ApiError::new(ApiFailureKind::Decode, err.to_string()))?;
    Ok(StatusReport {
        root_url: wire.root_url,
        max_level: wire.max_level,
        found_urls: wire.found_urls,
        scan_queue: wire.scan_queue,
        last_modify_queue: wire.last_modify_queue,
        done: wire.done,
    })
}
