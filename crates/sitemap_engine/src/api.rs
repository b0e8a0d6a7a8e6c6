use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use url::form_urlencoded;

use crate::wire::{decode_status, decode_token};
use crate::{ApiError, ApiFailureKind, StartRequest, StatusReport};

const START_PATH: &str = "generateSitemap";
const STATUS_PATH: &str = "sitemapStatistic";
const DOWNLOAD_PATH: &str = "sitemap.xml";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Start and status bodies are tiny; anything past this is not ours.
const MAX_JSON_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8888/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 50 * 1024 * 1024,
        }
    }
}

/// The two job operations plus the sitemap download.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn start_job(&self, request: &StartRequest) -> Result<String, ApiError>;

    async fn poll_status(&self, token: &str) -> Result<StatusReport, ApiError>;

    async fn download_sitemap(&self, token: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = parse_base(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    /// Absolute URL of the finished sitemap for `token`.
    pub fn download_url(&self, token: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(DOWNLOAD_PATH)?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))
    }

    async fn post_form(&self, path: &str, form: String) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path)?;
        poller_logging::poller_trace!("POST {} ({} bytes)", url, form.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_body(response, MAX_JSON_BYTES).await
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn start_job(&self, request: &StartRequest) -> Result<String, ApiError> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("homeURL", &request.home_url)
            .append_pair("levels", &request.levels)
            .finish();
        let body = self.post_form(START_PATH, form).await?;
        decode_token(&body)
    }

    async fn poll_status(&self, token: &str) -> Result<StatusReport, ApiError> {
        let form = form_urlencoded::Serializer::new(String::new())
            .append_pair("token", token)
            .finish();
        let body = self.post_form(STATUS_PATH, form).await?;
        decode_status(&body)
    }

    async fn download_sitemap(&self, token: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.download_url(token)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_body(response, self.settings.max_download_bytes).await
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let mut base = Url::parse(raw.trim())
        .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(ApiError::new(
            ApiFailureKind::InvalidUrl,
            format!("{raw} cannot be used as a base url"),
        ));
    }
    // Endpoints are joined relative to the base, so it must name a directory.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

async fn read_body(response: reqwest::Response, max_bytes: u64) -> Result<Vec<u8>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::new(
            ApiFailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(ApiError::new(
            ApiFailureKind::TooLarge { max_bytes },
            "declared content length over limit",
        ));
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
            return Err(ApiError::new(
                ApiFailureKind::TooLarge { max_bytes },
                "body over limit",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(ApiFailureKind::Decode, err.to_string());
    }
    ApiError::new(ApiFailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> ReqwestJobApi {
        ReqwestJobApi::new(ApiSettings {
            base_url: base.to_string(),
            ..ApiSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoints_resolve_under_base_path() {
        let api = api("http://host:8888/tools");
        assert_eq!(
            api.endpoint(STATUS_PATH).unwrap().as_str(),
            "http://host:8888/tools/sitemapStatistic"
        );
    }

    #[test]
    fn download_url_carries_token() {
        let api = api("http://host:8888");
        assert_eq!(
            api.download_url("abc123").unwrap().as_str(),
            "http://host:8888/sitemap.xml?token=abc123"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        let err = ReqwestJobApi::new(ApiSettings {
            base_url: "not a url".to_string(),
            ..ApiSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, ApiFailureKind::InvalidUrl);
    }
}
