use std::path::PathBuf;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use serde::de::DeserializeOwned;
use subgen_logging::{short_job_id, subgen_debug, subgen_info};
use tokio_util::io::ReaderStream;
use url::Url;

use crate::types::SubtitleListing;
use crate::{FailureKind, JobStatusResponse, ServiceError, SubtitleFile, UploadReceipt};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Scheme, host and optional path prefix; endpoint paths are appended verbatim.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Uploads carry whole video files and get their own budget.
    pub upload_timeout: Duration,
    pub max_download_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            max_download_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Video on disk; streamed into the request body rather than read up front.
    pub path: PathBuf,
    pub file_name: String,
    pub languages: Vec<String>,
}

#[async_trait::async_trait]
pub trait ServiceClient: Send + Sync {
    /// `POST /upload/` with the video and comma-joined language codes.
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError>;

    /// `GET /status/{job_id}`.
    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, ServiceError>;

    /// `GET {download_url}` relative to the service base.
    async fn download(&self, download_url: &str) -> Result<Vec<u8>, ServiceError>;

    /// `GET /subtitles/`.
    async fn list_subtitles(&self) -> Result<Vec<SubtitleFile>, ServiceError>;

    /// `DELETE /cleanup/`.
    async fn cleanup(&self) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestServiceClient {
    settings: ServiceSettings,
    client: reqwest::Client,
}

impl ReqwestServiceClient {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    /// Joins a service-relative path onto the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        let base = self.settings.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Url::parse(&joined).map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn status_url(&self, job_id: &str) -> Result<Url, ServiceError> {
        let mut url = self.endpoint("/status")?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .push(job_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ServiceClient for ReqwestServiceClient {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, ServiceError> {
        let url = self.endpoint("/upload/")?;
        let file = tokio::fs::File::open(&request.path)
            .await
            .map_err(|err| io_error(&request, err))?;
        let byte_len = file
            .metadata()
            .await
            .map_err(|err| io_error(&request, err))?
            .len();
        let languages = request.languages.join(",");
        subgen_info!(
            "Uploading {} ({} bytes) languages={}",
            request.file_name,
            byte_len,
            languages
        );

        let body = Body::wrap_stream(ReaderStream::new(file));
        let form = Form::new()
            .part(
                "file",
                Part::stream_with_length(body, byte_len).file_name(request.file_name),
            )
            .text("languages", languages);

        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        // Without a `detail` the message stays empty and the caller words the failure.
        let response = ensure_success_or(response, |_| String::new()).await?;
        let receipt: UploadReceipt = decode_json(response).await?;
        subgen_info!("Upload accepted job_id={}", short_job_id(&receipt.job_id));
        Ok(receipt)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, ServiceError> {
        let url = self.status_url(job_id)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let snapshot: JobStatusResponse = decode_json(ensure_success(response).await?).await?;
        subgen_debug!(
            "Status job_id={} status={:?} subtitles={}",
            short_job_id(job_id),
            snapshot.status,
            snapshot.subtitles.len()
        );
        Ok(snapshot)
    }

    async fn download(&self, download_url: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.endpoint(download_url)?;
        subgen_info!("Downloading {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ServiceError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn list_subtitles(&self) -> Result<Vec<SubtitleFile>, ServiceError> {
        let url = self.endpoint("/subtitles/")?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        let listing: SubtitleListing = decode_json(ensure_success(response).await?).await?;
        Ok(listing.subtitles)
    }

    async fn cleanup(&self) -> Result<(), ServiceError> {
        let url = self.endpoint("/cleanup/")?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        subgen_info!("Service cleanup acknowledged");
        Ok(())
    }
}

/// Turns a non-success response into an error carrying the service's `detail`, if any.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    ensure_success_or(response, |status| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    })
    .await
}

/// As [`ensure_success`], with `fallback` supplying the message when the body has no `detail`.
async fn ensure_success_or(
    response: reqwest::Response,
    fallback: impl FnOnce(StatusCode) -> String,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| fallback(status));
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        message,
    ))
}

fn io_error(request: &UploadRequest, err: std::io::Error) -> ServiceError {
    ServiceError::new(
        FailureKind::Io,
        format!("cannot read {}: {err}", request.path.display()),
    )
}

/// `{"detail": "..."}`; structured details are kept as their JSON text.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ServiceError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ServiceError::new(FailureKind::Decode, err.to_string());
    }
    ServiceError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ReqwestServiceClient {
        ReqwestServiceClient::new(ServiceSettings {
            base_url: base_url.to_string(),
            ..ServiceSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let client = client("http://svc.local:8000/api/");
        assert_eq!(
            client.endpoint("/files/abc123/clip.en.srt").unwrap().as_str(),
            "http://svc.local:8000/api/files/abc123/clip.en.srt"
        );
        assert_eq!(
            client.endpoint("cleanup/").unwrap().as_str(),
            "http://svc.local:8000/api/cleanup/"
        );
    }

    #[test]
    fn status_url_escapes_job_id() {
        let client = client("http://localhost:8000");
        assert_eq!(
            client.status_url("a b/c").unwrap().as_str(),
            "http://localhost:8000/status/a%20b%2Fc"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestServiceClient::new(ServiceSettings {
            base_url: "not a url".into(),
            ..ServiceSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }

    #[test]
    fn error_detail_reads_string_and_structured_details() {
        assert_eq!(
            error_detail(br#"{"detail":"File is empty"}"#).as_deref(),
            Some("File is empty")
        );
        assert_eq!(
            error_detail(br#"{"detail":[{"msg":"field required"}]}"#).as_deref(),
            Some(r#"[{"msg":"field required"}]"#)
        );
        assert_eq!(error_detail(b"<html>oops</html>"), None);
        assert_eq!(error_detail(br#"{"detail":null}"#), None);
    }
}
