use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use url::Url;
use vsi_core::{ApiConfig, HistoryQuery, JobId, UploadJob};
use vsi_logging::{vsi_debug, vsi_info};

use crate::wire::{HistoryResponse, JobRecord, UploadResponse};
use crate::{
    transfer_percent, with_retry, ErrorKind, HistoryPage, RetryPolicy, SubmitReceipt,
    TransportError, UploadRequest,
};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Everything up to and including the API prefix, e.g. `http://host:8000/api`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ClientSettings {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: api.timeout,
            retry: RetryPolicy::from(api),
        }
    }
}

/// Receives transfer progress, already capped at 95 percent.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, percent: f64);
}

/// The three remote operations of the upload service.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn submit_upload(
        &self,
        upload: &UploadRequest,
        sink: &dyn ProgressSink,
    ) -> Result<SubmitReceipt, TransportError>;

    async fn fetch_status(&self, job_id: &JobId) -> Result<UploadJob, TransportError>;

    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| TransportError::new(ErrorKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::new(
                ErrorKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(ErrorKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn submit_upload(
        &self,
        upload: &UploadRequest,
        sink: &dyn ProgressSink,
    ) -> Result<SubmitReceipt, TransportError> {
        let file = tokio::fs::File::open(&upload.path)
            .await
            .map_err(|err| TransportError::new(ErrorKind::File, err.to_string()))?;
        let total = file
            .metadata()
            .await
            .map_err(|err| TransportError::new(ErrorKind::File, err.to_string()))?
            .len();

        // The body stream must be 'static, so byte counts travel back over a channel.
        let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<u64>();
        let stream = ReaderStream::new(file).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                let _ = sent_tx.send(bytes.len() as u64);
            }
            chunk
        });
        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(upload.filename.clone())
            .mime_str(&upload.media_type)
            .map_err(|err| TransportError::new(ErrorKind::File, err.to_string()))?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["upload"]);
        vsi_info!("Uploading {} ({total} bytes) to {url}", upload.filename);
        let request = self.client.post(url).multipart(form).send();
        tokio::pin!(request);

        let mut sent = 0u64;
        let response = loop {
            tokio::select! {
                Some(bytes) = sent_rx.recv() => {
                    sent += bytes;
                    if let Some(percent) = transfer_percent(sent, total) {
                        sink.emit(percent);
                    }
                }
                result = &mut request => {
                    break result.map_err(|err| map_reqwest_error(err, true))?;
                }
            }
        };
        while let Ok(bytes) = sent_rx.try_recv() {
            sent += bytes;
            if let Some(percent) = transfer_percent(sent, total) {
                sink.emit(percent);
            }
        }

        let body: UploadResponse = decode(response, true).await?;
        Ok(body.into())
    }

    async fn fetch_status(&self, job_id: &JobId) -> Result<UploadJob, TransportError> {
        let url = self.endpoint(&["upload", job_id.as_str(), "status"]);
        let record: JobRecord = with_retry(&self.settings.retry, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| map_reqwest_error(err, false))?;
                decode(response, false).await
            }
        })
        .await?;
        record.into_job()
    }

    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage, TransportError> {
        let mut url = self.endpoint(&["uploads"]);
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = query.status {
                pairs.append_pair("status", status.as_str());
            }
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("limit", &query.limit.to_string());
        }
        vsi_debug!("Fetching history from {url}");
        let body: HistoryResponse = with_retry(&self.settings.retry, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| map_reqwest_error(err, false))?;
                decode(response, false).await
            }
        })
        .await?;
        Ok(body.into_page())
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    uploading: bool,
) -> Result<T, TransportError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|err| map_reqwest_error(err, uploading))?;
    if !status.is_success() {
        return Err(TransportError::from_status(status.as_u16(), &body));
    }
    serde_json::from_slice(&body)
        .map_err(|err| TransportError::new(ErrorKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error, uploading: bool) -> TransportError {
    if err.is_timeout() {
        let kind = if uploading {
            ErrorKind::UploadTimeout
        } else {
            ErrorKind::Timeout
        };
        return TransportError::new(kind, err.to_string());
    }
    TransportError::new(ErrorKind::Network, err.to_string())
}
