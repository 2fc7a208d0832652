use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use datasim_core::{GenerationRequest, GenerationResult, Job, JobId, JobStatus, Progress};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// Source of job status snapshots.
///
/// Abstracted so the poller can be driven by a scripted source in tests; the
/// real implementation is [`ApiClient`].
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the latest snapshot for `job_id`.
    async fn job_status(&self, job_id: &JobId) -> Result<Job, ClientError>;
}

/// Client for the generation backend.
///
/// Holds the HTTP connection pool, the endpoint configuration, and the
/// session credential when one has been installed. No call retries
/// automatically; every retry is caller-initiated.
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    session: Option<Session>,
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct OtpVerification<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    task_id: String,
}

/// Flat wire shape of `GET /task-status/{id}`. While the job runs the
/// progress counters arrive as top-level integers; a finished job carries
/// either `result` or `error` instead.
#[derive(Deserialize)]
struct TaskStatusResponse {
    status: JobStatus,
    #[serde(default)]
    progress: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<GenerationResult>,
    #[serde(default)]
    error: Option<String>,
}

impl TaskStatusResponse {
    fn into_job(self, id: JobId) -> Job {
        let progress = self.progress.map(|current| Progress {
            current,
            total: self.total.unwrap_or(1),
        });
        Job {
            id,
            status: self.status,
            progress,
            message: self.message,
            result: self.result,
            error: self.error,
        }
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        Ok(Self {
            http,
            config,
            session: None,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Install the credential obtained at login.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Drop the credential at logout.
    pub fn clear_session(&mut self) {
        self.session = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Attach the bearer token when a session is present.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        }
    }

    /// Ask the backend to email a one-time code.
    pub async fn request_otp(&self, email: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/send-otp"))
            .json(&OtpRequest { email })
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        check_status(response).await?;
        Ok(())
    }

    /// Exchange the emailed code for a session credential.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/verify-otp"))
            .json(&OtpVerification { email, otp })
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let response = check_status(response).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))?;
        Ok(Session::new(token.access_token))
    }

    /// Submit a generation request to the synchronous endpoint and wait for
    /// the full result.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ClientError> {
        info!(
            table = %request.schema.table_name,
            records = request.record_count,
            format = request.output_format.as_str(),
            "submitting synchronous generation"
        );
        let response = self
            .authed(self.http.post(self.url("/generate-data/")))
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))
    }

    /// Submit to the asynchronous endpoint and return the job identifier.
    /// Completion is tracked separately by the poller.
    pub async fn generate_async(
        &self,
        request: &GenerationRequest,
    ) -> Result<JobId, ClientError> {
        info!(
            table = %request.schema.table_name,
            records = request.record_count,
            format = request.output_format.as_str(),
            "submitting asynchronous generation"
        );
        let response = self
            .authed(self.http.post(self.url("/generate-data-async/")))
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let response = check_status(response).await?;
        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))?;
        Ok(JobId::new(submitted.task_id))
    }

    /// One status fetch for an asynchronous job.
    pub async fn job_status(&self, job_id: &JobId) -> Result<Job, ClientError> {
        let response = self
            .authed(
                self.http
                    .get(self.url(&format!("/task-status/{job_id}"))),
            )
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let response = check_status(response).await?;
        let status: TaskStatusResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Parse(err.to_string()))?;
        debug!(job = %job_id, "fetched job status");
        Ok(status.into_job(job_id.clone()))
    }

    /// Fetch the raw bytes of a generated file by its backend filename.
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>, ClientError> {
        let response = self
            .authed(self.http.get(self.url(&format!("/download/{filename}"))))
            .send()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        let response = check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ClientError::Connection(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn job_status(&self, job_id: &JobId) -> Result<Job, ClientError> {
        ApiClient::job_status(self, job_id).await
    }
}

/// Map a non-success response to [`ClientError::Server`], surfacing the
/// backend's `detail` message verbatim when the body carries one.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);
    Err(ClientError::Server {
        status: status.as_u16(),
        detail,
    })
}
