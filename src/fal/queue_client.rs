use super::{truncate, MAX_ERROR_BODY};
use crate::{
    config::FalConfig,
    error::{ForgeError, Result},
    models::{
        GenerationOutput, GenerationParameters, ModelOutput, ProgressUpdate, QueueLog,
        QueueStatus, QueueStatusKind, QueueSubmitResponse,
    },
};
use reqwest::{header::AUTHORIZATION, Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Talks to the fal.ai queue: submit, poll status, read the result.
#[derive(Clone)]
pub struct QueueClient {
    http: Client,
    api_key: String,
    base_url: String,
    model_id: String,
    poll_interval: Duration,
}

impl QueueClient {
    pub fn new(http: Client, config: &FalConfig) -> Result<Self> {
        Ok(Self {
            http,
            api_key: config.require_api_key()?.to_string(),
            base_url: config.queue_base_url.trim_end_matches('/').to_string(),
            model_id: config.model_id.trim_matches('/').to_string(),
            poll_interval: config.poll_interval,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub async fn submit(&self, params: &GenerationParameters) -> Result<QueueSubmitResponse> {
        let endpoint = format!("{}/{}", self.base_url, self.model_id);
        log::info!("Submitting generation to {}", endpoint);
        log::debug!(
            "Generation payload: {}",
            serde_json::to_string(params).unwrap_or_default()
        );

        let response = self
            .http
            .post(&endpoint)
            .header(AUTHORIZATION, self.auth_header())
            .json(params)
            .send()
            .await?;
        json_or_service_error(response).await
    }

    pub async fn status(&self, status_url: &str) -> Result<QueueStatus> {
        let response = self
            .http
            .get(status_url)
            .query(&[("logs", "1")])
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        json_or_service_error(response).await
    }

    pub async fn result(&self, response_url: &str) -> Result<ModelOutput> {
        let response = self
            .http
            .get(response_url)
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;
        json_or_service_error(response).await
    }

    /// Submits, polls until the queue reports completion, then fetches the
    /// output. New `IN_PROGRESS` log lines are sent on `progress` as they show up.
    pub async fn generate(
        &self,
        params: &GenerationParameters,
        progress: UnboundedSender<ProgressUpdate>,
    ) -> Result<GenerationOutput> {
        let submitted = self.submit(params).await?;
        let request_id = submitted.request_id.clone();
        let status_url = submitted
            .status_url
            .clone()
            .unwrap_or_else(|| self.status_url(&request_id));
        let response_url = submitted
            .response_url
            .clone()
            .unwrap_or_else(|| self.response_url(&request_id));
        log::info!("Request {} queued", request_id);

        let mut forwarded = 0usize;
        loop {
            let status = self.status(&status_url).await?;
            match status.status {
                QueueStatusKind::InQueue => {
                    log::debug!(
                        "Request {} waiting in queue (position {:?})",
                        request_id,
                        status.queue_position
                    );
                }
                QueueStatusKind::InProgress => {
                    let logs = status.logs.unwrap_or_default();
                    let messages = unseen_messages(&logs, &mut forwarded);
                    if !messages.is_empty() {
                        log::debug!("Request {} progress: {:?}", request_id, messages);
                        // The receiver may already be gone; the call still runs to completion.
                        let _ = progress.send(ProgressUpdate { messages });
                    }
                }
                QueueStatusKind::Completed => break,
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        let output = self.result(&response_url).await?;
        log::info!(
            "Request {} completed with {} image(s)",
            request_id,
            output.images.len()
        );
        Ok(GenerationOutput {
            images: output.images,
            request_id,
        })
    }

    fn auth_header(&self) -> String {
        format!("Key {}", self.api_key)
    }

    fn status_url(&self, request_id: &str) -> String {
        format!(
            "{}/{}/requests/{}/status",
            self.base_url,
            app_path(&self.model_id),
            request_id
        )
    }

    fn response_url(&self, request_id: &str) -> String {
        format!(
            "{}/{}/requests/{}",
            self.base_url,
            app_path(&self.model_id),
            request_id
        )
    }
}

/// Request endpoints live under `owner/app`, without any sub-path of the model id.
fn app_path(model_id: &str) -> String {
    model_id
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join("/")
}

/// The status endpoint returns the full log so far; only lines past `forwarded`
/// are new. A shorter log than before is treated as a fresh one.
fn unseen_messages(logs: &[QueueLog], forwarded: &mut usize) -> Vec<String> {
    let start = if logs.len() >= *forwarded { *forwarded } else { 0 };
    *forwarded = logs.len();
    logs[start..].iter().map(|log| log.message.clone()).collect()
}

async fn json_or_service_error<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        log::error!("Service returned {}: {}", status, truncate(&body, MAX_ERROR_BODY));
        return Err(ForgeError::Service {
            status: status.as_u16(),
            body: truncate(&body, MAX_ERROR_BODY),
        });
    }
    serde_json::from_str(&body).map_err(|e| ForgeError::Response(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fal::fake_server::{FakeServer, SeenRequest};
    use crate::models::{AspectRatio, Style};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn line(message: &str) -> QueueLog {
        QueueLog {
            message: message.to_string(),
            level: None,
            timestamp: None,
        }
    }

    fn client() -> QueueClient {
        let config = FalConfig::new()
            .with_api_key("k")
            .with_queue_base_url("https://queue.example/");
        QueueClient::new(Client::new(), &config).unwrap()
    }

    #[test]
    fn test_app_path_drops_sub_path() {
        assert_eq!(app_path("fal-ai/ideogram/v2"), "fal-ai/ideogram");
        assert_eq!(app_path("fal-ai/fast-sdxl"), "fal-ai/fast-sdxl");
        assert_eq!(app_path("/fal-ai/flux/dev/"), "fal-ai/flux");
    }

    #[test]
    fn test_derived_urls() {
        let client = client();
        assert_eq!(
            client.status_url("abc"),
            "https://queue.example/fal-ai/ideogram/requests/abc/status"
        );
        assert_eq!(
            client.response_url("abc"),
            "https://queue.example/fal-ai/ideogram/requests/abc"
        );
        assert_eq!(client.auth_header(), "Key k");
    }

    #[test]
    fn test_requires_api_key() {
        let result = QueueClient::new(Client::new(), &FalConfig::new());
        assert!(matches!(result, Err(ForgeError::Config(_))));
    }

    #[test]
    fn test_unseen_messages_only_forwards_new_lines() {
        let mut forwarded = 0;
        let first = vec![line("a"), line("b")];
        assert_eq!(unseen_messages(&first, &mut forwarded), vec!["a", "b"]);
        assert_eq!(forwarded, 2);

        assert!(unseen_messages(&first, &mut forwarded).is_empty());

        let grown = vec![line("a"), line("b"), line("c")];
        assert_eq!(unseen_messages(&grown, &mut forwarded), vec!["c"]);

        let restarted = vec![line("x")];
        assert_eq!(unseen_messages(&restarted, &mut forwarded), vec!["x"]);
        assert_eq!(forwarded, 1);
    }

    fn params() -> GenerationParameters {
        GenerationParameters {
            prompt: "A red bicycle on a beach".to_string(),
            aspect_ratio: AspectRatio::Landscape,
            style: Style::Realistic,
            expand_prompt: true,
            negative_prompt: None,
            seed: Some(42),
        }
    }

    fn local_client(base_url: &str) -> QueueClient {
        let config = FalConfig::new()
            .with_api_key("k")
            .with_queue_base_url(base_url)
            .with_poll_interval(Duration::from_millis(1));
        let http = Client::builder().no_proxy().build().unwrap();
        QueueClient::new(http, &config).unwrap()
    }

    #[tokio::test]
    async fn test_generate_polls_derived_urls_until_completed() {
        let polls = AtomicUsize::new(0);
        let server = FakeServer::start(Box::new(move |req: &SeenRequest, _base: &str| {
            match (req.method.as_str(), req.path.as_str()) {
                ("POST", "/fal-ai/ideogram/v2") => (200, r#"{"request_id":"r1"}"#.to_string()),
                ("GET", "/fal-ai/ideogram/requests/r1/status?logs=1") => {
                    let body = match polls.fetch_add(1, Ordering::SeqCst) {
                        0 => r#"{"status":"IN_QUEUE","queue_position":2}"#,
                        1 => r#"{"status":"IN_PROGRESS","logs":[{"message":"loading"}]}"#,
                        2 => r#"{"status":"IN_PROGRESS","logs":[{"message":"loading"},{"message":"sampling"}]}"#,
                        _ => r#"{"status":"COMPLETED","logs":[{"message":"loading"},{"message":"sampling"},{"message":"done"}]}"#,
                    };
                    (200, body.to_string())
                }
                ("GET", "/fal-ai/ideogram/requests/r1") => (
                    200,
                    r#"{"images":[{"url":"https://x/1.png"},{"url":"https://x/2.png"}],"seed":42}"#
                        .to_string(),
                ),
                _ => (404, "{}".to_string()),
            }
        }))
        .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let output = local_client(&server.base_url)
            .generate(&params(), tx)
            .await
            .unwrap();
        assert_eq!(output.request_id, "r1");
        assert_eq!(output.first_image_url(), Some("https://x/1.png"));

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update.messages);
        }
        assert_eq!(updates, vec![vec!["loading".to_string()], vec!["sampling".to_string()]]);

        let requests = server.requests();
        assert_eq!(requests.len(), 6);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].authorization.as_deref(), Some("Key k"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["aspect_ratio"], "16:9");
        assert_eq!(body["seed"], 42);
        assert!(body.get("negative_prompt").is_none());
        assert_eq!(requests[5].path, "/fal-ai/ideogram/requests/r1");
        assert!(requests
            .iter()
            .all(|req| req.authorization.as_deref() == Some("Key k")));
    }

    #[tokio::test]
    async fn test_generate_prefers_urls_from_submit_response() {
        let server = FakeServer::start(Box::new(|req: &SeenRequest, base: &str| {
            match req.path.as_str() {
                "/fal-ai/ideogram/v2" => (
                    200,
                    format!(
                        r#"{{"request_id":"r2","status_url":"{base}/elsewhere/status","response_url":"{base}/elsewhere/result"}}"#
                    ),
                ),
                "/elsewhere/status?logs=1" => (200, r#"{"status":"COMPLETED"}"#.to_string()),
                "/elsewhere/result" => {
                    (200, r#"{"images":[{"url":"https://x/r2.png"}]}"#.to_string())
                }
                _ => (404, "{}".to_string()),
            }
        }))
        .await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let output = local_client(&server.base_url)
            .generate(&params(), tx)
            .await
            .unwrap();
        assert_eq!(output.request_id, "r2");
        assert_eq!(output.first_image_url(), Some("https://x/r2.png"));

        let paths: Vec<String> = server.requests().into_iter().map(|req| req.path).collect();
        assert_eq!(
            paths,
            vec!["/fal-ai/ideogram/v2", "/elsewhere/status?logs=1", "/elsewhere/result"]
        );
    }

    #[tokio::test]
    async fn test_rejected_submit_is_service_error_with_truncated_body() {
        let server = FakeServer::start(Box::new(|_req: &SeenRequest, _base: &str| {
            (422, "e".repeat(MAX_ERROR_BODY + 100))
        }))
        .await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let err = local_client(&server.base_url)
            .generate(&params(), tx)
            .await
            .unwrap_err();
        match err {
            ForgeError::Service { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("expected service error, got {other:?}"),
        }
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_value_is_error() {
        let server = FakeServer::start(Box::new(|req: &SeenRequest, _base: &str| {
            match req.method.as_str() {
                "POST" => (200, r#"{"request_id":"r3"}"#.to_string()),
                _ => (200, r#"{"status":"EXPLODED"}"#.to_string()),
            }
        }))
        .await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = local_client(&server.base_url).generate(&params(), tx).await;
        assert!(matches!(result, Err(ForgeError::Response(_))));
        assert_eq!(server.requests().len(), 2);
    }
}
