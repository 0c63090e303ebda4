use serde::{Deserialize, Serialize};

/// Returned by the queue when a request is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSubmitResponse {
    pub request_id: String,
    pub status_url: Option<String>,
    pub response_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatusKind {
    InQueue,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueLog {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub status: QueueStatusKind,
    #[serde(default)]
    pub logs: Option<Vec<QueueLog>>,
    #[serde(default)]
    pub queue_position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Final model output as served by the response endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelOutput {
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
}

/// What a generation call resolves to: the images plus the queue request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub images: Vec<GeneratedImage>,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

impl GenerationOutput {
    pub fn first_image_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

/// Non-final notification emitted while the service is working.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_logs() {
        let status: QueueStatus = serde_json::from_str(
            r#"{"status":"IN_PROGRESS","logs":[{"message":"step 1","level":"INFO"},{"message":"step 2"}]}"#,
        )
        .unwrap();
        assert_eq!(status.status, QueueStatusKind::InProgress);
        let logs = status.logs.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].message, "step 2");
    }

    #[test]
    fn test_status_in_queue_without_logs() {
        let status: QueueStatus =
            serde_json::from_str(r#"{"status":"IN_QUEUE","queue_position":3}"#).unwrap();
        assert_eq!(status.status, QueueStatusKind::InQueue);
        assert_eq!(status.queue_position, Some(3));
        assert!(status.logs.is_none());
    }

    #[test]
    fn test_model_output_tolerates_missing_images() {
        let output: ModelOutput = serde_json::from_str(r#"{"seed":12}"#).unwrap();
        assert!(output.images.is_empty());
    }

    #[test]
    fn test_first_image_wins() {
        let output: GenerationOutput = serde_json::from_str(
            r#"{"images":[{"url":"X"},{"url":"Y"}],"requestId":"r1"}"#,
        )
        .unwrap();
        assert_eq!(output.first_image_url(), Some("X"));
        assert_eq!(output.request_id, "r1");
    }
}
