//! Client side of the external "understanding" service.
//!
//! One call per enrichment: the catalog key goes out, a group/type
//! classification with description, tags and caption comes back.

use crate::config::ClassifierConfig;
use crate::error::ClassifyError;
use async_trait::async_trait;
use nas_catalog_db::{CatalogEntry, UNKNOWN_GROUP};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// What the service is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRequest {
    pub path: String,
}

impl ClassificationRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// The service's answer for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub group: String,
    pub file_type: String,
    pub description: String,
    pub tags: String,
    pub caption: String,
}

impl Classification {
    /// Overwrite all classification fields of `entry`.
    ///
    /// An empty group from the service is stored as `"unknown"`.
    pub fn apply_to(&self, entry: &mut CatalogEntry) {
        entry.group = if self.group.is_empty() {
            UNKNOWN_GROUP.to_string()
        } else {
            self.group.clone()
        };
        entry.file_type = self.file_type.clone();
        entry.description = self.description.clone();
        entry.tags = self.tags.clone();
        entry.caption = self.caption.clone();
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, request: &ClassificationRequest) -> Result<Classification, ClassifyError>;
}

/// Wire form of the service response.
#[derive(Debug, Deserialize)]
struct UnderstandingResponse {
    #[serde(default)]
    group: String,
    #[serde(default, rename = "type")]
    file_type: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Option<Tags>,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    error: Option<String>,
}

/// Tags arrive either pre-joined or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Tags {
    Joined(String),
    List(Vec<String>),
}

impl Tags {
    fn into_joined(self) -> String {
        match self {
            Tags::Joined(s) => s,
            Tags::List(items) => items.join(","),
        }
    }
}

impl From<UnderstandingResponse> for Classification {
    fn from(resp: UnderstandingResponse) -> Self {
        Self {
            group: resp.group,
            file_type: resp.file_type,
            description: resp.description,
            tags: resp.tags.map(Tags::into_joined).unwrap_or_default(),
            caption: resp.caption,
        }
    }
}

/// `reqwest` client posting JSON to `<base_url>/understanding`.
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/understanding", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<Classification, ClassifyError> {
        debug!(path = %request.path, endpoint = %self.endpoint, "Classifying");

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UnderstandingResponse = response.json().await?;
        if let Some(message) = parsed.error.as_deref().filter(|m| !m.is_empty()) {
            return Err(ClassifyError::Service(message.to_string()));
        }
        Ok(parsed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_with_tag_list() {
        let resp: UnderstandingResponse = serde_json::from_str(
            r#"{"group":"image","type":"photo","description":"d","tags":["beach","sea"],"caption":"waves"}"#,
        )
        .unwrap();
        let c = Classification::from(resp);
        assert_eq!(c.group, "image");
        assert_eq!(c.file_type, "photo");
        assert_eq!(c.tags, "beach,sea");
        assert_eq!(c.caption, "waves");
    }

    #[test]
    fn test_response_with_missing_fields() {
        let resp: UnderstandingResponse = serde_json::from_str(r#"{"group":"document","tags":"a,b"}"#).unwrap();
        let c = Classification::from(resp);
        assert_eq!(c.group, "document");
        assert_eq!(c.tags, "a,b");
        assert!(c.caption.is_empty());

        let resp: UnderstandingResponse = serde_json::from_str(r#"{"group":"other","tags":null}"#).unwrap();
        assert!(Classification::from(resp).tags.is_empty());
    }

    #[test]
    fn test_apply_overwrites_every_field() {
        let mut entry = CatalogEntry {
            caption: "old caption".into(),
            tags: "old".into(),
            ..CatalogEntry::new("/a.jpg")
        };
        Classification {
            group: "image".into(),
            file_type: "photo".into(),
            ..Default::default()
        }
        .apply_to(&mut entry);

        assert_eq!(entry.group, "image");
        assert_eq!(entry.file_type, "photo");
        assert!(entry.caption.is_empty());
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn test_empty_group_becomes_unknown() {
        let mut entry = CatalogEntry::new("/a.bin");
        entry.group.clear();
        Classification::default().apply_to(&mut entry);
        assert_eq!(entry.group, UNKNOWN_GROUP);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let c = HttpClassifier::with_client(Client::new(), "http://svc:8000/");
        assert_eq!(c.endpoint(), "http://svc:8000/understanding");
    }

    #[test]
    fn test_request_serializes_path_only() {
        let json = serde_json::to_string(&ClassificationRequest::new("/a.jpg")).unwrap();
        assert_eq!(json, r#"{"path":"/a.jpg"}"#);
    }
}
