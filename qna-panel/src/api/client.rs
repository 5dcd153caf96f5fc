//! HTTP submit client
//!
//! Implements [`CuePointApi`] as a single multirequest POST: add the
//! annotation cue point, attach its metadata, tag it as belonging to the
//! Q&A feature. Later steps reference earlier results with
//! `{N:result:field}` placeholders resolved server-side. The metadata
//! profile id is resolved once by system name and cached for the client's
//! lifetime.

use crate::api::{CuePointApi, SubmitRequest};
use crate::error::{Error, Result};
use crate::model::metadata::build_metadata_xml;
use async_trait::async_trait;
use qna_common::QnaConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

const MULTIREQUEST_PATH: &str = "/api_v3/service/multirequest";
const METADATA_OBJECT_TYPE: &str = "annotationMetadata.Annotation";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Multirequest-based submit client
pub struct QnaApiClient {
    http: reqwest::Client,
    base_url: String,
    session: String,
    profile_system_name: String,
    cue_point_tag: String,
    metadata_profile_id: Mutex<Option<i64>>,
}

impl QnaApiClient {
    pub fn new(base_url: impl Into<String>, session: impl Into<String>, config: &QnaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            session: session.into(),
            profile_system_name: config.metadata_profile_system_name.clone(),
            cue_point_tag: config.cue_point_tag.clone(),
            metadata_profile_id: Mutex::new(None),
        })
    }

    /// Resolve (and cache) the metadata profile id by its fixed system name
    async fn resolve_profile_id(&self) -> Result<i64> {
        let mut cached = self.metadata_profile_id.lock().await;
        if let Some(id) = *cached {
            return Ok(id);
        }

        let body = json!({
            "format": 1,
            "ks": self.session,
            "service": "metadata_metadataprofile",
            "action": "list",
            "filter": {"systemNameEqual": self.profile_system_name},
        });
        let response: Value = self
            .http
            .post(format!("{}{}", self.base_url, MULTIREQUEST_PATH))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        check_api_exception(&response)?;

        let id = response
            .pointer("/objects/0/id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                Error::Submit(format!(
                    "no metadata profile named {}",
                    self.profile_system_name
                ))
            })?;
        debug!("resolved metadata profile id {id}");
        *cached = Some(id);
        Ok(id)
    }
}

#[async_trait]
impl CuePointApi for QnaApiClient {
    async fn submit_cue_point(&self, request: &SubmitRequest) -> Result<String> {
        let profile_id = self.resolve_profile_id().await?;
        let xml = build_metadata_xml(
            "Question",
            request.parent_id.as_deref(),
            &request.thread_creator_id,
        );

        let mut cue_point = json!({
            "objectType": "KalturaAnnotation",
            "entryId": request.entry_id,
            "startTime": request.start_time_ms,
            "text": request.text,
            "isPublic": 1,
            "searchableOnEntry": 0,
            "systemName": request.client_id,
        });
        if let Some(parent_id) = &request.parent_id {
            cue_point["parentId"] = json!(parent_id);
        }

        let body = json!({
            "format": 1,
            "ks": self.session,
            "1": {
                "service": "cuepoint_cuepoint",
                "action": "add",
                "cuePoint": cue_point,
            },
            "2": {
                "service": "metadata_metadata",
                "action": "add",
                "metadataProfileId": profile_id,
                "objectType": METADATA_OBJECT_TYPE,
                "objectId": "{1:result:id}",
                "xmlData": xml,
            },
            "3": {
                "service": "cuepoint_cuepoint",
                "action": "update",
                "id": "{1:result:id}",
                "cuePoint": {"objectType": "KalturaAnnotation", "tags": self.cue_point_tag},
            },
        });

        let responses: Value = self
            .http
            .post(format!("{}{}", self.base_url, MULTIREQUEST_PATH))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        let steps = responses
            .as_array()
            .ok_or_else(|| Error::Submit("multirequest response is not an array".to_string()))?;
        for step in steps {
            check_api_exception(step)?;
        }

        steps
            .first()
            .and_then(|step| step.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Submit("cue point add returned no id".to_string()))
    }
}

/// Per-step error detection: a failed step arrives as an exception object,
/// not an HTTP error status
fn check_api_exception(value: &Value) -> Result<()> {
    let is_exception = value
        .get("objectType")
        .and_then(Value::as_str)
        .map(|t| t == "KalturaAPIException")
        .unwrap_or(false);
    if is_exception {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown API exception");
        return Err(Error::Submit(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_api_exception() {
        let ok = json!({"objectType": "KalturaAnnotation", "id": "1_abc"});
        assert!(check_api_exception(&ok).is_ok());

        let err = json!({"objectType": "KalturaAPIException", "message": "invalid ks"});
        match check_api_exception(&err) {
            Err(Error::Submit(msg)) => assert_eq!(msg, "invalid ks"),
            other => panic!("expected submit error, got {other:?}"),
        }
    }

    #[test]
    fn test_client_construction() {
        let client = QnaApiClient::new("https://example.test", "ks-token", &QnaConfig::default());
        assert!(client.is_ok());
    }
}
