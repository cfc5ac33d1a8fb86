use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::clients::ContentStore;
use crate::config::Config;
use crate::content::{Annotation, AnnotationRecord, Comment, NewAnnotation};
use crate::error::FetchError;

/// REST client for the comment/annotation backend.
pub struct ContentApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ContentApiClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent("PgnViewer/1.0")
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, FetchError> {
        let resp = self.authorized(request).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(what.to_string()));
        }

        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "{what} request failed");
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, FetchError> {
        let resp = self.send(self.client.get(self.url(path)), what).await?;
        Ok(resp.json().await?)
    }
}

impl ContentStore for ContentApiClient {
    async fn fetch_comments(&self, game_id: &str) -> Result<Vec<Comment>, FetchError> {
        self.get_json(&format!("/games/{game_id}/comments/"), "Comments")
            .await
    }

    async fn fetch_annotations(&self, game_id: &str) -> Result<Vec<Annotation>, FetchError> {
        let records: Vec<AnnotationRecord> = self
            .get_json(&format!("/games/{game_id}/annotations/"), "Annotations")
            .await?;
        Ok(records.into_iter().map(Annotation::from).collect())
    }

    async fn create_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation, FetchError> {
        let path = format!("/games/{}/annotations/", annotation.game_id);
        let resp = self
            .send(self.client.post(self.url(&path)).json(annotation), "Annotation")
            .await?;
        let record: AnnotationRecord = resp.json().await?;
        Ok(record.into())
    }

    async fn update_annotation(&self, annotation_id: i64, text: &str) -> Result<Annotation, FetchError> {
        let path = format!("/games/annotations/{annotation_id}/");
        let resp = self
            .send(
                self.client.patch(self.url(&path)).json(&json!({ "text": text })),
                "Annotation",
            )
            .await?;
        let record: AnnotationRecord = resp.json().await?;
        Ok(record.into())
    }

    async fn delete_annotation(&self, annotation_id: i64) -> Result<(), FetchError> {
        let path = format!("/games/annotations/{annotation_id}/");
        self.send(self.client.delete(self.url(&path)), "Annotation")
            .await?;
        Ok(())
    }
}
