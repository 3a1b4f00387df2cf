//! HTTP implementation of [`DataService`] against the events API.
//!
//! Routes mirror the backend: `GET/POST /api/events`,
//! `GET/PATCH/DELETE /api/events/:id`, `POST /api/events/:id/attend` and
//! `/leave`, `GET /api/events/search`. Authenticated requests carry a
//! bearer token. HTTP failures are mapped onto the engine's error
//! taxonomy; the body's `{"error": ...}` message is preserved for the
//! caller.

use crate::gateway::{DataService, SearchPage, ServiceFuture};
use mingle_core::{EngineError, Event, EventId, EventPatch, NewEvent, SearchQuery};
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`DataService`] backed by the remote events API.
#[derive(Clone, Debug)]
pub struct RestDataService {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestDataService {
    /// Creates a client for the given base URL (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Attaches the bearer token used for mutating requests.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        id: Option<&EventId>,
    ) -> Result<T, EngineError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| EngineError::Transport(format!("malformed response body: {e}")));
        }

        // Error bodies are `{"error": msg}`; fall back to the raw text.
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(str::to_owned))
            .unwrap_or(body);
        Err(map_status(status, message, id))
    }
}

fn map_status(status: reqwest::StatusCode, message: String, id: Option<&EventId>) -> EngineError {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EngineError::Unauthorized(message),
        StatusCode::NOT_FOUND => match id {
            Some(id) => EngineError::NotFound { id: id.clone() },
            None => EngineError::Transport(format!("unexpected 404: {message}")),
        },
        StatusCode::CONFLICT => EngineError::Conflict(message),
        StatusCode::BAD_REQUEST => {
            // The API reports attend/leave roster mismatches as 400 with
            // an "...attending..." message; everything else is a payload
            // problem.
            if message.to_lowercase().contains("attending") {
                EngineError::Conflict(message)
            } else {
                EngineError::Validation(message)
            }
        }
        other => EngineError::Transport(format!("{other}: {message}")),
    }
}

impl DataService for RestDataService {
    fn list_events(&self) -> ServiceFuture<'_, Vec<Event>> {
        Box::pin(async move {
            self.execute(self.http.get(self.url("/api/events")), None)
                .await
        })
    }

    fn get_event(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            let url = self.url(&format!("/api/events/{id}"));
            self.execute(self.http.get(url), Some(&id)).await
        })
    }

    fn create_event(&self, event: NewEvent) -> ServiceFuture<'_, Event> {
        Box::pin(async move {
            self.execute(self.http.post(self.url("/api/events")).json(&event), None)
                .await
        })
    }

    fn update_event(&self, id: &EventId, patch: EventPatch) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            let url = self.url(&format!("/api/events/{id}"));
            self.execute(self.http.patch(url).json(&patch), Some(&id))
                .await
        })
    }

    fn delete_event(&self, id: &EventId) -> ServiceFuture<'_, ()> {
        let id = id.clone();
        Box::pin(async move {
            let url = self.url(&format!("/api/events/{id}"));
            // The API answers deletes with `{"message": ...}`.
            let _: serde_json::Value = self.execute(self.http.delete(url), Some(&id)).await?;
            Ok(())
        })
    }

    fn attend(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            let url = self.url(&format!("/api/events/{id}/attend"));
            self.execute(self.http.post(url), Some(&id)).await
        })
    }

    fn leave(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            let url = self.url(&format!("/api/events/{id}/leave"));
            self.execute(self.http.post(url), Some(&id)).await
        })
    }

    fn search(&self, query: &SearchQuery) -> ServiceFuture<'_, SearchPage> {
        let query = query.clone();
        Box::pin(async move {
            let mut params = vec![("q", query.text.clone())];
            if let Some(category) = query.category {
                params.push(("category", category.to_string()));
            }
            let request = self.http.get(self.url("/api/events/search")).query(&params);
            self.execute(request, None).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_mapping_covers_taxonomy() {
        let id = EventId::from("e1");

        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, String::new(), Some(&id)),
            EngineError::NotFound { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "no token".into(), None),
            EngineError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status(
                StatusCode::BAD_REQUEST,
                "Already attending this event".into(),
                Some(&id)
            ),
            EngineError::Conflict(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "date is required".into(), None),
            EngineError::Validation(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, String::new(), None),
            EngineError::Transport(_)
        ));
    }
}
