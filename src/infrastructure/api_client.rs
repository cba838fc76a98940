use crate::infrastructure::credential_store::AccessTokenStore;
use crate::infrastructure::error::InfraError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

const NO_ACTIVE_DEVICE_MARKER: &str = "active device not found";

/// Backend client shared by the track, mood and recommendation sources.
#[derive(Clone)]
pub struct ReqwestDashboardApi {
    client: Client,
    base_url: Url,
    token_store: Arc<dyn AccessTokenStore>,
}

impl std::fmt::Debug for ReqwestDashboardApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestDashboardApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReqwestDashboardApi {
    pub fn new(base_url: Url, token_store: Arc<dyn AccessTokenStore>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token_store,
        }
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, InfraError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                InfraError::InvalidConfig("api base URL cannot be a base".to_string())
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, InfraError> {
        let request = self.authorize(self.client.get(url))?;
        self.send(request, context).await
    }

    pub(crate) async fn post_json<B, T>(&self, url: Url, body: &B, context: &str) -> Result<T, InfraError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(url).json(body))?;
        self.send(request, context).await
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, InfraError> {
        Ok(match self.token_store.load_token()? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> Result<T, InfraError> {
        let response = request
            .send()
            .await
            .map_err(|error| InfraError::Network(format!("{context}: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Network(format!("failed reading {context} response: {error}")))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        decode_body(&body, context)
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, InfraError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|error| {
        InfraError::InvalidPayload(format!("invalid {context} payload: {error}; body={body}"))
    })
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> InfraError {
    let detail = extract_detail(body);
    let message = detail
        .clone()
        .unwrap_or_else(|| format!("http {}", status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED => InfraError::Unauthorized(message),
        StatusCode::FORBIDDEN => InfraError::Forbidden(message),
        StatusCode::BAD_REQUEST
            if detail
                .as_deref()
                .is_some_and(|detail| detail.to_ascii_lowercase().contains(NO_ACTIVE_DEVICE_MARKER)) =>
        {
            InfraError::NoActiveDevice(message)
        }
        _ => InfraError::Http {
            status: status.as_u16(),
            detail,
        },
    }
}

/// Reads `{"detail": "..."}` error bodies; anything else yields `None`.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed
        .get("detail")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::credential_store::InMemoryAccessTokenStore;

    fn api(base: &str) -> ReqwestDashboardApi {
        ReqwestDashboardApi::new(
            Url::parse(base).expect("valid base"),
            Arc::new(InMemoryAccessTokenStore::default()),
        )
    }

    #[test]
    fn endpoint_appends_segments_with_or_without_trailing_slash() {
        let url = api("https://localhost:8000/api/v1")
            .endpoint(&["mood", "current"])
            .expect("endpoint");
        assert_eq!(url.as_str(), "https://localhost:8000/api/v1/mood/current");

        let url = api("https://localhost:8000/api/v1/")
            .endpoint(&["spotify", "recent-tracks"])
            .expect("endpoint");
        assert_eq!(url.as_str(), "https://localhost:8000/api/v1/spotify/recent-tracks");
    }

    #[test]
    fn status_error_maps_auth_failures() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, r#"{"detail":"Could not validate credentials"}"#),
            InfraError::Unauthorized(message) if message == "Could not validate credentials"
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            InfraError::Forbidden(message) if message == "http 403"
        ));
    }

    #[test]
    fn status_error_detects_missing_playback_device() {
        let error = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Spotify active device not found"}"#,
        );
        assert!(matches!(error, InfraError::NoActiveDevice(_)));

        let error = status_error(StatusCode::BAD_REQUEST, r#"{"detail":"bad limit"}"#);
        assert!(matches!(
            error,
            InfraError::Http { status: 400, detail: Some(ref detail) } if detail == "bad limit"
        ));
    }

    #[test]
    fn status_error_ignores_non_json_bodies() {
        let error = status_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(error, InfraError::Http { status: 502, detail: None }));
    }

    #[test]
    fn decode_body_treats_blank_as_null() {
        let value: Option<u32> = decode_body("  ", "test").expect("null");
        assert_eq!(value, None);
        assert!(matches!(
            decode_body::<u32>("{", "test"),
            Err(InfraError::InvalidPayload(_))
        ));
    }
}
