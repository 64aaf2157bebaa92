//! HTTP implementation of the transaction and product sources.

use crate::traits::{ProductSource, TransactionSource};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tally_core::{
    ConfigError, NewPurchase, NewRental, Product, PurchaseRecord, RecordId, RemoteError,
    RentalRecord, ResourceKind, TallyResult,
};

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Opaque credential sent as `Authorization: Bearer <token>`.
    pub bearer_token: String,
    /// Transport timeout. The only timeout applied to remote calls.
    pub request_timeout: Duration,
}

/// What a request is about, used to shape NotFound errors.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    resource: ResourceKind,
    id: Option<&'a RecordId>,
}

/// Error body shapes the backend is known to return.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    pub fn new(config: &RemoteConfig) -> TallyResult<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| ConfigError::InvalidValue {
            field: "api_base_url",
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must be an absolute http(s) URL".to_string(),
            }
            .into());
        }

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.bearer_token)).map_err(
            |e| ConfigError::InvalidValue {
                field: "auth.bearer_token",
                reason: e.to_string(),
            },
        )?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> TallyResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Unknown {
                reason: format!("cannot build a path under {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        target: Target<'_>,
    ) -> TallyResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        parse_response(response, target).await
    }

    async fn post_json<T, B>(
        &self,
        segments: &[&str],
        body: &B,
        target: Target<'_>,
    ) -> TallyResult<T>
    where
        T: DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response, target).await
    }

    async fn delete(&self, segments: &[&str], target: Target<'_>) -> TallyResult<()> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "DELETE");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = error_body(response).await;
        Err(classify_with_target(status, &text, target).into())
    }
}

#[async_trait]
impl TransactionSource for RestClient {
    async fn list_purchases(&self) -> TallyResult<Vec<PurchaseRecord>> {
        self.get_json(&["purchases"], Target::list(ResourceKind::Purchase))
            .await
    }

    async fn list_rentals(&self) -> TallyResult<Vec<RentalRecord>> {
        self.get_json(&["rentals"], Target::list(ResourceKind::Rental))
            .await
    }

    async fn get_purchase(&self, id: &RecordId) -> TallyResult<PurchaseRecord> {
        self.get_json(
            &["purchases", id.as_str()],
            Target::one(ResourceKind::Purchase, id),
        )
        .await
    }

    async fn get_rental(&self, id: &RecordId) -> TallyResult<RentalRecord> {
        self.get_json(
            &["rentals", id.as_str()],
            Target::one(ResourceKind::Rental, id),
        )
        .await
    }

    async fn create_purchase(&self, payload: &NewPurchase) -> TallyResult<PurchaseRecord> {
        self.post_json(&["purchases"], payload, Target::list(ResourceKind::Purchase))
            .await
    }

    async fn create_rental(&self, payload: &NewRental) -> TallyResult<RentalRecord> {
        self.post_json(&["rentals"], payload, Target::list(ResourceKind::Rental))
            .await
    }

    async fn delete_purchase(&self, id: &RecordId) -> TallyResult<()> {
        self.delete(
            &["purchases", id.as_str()],
            Target::one(ResourceKind::Purchase, id),
        )
        .await
    }

    async fn delete_rental(&self, id: &RecordId) -> TallyResult<()> {
        self.delete(
            &["rentals", id.as_str()],
            Target::one(ResourceKind::Rental, id),
        )
        .await
    }
}

#[async_trait]
impl ProductSource for RestClient {
    async fn get_product(&self, product_id: &RecordId) -> TallyResult<Product> {
        self.get_json(
            &["products", product_id.as_str()],
            Target::one(ResourceKind::Product, product_id),
        )
        .await
    }
}

impl<'a> Target<'a> {
    fn list(resource: ResourceKind) -> Self {
        Self { resource, id: None }
    }

    fn one(resource: ResourceKind, id: &'a RecordId) -> Self {
        Self {
            resource,
            id: Some(id),
        }
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    target: Target<'_>,
) -> TallyResult<T> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            RemoteError::Unknown {
                reason: format!("undecodable response body: {}", e),
            }
            .into()
        });
    }
    let text = error_body(response).await;
    Err(classify_with_target(status, &text, target).into())
}

/// Body of an error response. An unreadable body leaves only the status.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(%status, error = %err, "Failed to read error response body");
            String::new()
        }
    }
}

fn transport_error(err: reqwest::Error) -> tally_core::TallyError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        RemoteError::Network {
            reason: err.to_string(),
        }
        .into()
    } else {
        RemoteError::Unknown {
            reason: err.to_string(),
        }
        .into()
    }
}

fn classify_with_target(status: StatusCode, body: &str, target: Target<'_>) -> RemoteError {
    match (status, target.id) {
        (StatusCode::NOT_FOUND, Some(id)) => RemoteError::NotFound {
            resource: target.resource,
            id: id.clone(),
        },
        _ => classify_status(status.as_u16(), body),
    }
}

/// Map a non-success HTTP status and body onto the error taxonomy.
///
/// A 404 without a known record id becomes `Unknown`, since list endpoints
/// are not expected to be missing.
pub fn classify_status(status: u16, body: &str) -> RemoteError {
    let message = error_message(body);
    match status {
        400 | 409 | 422 => RemoteError::Validation { reason: message },
        500..=599 => RemoteError::Server { status, message },
        _ => RemoteError::Unknown {
            reason: format!("HTTP {}: {}", status, message),
        },
    }
}

fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tally_core::{ErrorKind, TallyError};

    fn client_for(server: &mockito::Server) -> RestClient {
        RestClient::new(&RemoteConfig {
            base_url: server.url(),
            bearer_token: "secret".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(422, "{}").kind(), ErrorKind::Validation);
        assert_eq!(classify_status(400, "").kind(), ErrorKind::Validation);
        assert_eq!(classify_status(503, "").kind(), ErrorKind::Server);
        assert_eq!(classify_status(418, "").kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let err = classify_status(500, r#"{"message":"database down"}"#);
        assert_eq!(
            err,
            RemoteError::Server {
                status: 500,
                message: "database down".to_string()
            }
        );
        let err = classify_status(422, r#"{"error":"product required"}"#);
        assert_eq!(
            err,
            RemoteError::Validation {
                reason: "product required".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let result = RestClient::new(&RemoteConfig {
            base_url: "not a url".to_string(),
            bearer_token: "secret".to_string(),
            request_timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(TallyError::Config(_))));
    }

    #[tokio::test]
    async fn test_list_purchases_sends_bearer_and_parses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/purchases")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1,"product":10,"buyer":2,"seller":3,"purchaseDate":"2024-01-01"}]"#)
            .create_async()
            .await;

        let records = client_for(&server).list_purchases().await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id.as_str(), "1");
        assert_eq!(records[0].product_id.as_str(), "10");
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/products/10")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_product(&RecordId::from("10"))
            .await
            .unwrap_err();

        assert_eq!(err, TallyError::not_found(ResourceKind::Product, "10"));
    }

    #[tokio::test]
    async fn test_list_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rentals")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = client_for(&server).list_rentals().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[tokio::test]
    async fn test_broken_error_body_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/rentals/4")
            .with_status(503)
            .with_chunked_body(|w| {
                w.write_all(b"upstream")?;
                Err(std::io::Error::other("connection reset"))
            })
            .create_async()
            .await;

        let err = client_for(&server)
            .delete_rental(&"4".into())
            .await
            .unwrap_err();

        match err {
            TallyError::Remote(RemoteError::Server { status, .. }) => assert_eq!(status, 503),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/purchases")
            .with_status(422)
            .with_body(r#"{"message":"buyer is required"}"#)
            .create_async()
            .await;

        let payload = NewPurchase {
            product_id: "10".into(),
            buyer_id: "".into(),
            seller_id: "3".into(),
            purchase_date: None,
        };
        let err = client_for(&server)
            .create_purchase(&payload)
            .await
            .unwrap_err();

        assert_eq!(err, TallyError::validation("buyer is required"));
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/rentals/5")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server)
            .delete_rental(&RecordId::from("5"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/purchases/1")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_purchase(&RecordId::from("1"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network() {
        let client = RestClient::new(&RemoteConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            bearer_token: "secret".to_string(),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap();

        let err = client.list_purchases().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
