//! Implements `TransactionApi` over HTTP using `reqwest`.

use crate::api::TransactionApi;
use crate::error::{Error, ErrorType, IntoResult, Result};
use crate::model::Transaction;
use crate::normalize::{looks_like_html, RawResponse};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Talks to the spreadsheet proxy at `base`. Every request carries `Content-Type: application/json`
/// and is bounded by a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: Url,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid transaction service URL '{base_url}'"))
            .pub_result(ErrorType::Config)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Unable to build the HTTP client")
            .pub_result(ErrorType::Config)?;

        debug!("Using transaction service at {base} with a {timeout:?} timeout");
        Ok(Self { base, client })
    }

    /// The base URL with `params` appended as query parameters.
    fn url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    /// Sends `request` and classifies the body. `what` describes the operation for error messages.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<RawResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, what))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, what))?;
        trace!("{what} answered {status} with {} bytes", body.len());

        if !status.is_success() {
            return Err(status_error(status, &body, what));
        }
        Ok(RawResponse::from_body(&body))
    }
}

#[async_trait::async_trait]
impl TransactionApi for HttpApi {
    async fn list(&self, user_id: &str) -> Result<RawResponse> {
        let url = self.url(&[("userId", user_id)]);
        trace!("GET {url}");
        self.send(self.client.get(url), "list transactions").await
    }

    async fn create(&self, transaction: &Transaction) -> Result<RawResponse> {
        let url = self.url(&[]);
        trace!("POST {url}");
        self.send(self.client.post(url).json(transaction), "create a transaction")
            .await
    }

    async fn update(
        &self,
        id: &str,
        user_id: &str,
        transaction: &Transaction,
    ) -> Result<RawResponse> {
        let url = self.url(&[("id", id), ("userId", user_id)]);
        trace!("PUT {url}");
        self.send(self.client.put(url).json(transaction), "update a transaction")
            .await
    }

    async fn delete(&self, id: &str, user_id: &str) -> Result<RawResponse> {
        let url = self.url(&[("id", id), ("userId", user_id)]);
        trace!("DELETE {url}");
        self.send(self.client.delete(url), "delete a transaction")
            .await
    }
}

fn transport_error(e: reqwest::Error, what: &str) -> Error {
    let error_type = if e.is_timeout() {
        ErrorType::Timeout
    } else {
        ErrorType::Network
    };
    Error::new(error_type, anyhow::Error::new(e).context(format!("Failed to {what}")))
}

fn status_error(status: StatusCode, body: &str, what: &str) -> Error {
    if looks_like_html(body) {
        return Error::msg(
            ErrorType::UpstreamMisconfigured,
            format!("Failed to {what}: the service answered {status} with an HTML page"),
        );
    }
    let preview: String = body.chars().take(200).collect();
    Error::msg(
        ErrorType::Network,
        format!("Failed to {what}: the service answered {status}: {preview}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransactionInput, TransactionType};
    use chrono::NaiveDate;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// What the fake server saw for one request.
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        uri: String,
        content_type: Option<String>,
    }

    /// Starts a server on a random local port that answers every request with `status` and `body`
    /// after waiting `delay`. Returns the base URL and the requests received.
    async fn serve(
        status: u16,
        body: &'static str,
        delay: Duration,
    ) -> (String, Arc<Mutex<Vec<Seen>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let server_seen = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let seen = server_seen.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                        let seen = seen.clone();
                        async move {
                            seen.lock().unwrap().push(Seen {
                                method: req.method().to_string(),
                                uri: req.uri().to_string(),
                                content_type: req
                                    .headers()
                                    .get("content-type")
                                    .and_then(|v| v.to_str().ok())
                                    .map(String::from),
                            });
                            tokio::time::sleep(delay).await;
                            let response = hyper::Response::builder()
                                .status(status)
                                .body(body.to_string())
                                .unwrap();
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });
        (format!("http://{addr}/"), seen)
    }

    fn api(url: &str) -> HttpApi {
        HttpApi::new(url, Duration::from_secs(5)).unwrap()
    }

    fn transaction() -> Transaction {
        let date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        Transaction::from_input(
            "t-1",
            "u1",
            TransactionInput::new("Pharmacy", 32.9, date, "Saúde", TransactionType::Expense),
        )
    }

    #[tokio::test]
    async fn test_list_sends_user_id_and_content_type() {
        let (url, seen) = serve(200, r#"[]"#, Duration::ZERO).await;
        let raw = api(&url).list("user 1").await.unwrap();
        assert_eq!(raw, RawResponse::Records(vec![]));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "GET");
        assert_eq!(seen[0].uri, "/?userId=user+1");
        assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_update_and_delete_query() {
        let (url, seen) = serve(200, r#"{"deleted": 1}"#, Duration::ZERO).await;
        let api = api(&url);
        api.update("t-1", "u1", &transaction()).await.unwrap();
        let raw = api.delete("t-1", "u1").await.unwrap();
        assert_eq!(raw.field("deleted"), Some(&serde_json::json!(1)));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "PUT");
        assert_eq!(seen[0].uri, "/?id=t-1&userId=u1");
        assert_eq!(seen[1].method, "DELETE");
        assert_eq!(seen[1].uri, "/?id=t-1&userId=u1");
    }

    #[tokio::test]
    async fn test_create_posts_to_base() {
        let (url, seen) = serve(201, r#"[{"id": "t-1"}]"#, Duration::ZERO).await;
        api(&url).create(&transaction()).await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].uri, "/");
        assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_html_with_success_status_is_classified() {
        let (url, _) = serve(200, "<!DOCTYPE html><html></html>", Duration::ZERO).await;
        let raw = api(&url).list("u1").await.unwrap();
        assert!(raw.is_html());
    }

    #[tokio::test]
    async fn test_html_error_status_is_upstream_misconfigured() {
        let (url, _) = serve(404, "<html><body>Not Found</body></html>", Duration::ZERO).await;
        let err = api(&url).list("u1").await.unwrap_err();
        assert!(err.is(ErrorType::UpstreamMisconfigured), "{err}");
    }

    #[tokio::test]
    async fn test_error_status_is_network() {
        let (url, _) = serve(500, r#"{"error": "boom"}"#, Duration::ZERO).await;
        let err = api(&url).list("u1").await.unwrap_err();
        assert!(err.is(ErrorType::Network), "{err}");
        assert!(err.to_string().contains("500"), "{err}");
    }

    #[tokio::test]
    async fn test_timeout() {
        let (url, _) = serve(200, "[]", Duration::from_secs(3)).await;
        let api = HttpApi::new(&url, Duration::from_millis(100)).unwrap();
        let err = api.list("u1").await.unwrap_err();
        assert!(err.is(ErrorType::Timeout), "{err}");
        assert!(err.error_type().is_transient());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network() {
        // Bind then drop to get a port that nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = api(&format!("http://{addr}/")).list("u1").await.unwrap_err();
        assert!(err.is(ErrorType::Network), "{err}");
    }

    #[test]
    fn test_bad_url_is_config_error() {
        let err = HttpApi::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(err.is(ErrorType::Config));
    }
}
