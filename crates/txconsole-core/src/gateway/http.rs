//! Implements `TransactionGateway` against the transaction REST API with reqwest

use super::{decode_saved, TransactionGateway};
use crate::error::{CoreError, CoreResult};
use crate::models::{Filter, QueryResult, Transaction};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Longest error body kept in an `HttpStatus` error
const MAX_ERROR_BODY: usize = 512;

/// Talks to `GET {endpoint}/transactions` and `PUT {endpoint}/transactions/{id}`
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpGateway {
    pub fn new(endpoint: Url, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::InternalError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, endpoint })
    }

    /// Endpoint URL extended with `segments`, keeping any base path
    fn url(&self, segments: &[&str]) -> CoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::InternalError {
                message: format!("API endpoint cannot be used as a base URL: {}", self.endpoint),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl TransactionGateway for HttpGateway {
    async fn fetch_transactions(&self, filter: &Filter) -> CoreResult<QueryResult> {
        let url = self.url(&["transactions"])?;
        log::debug!("GET {} filter={:?}", url, filter);

        let response = self.client.get(url).query(filter).send().await?;
        let body = success_body(response).await?;
        let result: QueryResult = serde_json::from_str(&body)?;

        log::debug!(
            "Fetched {} transactions (more: {})",
            result.items.len(),
            result.has_more()
        );
        Ok(result)
    }

    async fn save_transaction(&self, transaction: &Transaction) -> CoreResult<Transaction> {
        let id = transaction.id.to_string();
        let url = self.url(&["transactions", &id])?;
        log::debug!("PUT {}", url);

        let response = self.client.put(url).json(transaction).send().await?;
        let body = success_body(response).await?;
        decode_saved(&body, transaction)
    }
}

/// Body of a 2xx response, or an `HttpStatus` error carrying the start of the body
async fn success_body(response: reqwest::Response) -> CoreResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let mut body = body.trim().to_string();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(CoreError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use txconsole_config::PageSize;

    /// Serve `router` on an ephemeral port and return its base URL
    async fn serve(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{}/prod", addr)).unwrap()
    }

    fn gateway(url: Url) -> HttpGateway {
        HttpGateway::new(url, Duration::from_secs(5)).unwrap()
    }

    fn filter() -> Filter {
        Filter {
            year: 2016,
            month: 2,
            day: None,
            is_fraud: true,
            page_size: PageSize::OneHundred,
            pagination_token: None,
        }
    }

    async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        let mut tx = serde_json::to_value(sample_transaction(1)).unwrap();
        tx["merchantName"] = serde_json::json!(serde_json::to_string(&params).unwrap());
        let token = if params.contains_key("paginationToken") { "" } else { "abc" };
        Json(serde_json::json!({"items": [tx], "count": 1, "paginationToken": token}))
    }

    #[tokio::test]
    async fn test_fetch_sends_filter_as_query() {
        let url = serve(Router::new().route("/prod/transactions", get(echo_query))).await;
        let gateway = gateway(url);

        let result = gateway.fetch_transactions(&filter()).await.unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.pagination_token.as_deref(), Some("abc"));

        let params: HashMap<String, String> = serde_json::from_str(&result.items[0].merchant_name).unwrap();
        assert_eq!(params.get("year").map(String::as_str), Some("2016"));
        assert_eq!(params.get("month").map(String::as_str), Some("2"));
        assert_eq!(params.get("isFraud").map(String::as_str), Some("true"));
        assert_eq!(params.get("pageSize").map(String::as_str), Some("100"));
        assert!(!params.contains_key("day"));
        assert!(!params.contains_key("paginationToken"));

        let result = gateway.fetch_transactions(&filter().with_token("abc")).await.unwrap();
        assert!(!result.has_more());
        let params: HashMap<String, String> = serde_json::from_str(&result.items[0].merchant_name).unwrap();
        assert_eq!(params.get("paginationToken").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let router = Router::new().route(
            "/prod/transactions",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Error querying DynamoDB: throttled") }),
        );
        let gateway = gateway(serve(router).await);

        let err = gateway.fetch_transactions(&filter()).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::HttpStatus {
                status: 500,
                body: "Error querying DynamoDB: throttled".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_rejects_malformed_body() {
        let router = Router::new().route("/prod/transactions", get(|| async { "not json" }));
        let gateway = gateway(serve(router).await);

        let err = gateway.fetch_transactions(&filter()).await.unwrap_err();
        assert!(matches!(err, CoreError::DecodeError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let gateway = gateway(Url::parse(&format!("http://{}", addr)).unwrap());

        let err = gateway.fetch_transactions(&filter()).await.unwrap_err();
        assert!(matches!(err, CoreError::NetworkError { .. }));
    }

    #[tokio::test]
    async fn test_save_puts_full_record() {
        let router = Router::new().route(
            "/prod/transactions/:id",
            axum::routing::put(|Path(id): Path<u64>, Json(mut tx): Json<Transaction>| async move {
                assert_eq!(tx.id, id);
                tx.merchant_name = format!("{} (stored)", tx.merchant_name);
                Json(tx)
            }),
        );
        let gateway = gateway(serve(router).await);

        let saved = gateway.save_transaction(&sample_transaction(77)).await.unwrap();
        assert_eq!(saved.id, 77);
        assert_eq!(saved.merchant_name, "Uber (stored)");
    }

    #[tokio::test]
    async fn test_save_acknowledged_and_rejected() {
        let router = Router::new().route(
            "/prod/transactions/:id",
            axum::routing::put(|Path(id): Path<u64>| async move {
                if id == 1 {
                    (StatusCode::OK, r#"{"message":"Success"}"#)
                } else {
                    (StatusCode::BAD_REQUEST, r#"{"message":"Error: id in path does not match id in body"}"#)
                }
            }),
        );
        let gateway = gateway(serve(router).await);

        let sent = sample_transaction(1);
        assert_eq!(gateway.save_transaction(&sent).await.unwrap(), sent);

        let err = gateway.save_transaction(&sample_transaction(2)).await.unwrap_err();
        assert!(matches!(err, CoreError::HttpStatus { status: 400, .. }));
    }

    #[test]
    fn test_url_keeps_base_path() {
        let gateway = gateway(Url::parse("https://api.example.com/prod/").unwrap());
        let url = gateway.url(&["transactions", "12"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/prod/transactions/12");

        let gateway = HttpGateway::new(Url::parse("https://api.example.com").unwrap(), Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.url(&["transactions"]).unwrap().as_str(), "https://api.example.com/transactions");
    }
}
