//! HTTP console server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::transactions: transaction list, filter editor, detail editor
//! - routes::time: calendar lookups for the filter editor

pub mod error;
pub mod routes;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use txconsole_config::Config;
use txconsole_core::{CoreError, GatewayRef, SessionRef, SessionStore};
use uuid::Uuid;

pub use error::ApiError;

/// Header carrying the console session id on every HTMX request
pub const SESSION_HEADER: &str = "x-console-session";

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayRef,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, gateway: GatewayRef) -> Self {
        Self {
            gateway,
            sessions: Arc::new(SessionStore::new(config.sessions.max_sessions)),
            config: Arc::new(config),
        }
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.config.editor.save_delay_ms)
    }
}

/// The session named by the request's `X-Console-Session` header
pub struct ConsoleSession(pub SessionRef);

#[async_trait]
impl FromRequestParts<AppState> for ConsoleSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(CoreError::SessionNotFound)?;
        Ok(ConsoleSession(state.sessions.get(&id).await?))
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::time::api_days;
    use routes::transactions::{
        htmx_editor_close, htmx_editor_edit, htmx_editor_open, htmx_editor_status, htmx_filter_apply,
        htmx_filter_editor, htmx_transactions_list, htmx_transactions_more, page_index,
    };

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/days", get(api_days))
        // Full page
        .route("/", get(page_index))
        // HTMX partial routes
        .route("/transactions/list", get(htmx_transactions_list))
        .route("/transactions/more", get(htmx_transactions_more))
        .route("/transactions/filter", get(htmx_filter_apply))
        .route("/transactions/filter/editor", get(htmx_filter_editor))
        .route(
            "/transactions/:id/editor",
            get(htmx_editor_open).post(htmx_editor_edit).delete(htmx_editor_close),
        )
        .route("/transactions/:id/editor/status", get(htmx_editor_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, body_attrs: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Transaction Console</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
    <script>
        // Error fragments are rendered into the request target like any other response
        document.addEventListener('htmx:beforeSwap', function(e) {{
            if (e.detail.xhr.status >= 400) {{
                e.detail.shouldSwap = true;
                e.detail.isError = false;
            }}
        }});
        function closeModal() {{
            document.getElementById('modal-root').innerHTML = '';
        }}
    </script>
</head>
<body class="bg-gray-50 text-gray-900" {}>
    {}
</body>
</html>"#,
        title, body_attrs, content
    )
}

/// Check if request is from HTMX (partial page update)
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for a full page, or return it bare for an HTMX request
pub fn page_response(headers: &HeaderMap, title: &str, body_attrs: &str, inner_content: &str) -> String {
    let main = format!(
        r#"<main class='max-w-7xl mx-auto p-6'>{}</main>
<div id='modal-root'></div>"#,
        inner_content
    );
    if is_htmx_request(headers) {
        main
    } else {
        base_html(title, body_attrs, &main)
    }
}

/// Start the HTTP server
///
/// Binds to the configured address and serves until Ctrl-C.
pub async fn start_server(config: Config, gateway: GatewayRef) -> std::io::Result<()> {
    let addr = config.bind_address();
    let router = create_router(AppState::new(config, gateway));

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting transaction console on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Transaction console)");
    log::info!("  - /transactions/* (HTMX fragments)");
    log::info!("  - /api/health, /api/days (JSON endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use txconsole_core::{MemoryGateway, Transaction};

    pub fn transaction(id: u64, when: &str, fraud: &str) -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "accountNumber": "737265056",
            "customerId": "737265056",
            "creditLimit": 5000,
            "availableMoney": 5000,
            "transactionDateTime": when,
            "transactionAmount": 98.77,
            "merchantName": format!("Merchant {}", id),
            "merchantCategoryCode": "rideshare",
            "cardCVV": 414,
            "cardLast4Digits": 1803,
            "transactionType": "PURCHASE",
            "cardPresent": "FALSE",
            "isFraud": fraud,
        }))
        .unwrap()
    }

    pub struct TestApp {
        pub router: Router,
        pub gateway: Arc<MemoryGateway>,
        pub state: AppState,
    }

    impl TestApp {
        pub fn new(transactions: Vec<Transaction>) -> Self {
            let gateway = Arc::new(MemoryGateway::new(transactions));
            let mut config = Config::default();
            config.editor.save_delay_ms = 50;
            let state = AppState::new(config, gateway.clone());
            Self {
                router: create_router(state.clone()),
                gateway,
                state,
            }
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        /// Load the index page and return the new session id
        pub async fn start_session(&self) -> String {
            let (status, body) = self.send(Request::get("/").body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::OK);
            let marker = "\"X-Console-Session\": \"";
            let start = body.find(marker).unwrap() + marker.len();
            body[start..start + 36].to_string()
        }

        pub async fn get(&self, session: &str, uri: &str) -> (StatusCode, String) {
            self.send(
                Request::get(uri)
                    .header(SESSION_HEADER, session)
                    .header("hx-request", "true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }

        pub async fn post_form(&self, session: &str, uri: &str, form: &str) -> (StatusCode, String) {
            self.send(
                Request::post(uri)
                    .header(SESSION_HEADER, session)
                    .header("hx-request", "true")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(form.to_string()))
                    .unwrap(),
            )
            .await
        }

        pub async fn delete(&self, session: &str, uri: &str) -> (StatusCode, String) {
            self.send(
                Request::delete(uri)
                    .header(SESSION_HEADER, session)
                    .header("hx-request", "true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
        }
    }
}
