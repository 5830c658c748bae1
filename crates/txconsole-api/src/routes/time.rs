//! Calendar lookups used by the filter editor

use axum::extract::Query;
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;
use txconsole_core::time::days_in_month;

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    pub month: u32,
    pub year: i32,
}

/// Day numbers of a month (JSON API); empty for an invalid month
pub async fn api_days(Query(query): Query<DaysQuery>) -> Json<Vec<u32>> {
    Json(
        days_in_month(query.month, query.year)
            .iter()
            .map(|d| d.day())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    async fn days(uri: &str) -> (StatusCode, String) {
        let app = TestApp::new(Vec::new());
        app.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_days_for_leap_february() {
        let (status, body) = days("/api/days?month=2&year=2016").await;
        assert_eq!(status, StatusCode::OK);
        let days: Vec<u32> = serde_json::from_str(&body).unwrap();
        assert_eq!(days, (1..=29).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_days_for_invalid_month() {
        let (status, body) = days("/api/days?month=13&year=2016").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_days_requires_numbers() {
        let (status, _) = days("/api/days?month=feb&year=2016").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
