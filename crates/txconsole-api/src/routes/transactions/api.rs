//! Transactions HTMX endpoints
//!
//! Endpoints:
//! - page_index: console page, creates a session
//! - htmx_transactions_list: list for the current filter (HTML fragment)
//! - htmx_transactions_more: next page appended to the list (HTML fragment)
//! - htmx_filter_editor: filter modal (HTML fragment)
//! - htmx_filter_apply: replace the filter and reload the list (HTML fragment)
//! - htmx_editor_open / htmx_editor_edit / htmx_editor_status / htmx_editor_close: detail editor

use super::page;
use crate::error::error_panel;
use crate::{page_response, ApiError, AppState, ConsoleSession};
use axum::extract::{Form, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use chrono::Datelike;
use std::collections::HashMap;
use txconsole_core::{
    log_error, CoreError, Filter, FilterForm, PageOutcome, SaveStatus, SessionRef, TransactionField,
};

type HtmlResult = Result<Html<String>, ApiError>;

/// Console page - creates a session and hands its id to HTMX
pub async fn page_index(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let session = state.sessions.create(Filter::from_config(&state.config.filter)).await;
    let id = session.lock().await.id;
    let body_attrs = format!(r#"hx-headers='{{"X-Console-Session": "{}"}}'"#, id);
    Html(page_response(&headers, "Transactions", &body_attrs, &page::render_index()))
}

/// Restart the session's list with `filter` and render the first page
///
/// The session lock is released while the gateway call runs.
async fn refresh_list(state: &AppState, session: &SessionRef, filter: Filter) -> Result<String, ApiError> {
    let request = session.lock().await.list.begin_refresh(filter);
    let result = state.gateway.fetch_transactions(&request.filter).await;

    let mut session = session.lock().await;
    match result {
        Ok(result) => {
            if session.list.complete(&request, result) == PageOutcome::Stale {
                log::debug!("Filter changed while the first page was loading");
            }
            Ok(page::render_list(&session.list))
        }
        Err(error) => {
            session.list.fail(&request);
            Err(error.into())
        }
    }
}

/// HTMX: Transaction list for the session's current filter
pub async fn htmx_transactions_list(
    State(state): State<AppState>,
    ConsoleSession(session): ConsoleSession,
) -> HtmlResult {
    let filter = session.lock().await.list.filter().clone();
    Ok(Html(refresh_list(&state, &session, filter).await?))
}

/// HTMX: Append the next page of the list
pub async fn htmx_transactions_more(
    State(state): State<AppState>,
    ConsoleSession(session): ConsoleSession,
) -> HtmlResult {
    let request = {
        let mut session = session.lock().await;
        match session.list.begin_load_more() {
            Some(request) => request,
            None => return Ok(Html(page::render_footer(&session.list, None))),
        }
    };
    let result = state.gateway.fetch_transactions(&request.filter).await;

    let mut session = session.lock().await;
    let html = match result {
        Ok(result) => match session.list.complete(&request, result) {
            PageOutcome::Appended { from } => format!(
                "{}{}{}",
                page::render_appended_rows(&session.list.rows()[from..]),
                page::render_heading(&session.list, true),
                page::render_footer(&session.list, None)
            ),
            PageOutcome::Stale => page::render_footer(&session.list, None),
        },
        Err(error) => {
            log_error("Load more transactions", &error);
            session.list.fail(&request);
            page::render_footer(&session.list, Some(&error.to_string()))
        }
    };
    Ok(Html(html))
}

/// HTMX: Filter editor modal
pub async fn htmx_filter_editor(
    State(state): State<AppState>,
    ConsoleSession(session): ConsoleSession,
) -> Html<String> {
    let filter = session.lock().await.list.filter().clone();
    Html(page::render_filter_modal(
        &filter,
        state.config.filter.start_year,
        chrono::Local::now().year(),
    ))
}

/// HTMX: Replace the whole filter from the submitted form and reload the list
///
/// The day selector is refreshed out of band so it matches the new month.
pub async fn htmx_filter_apply(
    State(state): State<AppState>,
    ConsoleSession(session): ConsoleSession,
    Query(form): Query<FilterForm>,
) -> HtmlResult {
    let filter = form.into_filter(state.config.filter.start_year, chrono::Local::now().year())?;
    log::debug!("Applying filter {:?}", filter);
    let list = refresh_list(&state, &session, filter.clone()).await?;
    Ok(Html(format!("{}{}", list, page::render_day_select(&filter, true))))
}

/// HTMX: Open the detail editor for a loaded row
pub async fn htmx_editor_open(
    State(state): State<AppState>,
    ConsoleSession(session): ConsoleSession,
    Path(id): Path<u64>,
) -> HtmlResult {
    let editor = session
        .lock()
        .await
        .open_editor(id, state.gateway.clone(), state.save_delay())?;
    let draft = editor.draft().await;
    let status = editor.status().await;
    Ok(Html(page::render_editor_modal(&draft, &status)))
}

/// HTMX: Apply one field edit; answers with the status badge
pub async fn htmx_editor_edit(
    ConsoleSession(session): ConsoleSession,
    Path(id): Path<u64>,
    Form(form): Form<HashMap<String, String>>,
) -> HtmlResult {
    let editor = session.lock().await.editor(id)?;
    let (name, value) = form.into_iter().next().ok_or_else(|| ApiError::BadRequest {
        message: "No field submitted".to_string(),
    })?;
    let field: TransactionField = name.parse()?;

    match editor.edit(field, &value).await {
        Ok(status) if field == TransactionField::IsFraud => {
            let draft = editor.draft().await;
            Ok(Html(format!(
                "{}{}",
                page::render_status_badge(id, &status, None),
                page::render_fraud_banner(&draft, true)
            )))
        }
        Ok(status) => Ok(Html(page::render_status_badge(id, &status, None))),
        Err(error @ CoreError::InvalidField { .. }) => {
            log_error("Edit transaction field", &error);
            let status = editor.status().await;
            Ok(Html(page::render_status_badge(id, &status, Some(&error.to_string()))))
        }
        Err(error) => Err(error.into()),
    }
}

/// HTMX: Current save status badge
pub async fn htmx_editor_status(ConsoleSession(session): ConsoleSession, Path(id): Path<u64>) -> HtmlResult {
    let editor = session.lock().await.editor(id)?;
    let status = editor.status().await;
    Ok(Html(page::render_status_badge(id, &status, None)))
}

/// HTMX: Close the editor, flushing unsaved edits, and refresh its list row
pub async fn htmx_editor_close(ConsoleSession(session): ConsoleSession, Path(id): Path<u64>) -> HtmlResult {
    let editor = session.lock().await.take_editor(id)?;
    let closed = editor.close().await;

    let mut session = session.lock().await;
    let row = if session.list.replace_row(closed.transaction) {
        session
            .list
            .row(id)
            .map(|tx| page::render_row(tx, true))
            .unwrap_or_default()
    } else {
        String::new()
    };
    let notice = match closed.status {
        SaveStatus::Failed(message) => error_panel("Changes not saved", &message, &[]),
        _ => String::new(),
    };
    Ok(Html(format!("{}{}", notice, row)))
}
