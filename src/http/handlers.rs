//! HTTP handlers. Page rendering is deliberately `format!`-built inline
//! HTML rather than a templating engine.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use crate::service::ServiceError;
use crate::source::{RemoteSource, SourceError};
use crate::state::AppState;

const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(20);

pub async fn index() -> Html<String> {
    Html(
        "<!doctype html><html><head><title>zigdocs</title></head><body>\
         <h1>zigdocs</h1>\
         <p>Request <code>/&lt;host&gt;/&lt;org&gt;/&lt;repo&gt;[@version]/&lt;module&gt;/&lt;file&gt;</code> \
         to view generated documentation for a remote repository.</p>\
         </body></html>"
            .to_string(),
    )
}

fn error_page(message: &str) -> Response {
    error!(message, "returning internal error to client");
    (StatusCode::INTERNAL_SERVER_ERROR, Html(format!(
        "<!doctype html><html><body><h1>Internal Server Error</h1><p>{message}</p></body></html>"
    )))
        .into_response()
}

fn queued_page(loc: &RemoteSource) -> Response {
    Html(format!(
        "<!doctype html><html><body><h1>Build queued</h1>\
         <p>Documentation for <code>{}@{}</code> is being generated. \
         This page will refresh automatically.</p>\
         <script>\
         const es = new EventSource('/subscribe/{}');\
         es.addEventListener('ready', () => window.location.reload());\
         </script>\
         </body></html>",
        loc.repository, loc.version, loc.repository
    ))
    .into_response()
}

fn parse_or_error(path: &str) -> Result<RemoteSource, Response> {
    RemoteSource::parse(path).map_err(|e| match e {
        SourceError::UnsupportedHost => {
            error_page("The host of the remote repository is not supported")
        }
        SourceError::InvalidPath => error_page("The repository path provided is invalid"),
    })
}

/// Dispatches to the module-listing page or the raw-resource response,
/// depending on whether the parsed path names a module.
pub async fn catch_all(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let loc = match parse_or_error(&path) {
        Ok(loc) => loc,
        Err(resp) => return resp,
    };

    if loc.module.is_empty() {
        modules_page(state, loc).await
    } else {
        resource(state, loc).await
    }
}

async fn modules_page(state: AppState, loc: RemoteSource) -> Response {
    match state.service.get_modules_list(&loc) {
        Ok(modules) => {
            let items: String = modules
                .iter()
                .map(|m| format!("<li><a href=\"/{}/{}/index.html\">{m}</a></li>", loc.repository, m))
                .collect();
            Html(format!(
                "<!doctype html><html><body><h1>{}@{}</h1><ul>{items}</ul></body></html>",
                loc.repository, loc.version
            ))
            .into_response()
        }
        Err(ServiceError::Queued) => queued_page(&loc),
        Err(ServiceError::ModuleNotFound) => error_page("module not found"),
        Err(ServiceError::UnrecognizedFileExtension) => error_page("unrecognized file extension"),
        Err(ServiceError::Repository(e)) => error_page(&e.to_string()),
    }
}

async fn resource(state: AppState, loc: RemoteSource) -> Response {
    match state.service.get_docs_resource(&loc).await {
        Ok((bytes, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Err(ServiceError::Queued) => queued_page(&loc),
        Err(ServiceError::ModuleNotFound) => error_page("module not found"),
        Err(ServiceError::UnrecognizedFileExtension) => error_page("unrecognized file extension"),
        Err(ServiceError::Repository(e)) => error_page(&e.to_string()),
    }
}

/// Waits on a single completion notification rather than polling the store
/// on an interval.
pub async fn subscribe(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let loc = match parse_or_error(&path) {
        Ok(loc) => loc,
        Err(resp) => return resp,
    };

    let ready = state
        .service
        .pool()
        .wait_ready(&loc.repository, &loc.version, SUBSCRIBE_TIMEOUT)
        .await;

    let body = if ready {
        "event: ready\ndata:{}\n\n".to_string()
    } else {
        String::new()
    };

    (
        [(header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}
