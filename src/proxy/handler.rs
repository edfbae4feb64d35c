//! HTTP handlers for module-proxy queries
//!
//! Status codes:
//! - 200: query answered
//! - 404: path is not a module-proxy query
//! - 405: method other than GET/HEAD
//! - 410: module or version not found
//! - 500: any other failure (details are only logged)

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::module::cancel::Cancellation;
use crate::module::error::ModuleError;
use crate::proxy::queries::ProxyQueries;
use crate::proxy::request::{ProxyRequest, RequestParser};
use crate::proxy::stream::{CHUNK_QUEUE_SIZE, ChannelWriter};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const APPLICATION_ZIP: &str = "application/zip";

/// Shared state of the proxy handlers
#[derive(Clone)]
pub struct AppState {
    queries: Arc<dyn ProxyQueries>,
    parser: Arc<RequestParser>,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(queries: Arc<dyn ProxyQueries>, request_timeout: Duration) -> Self {
        Self {
            queries,
            parser: Arc::new(RequestParser::new()),
            request_timeout,
        }
    }
}

/// Dispatches a request to the matching query
pub async fn handle_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed\n").into_response();
    }

    let request = match state.parser.parse(uri.path()) {
        Ok(Some(request)) => request,
        Ok(None) => return (StatusCode::NOT_FOUND, "404 page not found\n").into_response(),
        Err(e) => return error_response(uri.path(), &e),
    };
    debug!("{} {} -> {:?}", method, uri.path(), request);

    let result = match request {
        ProxyRequest::List { module } => {
            run_query(&state, move |queries, cancel| {
                queries.list_versions(&module, cancel)
            })
            .await
            .map(|versions| text_response(version_list(&versions)))
        }
        ProxyRequest::Info { module, version } => {
            run_query(&state, move |queries, cancel| {
                queries.info(&module, &version, cancel)
            })
            .await
            .and_then(|info| {
                let json = serde_json::to_string(&info)
                    .map_err(|e| ModuleError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
                Ok(with_content_type(format!("{}\n", json), APPLICATION_JSON))
            })
        }
        ProxyRequest::Mod { module, version } => {
            run_query(&state, move |queries, cancel| {
                queries.manifest(&module, &version, cancel)
            })
            .await
            .map(|manifest| text_response(format!("{}\n", manifest)))
        }
        ProxyRequest::Zip { module, version } => zip_response(&state, module, version).await,
    };

    result.unwrap_or_else(|e| error_response(uri.path(), &e))
}

/// Runs a query on the blocking thread pool under the request deadline.
///
/// Dropping the returned future cancels the query.
async fn run_query<T, F>(state: &AppState, query: F) -> Result<T, ModuleError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ProxyQueries, &Cancellation) -> Result<T, ModuleError> + Send + 'static,
{
    let cancel = Cancellation::with_timeout(state.request_timeout);
    let _guard = cancel.drop_guard();
    let queries = state.queries.clone();

    tokio::task::spawn_blocking(move || query(queries.as_ref(), &cancel))
        .await
        .map_err(|e| ModuleError::Io(io::Error::other(e)))?
}

/// Streams the zip archive of a module version.
///
/// The status code is chosen once the first chunk or error is available, so
/// lookup failures still produce a proper error response. Later failures
/// abort the body instead of completing it.
///
/// The request deadline only bounds the wait for the first chunk. Once the
/// body is streaming, the archive runs until it completes or the client
/// goes away.
async fn zip_response(
    state: &AppState,
    module: String,
    version: String,
) -> Result<Response, ModuleError> {
    let (tx, mut rx) = mpsc::channel(CHUNK_QUEUE_SIZE);
    let cancel = Cancellation::new();
    let guard = cancel.drop_guard();
    let queries = state.queries.clone();

    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter::new(tx);
        let result = queries
            .archive(&module, &version, &mut writer, &cancel)
            .and_then(|()| writer.flush().map_err(ModuleError::from));
        if let Err(e) = result {
            writer.send_error(e);
        }
    });

    let first = match tokio::time::timeout(state.request_timeout, rx.recv()).await {
        Ok(Some(chunk)) => chunk?,
        Ok(None) => return Err(io::Error::other("archive task ended without output").into()),
        Err(_) => return Err(ModuleError::DeadlineExceeded),
    };

    let rest = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        rx.recv().await.map(|chunk| (chunk, (rx, guard)))
    });
    let stream = futures::stream::once(async move { Ok(first) })
        .chain(rest)
        .inspect(|chunk| match chunk {
            Err(e) if e.is_cancellation() => debug!("Archive stream cancelled: {}", e),
            Err(e) => error!("Aborting archive stream: {}", e),
            Ok(_) => {}
        });

    Ok(with_content_type(Body::from_stream(stream), APPLICATION_ZIP))
}

/// Formats versions one per line
fn version_list(versions: &[String]) -> String {
    versions.iter().map(|v| format!("{}\n", v)).collect()
}

fn text_response(body: String) -> Response {
    with_content_type(body, TEXT_PLAIN)
}

fn with_content_type(body: impl Into<Body>, content_type: &'static str) -> Response {
    let mut response = Response::new(body.into());
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Maps an error to its client-visible status code
pub fn status_code(err: &ModuleError) -> StatusCode {
    if err.is_not_found() {
        StatusCode::GONE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(path: &str, err: &ModuleError) -> Response {
    let status = status_code(err);
    if status == StatusCode::GONE {
        warn!("{}: {}", path, err);
        return (status, format!("{}\n", err)).into_response();
    }

    if err.is_cancellation() {
        warn!("{}: {}", path, err);
    } else {
        error!("{}: {}", path, err);
    }
    (status, "internal server error\n").into_response()
}
