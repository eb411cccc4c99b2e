use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use tokio_stream::wrappers::ReceiverStream;

use chproxy_common::{GlobalConfig, ProxyError};
use chproxy_protocol::openai::chat_completions::request::ChatCompletionRequestBody;
use chproxy_protocol::openai::list_models::response::{
    ListModelsResponse, ListObjectType, Model, ModelObjectType,
};
use chproxy_transform::aggregate::aggregate_response;
use chproxy_transform::model_table::public_models;
use chproxy_transform::request::translate_request;
use chproxy_transform::stream::StreamTranscoder;
use chproxy_upstream::{ChutesClient, UpstreamBody};

use crate::auth::proxy_auth;
use crate::cors::cors;

const MODEL_OWNER: &str = "chutes";

#[derive(Clone)]
pub struct ProxyState {
    pub client: ChutesClient,
    pub config: Arc<GlobalConfig>,
}

pub fn proxy_router(state: ProxyState) -> Router {
    let authed = Router::new()
        .route("/v1/models", get(list_models))
        .route("/v1/chat/completions", post(chat_completions))
        .layer(middleware::from_fn_with_state(state.clone(), proxy_auth));

    Router::new()
        .route("/", get(health))
        .merge(authed)
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "Chutes API Service Running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_models() -> Json<ListModelsResponse> {
    let created = time::OffsetDateTime::now_utc().unix_timestamp();
    let data = public_models()
        .map(|id| Model {
            id: id.to_string(),
            object: ModelObjectType::Model,
            created,
            owned_by: MODEL_OWNER.to_string(),
        })
        .collect();
    Json(ListModelsResponse {
        object: ListObjectType::List,
        data,
    })
}

async fn chat_completions(
    State(state): State<ProxyState>,
    Json(body): Json<ChatCompletionRequestBody>,
) -> Response {
    let upstream_req = match translate_request(&body) {
        Ok(req) => req,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };
    let want_stream = body.stream.unwrap_or(false);

    let resp = match state.client.send(&upstream_req, want_stream).await {
        Ok(resp) => resp,
        Err(err) => return error_response(err),
    };

    if !resp.is_success() {
        // The one path where the upstream shape leaks through: status and
        // body text are echoed unchanged.
        let text = match resp.body {
            UpstreamBody::Buffered(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            UpstreamBody::Stream(_) => String::new(),
        };
        let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return (status, text).into_response();
    }

    if want_stream {
        match resp.body {
            UpstreamBody::Stream(rx) => stream_response(rx, upstream_req.model),
            UpstreamBody::Buffered(_) => error_response(ProxyError::MissingReader),
        }
    } else {
        let UpstreamBody::Buffered(bytes) = resp.body else {
            return error_response(ProxyError::MissingReader);
        };
        let text = String::from_utf8_lossy(&bytes);
        match aggregate_response(&text, &upstream_req.model) {
            Ok(response) => Json(response).into_response(),
            Err(err) => error_response(err),
        }
    }
}

/// Bridges the upstream byte stream through the transcoder into the client
/// SSE response. The pump stops as soon as the client-side receiver is
/// dropped, which in turn releases the upstream connection.
fn stream_response(
    mut upstream_rx: tokio::sync::mpsc::Receiver<Result<Bytes, io::Error>>,
    model: String,
) -> Response {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Bytes, io::Error>>(32);

    tokio::spawn(async move {
        let mut transcoder = StreamTranscoder::new(model);
        loop {
            let Some(item) = upstream_rx.recv().await else {
                break;
            };
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(err) => {
                    // A read failure must surface as a body error, not a
                    // clean end of stream.
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            };
            for frame in transcoder.push(&chunk) {
                if tx.send(Ok(frame)).await.is_err() {
                    return;
                }
            }
        }
        for frame in transcoder.finish() {
            if tx.send(Ok(frame)).await.is_err() {
                return;
            }
        }
    });

    let body = Body::from_stream(ReceiverStream::new(rx));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        // Hint common reverse proxies to avoid buffering SSE responses.
        .header(header::CACHE_CONTROL, "no-cache")
        .header(HeaderName::from_static("x-accel-buffering"), "no")
        .body(body)
        .unwrap_or_else(|_| {
            (StatusCode::INTERNAL_SERVER_ERROR, "response_build_failed").into_response()
        })
}

fn error_response(err: ProxyError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
