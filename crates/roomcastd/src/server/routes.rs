//! HTTP handlers: the SSE push stream and the publish endpoint.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Form, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use roomcast_protocol::{welcome_line, AttachParams, PublishParams, ValidationError};

use crate::hub::Hub;

/// Shared state handed to every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) hub: Hub,
    pub(crate) keep_alive: Duration,
    /// Ends open streams on shutdown
    pub(crate) shutdown: CancellationToken,
}

/// Builds the router.
///
/// - `GET /?room_id=&client_id=` opens an SSE stream
/// - `POST /send` publishes `message` to `room_id`
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(stream_room))
        .route("/send", any(publish))
        .with_state(state)
}

fn reject(err: ValidationError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    (status, err.to_string()).into_response()
}

/// Builds one SSE event. CR is not allowed inside event data, so line
/// endings are normalized to LF (each line becomes its own `data:` field).
fn sse_event(text: &str) -> Event {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    Event::default().data(normalized)
}

async fn stream_room(
    State(state): State<AppState>,
    Query(params): Query<AttachParams>,
) -> Response {
    let request = match params.validate() {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Rejected attach request");
            return reject(e);
        }
    };

    let welcome = welcome_line(&request.room_id);

    let subscription = match state.hub.attach(request).await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!(error = %e, "Failed to attach subscriber");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let events = stream::once(async move { welcome })
        .chain(subscription.into_stream())
        .take_until(state.shutdown.cancelled_owned())
        .map(|text| Ok::<_, Infallible>(sse_event(&text)));

    Sse::new(events)
        .keep_alive(KeepAlive::new().interval(state.keep_alive))
        .into_response()
}

async fn publish(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<PublishParams>,
    form: Option<Form<PublishParams>>,
) -> Response {
    let params = match form {
        Some(Form(body)) => body.merge_over(query),
        None => query,
    };

    let request = match params.validate(method.as_str()) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, method = %method, "Rejected publish request");
            return reject(e);
        }
    };

    match state.hub.publish(request).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            error!(error = %e, "Publish failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
