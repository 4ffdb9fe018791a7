use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tracing::{debug, warn};
use uuid::Uuid;

use shotbot_slack::events::{parse_payload, EventContext, InboundRequest};

use crate::processor::EventProcessor;
use crate::service::ShotService;

#[derive(Clone)]
pub struct WebhookState {
    processor: Arc<EventProcessor<ShotService>>,
}

pub fn router(processor: Arc<EventProcessor<ShotService>>) -> Router {
    Router::new().route("/msged", post(receive_event)).with_state(WebhookState { processor })
}

/// Slack expects an answer within three seconds, so events are acknowledged first and
/// processed on a background task.
pub async fn receive_event(State(state): State<WebhookState>, body: Bytes) -> Response {
    let request = match parse_payload(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(
                event_name = "webhook.payload_rejected",
                correlation_id = "unassigned",
                error = %error,
                "could not decode Events API payload"
            );
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match request {
        InboundRequest::UrlVerification { challenge } => {
            debug!(event_name = "webhook.url_verification", "answering challenge");
            ([(header::CONTENT_TYPE, "text/plain")], challenge).into_response()
        }
        InboundRequest::Message(event) => {
            let ctx = EventContext::new(Uuid::new_v4().to_string());
            debug!(
                event_name = "webhook.event_accepted",
                correlation_id = %ctx.correlation_id,
                user_id = %event.user,
                channel_id = %event.channel,
                "event accepted for processing"
            );
            let processor = Arc::clone(&state.processor);
            tokio::spawn(async move {
                processor.process(event, ctx).await;
            });
            StatusCode::OK.into_response()
        }
        InboundRequest::Ignored => StatusCode::OK.into_response(),
    }
}
