use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use shotbot_core::domain::history::UserId;
use shotbot_core::errors::{DomainError, InterfaceError};

use crate::blocks::{self, MessageTemplate};
use crate::commands::{
    parse_shot_command, CommandEnvelope, CommandRouteError, CommandRouter, ShotCommandService,
};
use crate::web::{ChannelResolver, SlackApiError};

/// Body of an Events API request. Only the fields shotbot reads are decoded.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct EventsApiPayload {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub event: MessageEvent,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct MessageEvent {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub event_ts: String,
    #[serde(default)]
    pub channel_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundRequest {
    UrlVerification { challenge: String },
    Message(MessageEvent),
    Ignored,
}

impl EventsApiPayload {
    /// A non-empty challenge always wins; otherwise only events with an author are handled.
    pub fn classify(self) -> InboundRequest {
        if !self.challenge.is_empty() {
            return InboundRequest::UrlVerification { challenge: self.challenge };
        }
        if self.event.user.is_empty() {
            return InboundRequest::Ignored;
        }
        InboundRequest::Message(self.event)
    }
}

pub fn parse_payload(body: &[u8]) -> Result<InboundRequest, serde_json::Error> {
    serde_json::from_slice::<EventsApiPayload>(body).map(EventsApiPayload::classify)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl EventContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self { correlation_id: correlation_id.into() }
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded { channel_name: String, messages: Vec<MessageTemplate> },
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error("channel lookup failed: {0}")]
    Channel(#[from] SlackApiError),
}

pub struct MessageEventHandler<S> {
    router: CommandRouter<S>,
    channels: Arc<dyn ChannelResolver>,
}

impl<S> MessageEventHandler<S>
where
    S: ShotCommandService,
{
    pub fn new(service: S, channels: Arc<dyn ChannelResolver>) -> Self {
        Self { router: CommandRouter::new(service), channels }
    }

    pub fn router(&self) -> &CommandRouter<S> {
        &self.router
    }

    /// Text that isn't a command is ignored before any Slack API call is made. Command
    /// failures become an error reply; only a failed channel lookup aborts the event.
    pub async fn handle(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let command = match parse_shot_command(&event.text) {
            Ok(None) => return Ok(HandlerResult::Ignored),
            Ok(Some(command)) => Ok(command),
            Err(error) => Err(error),
        };

        let channel_name = self.channels.channel_name(&event.channel).await?;

        let messages = match command {
            Ok(command) => {
                info!(
                    event_name = "slack.command.received",
                    correlation_id = %ctx.correlation_id,
                    user_id = %event.user,
                    channel_id = %event.channel,
                    command = ?command,
                    "routing chat command"
                );
                let envelope = CommandEnvelope {
                    user_id: UserId::new(event.user.clone()),
                    channel_id: event.channel.clone(),
                    channel_name: channel_name.clone(),
                    message_ts: event.ts.clone(),
                    request_id: ctx.correlation_id.clone(),
                };
                match self.router.route(command, &envelope).await {
                    Ok(messages) => messages,
                    Err(error) => vec![route_error_reply(error, ctx)],
                }
            }
            Err(error) => {
                warn!(
                    event_name = "slack.command.malformed",
                    correlation_id = %ctx.correlation_id,
                    user_id = %event.user,
                    error = %error,
                    "rejecting malformed command"
                );
                vec![blocks::error_message(
                    &format!("{error}. Type `limit <number>` to set your limit, e.g. `limit 7`."),
                    &ctx.correlation_id,
                )]
            }
        };

        Ok(HandlerResult::Responded { channel_name, messages })
    }
}

fn route_error_reply(error: CommandRouteError, ctx: &EventContext) -> MessageTemplate {
    let interface = match error {
        CommandRouteError::Application(error) => error.into_interface(ctx.correlation_id.clone()),
        CommandRouteError::InvalidTimestamp(ts) => InterfaceError::BadRequest {
            message: DomainError::InvalidTimestamp(ts).to_string(),
            correlation_id: ctx.correlation_id.clone(),
        },
    };
    warn!(
        event_name = "slack.command.failed",
        correlation_id = %interface.correlation_id(),
        error = %interface,
        "command failed"
    );
    blocks::error_message(interface.user_message(), interface.correlation_id())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use shotbot_core::errors::ApplicationError;

    use super::{
        parse_payload, EventContext, EventHandlerError, HandlerResult, InboundRequest,
        MessageEvent, MessageEventHandler,
    };
    use crate::blocks::MessageTemplate;
    use crate::commands::{CommandEnvelope, CommandRouteError, ShotCommandService};
    use crate::web::{ChannelResolver, SlackApiError};

    #[derive(Default)]
    struct CountingChannels {
        lookups: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ChannelResolver for CountingChannels {
        async fn channel_name(&self, _channel_id: &str) -> Result<String, SlackApiError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SlackApiError::Api {
                    method: "conversations.info",
                    error: "channel_not_found".to_owned(),
                });
            }
            Ok("shots".to_owned())
        }
    }

    struct EchoService;

    #[async_trait]
    impl ShotCommandService for EchoService {
        async fn record_shot(
            &self,
            _ts: f64,
            envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Ok(vec![MessageTemplate::text(format!("shot by {}", envelope.user_id))])
        }

        async fn high_score(
            &self,
            _envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Err(ApplicationError::Integration("users.info: user_not_found".to_owned()).into())
        }

        async fn limit_status(
            &self,
            _envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Ok(Vec::new())
        }

        async fn set_limit(
            &self,
            _limit: u32,
            _envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Ok(Vec::new())
        }

        async fn leaderboard(
            &self,
            _envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Ok(Vec::new())
        }

        async fn reset(
            &self,
            _envelope: &CommandEnvelope,
        ) -> Result<Vec<MessageTemplate>, CommandRouteError> {
            Ok(Vec::new())
        }
    }

    fn message(text: &str) -> MessageEvent {
        MessageEvent {
            kind: "message".to_owned(),
            channel: "C1".to_owned(),
            user: "U1".to_owned(),
            text: text.to_owned(),
            ts: "1730000000.000100".to_owned(),
            ..MessageEvent::default()
        }
    }

    #[test]
    fn challenge_payload_is_url_verification() {
        let request =
            parse_payload(br#"{"token":"t","challenge":"abc123","type":"url_verification"}"#)
                .expect("payload");
        assert_eq!(request, InboundRequest::UrlVerification { challenge: "abc123".to_owned() });
    }

    #[test]
    fn message_payload_with_user_is_handled() {
        let request = parse_payload(
            br#"{"type":"event_callback","event":{"type":"message","channel":"C1","user":"U1","text":"shot","ts":"1730000000.000100","event_ts":"1730000000.000100","channel_type":"channel"}}"#,
        )
        .expect("payload");

        let InboundRequest::Message(event) = request else {
            panic!("expected message event");
        };
        assert_eq!(event.user, "U1");
        assert_eq!(event.ts, "1730000000.000100");
    }

    #[test]
    fn authorless_events_are_ignored() {
        let request = parse_payload(
            br#"{"type":"event_callback","event":{"type":"message","subtype":"bot_message","text":"Sam is at 1 drinks right now."}}"#,
        )
        .expect("payload");
        assert_eq!(request, InboundRequest::Ignored);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(parse_payload(b"not json").is_err());
    }

    #[tokio::test]
    async fn chatter_is_ignored_without_channel_lookup() {
        let channels = Arc::new(CountingChannels::default());
        let handler = MessageEventHandler::new(EchoService, channels.clone());

        let result =
            handler.handle(&message("good morning"), &EventContext::default()).await.expect("ok");

        assert_eq!(result, HandlerResult::Ignored);
        assert_eq!(channels.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn command_replies_are_addressed_to_resolved_channel() {
        let channels = Arc::new(CountingChannels::default());
        let handler = MessageEventHandler::new(EchoService, channels.clone());

        let result = handler.handle(&message("Shot"), &EventContext::new("req-1")).await.expect("ok");

        assert_eq!(
            result,
            HandlerResult::Responded {
                channel_name: "shots".to_owned(),
                messages: vec![MessageTemplate::text("shot by U1")],
            }
        );
        assert_eq!(channels.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_limit_gets_guidance_reply() {
        let handler = MessageEventHandler::new(EchoService, Arc::new(CountingChannels::default()));

        let result =
            handler.handle(&message("limit lots"), &EventContext::new("req-2")).await.expect("ok");

        let HandlerResult::Responded { messages, .. } = result else {
            panic!("expected a reply");
        };
        assert_eq!(messages.len(), 1);
        assert!(messages[0].fallback_text.contains("`lots` is not a valid drink limit"));
    }

    #[tokio::test]
    async fn service_failure_becomes_user_safe_error_reply() {
        let handler = MessageEventHandler::new(EchoService, Arc::new(CountingChannels::default()));

        let result = handler.handle(&message("score"), &EventContext::new("req-3")).await.expect("ok");

        let HandlerResult::Responded { messages, .. } = result else {
            panic!("expected a reply");
        };
        assert_eq!(
            messages[0].fallback_text,
            "Couldn't complete this request. Please retry shortly."
        );
        assert!(!messages[0].fallback_text.contains("user_not_found"));
    }

    #[tokio::test]
    async fn channel_lookup_failure_aborts_the_event() {
        let channels = Arc::new(CountingChannels { fail: true, ..CountingChannels::default() });
        let handler = MessageEventHandler::new(EchoService, channels);

        let result = handler.handle(&message("shot"), &EventContext::default()).await;

        assert!(matches!(result, Err(EventHandlerError::Channel(_))));
    }
}
