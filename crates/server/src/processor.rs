use std::sync::Arc;

use tracing::{error, info, warn};

use shotbot_slack::commands::ShotCommandService;
use shotbot_slack::events::{EventContext, HandlerResult, MessageEvent, MessageEventHandler};
use shotbot_slack::webhook::MessageSink;

/// Runs one inbound message event to completion: command handling, then reply delivery.
pub struct EventProcessor<S> {
    handler: MessageEventHandler<S>,
    sink: Arc<dyn MessageSink>,
}

impl<S> EventProcessor<S>
where
    S: ShotCommandService + 'static,
{
    pub fn new(handler: MessageEventHandler<S>, sink: Arc<dyn MessageSink>) -> Self {
        Self { handler, sink }
    }

    /// Returns how many replies were delivered. Failures are logged, never retried.
    pub async fn process(&self, event: MessageEvent, ctx: EventContext) -> usize {
        let (channel_name, messages) = match self.handler.handle(&event, &ctx).await {
            Ok(HandlerResult::Responded { channel_name, messages }) => (channel_name, messages),
            Ok(HandlerResult::Ignored) => return 0,
            Err(error) => {
                error!(
                    event_name = "event.processing_failed",
                    correlation_id = %ctx.correlation_id,
                    user_id = %event.user,
                    channel_id = %event.channel,
                    error = %error,
                    "dropping event"
                );
                return 0;
            }
        };

        let mut delivered = 0;
        for message in &messages {
            match self.sink.deliver(&channel_name, message).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    warn!(
                        event_name = "event.reply_failed",
                        correlation_id = %ctx.correlation_id,
                        channel_name = %channel_name,
                        error = %error,
                        "reply delivery failed"
                    );
                    break;
                }
            }
        }

        info!(
            event_name = "event.processed",
            correlation_id = %ctx.correlation_id,
            user_id = %event.user,
            replies = delivered,
            "event processed"
        );
        delivered
    }
}
