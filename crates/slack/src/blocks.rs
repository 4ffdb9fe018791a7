use serde::Serialize;
use serde_json::{json, Value};

use shotbot_core::leaderboard::LeaderboardEntry;
use shotbot_core::scoring::LimitStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<TextObject>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        fields: Vec<TextObject>,
    },
    Divider {
        block_id: String,
    },
    Context {
        block_id: String,
        elements: Vec<TextObject>,
    },
}

/// A reply ready for delivery. Messages without blocks are sent as plain text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    pub fn text(text: impl Into<String>) -> Self {
        Self { fallback_text: text.into(), blocks: Vec::new() }
    }

    /// Body for an incoming-webhook POST.
    pub fn webhook_payload(&self) -> Value {
        if self.blocks.is_empty() {
            json!({ "text": self.fallback_text })
        } else {
            json!({ "text": self.fallback_text, "blocks": self.blocks })
        }
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        let (text, fields) = builder.build();
        self.blocks.push(Block::Section { block_id: block_id.into(), text, fields });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
    fields: Vec<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    pub fn plain_field(&mut self, text: impl Into<String>) -> &mut Self {
        self.fields.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn_field(&mut self, text: impl Into<String>) -> &mut Self {
        self.fields.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> (Option<TextObject>, Vec<TextObject>) {
        (self.text, self.fields)
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

pub fn current_score_message(display_name: &str, current_score: usize) -> MessageTemplate {
    MessageTemplate::text(format!("{display_name} is at {current_score} drinks right now."))
}

/// Nudge sent after a shot once the user is one drink away from, at, or past their limit.
pub fn limit_warning_message(user_id: &str, status: LimitStatus, limit: u32) -> Option<MessageTemplate> {
    let mention = mention(user_id);
    let text = match status {
        LimitStatus::Unset | LimitStatus::Under { .. } => return None,
        LimitStatus::Approaching => format!(
            ":warning: Slow down there {mention}! You're getting real close to your limit of {limit} drinks! :warning:"
        ),
        LimitStatus::Reached => format!(
            ":octagonal_sign: Now's a good time to stop {mention}! You've hit your limit of {limit} drinks! :octagonal_sign:"
        ),
        LimitStatus::Exceeded { .. } => format!(
            ":x::no_entry::no_good: BRO {mention} what are you doing?? You've exceeded your limit of {limit} drinks! :x::no_entry::no_good:"
        ),
    };
    Some(MessageTemplate::text(text))
}

pub fn high_score_message(display_name: &str, high_score: usize) -> MessageTemplate {
    MessageTemplate::text(format!("{display_name}'s high score is {high_score}!"))
}

pub fn limit_query_message(display_name: &str, active_limit: Option<u32>) -> MessageTemplate {
    match active_limit {
        Some(limit) => MessageTemplate::text(format!(
            "{display_name} currently has a limit of {limit} drinks."
        )),
        None => MessageTemplate::text(format!(
            "{display_name}, you currently do not have a limit set. Type `limit <number>` to set your limit, e.g. `limit 7`."
        )),
    }
}

pub fn limit_set_message(display_name: &str, limit: u32) -> MessageTemplate {
    MessageTemplate::text(format!("{display_name} has set a limit of {limit}."))
}

pub fn leaderboard_message(channel_name: &str, entries: &[LeaderboardEntry]) -> MessageTemplate {
    let title = format!("Current standings for #{channel_name}");
    let mut builder = MessageBuilder::new(title.clone())
        .section("shotbot.leaderboard.title.v1", |section| {
            section.mrkdwn(title);
        })
        .section("shotbot.leaderboard.spacer.v1", |section| {
            section.mrkdwn(" ");
        })
        .section("shotbot.leaderboard.header.v1", |section| {
            section.mrkdwn_field("*Name* :eyes:").mrkdwn_field("*Score* :beers:");
        })
        .divider("shotbot.leaderboard.divider.v1");

    for (position, entry) in entries.iter().enumerate() {
        builder = builder.section(format!("shotbot.leaderboard.row.{position}.v1"), |section| {
            section.plain_field(entry.display_name.as_str()).plain_field(entry.high_score.to_string());
        });
    }

    builder.build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("shotbot.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("shotbot.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shotbot_core::leaderboard::LeaderboardEntry;
    use shotbot_core::scoring::LimitStatus;

    use super::{
        current_score_message, error_message, high_score_message, leaderboard_message,
        limit_query_message, limit_warning_message, Block,
    };

    #[test]
    fn text_replies_serialize_as_plain_webhook_text() {
        let message = current_score_message("Sam", 3);

        assert_eq!(message.webhook_payload(), json!({ "text": "Sam is at 3 drinks right now." }));
        assert_eq!(high_score_message("Sam", 9).fallback_text, "Sam's high score is 9!");
    }

    #[test]
    fn limit_warnings_only_fire_near_the_limit() {
        assert!(limit_warning_message("U1", LimitStatus::Unset, 0).is_none());
        assert!(limit_warning_message("U1", LimitStatus::Under { remaining: 2 }, 5).is_none());

        let approaching =
            limit_warning_message("U1", LimitStatus::Approaching, 5).expect("warning");
        assert!(approaching.fallback_text.contains("<@U1>"));
        assert!(approaching.fallback_text.contains("getting real close to your limit of 5"));

        let reached = limit_warning_message("U1", LimitStatus::Reached, 5).expect("stop");
        assert!(reached.fallback_text.contains("hit your limit of 5"));

        let exceeded =
            limit_warning_message("U1", LimitStatus::Exceeded { by: 2 }, 5).expect("exceeded");
        assert!(exceeded.fallback_text.contains("exceeded your limit of 5"));
    }

    #[test]
    fn limit_query_explains_how_to_set_a_limit() {
        assert!(limit_query_message("Sam", None).fallback_text.contains("`limit <number>`"));
        assert_eq!(
            limit_query_message("Sam", Some(4)).fallback_text,
            "Sam currently has a limit of 4 drinks."
        );
    }

    #[test]
    fn leaderboard_renders_header_and_one_row_per_entry() {
        let entries = vec![
            LeaderboardEntry { display_name: "Ana".to_owned(), high_score: 7 },
            LeaderboardEntry { display_name: "Ben".to_owned(), high_score: 2 },
        ];

        let message = leaderboard_message("shots", &entries);

        assert_eq!(message.fallback_text, "Current standings for #shots");
        assert_eq!(message.blocks.len(), 6);
        assert!(matches!(message.blocks[3], Block::Divider { .. }));

        let payload = message.webhook_payload();
        assert_eq!(payload["blocks"][0]["text"]["type"], "mrkdwn");
        assert_eq!(payload["blocks"][0]["text"]["text"], "Current standings for #shots");
        assert_eq!(payload["blocks"][4]["type"], "section");
        assert_eq!(
            payload["blocks"][4]["fields"],
            json!([
                { "type": "plain_text", "text": "Ana" },
                { "type": "plain_text", "text": "7" },
            ])
        );
        assert!(payload["blocks"][4].get("text").is_none());
    }

    #[test]
    fn error_message_carries_correlation_id() {
        let message = error_message("Couldn't complete this request.", "req-9");

        let payload = message.webhook_payload();
        assert_eq!(payload["blocks"][1]["elements"][0]["text"], "Correlation ID: req-9");
    }
}
