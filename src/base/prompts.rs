//! Fixed directives and user-facing replies.

/// System directive sent ahead of every completion request.
pub const COMPLETION_SYSTEM_DIRECTIVE: &str = r#####"
あなたは Slack ワークスペースで質問に答える親切なアシスタントです。

- 必ず日本語で回答してください。
- 回答は 1024 トークン以内に収まるよう、簡潔にまとめてください。
- Slack の mrkdwn 記法（*太字*、_斜体_、`コード`、箇条書き）は使えますが、数式記法は使わないでください。
"#####;

/// Posted in place of a reply when generating one failed.
pub const APOLOGY_REPLY: &str = "ごめんなさい、エラーが発生しました。";

/// Appended to a completion that was cut off at the token limit.
pub const TRUNCATION_NOTICE: &str = "\n\n_（回答が長くなったため、途中で省略されています）_";

/// Body returned for `GET /`.
pub const LIVENESS_MESSAGE: &str = "relay-bot is running.";
