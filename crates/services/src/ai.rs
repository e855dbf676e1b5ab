use hx_api::{ApiClient, Error, Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AI_CHAT_PATH: &str = "/ai/chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
	User,
	Assistant,
}

/// One line of a chat transcript, kept by the app between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
	pub id: String,
	pub role: ChatRole,
	pub content: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
	/// Echo of the question as the backend understood it.
	#[serde(default)]
	pub message: String,
	pub reply: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
	message: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	context: Option<&'a Value>,
}

/// The heritage guide chat assistant.
#[derive(Debug, Clone)]
pub struct AiService {
	client: ApiClient,
}

impl AiService {
	#[must_use]
	pub const fn new(client: ApiClient) -> Self {
		Self { client }
	}

	/// Asks the assistant, `context` being whatever the current screen wants it to know about,
	/// e.g. the site being viewed.
	pub async fn send_message(
		&self,
		message: &str,
		context: Option<&Value>,
	) -> Result<ChatReply, Error> {
		let body = serde_json::to_value(ChatRequest { message, context })?;

		self.client
			.fetch(Request::new(Method::Post, AI_CHAT_PATH).with_body(body))
			.await
	}
}
