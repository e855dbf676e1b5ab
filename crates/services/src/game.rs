//! Quiz and puzzle progression.
//!
//! Chapters group levels, a level is played through a session the backend opens on
//! [`GameService::start_level`]. What a session screen contains is up to the app, so level
//! details and screens come back as raw JSON.

use hx_api::{ApiClient, EntityId, Error, Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::entities::{Chapter, GameProgress, Level};

pub const GAME_PATH: &str = "/game";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
	#[serde(alias = "is_correct")]
	pub is_correct: bool,
	#[serde(alias = "points_earned", default)]
	pub points_earned: i64,
	#[serde(alias = "total_score", default)]
	pub total_score: i64,
	#[serde(default)]
	pub explanation: Option<String>,
	#[serde(alias = "correct_answer", default)]
	pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineResult {
	pub is_correct: bool,
	#[serde(default)]
	pub points_earned: i64,
	#[serde(default)]
	pub total_score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCompletion {
	pub correct: bool,
	#[serde(default)]
	pub points_earned: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Completion {
	score: i64,
	time_spent: u64,
}

#[derive(Debug, Clone)]
pub struct GameService {
	client: ApiClient,
}

impl GameService {
	#[must_use]
	pub const fn new(client: ApiClient) -> Self {
		Self { client }
	}

	pub async fn progress(&self) -> Result<GameProgress, Error> {
		self.client
			.fetch(Request::new(Method::Get, path(["progress"])))
			.await
	}

	pub async fn chapters(&self) -> Result<Vec<Chapter>, Error> {
		self.client
			.fetch(Request::new(Method::Get, path(["chapters"])))
			.await
	}

	pub async fn levels(
		&self,
		chapter_id: impl Into<EntityId> + Send,
	) -> Result<Vec<Level>, Error> {
		self.client
			.fetch(Request::new(
				Method::Get,
				path(["levels".to_string(), chapter_id.into().to_string()]),
			))
			.await
	}

	pub async fn level_detail(&self, level_id: impl Into<EntityId> + Send) -> Result<Value, Error> {
		self.client
			.fetch(Request::new(Method::Get, level_path(level_id, "detail")))
			.await
	}

	/// Opens a session for the level, answering with its first screen.
	pub async fn start_level(&self, level_id: impl Into<EntityId> + Send) -> Result<Value, Error> {
		self.client
			.fetch(Request::new(Method::Post, level_path(level_id, "start")))
			.await
	}

	pub async fn collect_clue(
		&self,
		level_id: impl Into<EntityId> + Send,
		clue_id: &str,
	) -> Result<Value, Error> {
		self.client
			.fetch(
				Request::new(Method::Post, level_path(level_id, "collect-clue"))
					.with_body(json!({ "clueId": clue_id })),
			)
			.await
	}

	pub async fn submit_answer(
		&self,
		session_id: impl Into<EntityId> + Send,
		answer_id: &str,
	) -> Result<AnswerResult, Error> {
		self.client
			.fetch(
				Request::new(Method::Post, session_path(session_id, "submit-answer"))
					.with_body(json!({ "answerId": answer_id })),
			)
			.await
	}

	/// `event_order` lists the event ids in the order the player placed them.
	pub async fn submit_timeline(
		&self,
		session_id: impl Into<EntityId> + Send,
		event_order: &[String],
	) -> Result<TimelineResult, Error> {
		self.client
			.fetch(
				Request::new(Method::Post, session_path(session_id, "submit-timeline"))
					.with_body(json!({ "eventOrder": event_order })),
			)
			.await
	}

	pub async fn next_screen(
		&self,
		session_id: impl Into<EntityId> + Send,
	) -> Result<Value, Error> {
		self.client
			.fetch(Request::new(Method::Post, session_path(session_id, "next-screen")))
			.await
	}

	pub async fn complete_level(
		&self,
		level_id: impl Into<EntityId> + Send,
		score: i64,
		time_spent: u64,
	) -> Result<LevelCompletion, Error> {
		let body = serde_json::to_value(Completion { score, time_spent })?;

		self.client
			.fetch(Request::new(Method::Post, level_path(level_id, "complete")).with_body(body))
			.await
	}
}

fn path<S: AsRef<str>>(segments: impl IntoIterator<Item = S>) -> String {
	segments
		.into_iter()
		.fold(GAME_PATH.to_string(), |mut path, segment| {
			path.push('/');
			path.push_str(segment.as_ref());
			path
		})
}

fn level_path(level_id: impl Into<EntityId>, action: &str) -> String {
	path(["levels", level_id.into().to_string().as_str(), action])
}

fn session_path(session_id: impl Into<EntityId>, action: &str) -> String {
	path(["sessions", session_id.into().to_string().as_str(), action])
}
