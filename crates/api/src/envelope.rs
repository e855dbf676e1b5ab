use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::{error::Error, query::Query};

const DEFAULT_FAILURE_MESSAGE: &str = "request failed";

/// Field names of the backend's response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeFields {
	pub success: String,
	pub data: String,
	pub message: String,
	pub pagination: String,
}

impl Default for EnvelopeFields {
	fn default() -> Self {
		Self {
			success: "success".to_string(),
			data: "data".to_string(),
			message: "message".to_string(),
			pagination: "pagination".to_string(),
		}
	}
}

/// Pagination metadata. Derived fields are always recomputed from `page`, `limit` and `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub total_pages: u64,
	pub has_next: bool,
	pub has_prev: bool,
}

impl Pagination {
	#[must_use]
	pub fn new(page: u32, limit: u32, total: u64) -> Self {
		let page = page.max(1);
		let total_pages = if limit == 0 {
			0
		} else {
			total.div_ceil(u64::from(limit))
		};

		Self {
			page,
			limit,
			total,
			total_pages,
			has_next: u64::from(page) < total_pages,
			has_prev: page > 1,
		}
	}
}

/// Pagination metadata as the backend sent it, any field may be missing. Zero for `page` or
/// `limit` counts as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PageInfo {
	#[serde(default)]
	pub page: Option<u32>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub total: Option<u64>,
}

impl PageInfo {
	/// Fills the gaps from the query that produced the page. `seen` is the number of items
	/// returned, used for the limit and total when neither side knows better.
	#[must_use]
	pub fn resolve(self, requested: &Query, seen: u32) -> Pagination {
		let page = self
			.page
			.filter(|page| *page > 0)
			.or_else(|| requested.page.map(|p| p.get()))
			.unwrap_or(1);
		let limit = self
			.limit
			.filter(|limit| *limit > 0)
			.or_else(|| requested.limit.map(|l| l.get()))
			.unwrap_or_else(|| seen.max(1));
		let total = self
			.total
			.unwrap_or_else(|| u64::from(page - 1) * u64::from(limit) + u64::from(seen));

		Pagination::new(page, limit, total)
	}
}

/// An unwrapped, successful response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Envelope {
	pub data: Option<Value>,
	pub message: Option<String>,
	pub pagination: Option<PageInfo>,
}

impl Envelope {
	/// Unwraps a response body.
	///
	/// Bodies that are objects with a boolean success field are treated as envelopes, anything
	/// else is taken as raw data from a backend that doesn't wrap its responses.
	pub fn from_value(
		value: Value,
		fields: &EnvelopeFields,
		status: Option<u16>,
	) -> Result<Self, Error> {
		let Value::Object(mut body) = value else {
			return Ok(Self {
				data: Some(value).filter(|v| !v.is_null()),
				..Default::default()
			});
		};

		let Some(success) = body.get(&fields.success).and_then(Value::as_bool) else {
			return Ok(Self {
				data: Some(Value::Object(body)),
				..Default::default()
			});
		};

		let message = body
			.remove(&fields.message)
			.and_then(|m| m.as_str().map(str::to_string));

		if !success {
			return Err(Error::Application {
				message: message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
				status,
			});
		}

		let pagination = body
			.remove(&fields.pagination)
			.filter(|p| !p.is_null())
			.map(serde_json::from_value::<PageInfo>)
			.transpose()?;

		Ok(Self {
			data: body.remove(&fields.data).filter(|d| !d.is_null()),
			message,
			pagination,
		})
	}

	/// Decodes the payload, absent data decodes as `null` so `()` and `Option<_>` work for void
	/// operations.
	pub fn into_data<D: DeserializeOwned>(self) -> Result<D, Error> {
		serde_json::from_value(self.data.unwrap_or(Value::Null)).map_err(Into::into)
	}
}

/// One page of entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
	pub items: Vec<T>,
	pub page: u32,
	pub limit: u32,
	pub total: u64,
	pub total_pages: u64,
	pub has_next: bool,
	pub has_prev: bool,
}

impl<T> PaginatedResult<T> {
	#[must_use]
	pub fn new(items: Vec<T>, pagination: Pagination) -> Self {
		if items.len() > pagination.limit as usize {
			warn!(
				items = items.len(),
				limit = pagination.limit,
				"Backend returned more items than the page limit"
			);
		}

		Self {
			items,
			page: pagination.page,
			limit: pagination.limit,
			total: pagination.total,
			total_pages: pagination.total_pages,
			has_next: pagination.has_next,
			has_prev: pagination.has_prev,
		}
	}

	#[must_use]
	pub const fn pagination(&self) -> Pagination {
		Pagination {
			page: self.page,
			limit: self.limit,
			total: self.total,
			total_pages: self.total_pages,
			has_next: self.has_next,
			has_prev: self.has_prev,
		}
	}
}

impl<T: DeserializeOwned> PaginatedResult<T> {
	/// Builds a page from an envelope. Whatever pagination metadata is missing is taken from the
	/// requested page and limit, and a missing total only counts what has been seen so far.
	pub fn from_envelope(envelope: Envelope, requested: &Query) -> Result<Self, Error> {
		let info = envelope.pagination.unwrap_or_default();
		let items: Vec<T> = envelope.into_data::<Option<Vec<T>>>()?.unwrap_or_default();
		let seen = u32::try_from(items.len()).unwrap_or(u32::MAX);

		Ok(Self::new(items, info.resolve(requested, seen)))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn pagination_math() {
		for total in 0..=60_u64 {
			for limit in 1..=12_u32 {
				for page in 1..=8_u32 {
					let p = Pagination::new(page, limit, total);
					assert_eq!(p.total_pages, total.div_ceil(u64::from(limit)));
					assert_eq!(p.has_next, u64::from(page) < p.total_pages);
					assert_eq!(p.has_prev, page > 1);
				}
			}
		}
	}

	#[test]
	fn failed_envelope_becomes_application_error() {
		let fields = EnvelopeFields::default();

		let err = Envelope::from_value(
			json!({ "success": false, "message": "Heritage site not found" }),
			&fields,
			Some(404),
		)
		.unwrap_err();

		assert_eq!(err.to_string(), "Heritage site not found");
		assert!(err.is_not_found());

		let err = Envelope::from_value(json!({ "success": false }), &fields, None).unwrap_err();
		assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
	}

	#[test]
	fn void_data_is_allowed() {
		let envelope = Envelope::from_value(
			json!({ "success": true, "message": "deleted" }),
			&EnvelopeFields::default(),
			Some(200),
		)
		.unwrap();

		assert_eq!(envelope.message.as_deref(), Some("deleted"));
		envelope.into_data::<()>().unwrap();
	}

	#[test]
	fn custom_field_names() {
		let fields = EnvelopeFields {
			success: "ok".into(),
			data: "payload".into(),
			message: "error".into(),
			pagination: "meta".into(),
		};

		let envelope = Envelope::from_value(
			json!({ "ok": true, "payload": [1, 2], "meta": { "page": 1, "limit": 2, "total": 5 } }),
			&fields,
			None,
		)
		.unwrap();

		assert_eq!(
			envelope.pagination,
			Some(PageInfo {
				page: Some(1),
				limit: Some(2),
				total: Some(5),
			})
		);
		assert_eq!(envelope.into_data::<Vec<i64>>().unwrap(), vec![1, 2]);
	}

	#[test]
	fn raw_bodies_pass_through() {
		let envelope =
			Envelope::from_value(json!([1, 2, 3]), &EnvelopeFields::default(), None).unwrap();
		assert_eq!(envelope.into_data::<Vec<i64>>().unwrap(), vec![1, 2, 3]);
	}

	#[test]
	fn missing_pagination_falls_back_to_request() {
		let envelope = Envelope::from_value(
			json!({ "success": true, "data": [1, 2, 3] }),
			&EnvelopeFields::default(),
			None,
		)
		.unwrap();

		let page = PaginatedResult::<i64>::from_envelope(envelope, &Query::new().page(2).limit(5))
			.unwrap();

		assert_eq!(page.page, 2);
		assert_eq!(page.limit, 5);
		assert_eq!(page.total, 8);
		assert_eq!(page.total_pages, 2);
		assert!(!page.has_next);
		assert!(page.has_prev);
	}

	#[test]
	fn partial_pagination_is_completed_from_request() {
		let envelope = Envelope::from_value(
			json!({
				"success": true,
				"data": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
				"pagination": { "page": 1, "total": 25, "totalPages": 3, "hasNext": true },
			}),
			&EnvelopeFields::default(),
			None,
		)
		.unwrap();

		let page = PaginatedResult::<i64>::from_envelope(envelope, &Query::new().page(1).limit(10))
			.unwrap();

		assert_eq!(page.limit, 10);
		assert_eq!(page.total, 25);
		assert_eq!(page.total_pages, 3);
		assert!(page.has_next);
	}

	#[test]
	fn zero_page_and_limit_count_as_missing() {
		let info = PageInfo {
			page: Some(0),
			limit: Some(0),
			total: Some(50),
		};

		let pagination = info.resolve(&Query::new().page(3).limit(15), 15);
		assert_eq!(pagination, Pagination::new(3, 15, 50));
		assert!(pagination.has_prev);
		assert!(pagination.has_next);
	}
}
