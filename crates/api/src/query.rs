use std::{collections::BTreeMap, fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::QueryError;

/// Flat, string keyed parameters as they go over the wire.
pub type QueryParams = BTreeMap<String, String>;

/// Keys that are only ever set through their dedicated [`Query`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservedKey {
	Page,
	Limit,
	Sort,
	Order,
	/// Free text search, sent as `q`.
	#[serde(rename = "q")]
	Search,
}

impl ReservedKey {
	pub const ALL: [Self; 5] = [
		Self::Page,
		Self::Limit,
		Self::Sort,
		Self::Order,
		Self::Search,
	];

	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Page => "page",
			Self::Limit => "limit",
			Self::Sort => "sort",
			Self::Order => "order",
			Self::Search => "q",
		}
	}

	#[must_use]
	pub fn parse(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|reserved| reserved.as_str() == key)
	}
}

impl fmt::Display for ReservedKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}

impl SortOrder {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Asc => "asc",
			Self::Desc => "desc",
		}
	}
}

impl FromStr for SortOrder {
	type Err = QueryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"asc" => Ok(Self::Asc),
			"desc" => Ok(Self::Desc),
			other => Err(QueryError::InvalidValue {
				key: ReservedKey::Order.as_str(),
				value: other.to_string(),
			}),
		}
	}
}

impl fmt::Display for SortOrder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single filter value. There is no null variant: absent filters are simply not inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}

impl fmt::Display for ScalarValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(n) => write!(f, "{n}"),
			Self::Str(s) => f.write_str(s),
		}
	}
}

impl From<bool> for ScalarValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for ScalarValue {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for ScalarValue {
	fn from(i: i32) -> Self {
		Self::Int(i.into())
	}
}

impl From<u32> for ScalarValue {
	fn from(i: u32) -> Self {
		Self::Int(i.into())
	}
}

impl From<f64> for ScalarValue {
	fn from(n: f64) -> Self {
		Self::Float(n)
	}
}

impl From<&str> for ScalarValue {
	fn from(s: &str) -> Self {
		Self::Str(s.to_string())
	}
}

impl From<String> for ScalarValue {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}

/// A filter key that is guaranteed not to collide with any [`ReservedKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FilterKey(String);

impl FilterKey {
	pub fn new(key: impl Into<String>) -> Result<Self, QueryError> {
		let key = key.into();

		if key.is_empty() {
			return Err(QueryError::EmptyKey);
		}

		if let Some(reserved) = ReservedKey::parse(&key) {
			return Err(QueryError::ReservedKey(reserved));
		}

		Ok(Self(key))
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for FilterKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for FilterKey {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let key = String::deserialize(deserializer)?;
		Self::new(key).map_err(serde::de::Error::custom)
	}
}

/// Free form filters, kept apart from pagination and sorting.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<FilterKey, ScalarValue>);

impl Filters {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn try_from_iter<K, V>(iter: impl IntoIterator<Item = (K, V)>) -> Result<Self, QueryError>
	where
		K: Into<String>,
		V: Into<ScalarValue>,
	{
		iter.into_iter()
			.map(|(key, value)| FilterKey::new(key).map(|key| (key, value.into())))
			.collect::<Result<_, _>>()
			.map(Self)
	}

	pub fn insert(
		&mut self,
		key: impl Into<String>,
		value: impl Into<ScalarValue>,
	) -> Result<Option<ScalarValue>, QueryError> {
		Ok(self.0.insert(FilterKey::new(key)?, value.into()))
	}

	/// Inserts only when a value is present, mirroring how undefined values are dropped.
	pub fn insert_opt<V: Into<ScalarValue>>(
		&mut self,
		key: impl Into<String>,
		value: Option<V>,
	) -> Result<(), QueryError> {
		if let Some(value) = value {
			self.insert(key, value)?;
		}

		Ok(())
	}

	pub fn with(
		mut self,
		key: impl Into<String>,
		value: impl Into<ScalarValue>,
	) -> Result<Self, QueryError> {
		self.insert(key, value)?;
		Ok(self)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&ScalarValue> {
		self.0.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v)
	}

	pub fn remove(&mut self, key: &str) -> Option<ScalarValue> {
		let key = self.0.keys().find(|k| k.as_str() == key).cloned()?;
		self.0.remove(&key)
	}

	/// Merges `other` into `self`, values from `other` win.
	pub fn extend(&mut self, other: &Self) {
		self.0
			.extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
	}

	pub fn clear(&mut self) {
		self.0.clear();
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&FilterKey, &ScalarValue)> {
		self.0.iter()
	}
}

/// Semantic query parameters, before they are flattened into [`QueryParams`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
	pub page: Option<NonZeroU32>,
	pub limit: Option<NonZeroU32>,
	pub sort: Option<String>,
	pub order: Option<SortOrder>,
	pub filters: Filters,
	pub search: Option<String>,
}

impl Query {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Pages start at 1, a `0` is clamped.
	#[must_use]
	pub fn page(mut self, page: u32) -> Self {
		self.page = Some(NonZeroU32::new(page).unwrap_or(NonZeroU32::MIN));
		self
	}

	/// Limits must be positive, a `0` is clamped.
	#[must_use]
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = Some(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN));
		self
	}

	#[must_use]
	pub fn sorted(mut self, field: impl Into<String>, order: SortOrder) -> Self {
		self.sort = Some(field.into());
		self.order = Some(order);
		self
	}

	#[must_use]
	pub fn with_filters(mut self, filters: &Filters) -> Self {
		self.filters.extend(filters);
		self
	}

	pub fn filter(
		mut self,
		key: impl Into<String>,
		value: impl Into<ScalarValue>,
	) -> Result<Self, QueryError> {
		self.filters.insert(key, value)?;
		Ok(self)
	}

	#[must_use]
	pub fn with_search(mut self, text: impl Into<String>) -> Self {
		self.search = Some(text.into());
		self
	}

	/// Overlays `other` on top of `self`: every field set in `other` wins, filters are merged
	/// key by key with `other` winning on collisions.
	#[must_use]
	pub fn merged_with(&self, other: &Self) -> Self {
		let mut filters = self.filters.clone();
		filters.extend(&other.filters);

		Self {
			page: other.page.or(self.page),
			limit: other.limit.or(self.limit),
			sort: other.sort.clone().or_else(|| self.sort.clone()),
			order: other.order.or(self.order),
			filters,
			search: other.search.clone().or_else(|| self.search.clone()),
		}
	}

	#[must_use]
	pub fn to_params(&self) -> QueryParams {
		let mut params = QueryParams::new();

		if let Some(page) = self.page {
			params.insert(ReservedKey::Page.to_string(), page.to_string());
		}
		if let Some(limit) = self.limit {
			params.insert(ReservedKey::Limit.to_string(), limit.to_string());
		}
		if let Some(sort) = &self.sort {
			params.insert(ReservedKey::Sort.to_string(), sort.clone());
		}
		if let Some(order) = self.order {
			params.insert(ReservedKey::Order.to_string(), order.to_string());
		}
		if let Some(search) = self.search.as_deref().filter(|text| !text.is_empty()) {
			params.insert(ReservedKey::Search.to_string(), search.to_string());
		}

		params.extend(
			self.filters
				.iter()
				.map(|(key, value)| (key.to_string(), value.to_string())),
		);

		params
	}

	/// Rebuilds a descriptor from wire parameters. Non reserved keys come back as string
	/// filters, which flatten to the same wire form.
	pub fn from_params(params: &QueryParams) -> Result<Self, QueryError> {
		fn positive(key: ReservedKey, value: &str) -> Result<NonZeroU32, QueryError> {
			value.parse().map_err(|_| QueryError::InvalidValue {
				key: key.as_str(),
				value: value.to_string(),
			})
		}

		let mut query = Self::new();

		for (key, value) in params {
			match ReservedKey::parse(key) {
				Some(k @ ReservedKey::Page) => query.page = Some(positive(k, value)?),
				Some(k @ ReservedKey::Limit) => query.limit = Some(positive(k, value)?),
				Some(ReservedKey::Sort) => query.sort = Some(value.clone()),
				Some(ReservedKey::Order) => query.order = Some(value.parse()?),
				Some(ReservedKey::Search) => query.search = Some(value.clone()),
				None => {
					query.filters.insert(key.clone(), value.clone())?;
				}
			}
		}

		Ok(query)
	}
}
