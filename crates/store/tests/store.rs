use hx_api::{
	testing::MockTransport, ApiClient, ApiService, Entity, EntityId, EnvelopeFields, Error,
	Filters, Method, Query, SortOrder,
};
use hx_store::{EntityStore, LocalEdit, ResponsePolicy, StoreConfig, StoreRegistry, StoreState};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task::yield_now;
use tracing_test::traced_test;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Site {
	id: i64,
	name: String,
}

impl Entity for Site {
	fn id(&self) -> EntityId {
		self.id.into()
	}
}

const SITES: &str = "/sites";

fn store_with(config: StoreConfig) -> (MockTransport, EntityStore<Site>) {
	let transport = MockTransport::new();
	let client = ApiClient::new(transport.clone(), EnvelopeFields::default());

	(
		transport,
		EntityStore::new(ApiService::<Site>::new(client, SITES), config),
	)
}

fn store() -> (MockTransport, EntityStore<Site>) {
	store_with(StoreConfig::default())
}

fn page(ids: impl IntoIterator<Item = i64>, page: u32, limit: u32, total: u64) -> Value {
	let data = ids
		.into_iter()
		.map(|id| json!({ "id": id, "name": format!("site {id}") }))
		.collect::<Vec<_>>();

	json!({
		"success": true,
		"data": data,
		"pagination": { "page": page, "limit": limit, "total": total },
	})
}

fn ids(state: &StoreState<Site>) -> Vec<i64> {
	state.items.iter().map(|site| site.id).collect()
}

fn param(transport: &MockTransport, key: &str) -> Option<String> {
	transport
		.last_request()
		.and_then(|request| request.params.get(key).cloned())
}

async fn wait_for_requests(transport: &MockTransport, count: usize) {
	while transport.requests().len() < count {
		yield_now().await;
	}
}

fn patch(value: Value) -> hx_api::Patch {
	match value {
		Value::Object(patch) => patch,
		_ => unreachable!(),
	}
}

#[tokio::test]
#[traced_test]
async fn fetch_all_replaces_items_and_pagination() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page(1..=10, 1, 10, 25));

	sites.fetch_all(None).await;

	let state = sites.state();
	assert_eq!(ids(&state), (1..=10).collect::<Vec<_>>());
	assert_eq!(state.total_items, 25);
	assert_eq!(state.total_pages, 3);
	assert!(state.has_more);
	assert!(!state.is_loading);
	assert_eq!(state.error, None);

	assert_eq!(param(&transport, "page").as_deref(), Some("1"));
	assert_eq!(param(&transport, "limit").as_deref(), Some("10"));
	assert_eq!(param(&transport, "sort").as_deref(), Some("id"));
	assert_eq!(param(&transport, "order").as_deref(), Some("asc"));
}

#[tokio::test]
async fn one_off_parameters_win_over_state() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page([1], 1, 50, 1));

	sites
		.fetch_all(Some(
			Query::new().limit(50).filter("region", "south").unwrap(),
		))
		.await;

	assert_eq!(param(&transport, "limit").as_deref(), Some("50"));
	assert_eq!(param(&transport, "region").as_deref(), Some("south"));
	assert_eq!(sites.state().page_size, 10);
}

#[tokio::test]
async fn failed_fetch_keeps_items() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page([1, 2], 1, 10, 2));
	sites.fetch_all(None).await;

	transport.fail(
		Method::Get,
		SITES,
		Error::Transport {
			message: "timed out".into(),
			status: None,
			timeout: true,
		},
	);
	sites.refresh().await;

	let state = sites.state();
	assert_eq!(ids(&state), [1, 2]);
	assert_eq!(state.error.as_deref(), Some("transport error: timed out"));
	assert!(!state.is_loading);
	assert!(!state.is_refreshing);
}

#[tokio::test]
async fn fetch_by_id_failure_returns_none() {
	let (transport, sites) = store();
	transport.respond(
		Method::Get,
		"/sites/1",
		200,
		json!({ "success": true, "data": { "id": 1, "name": "site 1" } }),
	);
	transport.respond(
		Method::Get,
		"/sites/2",
		404,
		json!({ "success": false, "message": "Site not found" }),
	);

	let found = sites.fetch_by_id(1.into()).await;
	assert_eq!(found.map(|site| site.id), Some(1));

	assert_eq!(sites.fetch_by_id(2.into()).await, None);

	let state = sites.state();
	assert_eq!(state.current_item.map(|site| site.id), Some(1));
	assert_eq!(state.error.as_deref(), Some("Site not found"));
	assert!(!state.is_loading);
}

#[tokio::test]
async fn fetch_more_appends_pages() {
	let (transport, sites) = store();
	transport.respond_once(Method::Get, SITES, 200, page(1..=10, 1, 10, 27));
	transport.respond_once(Method::Get, SITES, 200, page(11..=20, 2, 10, 27));
	transport.respond_once(Method::Get, SITES, 200, page(21..=27, 3, 10, 27));

	sites.fetch_all(None).await;
	let initial_page = sites.state().current_page;

	sites.fetch_more().await;
	assert_eq!(param(&transport, "page").as_deref(), Some("2"));
	sites.fetch_more().await;
	assert_eq!(param(&transport, "page").as_deref(), Some("3"));

	let state = sites.state();
	assert_eq!(ids(&state), (1..=27).collect::<Vec<_>>());
	assert_eq!(state.current_page, initial_page + 2);
	assert!(!state.has_more);

	// Last page reached
	sites.fetch_more().await;
	assert_eq!(transport.requests().len(), 3);
	assert_eq!(sites.state().current_page, 3);
}

#[tokio::test]
async fn fetch_more_failure_keeps_page() {
	let (transport, sites) = store();
	transport.respond_once(Method::Get, SITES, 200, page(1..=10, 1, 10, 20));
	transport.respond_once(
		Method::Get,
		SITES,
		500,
		json!({ "success": false, "message": "boom" }),
	);

	sites.fetch_all(None).await;
	sites.fetch_more().await;

	let state = sites.state();
	assert_eq!(state.items.len(), 10);
	assert_eq!(state.current_page, 1);
	assert!(state.has_more);
	assert!(!state.is_loading_more);
	assert_eq!(state.error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn concurrent_fetch_more_is_a_no_op() {
	let (transport, sites) = store();
	transport.respond_once(Method::Get, SITES, 200, page(1..=10, 1, 10, 30));
	sites.fetch_all(None).await;

	let deferred = transport.defer(Method::Get, SITES);
	let pending = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_more().await }
	});
	wait_for_requests(&transport, 2).await;
	assert!(sites.state().is_loading_more);

	sites.fetch_more().await;
	assert_eq!(transport.requests().len(), 2);

	deferred.resolve(200, page(11..=20, 2, 10, 30));
	pending.await.unwrap();
	assert_eq!(sites.state().items.len(), 20);
}

#[tokio::test]
async fn staged_filters_reset_page() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page([], 3, 10, 0));

	sites.set_page(3).await;
	assert_eq!(param(&transport, "page").as_deref(), Some("3"));

	sites.set_filters(Filters::try_from_iter([("status", "active")]).unwrap());
	assert_eq!(transport.requests().len(), 1, "staging filters must not fetch");

	sites.fetch_all(None).await;
	assert_eq!(param(&transport, "status").as_deref(), Some("active"));
	assert_eq!(param(&transport, "page").as_deref(), Some("1"));
}

#[tokio::test]
async fn sorting_and_clearing_fetch_immediately() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page([], 1, 10, 0));

	sites.set_filters(Filters::try_from_iter([("era", "ly")]).unwrap());
	sites.apply_filters().await;
	assert_eq!(param(&transport, "era").as_deref(), Some("ly"));

	sites.set_sorting("name", SortOrder::Desc).await;
	assert_eq!(transport.requests().len(), 2);
	assert_eq!(param(&transport, "sort").as_deref(), Some("name"));
	assert_eq!(param(&transport, "order").as_deref(), Some("desc"));

	sites.clear_filters().await;
	assert_eq!(transport.requests().len(), 3);
	assert_eq!(param(&transport, "era"), None);
	assert!(sites.state().filters.is_empty());
}

#[tokio::test]
async fn search_hits_search_route() {
	let (transport, sites) = store();
	transport.respond(Method::Get, "/sites/search", 200, page([4, 5], 1, 10, 2));
	transport.respond(Method::Get, SITES, 200, page([1], 1, 10, 1));

	sites.set_filters(Filters::try_from_iter([("region", "north")]).unwrap());
	sites.search("citadel").await;

	let state = sites.state();
	assert_eq!(ids(&state), [4, 5]);
	assert_eq!(state.search_query, "citadel");
	assert_eq!(state.current_page, 1);

	let request = transport.last_request().unwrap();
	assert_eq!(request.path, "/sites/search");
	assert_eq!(request.params.get("q").map(String::as_str), Some("citadel"));
	assert_eq!(request.params.get("region").map(String::as_str), Some("north"));

	// Search text sticks for later list fetches
	sites.refresh().await;
	assert_eq!(param(&transport, "q").as_deref(), Some("citadel"));
}

#[tokio::test]
async fn page_navigation_is_guarded() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page(1..=10, 1, 10, 10));
	sites.fetch_all(None).await;

	sites.prev_page().await;
	sites.next_page().await;
	assert_eq!(transport.requests().len(), 1);

	transport.respond(Method::Get, SITES, 200, page(11..=20, 2, 10, 30));
	sites.fetch_all(None).await;
	sites.next_page().await;
	assert_eq!(param(&transport, "page").as_deref(), Some("2"));

	sites.prev_page().await;
	assert_eq!(param(&transport, "page").as_deref(), Some("1"));

	sites.set_page_size(25).await;
	assert_eq!(param(&transport, "limit").as_deref(), Some("25"));
	assert_eq!(param(&transport, "page").as_deref(), Some("1"));
}

#[tokio::test]
async fn local_edits_overlay_the_snapshot() {
	let (transport, sites) = store();
	transport.respond(Method::Get, SITES, 200, page([1, 2, 3], 1, 10, 3));
	sites.fetch_all(None).await;

	sites.add_item(Site {
		id: 9,
		name: "new".into(),
	});
	sites.update_item(2.into(), patch(json!({ "name": "renamed" })));
	sites.remove_item(3.into());
	sites.remove_item_by("name", "site 1".into());

	let state = sites.state();
	assert_eq!(ids(&state), [9, 2]);
	assert_eq!(state.items[1].name, "renamed");
	assert_eq!(state.total_items, 2);
	assert_eq!(sites.pending_edits().len(), 4);
	assert!(matches!(sites.pending_edits()[0], LocalEdit::Insert(_)));

	// A fresh list from the backend drops the local edits
	sites.fetch_all(None).await;
	assert_eq!(ids(&sites.state()), [1, 2, 3]);
	assert!(sites.pending_edits().is_empty());
}

#[tokio::test]
async fn local_edits_survive_appended_pages() {
	let (transport, sites) = store();
	transport.respond_once(Method::Get, SITES, 200, page([1, 2], 1, 2, 4));
	transport.respond_once(Method::Get, SITES, 200, page([3, 4], 2, 2, 5));
	sites.fetch_all(None).await;

	sites.add_item(Site {
		id: 9,
		name: "new".into(),
	});
	sites.fetch_more().await;

	let state = sites.state();
	assert_eq!(ids(&state), [9, 1, 2, 3, 4]);
	assert_eq!(state.total_items, 5);

	sites.remove_item(1.into());
	transport.respond_once(Method::Get, SITES, 200, page([5], 3, 2, 5));
	sites.fetch_more().await;

	// Appending keeps counting the local insert and removal
	let state = sites.state();
	assert_eq!(ids(&state), [9, 2, 3, 4, 5]);
	assert_eq!(state.total_items, 4);
}

#[tokio::test]
async fn reset_restores_defaults() {
	let config = StoreConfig::default()
		.with_page_size(20)
		.with_sort("rating", SortOrder::Desc);
	let (transport, sites) = store_with(config.clone());
	transport.respond(Method::Get, SITES, 200, page(1..=20, 1, 20, 45));
	transport.respond(Method::Get, "/sites/search", 200, page([1], 1, 20, 1));

	sites.fetch_all(None).await;
	sites.fetch_more().await;
	sites.search("pagoda").await;
	sites.set_filters(Filters::try_from_iter([("era", "tran")]).unwrap());
	sites.add_item(Site {
		id: 99,
		name: "x".into(),
	});
	sites.set_error(Some("oops".into()));
	sites.set_page_size(5).await;

	sites.reset();

	assert_eq!(sites.state(), StoreState::initial(&config));
	assert_eq!(sites.state().page_size, 20);
	assert_eq!(sites.state().sort_field, "rating");
	assert!(sites.pending_edits().is_empty());
}

#[tokio::test]
async fn last_write_wins_when_unguarded() {
	let (transport, sites) =
		store_with(StoreConfig::default().with_response_policy(ResponsePolicy::LastWriteWins));

	let first = transport.defer(Method::Get, SITES);
	let second = transport.defer(Method::Get, SITES);

	let first_fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});
	wait_for_requests(&transport, 1).await;

	let second_fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});
	wait_for_requests(&transport, 2).await;

	second.resolve(200, page([3, 4], 1, 10, 2));
	second_fetch.await.unwrap();
	assert_eq!(ids(&sites.state()), [3, 4]);

	first.resolve(200, page([1, 2], 1, 10, 2));
	first_fetch.await.unwrap();
	assert_eq!(ids(&sites.state()), [1, 2]);
}

#[tokio::test]
#[traced_test]
async fn latest_issued_fetch_wins_by_default() {
	let (transport, sites) = store();

	let first = transport.defer(Method::Get, SITES);
	let second = transport.defer(Method::Get, SITES);

	let first_fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});
	wait_for_requests(&transport, 1).await;

	let second_fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});
	wait_for_requests(&transport, 2).await;

	second.resolve(200, page([3, 4], 1, 10, 2));
	second_fetch.await.unwrap();

	let mut rx = sites.subscribe();
	rx.borrow_and_update();

	first.resolve(200, page([1, 2], 1, 10, 2));
	first_fetch.await.unwrap();

	let state = sites.state();
	assert_eq!(ids(&state), [3, 4]);
	assert!(!state.is_loading);
	assert!(logs_contain("Discarding response of a superseded fetch"));
	// The discarded response doesn't wake subscribers
	assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn responses_after_reset_are_discarded() {
	let (transport, sites) = store();
	let deferred = transport.defer(Method::Get, SITES);

	let fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});
	wait_for_requests(&transport, 1).await;

	sites.reset();
	deferred.resolve(200, page([1], 1, 10, 1));
	fetch.await.unwrap();

	assert_eq!(sites.state(), StoreState::initial(sites.config()));
}

#[tokio::test]
async fn subscribers_see_loading_transitions() {
	let (transport, sites) = store();
	let deferred = transport.defer(Method::Get, SITES);
	let mut rx = sites.subscribe();

	let fetch = tokio::spawn({
		let sites = sites.clone();
		async move { sites.fetch_all(None).await }
	});

	rx.changed().await.unwrap();
	assert!(rx.borrow_and_update().is_loading);

	deferred.resolve(200, page([1], 1, 10, 1));
	fetch.await.unwrap();

	rx.changed().await.unwrap();
	let state = rx.borrow_and_update().clone();
	assert!(!state.is_loading);
	assert_eq!(ids(&state), [1]);
}

#[tokio::test]
async fn set_items_and_current_item() {
	let (_, sites) = store();

	sites.set_items(vec![
		Site {
			id: 1,
			name: "a".into(),
		},
		Site {
			id: 2,
			name: "b".into(),
		},
	]);
	sites.set_current_item(Some(Site {
		id: 2,
		name: "b".into(),
	}));
	sites.set_loading(true);

	let state = sites.state();
	assert_eq!(ids(&state), [1, 2]);
	assert_eq!(state.total_items, 2);
	assert_eq!(state.current_item.map(|s| s.id), Some(2));
	assert!(state.is_loading);
}

#[tokio::test]
async fn registry_keeps_one_store_per_entity() {
	#[derive(Debug, Clone, Serialize, Deserialize)]
	struct Artifact {
		id: String,
	}

	impl Entity for Artifact {
		fn id(&self) -> EntityId {
			self.id.clone().into()
		}
	}

	let registry = StoreRegistry::new();
	assert!(registry.get::<Site>().is_none());

	let (transport, sites) = store();
	assert!(registry.register(sites).is_none());

	let again = registry.get_or_insert_with::<Site>(|| unreachable!());
	transport.respond(Method::Get, SITES, 200, page([1], 1, 10, 1));
	again.fetch_all(None).await;

	assert_eq!(
		registry.get::<Site>().map(|store| ids(&store.state())),
		Some(vec![1])
	);

	let client = ApiClient::new(MockTransport::new(), EnvelopeFields::default());
	registry.get_or_insert_with(|| {
		EntityStore::new(
			ApiService::<Artifact>::new(client, "/artifacts"),
			StoreConfig::default(),
		)
	});

	assert!(registry.contains::<Artifact>());
	assert_eq!(registry.len(), 2);
}
