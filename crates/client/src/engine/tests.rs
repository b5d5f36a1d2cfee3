use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use feedline_core::{CacheDb, KvStore};

use super::*;
use crate::upstream::UpstreamPage;

const TTL: Duration = Duration::from_secs(86_400);

/// Upstream fake that records every query and answers from a settable script.
#[derive(Default)]
struct ScriptedSource {
    ids: Mutex<Vec<String>>,
    fail_status: Mutex<Option<u16>>,
    queries: Mutex<Vec<FeedQuery>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    fn returning(values: &[&str]) -> Self {
        Self { ids: Mutex::new(ids(values)), ..Default::default() }
    }

    fn set_ids(&self, values: &[&str]) {
        *self.ids.lock().unwrap() = ids(values);
    }

    fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, query: &FeedQuery) -> Result<UpstreamPage, Error> {
        self.queries.lock().unwrap().push(query.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = *self.fail_status.lock().unwrap();
        if let Some(status) = failure {
            return Err(Error::UpstreamStatus(status));
        }

        let post_ids = self.ids.lock().unwrap().clone();
        Ok(UpstreamPage { post_ids, cursor: Some("next".into()) })
    }
}

/// Store whose every operation fails.
#[derive(Debug)]
struct FailingStore;

fn store_down() -> Error {
    Error::CorruptEntry { key: "*".into(), reason: "store unavailable".into() }
}

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(store_down())
    }

    async fn get_many(&self, _keys: &[String]) -> Result<Vec<Option<String>>, Error> {
        Err(store_down())
    }

    async fn set_many(&self, _entries: Vec<(String, String)>, _ttl: Option<Duration>) -> Result<(), Error> {
        Err(store_down())
    }

    async fn delete(&self, _keys: &[String]) -> Result<u64, Error> {
        Err(store_down())
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        Err(store_down())
    }
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn engine(source: ScriptedSource) -> FeedEngine<ScriptedSource> {
    let store = CacheDb::open_in_memory().await.unwrap();
    FeedEngine::new(Arc::new(source), FeedCache::new(Arc::new(store)), EngineConfig::default())
}

async fn seed(engine: &FeedEngine<ScriptedSource>, key: &FeedCacheKey, values: &[&str], age: ChronoDuration) {
    engine.cache().write_feed(key, &ids(values), Utc::now() - age, TTL).await.unwrap();
}

/// Wait for the detached cache write to land.
async fn wait_for_entry(cache: &FeedCache, key: &FeedCacheKey) -> Vec<String> {
    for _ in 0..100 {
        if let Ok(posts) = cache.cached_posts(key).await
            && !posts.is_empty()
        {
            return posts;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("cache entry for {key} was never written");
}

#[tokio::test]
async fn test_pages_stay_pinned_to_first_list() {
    let engine = engine(ScriptedSource::returning(&["1", "2", "3", "4", "5", "6"])).await;
    let first = PageRequest::new(Some("u1"), Some("f1"), 0, 2, 2);

    let page = engine.get_page(&first).await.unwrap();
    assert_eq!(page.post_ids, ids(&["1", "2"]));
    assert_eq!(page.source, PageSource::Upstream);
    wait_for_entry(engine.cache(), &first.key).await;

    engine.source().set_ids(&["6", "5", "4", "3", "2", "1"]);
    let page = engine.get_page(&PageRequest { offset: 2, ..first.clone() }).await.unwrap();
    assert_eq!(page.post_ids, ids(&["3", "4"]));
    assert_eq!(page.source, PageSource::Cache);

    engine.mark_feed_updated(&first.key.feed).await.unwrap();
    let page = engine.get_page(&PageRequest { offset: 4, ..first.clone() }).await.unwrap();
    assert_eq!(page.post_ids, ids(&["5", "6"]));
    assert_eq!(page.source, PageSource::Cache);

    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_fresh_cache_skips_upstream() {
    let engine = engine(ScriptedSource::returning(&["x"])).await;
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);
    seed(&engine, &req.key, &["7", "8"], ChronoDuration::zero()).await;

    let page = engine.get_page(&req).await.unwrap();

    assert_eq!(page.post_ids, ids(&["7", "8"]));
    assert_eq!(page.source, PageSource::Cache);
    assert!(page.cursor.is_none());
    assert_eq!(engine.source().calls(), 0);
}

#[tokio::test]
async fn test_hour_old_cache_goes_upstream() {
    let engine = engine(ScriptedSource::returning(&["n1", "n2"])).await;
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);
    seed(&engine, &req.key, &["7", "8"], ChronoDuration::hours(1)).await;

    let page = engine.get_page(&req).await.unwrap();

    assert_eq!(page.post_ids, ids(&["n1", "n2"]));
    assert_eq!(page.source, PageSource::Upstream);
    assert_eq!(page.cursor.as_deref(), Some("next"));
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_freshness_window_gates_upstream() {
    let engine = engine(ScriptedSource::returning(&["new"])).await;
    let window = ChronoDuration::from_std(engine.config().policy.window).unwrap();
    let margin = ChronoDuration::seconds(5);

    let inside = PageRequest::new(Some("u1"), Some("inside"), 0, 20, 2);
    seed(&engine, &inside.key, &["old"], window - margin).await;
    assert_eq!(engine.get_page(&inside).await.unwrap().source, PageSource::Cache);
    assert_eq!(engine.source().calls(), 0);

    let outside = PageRequest::new(Some("u1"), Some("outside"), 0, 20, 2);
    seed(&engine, &outside.key, &["old"], window + margin).await;
    assert_eq!(engine.get_page(&outside).await.unwrap().source, PageSource::Upstream);
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_mutation_marker_invalidates_first_page() {
    let engine = engine(ScriptedSource::returning(&["new"])).await;
    let req = PageRequest::new(Some("u1"), Some("f1"), 0, 20, 2);
    seed(&engine, &req.key, &["old"], ChronoDuration::seconds(1)).await;

    engine.mark_feed_updated(&req.key.feed).await.unwrap();
    let page = engine.get_page(&req).await.unwrap();

    assert_eq!(page.post_ids, ids(&["new"]));
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_marker_for_other_feed_is_ignored() {
    let engine = engine(ScriptedSource::returning(&["new"])).await;
    let req = PageRequest::new(Some("u1"), Some("f1"), 0, 20, 2);
    seed(&engine, &req.key, &["old"], ChronoDuration::seconds(1)).await;

    engine.mark_feed_updated(&FeedScope::from_id(Some("f2"))).await.unwrap();
    let page = engine.get_page(&req).await.unwrap();

    assert_eq!(page.post_ids, ids(&["old"]));
    assert_eq!(engine.source().calls(), 0);
}

#[tokio::test]
async fn test_empty_upstream_does_not_populate() {
    let engine = engine(ScriptedSource::returning(&[])).await;
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);

    let page = engine.get_page(&req).await.unwrap();
    assert!(page.post_ids.is_empty());
    assert_eq!(page.source, PageSource::Upstream);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(engine.cache().inspect(&req.key).await.unwrap().is_none());

    engine.get_page(&req).await.unwrap();
    assert_eq!(engine.source().calls(), 2);
}

#[tokio::test]
async fn test_keys_are_isolated() {
    let engine = engine(ScriptedSource::returning(&["a", "b"])).await;
    let owner = PageRequest::new(Some("u1"), Some("f1"), 0, 20, 2);
    engine.get_page(&owner).await.unwrap();
    wait_for_entry(engine.cache(), &owner.key).await;

    let other_viewer = PageRequest::new(Some("u2"), Some("f1"), 0, 20, 2);
    let other_feed = PageRequest::new(Some("u1"), Some("f2"), 0, 20, 2);
    assert_eq!(engine.get_page(&other_viewer).await.unwrap().source, PageSource::Upstream);
    assert_eq!(engine.get_page(&other_feed).await.unwrap().source, PageSource::Upstream);
    assert_eq!(engine.get_page(&owner).await.unwrap().source, PageSource::Cache);

    assert_eq!(engine.source().calls(), 3);
}

#[tokio::test]
async fn test_upstream_error_is_not_masked_by_stale_cache() {
    let engine = engine(ScriptedSource::returning(&["new"])).await;
    engine.source().fail_with(503);
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);
    seed(&engine, &req.key, &["stale"], ChronoDuration::hours(2)).await;

    let result = engine.get_page(&req).await;

    assert!(matches!(result, Err(Error::UpstreamStatus(503))));
    assert_eq!(engine.cache().cached_posts(&req.key).await.unwrap(), ids(&["stale"]));
}

#[tokio::test]
async fn test_store_failure_degrades_to_upstream() {
    let source = Arc::new(ScriptedSource::returning(&["p1", "p2", "p3"]));
    let engine = FeedEngine::new(source, FeedCache::new(Arc::new(FailingStore)), EngineConfig::default());
    let req = PageRequest::new(Some("u1"), None, 0, 2, 2);

    let page = engine.get_page(&req).await.unwrap();
    assert_eq!(page.post_ids, ids(&["p1", "p2"]));
    assert_eq!(page.source, PageSource::Upstream);

    let write = engine.populate_cache(req.key.clone(), ids(&["p1"]), Utc::now());
    assert!(write.await.is_ok());
}

#[tokio::test]
async fn test_offset_past_end_is_empty_page() {
    let engine = engine(ScriptedSource::returning(&["1", "2", "3"])).await;
    let req = PageRequest::new(None, None, 10, 5, 2);

    let page = engine.get_page(&req).await.unwrap();

    assert!(page.post_ids.is_empty());
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_continuation_page_without_cache_fetches_and_slices() {
    let engine = engine(ScriptedSource::returning(&["1", "2", "3", "4"])).await;
    let req = PageRequest::new(Some("u1"), None, 2, 2, 2);

    let page = engine.get_page(&req).await.unwrap();

    assert_eq!(page.post_ids, ids(&["3", "4"]));
    assert_eq!(page.source, PageSource::Upstream);
    assert_eq!(wait_for_entry(engine.cache(), &req.key).await, ids(&["1", "2", "3", "4"]));
}

#[tokio::test]
async fn test_realtime_version_uses_tighter_window() {
    let engine = engine(ScriptedSource::returning(&["new"])).await;
    let realtime = engine.config().policy.realtime_version;
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);
    seed(&engine, &req.key, &["old"], ChronoDuration::seconds(120)).await;

    assert_eq!(engine.get_page(&req).await.unwrap().source, PageSource::Cache);

    let page = engine.get_page(&PageRequest { feed_version: realtime, ..req.clone() }).await.unwrap();
    assert_eq!(page.source, PageSource::Upstream);
    assert_eq!(engine.source().calls(), 1);
}

#[tokio::test]
async fn test_upstream_query_shape() {
    let engine = engine(ScriptedSource::returning(&["1"])).await;
    let req = PageRequest::new(Some("u1"), Some("f1"), 0, 20, 5);

    engine.get_page(&req).await.unwrap();

    let queries = engine.source().queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].key, req.key);
    assert_eq!(queries[0].page_size, DEFAULT_FETCH_SIZE);
    assert_eq!(queries[0].feed_version, 5);
}

#[tokio::test]
async fn test_concurrent_misses_each_fetch() {
    let source = ScriptedSource { delay: Some(Duration::from_millis(20)), ..ScriptedSource::returning(&["1", "2"]) };
    let engine = engine(source).await;
    let req = PageRequest::new(Some("u1"), None, 0, 20, 2);

    let (a, b) = tokio::join!(engine.get_page(&req), engine.get_page(&req));

    assert_eq!(a.unwrap().post_ids, ids(&["1", "2"]));
    assert_eq!(b.unwrap().post_ids, ids(&["1", "2"]));
    assert_eq!(engine.source().calls(), 2);
}

#[tokio::test]
async fn test_populate_cache_records_generation_time() {
    let engine = engine(ScriptedSource::default()).await;
    let key = FeedCacheKey::for_ids(Some("u1"), Some("f1"));
    let requested_at = Utc::now() - ChronoDuration::seconds(2);

    engine.populate_cache(key.clone(), ids(&["a", "b"]), requested_at).await.unwrap();

    let marks = engine.cache().freshness_marks(&key).await.unwrap();
    let generated_at = marks.generated_at.unwrap();
    assert_eq!(generated_at.timestamp_millis(), requested_at.timestamp_millis());
    assert_eq!(engine.cache().cached_posts(&key).await.unwrap(), ids(&["a", "b"]));
}

#[tokio::test]
async fn test_mark_feed_updated_writes_shared_marker() {
    let engine = engine(ScriptedSource::default()).await;
    let feed = FeedScope::from_id(Some("f1"));

    let at = engine.mark_feed_updated(&feed).await.unwrap();

    let key = FeedCacheKey::new(feed, feedline_core::ViewerScope::from_id(Some("anyone")));
    let marks = engine.cache().freshness_marks(&key).await.unwrap();
    assert_eq!(marks.updated_at.map(|t| t.timestamp_millis()), Some(at.timestamp_millis()));
}

/// Upstream that records a configuration change of its feed while ranking.
struct ReconfiguredMidFetch {
    cache: FeedCache,
    calls: AtomicUsize,
}

#[async_trait]
impl FeedSource for ReconfiguredMidFetch {
    async fn fetch(&self, query: &FeedQuery) -> Result<UpstreamPage, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.cache.mark_feed_updated(&query.key.feed, Utc::now(), TTL).await?;
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(UpstreamPage { post_ids: ids(&["ranked-before-change"]), cursor: None })
    }
}

#[tokio::test]
async fn test_marker_bumped_during_fetch_keeps_list_stale() {
    let store = CacheDb::open_in_memory().await.unwrap();
    let cache = FeedCache::new(Arc::new(store));
    let source = Arc::new(ReconfiguredMidFetch { cache: cache.clone(), calls: AtomicUsize::new(0) });
    let engine = FeedEngine::new(source.clone(), cache, EngineConfig::default());
    let req = PageRequest::new(Some("u1"), Some("f1"), 0, 20, 2);

    assert_eq!(engine.get_page(&req).await.unwrap().source, PageSource::Upstream);
    wait_for_entry(engine.cache(), &req.key).await;

    let marks = engine.cache().freshness_marks(&req.key).await.unwrap();
    assert!(marks.updated_at > marks.generated_at);

    assert_eq!(engine.get_page(&req).await.unwrap().source, PageSource::Upstream);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_separator_in_ids_keeps_entries_apart() {
    let engine = engine(ScriptedSource::returning(&["x"])).await;
    let first = PageRequest::new(Some("b:c"), Some("a"), 0, 20, 2);
    let second = PageRequest::new(Some("c"), Some("a:b"), 0, 20, 2);

    engine.get_page(&first).await.unwrap();
    wait_for_entry(engine.cache(), &first.key).await;

    assert_eq!(engine.get_page(&second).await.unwrap().source, PageSource::Upstream);
    assert_eq!(engine.source().calls(), 2);
}

#[tokio::test]
async fn test_global_spelled_out_is_the_global_feed() {
    let engine = engine(ScriptedSource::returning(&["g1", "g2"])).await;
    let spelled = PageRequest::new(Some("u1"), Some("global"), 0, 20, 2);
    let unscoped = PageRequest::new(Some("u1"), None, 0, 20, 2);

    engine.get_page(&spelled).await.unwrap();
    wait_for_entry(engine.cache(), &unscoped.key).await;

    let queries = engine.source().queries.lock().unwrap().clone();
    assert_eq!(queries[0].key.feed, FeedScope::Global);
    assert_eq!(engine.get_page(&unscoped).await.unwrap().post_ids, ids(&["g1", "g2"]));
}
