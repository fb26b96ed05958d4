use moka::future::Cache;
use serde_json::Value;
use std::time::Duration;

/// Process-local TTL cache for rendered list responses. Keyed by endpoint
/// path + query string; every mutating endpoint flushes the whole cache
/// rather than invalidating selectively.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, Value>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn key(path: &str, query: &str) -> String {
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, value: Value) {
        self.inner.insert(key, value).await;
    }

    pub async fn flush_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn cache_stores_and_flushes() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = ResponseCache::key("/api/v1/listing", "q=cafe&page=1");
        assert_eq!(key, "/api/v1/listing?q=cafe&page=1");

        cache.insert(key.clone(), json!({"items": []})).await;
        assert!(cache.get(&key).await.is_some());

        cache.flush_all().await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(50));
        cache.insert("k".into(), json!(1)).await;
        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[test]
    fn bare_path_key_has_no_separator() {
        assert_eq!(ResponseCache::key("/api/v1/business", ""), "/api/v1/business");
    }
}
