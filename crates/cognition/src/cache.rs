//! TextInfo 缓存
//!
//! 以归一化文本为键的有界缓存，满容量时淘汰最久未使用的条目。
//! 缓存只影响性能，不影响分析结果。

use lru::LruCache;
use memrank_core::TextInfo;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// 命中率；尚无访问时为 0
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// TextInfo 缓存
#[derive(Debug)]
pub struct TextInfoCache {
    entries: Mutex<LruCache<String, Arc<TextInfo>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TextInfoCache {
    /// 创建缓存（容量为 0 时按 1 处理）
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 查找；命中时计数
    pub fn get(&self, key: &str) -> Option<Arc<TextInfo>> {
        let found = self.entries.lock().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// 写入一次新分析的结果（计为一次未命中）
    pub fn insert(&self, key: String, info: TextInfo) -> Arc<TextInfo> {
        let info = Arc::new(info);
        let evicted = self.entries.lock().push(key, Arc::clone(&info));
        if let Some((old_key, _)) = evicted {
            debug!("TextInfo cache evicted entry ({} chars)", old_key.chars().count());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        info
    }

    /// 清空缓存与计数
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(text: &str) -> TextInfo {
        TextInfo::minimal(text.to_string(), vec![text.to_string()])
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = TextInfoCache::new(4);
        assert!(cache.get("abc").is_none());

        cache.insert("abc".to_string(), info("abc"));
        let hit = cache.get("abc").unwrap();
        assert_eq!(hit.normalized_text, "abc");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.capacity, 4);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = TextInfoCache::new(2);
        cache.insert("one".to_string(), info("one"));
        cache.insert("two".to_string(), info("two"));
        cache.insert("three".to_string(), info("three"));

        assert_eq!(cache.stats().len, 2);
        assert!(cache.get("three").is_some());
    }

    #[test]
    fn test_recently_used_entry_survives() {
        let cache = TextInfoCache::new(2);
        cache.insert("one".to_string(), info("one"));
        cache.insert("two".to_string(), info("two"));
        cache.get("one");
        cache.insert("three".to_string(), info("three"));

        assert!(cache.get("one").is_some());
        assert!(cache.get("two").is_none());
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = TextInfoCache::new(3);
        cache.insert("one".to_string(), info("one"));
        cache.get("one");
        cache.clear();

        assert_eq!(cache.stats(), CacheStats { capacity: 3, ..Default::default() });
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_zero_capacity_falls_back_to_one() {
        let cache = TextInfoCache::new(0);
        cache.insert("one".to_string(), info("one"));
        cache.insert("two".to_string(), info("two"));
        assert_eq!(cache.stats().capacity, 1);
        assert_eq!(cache.stats().len, 1);
    }

    #[test]
    fn test_concurrent_inserts() {
        let cache = Arc::new(TextInfoCache::new(8));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("{t}-{i}");
                        if cache.get(&key).is_none() {
                            cache.insert(key.clone(), info(&key));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.len, 8);
        assert_eq!(stats.misses, 200);
    }
}
