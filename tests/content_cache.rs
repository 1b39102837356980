// tests/content_cache.rs
//
// ContentCache over both stores: round trip, delete, order-independent keys,
// absolute TTL, and degradation when the store is unusable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use text_humanizer::cache::{cache_key, ContentCache, FileStore, MemoryStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Stored {
    text: String,
    score: f64,
    tags: Vec<String>,
}

fn sample() -> Stored {
    Stored {
        text: "hello".into(),
        score: 0.25,
        tags: vec!["a".into(), "b".into()],
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "text-humanizer-cache-{tag}-{}-{}",
        std::process::id(),
        rand::random::<u32>()
    ))
}

fn caches(tag: &str) -> Vec<(ContentCache, Option<PathBuf>)> {
    let dir = scratch_dir(tag);
    vec![
        (
            ContentCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(3600)),
            None,
        ),
        (
            ContentCache::new(Arc::new(FileStore::new(&dir)), Duration::from_secs(3600)),
            Some(dir),
        ),
    ]
}

#[tokio::test]
async fn set_then_get_returns_the_result_unchanged() {
    for (cache, dir) in caches("rt") {
        let payload = json!({"text": "abc", "tone": "casual"});
        assert!(cache.set("convert", &payload, &sample()).await);
        let got: Option<Stored> = cache.get("convert", &payload).await;
        assert_eq!(got, Some(sample()));
        if let Some(d) = dir {
            let _ = std::fs::remove_dir_all(d);
        }
    }
}

#[tokio::test]
async fn get_after_delete_is_none() {
    for (cache, dir) in caches("del") {
        let payload = json!({"text": "abc"});
        assert!(cache.set("detection", &payload, &0.4).await);
        assert!(cache.delete("detection", &payload).await);
        assert_eq!(cache.get::<f64, _>("detection", &payload).await, None);
        assert!(!cache.delete("detection", &payload).await);
        if let Some(d) = dir {
            let _ = std::fs::remove_dir_all(d);
        }
    }
}

#[tokio::test]
async fn reordered_payload_hits_the_same_entry() {
    let cache = ContentCache::memory(Duration::from_secs(60));
    let a = json!({"text": "t", "tone": "formal", "check_plagiarism": true});
    let b = json!({"check_plagiarism": true, "tone": "formal", "text": "t"});
    assert_eq!(cache_key("convert", &a).unwrap(), cache_key("convert", &b).unwrap());

    assert!(cache.set("convert", &a, &sample()).await);
    assert_eq!(cache.get::<Stored, _>("convert", &b).await, Some(sample()));
}

#[tokio::test]
async fn entries_expire_and_reads_do_not_extend_them() {
    let cache = ContentCache::memory(Duration::from_secs(60));
    let payload = json!({"k": 1});
    assert!(
        cache
            .set_with_ttl("p", &payload, &"v", Duration::from_millis(120))
            .await
    );
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(cache.get::<String, _>("p", &payload).await.as_deref(), Some("v"));
    tokio::time::sleep(Duration::from_millis(90)).await;
    assert_eq!(cache.get::<String, _>("p", &payload).await, None);
}

#[tokio::test]
async fn clear_all_by_prefix_keeps_other_prefixes() {
    for (cache, dir) in caches("clear") {
        cache.set("detection", &json!({"text": "a"}), &0.1).await;
        cache.set("detection", &json!({"text": "b"}), &0.2).await;
        cache.set("plagiarism", &json!({"text": "a"}), &0.3).await;

        assert_eq!(cache.clear_all(Some("detection")).await, 2);
        assert_eq!(cache.get::<f64, _>("detection", &json!({"text": "a"})).await, None);
        assert_eq!(cache.get::<f64, _>("plagiarism", &json!({"text": "a"})).await, Some(0.3));
        assert_eq!(cache.clear_all(None).await, 1);
        if let Some(d) = dir {
            let _ = std::fs::remove_dir_all(d);
        }
    }
}

#[tokio::test]
async fn unusable_store_degrades_to_noops() {
    let blocker = scratch_dir("blocker");
    std::fs::write(&blocker, b"file, not a directory").expect("write blocker");
    let cache = ContentCache::new(
        Arc::new(FileStore::new(blocker.join("nested"))),
        Duration::from_secs(60),
    );

    let payload = json!({"text": "x"});
    assert!(!cache.set("convert", &payload, &sample()).await);
    assert_eq!(cache.get::<Stored, _>("convert", &payload).await, None);
    assert!(!cache.delete("convert", &payload).await);
    assert_eq!(cache.clear_all(None).await, 0);

    let stats = cache.stats();
    assert!(!stats.available);
    assert_eq!(stats.errors, 4);
    assert_eq!(stats.hits, 0);
    let _ = std::fs::remove_file(&blocker);
}

#[tokio::test]
async fn stats_count_hits_and_misses() {
    let cache = ContentCache::memory(Duration::from_secs(60));
    let payload = json!({"text": "y"});
    assert_eq!(cache.get::<f64, _>("detection", &payload).await, None);
    cache.set("detection", &payload, &0.5).await;
    assert_eq!(cache.get::<f64, _>("detection", &payload).await, Some(0.5));
    let s = cache.stats();
    assert_eq!((s.hits, s.misses, s.errors), (1, 1, 0));
    assert_eq!(s.store, "memory");
    assert!(s.available);
}
