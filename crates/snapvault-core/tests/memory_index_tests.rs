#![allow(clippy::unwrap_used, clippy::expect_used)]

use snapvault_core::errors::ExErrorKind;
use snapvault_core::{MemorySearchIndex, SearchIndex, SNAPSHOT_KIND};

#[test]
fn test_add_is_idempotent_per_identity() {
    let index = MemorySearchIndex::new();
    index.add("cpu dashboard", SNAPSHOT_KIND, "k1", 1, 1).unwrap();
    index.add("memory dashboard", SNAPSHOT_KIND, "k1", 1, 1).unwrap();

    assert_eq!(index.len(), 1);
    assert!(index.search("cpu", 1).unwrap().is_empty());
    let hits = index.search("memory", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uid, "k1");
}

#[test]
fn test_same_uid_in_other_org_is_separate() {
    let index = MemorySearchIndex::new();
    index.add("cpu", SNAPSHOT_KIND, "k1", 1, 1).unwrap();
    index.add("cpu", SNAPSHOT_KIND, "k1", 2, 1).unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.search("cpu", 1).unwrap().len(), 1);
    assert_eq!(index.search("cpu", 2).unwrap()[0].org_id, 2);
}

#[test]
fn test_search_is_org_scoped() {
    let index = MemorySearchIndex::new();
    index.add("latency overview", SNAPSHOT_KIND, "a", 1, 1).unwrap();
    index.add("latency overview", SNAPSHOT_KIND, "b", 2, 1).unwrap();

    let hits = index.search("latency", 1).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].uid, "a");
}

#[test]
fn test_ranking_relevance_then_weight() {
    let index = MemorySearchIndex::new();
    index.add("cpu", SNAPSHOT_KIND, "low", 1, 1).unwrap();
    index.add("cpu", SNAPSHOT_KIND, "high", 1, 10).unwrap();
    index.add("cpu memory", SNAPSHOT_KIND, "both", 1, 0).unwrap();

    let uids: Vec<String> = index
        .search("cpu memory", 1)
        .unwrap()
        .into_iter()
        .map(|r| r.uid)
        .collect();
    assert_eq!(uids, vec!["both", "high", "low"]);
}

#[test]
fn test_search_is_deterministic() {
    let index = MemorySearchIndex::new();
    for i in 0..20 {
        index
            .add("node exporter", SNAPSHOT_KIND, &format!("k{}", i), 1, (i % 3) as u32)
            .unwrap();
    }
    let first = index.search("node", 1).unwrap();
    let second = index.search("node", 1).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_delete_is_idempotent() {
    let index = MemorySearchIndex::new();
    index.add("cpu", SNAPSHOT_KIND, "k1", 1, 1).unwrap();
    index.delete(SNAPSHOT_KIND, "k1", 1).unwrap();
    index.delete(SNAPSHOT_KIND, "k1", 1).unwrap();
    index.delete(SNAPSHOT_KIND, "never-added", 1).unwrap();
    assert!(index.is_empty());
}

#[test]
fn test_closed_index_rejects_calls() {
    let index = MemorySearchIndex::new();
    index.close().unwrap();
    let err = index.add("cpu", SNAPSHOT_KIND, "k1", 1, 1).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Index);
    assert_eq!(index.search("cpu", 1).unwrap_err().kind(), ExErrorKind::Index);
}
