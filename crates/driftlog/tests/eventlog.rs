//! Event log behavior: appends, hashes, and the iterator contract.
//!
//! The iterator yields entries newest-first; tests that want
//! chronological order reverse the collected sequence.

use std::sync::Arc;

use driftlog::{
    EventLog, EventLogOptions, IterOptions, Keypair, MemoryBlockStore, ReplicationMode,
};
use driftlog_core::{EntryId, CID_STRING_LEN};

fn open_db(address: &str) -> EventLog<MemoryBlockStore> {
    EventLog::open(
        address,
        Arc::new(MemoryBlockStore::new()),
        ReplicationMode::Offline,
        EventLogOptions::new().identity(Keypair::from_seed(&[0x07; 32])),
    )
    .expect("open database")
}

/// Open a db and append `count` payloads `hello0..helloN`, returning the
/// hashes in append order (oldest first).
async fn db_with_items(address: &str, count: usize) -> (EventLog<MemoryBlockStore>, Vec<EntryId>) {
    let db = open_db(address);
    let mut hashes = Vec::with_capacity(count);
    for i in 0..count {
        let (hash, _) = db.add(format!("hello{i}").into_bytes()).await.unwrap();
        hashes.push(hash);
    }
    (db, hashes)
}

#[tokio::test]
async fn returns_zero_items_for_a_fresh_database() {
    let db = open_db("/driftlog/tests/fresh");
    let items = db.iterator(IterOptions::all()).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn returns_the_added_entrys_hash_one_entry() {
    let db = open_db("/driftlog/tests/first");
    let (hash, _) = db.add(b"hello1".to_vec()).await.unwrap();

    let items = db.iterator(IterOptions::all()).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id(), hash);
    assert_eq!(items[0].payload.as_ref(), b"hello1");
}

#[tokio::test]
async fn returns_the_added_entrys_hash_two_entries() {
    let db = open_db("/driftlog/tests/first");
    db.add(b"hello1".to_vec()).await.unwrap();

    let prev_hash = db.iterator(IterOptions::new()).await[0].id();
    let (hash, _) = db.add(b"hello2".to_vec()).await.unwrap();

    let items = db.iterator(IterOptions::all()).await;
    assert_eq!(items.len(), 2);
    assert_ne!(hash, prev_hash);
    assert_eq!(items[0].id(), hash, "newest entry comes first");
    assert_eq!(db.heads().await, vec![hash]);
}

#[tokio::test]
async fn adds_five_items() {
    let (db, _) = db_with_items("/driftlog/tests/second", 5).await;

    let mut items = db.iterator(IterOptions::all()).await;
    assert_eq!(items.len(), 5);

    // Reversing the newest-first sequence gives append order.
    items.reverse();
    assert_eq!(items[0].payload.as_ref(), b"hello0");
    assert_eq!(items[4].payload.as_ref(), b"hello4");
    for (i, item) in items.iter().enumerate() {
        assert_eq!(item.payload.as_ref(), format!("hello{i}").as_bytes());
    }
}

#[tokio::test]
async fn adds_an_item_larger_than_the_inline_threshold() {
    let db = open_db("/driftlog/tests/third");
    let msg = vec![b'a'; 1024];

    let (hash, _) = db.add(msg).await.unwrap();
    let cid = hash.to_cid();

    assert!(cid.starts_with("ba"));
    assert_eq!(cid.len(), CID_STRING_LEN);
}

mod iterator {
    use super::*;

    #[tokio::test]
    async fn returns_an_item_with_the_correct_structure() {
        let (db, hashes) = db_with_items("/driftlog/tests/iterator", 5).await;

        let items = db.iterator(IterOptions::new()).await;
        let next = &items[0];

        assert!(next.id().to_cid().starts_with("ba"));
        assert_eq!(next.id(), *hashes.last().unwrap());
        assert_eq!(next.payload.as_ref(), b"hello4");
        assert_eq!(next.clock.id, db.identity());
    }

    #[tokio::test]
    async fn returns_one_item_as_default() {
        let (db, hashes) = db_with_items("/driftlog/tests/iterator", 5).await;

        let items = db.iterator(IterOptions::new()).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), *hashes.last().unwrap());
        assert_eq!(items[0].payload.as_ref(), b"hello4");
    }

    #[tokio::test]
    async fn returns_items_newest_first() {
        let (db, _) = db_with_items("/driftlog/tests/iterator", 5).await;

        let items = db.iterator(IterOptions::new().limit(3)).await;
        let payloads: Vec<&[u8]> = items.iter().map(|e| e.payload.as_ref()).collect();
        assert_eq!(payloads, vec![&b"hello4"[..], b"hello3", b"hello2"]);
    }

    #[tokio::test]
    async fn collect_returns_all_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/iterator", 5).await;

        let items = db.iterator(IterOptions::all()).await;
        assert_eq!(items.len(), hashes.len());
        assert_eq!(items[0].payload.as_ref(), b"hello4");
        assert_eq!(items[4].payload.as_ref(), b"hello0");
    }

    #[tokio::test]
    async fn collect_returns_one_item() {
        let (db, _) = db_with_items("/driftlog/tests/iterator", 5).await;
        let items = db.iterator(IterOptions::new()).await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn collect_returns_three_items() {
        let (db, _) = db_with_items("/driftlog/tests/iterator", 5).await;
        let items = db.iterator(IterOptions::new().limit(3)).await;
        assert_eq!(items.len(), 3);
    }
}

mod limit {
    use super::*;

    #[tokio::test]
    async fn returns_one_item_when_limit_is_zero() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let items = db.iterator(IterOptions::new().limit(0)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), *hashes.last().unwrap());
    }

    #[tokio::test]
    async fn returns_one_item_when_limit_is_one() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let items = db.iterator(IterOptions::new().limit(1)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), *hashes.last().unwrap());
    }

    #[tokio::test]
    async fn returns_three_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let items = db.iterator(IterOptions::new().limit(3)).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[4], hashes[3], hashes[2]]);
    }

    #[tokio::test]
    async fn returns_all_items_when_limit_is_minus_one() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let mut ids: Vec<EntryId> = db
            .iterator(IterOptions::all())
            .await
            .iter()
            .map(|e| e.id())
            .collect();
        ids.reverse();
        assert_eq!(ids, hashes);
    }

    #[tokio::test]
    async fn returns_all_items_when_limit_is_very_negative() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let items = db.iterator(IterOptions::new().limit(-300)).await;
        assert_eq!(items.len(), hashes.len());
        assert_eq!(items[0].id(), *hashes.last().unwrap());
    }

    #[tokio::test]
    async fn returns_all_items_when_limit_exceeds_count() {
        let (db, hashes) = db_with_items("/driftlog/tests/limit", 5).await;

        let items = db.iterator(IterOptions::new().limit(300)).await;
        assert_eq!(items.len(), hashes.len());
        assert_eq!(items[0].id(), *hashes.last().unwrap());
    }
}

mod ranges {
    use super::*;

    #[tokio::test]
    async fn gte_head_returns_one_item() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::all().gte(head)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), head);
    }

    #[tokio::test]
    async fn gt_head_returns_zero_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::new().gt(head)).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn gte_second_newest_returns_two_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::all().gte(hashes[3])).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[4], hashes[3]]);
    }

    #[tokio::test]
    async fn gte_root_returns_all_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::all().gte(hashes[0])).await;
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].id(), hashes[4]);
        assert_eq!(items[4].id(), hashes[0]);
    }

    #[tokio::test]
    async fn gt_root_returns_all_but_the_root() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::all().gt(hashes[0])).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[4], hashes[3], hashes[2], hashes[1]]);
    }

    #[tokio::test]
    async fn gt_middle_with_generous_limit() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::new().limit(100).gt(hashes[2])).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[4], hashes[3]]);
    }

    #[tokio::test]
    async fn lt_head_returns_the_entry_below_it() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::new().lt(head)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), hashes[3]);
    }

    #[tokio::test]
    async fn lt_head_unlimited_returns_everything_older() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::all().lt(head)).await;
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].id(), hashes[3]);
        assert_eq!(items[3].id(), hashes[0]);
    }

    #[tokio::test]
    async fn lt_head_with_limit_three() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::new().limit(3).lt(head)).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[3], hashes[2], hashes[1]]);
    }

    #[tokio::test]
    async fn lt_root_returns_zero_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::new().lt(hashes[0])).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn lte_root_returns_the_root_only() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;

        let items = db.iterator(IterOptions::new().lte(hashes[0])).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), hashes[0]);
    }

    #[tokio::test]
    async fn lte_head_unlimited_returns_all_items() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::all().lte(head)).await;
        assert_eq!(items.len(), 5);
        assert_eq!(items[0].id(), head);
        assert_eq!(items[4].id(), hashes[0]);
    }

    #[tokio::test]
    async fn lte_head_with_limit_three() {
        let (db, hashes) = db_with_items("/driftlog/tests/ranges", 5).await;
        let head = *hashes.last().unwrap();

        let items = db.iterator(IterOptions::new().limit(3).lte(head)).await;
        let ids: Vec<EntryId> = items.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![hashes[4], hashes[3], hashes[2]]);
    }

    #[tokio::test]
    async fn unknown_upper_bound_returns_zero_items() {
        let (db, _) = db_with_items("/driftlog/tests/ranges", 5).await;
        let ghost = EntryId::from_bytes([0xee; 32]);

        let items = db.iterator(IterOptions::all().lte(ghost)).await;
        assert!(items.is_empty());
    }
}

#[tokio::test]
async fn a_new_iterator_observes_later_writes() {
    let db = open_db("/driftlog/tests/reread");
    db.add(b"one".to_vec()).await.unwrap();
    assert_eq!(db.iterator(IterOptions::all()).await.len(), 1);

    db.add(b"two".to_vec()).await.unwrap();
    assert_eq!(db.iterator(IterOptions::all()).await.len(), 2);
}

#[tokio::test]
async fn clock_times_rise_along_the_chain() {
    let (db, hashes) = db_with_items("/driftlog/tests/clock", 3).await;

    let e0 = db.get(&hashes[0]).await.unwrap();
    let e1 = db.get(&hashes[1]).await.unwrap();
    let e2 = db.get(&hashes[2]).await.unwrap();

    assert!(e1.clock.time > e0.clock.time);
    assert!(e2.clock.time > e1.clock.time);
    assert!(e1.next.contains(&hashes[0]));
    assert!(e2.next.contains(&hashes[1]));
}
