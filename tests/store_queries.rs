// tests/store_queries.rs
mod common;

use common::{item, temp_store};
use resource_aggregator::model::{Category, ContentItem, ItemFilter, Vote};

#[tokio::test]
async fn journey_reports_reached_milestones() {
    let (_dir, store) = temp_store().await;
    let batch: Vec<_> = (0..12)
        .map(|i| item(&format!("item {i}"), &format!("https://j.test/{i}"), "J"))
        .collect();
    store.bulk_insert(&batch).await.unwrap();

    let rows = store.list(&ItemFilter::default()).await.unwrap();
    for row in rows.iter().take(7) {
        assert_eq!(store.toggle_checked(row.id).await.unwrap(), Some(true));
    }

    let j = store.journey().await.unwrap();
    assert_eq!(j.total_checked, 7);
    let achieved: Vec<_> = j
        .milestones
        .iter()
        .map(|m| (m.count, m.achieved))
        .collect();
    assert_eq!(
        achieved,
        vec![(5, true), (10, false), (20, false), (50, false), (100, false)]
    );
}

#[tokio::test]
async fn top_sources_rank_by_net_votes_with_unknown_bucket() {
    let (_dir, store) = temp_store().await;
    let batch = vec![
        item("a1", "https://a.test/1", "Alpha"),
        item("a2", "https://a.test/2", "Alpha"),
        item("b1", "https://b.test/1", "Beta"),
    ];
    store.bulk_insert(&batch).await.unwrap();
    let rows = store.list(&ItemFilter::default()).await.unwrap();
    let id_of = |title: &str| rows.iter().find(|r| r.title == title).unwrap().id;

    store.vote(id_of("a1"), Vote::Up).await.unwrap();
    store.vote(id_of("a2"), Vote::Down).await.unwrap();
    store.vote(id_of("a2"), Vote::Down).await.unwrap();
    store.vote(id_of("b1"), Vote::Up).await.unwrap();

    let top = store.top_sources(10).await.unwrap();
    let ranked: Vec<_> = top.iter().map(|s| (s.source.as_str(), s.net_votes)).collect();
    assert_eq!(ranked, vec![("Beta", 1), ("Alpha", -1)]);

    assert_eq!(store.top_sources(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn vote_returns_running_tally_and_none_for_missing_item() {
    let (_dir, store) = temp_store().await;
    store
        .bulk_insert(&[item("v", "https://v.test/1", "V")])
        .await
        .unwrap();
    let id = store.list(&ItemFilter::default()).await.unwrap()[0].id;

    store.vote(id, Vote::Up).await.unwrap();
    let tally = store.vote(id, Vote::Down).await.unwrap().unwrap();
    assert_eq!((tally.upvotes, tally.downvotes), (1, 1));

    assert!(store.vote(id + 100, Vote::Up).await.unwrap().is_none());
    assert!(store.toggle_checked(id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn stats_count_by_category_and_checked() {
    let (_dir, store) = temp_store().await;
    let batch = vec![
        ContentItem::new("n", "S").with_category(Category::News),
        ContentItem::new("c", "S").with_category(Category::Courses),
        ContentItem::new("r1", "S").with_category(Category::Reading),
        ContentItem::new("r2", "S").with_category(Category::Reading),
    ];
    assert_eq!(store.bulk_insert(&batch).await.unwrap(), 4);
    let first = store.list(&ItemFilter::default()).await.unwrap()[0].id;
    store.toggle_checked(first).await.unwrap();

    let s = store.stats().await.unwrap();
    assert_eq!((s.total, s.checked), (4, 1));
    assert_eq!((s.news, s.courses, s.reading), (1, 1, 2));
}

#[tokio::test]
async fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("items.db");
    {
        let store = resource_aggregator::Store::open(&path).await.unwrap();
        store
            .bulk_insert(&[item("kept", "https://p.test/1", "P")])
            .await
            .unwrap();
        store.close().await;
    }
    let store = resource_aggregator::Store::open(&path).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(
        store
            .bulk_insert(&[item("kept", "https://p.test/1", "P")])
            .await
            .unwrap(),
        0
    );
}
