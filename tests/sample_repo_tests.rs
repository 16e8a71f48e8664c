// SampleRepo tests: init, append, range queries, ordering, close, concurrency

mod common;

use chrono::TimeDelta;
use common::{at, sample_at, temp_repo, utc8};
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn sample_repo_init_is_idempotent() {
    let (_dir, repo) = temp_repo(utc8()).await;
    // Second init is no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn append_assigns_increasing_ids() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let a = repo
        .append(sample_at(at("2024-05-01T10:00:00+08:00")))
        .await
        .unwrap();
    let b = repo
        .append(sample_at(at("2024-05-01T10:00:01+08:00")))
        .await
        .unwrap();
    assert!(b.id > a.id);
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn append_then_query_round_trips_fields() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let t = at("2024-05-01T10:00:00.123456+08:00");
    let saved = repo.append(sample_at(t)).await.unwrap();

    let found = repo
        .query(Some(t - TimeDelta::seconds(1)), Some(t + TimeDelta::seconds(1)))
        .await
        .unwrap();
    assert_eq!(found, vec![saved.clone()]);

    let got = &found[0];
    let expected = sample_at(t);
    assert_eq!(got.timestamp, t);
    assert_eq!(got.cpu_usage.to_bits(), expected.cpu_usage.to_bits());
    assert_eq!(got.mem_usage.to_bits(), expected.mem_usage.to_bits());
    assert_eq!(got.load_average.to_bits(), expected.load_average.to_bits());
    assert_eq!(got.disk_io.to_bits(), expected.disk_io.to_bits());
    assert_eq!(got.network_io.to_bits(), expected.network_io.to_bits());
}

#[tokio::test]
async fn timestamps_are_normalized_to_reference_offset() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let saved = repo
        .append(sample_at(at("2024-05-01T02:00:00Z")))
        .await
        .unwrap();
    assert_eq!(saved.timestamp.to_rfc3339(), "2024-05-01T10:00:00+08:00");

    let found = repo.query(None, None).await.unwrap();
    assert_eq!(found[0].timestamp.to_rfc3339(), "2024-05-01T10:00:00+08:00");
}

#[tokio::test]
async fn range_bounds_are_inclusive_and_exclusive_outside() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let t = at("2024-05-01T10:00:00+08:00");
    repo.append(sample_at(t)).await.unwrap();
    let just = TimeDelta::microseconds(1);

    assert_eq!(repo.query(Some(t), Some(t)).await.unwrap().len(), 1);
    assert!(repo.query(None, Some(t - just)).await.unwrap().is_empty());
    assert!(repo.query(Some(t + just), None).await.unwrap().is_empty());
    assert!(
        repo.query(Some(t - TimeDelta::hours(1)), Some(t - just))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn sub_microsecond_timestamp_is_found_by_its_own_instant() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let t = at("2024-05-01T10:00:00.0000015+08:00");
    let saved = repo.append(sample_at(t)).await.unwrap();
    assert_eq!(saved.timestamp, at("2024-05-01T10:00:00.000001+08:00"));

    let found = repo.query(Some(t), Some(t)).await.unwrap();
    assert_eq!(found, vec![saved]);
}

#[tokio::test]
async fn sub_microsecond_bounds_compare_at_storage_resolution() {
    let (_dir, repo) = temp_repo(utc8()).await;
    repo.append(sample_at(at("2024-05-01T10:00:00.000001+08:00")))
        .await
        .unwrap();

    // Anything below one microsecond past the sample falls in the same stored tick.
    let same_tick = at("2024-05-01T10:00:00.0000019+08:00");
    assert_eq!(repo.query(Some(same_tick), None).await.unwrap().len(), 1);
    let next_tick = at("2024-05-01T10:00:00.000002+08:00");
    assert!(repo.query(Some(next_tick), None).await.unwrap().is_empty());
    let before = at("2024-05-01T10:00:00.0000009+08:00");
    assert!(repo.query(None, Some(before)).await.unwrap().is_empty());
}

#[tokio::test]
async fn open_bounds_return_everything() {
    let (_dir, repo) = temp_repo(utc8()).await;
    for i in 0..3 {
        repo.append(sample_at(
            at("2024-05-01T10:00:00+08:00") + TimeDelta::days(i),
        ))
        .await
        .unwrap();
    }
    assert_eq!(repo.query(None, None).await.unwrap().len(), 3);
    assert_eq!(
        repo.query(Some(at("2024-05-02T00:00:00+08:00")), None)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn query_preserves_append_order() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let base = at("2024-05-01T10:00:00+08:00");
    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(
            repo.append(sample_at(base + TimeDelta::seconds(i)))
                .await
                .unwrap()
                .id,
        );
    }
    let found = repo.query(None, None).await.unwrap();
    assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), ids);
    assert!(found.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn recent_returns_last_n_oldest_first() {
    let (_dir, repo) = temp_repo(utc8()).await;
    let base = at("2024-05-01T10:00:00+08:00");
    for i in 0..5 {
        repo.append(sample_at(base + TimeDelta::seconds(i)))
            .await
            .unwrap();
    }
    let recent = repo.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].timestamp, base + TimeDelta::seconds(3));
    assert_eq!(recent[1].timestamp, base + TimeDelta::seconds(4));
}

#[tokio::test]
async fn closed_repo_reports_store_errors() {
    let (_dir, repo) = temp_repo(utc8()).await;
    repo.close().await;
    assert!(repo.query(None, None).await.is_err());
    assert!(
        repo.append(sample_at(at("2024-05-01T10:00:00+08:00")))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn connect_creates_missing_parent_dirs() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/hostmon.db");
    let repo = hostmon::sample_repo::SampleRepo::connect(
        path.to_str().unwrap(),
        utc8(),
        std::time::Duration::from_secs(5),
    )
    .await
    .unwrap();
    repo.init().await.unwrap();
    assert!(path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_and_queries_stay_consistent() {
    const WRITERS: i64 = 40;
    const READERS: usize = 20;

    let (_dir, repo) = temp_repo(utc8()).await;
    let base = at("2024-05-01T10:00:00+08:00");

    let mut writes = Vec::new();
    for i in 0..WRITERS {
        let repo = Arc::clone(&repo);
        writes.push(tokio::spawn(async move {
            repo.append(sample_at(base + TimeDelta::seconds(i)))
                .await
                .unwrap()
        }));
    }
    let mut reads = Vec::new();
    for _ in 0..READERS {
        let repo = Arc::clone(&repo);
        reads.push(tokio::spawn(async move { repo.query(None, None).await.unwrap() }));
    }

    let mut appended = Vec::new();
    for w in writes {
        appended.push(w.await.unwrap());
    }
    for r in reads {
        let snapshot = r.await.unwrap();
        // Every read sees a consistent prefix: unique ids in ascending order.
        assert!(snapshot.windows(2).all(|w| w[0].id < w[1].id));
    }

    let ids: HashSet<i64> = appended.iter().map(|s| s.id).collect();
    assert_eq!(ids.len(), WRITERS as usize);

    let all = repo
        .query(Some(base), Some(base + TimeDelta::seconds(WRITERS)))
        .await
        .unwrap();
    assert_eq!(all.len(), WRITERS as usize);
    for s in &appended {
        let stored = all.iter().find(|x| x.id == s.id).unwrap();
        assert_eq!(stored, s);
    }
}
