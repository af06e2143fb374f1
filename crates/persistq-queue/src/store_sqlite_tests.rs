
use super::*;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_create_and_fetch() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let id = store.create_job(&json!({"n": 1}), "t1").await.unwrap();

    let job = store.fetch_job().await.unwrap().unwrap();
    assert_eq!(job.id, id);
    assert_eq!(job.task, "t1");
    assert_eq!(job.data, json!({"n": 1}));
    assert_eq!(job.attempts, 0);
}

#[tokio::test]
async fn test_fetch_empty() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    assert!(store.fetch_job().await.unwrap().is_none());
    assert!(store.fetch_job_for_task("t1").await.unwrap().is_none());
    assert_eq!(store.fetch_job_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_fifo_order_independent_of_task() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let tasks = ["b", "a", "c", "a", "b"];
    for (i, task) in tasks.iter().enumerate() {
        store.create_job(&json!(i), task).await.unwrap();
    }

    for i in 0..tasks.len() {
        let job = store.fetch_job().await.unwrap().unwrap();
        assert_eq!(job.data, json!(i));
        assert_eq!(job.task, tasks[i]);
        store.remove_job(job.id).await.unwrap();
    }
    assert!(store.fetch_job().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_does_not_mutate() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    store.create_job(&json!("x"), "t").await.unwrap();

    let first = store.fetch_job().await.unwrap().unwrap();
    let second = store.fetch_job().await.unwrap().unwrap();
    assert_eq!(first, second);
    assert_eq!(store.fetch_job_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_fetch_job_for_task_round_trip() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let payload = json!({
        "url": "https://example.com/upload",
        "headers": {"x-trace": "abc"},
        "parts": [1, 2.5, "three", null, true],
    });
    store.create_job(&json!("other"), "other").await.unwrap();
    store.create_job(&payload, "T").await.unwrap();
    store.create_job(&json!("later"), "T").await.unwrap();

    let job = store.fetch_job_for_task("T").await.unwrap().unwrap();
    assert_eq!(job.data, payload);
    assert!(store.fetch_job_for_task("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_job_exists_for_task() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    assert!(!store.job_exists_for_task("sync").await.unwrap());

    let id = store.create_job(&json!({}), "sync").await.unwrap();
    assert!(store.job_exists_for_task("sync").await.unwrap());
    assert!(!store.job_exists_for_task("other").await.unwrap());

    store.remove_job(id).await.unwrap();
    assert!(!store.job_exists_for_task("sync").await.unwrap());
}

#[tokio::test]
async fn test_increment_attempt() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let id = store.create_job(&json!(1), "t").await.unwrap();

    store.increment_attempt_for_job(id).await.unwrap();
    store.increment_attempt_for_job(id).await.unwrap();

    let job = store.fetch_job().await.unwrap().unwrap();
    assert_eq!(job.attempts, 2);
}

#[tokio::test]
async fn test_increment_missing_is_noop() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    store.increment_attempt_for_job(JobId(999)).await.unwrap();
    assert_eq!(store.fetch_job_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_remove_is_idempotent() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let id = store.create_job(&json!(1), "t").await.unwrap();

    store.remove_job(id).await.unwrap();
    store.remove_job(id).await.unwrap();
    assert_eq!(store.fetch_job_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_remove_all_jobs() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    for i in 0..5 {
        store.create_job(&json!(i), "t").await.unwrap();
    }
    assert_eq!(store.fetch_job_count().await.unwrap(), 5);

    store.remove_all_jobs().await.unwrap();
    assert_eq!(store.fetch_job_count().await.unwrap(), 0);
    assert!(store.fetch_job().await.unwrap().is_none());
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    let first = store.create_job(&json!(1), "t").await.unwrap();
    store.remove_job(first).await.unwrap();

    let second = store.create_job(&json!(2), "t").await.unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn test_filter_delete_all_and_keep_all() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    for i in 0..4 {
        store.create_job(&json!(i), "t").await.unwrap();
    }

    let removed = store.filter_queue(Box::new(|_| FilterAction::Keep)).await.unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.fetch_job_count().await.unwrap(), 4);

    let removed = store.filter_queue(Box::new(|_| FilterAction::Delete)).await.unwrap();
    assert_eq!(removed, 4);
    assert_eq!(store.fetch_job_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_filter_visits_each_row_once() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let store = SqliteJobStore::in_memory().await.unwrap();
    for i in 0..6 {
        store.create_job(&json!({"n": i}), "t").await.unwrap();
    }

    let visits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&visits);
    let removed = store
        .filter_queue(Box::new(move |data| {
            counter.fetch_add(1, Ordering::SeqCst);
            if data["n"].as_i64().unwrap_or(0) % 2 == 0 {
                FilterAction::Delete
            } else {
                FilterAction::Keep
            }
        }))
        .await
        .unwrap();

    assert_eq!(visits.load(Ordering::SeqCst), 6);
    assert_eq!(removed, 3);

    let next = store.fetch_job().await.unwrap().unwrap();
    assert_eq!(next.data, json!({"n": 1}));
}

#[tokio::test]
async fn test_corrupt_row_reported() {
    let store = SqliteJobStore::in_memory().await.unwrap();
    store
        .conn
        .call(|conn| {
            conn.execute("INSERT INTO queue (task, data) VALUES ('t', x'7b7b')", [])?;
            Ok(())
        })
        .await
        .unwrap();

    let err = store.fetch_job().await.unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }));

    // Filtering keeps the undecodable row instead of failing.
    let removed = store.filter_queue(Box::new(|_| FilterAction::Delete)).await.unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.fetch_job_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_persistence_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("queue.db");

    {
        let store = SqliteJobStore::open(&path).await.unwrap();
        let id = store.create_job(&json!({"keep": true}), "durable").await.unwrap();
        store.increment_attempt_for_job(id).await.unwrap();
    }

    let store = SqliteJobStore::open(&path).await.unwrap();
    let job = store.fetch_job_for_task("durable").await.unwrap().unwrap();
    assert_eq!(job.data, json!({"keep": true}));
    assert_eq!(job.attempts, 1);
    assert_eq!(store.fetch_job_count().await.unwrap(), 1);
}
