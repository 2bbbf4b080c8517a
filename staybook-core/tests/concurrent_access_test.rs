//! Concurrent upload tests
//!
//! Several uploads race on the same collection with overlapping booking ids.
//! Every id must end up stored exactly once, whichever upload wins.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

use staybook_core::adapters::duckdb::DuckDbStore;
use staybook_core::adapters::memory::InMemoryStore;
use staybook_core::config::{ImportSettings, StoreConfig};
use staybook_core::services::ImportService;
use staybook_core::{StoreGateway, Upload};

/// Number of concurrent uploads
const THREAD_COUNT: usize = 6;

/// Rows per upload; consecutive uploads share half of their ids
const ROWS_PER_UPLOAD: usize = 8;

fn csv_for(thread_id: usize) -> String {
    let mut csv = String::from("Code de confirmation,Date de début,Voyageur,Montant\n");
    let first = thread_id * ROWS_PER_UPLOAD / 2;
    for n in first..first + ROWS_PER_UPLOAD {
        csv.push_str(&format!("HM{:03},08/{:02}/2025,Guest {},100\n", n, n % 28 + 1, n));
    }
    csv
}

fn expected_ids() -> HashSet<String> {
    (0..THREAD_COUNT)
        .flat_map(|t| {
            let first = t * ROWS_PER_UPLOAD / 2;
            (first..first + ROWS_PER_UPLOAD).map(|n| format!("HM{:03}", n))
        })
        .collect()
}

/// Run one upload per thread, all released at once. Returns the total number
/// of rows the uploads reported as appended.
fn race_uploads(store: Arc<dyn StoreGateway>) -> usize {
    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let appended = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for thread_id in 0..THREAD_COUNT {
        let barrier = Arc::clone(&barrier);
        let appended = Arc::clone(&appended);
        let service = ImportService::new(Arc::clone(&store), ImportSettings::default());

        handles.push(thread::spawn(move || {
            barrier.wait();
            let outcome = service.upload(Upload::new("export.csv", csv_for(thread_id)));
            assert!(outcome.success, "Thread {}: {:?}", thread_id, outcome.error);
            let summary = outcome.summary.unwrap();
            // Every row is either written or reported as a duplicate
            assert_eq!(summary.appended + summary.duplicates.len(), ROWS_PER_UPLOAD);
            appended.fetch_add(summary.appended, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    appended.load(Ordering::SeqCst)
}

#[test]
fn test_concurrent_uploads_in_memory_store_each_id_once() {
    let store = Arc::new(InMemoryStore::new("Data"));
    let appended = race_uploads(store.clone());

    let expected = expected_ids();
    let rows = store.rows();
    let stored: Vec<String> = rows.iter().map(|r| r[0].as_text().unwrap()).collect();
    let unique: HashSet<String> = stored.iter().cloned().collect();

    assert_eq!(stored.len(), expected.len(), "an id was stored twice");
    assert_eq!(unique, expected);
    assert_eq!(appended, expected.len());
}

#[test]
fn test_concurrent_uploads_duckdb_store_each_id_once() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(
        DuckDbStore::open(&StoreConfig {
            database_path: temp_dir.path().join("concurrent.duckdb"),
            collection: "Data".to_string(),
        })
        .unwrap(),
    );
    let appended = race_uploads(store.clone());

    let expected = expected_ids();
    let stored: Vec<String> = store
        .read_rows()
        .unwrap()
        .into_iter()
        .map(|r| r[0].clone().unwrap())
        .collect();
    let unique: HashSet<String> = stored.iter().cloned().collect();

    assert_eq!(stored.len(), expected.len(), "an id was stored twice");
    assert_eq!(unique, expected);
    assert_eq!(appended, expected.len());
}
