//! Integration tests for the preprocessing engine.
//!
//! These drive the engine end to end through the in-memory and filesystem
//! collaborators using the fixtures under `tests/fixtures`.

use chartloom_processing::pipeline::processed_artifact_path;
use chartloom_processing::{
    ColumnKind, Engine, EngineConfig, FsStorage, ImputationStrategy, JsonRecordStore,
    MemoryRecordStore, MemoryStorage, ObjectStorage, PreprocessingStatus, RecordStore,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> Vec<u8> {
    std::fs::read(fixtures_path().join(filename)).expect("Failed to read fixture")
}

struct Harness {
    engine: Engine,
    storage: Arc<MemoryStorage>,
    records: Arc<MemoryRecordStore>,
}

fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

fn harness_with(config: EngineConfig) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let records = Arc::new(MemoryRecordStore::new());
    let engine = Engine::builder()
        .config(config)
        .storage(storage.clone())
        .records(records.clone())
        .build()
        .unwrap();
    Harness {
        engine,
        storage,
        records,
    }
}

fn download_text(storage: &dyn ObjectStorage, path: &str) -> String {
    String::from_utf8(storage.download(path).unwrap()).unwrap()
}

// ============================================================================
// Cleaning Pass
// ============================================================================

#[test]
fn test_reference_scenario_end_to_end() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "ref.csv", b"a,b\n1,x\n,y\n1,x\n3,\n")
        .unwrap();

    let result = h.engine.apply("u1", &record.id).unwrap();

    assert!(result.success);
    assert_eq!(result.original_row_count, 4);
    assert_eq!(result.processed_row_count, 3);
    assert_eq!(result.metadata.changes.duplicates_removed, 1);
    assert_eq!(result.metadata.changes.cells_imputed, 2);
    assert_eq!(result.metadata.changes.empty_rows_removed, 0);

    let updated = h.engine.dataset("u1", &record.id).unwrap();
    assert_eq!(
        download_text(h.storage.as_ref(), &updated.file_path),
        "\"a\",\"b\"\n\"1\",\"x\"\n\"1\",\"y\"\n\"3\",\"x\"\n"
    );
}

#[test]
fn test_messy_fixture_counters_and_column_changes() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();
    assert_eq!(record.row_count, 7);

    let preview = h.engine.preview("u1", &record.id).unwrap();

    assert_eq!(preview.original.row_count, 7);
    assert_eq!(preview.processed.row_count, 5);
    assert_eq!(preview.changes.empty_rows_removed, 1);
    assert_eq!(preview.changes.duplicates_removed, 1);
    assert_eq!(preview.changes.cells_imputed, 3);

    let summary: Vec<(&str, ColumnKind, usize, usize, Option<&str>)> = preview
        .column_changes
        .iter()
        .map(|c| {
            (
                c.name.as_str(),
                c.kind,
                c.missing_before,
                c.missing_after,
                c.imputation_value.as_deref(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("region", ColumnKind::Categorical, 1, 0, Some("North")),
            ("units", ColumnKind::Numeric, 2, 0, Some("10")),
            ("price", ColumnKind::Numeric, 2, 0, Some("2.5")),
            ("note", ColumnKind::Categorical, 2, 0, Some("ok")),
        ]
    );

    assert_eq!(
        preview.processed.sample.rows,
        vec![
            vec!["North", "10", "2.5", "ok"],
            vec!["South", "10", "3.0", "ok"],
            vec!["East", "7", "2.5", "late"],
            vec!["West", "12", "4.0", "ok"],
            vec!["North", "abc", "2.0", "ok"],
        ]
    );
}

#[test]
fn test_mismatched_cell_survives_and_is_profiled() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    let profile = h.engine.profile("u1", &record.id, None).unwrap();
    let units = &profile.columns[1];

    assert_eq!(units.kind, ColumnKind::Numeric);
    assert_eq!(units.total_count, 7);
    assert_eq!(units.valid_count, 4);
    assert_eq!(units.missing_count, 2);
    assert_eq!(units.mismatched_count, 1);

    let numeric = units.numeric.as_ref().unwrap();
    assert_eq!(numeric.min, 7.0);
    assert_eq!(numeric.max, 12.0);
    assert_eq!(numeric.mean, 9.75);
}

#[test]
fn test_quoted_crlf_fixture_with_byte_order_mark() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "cities.csv", &load_fixture("quoted_crlf.csv"))
        .unwrap();
    assert_eq!(record.row_count, 3);

    let preview = h.engine.preview("u1", &record.id).unwrap();
    assert_eq!(
        preview.original.sample.headers,
        vec!["city", "population, est", "rating"]
    );
    assert_eq!(preview.original.sample.rows[0][0], "Springfield, IL");
    assert_eq!(preview.changes.cells_imputed, 2);

    let fills: Vec<Option<&str>> = preview
        .column_changes
        .iter()
        .map(|c| c.imputation_value.as_deref())
        .collect();
    assert_eq!(fills, vec![Some("Springfield, IL"), Some("658125"), Some("3.5")]);
}

// ============================================================================
// Preview / Apply Contract
// ============================================================================

#[test]
fn test_preview_matches_apply() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    let preview = h.engine.preview("u1", &record.id).unwrap();
    let applied = h.engine.apply("u1", &record.id).unwrap();

    assert_eq!(preview.changes, applied.metadata.changes);
    assert_eq!(preview.column_changes, applied.metadata.column_changes);
    assert_eq!(preview.original.row_count, applied.original_row_count);
    assert_eq!(preview.processed.row_count, applied.processed_row_count);
}

#[test]
fn test_preview_does_not_persist() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();
    let paths_before = h.storage.paths();

    h.engine.preview("u1", &record.id).unwrap();

    assert_eq!(h.storage.paths(), paths_before);
    assert_eq!(h.records.get_dataset_by_id(&record.id).unwrap().unwrap(), record);
}

#[test]
fn test_second_apply_is_a_fixed_point() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    let first = h.engine.apply("u1", &record.id).unwrap();
    let after_first = h.engine.dataset("u1", &record.id).unwrap();
    let first_text = download_text(h.storage.as_ref(), &after_first.file_path);

    let second = h.engine.apply("u1", &record.id).unwrap();
    let after_second = h.engine.dataset("u1", &record.id).unwrap();

    assert!(second.metadata.changes.is_noop());
    assert_eq!(second.original_row_count, first.processed_row_count);
    assert_eq!(second.processed_row_count, first.processed_row_count);
    assert_eq!(
        download_text(h.storage.as_ref(), &after_second.file_path),
        first_text
    );
    assert_eq!(after_second.revision, 2);
}

#[test]
fn test_apply_updates_record_and_keeps_raw_upload() {
    let h = harness();
    let raw = load_fixture("sales_messy.csv");
    let record = h.engine.register("u1", "sales_messy.csv", &raw).unwrap();
    assert_eq!(record.preprocessing_status, PreprocessingStatus::Pending);

    h.engine.apply("u1", &record.id).unwrap();
    h.engine.apply("u1", &record.id).unwrap();

    let updated = h.engine.dataset("u1", &record.id).unwrap();
    assert_eq!(updated.preprocessing_status, PreprocessingStatus::Completed);
    assert_eq!(updated.row_count, 5);
    assert_eq!(updated.file_path, processed_artifact_path(&record.id, 2));
    assert!(updated.preprocessing_metadata.is_some());

    assert_eq!(h.storage.download(&record.original_file_path).unwrap(), raw);
    assert!(!h.storage.contains(&processed_artifact_path(&record.id, 1)));
    assert_eq!(
        h.storage.content_type(&updated.file_path).as_deref(),
        Some("text/csv")
    );
}

#[test]
fn test_storage_failure_leaves_record_pointing_at_old_artifact() {
    let h = harness();
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    h.storage.set_fail_uploads(true);
    let err = h.engine.apply("u1", &record.id).unwrap_err();

    assert_eq!(err.error_code(), "STORAGE_ERROR");
    assert!(err.is_retryable());
    assert_eq!(h.engine.dataset("u1", &record.id).unwrap(), record);

    // The caller retries the whole operation once storage recovers.
    h.storage.set_fail_uploads(false);
    let result = h.engine.apply("u1", &record.id).unwrap();
    assert_eq!(result.processed_row_count, 5);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_error_taxonomy() {
    let h = harness();
    let record = h.engine.register("owner", "a.csv", b"a\n1\n").unwrap();

    let cases = [
        (h.engine.preview("  ", &record.id).unwrap_err(), "UNAUTHORIZED", 401),
        (h.engine.apply("other", &record.id).unwrap_err(), "NOT_FOUND", 404),
        (h.engine.preview("owner", "ds_999").unwrap_err(), "NOT_FOUND", 404),
        (
            h.engine.register("owner", "a.xlsx", b"a\n1\n").unwrap_err(),
            "UNSUPPORTED_FORMAT",
            422,
        ),
        (
            h.engine.register("owner", "a.csv", b"a,b,c\n").unwrap_err(),
            "EMPTY_SOURCE",
            422,
        ),
    ];

    for (err, code, status) in cases {
        assert_eq!(err.error_code(), code, "{err}");
        assert_eq!(err.http_status(), status, "{err}");
        assert!(!err.is_retryable(), "{err}");
    }
}

#[test]
fn test_error_serializes_code_and_message() {
    let h = harness();
    let err = h.engine.apply("u1", "ds_42").unwrap_err();
    let json = serde_json::to_value(&err).unwrap();

    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["message"].as_str().unwrap().contains("ds_42"));
}

#[test]
fn test_unsupported_artifact_in_record_store() {
    let h = harness();
    h.storage
        .upload("uploads/u1/book.xlsx", b"a\n1\n", "application/octet-stream")
        .unwrap();
    let record = h
        .records
        .create_dataset(chartloom_processing::NewDataset {
            user_id: "u1".to_string(),
            name: "book.xlsx".to_string(),
            file_path: "uploads/u1/book.xlsx".to_string(),
            row_count: 1,
        })
        .unwrap();

    let err = h.engine.preview("u1", &record.id).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_disabled_steps_are_respected() {
    let config = EngineConfig::builder()
        .impute_missing(false)
        .remove_duplicates(false)
        .build()
        .unwrap();
    let h = harness_with(config);
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    let preview = h.engine.preview("u1", &record.id).unwrap();

    assert_eq!(preview.changes.cells_imputed, 0);
    assert_eq!(preview.changes.duplicates_removed, 0);
    assert_eq!(preview.changes.empty_rows_removed, 1);
    assert_eq!(preview.processed.row_count, 6);
    assert!(
        preview
            .column_changes
            .iter()
            .all(|c| c.imputation_strategy == ImputationStrategy::Disabled)
    );
    assert_eq!(preview.column_changes[1].missing_after, 1);
}

#[test]
fn test_preview_rows_config_limits_samples() {
    let config = EngineConfig::builder().preview_rows(2).build().unwrap();
    let h = harness_with(config);
    let record = h
        .engine
        .register("u1", "sales_messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();

    let preview = h.engine.preview("u1", &record.id).unwrap();
    assert_eq!(preview.original.sample.rows.len(), 2);
    assert_eq!(preview.processed.sample.rows.len(), 2);
    assert_eq!(preview.processed.row_count, 5);
}

// ============================================================================
// Filesystem Collaborators
// ============================================================================

#[test]
fn test_filesystem_backends_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let objects = dir.path().join("objects");
    let records_path = dir.path().join("datasets.json");

    let build = || {
        Engine::builder()
            .storage(Arc::new(FsStorage::new(&objects)))
            .records(Arc::new(JsonRecordStore::new(&records_path)))
            .build()
            .unwrap()
    };

    let record = build()
        .register("alice", "sales messy.csv", &load_fixture("sales_messy.csv"))
        .unwrap();
    assert!(record.file_path.ends_with("/sales_messy.csv"));
    assert!(objects.join(&record.file_path).exists());

    // A fresh engine sees the persisted record.
    let applied = build().apply("alice", &record.id).unwrap();
    assert_eq!(applied.processed_row_count, 5);

    let artifact = objects.join(processed_artifact_path(&record.id, 1));
    let text = std::fs::read_to_string(&artifact).unwrap();
    assert!(text.starts_with("\"region\",\"units\",\"price\",\"note\"\n"));
    assert_eq!(text.lines().count(), 6);

    let reloaded = build().dataset("alice", &record.id).unwrap();
    assert_eq!(reloaded.preprocessing_status, PreprocessingStatus::Completed);
    assert_eq!(reloaded.original_row_count, 7);
}

#[test]
fn test_concurrent_applies_on_different_datasets() {
    let h = harness();
    let engine = Arc::new(h.engine);
    let ids: Vec<String> = (0..4)
        .map(|i| {
            let text = format!("k,v\n{i},a\n{i},a\n,b\n");
            engine
                .register("u1", &format!("d{i}.csv"), text.as_bytes())
                .unwrap()
                .id
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.apply("u1", &id).unwrap())
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert_eq!(result.original_row_count, 3);
        assert_eq!(result.processed_row_count, 2);
    }
}
