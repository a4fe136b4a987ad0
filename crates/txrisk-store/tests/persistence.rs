//! Persistence round-trips against on-disk SQLite databases

use proptest::prelude::*;
use tempfile::TempDir;
use txrisk_domain::traits::AnalysisStore;
use txrisk_domain::{TransactionAnalysis, TransactionInput, TransactionRecord, NOT_AVAILABLE};
use txrisk_store::SqliteStore;

fn sample_analysis() -> TransactionAnalysis {
    let mut analysis = TransactionAnalysis {
        sender: "Acme Corporation".to_string(),
        receiver: "SovCo Capital Partners".to_string(),
        amount: "250000".to_string(),
        currency: "USD".to_string(),
        transaction_type: "Funds Transfer".to_string(),
        transaction_date: NOT_AVAILABLE.to_string(),
        risk_score: 65,
        risk_level: "Moderate Risk".to_string(),
        confidence_score: 0.95,
        category: "Corporation".to_string(),
        notes: vec![
            "Entity Type: Corporation".to_string(),
            "Reason: linked to Socombank PJSC".to_string(),
        ],
    };
    analysis.append_reasoning("The receiver is owned by sanctioned individuals.");
    analysis
}

#[test]
fn test_analysis_round_trip_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("transactions.db");

    let input = TransactionInput::new("", Some("Wire transfer to SovCo Capital Partners".to_string()));
    let record = TransactionRecord::from_input(&input, "2026-10-18T09:30:00.000000Z");
    let analysis = sample_analysis();

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.save(&record, &analysis, false).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let loaded = store.load(&record.id).unwrap().expect("stored transaction");

    assert_eq!(loaded.transaction, record);
    assert_eq!(loaded.analysis, analysis);
    assert!(!loaded.degraded);
    assert_eq!(
        loaded.analysis.notes.last().unwrap(),
        "Thought process: The receiver is owned by sanctioned individuals."
    );
}

#[test]
fn test_degraded_flag_is_persisted() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let input = TransactionInput::new("payment", None);
    let record = TransactionRecord::from_input(&input, "2026-10-18T09:30:00Z");

    store
        .save(&record, &TransactionAnalysis::default(), true)
        .unwrap();

    let loaded = store.load(&record.id).unwrap().unwrap();
    assert!(loaded.degraded);
    assert_eq!(loaded.analysis, TransactionAnalysis::default());
}

#[test]
fn test_recent_lists_records() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let first = TransactionRecord::from_input(&TransactionInput::new("first", None), "2026-10-18T09:00:00Z");
    let second = TransactionRecord::from_input(&TransactionInput::new("second", None), "2026-10-18T10:00:00Z");
    store.save(&first, &sample_analysis(), false).unwrap();
    store.save(&second, &sample_analysis(), false).unwrap();

    let recent = store.recent(10).unwrap();
    assert_eq!(recent, vec![second, first]);
}

proptest! {
    #[test]
    fn confidence_survives_storage_exactly(confidence in 0.0f64..=1.0) {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let record = TransactionRecord::from_input(
            &TransactionInput::new("payment", None),
            "2026-10-18T09:30:00Z",
        );
        let analysis = TransactionAnalysis {
            confidence_score: confidence,
            ..sample_analysis()
        };

        store.save(&record, &analysis, false).unwrap();
        let loaded = store.load(&record.id).unwrap().unwrap();

        prop_assert_eq!(loaded.analysis.confidence_score.to_bits(), confidence.to_bits());
        prop_assert_eq!(loaded.analysis, analysis);
    }
}
