mod common;

use autopay_core::{ConfigError, SubmissionOutcome, WalletError, WalletStore};
use common::FakeLoader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_load_phrase_is_deterministic() {
    let store = WalletStore::new();
    let first = store
        .load_phrase(&FakeLoader, "alpha bravo charlie")
        .unwrap();
    let second = store
        .load_phrase(&FakeLoader, "alpha bravo charlie")
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(store.snapshot().public_id(), Some(first.as_str()));
}

#[test]
fn test_invalid_phrase_leaves_keypair_unchanged() {
    let store = WalletStore::new();
    let loaded = store.load_phrase(&FakeLoader, "alpha bravo").unwrap();
    let generation = store.snapshot().generation;
    store.record_result(
        generation,
        SubmissionOutcome::from_result(&loaded, Ok("h".into())),
    );

    let err = store
        .load_phrase(&FakeLoader, "bad phrase here")
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidPhrase { .. }));

    let snap = store.snapshot();
    assert_eq!(snap.public_id(), Some(loaded.as_str()));
    assert!(snap.last_result.is_some());
}

#[test]
fn test_configure_rejects_bad_amounts() {
    let store = WalletStore::new();
    store.configure("GDEST", "5", "hello").unwrap();

    for amount in ["abc", "-1", "0", "1e5", ""] {
        let err = store.configure("GOTHER", amount, "x").unwrap_err();
        assert_eq!(err.field(), "amount", "amount {:?}", amount);
    }
    assert_eq!(
        store.configure("", "1", "").unwrap_err(),
        ConfigError::missing("destination")
    );

    let config = store.snapshot().send_config.unwrap();
    assert_eq!(
        (config.destination(), config.amount(), config.memo()),
        ("GDEST", "5", "hello")
    );
}

#[test]
fn test_concurrent_reconfiguration_is_never_torn() {
    let store = Arc::new(WalletStore::new());
    store.configure("GAAA", "1", "a").unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..2)
        .map(|i| {
            let store = store.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    if i == 0 {
                        store.configure("GAAA", "1", "a").unwrap();
                    } else {
                        store.configure("GBBB", "2", "b").unwrap();
                    }
                    store.toggle_armed();
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..20_000 {
                    let config = store.snapshot().send_config.unwrap();
                    let pair = (config.destination(), config.amount(), config.memo());
                    assert!(
                        pair == ("GAAA", "1", "a") || pair == ("GBBB", "2", "b"),
                        "torn config: {:?}",
                        pair
                    );
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    for writer in writers {
        writer.join().unwrap();
    }
}
