//! Concurrent ledger access tests
//!
//! These tests verify that racing operations against the shared store can
//! never manufacture or double-spend money. The store serializes all
//! writes, and conditional updates guard every debit, so of two
//! withdrawals that only one balance can fund, exactly one may succeed.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;

use rust_decimal::Decimal;
use tempfile::TempDir;

use tillbook_core::adapters::argon2::Argon2Verifier;
use tillbook_core::adapters::duckdb::DuckDbStore;
use tillbook_core::domain::{Account, TransactionKind};
use tillbook_core::ports::LedgerStore;
use tillbook_core::services::{LedgerEngine, DEFAULT_LOAN_LIMIT};
use tillbook_core::Error;

/// Number of concurrent threads for stress tests.
/// Keep this realistic - a branch has a handful of tellers, not hundreds.
const THREAD_COUNT: usize = 6;

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn create_engine(dir: &TempDir) -> (LedgerEngine, Arc<DuckDbStore>) {
    let store = Arc::new(
        DuckDbStore::new(&dir.path().join("test.duckdb")).expect("Failed to create store"),
    );
    store.ensure_schema().expect("Failed to initialize schema");
    let engine = LedgerEngine::new(
        store.clone(),
        Arc::new(Argon2Verifier::new()),
        Decimal::new(DEFAULT_LOAN_LIMIT, 0),
    );
    (engine, store)
}

fn insert_account(store: &DuckDbStore, number: &str) {
    store
        .insert_account(&Account::new(number, format!("Holder {number}"), "$x"))
        .unwrap();
}

/// Two concurrent withdrawals against one funding: exactly one succeeds
#[test]
fn test_racing_withdrawals_cannot_both_succeed() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = create_engine(&dir);
    insert_account(&store, "aaaaaaaaaa");
    engine.deposit("aaaaaaaaaa", dec(100000)).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = vec![];

    // Each withdrawal alone is funded; both together are not
    for _ in 0..2 {
        let engine = engine.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.withdraw("aaaaaaaaaa", dec(60000))
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(Error::InsufficientFunds)))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);
    assert_eq!(
        store.get_account("aaaaaaaaaa").unwrap().unwrap().balance,
        dec(40000)
    );
}

/// Concurrent deposits from many tellers all land; the final balance is the sum
#[test]
fn test_concurrent_deposits_all_land() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = create_engine(&dir);
    insert_account(&store, "aaaaaaaaaa");

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let mut handles = vec![];

    for _ in 0..THREAD_COUNT {
        let engine = engine.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..5 {
                engine.deposit("aaaaaaaaaa", dec(1000)).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = dec(1000) * Decimal::from(THREAD_COUNT * 5);
    assert_eq!(
        store.get_account("aaaaaaaaaa").unwrap().unwrap().balance,
        expected
    );
    assert_eq!(
        store.count_transactions().unwrap(),
        (THREAD_COUNT * 5) as i64
    );
}

/// Transfers running against opposing transfers conserve total money
#[test]
fn test_opposing_transfers_conserve_money() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = create_engine(&dir);
    insert_account(&store, "aaaaaaaaaa");
    insert_account(&store, "bbbbbbbbbb");
    engine.deposit("aaaaaaaaaa", dec(50000)).unwrap();
    engine.deposit("bbbbbbbbbb", dec(50000)).unwrap();

    let barrier = Arc::new(Barrier::new(THREAD_COUNT));
    let mut handles = vec![];

    for i in 0..THREAD_COUNT {
        let engine = engine.clone();
        let barrier = Arc::clone(&barrier);
        let (source, target) = if i % 2 == 0 {
            ("aaaaaaaaaa", "bbbbbbbbbb")
        } else {
            ("bbbbbbbbbb", "aaaaaaaaaa")
        };
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..5 {
                // Individual legs may fail on funds; that is fine, they
                // must just never half-apply
                let _ = engine.transfer(source, target, dec(7000));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let a = store.get_account("aaaaaaaaaa").unwrap().unwrap().balance;
    let b = store.get_account("bbbbbbbbbb").unwrap().unwrap().balance;
    assert_eq!(a + b, dec(100000));
    assert!(a >= Decimal::ZERO);
    assert!(b >= Decimal::ZERO);

    // Every TRANSFER_OUT has its TRANSFER_IN
    let records = store
        .list_transactions(&tillbook_core::TransactionFilter {
            kind_contains: Some("TRANSFER".to_string()),
            ..Default::default()
        })
        .unwrap();
    let outs = records
        .iter()
        .filter(|r| r.kind == TransactionKind::TransferOut)
        .count();
    let ins = records
        .iter()
        .filter(|r| r.kind == TransactionKind::TransferIn)
        .count();
    assert_eq!(outs, ins);
}

/// Racing repayments against one loan never push remaining below zero
#[test]
fn test_racing_repayments_respect_loan_floor() {
    let dir = TempDir::new().unwrap();
    let (engine, store) = create_engine(&dir);
    insert_account(&store, "aaaaaaaaaa");
    engine.deposit("aaaaaaaaaa", dec(100000)).unwrap();
    engine.apply_for_loan("aaaaaaaaaa", dec(10000)).unwrap();

    let barrier = Arc::new(Barrier::new(3));
    let mut handles = vec![];
    for _ in 0..3 {
        let engine = engine.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            engine.repay_loan("aaaaaaaaaa", dec(6000))
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    // 10000 remaining funds at most one 6000 repayment
    assert_eq!(successes, 1);

    let loan = &store.loans_for_account("aaaaaaaaaa").unwrap()[0];
    assert_eq!(loan.remaining, dec(4000));
    assert!(loan.remaining >= Decimal::ZERO);
}
