//! Conformance suite shared by every TransactionRepository implementation.
//! Each scenario uses freshly generated ids, so scenarios never see each
//! other's data even when they share a database.
#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use ledger_store::db::object_id;
use ledger_store::{
    Repository, RepositoryError, Transaction, TransactionFilter, TransactionPatch,
    TransactionRepository, TransactionType,
};
use serde_json::{json, Value};
use std::str::FromStr;

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// Ids of one user's world.
#[derive(Clone)]
pub struct Ledger {
    pub user_id: String,
    pub account_id: String,
    pub category_a: String,
    pub category_b: String,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            user_id: object_id::generate(),
            account_id: object_id::generate(),
            category_a: object_id::generate(),
            category_b: object_id::generate(),
        }
    }

    pub fn tx(
        &self,
        category_id: &str,
        transaction_type: TransactionType,
        amount: &str,
        occurred_at: DateTime<Utc>,
    ) -> Transaction {
        Transaction::new(
            self.user_id.clone(),
            self.account_id.clone(),
            category_id.to_string(),
            transaction_type,
            dec(amount),
            occurred_at,
        )
    }
}

pub async fn create_then_get_returns_equal_entity<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger
        .tx(&ledger.category_a, TransactionType::Transfer, "250.75", at(2024, 5, 2, 9))
        .with_transfer_account(object_id::generate())
        .with_description("savings");

    let created = repo.create(tx.clone()).await.unwrap();
    assert_eq!(created, tx);

    let fetched = repo.get(tx.id.as_str()).await.unwrap().expect("transaction stored");
    assert_eq!(fetched, tx);
    assert_eq!(fetched.amount.to_string(), "250.75");
}

pub async fn create_keeps_full_precision_amounts<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let c = ledger.category_a.as_str();
    let first = ledger.tx(
        c,
        TransactionType::Income,
        "1234567890123456789012345678901234",
        at(2024, 8, 1, 9),
    );
    let second = ledger.tx(
        c,
        TransactionType::Income,
        "0.0000000000000000000000000000000001",
        at(2024, 9, 2, 9),
    );
    repo.create(first.clone()).await.unwrap();
    repo.create(second.clone()).await.unwrap();

    let fetched = repo.get(first.id.as_str()).await.unwrap().unwrap();
    assert_eq!(fetched.amount, first.amount);
    let fetched = repo.get(second.id.as_str()).await.unwrap().unwrap();
    assert_eq!(fetched.amount, second.amount);

    let total = repo
        .sum_for_category_period(&ledger.user_id, c, 2024, 8)
        .await
        .unwrap();
    assert_eq!(total, dec("1234567890123456789012345678901234"));
}

pub async fn create_without_transfer_account_reads_back_none<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let mut tx = ledger.tx(&ledger.category_a, TransactionType::Expense, "3", at(2024, 5, 2, 9));
    tx.transfer_account_id = Some(String::new());

    repo.create(tx.clone()).await.unwrap();
    let fetched = repo.get(tx.id.as_str()).await.unwrap().unwrap();
    assert_eq!(fetched.transfer_account_id, None);
}

pub async fn create_duplicate_is_rejected<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger.tx(&ledger.category_a, TransactionType::Expense, "1", at(2024, 1, 1, 0));

    repo.create(tx.clone()).await.unwrap();
    let err = repo.create(tx.clone()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(id) if id == tx.id));
}

pub async fn get_missing_and_malformed_ids<R: TransactionRepository>(repo: &R) {
    assert!(repo.get(object_id::generate().as_str()).await.unwrap().is_none());
    assert!(matches!(
        repo.get("not-an-object-id").await,
        Err(RepositoryError::InvalidId(_))
    ));
}

pub async fn update_with_empty_patch_is_get<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger.tx(&ledger.category_a, TransactionType::Expense, "12.00", at(2024, 2, 3, 4));
    repo.create(tx.clone()).await.unwrap();

    let empty = TransactionPatch::default();
    assert_eq!(repo.update(tx.id.as_str(), &empty).await.unwrap(), Some(tx.clone()));
    assert_eq!(repo.update(object_id::generate().as_str(), &empty).await.unwrap(), None);
}

pub async fn update_changes_only_present_fields<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger
        .tx(&ledger.category_a, TransactionType::Expense, "12.00", at(2024, 2, 3, 4))
        .with_description("lunch")
        .with_transfer_account(object_id::generate());
    repo.create(tx.clone()).await.unwrap();

    let patch = TransactionPatch {
        amount: Some(dec("15.25")),
        ..Default::default()
    };
    let updated = repo.update(tx.id.as_str(), &patch).await.unwrap().unwrap();
    let mut expected = tx.clone();
    expected.amount = dec("15.25");
    assert_eq!(updated, expected);
    assert_eq!(repo.get(tx.id.as_str()).await.unwrap(), Some(expected.clone()));

    let patch = TransactionPatch {
        category_id: Some(ledger.category_b.clone()),
        transfer_account_id: Some(None),
        description: Some(None),
        ..Default::default()
    };
    let updated = repo.update(tx.id.as_str(), &patch).await.unwrap().unwrap();
    expected.category_id = ledger.category_b.clone();
    expected.transfer_account_id = None;
    expected.description = None;
    assert_eq!(updated, expected);
}

pub async fn update_missing_returns_none<R: TransactionRepository>(repo: &R) {
    let patch = TransactionPatch {
        transaction_type: Some(TransactionType::Income),
        ..Default::default()
    };
    assert_eq!(repo.update(object_id::generate().as_str(), &patch).await.unwrap(), None);
}

pub async fn delete_removes_once<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger.tx(&ledger.category_a, TransactionType::Income, "7", at(2024, 7, 7, 7));
    repo.create(tx.clone()).await.unwrap();

    assert!(repo.delete(tx.id.as_str()).await.unwrap());
    assert!(repo.get(tx.id.as_str()).await.unwrap().is_none());
    assert!(!repo.delete(tx.id.as_str()).await.unwrap());
}

pub async fn list_is_sorted_and_filtered<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let other = Ledger::new();
    let transfer_account = object_id::generate();

    let jan = ledger.tx(&ledger.category_a, TransactionType::Expense, "10", at(2024, 1, 10, 12));
    let feb = ledger.tx(&ledger.category_b, TransactionType::Income, "20", at(2024, 2, 10, 12));
    let mar = ledger
        .tx(&ledger.category_a, TransactionType::Transfer, "30", at(2024, 3, 10, 12))
        .with_transfer_account(transfer_account.clone());
    let foreign = other.tx(&other.category_a, TransactionType::Expense, "40", at(2024, 2, 15, 12));

    for tx in [&feb, &jan, &foreign, &mar] {
        repo.create(tx.clone()).await.unwrap();
    }

    let mine = repo
        .list(&TransactionFilter::for_user(ledger.user_id.clone()))
        .await
        .unwrap();
    assert_eq!(mine, vec![mar.clone(), feb.clone(), jan.clone()]);

    let ranged = repo
        .list(&TransactionFilter {
            user_id: Some(ledger.user_id.clone()),
            date_from: Some(jan.occurred_at),
            date_to: Some(feb.occurred_at),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(ranged, vec![feb.clone(), jan.clone()]);

    let expenses = repo
        .list(&TransactionFilter {
            user_id: Some(ledger.user_id.clone()),
            transaction_type: Some("expense".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(expenses, vec![jan.clone()]);

    let by_category = repo
        .list(&TransactionFilter {
            category_id: Some(ledger.category_a.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_category, vec![mar.clone(), jan.clone()]);

    let by_transfer = repo
        .list(&TransactionFilter {
            transfer_account_id: Some(transfer_account),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_transfer, vec![mar.clone()]);

    let by_account = repo
        .list(&TransactionFilter {
            account_id: Some(other.account_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_account, vec![foreign]);

    let all = repo.list(&TransactionFilter::default()).await.unwrap();
    assert!(all
        .windows(2)
        .all(|pair| pair[0].occurred_at >= pair[1].occurred_at));
}

pub async fn list_from_params_skips_wrong_types<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let tx = ledger.tx(&ledger.category_a, TransactionType::Expense, "5", at(2024, 4, 4, 4));
    repo.create(tx.clone()).await.unwrap();

    let params = json!({
        "user_id": ledger.user_id,
        "account_id": 17,
        "date_to": true,
        "sort": "amount",
    });
    let filter = TransactionFilter::from_params(params.as_object().unwrap());
    assert_eq!(repo.list(&filter).await.unwrap(), vec![tx]);

    let filter = TransactionFilter {
        user_id: Some("bogus".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        repo.list(&filter).await,
        Err(RepositoryError::InvalidId(_))
    ));
}

pub async fn exists_for_account_checks_references<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    assert!(!repo.exists_for_account(&ledger.account_id).await.unwrap());

    repo.create(ledger.tx(&ledger.category_a, TransactionType::Expense, "1", at(2024, 1, 1, 1)))
        .await
        .unwrap();
    assert!(repo.exists_for_account(&ledger.account_id).await.unwrap());
}

pub async fn exists_for_category_respects_windows<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let c = ledger.category_a.as_str();
    repo.create(ledger.tx(c, TransactionType::Expense, "1", at(2024, 3, 31, 23)))
        .await
        .unwrap();
    repo.create(ledger.tx(c, TransactionType::Expense, "1", at(2024, 12, 31, 23)))
        .await
        .unwrap();

    assert!(repo.exists_for_category(c, None, None, None).await.unwrap());
    assert!(repo.exists_for_category(c, None, Some(2024), Some(3)).await.unwrap());
    assert!(!repo.exists_for_category(c, None, Some(2024), Some(4)).await.unwrap());
    assert!(repo.exists_for_category(c, None, Some(2024), Some(12)).await.unwrap());
    assert!(!repo.exists_for_category(c, None, Some(2025), Some(1)).await.unwrap());
    assert!(repo.exists_for_category(c, None, Some(2024), None).await.unwrap());
    assert!(!repo.exists_for_category(c, None, Some(2023), None).await.unwrap());
    // A month without a year is ignored.
    assert!(repo.exists_for_category(c, None, None, Some(6)).await.unwrap());
    assert!(matches!(
        repo.exists_for_category(c, None, Some(i32::MAX), Some(12)).await,
        Err(RepositoryError::InvalidPeriod { .. })
    ));

    assert!(repo
        .exists_for_category(c, Some(&ledger.user_id), Some(2024), Some(3))
        .await
        .unwrap());
    assert!(!repo
        .exists_for_category(c, Some(&object_id::generate()), Some(2024), Some(3))
        .await
        .unwrap());
    assert!(!repo
        .exists_for_category(&ledger.category_b, None, None, None)
        .await
        .unwrap());
}

pub async fn monthly_summary_groups_by_category_and_type<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let (a, b) = (ledger.category_a.as_str(), ledger.category_b.as_str());

    repo.create(ledger.tx(a, TransactionType::Expense, "10", at(2024, 1, 5, 10)))
        .await
        .unwrap();
    repo.create(ledger.tx(a, TransactionType::Expense, "15", at(2024, 1, 20, 10)))
        .await
        .unwrap();
    repo.create(ledger.tx(b, TransactionType::Income, "100", at(2024, 1, 31, 23)))
        .await
        .unwrap();
    // Outside the month, and another user's data in the same month.
    repo.create(ledger.tx(a, TransactionType::Expense, "999", at(2024, 2, 1, 0)))
        .await
        .unwrap();
    let other = Ledger::new();
    repo.create(other.tx(a, TransactionType::Expense, "5", at(2024, 1, 5, 10)))
        .await
        .unwrap();

    let summary = repo
        .aggregate_monthly_summary(&ledger.user_id, 2024, 1)
        .await
        .unwrap();
    let mut rows: Vec<(String, TransactionType, BigDecimal, i64)> = summary
        .into_iter()
        .map(|e| (e.category_id, e.transaction_type, e.total, e.count))
        .collect();
    rows.sort_by(|x, y| x.0.cmp(&y.0));

    let mut expected = vec![
        (a.to_string(), TransactionType::Expense, dec("25"), 2),
        (b.to_string(), TransactionType::Income, dec("100"), 1),
    ];
    expected.sort_by(|x, y| x.0.cmp(&y.0));
    assert_eq!(rows, expected);

    assert!(repo
        .aggregate_monthly_summary(&ledger.user_id, 2023, 1)
        .await
        .unwrap()
        .is_empty());
}

pub async fn sum_for_category_period_totals_one_month<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    let a = ledger.category_a.as_str();

    let empty = repo
        .sum_for_category_period(&ledger.user_id, a, 2024, 1)
        .await
        .unwrap();
    assert_eq!(empty, BigDecimal::from(0));

    repo.create(ledger.tx(a, TransactionType::Expense, "10.10", at(2024, 12, 1, 0)))
        .await
        .unwrap();
    repo.create(ledger.tx(a, TransactionType::Expense, "0.20", at(2024, 12, 31, 23)))
        .await
        .unwrap();
    repo.create(ledger.tx(a, TransactionType::Expense, "50", at(2025, 1, 1, 0)))
        .await
        .unwrap();

    let total = repo
        .sum_for_category_period(&ledger.user_id, a, 2024, 12)
        .await
        .unwrap();
    assert_eq!(total, dec("10.30"));
}

pub async fn invalid_month_is_rejected<R: TransactionRepository>(repo: &R) {
    let ledger = Ledger::new();
    assert!(matches!(
        repo.aggregate_monthly_summary(&ledger.user_id, 2024, 13).await,
        Err(RepositoryError::InvalidPeriod { month: 13, .. })
    ));
    assert!(matches!(
        repo.sum_for_category_period(&ledger.user_id, &ledger.category_a, 2024, 0)
            .await,
        Err(RepositoryError::InvalidPeriod { month: 0, .. })
    ));
    assert!(matches!(
        repo.exists_for_category(&ledger.category_a, None, Some(2024), Some(14))
            .await,
        Err(RepositoryError::InvalidPeriod { .. })
    ));
}

pub async fn run_all<R: TransactionRepository>(repo: &R) {
    create_then_get_returns_equal_entity(repo).await;
    create_keeps_full_precision_amounts(repo).await;
    create_without_transfer_account_reads_back_none(repo).await;
    create_duplicate_is_rejected(repo).await;
    get_missing_and_malformed_ids(repo).await;
    update_with_empty_patch_is_get(repo).await;
    update_changes_only_present_fields(repo).await;
    update_missing_returns_none(repo).await;
    delete_removes_once(repo).await;
    list_is_sorted_and_filtered(repo).await;
    list_from_params_skips_wrong_types(repo).await;
    exists_for_account_checks_references(repo).await;
    exists_for_category_respects_windows(repo).await;
    monthly_summary_groups_by_category_and_type(repo).await;
    sum_for_category_period_totals_one_month(repo).await;
    invalid_month_is_rejected(repo).await;
}

/// A fixed sequence of operations over `transactions`, recording every
/// observable result. Two implementations agree when their logs are equal.
pub async fn replay<R: TransactionRepository>(
    repo: &R,
    ledger: &Ledger,
    transactions: &[Transaction],
) -> Vec<Value> {
    let mut log = Vec::new();

    for tx in transactions {
        log.push(json!(repo.create(tx.clone()).await.unwrap()));
    }
    log.push(json!(repo
        .list(&TransactionFilter::for_user(ledger.user_id.clone()))
        .await
        .unwrap()));

    let first = transactions[0].id.as_str();
    let patch = TransactionPatch {
        amount: Some(dec("42.42")),
        description: Some(Some("edited".to_string())),
        ..Default::default()
    };
    log.push(json!(repo.update(first, &patch).await.unwrap()));
    let summary: Vec<Value> = repo
        .aggregate_monthly_summary(&ledger.user_id, 2024, 1)
        .await
        .unwrap()
        .into_iter()
        .map(|e| {
            json!({
                "category_id": e.category_id,
                "transaction_type": e.transaction_type,
                "total": e.total.normalized().to_string(),
                "count": e.count,
            })
        })
        .collect();
    log.push(json!(summary));
    log.push(json!(repo
        .sum_for_category_period(&ledger.user_id, &ledger.category_a, 2024, 1)
        .await
        .unwrap()
        .normalized()
        .to_string()));
    log.push(json!(repo.delete(transactions[1].id.as_str()).await.unwrap()));
    log.push(json!(repo.delete(transactions[1].id.as_str()).await.unwrap()));
    log.push(json!(repo.exists_for_account(&ledger.account_id).await.unwrap()));
    log.push(json!(repo
        .exists_for_category(&ledger.category_b, Some(&ledger.user_id), Some(2024), Some(1))
        .await
        .unwrap()));
    log.push(json!(repo
        .list(&TransactionFilter {
            user_id: Some(ledger.user_id.clone()),
            date_from: Some(at(2024, 1, 10, 0)),
            date_to: Some(at(2024, 1, 31, 23)),
            ..Default::default()
        })
        .await
        .unwrap()));

    log
}

pub fn replay_fixture(ledger: &Ledger) -> Vec<Transaction> {
    let (a, b) = (ledger.category_a.as_str(), ledger.category_b.as_str());
    vec![
        ledger.tx(a, TransactionType::Expense, "10.00", at(2024, 1, 5, 10)),
        ledger.tx(a, TransactionType::Expense, "15.50", at(2024, 1, 12, 10)),
        ledger.tx(b, TransactionType::Income, "100", at(2024, 1, 31, 23)),
        ledger
            .tx(b, TransactionType::Transfer, "20", at(2024, 2, 1, 0))
            .with_transfer_account(object_id::generate()),
    ]
}
