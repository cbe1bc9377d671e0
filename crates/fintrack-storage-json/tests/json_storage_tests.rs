use chrono::NaiveDate;
use fintrack_core::{ErrorKind, LoanService, NewLoan, Repository};
use fintrack_domain::{
    Account, AccountKind, CurrencyCode, Loan, LoanDirection, LoanHorizon, LoanStatus, Transaction,
};
use fintrack_storage_json::JsonStore;
use rust_decimal_macros::dec;
use std::fs;
use tempfile::tempdir;
use uuid::Uuid;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn json_repository_persists_accounts() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().join("data")).expect("store");
    let accounts = store.repository::<Account>();

    let card = accounts
        .create(Account::new("Visa", AccountKind::CreditCard, "USD").with_balance(dec!(-120.5)))
        .expect("create");
    accounts
        .create(Account::new("Cash", AccountKind::Cash, "MVR"))
        .expect("create");

    let reopened = store.repository::<Account>();
    let loaded = reopened.find_all().expect("find all");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0], card);
    assert!(store.collection_path("accounts").exists());
    assert!(!store.collection_path("accounts").with_extension("json.tmp").exists());

    reopened.delete(card.id).expect("delete");
    assert!(accounts.find_by_id(card.id).expect("find").is_none());
}

#[test]
fn missing_records_report_reference_errors() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let txns = store.repository::<Transaction>();
    assert!(txns.find_all().expect("empty collection").is_empty());

    let err = txns.delete(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Reference);
}

#[test]
fn loans_round_trip_with_schedule() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let loans = store.repository::<Loan>();
    let loan = LoanService::create(NewLoan {
        label: "Scooter".into(),
        contact_id: Uuid::new_v4(),
        direction: LoanDirection::Lent,
        horizon: LoanHorizon::LongTerm,
        principal: dec!(1200),
        currency: CurrencyCode::new("MVR"),
        interest_rate: dec!(12),
        term_months: 12,
        start_date: d(2025, 1, 1),
    })
    .expect("loan");
    loans.create(loan.clone()).expect("create");
    assert_eq!(loans.get(loan.id).expect("get"), loan);
}

#[test]
fn legacy_loan_files_are_normalized_on_read() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let id = Uuid::new_v4();
    let contact = Uuid::new_v4();
    let schedule = r#"[{"period":1,"dueDate":"2025-11-01T00:00:00.000Z","interest":1,"principal":99,"balance":0}]"#;
    let legacy = serde_json::json!([
        {
            "id": id,
            "label": "Test loan",
            "contactId": contact,
            "direction": "borrowed",
            "horizon": "short-term",
            "principal": 100,
            "currency": "usd",
            "interestRate": 1,
            "termMonths": 12,
            "startDate": "2025-10-01",
            "status": "active",
            "payments": [{ "id": Uuid::new_v4(), "loanId": id, "date": "2025-10-15", "amount": 40, "currency": "USD" }],
            "schedule": schedule
        },
        {
            "id": Uuid::new_v4(),
            "label": "Broken schedule",
            "contactId": contact,
            "direction": "lent",
            "horizon": "long-term",
            "principal": 50,
            "currency": "MVR",
            "interestRate": 0,
            "termMonths": 2,
            "startDate": "2025-10-01",
            "status": "active",
            "schedule": "not a json"
        }
    ]);
    fs::write(store.collection_path("loans"), legacy.to_string()).expect("write legacy file");

    let loans = store.repository::<Loan>().find_all().expect("read legacy loans");
    assert_eq!(loans.len(), 2);
    let first = &loans[0];
    assert_eq!(first.contact_id, contact);
    assert_eq!(first.currency.as_str(), "USD");
    assert_eq!(first.status, LoanStatus::Active);
    assert_eq!(first.payments[0].amount, dec!(40));
    assert_eq!(first.schedule.len(), 1);
    assert_eq!(first.schedule[0].due_date, d(2025, 11, 1));
    assert!(loans[1].schedule.is_empty());
}

#[test]
fn legacy_transactions_lift_account_amount() {
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::new(dir.path().to_path_buf()).expect("store");
    let account = Uuid::new_v4();
    let legacy = serde_json::json!([{
        "id": Uuid::new_v4(),
        "type": "expense",
        "amount": 20,
        "currency": "USD",
        "status": "posted",
        "date": "2025-03-02T08:30:00.000Z",
        "accountId": account,
        "metadata": { "accountAmount": 308.4, "importBatch": 7 }
    }]);
    fs::write(store.collection_path("transactions"), legacy.to_string()).expect("write");

    let txns = store.repository::<Transaction>().find_all().expect("read");
    assert_eq!(txns[0].account_id, Some(account));
    assert_eq!(txns[0].date, d(2025, 3, 2));
    assert_eq!(txns[0].account_amount, Some(dec!(308.4)));
    assert_eq!(txns[0].metadata.get("importBatch").map(String::as_str), Some("7"));
}
