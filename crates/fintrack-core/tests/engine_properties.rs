use chrono::NaiveDate;
use fintrack_core::{
    BillSplitService, BudgetService, CurrencyConverter, NewBillSplit, SplitShares,
};
use fintrack_domain::{
    Budget, BudgetPeriod, BillSplitStatus, CategoryAllocation, CurrencyCode, Transaction,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn budget_percent_is_never_negative() {
    let fx = CurrencyConverter::default();
    let account = Uuid::new_v4();
    for limit in [dec!(0), dec!(0.01), dec!(50), dec!(1000)] {
        let budget = Budget::new("Check", BudgetPeriod::Weekly, d(2025, 9, 1), "MVR")
            .with_allocation(CategoryAllocation::new("fuel", limit));
        for spent in [dec!(0), dec!(12.5), dec!(4000)] {
            let txns = if spent.is_zero() {
                Vec::new()
            } else {
                vec![Transaction::expense(account, spent, "MVR", d(2025, 9, 3)).with_category("Fuel")]
            };
            let rows = BudgetService::progress(&fx, &budget, &[], &txns);
            assert!(rows[0].percent >= Decimal::ZERO);
            if limit.is_zero() {
                assert_eq!(rows[0].percent, Decimal::ZERO);
            }
        }
    }
}

#[test]
fn weekly_budget_window_excludes_the_eighth_day() {
    let fx = CurrencyConverter::default();
    let budget = Budget::new("Week", BudgetPeriod::Weekly, d(2025, 9, 1), "MVR")
        .with_allocation(CategoryAllocation::new("fuel", dec!(100)));
    let account = Uuid::new_v4();
    let txns = vec![
        Transaction::expense(account, dec!(10), "MVR", d(2025, 9, 7)).with_category("fuel"),
        Transaction::expense(account, dec!(10), "MVR", d(2025, 9, 8)).with_category("fuel"),
    ];
    let rows = BudgetService::progress(&fx, &budget, &[], &txns);
    assert_eq!(rows[0].spent, dec!(10));
}

#[test]
fn bill_split_status_depends_only_on_participant_state() {
    let payer = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let build = |members: Vec<Uuid>| {
        BillSplitService::create(NewBillSplit {
            description: "Dinner".into(),
            date: d(2025, 9, 1),
            currency: CurrencyCode::new("USD"),
            total_amount: dec!(90),
            payer_contact_id: payer,
            shares: SplitShares::Equal(members),
        })
        .expect("create split")
    };

    let mut forward = build(vec![payer, a, b]);
    let mut backward = build(vec![payer, b, a]);
    let mut seen = Vec::new();
    for paid in [dec!(0), dec!(10), dec!(30)] {
        BillSplitService::record_payment(&mut forward, a, paid).expect("a pays");
        BillSplitService::record_payment(&mut forward, b, paid).expect("b pays");
        BillSplitService::record_payment(&mut backward, b, paid).expect("b pays");
        let status = BillSplitService::record_payment(&mut backward, a, paid).expect("a pays");
        assert_eq!(forward.status, status);
        seen.push(status);
    }
    assert_eq!(seen.last(), Some(&BillSplitStatus::Settled));
    assert!(seen.windows(2).all(|pair| rank(pair[0]) <= rank(pair[1])));
}

fn rank(status: BillSplitStatus) -> u8 {
    match status {
        BillSplitStatus::Open => 0,
        BillSplitStatus::Partial => 1,
        BillSplitStatus::Settled => 2,
    }
}

#[test]
fn equal_shares_cover_the_total_without_negative_parts() {
    let totals = [dec!(0.01), dec!(0.99), dec!(1.00), dec!(10.01), dec!(100), dec!(333.33), dec!(1234.57)];
    for total in totals {
        for count in [1usize, 2, 3, 7, 13, 99, 101, 199, 250] {
            let members: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
            let split = BillSplitService::create(NewBillSplit {
                description: "Shared".into(),
                date: d(2025, 9, 1),
                currency: CurrencyCode::new("MVR"),
                total_amount: total,
                payer_contact_id: members[0],
                shares: SplitShares::Equal(members),
            })
            .expect("create split");

            let shares: Vec<Decimal> = split.participants.iter().map(|p| p.share).collect();
            assert_eq!(shares.iter().copied().sum::<Decimal>(), total, "{total} over {count}");
            assert!(shares.iter().all(|share| *share >= Decimal::ZERO), "{total} over {count}");
            let smallest = shares.iter().copied().min().unwrap();
            let largest = shares.iter().copied().max().unwrap();
            assert!(largest - smallest <= dec!(0.01), "{total} over {count}");
        }
    }
}

#[test]
fn custom_shares_must_match_total() {
    let payer = Uuid::new_v4();
    let friend = Uuid::new_v4();
    let result = BillSplitService::create(NewBillSplit {
        description: "Taxi".into(),
        date: d(2025, 9, 1),
        currency: CurrencyCode::new("MVR"),
        total_amount: dec!(50),
        payer_contact_id: payer,
        shares: SplitShares::Custom(vec![(payer, dec!(20)), (friend, dec!(20))]),
    });
    assert!(result.is_err());
}
