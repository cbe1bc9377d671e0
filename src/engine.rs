//! Facade wiring configuration, the currency converter and a clock into the
//! stateless services.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use fintrack_config::{Config, ConfigManager};
use fintrack_core::{
    AmortizationService, BillSplitService, BudgetService, CashflowForecast, Clock, ContactService,
    ContactSummary, CurrencyConverter, ForecastInput, ForecastService, LedgerService, LoanService,
    NewBillSplit, NewLoan, RecurrenceService, Reminder, ReminderService, ReportBundle,
    ReportService, SavingsService, SavingsStatus, SystemClock,
};
use fintrack_domain::{
    Account, AmortizationEntry, BillSplit, BillSplitStatus, Budget, BudgetProgress, CurrencyCode,
    Loan, LoanStatus, RecurringItem, SavingsGoal, Transaction, TransactionStatus,
};

use crate::errors::EngineResult;

/// Entry point for callers. Holds no records; every operation takes the data
/// it works on and returns plain values.
#[derive(Clone)]
pub struct FinanceEngine {
    config: Config,
    fx: CurrencyConverter,
    clock: Arc<dyn Clock>,
}

impl FinanceEngine {
    pub fn new(config: Config) -> EngineResult<Self> {
        config.validate()?;
        let fx = config.converter();
        info!(base = %fx.base(), currencies = fx.rates().len(), "finance engine ready");
        Ok(Self {
            config,
            fx,
            clock: Arc::new(SystemClock),
        })
    }

    /// Builds the engine from the persisted configuration.
    pub fn load(manager: &ConfigManager) -> EngineResult<Self> {
        Self::new(manager.load()?)
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.fx
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The contact that stands for the current user in contact summaries.
    pub fn self_contact(&self) -> Uuid {
        self.config.self_contact_id.unwrap_or_else(Uuid::nil)
    }

    pub fn convert(&self, amount: Decimal, from: &CurrencyCode, to: &CurrencyCode) -> Decimal {
        self.fx.convert(amount, from, to)
    }

    pub fn amortization_schedule(
        &self,
        principal: Decimal,
        annual_rate_pct: Decimal,
        term_months: u32,
        start_date: NaiveDate,
    ) -> EngineResult<Vec<AmortizationEntry>> {
        Ok(AmortizationService::build(principal, annual_rate_pct, term_months, start_date)?)
    }

    pub fn apply_transaction(&self, accounts: &mut [Account], txn: &Transaction) -> EngineResult<()> {
        Ok(LedgerService::apply(&self.fx, accounts, txn)?)
    }

    pub fn reverse_transaction(&self, accounts: &mut [Account], txn: &Transaction) -> EngineResult<()> {
        Ok(LedgerService::reverse(&self.fx, accounts, txn)?)
    }

    pub fn change_transaction_status(
        &self,
        accounts: &mut [Account],
        txn: &mut Transaction,
        status: TransactionStatus,
    ) -> EngineResult<()> {
        Ok(LedgerService::change_status(&self.fx, accounts, txn, status)?)
    }

    pub fn create_loan(&self, input: NewLoan) -> EngineResult<Loan> {
        let mut loan = LoanService::create(input)?;
        LoanService::refresh_status(&self.fx, &mut loan, self.today());
        Ok(loan)
    }

    pub fn refresh_loan_status(&self, loan: &mut Loan) -> LoanStatus {
        LoanService::refresh_status(&self.fx, loan, self.today())
    }

    pub fn create_bill_split(&self, input: NewBillSplit) -> EngineResult<BillSplit> {
        Ok(BillSplitService::create(input)?)
    }

    pub fn record_bill_split_payment(
        &self,
        split: &mut BillSplit,
        contact_id: Uuid,
        paid: Decimal,
    ) -> EngineResult<BillSplitStatus> {
        Ok(BillSplitService::record_payment(split, contact_id, paid)?)
    }

    /// Empty budget for the window containing today, shaped by the configured
    /// budgeting period and start day.
    pub fn new_budget(&self, label: impl Into<String>, currency: impl Into<CurrencyCode>) -> Budget {
        let period = self.config.budgeting_period;
        let start = BudgetService::period_start(period, self.config.budgeting_start_day, self.today());
        Budget::new(label, period, start, currency)
    }

    pub fn budget_progress(&self, budgets: &[Budget], transactions: &[Transaction]) -> Vec<BudgetProgress> {
        BudgetService::progress_all(&self.fx, budgets, transactions)
    }

    pub fn savings_current_amount(&self, goal: &SavingsGoal) -> Decimal {
        SavingsService::current_amount(&self.fx, goal)
    }

    /// Goals ordered by priority, then by target date.
    pub fn savings_overview(&self, goals: &[SavingsGoal]) -> Vec<SavingsStatus> {
        SavingsService::overview(&self.fx, goals)
    }

    pub fn recurring_occurrences(&self, item: &RecurringItem, until: NaiveDate) -> Vec<NaiveDate> {
        RecurrenceService::occurrences(item, self.today(), until)
    }

    /// Projection over the configured horizon starting today.
    pub fn forecast(&self, input: ForecastInput<'_>) -> CashflowForecast {
        self.forecast_for(input, self.config.forecast_horizon_days)
    }

    pub fn forecast_for(&self, input: ForecastInput<'_>, horizon_days: u32) -> CashflowForecast {
        ForecastService::project(&self.fx, input, self.today(), horizon_days)
    }

    pub fn contact_summaries(
        &self,
        transactions: &[Transaction],
        loans: &[Loan],
        bill_splits: &[BillSplit],
    ) -> Vec<ContactSummary> {
        ContactService::summaries(&self.fx, self.self_contact(), transactions, loans, bill_splits)
    }

    /// Obligations due within the forecast horizon, limited to the reminder
    /// kinds enabled in the configuration.
    pub fn reminders(&self, accounts: &[Account], loans: &[Loan], bill_splits: &[BillSplit]) -> Vec<Reminder> {
        ReminderService::upcoming(
            &self.fx,
            accounts,
            loans,
            bill_splits,
            self.config.reminders.filter(),
            self.today(),
            self.config.forecast_horizon_days,
        )
    }

    pub fn reports(&self, input: ForecastInput<'_>, budgets: &[Budget]) -> ReportBundle {
        ReportService::bundle(&self.fx, input, budgets, self.today())
    }
}
