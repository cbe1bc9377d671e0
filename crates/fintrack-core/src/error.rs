use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Loan not found: {0}")]
    LoanNotFound(Uuid),
    #[error("Bill split not found: {0}")]
    BillSplitNotFound(Uuid),
    #[error("Participant {contact} not found on bill split {split}")]
    ParticipantNotFound { split: Uuid, contact: Uuid },
    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),
    #[error("Savings goal not found: {0}")]
    SavingsGoalNotFound(Uuid),
    #[error("Contribution not found: {0}")]
    ContributionNotFound(Uuid),
    #[error("Recurring item not found: {0}")]
    RecurringItemNotFound(Uuid),
    #[error("Record not found in {collection}: {id}")]
    RecordNotFound { collection: &'static str, id: Uuid },
    #[error("Consistency violation: {0}")]
    Consistency(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by callers to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Reference,
    Consistency,
    Storage,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Consistency(_) => ErrorKind::Consistency,
            CoreError::Storage(_) | CoreError::Io(_) => ErrorKind::Storage,
            CoreError::AccountNotFound(_)
            | CoreError::TransactionNotFound(_)
            | CoreError::LoanNotFound(_)
            | CoreError::BillSplitNotFound(_)
            | CoreError::ParticipantNotFound { .. }
            | CoreError::BudgetNotFound(_)
            | CoreError::SavingsGoalNotFound(_)
            | CoreError::ContributionNotFound(_)
            | CoreError::RecurringItemNotFound(_)
            | CoreError::RecordNotFound { .. } => ErrorKind::Reference,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
