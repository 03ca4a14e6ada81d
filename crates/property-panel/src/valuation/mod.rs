//! Pure valuation functions: comps- and income-based AVM, after-repair value,
//! and the rental investment summary. Nothing here performs I/O or fails; missing
//! inputs produce an explicit insufficient result.

mod avm;
mod investment;

pub use avm::{after_repair_value, estimate_value, Confidence, ValuationMethod, ValuationResult};
pub use investment::{
    monthly_payment, summarize_investment, CashFlow, DebtService, GrossIncome,
    InsufficientInvestment, InvestmentAssumptions, InvestmentMetrics, InvestmentOutcome,
    InvestmentSummary,
};

pub const DEFAULT_CAP_RATE_PERCENT: f64 = 8.0;
pub const DEFAULT_VACANCY_PERCENT: f64 = 5.0;
pub const DEFAULT_EXPENSE_PERCENT: f64 = 35.0;
pub const DEFAULT_DOWN_PAYMENT_PERCENT: f64 = 20.0;
pub const DEFAULT_INTEREST_RATE_PERCENT: f64 = 7.5;
pub const DEFAULT_LOAN_YEARS: u32 = 30;
pub const DEFAULT_CLOSING_COST_PERCENT: f64 = 0.0;
