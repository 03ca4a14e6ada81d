use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_CLOSING_COST_PERCENT, DEFAULT_DOWN_PAYMENT_PERCENT, DEFAULT_EXPENSE_PERCENT,
    DEFAULT_INTEREST_RATE_PERCENT, DEFAULT_LOAN_YEARS, DEFAULT_VACANCY_PERCENT,
};
use crate::panel::coercion::round2;
use crate::panel::comparables::positive;

/// Percentages are expressed as whole numbers (`7.5` means 7.5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentAssumptions {
    pub vacancy_percent: f64,
    pub expense_percent: f64,
    pub down_payment_percent: f64,
    pub interest_rate_percent: f64,
    pub loan_years: u32,
    pub closing_cost_percent: f64,
}

impl Default for InvestmentAssumptions {
    fn default() -> Self {
        Self {
            vacancy_percent: DEFAULT_VACANCY_PERCENT,
            expense_percent: DEFAULT_EXPENSE_PERCENT,
            down_payment_percent: DEFAULT_DOWN_PAYMENT_PERCENT,
            interest_rate_percent: DEFAULT_INTEREST_RATE_PERCENT,
            loan_years: DEFAULT_LOAN_YEARS,
            closing_cost_percent: DEFAULT_CLOSING_COST_PERCENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrossIncome {
    pub annual: f64,
    pub vacancy_loss: f64,
    pub effective_annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentMetrics {
    pub grm: f64,
    pub cap_rate: f64,
    pub cash_on_cash: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtService {
    pub loan_amount: f64,
    pub down_payment: f64,
    pub monthly_payment: f64,
    pub annual_debt_service: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    pub monthly: f64,
    pub annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentSummary {
    pub ok: bool,
    pub purchase_price: f64,
    pub monthly_rent: f64,
    pub assumptions: InvestmentAssumptions,
    pub gross_income: GrossIncome,
    pub operating_expenses: f64,
    pub noi: f64,
    pub metrics: InvestmentMetrics,
    pub debt: DebtService,
    pub cash_invested: f64,
    pub cash_flow: CashFlow,
}

/// Diagnostic returned when price or rent is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientInvestment {
    pub ok: bool,
    pub reason: String,
    pub purchase_price: Option<f64>,
    pub monthly_rent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvestmentOutcome {
    Computed(Box<InvestmentSummary>),
    Insufficient(InsufficientInvestment),
}

impl InvestmentOutcome {
    pub fn is_computed(&self) -> bool {
        matches!(self, InvestmentOutcome::Computed(_))
    }

    pub fn summary(&self) -> Option<&InvestmentSummary> {
        match self {
            InvestmentOutcome::Computed(summary) => Some(summary.as_ref()),
            InvestmentOutcome::Insufficient(_) => None,
        }
    }
}

/// Level payment for an amortizing loan. Zero rate degrades to straight-line,
/// and a non-positive amount or term yields zero.
pub fn monthly_payment(loan_amount: f64, annual_rate_percent: f64, years: u32) -> f64 {
    let months = f64::from(years) * 12.0;
    if loan_amount <= 0.0 || months <= 0.0 {
        return 0.0;
    }

    let monthly_rate = annual_rate_percent / 100.0 / 12.0;
    if monthly_rate > 0.0 {
        loan_amount * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-months))
    } else {
        loan_amount / months
    }
}

pub fn summarize_investment(
    purchase_price: Option<f64>,
    monthly_rent: Option<f64>,
    assumptions: &InvestmentAssumptions,
) -> InvestmentOutcome {
    let (price, rent) = match (positive(purchase_price), positive(monthly_rent)) {
        (Some(price), Some(rent)) => (price, rent),
        (price, rent) => {
            let reason = match (price, rent) {
                (None, None) => "purchase price and rent estimate unavailable",
                (None, Some(_)) => "purchase price unavailable",
                _ => "rent estimate unavailable",
            };
            return InvestmentOutcome::Insufficient(InsufficientInvestment {
                ok: false,
                reason: reason.to_string(),
                purchase_price,
                monthly_rent,
            });
        }
    };

    let fraction = |percent: f64| percent / 100.0;

    let gross_annual = rent * 12.0;
    let effective_gross = gross_annual * (1.0 - fraction(assumptions.vacancy_percent));
    let operating_expenses = effective_gross * fraction(assumptions.expense_percent);
    let noi = effective_gross - operating_expenses;

    let down_payment = price * fraction(assumptions.down_payment_percent);
    let loan_amount = price - down_payment;
    let payment = monthly_payment(
        loan_amount,
        assumptions.interest_rate_percent,
        assumptions.loan_years,
    );
    let annual_debt_service = payment * 12.0;

    let cash_flow_annual = noi - annual_debt_service;
    let cash_invested = down_payment + price * fraction(assumptions.closing_cost_percent);
    let cash_on_cash =
        (cash_invested > 0.0).then(|| round2(cash_flow_annual / cash_invested * 100.0));

    InvestmentOutcome::Computed(Box::new(InvestmentSummary {
        ok: true,
        purchase_price: price.round(),
        monthly_rent: rent.round(),
        assumptions: assumptions.clone(),
        gross_income: GrossIncome {
            annual: gross_annual.round(),
            vacancy_loss: (gross_annual - effective_gross).round(),
            effective_annual: effective_gross.round(),
        },
        operating_expenses: operating_expenses.round(),
        noi: noi.round(),
        metrics: InvestmentMetrics {
            grm: round2(price / gross_annual),
            cap_rate: round2(noi / price * 100.0),
            cash_on_cash,
        },
        debt: DebtService {
            loan_amount: loan_amount.round(),
            down_payment: down_payment.round(),
            monthly_payment: payment.round(),
            annual_debt_service: annual_debt_service.round(),
        },
        cash_invested: cash_invested.round(),
        cash_flow: CashFlow {
            monthly: (cash_flow_annual / 12.0).round(),
            annual: cash_flow_annual.round(),
        },
    }))
}
