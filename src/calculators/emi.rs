//! Standard loan amortization shared by the loan calculators.

use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

/// Monthly installment for `principal` repaid over `months` at `annual_rate_pct`.
///
/// A zero rate degrades to straight division.
pub fn emi(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if months == 0 {
        return principal;
    }
    let m = annual_rate_pct / 1200.0;
    let n = months as f64;
    if m == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + m).powf(n);
    principal * m * growth / (growth - 1.0)
}

/// One month of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub month: u32,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Month-by-month split of `installment` into interest and principal.
///
/// Stops early once the balance reaches zero; the final month pays only what is left.
pub fn amortize(
    principal: f64,
    annual_rate_pct: f64,
    months: u32,
    installment: f64,
) -> Vec<MonthlyPayment> {
    let m = annual_rate_pct / 1200.0;
    let mut balance = principal;
    let mut schedule = Vec::with_capacity(months as usize);

    for month in 1..=months {
        if balance <= 0.0 {
            break;
        }
        let interest = balance * m;
        let principal_part = (installment - interest).min(balance);
        balance -= principal_part;
        // Float drift on the last installment leaves dust behind.
        if balance.abs() < 1e-6 {
            balance = 0.0;
        }
        schedule.push(MonthlyPayment {
            month,
            interest,
            principal: principal_part,
            balance,
        });
    }

    schedule
}

/// Totals of an amortization schedule for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u32,
    pub interest: f64,
    pub principal: f64,
    pub closing_balance: f64,
}

/// Groups a monthly schedule into 12-month buckets, numbered from `first_year`.
pub fn summarize_by_year(schedule: &[MonthlyPayment], first_year: u32) -> Vec<YearSummary> {
    schedule
        .chunks(12)
        .enumerate()
        .map(|(i, months)| YearSummary {
            year: first_year + i as u32,
            interest: months.iter().map(|p| p.interest).sum(),
            principal: months.iter().map(|p| p.principal).sum(),
            closing_balance: months.last().map(|p| p.balance).unwrap_or(0.0),
        })
        .collect()
}

/// Inputs of the general loan EMI calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub amount: f64,
    pub annual_rate: f64,
    pub tenure_years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub emi: f64,
    pub total_interest: f64,
    pub total_payment: f64,
    pub yearly_breakdown: Vec<YearSummary>,
}

impl LoanInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.amount.is_finite() || self.amount <= 0.0 {
            errors.push("amount", "must be greater than 0");
        }
        errors.check_range("annual_rate", self.annual_rate, 0.0, 30.0);
        errors.check_range("tenure_years", self.tenure_years, 1.0, 30.0);
        errors.into_result()
    }
}

/// General loan EMI with a yearly repayment breakdown.
pub fn calculate_loan(input: &LoanInput) -> Result<LoanResult, ValidationErrors> {
    input.validate()?;

    let months = (input.tenure_years * 12.0).round() as u32;
    let installment = emi(input.amount, input.annual_rate, months);
    let total_payment = installment * months as f64;
    let schedule = amortize(input.amount, input.annual_rate, months, installment);

    Ok(LoanResult {
        emi: installment,
        total_interest: total_payment - input.amount,
        total_payment,
        yearly_breakdown: summarize_by_year(&schedule, 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emi_matches_closed_form() {
        let p = 1_000_000.0;
        let m: f64 = 9.5 / 1200.0;
        let growth = (1.0 + m).powi(120);
        let expected = p * m * growth / (growth - 1.0);

        let actual = emi(p, 9.5, 120);
        assert!((actual - expected).abs() < 1e-6);
        assert!((actual - 12_939.76).abs() < 0.01);
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        assert_eq!(emi(120_000.0, 0.0, 12), 10_000.0);
    }

    #[test]
    fn test_amortization_pays_off_balance() {
        let installment = emi(500_000.0, 8.0, 60);
        let schedule = amortize(500_000.0, 8.0, 60, installment);
        assert_eq!(schedule.len(), 60);
        assert_eq!(schedule.last().map(|p| p.balance), Some(0.0));

        let repaid: f64 = schedule.iter().map(|p| p.principal).sum();
        assert!((repaid - 500_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_amortization_stops_early_on_overpayment() {
        let schedule = amortize(10_000.0, 12.0, 24, 5_000.0);
        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule[2].balance, 0.0);
    }

    #[test]
    fn test_calculate_loan_rejects_bad_tenure() {
        let input = LoanInput {
            amount: 100_000.0,
            annual_rate: 10.0,
            tenure_years: 0.0,
        };
        let errors = calculate_loan(&input).unwrap_err();
        assert!(errors.has_field("tenure_years"));
    }

    #[test]
    fn test_calculate_loan_breakdown() {
        let input = LoanInput {
            amount: 1_000_000.0,
            annual_rate: 9.5,
            tenure_years: 10.0,
        };
        let result = calculate_loan(&input).unwrap();
        assert_eq!(result.yearly_breakdown.len(), 10);
        assert!((result.total_interest - 552_770.69).abs() < 0.01);
        assert_eq!(result.yearly_breakdown[9].closing_balance, 0.0);
    }
}
