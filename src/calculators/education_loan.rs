//! Education loan EMI with a moratorium period.
//!
//! During the moratorium interest accrues as simple interest on the sanctioned
//! amount and is capitalised; repayment then amortizes the grown principal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::emi::{amortize, emi, summarize_by_year};
use super::validation::ValidationErrors;
use crate::TARGET_CALC;

pub const MIN_LOAN_AMOUNT: f64 = 50_000.0;
pub const MIN_RATE: f64 = 5.0;
pub const MAX_RATE: f64 = 20.0;
pub const MIN_TENURE_YEARS: u32 = 3;
pub const MAX_TENURE_YEARS: u32 = 20;
pub const MAX_MORATORIUM_YEARS: u32 = 5;

/// Section 80E deduction is computed on at most this much interest.
pub const TAX_BENEFIT_INTEREST_CAP: f64 = 800_000.0;
pub const TAX_BRACKET: f64 = 0.3;
pub const PROCESSING_FEE_RATE: f64 = 0.01;
pub const PROCESSING_FEE_CAP: f64 = 50_000.0;
/// Lenders expect the EMI to stay under a third of monthly income.
pub const INCOME_TO_EMI_RATIO: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    Undergraduate,
    Postgraduate,
    Professional,
    Abroad,
}

impl CourseType {
    pub const ALL: [CourseType; 4] = [
        CourseType::Undergraduate,
        CourseType::Postgraduate,
        CourseType::Professional,
        CourseType::Abroad,
    ];

    pub fn max_loan(&self) -> f64 {
        match self {
            CourseType::Undergraduate => 1_000_000.0,
            CourseType::Postgraduate => 2_000_000.0,
            CourseType::Professional => 5_000_000.0,
            CourseType::Abroad => 15_000_000.0,
        }
    }

    pub fn default_rate(&self) -> f64 {
        match self {
            CourseType::Undergraduate => 9.0,
            CourseType::Postgraduate => 9.5,
            CourseType::Professional => 10.0,
            CourseType::Abroad => 10.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseType::Undergraduate => "undergraduate",
            CourseType::Postgraduate => "postgraduate",
            CourseType::Professional => "professional",
            CourseType::Abroad => "abroad",
        }
    }
}

impl fmt::Display for CourseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CourseType::ALL
            .into_iter()
            .find(|c| c.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown course type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EducationLoanInput {
    pub loan_amount: f64,
    pub annual_rate: f64,
    pub tenure_years: u32,
    pub moratorium_years: u32,
    pub course_type: CourseType,
}

impl EducationLoanInput {
    /// Inputs prefilled with the course's default rate.
    pub fn for_course(course_type: CourseType, loan_amount: f64) -> Self {
        Self {
            loan_amount,
            annual_rate: course_type.default_rate(),
            tenure_years: 10,
            moratorium_years: 1,
            course_type,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let max_loan = self.course_type.max_loan();
        if !self.loan_amount.is_finite() {
            errors.push("loan_amount", "must be a number");
        } else if self.loan_amount < MIN_LOAN_AMOUNT {
            errors.push("loan_amount", format!("must be at least {}", MIN_LOAN_AMOUNT));
        } else if self.loan_amount > max_loan {
            errors.push(
                "loan_amount",
                format!(
                    "must not exceed {} for {} courses",
                    max_loan, self.course_type
                ),
            );
        }

        errors.check_range("annual_rate", self.annual_rate, MIN_RATE, MAX_RATE);

        if !(MIN_TENURE_YEARS..=MAX_TENURE_YEARS).contains(&self.tenure_years) {
            errors.push(
                "tenure_years",
                format!(
                    "must be between {} and {} years",
                    MIN_TENURE_YEARS, MAX_TENURE_YEARS
                ),
            );
        }
        if self.moratorium_years > MAX_MORATORIUM_YEARS {
            errors.push(
                "moratorium_years",
                format!("must be between 0 and {} years", MAX_MORATORIUM_YEARS),
            );
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPhase {
    Moratorium,
    Repayment,
}

/// One row of the year-by-year schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: u32,
    pub phase: LoanPhase,
    pub interest: f64,
    pub principal_paid: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationLoanResult {
    pub emi: f64,
    pub accumulated_interest: f64,
    pub principal_after_moratorium: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub tax_benefit: f64,
    pub processing_fee: f64,
    pub recommended_income: f64,
    pub yearly_breakdown: Vec<YearlyRow>,
}

/// Runs the full education loan calculation. Invalid inputs produce no result.
pub fn calculate_education_loan(
    input: &EducationLoanInput,
) -> Result<EducationLoanResult, ValidationErrors> {
    input.validate()?;

    let principal = input.loan_amount;
    let yearly_interest = principal * (input.annual_rate / 100.0);
    let accumulated_interest = yearly_interest * input.moratorium_years as f64;
    let principal_after_moratorium = principal + accumulated_interest;

    let months = input.tenure_years * 12;
    let installment = emi(principal_after_moratorium, input.annual_rate, months);
    let total_payment = installment * months as f64;
    let total_interest = total_payment - principal;

    let mut yearly_breakdown: Vec<YearlyRow> = (1..=input.moratorium_years)
        .map(|year| YearlyRow {
            year,
            phase: LoanPhase::Moratorium,
            interest: yearly_interest,
            principal_paid: 0.0,
            balance: principal + yearly_interest * year as f64,
        })
        .collect();

    let schedule = amortize(
        principal_after_moratorium,
        input.annual_rate,
        months,
        installment,
    );
    yearly_breakdown.extend(
        summarize_by_year(&schedule, input.moratorium_years + 1)
            .into_iter()
            .map(|y| YearlyRow {
                year: y.year,
                phase: LoanPhase::Repayment,
                interest: y.interest,
                principal_paid: y.principal,
                balance: y.closing_balance,
            }),
    );

    let result = EducationLoanResult {
        emi: installment,
        accumulated_interest,
        principal_after_moratorium,
        total_payment,
        total_interest,
        tax_benefit: total_interest.min(TAX_BENEFIT_INTEREST_CAP) * TAX_BRACKET,
        processing_fee: (principal * PROCESSING_FEE_RATE).min(PROCESSING_FEE_CAP),
        recommended_income: installment * INCOME_TO_EMI_RATIO,
        yearly_breakdown,
    };

    debug!(
        target: TARGET_CALC,
        "education loan: principal={} rate={} tenure={} moratorium={} emi={:.2}",
        principal,
        input.annual_rate,
        input.tenure_years,
        input.moratorium_years,
        result.emi
    );

    Ok(result)
}
