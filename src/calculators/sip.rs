//! Systematic investment plan: fixed monthly contributions compounded monthly.

use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SipInput {
    pub monthly_investment: f64,
    pub expected_return: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SipYear {
    pub year: u32,
    pub invested: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipResult {
    pub invested: f64,
    pub future_value: f64,
    pub estimated_returns: f64,
    pub yearly_growth: Vec<SipYear>,
}

impl SipInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_range("monthly_investment", self.monthly_investment, 100.0, 10_000_000.0);
        errors.check_range("expected_return", self.expected_return, 0.0, 30.0);
        if !(1..=50).contains(&self.years) {
            errors.push("years", "must be between 1 and 50");
        }
        errors.into_result()
    }
}

/// Value after `months` contributions paid at the start of each month.
pub fn future_value(monthly: f64, annual_return_pct: f64, months: u32) -> f64 {
    let i = annual_return_pct / 1200.0;
    let n = months as f64;
    if i == 0.0 {
        return monthly * n;
    }
    monthly * (((1.0 + i).powf(n) - 1.0) / i) * (1.0 + i)
}

pub fn calculate_sip(input: &SipInput) -> Result<SipResult, ValidationErrors> {
    input.validate()?;

    let months = input.years * 12;
    let invested = input.monthly_investment * months as f64;
    let future_value = future_value(input.monthly_investment, input.expected_return, months);

    let yearly_growth = (1..=input.years)
        .map(|year| SipYear {
            year,
            invested: input.monthly_investment * (year * 12) as f64,
            value: self::future_value(input.monthly_investment, input.expected_return, year * 12),
        })
        .collect();

    Ok(SipResult {
        invested,
        future_value,
        estimated_returns: future_value - invested,
        yearly_growth,
    })
}
