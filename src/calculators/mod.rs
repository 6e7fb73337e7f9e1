//! Financial calculators.
//!
//! Every calculator is a pure function from an input struct to a result,
//! recomputed from scratch on each change. Inputs are validated first and an
//! invalid set of inputs yields field errors instead of a result.

pub mod debounce;
pub mod education_loan;
pub mod emi;
pub mod sip;
pub mod validation;
pub mod valuation;
pub mod vehicle_insurance;

pub use self::debounce::Debouncer;
pub use self::education_loan::{
    calculate_education_loan, CourseType, EducationLoanInput, EducationLoanResult, LoanPhase,
    YearlyRow,
};
pub use self::emi::{calculate_loan, emi, LoanInput, LoanResult};
pub use self::sip::{calculate_sip, SipInput, SipResult};
pub use self::validation::{FieldError, ValidationErrors};
pub use self::valuation::{calculate_ratios, ValuationInput, ValuationRatios};
pub use self::vehicle_insurance::{
    calculate_premium, AddOns, CityTier, CoverageType, InsuranceInput, InsuranceResult,
    VehicleType,
};
