//! Vehicle insurance premium estimate.
//!
//! The no-claim bonus is reported as a separate discount: `final_premium` is
//! the gross amount and `premium_after_ncb` the net one. The headline figure
//! shown to users is `final_premium`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::validation::ValidationErrors;
use crate::TARGET_CALC;

pub const GST_RATE: f64 = 0.18;
pub const MAX_VEHICLE_AGE: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    TwoWheeler,
    Car,
    Commercial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    Comprehensive,
    ThirdParty,
    OwnDamage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityTier {
    Metro,
    Tier2,
    Tier3,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::TwoWheeler => "two_wheeler",
            VehicleType::Car => "car",
            VehicleType::Commercial => "commercial",
        }
    }
}

impl CoverageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageType::Comprehensive => "comprehensive",
            CoverageType::ThirdParty => "third_party",
            CoverageType::OwnDamage => "own_damage",
        }
    }
}

impl CityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CityTier::Metro => "metro",
            CityTier::Tier2 => "tier2",
            CityTier::Tier3 => "tier3",
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            CityTier::Metro => 1.10,
            CityTier::Tier2 => 1.00,
            CityTier::Tier3 => 0.95,
        }
    }
}

macro_rules! impl_text_enum {
    ($ty:ty, [$($variant:expr),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.to_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|v: &$ty| v.as_str() == wanted)
                    .ok_or_else(|| format!("Unknown {}: {}", stringify!($ty), s))
            }
        }
    };
}

impl_text_enum!(VehicleType, [VehicleType::TwoWheeler, VehicleType::Car, VehicleType::Commercial]);
impl_text_enum!(CoverageType, [CoverageType::Comprehensive, CoverageType::ThirdParty, CoverageType::OwnDamage]);
impl_text_enum!(CityTier, [CityTier::Metro, CityTier::Tier2, CityTier::Tier3]);

/// Optional covers bought on top of the base policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOns {
    pub zero_depreciation: bool,
    pub engine_protection: bool,
    pub roadside_assistance: bool,
    pub consumables: bool,
    pub return_to_invoice: bool,
    pub personal_accident: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInput {
    pub vehicle_type: VehicleType,
    pub vehicle_value: f64,
    pub vehicle_age: u32,
    pub city_tier: CityTier,
    pub coverage: CoverageType,
    pub add_ons: AddOns,
}

impl InsuranceInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !self.vehicle_value.is_finite() || self.vehicle_value <= 0.0 {
            errors.push("vehicle_value", "must be greater than 0");
        }
        if self.vehicle_age > MAX_VEHICLE_AGE {
            errors.push(
                "vehicle_age",
                format!("must be at most {} years", MAX_VEHICLE_AGE),
            );
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceResult {
    pub base_premium: f64,
    pub add_on_premium: f64,
    pub subtotal: f64,
    pub gst: f64,
    pub final_premium: f64,
    pub ncb_percent: f64,
    pub ncb_discount: f64,
    pub premium_after_ncb: f64,
}

/// Premium rate as a fraction of vehicle value, by age bracket `0-2`, `3-5`, `6+`.
fn base_rate(vehicle_type: VehicleType, coverage: CoverageType, vehicle_age: u32) -> f64 {
    let rates: [f64; 3] = match (vehicle_type, coverage) {
        (VehicleType::TwoWheeler, CoverageType::Comprehensive) => [0.0175, 0.0185, 0.0190],
        (VehicleType::TwoWheeler, CoverageType::ThirdParty) => [0.0080, 0.0085, 0.0090],
        (VehicleType::TwoWheeler, CoverageType::OwnDamage) => [0.0110, 0.0115, 0.0120],
        (VehicleType::Car, CoverageType::Comprehensive) => [0.0320, 0.0335, 0.0345],
        (VehicleType::Car, CoverageType::ThirdParty) => [0.0150, 0.0155, 0.0160],
        (VehicleType::Car, CoverageType::OwnDamage) => [0.0210, 0.0220, 0.0230],
        (VehicleType::Commercial, CoverageType::Comprehensive) => [0.0400, 0.0420, 0.0440],
        (VehicleType::Commercial, CoverageType::ThirdParty) => [0.0200, 0.0210, 0.0220],
        (VehicleType::Commercial, CoverageType::OwnDamage) => [0.0260, 0.0275, 0.0290],
    };
    match vehicle_age {
        0..=2 => rates[0],
        3..=5 => rates[1],
        _ => rates[2],
    }
}

/// Share of the showroom value still insured at a given age.
pub fn depreciation_factor(vehicle_age: u32) -> f64 {
    match vehicle_age {
        0 => 0.95,
        1 => 0.85,
        2 => 0.80,
        3 => 0.70,
        4 => 0.60,
        _ => 0.50,
    }
}

/// No-claim bonus percentage; stops growing after five claim-free years.
pub fn ncb_percent(vehicle_age: u32) -> f64 {
    match vehicle_age.min(5) {
        0 => 0.0,
        1 => 20.0,
        2 => 25.0,
        3 => 35.0,
        4 => 45.0,
        _ => 50.0,
    }
}

fn add_on_premium(add_ons: &AddOns, vehicle_value: f64) -> f64 {
    let mut total = 0.0;
    if add_ons.zero_depreciation {
        total += vehicle_value * 0.004;
    }
    if add_ons.engine_protection {
        total += vehicle_value * 0.002;
    }
    if add_ons.return_to_invoice {
        total += vehicle_value * 0.003;
    }
    if add_ons.roadside_assistance {
        total += 500.0;
    }
    if add_ons.consumables {
        total += 750.0;
    }
    if add_ons.personal_accident {
        total += 750.0;
    }
    total
}

pub fn calculate_premium(input: &InsuranceInput) -> Result<InsuranceResult, ValidationErrors> {
    input.validate()?;

    let base_premium = input.vehicle_value
        * base_rate(input.vehicle_type, input.coverage, input.vehicle_age)
        * input.city_tier.multiplier()
        * depreciation_factor(input.vehicle_age);
    let add_on_premium = add_on_premium(&input.add_ons, input.vehicle_value);

    let subtotal = base_premium + add_on_premium;
    let gst = subtotal * GST_RATE;
    let final_premium = subtotal + gst;

    let ncb_percent = ncb_percent(input.vehicle_age);
    let ncb_discount = base_premium * ncb_percent / 100.0;

    debug!(
        target: TARGET_CALC,
        "insurance: type={} coverage={} value={} age={} final={:.2}",
        input.vehicle_type,
        input.coverage,
        input.vehicle_value,
        input.vehicle_age,
        final_premium
    );

    Ok(InsuranceResult {
        base_premium,
        add_on_premium,
        subtotal,
        gst,
        final_premium,
        ncb_percent,
        ncb_discount,
        premium_after_ncb: final_premium - ncb_discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(value: f64, age: u32) -> InsuranceInput {
        InsuranceInput {
            vehicle_type: VehicleType::Car,
            vehicle_value: value,
            vehicle_age: age,
            city_tier: CityTier::Metro,
            coverage: CoverageType::Comprehensive,
            add_ons: AddOns {
                zero_depreciation: true,
                roadside_assistance: true,
                ..AddOns::default()
            },
        }
    }

    #[test]
    fn test_premium_scales_with_value() {
        let mut previous = 0.0;
        for value in [200_000.0, 500_000.0, 800_000.0, 1_500_000.0, 3_000_000.0] {
            let result = calculate_premium(&car(value, 3)).unwrap();
            assert!(result.final_premium > previous);
            previous = result.final_premium;
        }
    }

    #[test]
    fn test_gst_is_eighteen_percent() {
        for age in 0..8 {
            let result = calculate_premium(&car(750_000.0, age)).unwrap();
            assert_eq!(result.gst, result.subtotal * 0.18);
            assert_eq!(result.final_premium, result.subtotal + result.gst);
        }
    }

    #[test]
    fn test_no_ncb_for_new_vehicle() {
        let result = calculate_premium(&car(600_000.0, 0)).unwrap();
        assert_eq!(result.ncb_percent, 0.0);
        assert_eq!(result.ncb_discount, 0.0);
        assert_eq!(result.premium_after_ncb, result.final_premium);
    }

    #[test]
    fn test_ncb_caps_at_five_years() {
        assert_eq!(ncb_percent(5), 50.0);
        assert_eq!(ncb_percent(12), 50.0);
    }

    #[test]
    fn test_final_premium_excludes_ncb() {
        let result = calculate_premium(&car(600_000.0, 4)).unwrap();
        assert!(result.ncb_discount > 0.0);
        assert!(result.premium_after_ncb < result.final_premium);
        assert_eq!(result.final_premium, result.subtotal + result.gst);
    }

    #[test]
    fn test_base_premium_components() {
        let input = InsuranceInput {
            vehicle_type: VehicleType::TwoWheeler,
            vehicle_value: 100_000.0,
            vehicle_age: 1,
            city_tier: CityTier::Tier2,
            coverage: CoverageType::ThirdParty,
            add_ons: AddOns::default(),
        };
        let result = calculate_premium(&input).unwrap();
        assert!((result.base_premium - 100_000.0 * 0.0080 * 0.85).abs() < 1e-9);
        assert_eq!(result.add_on_premium, 0.0);
    }

    #[test]
    fn test_rejects_invalid_value() {
        let errors = calculate_premium(&car(-1.0, 2)).unwrap_err();
        assert!(errors.has_field("vehicle_value"));
        let errors = calculate_premium(&car(500_000.0, 40)).unwrap_err();
        assert!(errors.has_field("vehicle_age"));
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("two-wheeler".parse::<VehicleType>(), Ok(VehicleType::TwoWheeler));
        assert_eq!("Tier3".parse::<CityTier>(), Ok(CityTier::Tier3));
        assert!("fleet".parse::<CoverageType>().is_err());
    }
}
