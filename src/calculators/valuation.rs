use serde::{Deserialize, Serialize};

/// Per-share and balance-sheet figures for the ratio calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    pub price: f64,
    pub eps: f64,
    pub book_value: f64,
    pub total_debt: f64,
    pub total_equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationRatios {
    pub pe: f64,
    pub pb: f64,
    pub de: f64,
    /// Return on equity in percent.
    pub roe: f64,
}

/// Plain IEEE division: a zero denominator yields `inf` or `NaN`.
pub fn calculate_ratios(input: &ValuationInput) -> ValuationRatios {
    ValuationRatios {
        pe: input.price / input.eps,
        pb: input.price / input.book_value,
        de: input.total_debt / input.total_equity,
        roe: input.eps / input.book_value * 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_are_exact() {
        let input = ValuationInput {
            price: 1523.35,
            eps: 47.9,
            book_value: 312.4,
            total_debt: 8_200.0,
            total_equity: 41_000.0,
        };
        let ratios = calculate_ratios(&input);
        assert_eq!(ratios.pe, 1523.35 / 47.9);
        assert_eq!(ratios.pb, 1523.35 / 312.4);
        assert_eq!(ratios.de, 0.2);
        assert_eq!(ratios.roe, 47.9 / 312.4 * 100.0);
    }

    #[test]
    fn test_zero_denominators_do_not_panic() {
        let input = ValuationInput {
            price: 100.0,
            eps: 0.0,
            book_value: 0.0,
            total_debt: 0.0,
            total_equity: 0.0,
        };
        let ratios = calculate_ratios(&input);
        assert_eq!(ratios.pe, f64::INFINITY);
        assert_eq!(ratios.pb, f64::INFINITY);
        assert!(ratios.de.is_nan());
        assert!(ratios.roe.is_nan());
    }
}
