//! Currency display for prices shown in dashboard lists.

use core::str::FromStr;

use myshop_core::DomainError;
use rust_decimal::Decimal;

/// Currency the shop displays prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
            Currency::Chf => "CHF",
        }
    }

    /// Format an amount as `"<symbol> <amount>"` with two places.
    pub fn format(&self, amount: Decimal) -> String {
        let mut rounded = amount.round_dp(2);
        rounded.rescale(2);
        format!("{} {}", self.symbol(), rounded)
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            other => Err(DomainError::validation(format!("unsupported currency: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_two_places() {
        assert_eq!(Currency::Eur.format(Decimal::new(12990, 3)), "€ 12.99");
        assert_eq!(Currency::Usd.format(Decimal::new(5, 0)), "$ 5.00");
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert!("XYZ".parse::<Currency>().is_err());
    }
}
