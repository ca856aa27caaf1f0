//! Validation utilities for the Distribution Ledger Platform

use rust_decimal::Decimal;

use crate::models::CommissionPercentages;

/// Validate that a movement amount is strictly positive
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Amount must be greater than zero");
    }
    Ok(())
}

/// Validate a single percentage value is within [0, 100]
pub fn validate_percentage(percent: Decimal) -> Result<(), &'static str> {
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate the commission percentage table: every field in [0, 100] and the
/// table summing to at most 100
pub fn validate_percentage_table(table: &CommissionPercentages) -> Result<(), &'static str> {
    let fields = [
        table.supplier,
        table.shop,
        table.salesman,
        table.sub_agent,
        table.agent,
    ];
    for percent in fields {
        validate_percentage(percent)?;
    }

    let total: Decimal = fields.iter().sum();
    if total > Decimal::ONE_HUNDRED {
        return Err("Commission percentages must sum to at most 100");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table(supplier: &str, shop: &str, salesman: &str, sub_agent: &str, agent: &str) -> CommissionPercentages {
        CommissionPercentages {
            supplier: dec(supplier),
            shop: dec(shop),
            salesman: dec(salesman),
            sub_agent: dec(sub_agent),
            agent: dec(agent),
        }
    }

    #[test]
    fn test_validate_amount_positive() {
        assert!(validate_amount(dec("0.01")).is_ok());
        assert!(validate_amount(dec("100")).is_ok());
    }

    #[test]
    fn test_validate_amount_zero() {
        assert!(validate_amount(Decimal::ZERO).is_err());
    }

    #[test]
    fn test_validate_amount_negative() {
        assert!(validate_amount(dec("-5")).is_err());
    }

    #[test]
    fn test_validate_percentage_bounds() {
        assert!(validate_percentage(Decimal::ZERO).is_ok());
        assert!(validate_percentage(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_percentage(dec("100.01")).is_err());
        assert!(validate_percentage(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_percentage_table_valid() {
        let t = table("40", "10", "15", "12", "8");
        assert!(validate_percentage_table(&t).is_ok());
    }

    #[test]
    fn test_validate_percentage_table_sum_exceeds_100() {
        let t = table("50", "20", "15", "12", "8");
        assert!(validate_percentage_table(&t).is_err());
    }

    #[test]
    fn test_validate_percentage_table_negative_field() {
        let t = table("40", "-1", "15", "12", "8");
        assert!(validate_percentage_table(&t).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn amounts_accepted_iff_positive(cents in -1_000_000i64..1_000_000) {
                let amount = Decimal::new(cents, 2);
                prop_assert_eq!(validate_amount(amount).is_ok(), amount > Decimal::ZERO);
            }

            #[test]
            fn percentages_accepted_iff_in_range(basis_points in -5_000i64..15_000) {
                let percent = Decimal::new(basis_points, 2);
                prop_assert_eq!(
                    validate_percentage(percent).is_ok(),
                    percent >= Decimal::ZERO && percent <= Decimal::ONE_HUNDRED
                );
            }

            #[test]
            fn tables_within_budget_are_accepted(
                supplier in 0i64..40,
                shop in 0i64..15,
                salesman in 0i64..15,
                sub_agent in 0i64..15,
                agent in 0i64..15,
            ) {
                let t = CommissionPercentages {
                    supplier: Decimal::from(supplier),
                    shop: Decimal::from(shop),
                    salesman: Decimal::from(salesman),
                    sub_agent: Decimal::from(sub_agent),
                    agent: Decimal::from(agent),
                };
                prop_assert!(validate_percentage_table(&t).is_ok());
            }
        }
    }
}
