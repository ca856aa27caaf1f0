//! Commission calculator tests
//!
//! Covers the per-tier share rules:
//! - distributor share subtraction (with the agent-sale shop exception)
//! - seller tier attribution
//! - shop share only on stock-out movements
//! - share amounts proportional to the net price basis

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    calculate_commission, CommissionPercentages, CommissionShare, CommissionTier, MovementEvent,
    SellerKind,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn percentages() -> CommissionPercentages {
    CommissionPercentages {
        supplier: dec("40"),
        shop: dec("10"),
        salesman: dec("15"),
        sub_agent: dec("12"),
        agent: dec("8"),
    }
}

fn share_for(shares: &[CommissionShare], tier: CommissionTier) -> Option<&CommissionShare> {
    shares.iter().find(|s| s.tier == tier)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_distributor_only_for_sellerless_stock_in() {
        let shares = calculate_commission(dec("1000"), None, &percentages(), MovementEvent::StockIn);

        assert_eq!(shares.len(), 1);
        let distributor = share_for(&shares, CommissionTier::Distributor).unwrap();
        // 100 - 40 (supplier) - 10 (shop) = 50
        assert_eq!(distributor.percentage, dec("50"));
        assert_eq!(distributor.amount, dec("500"));
    }

    #[test]
    fn test_shop_share_on_sellerless_stock_out() {
        let shares =
            calculate_commission(dec("1000"), None, &percentages(), MovementEvent::StockOut);

        assert_eq!(shares.len(), 2);
        let shop = share_for(&shares, CommissionTier::Shop).unwrap();
        assert_eq!(shop.percentage, dec("10"));
        assert_eq!(shop.amount, dec("100"));
    }

    #[test]
    fn test_salesman_sale_shares() {
        let shares = calculate_commission(
            dec("1000"),
            Some(SellerKind::Salesman),
            &percentages(),
            MovementEvent::StockOut,
        );

        let distributor = share_for(&shares, CommissionTier::Distributor).unwrap();
        let salesman = share_for(&shares, CommissionTier::Salesman).unwrap();
        let shop = share_for(&shares, CommissionTier::Shop).unwrap();

        // 100 - 40 - 10 - 15 = 35
        assert_eq!(distributor.percentage, dec("35"));
        assert_eq!(distributor.amount, dec("350"));
        assert_eq!(salesman.percentage, dec("15"));
        assert_eq!(salesman.amount, dec("150"));
        assert_eq!(shop.amount, dec("100"));

        // No rows for absent tiers
        assert!(share_for(&shares, CommissionTier::SubAgent).is_none());
        assert!(share_for(&shares, CommissionTier::Agent).is_none());
    }

    #[test]
    fn test_sub_agent_sale_shares() {
        let shares = calculate_commission(
            dec("1000"),
            Some(SellerKind::SubAgent),
            &percentages(),
            MovementEvent::StockOut,
        );

        let distributor = share_for(&shares, CommissionTier::Distributor).unwrap();
        let sub_agent = share_for(&shares, CommissionTier::SubAgent).unwrap();

        // 100 - 40 - 10 - 12 = 38
        assert_eq!(distributor.percentage, dec("38"));
        assert_eq!(sub_agent.percentage, dec("12"));
        assert_eq!(sub_agent.amount, dec("120"));
    }

    /// Agent sales keep the shop percentage inside the distributor share,
    /// yet a shop row is still written for stock-out. The written
    /// percentages for an agent stock-out therefore exceed 100.
    #[test]
    fn test_agent_sale_keeps_shop_cut_in_distributor_share() {
        let shares = calculate_commission(
            dec("1000"),
            Some(SellerKind::Agent),
            &percentages(),
            MovementEvent::StockOut,
        );

        let distributor = share_for(&shares, CommissionTier::Distributor).unwrap();
        let agent = share_for(&shares, CommissionTier::Agent).unwrap();
        let shop = share_for(&shares, CommissionTier::Shop).unwrap();

        // 100 - 40 - 8 = 52; shop's 10 is not subtracted
        assert_eq!(distributor.percentage, dec("52"));
        assert_eq!(agent.percentage, dec("8"));
        assert_eq!(shop.percentage, dec("10"));

        let written: Decimal = shares.iter().map(|s| s.percentage).sum();
        assert_eq!(written + percentages().supplier, dec("110"));
    }

    #[test]
    fn test_no_shop_share_on_stock_in_with_seller() {
        for kind in [SellerKind::Salesman, SellerKind::SubAgent, SellerKind::Agent] {
            let shares =
                calculate_commission(dec("1000"), Some(kind), &percentages(), MovementEvent::StockIn);
            assert!(
                share_for(&shares, CommissionTier::Shop).is_none(),
                "stock-in must not produce a shop share for {}",
                kind
            );
        }
    }

    #[test]
    fn test_zero_net_price_yields_zero_amounts() {
        let shares = calculate_commission(
            Decimal::ZERO,
            Some(SellerKind::Salesman),
            &percentages(),
            MovementEvent::StockOut,
        );
        for share in shares {
            assert_eq!(share.amount, Decimal::ZERO);
        }
    }

    #[test]
    fn test_from_entries_requires_every_key() {
        let mut entries: Vec<(String, Decimal)> = vec![
            ("supplier".to_string(), dec("40")),
            ("shop".to_string(), dec("10")),
            ("salesman".to_string(), dec("15")),
            ("sub_agent".to_string(), dec("12")),
            ("agent".to_string(), dec("8")),
        ];

        assert!(CommissionPercentages::from_entries(&entries).is_ok());

        entries.retain(|(k, _)| k != "shop");
        let err = CommissionPercentages::from_entries(&entries).unwrap_err();
        assert!(err.contains("shop"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn table_strategy() -> impl Strategy<Value = CommissionPercentages> {
        (0u32..=40, 0u32..=20, 0u32..=15, 0u32..=12, 0u32..=10).prop_map(
            |(supplier, shop, salesman, sub_agent, agent)| CommissionPercentages {
                supplier: Decimal::from(supplier),
                shop: Decimal::from(shop),
                salesman: Decimal::from(salesman),
                sub_agent: Decimal::from(sub_agent),
                agent: Decimal::from(agent),
            },
        )
    }

    fn seller_strategy() -> impl Strategy<Value = Option<SellerKind>> {
        prop_oneof![
            Just(None),
            Just(Some(SellerKind::Salesman)),
            Just(Some(SellerKind::SubAgent)),
            Just(Some(SellerKind::Agent)),
        ]
    }

    fn event_strategy() -> impl Strategy<Value = MovementEvent> {
        prop_oneof![Just(MovementEvent::StockIn), Just(MovementEvent::StockOut)]
    }

    proptest! {
        /// Property: distributor% + sellerTier% + shop% + supplier% = 100,
        /// except the agent case where shop% is excluded from the subtraction.
        #[test]
        fn prop_share_percentages_sum(
            net in 1u64..10_000_000u64,
            table in table_strategy(),
            seller in seller_strategy(),
            event in event_strategy()
        ) {
            let shares = calculate_commission(Decimal::from(net), seller, &table, event);

            let distributor = share_for(&shares, CommissionTier::Distributor).unwrap();
            let seller_percent = seller.map(|k| table.for_seller(k)).unwrap_or(Decimal::ZERO);

            let mut expected = Decimal::ONE_HUNDRED - table.supplier - seller_percent;
            if seller != Some(SellerKind::Agent) {
                expected -= table.shop;
            }
            prop_assert_eq!(distributor.percentage, expected);
        }

        /// Property: a shop share exists exactly for stock-out movements.
        #[test]
        fn prop_shop_share_only_for_stock_out(
            net in 1u64..10_000_000u64,
            table in table_strategy(),
            seller in seller_strategy(),
            event in event_strategy()
        ) {
            let shares = calculate_commission(Decimal::from(net), seller, &table, event);
            let has_shop = share_for(&shares, CommissionTier::Shop).is_some();
            prop_assert_eq!(has_shop, event == MovementEvent::StockOut);
        }

        /// Property: every share amount equals net * percentage / 100.
        #[test]
        fn prop_share_amounts_proportional(
            net in 1u64..10_000_000u64,
            table in table_strategy(),
            seller in seller_strategy(),
            event in event_strategy()
        ) {
            let net = Decimal::from(net);
            let shares = calculate_commission(net, seller, &table, event);

            for share in &shares {
                prop_assert_eq!(share.amount, net * share.percentage / Decimal::ONE_HUNDRED);
            }
        }

        /// Property: the seller tier row exists exactly when a seller is
        /// present, and only for the matching tier.
        #[test]
        fn prop_seller_tier_attribution(
            net in 1u64..10_000_000u64,
            table in table_strategy(),
            seller in seller_strategy(),
            event in event_strategy()
        ) {
            let shares = calculate_commission(Decimal::from(net), seller, &table, event);

            for kind in [SellerKind::Salesman, SellerKind::SubAgent, SellerKind::Agent] {
                let present = share_for(&shares, kind.into()).is_some();
                prop_assert_eq!(present, seller == Some(kind));
            }
        }
    }
}
