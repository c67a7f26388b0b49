use proptest::prelude::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use coursehub_api::services::pricing::{discounted_minor_units, price_to_minor_units};

proptest! {
    // Any representable positive price with two decimal places converts
    // exactly, and the discount never rounds more than half a minor unit
    // away from the exact product.
    #[test]
    fn minor_units_are_exact_for_two_decimal_prices(units in 1i64..10_000_000) {
        let price = Decimal::new(units, 2);
        let minor = price_to_minor_units(price).unwrap();
        prop_assert_eq!(minor, units);
    }

    #[test]
    fn discount_is_within_half_a_minor_unit_of_exact(base in 1i64..1_000_000_000) {
        let discounted = discounted_minor_units(base).unwrap();
        let exact = Decimal::from(base) * dec!(0.9);
        let diff = (Decimal::from(discounted) - exact).abs();
        prop_assert!(diff <= dec!(0.5));
    }

    #[test]
    fn discount_never_exceeds_base(base in 1i64..1_000_000_000) {
        let discounted = discounted_minor_units(base).unwrap();
        prop_assert!(discounted <= base);
        prop_assert!(discounted >= 0);
    }
}

#[rstest]
#[case(dec!(500.00), 50000, 45000)]
#[case(dec!(1.00), 100, 90)]
#[case(dec!(0.45), 45, 41)]
#[case(dec!(0.15), 15, 14)]
#[case(dec!(19.995), 2000, 1800)]
fn known_price_points(#[case] price: Decimal, #[case] base: i64, #[case] discounted: i64) {
    assert_eq!(price_to_minor_units(price).unwrap(), base);
    assert_eq!(discounted_minor_units(base).unwrap(), discounted);
}
