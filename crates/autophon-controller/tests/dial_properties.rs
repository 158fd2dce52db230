//! Property-based tests for dial decoding and admin code matching.

use autophon_controller::DialAccumulator;
use autophon_core::{AdminCodes, DialCode, DialCommand};
use proptest::prelude::*;

/// Pulses a rotary dial sends for `digit`.
fn pulses_for(digit: u8) -> u32 {
    if digit == 0 { 10 } else { u32::from(digit) }
}

fn accumulate(digits: &[u8]) -> DialAccumulator {
    let mut acc = DialAccumulator::new();
    for digit in digits {
        acc.push_pulses(pulses_for(*digit)).unwrap();
    }
    acc
}

/// Strategy for generating digit sequences.
fn digits(len: std::ops::RangeInclusive<usize>) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=9u8, len)
}

/// Strategy for generating a valid admin code pair.
fn admin_codes() -> impl Strategy<Value = AdminCodes> {
    (digits(1..=6), digits(1..=6)).prop_filter_map("cancel code collides", |(open, cancel)| {
        AdminCodes::new(DialCode::new(open).ok()?, DialCode::new(cancel).ok()?).ok()
    })
}

proptest! {
    /// Property: p pulses decode to p mod 10.
    #[test]
    fn prop_pulse_count_decodes_mod_ten(pulses in 1u32..=10u32) {
        let mut acc = DialAccumulator::new();
        let digit = acc.push_pulses(pulses).unwrap();
        prop_assert_eq!(u32::from(digit), pulses % 10);
    }

    /// Property: more than ten pulses never yields a digit.
    #[test]
    fn prop_too_many_pulses_rejected(pulses in 11u32..1000u32) {
        let mut acc = DialAccumulator::new();
        prop_assert!(acc.push_pulses(pulses).is_err());
        prop_assert!(!acc.is_valid());
    }

    /// Property: prefix plus one hour digit arms for that many hours.
    #[test]
    fn prop_open_code_with_hour_digit(codes in admin_codes(), hours in 0u8..=9u8) {
        let mut number = codes.open_prefix().digits().to_vec();
        number.push(hours);

        let acc = accumulate(&number);

        prop_assert_eq!(acc.interpret(&codes), Some(DialCommand::OpenFor { hours }));
    }

    /// Property: the exact cancel code is recognized.
    #[test]
    fn prop_cancel_code_exact(codes in admin_codes()) {
        let acc = accumulate(codes.cancel().digits());
        prop_assert_eq!(acc.interpret(&codes), Some(DialCommand::CancelAuto));
    }

    /// Property: any other sequence matches nothing.
    #[test]
    fn prop_other_sequences_ignored(codes in admin_codes(), number in digits(0..=12)) {
        let prefix = codes.open_prefix().digits();
        let is_open = number.len() == prefix.len() + 1 && number.starts_with(prefix);
        let is_cancel = number == codes.cancel().digits();
        prop_assume!(!is_open && !is_cancel);

        let acc = accumulate(&number);

        prop_assert_eq!(acc.interpret(&codes), None);
    }

    /// Property: the accumulator keeps digits in dialing order.
    #[test]
    fn prop_digits_kept_in_order(number in digits(1..=16)) {
        let acc = accumulate(&number);
        prop_assert_eq!(acc.digits(), number.as_slice());
        prop_assert_eq!(
            acc.to_string(),
            number.iter().map(u8::to_string).collect::<String>()
        );
    }
}
