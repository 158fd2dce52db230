use crate::{
    Result,
    constants::{MAX_DIAL_DIGITS, PULSES_FOR_ZERO},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Convert the pulse count of one rotary digit into its value.
///
/// One to nine pulses encode the digits 1-9, ten pulses encode 0.
///
/// # Errors
/// Returns `Error::InvalidPulseCount` for zero pulses or more than ten.
///
/// # Examples
///
/// ```
/// use autophon_core::digit_from_pulses;
///
/// assert_eq!(digit_from_pulses(3).unwrap(), 3);
/// assert_eq!(digit_from_pulses(10).unwrap(), 0);
/// assert!(digit_from_pulses(11).is_err());
/// ```
pub fn digit_from_pulses(pulses: u32) -> Result<u8> {
    if !(1..=PULSES_FOR_ZERO).contains(&pulses) {
        return Err(Error::InvalidPulseCount(pulses));
    }
    Ok((pulses % PULSES_FOR_ZERO) as u8)
}

/// A sequence of decimal digits dialed on the rotary mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DialCode(Vec<u8>);

impl DialCode {
    /// Create a dial code from raw digits.
    ///
    /// # Errors
    /// Returns `Error::InvalidDialCode` if a digit is above 9 or the sequence
    /// is longer than [`MAX_DIAL_DIGITS`].
    pub fn new(digits: Vec<u8>) -> Result<Self> {
        if let Some(d) = digits.iter().find(|d| **d > 9) {
            return Err(Error::InvalidDialCode(format!("digit out of range: {d}")));
        }
        if digits.len() > MAX_DIAL_DIGITS {
            return Err(Error::InvalidDialCode(format!(
                "at most {MAX_DIAL_DIGITS} digits, got {}",
                digits.len()
            )));
        }
        Ok(Self(digits))
    }

    #[must_use]
    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DialCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for d in &self.0 {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for DialCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s
            .chars()
            .map(|c| {
                c.to_digit(10)
                    .map(|d| d as u8)
                    .ok_or_else(|| Error::InvalidDialCode(format!("not a digit: {c:?} in {s:?}")))
            })
            .collect::<Result<Vec<u8>>>()?;
        DialCode::new(digits)
    }
}

/// Administrative command carried by a dialed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialCommand {
    /// Open the door without ringing for the given number of hours.
    OpenFor { hours: u8 },

    /// Leave automatic mode.
    CancelAuto,
}

impl fmt::Display for DialCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DialCommand::OpenFor { hours } => write!(f, "open for {hours}h"),
            DialCommand::CancelAuto => write!(f, "cancel automatic mode"),
        }
    }
}

/// The two statically configured admin codes.
///
/// The open code is a prefix: dialing the prefix followed by exactly one
/// more digit arms automatic mode for that many hours. The cancel code must
/// be dialed exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCodes {
    open_prefix: DialCode,
    cancel: DialCode,
}

impl AdminCodes {
    /// Create the admin code pair.
    ///
    /// # Errors
    /// Returns `Error::Config` if either code is empty, or if the cancel code
    /// would also be read as an open code (prefix plus one digit).
    pub fn new(open_prefix: DialCode, cancel: DialCode) -> Result<Self> {
        if open_prefix.is_empty() || cancel.is_empty() {
            return Err(Error::Config("admin codes must not be empty".to_string()));
        }
        if open_prefix.len() >= MAX_DIAL_DIGITS {
            return Err(Error::Config(format!(
                "open code must leave room for the hour digit (max {} digits)",
                MAX_DIAL_DIGITS - 1
            )));
        }
        let codes = Self {
            open_prefix,
            cancel,
        };
        if codes.match_open(codes.cancel.digits()).is_some() {
            return Err(Error::Config(format!(
                "cancel code {} collides with open code {}",
                codes.cancel, codes.open_prefix
            )));
        }
        Ok(codes)
    }

    #[must_use]
    pub fn open_prefix(&self) -> &DialCode {
        &self.open_prefix
    }

    #[must_use]
    pub fn cancel(&self) -> &DialCode {
        &self.cancel
    }

    /// Interpret a finished digit sequence.
    ///
    /// Returns `None` when the sequence matches neither code.
    ///
    /// # Examples
    ///
    /// ```
    /// use autophon_core::{AdminCodes, DialCommand};
    ///
    /// let codes = AdminCodes::new("42".parse().unwrap(), "43".parse().unwrap()).unwrap();
    /// assert_eq!(codes.match_digits(&[4, 2, 3]), Some(DialCommand::OpenFor { hours: 3 }));
    /// assert_eq!(codes.match_digits(&[4, 3]), Some(DialCommand::CancelAuto));
    /// assert_eq!(codes.match_digits(&[4, 2]), None);
    /// ```
    #[must_use]
    pub fn match_digits(&self, digits: &[u8]) -> Option<DialCommand> {
        if digits == self.cancel.digits() {
            return Some(DialCommand::CancelAuto);
        }
        self.match_open(digits)
    }

    fn match_open(&self, digits: &[u8]) -> Option<DialCommand> {
        match digits.strip_prefix(self.open_prefix.digits()) {
            Some([hours]) if *hours <= 9 => Some(DialCommand::OpenFor { hours: *hours }),
            _ => None,
        }
    }
}

impl Default for AdminCodes {
    fn default() -> Self {
        Self {
            open_prefix: DialCode(vec![4, 2]),
            cancel: DialCode(vec![4, 3]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(5, 5)]
    #[case(9, 9)]
    #[case(10, 0)]
    fn test_digit_from_pulses(#[case] pulses: u32, #[case] digit: u8) {
        assert_eq!(digit_from_pulses(pulses).unwrap(), digit);
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    #[case(42)]
    fn test_digit_from_pulses_rejects(#[case] pulses: u32) {
        assert!(matches!(
            digit_from_pulses(pulses),
            Err(Error::InvalidPulseCount(p)) if p == pulses
        ));
    }

    #[test]
    fn test_dial_code_parse_and_display() {
        let code: DialCode = " 0815 ".parse().unwrap();
        assert_eq!(code.digits(), &[0, 8, 1, 5]);
        assert_eq!(code.to_string(), "0815");
    }

    #[test]
    fn test_dial_code_rejects_non_digits() {
        assert!("12a".parse::<DialCode>().is_err());
        assert!(DialCode::new(vec![1, 10]).is_err());
        assert!(DialCode::new(vec![1; MAX_DIAL_DIGITS + 1]).is_err());
    }

    fn codes() -> AdminCodes {
        AdminCodes::new("42".parse().unwrap(), "43".parse().unwrap()).unwrap()
    }

    #[rstest]
    #[case(&[4, 2, 0], Some(DialCommand::OpenFor { hours: 0 }))]
    #[case(&[4, 2, 9], Some(DialCommand::OpenFor { hours: 9 }))]
    #[case(&[4, 3], Some(DialCommand::CancelAuto))]
    #[case(&[4, 2], None)]
    #[case(&[4, 2, 1, 1], None)]
    #[case(&[4, 3, 1], None)]
    #[case(&[2, 4, 1], None)]
    #[case(&[], None)]
    fn test_match_digits(#[case] digits: &[u8], #[case] expected: Option<DialCommand>) {
        assert_eq!(codes().match_digits(digits), expected);
    }

    #[test]
    fn test_admin_codes_reject_collision() {
        let result = AdminCodes::new("42".parse().unwrap(), "425".parse().unwrap());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_admin_codes_reject_empty() {
        let result = AdminCodes::new(DialCode::default(), "43".parse().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_admin_codes_default_matches_constants() {
        let codes = AdminCodes::default();
        assert_eq!(
            codes.open_prefix().to_string(),
            crate::constants::DEFAULT_OPEN_CODE
        );
        assert_eq!(codes.cancel().to_string(), crate::constants::DEFAULT_CANCEL_CODE);
    }

    #[test]
    fn test_dial_command_display() {
        assert_eq!(DialCommand::OpenFor { hours: 3 }.to_string(), "open for 3h");
        assert_eq!(DialCommand::CancelAuto.to_string(), "cancel automatic mode");
    }
}
