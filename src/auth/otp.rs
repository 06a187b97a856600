use rand::Rng;

pub const OTP_MIN: i32 = 1_000;
pub const OTP_MAX: i32 = 9_999;

/// Four-digit confirmation code, uniform over 1000..=9999 so the leading
/// digit is never zero.
pub fn generate() -> i32 {
    rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX)
}

/// Compare a submitted code against the stored one. The submitted value
/// arrives as a form string and is compared by numeric value; anything
/// non-numeric is simply a mismatch. A user with no pending code never
/// matches.
pub fn matches(stored: Option<i32>, submitted: &str) -> bool {
    match (stored, submitted.trim().parse::<i32>()) {
        (Some(expected), Ok(given)) => expected == given,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_stay_in_four_digit_range() {
        for _ in 0..1_000 {
            let code = generate();
            assert!((OTP_MIN..=OTP_MAX).contains(&code), "out of range: {code}");
        }
    }

    #[test]
    fn matches_numeric_string() {
        assert!(matches(Some(4821), "4821"));
        assert!(matches(Some(4821), " 4821 "));
    }

    #[test]
    fn rejects_wrong_or_garbage_input() {
        assert!(!matches(Some(4821), "4822"));
        assert!(!matches(Some(4821), "48 21"));
        assert!(!matches(Some(4821), "abcd"));
        assert!(!matches(Some(4821), ""));
    }

    #[test]
    fn no_pending_code_never_matches() {
        assert!(!matches(None, "1234"));
        assert!(!matches(None, ""));
    }
}
