//! Per-field validation for the auth endpoints.
//!
//! Each field gets an explicit ordered list of rules; the first failing
//! rule contributes one structured error, and every failing field is
//! reported, not just the first.

use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::{LoginRequest, RegisterRequest, ResendOtpRequest, VerifyOtpRequest};
use crate::response::FieldError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn present(value: &str) -> bool {
    !value.is_empty()
}

fn alphanumeric(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric())
}

fn min_six(value: &str) -> bool {
    value.chars().count() >= 6
}

type Rule = (fn(&str) -> bool, &'static str);

fn check(errors: &mut Vec<FieldError>, field: &'static str, value: &str, rules: &[Rule]) {
    for (ok, message) in rules {
        if !ok(value) {
            errors.push(FieldError::new(field, *message));
            return;
        }
    }
}

pub fn register_fields(input: &RegisterRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        "firstName",
        &input.first_name,
        &[
            (present, "First name must be specified."),
            (alphanumeric, "First name has non-alphanumeric characters."),
        ],
    );
    check(
        &mut errors,
        "lastName",
        &input.last_name,
        &[
            (present, "Last name must be specified."),
            (alphanumeric, "Last name has non-alphanumeric characters."),
        ],
    );
    check(
        &mut errors,
        "email",
        &input.email,
        &[
            (present, "Email must be specified."),
            (is_valid_email, "Email must be a valid email address."),
        ],
    );
    check(
        &mut errors,
        "password",
        &input.password,
        &[(min_six, "Password must be 6 characters or greater.")],
    );
    errors
}

pub fn login_fields(input: &LoginRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        "email",
        &input.email,
        &[
            (present, "Email must be specified."),
            (is_valid_email, "Email must be a valid email address."),
        ],
    );
    check(
        &mut errors,
        "password",
        &input.password,
        &[(present, "Password must be specified.")],
    );
    errors
}

pub fn verify_fields(input: &VerifyOtpRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        "email",
        &input.email,
        &[
            (present, "Email must be specified."),
            (is_valid_email, "Email must be a valid email address."),
        ],
    );
    check(
        &mut errors,
        "otp",
        &input.otp,
        &[(present, "OTP must be specified.")],
    );
    errors
}

pub fn resend_fields(input: &ResendOtpRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check(
        &mut errors,
        "email",
        &input.email,
        &[
            (present, "Email must be specified."),
            (is_valid_email, "Email must be a valid email address."),
        ],
    );
    errors
}

/// Escape characters that are unsafe to echo back in HTML contexts.
/// Applied to every string field before it is stored.
pub fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_input(
        first: &str,
        last: &str,
        email: &str,
        password: &str,
    ) -> RegisterRequest {
        RegisterRequest {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            password: password.into(),
        }
        .normalized()
    }

    #[test]
    fn register_reports_every_failing_field() {
        let input = register_input("", "", "nonsense", "abc");
        let errors = register_fields(&input);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["firstName", "lastName", "email", "password"]);
    }

    #[test]
    fn register_accepts_well_formed_input() {
        let input = register_input("Maya", "Ortiz", "maya@example.com", "secret1");
        assert!(register_fields(&input).is_empty());
    }

    #[test]
    fn names_must_be_alphanumeric() {
        let input = register_input("Maya!", "O'Brien", "maya@example.com", "secret1");
        let errors = register_fields(&input);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("non-alphanumeric"));
        assert!(errors[1].message.contains("non-alphanumeric"));
    }

    #[test]
    fn only_first_failing_rule_per_field_is_reported() {
        // An empty name trips the presence rule; the alphanumeric rule
        // never gets a turn.
        let input = register_input("", "Ortiz", "maya@example.com", "secret1");
        let errors = register_fields(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "First name must be specified.");
    }

    #[test]
    fn password_shorter_than_six_is_rejected() {
        let input = register_input("Maya", "Ortiz", "maya@example.com", "12345");
        let errors = register_fields(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "password");
    }

    #[test]
    fn email_format_checks() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn login_requires_both_fields() {
        let input = LoginRequest {
            email: "".into(),
            password: "".into(),
        };
        let errors = login_fields(&input);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Email must be specified.");
        assert_eq!(errors[1].message, "Password must be specified.");
    }

    #[test]
    fn verify_requires_otp() {
        let input = VerifyOtpRequest {
            email: "a@x.com".into(),
            otp: "".into(),
        };
        let errors = verify_fields(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "otp");
    }

    #[test]
    fn resend_validates_email_format() {
        let input = ResendOtpRequest {
            email: "not-an-email".into(),
        };
        let errors = resend_fields(&input);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Email must be a valid email address.");
    }

    #[test]
    fn sanitize_escapes_unsafe_characters() {
        assert_eq!(
            sanitize(r#"<b>"O'Brien" & /co</b>"#),
            "&lt;b&gt;&quot;O&#x27;Brien&quot; &amp; &#x2F;co&lt;&#x2F;b&gt;"
        );
    }

    #[test]
    fn sanitize_leaves_plain_text_untouched() {
        assert_eq!(sanitize("maya@example.com"), "maya@example.com");
    }
}
