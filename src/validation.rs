use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 32_000;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 32_000;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= MAX_EMAIL_LENGTH && EMAIL_RE.is_match(email)
}

/// Tag colors are `#RRGGBB` hex codes, nothing else.
pub fn is_valid_hex_color(color: &str) -> bool {
    lazy_static! {
        static ref COLOR_RE: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap();
    }
    COLOR_RE.is_match(color)
}

pub fn is_valid_slug(slug: &str) -> bool {
    lazy_static! {
        static ref SLUG_RE: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
    }
    SLUG_RE.is_match(slug)
}

pub fn check_cooking_time(minutes: i32) -> Result<(), ApiError> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&minutes) {
        return Err(ApiError::Validation(format!(
            "cooking_time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME}"
        )));
    }
    Ok(())
}

pub fn check_amount(amount: i32) -> Result<(), ApiError> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(ApiError::Validation(format!(
            "amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(is_valid_email("cook@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
    }

    #[test]
    fn rejects_overlong_email() {
        let local = "a".repeat(MAX_EMAIL_LENGTH);
        assert!(!is_valid_email(&format!("{local}@example.com")));
    }

    #[test]
    fn hex_color_accepts_six_digit_codes() {
        assert!(is_valid_hex_color("#AABBCC"));
        assert!(is_valid_hex_color("#0f0f0f"));
    }

    #[test]
    fn hex_color_rejects_everything_else() {
        assert!(!is_valid_hex_color("notacolor"));
        assert!(!is_valid_hex_color("#ABC"));
        assert!(!is_valid_hex_color("#AABBCG"));
        assert!(!is_valid_hex_color("AABBCC"));
        assert!(!is_valid_hex_color("#AABBCC1"));
    }

    #[test]
    fn slug_allows_word_chars_and_dashes() {
        assert!(is_valid_slug("breakfast"));
        assert!(is_valid_slug("low_carb-2"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn cooking_time_bounds() {
        assert!(check_cooking_time(MIN_COOKING_TIME).is_ok());
        assert!(check_cooking_time(MAX_COOKING_TIME).is_ok());
        assert!(check_cooking_time(0).is_err());
        assert!(check_cooking_time(MAX_COOKING_TIME + 1).is_err());
    }

    #[test]
    fn amount_bounds() {
        assert!(check_amount(1).is_ok());
        assert!(check_amount(0).is_err());
        assert!(check_amount(MAX_AMOUNT + 1).is_err());
    }
}
