use std::borrow::Cow;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError};
use crate::errors::{AppError, FieldErrors};
use crate::store::{Store, StoreError, EMPLOYEE_EMAIL_KEY};

pub const REQUIRED: &str = "This field is required.";
pub const EMAIL_TAKEN: &str = "Email already exists";
pub const EMAIL_TAKEN_BY_OTHER: &str = "Email already exists and belongs to another user";

static CONTACT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{3}-?\d{3}-?\d{4}$|^\d{10}$").expect("contact number pattern is valid")
});

fn rejection(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Runs the derived field validators, returning every rejection found.
pub fn validate_payload<T: Validate>(payload: &T) -> FieldErrors {
    match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

/// Adds `This field is required.` for each named field that is absent and
/// not already rejected for another reason.
pub fn require(errors: &mut FieldErrors, fields: &[(&str, bool)]) {
    for (field, present) in fields {
        if !present && errors.get(field).is_none() {
            errors.add(*field, REQUIRED);
        }
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rejection("blank", "This field may not be blank."));
    }
    Ok(())
}

pub fn validate_contact_number(value: &str) -> Result<(), ValidationError> {
    if !CONTACT_NUMBER.is_match(value) {
        return Err(rejection("contact_number", "Invalid phone number format"));
    }
    Ok(())
}

pub fn validate_date_of_birth(value: &NaiveDate) -> Result<(), ValidationError> {
    check_date_of_birth(*value, Local::now().date_naive())
}

pub fn check_date_of_birth(value: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if value > today {
        return Err(rejection("date_of_birth", "Date of birth cannot be in the future"));
    }
    Ok(())
}

/// Rejection reason if `email` is held by an employee other than `current_id`.
/// `current_id` is `None` when creating.
pub async fn email_conflict(
    store: &dyn Store,
    email: &str,
    current_id: Option<&str>,
) -> Result<Option<&'static str>, AppError> {
    if !store.email_in_use(email, current_id).await? {
        return Ok(None);
    }
    Ok(Some(if current_id.is_some() { EMAIL_TAKEN_BY_OTHER } else { EMAIL_TAKEN }))
}

/// Maps the store's email uniqueness constraint to the same field error the
/// pre-check reports; everything else passes through.
pub fn email_constraint_error(err: StoreError, reason: &'static str) -> AppError {
    if err.violates(EMPLOYEE_EMAIL_KEY) {
        let mut fields = FieldErrors::new();
        fields.add("email", reason);
        return AppError::Validation(fields);
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: ValidationError) -> String {
        err.message.map(|m| m.to_string()).unwrap_or_default()
    }

    #[test]
    fn contact_numbers_accept_plain_and_dashed_forms() {
        for ok in ["1234567890", "123-456-7890", "123-4567890", "123456-7890"] {
            assert!(validate_contact_number(ok).is_ok(), "{} should pass", ok);
        }
    }

    #[test]
    fn contact_numbers_reject_other_shapes() {
        for bad in ["12345678901", "123456789", "123 456 7890", "(123)456-7890", "123--456-7890", "abcdefghij", ""] {
            let err = validate_contact_number(bad).unwrap_err();
            assert_eq!(message(err), "Invalid phone number format", "{}", bad);
        }
    }

    #[test]
    fn date_of_birth_may_be_today_but_not_later() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 21).unwrap();
        assert!(check_date_of_birth(today, today).is_ok());
        assert!(check_date_of_birth(today.pred_opt().unwrap(), today).is_ok());

        let err = check_date_of_birth(today.succ_opt().unwrap(), today).unwrap_err();
        assert_eq!(message(err), "Date of birth cannot be in the future");
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("Doe").is_ok());
        assert_eq!(message(validate_not_blank("   ").unwrap_err()), "This field may not be blank.");
    }

    #[test]
    fn require_reports_absent_fields() {
        let mut errors = FieldErrors::new();
        require(&mut errors, &[("first_name", true), ("city", false)]);
        assert!(errors.get("first_name").is_none());
        assert_eq!(errors.get("city"), Some(&[REQUIRED.to_string()][..]));
    }

    #[test]
    fn require_keeps_an_earlier_rejection() {
        let mut errors = FieldErrors::new();
        errors.add("first_name", "This field may not be null.");
        require(&mut errors, &[("first_name", false)]);
        assert_eq!(errors.get("first_name"), Some(&["This field may not be null.".to_string()][..]));
    }
}
