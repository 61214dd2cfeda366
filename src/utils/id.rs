//! Employee primary keys: two uppercase letters followed by four digits.

use rand::Rng;
use crate::errors::AppError;
use crate::models::employee::Employee;
use crate::store::{Store, StoreError, EMPLOYEE_PKEY};
use crate::utils::validation::{email_constraint_error, EMAIL_TAKEN};

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Redraws allowed while looking for an id not already in the store.
pub const MAX_DRAWS: usize = 64;
/// Inserts retried when a concurrent writer claims the same id first.
pub const MAX_INSERT_ATTEMPTS: usize = 5;

pub fn generate_employee_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut id = String::with_capacity(6);
    for _ in 0..2 {
        id.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    }
    for _ in 0..4 {
        id.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
    }
    id
}

pub fn is_employee_id(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    bytes.len() == 6
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

/// Draws candidates until one is not held by any stored employee.
pub async fn generate_unique_employee_id(store: &dyn Store) -> Result<String, AppError> {
    for _ in 0..MAX_DRAWS {
        let candidate = generate_employee_id(&mut rand::thread_rng());
        if !store.employee_exists(&candidate).await? {
            return Ok(candidate);
        }
        log::debug!("Employee id {} already taken, redrawing", candidate);
    }
    Err(AppError::InternalServerError("Could not allocate an employee id".to_string()))
}

/// Persists a new employee, assigning an id first unless one is already set.
///
/// The existence check and the insert are not atomic, so a primary-key
/// conflict at insert time sends us back to draw another id. An id supplied
/// by the caller is inserted as-is and a conflict on it is reported.
pub async fn insert_with_unique_id(store: &dyn Store, mut employee: Employee) -> Result<Employee, AppError> {
    if !employee.id.is_empty() {
        return store.insert_employee(&employee).await.map_err(insert_error);
    }

    for attempt in 1..=MAX_INSERT_ATTEMPTS {
        employee.id = generate_unique_employee_id(store).await?;
        match store.insert_employee(&employee).await {
            Ok(created) => return Ok(created),
            Err(err) if err.violates(EMPLOYEE_PKEY) => {
                log::warn!("Employee id {} claimed concurrently (attempt {})", employee.id, attempt);
            }
            Err(err) => return Err(insert_error(err)),
        }
    }

    Err(AppError::InternalServerError("Could not allocate an employee id".to_string()))
}

fn insert_error(err: StoreError) -> AppError {
    email_constraint_error(err, EMAIL_TAKEN)
}
