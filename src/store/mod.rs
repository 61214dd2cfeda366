//! Persistence seam between the handlers and the relational store.
//!
//! Constraint names are shared by both implementations so callers can tell
//! which invariant a write tripped over.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use crate::models::employee::Employee;
use crate::models::skill::{Skill, SkillRecord};
use crate::utils::filter::EmployeeFilter;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const EMPLOYEE_PKEY: &str = "employees_pkey";
pub const EMPLOYEE_EMAIL_KEY: &str = "employees_email_key";
pub const SKILL_NAME_EMPLOYEE_KEY: &str = "skills_name_employee_key";
pub const SKILL_EMPLOYEE_FKEY: &str = "skills_employee_fkey";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },
    #[error("foreign key constraint violated: {}", .constraint.as_deref().unwrap_or("unknown"))]
    ForeignKeyViolation { constraint: Option<String> },
    #[error(transparent)]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn unique(constraint: &str) -> Self {
        StoreError::UniqueViolation { constraint: Some(constraint.to_string()) }
    }

    pub fn foreign_key(constraint: &str) -> Self {
        StoreError::ForeignKeyViolation { constraint: Some(constraint.to_string()) }
    }

    /// True if this is a unique violation of the named constraint.
    pub fn violates(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint: Some(c) } if c == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().map(str::to_owned);
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation { constraint };
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Employees matching every predicate of `filter`, most recently updated first.
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>>;
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>>;
    async fn employee_exists(&self, id: &str) -> StoreResult<bool>;
    /// Whether an employee other than `exclude_id` holds exactly `email`.
    async fn email_in_use(&self, email: &str, exclude_id: Option<&str>) -> StoreResult<bool>;
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<Employee>;
    /// Replaces the stored row with the same id. `None` if there is no such row.
    async fn update_employee(&self, employee: &Employee) -> StoreResult<Option<Employee>>;
    /// Deletes the employee and its skills. `false` if there was nothing to delete.
    async fn delete_employee(&self, id: &str) -> StoreResult<bool>;

    /// All skills, alphabetical by name.
    async fn list_skills(&self) -> StoreResult<Vec<Skill>>;
    /// Skills owned by any of `employee_ids`, alphabetical by name.
    async fn skills_for_employees(&self, employee_ids: &[String]) -> StoreResult<Vec<Skill>>;
    async fn get_skill(&self, id: i64) -> StoreResult<Option<Skill>>;
    /// Whether `employee_id` already has a skill called `name`, other than `exclude_id`.
    async fn skill_name_taken(&self, name: &str, employee_id: &str, exclude_id: Option<i64>) -> StoreResult<bool>;
    async fn insert_skill(&self, skill: &SkillRecord) -> StoreResult<Skill>;
    async fn update_skill(&self, skill: &Skill) -> StoreResult<Option<Skill>>;
    async fn delete_skill(&self, id: i64) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violates_matches_constraint_name() {
        let err = StoreError::unique(EMPLOYEE_PKEY);
        assert!(err.violates(EMPLOYEE_PKEY));
        assert!(!err.violates(EMPLOYEE_EMAIL_KEY));
        assert!(!StoreError::foreign_key(SKILL_EMPLOYEE_FKEY).violates(SKILL_EMPLOYEE_FKEY));
        assert_eq!(err.to_string(), "unique constraint violated: employees_pkey");
    }
}
