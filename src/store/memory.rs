//! In-process store used when no database is configured.
//!
//! Enforces the same constraints as the SQL schema: unique employee id and
//! email, unique (name, employee) per skill, skills must reference an existing
//! employee, and deleting an employee deletes its skills.

use std::collections::BTreeMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::models::employee::Employee;
use crate::models::skill::{Skill, SkillRecord};
use crate::utils::filter::EmployeeFilter;
use super::{
    Store, StoreError, StoreResult, EMPLOYEE_EMAIL_KEY, EMPLOYEE_PKEY, SKILL_EMPLOYEE_FKEY,
    SKILL_NAME_EMPLOYEE_KEY,
};

#[derive(Default)]
struct Tables {
    employees: BTreeMap<String, Employee>,
    skills: BTreeMap<i64, Skill>,
    last_skill_id: i64,
}

impl Tables {
    fn skills_of<'a>(&'a self, employee_id: &'a str) -> impl Iterator<Item = &'a Skill> + 'a {
        self.skills.values().filter(move |s| s.employee_id == employee_id)
    }

    fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> bool {
        self.employees
            .values()
            .any(|e| e.email == email && Some(e.id.as_str()) != exclude_id)
    }

    fn skill_taken(&self, name: &str, employee_id: &str, exclude_id: Option<i64>) -> bool {
        self.skills_of(employee_id)
            .any(|s| s.name == name && Some(s.id) != exclude_id)
    }

    fn check_skill(&self, name: &str, employee_id: &str, exclude_id: Option<i64>) -> StoreResult<()> {
        if !self.employees.contains_key(employee_id) {
            return Err(StoreError::foreign_key(SKILL_EMPLOYEE_FKEY));
        }
        if self.skill_taken(name, employee_id, exclude_id) {
            return Err(StoreError::unique(SKILL_NAME_EMPLOYEE_KEY));
        }
        Ok(())
    }
}

fn sort_skills(skills: &mut [Skill]) {
    skills.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let tables = self.tables.read().await;
        let mut employees: Vec<Employee> = tables
            .employees
            .values()
            .filter(|e| {
                let skills: Vec<Skill> = tables.skills_of(&e.id).cloned().collect();
                filter.matches(e, &skills)
            })
            .cloned()
            .collect();
        employees.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(employees)
    }

    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(id).cloned())
    }

    async fn employee_exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.tables.read().await.employees.contains_key(id))
    }

    async fn email_in_use(&self, email: &str, exclude_id: Option<&str>) -> StoreResult<bool> {
        Ok(self.tables.read().await.email_taken(email, exclude_id))
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<Employee> {
        let mut tables = self.tables.write().await;
        if tables.employees.contains_key(&employee.id) {
            return Err(StoreError::unique(EMPLOYEE_PKEY));
        }
        if tables.email_taken(&employee.email, None) {
            return Err(StoreError::unique(EMPLOYEE_EMAIL_KEY));
        }
        tables.employees.insert(employee.id.clone(), employee.clone());
        Ok(employee.clone())
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<Option<Employee>> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&employee.id) {
            return Ok(None);
        }
        if tables.email_taken(&employee.email, Some(&employee.id)) {
            return Err(StoreError::unique(EMPLOYEE_EMAIL_KEY));
        }
        tables.employees.insert(employee.id.clone(), employee.clone());
        Ok(Some(employee.clone()))
    }

    async fn delete_employee(&self, id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.employees.remove(id).is_none() {
            return Ok(false);
        }
        tables.skills.retain(|_, s| s.employee_id != id);
        Ok(true)
    }

    async fn list_skills(&self) -> StoreResult<Vec<Skill>> {
        let mut skills: Vec<Skill> = self.tables.read().await.skills.values().cloned().collect();
        sort_skills(&mut skills);
        Ok(skills)
    }

    async fn skills_for_employees(&self, employee_ids: &[String]) -> StoreResult<Vec<Skill>> {
        let mut skills: Vec<Skill> = self
            .tables
            .read()
            .await
            .skills
            .values()
            .filter(|s| employee_ids.contains(&s.employee_id))
            .cloned()
            .collect();
        sort_skills(&mut skills);
        Ok(skills)
    }

    async fn get_skill(&self, id: i64) -> StoreResult<Option<Skill>> {
        Ok(self.tables.read().await.skills.get(&id).cloned())
    }

    async fn skill_name_taken(&self, name: &str, employee_id: &str, exclude_id: Option<i64>) -> StoreResult<bool> {
        Ok(self.tables.read().await.skill_taken(name, employee_id, exclude_id))
    }

    async fn insert_skill(&self, skill: &SkillRecord) -> StoreResult<Skill> {
        let mut tables = self.tables.write().await;
        tables.check_skill(&skill.name, &skill.employee_id, None)?;
        tables.last_skill_id += 1;
        let created = skill.clone().into_skill(tables.last_skill_id);
        tables.skills.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_skill(&self, skill: &Skill) -> StoreResult<Option<Skill>> {
        let mut tables = self.tables.write().await;
        if !tables.skills.contains_key(&skill.id) {
            return Ok(None);
        }
        tables.check_skill(&skill.name, &skill.employee_id, Some(skill.id))?;
        tables.skills.insert(skill.id, skill.clone());
        Ok(Some(skill.clone()))
    }

    async fn delete_skill(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.skills.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};

    fn employee(id: &str, email: &str, minutes_ago: i64) -> Employee {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Employee {
            id: id.to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            contact_number: None,
            street_address: None,
            city: None,
            postcode: None,
            country: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn skill(name: &str, employee_id: &str) -> SkillRecord {
        let now = Utc::now();
        SkillRecord {
            name: name.to_string(),
            employee_id: employee_id.to_string(),
            yrs_exp: 3,
            seniority: "Mid".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[actix_web::test]
    async fn employees_list_most_recently_updated_first() {
        let store = MemoryStore::new();
        store.insert_employee(&employee("AA0001", "old@example.com", 30)).await.unwrap();
        store.insert_employee(&employee("AA0002", "new@example.com", 1)).await.unwrap();
        store.insert_employee(&employee("AA0003", "mid@example.com", 10)).await.unwrap();

        let ids: Vec<String> = store
            .list_employees(&EmployeeFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["AA0002", "AA0003", "AA0001"]);
    }

    #[actix_web::test]
    async fn employee_constraints_are_enforced() {
        let store = MemoryStore::new();
        store.insert_employee(&employee("AA0001", "a@example.com", 0)).await.unwrap();

        let dup_id = store.insert_employee(&employee("AA0001", "b@example.com", 0)).await.unwrap_err();
        assert!(dup_id.violates(EMPLOYEE_PKEY));

        let dup_email = store.insert_employee(&employee("AA0002", "a@example.com", 0)).await.unwrap_err();
        assert!(dup_email.violates(EMPLOYEE_EMAIL_KEY));

        // Email matching is exact.
        store.insert_employee(&employee("AA0003", "A@example.com", 0)).await.unwrap();
        assert!(store.email_in_use("a@example.com", None).await.unwrap());
        assert!(!store.email_in_use("a@example.com", Some("AA0001")).await.unwrap());
    }

    #[actix_web::test]
    async fn skill_constraints_are_enforced() {
        let store = MemoryStore::new();
        store.insert_employee(&employee("AA0001", "a@example.com", 0)).await.unwrap();

        let python = store.insert_skill(&skill("Python", "AA0001")).await.unwrap();
        assert_eq!(python.id, 1);

        let dup = store.insert_skill(&skill("Python", "AA0001")).await.unwrap_err();
        assert!(dup.violates(SKILL_NAME_EMPLOYEE_KEY));

        let orphan = store.insert_skill(&skill("Go", "ZZ0000")).await.unwrap_err();
        assert!(matches!(orphan, StoreError::ForeignKeyViolation { .. }));

        // Renaming a skill onto itself is not a conflict.
        let mut renamed = python.clone();
        renamed.yrs_exp = 9;
        assert_eq!(store.update_skill(&renamed).await.unwrap().map(|s| s.yrs_exp), Some(9));
    }

    #[actix_web::test]
    async fn deleting_an_employee_cascades_to_skills() {
        let store = MemoryStore::new();
        store.insert_employee(&employee("AA0001", "a@example.com", 0)).await.unwrap();
        store.insert_employee(&employee("AA0002", "b@example.com", 0)).await.unwrap();
        let kept = store.insert_skill(&skill("Rust", "AA0002")).await.unwrap();
        let gone = store.insert_skill(&skill("Rust", "AA0001")).await.unwrap();

        assert!(store.delete_employee("AA0001").await.unwrap());
        assert!(!store.delete_employee("AA0001").await.unwrap());
        assert!(store.get_skill(gone.id).await.unwrap().is_none());
        assert!(store.get_skill(kept.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn skills_are_listed_by_name() {
        let store = MemoryStore::new();
        store.insert_employee(&employee("AA0001", "a@example.com", 0)).await.unwrap();
        for name in ["Rust", "Go", "Python", "C"] {
            store.insert_skill(&skill(name, "AA0001")).await.unwrap();
        }

        let names: Vec<String> = store.list_skills().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["C", "Go", "Python", "Rust"]);
    }
}
