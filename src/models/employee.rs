use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::models::skill::Skill;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub contact_number: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee as returned by the API, with its skills embedded.
#[derive(Serialize, Debug)]
pub struct EmployeeWithSkills {
    #[serde(flatten)]
    pub employee: Employee,
    pub skills: Vec<Skill>,
}

impl EmployeeWithSkills {
    /// Groups `skills` under their owning employees, keeping the order of
    /// both inputs. Skills whose employee is not in `employees` are dropped.
    pub fn aggregate(employees: Vec<Employee>, skills: Vec<Skill>) -> Vec<EmployeeWithSkills> {
        let position: HashMap<String, usize> = employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        let mut grouped: Vec<EmployeeWithSkills> = employees
            .into_iter()
            .map(|employee| EmployeeWithSkills { employee, skills: Vec::new() })
            .collect();

        for skill in skills {
            if let Some(&i) = position.get(&skill.employee_id) {
                grouped[i].skills.push(skill);
            }
        }

        grouped
    }
}
