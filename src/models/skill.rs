use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    #[serde(rename = "employee")]
    pub employee_id: String,
    pub yrs_exp: i32,
    pub seniority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Skill fields written by the API; the store assigns the id.
#[derive(Debug, Clone)]
pub struct SkillRecord {
    pub name: String,
    pub employee_id: String,
    pub yrs_exp: i32,
    pub seniority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillRecord {
    pub fn into_skill(self, id: i64) -> Skill {
        Skill {
            id,
            name: self.name,
            employee_id: self.employee_id,
            yrs_exp: self.yrs_exp,
            seniority: self.seniority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
