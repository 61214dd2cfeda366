use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use crate::models::employee::Employee;
use crate::models::skill::{Skill, SkillRecord};
use crate::utils::filter::{EmployeeFilter, Predicate, TextField};
use super::{Store, StoreResult};

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, date_of_birth, contact_number, \
     street_address, city, postcode, country, created_at, updated_at";
const SKILL_COLUMNS: &str = "id, name, employee_id, yrs_exp, seniority, created_at, updated_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `ILIKE` pattern matching `value` anywhere, with wildcards in it escaped.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_contains(query: &mut QueryBuilder<'_, Postgres>, field: TextField, value: &str) {
    query.push(field.column());
    query.push(" ILIKE ");
    query.push_bind(contains_pattern(value));
}

fn push_predicate(query: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Contains(field, value) => push_contains(query, *field, value),
        Predicate::BornOn(date) => {
            query.push("date_of_birth = ");
            query.push_bind(*date);
        }
        Predicate::BornOnOrAfter(date) => {
            query.push("date_of_birth >= ");
            query.push_bind(*date);
        }
        Predicate::BornOnOrBefore(date) => {
            query.push("date_of_birth <= ");
            query.push_bind(*date);
        }
        Predicate::HasAnySkill(names) => {
            query.push("EXISTS (SELECT 1 FROM skills WHERE skills.employee_id = employees.id AND skills.name = ANY(");
            query.push_bind(names.clone());
            query.push("))");
        }
        Predicate::Search(terms) => {
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    query.push(" AND ");
                }
                query.push("(");
                for (j, field) in TextField::SEARCHABLE.iter().enumerate() {
                    if j > 0 {
                        query.push(" OR ");
                    }
                    push_contains(query, *field, term);
                }
                query.push(")");
            }
        }
    }
}

/// Builds the employee listing query for `filter`.
pub fn employee_query(filter: &EmployeeFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {} FROM employees", EMPLOYEE_COLUMNS));

    for (i, predicate) in filter.predicates().iter().enumerate() {
        query.push(if i == 0 { " WHERE (" } else { " AND (" });
        push_predicate(&mut query, predicate);
        query.push(")");
    }

    query.push(" ORDER BY updated_at DESC, id");
    query
}

#[async_trait]
impl Store for PgStore {
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let mut query = employee_query(filter);
        let employees = query
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn employee_exists(&self, id: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM employees WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn email_in_use(&self, email: &str, exclude_id: Option<&str>) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE email = $1 AND ($2::TEXT IS NULL OR id <> $2::TEXT))",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_employee(&self, employee: &Employee) -> StoreResult<Employee> {
        let sql = format!(
            "INSERT INTO employees ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            EMPLOYEE_COLUMNS, EMPLOYEE_COLUMNS
        );
        let created = sqlx::query_as::<_, Employee>(&sql)
            .bind(&employee.id)
            .bind(&employee.first_name)
            .bind(&employee.last_name)
            .bind(&employee.email)
            .bind(employee.date_of_birth)
            .bind(&employee.contact_number)
            .bind(&employee.street_address)
            .bind(&employee.city)
            .bind(&employee.postcode)
            .bind(&employee.country)
            .bind(employee.created_at)
            .bind(employee.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_employee(&self, employee: &Employee) -> StoreResult<Option<Employee>> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE employees SET ");
        let mut separated = query.separated(", ");
        separated.push("first_name = ");
        separated.push_bind_unseparated(&employee.first_name);
        separated.push("last_name = ");
        separated.push_bind_unseparated(&employee.last_name);
        separated.push("email = ");
        separated.push_bind_unseparated(&employee.email);
        separated.push("date_of_birth = ");
        separated.push_bind_unseparated(employee.date_of_birth);
        separated.push("contact_number = ");
        separated.push_bind_unseparated(&employee.contact_number);
        separated.push("street_address = ");
        separated.push_bind_unseparated(&employee.street_address);
        separated.push("city = ");
        separated.push_bind_unseparated(&employee.city);
        separated.push("postcode = ");
        separated.push_bind_unseparated(&employee.postcode);
        separated.push("country = ");
        separated.push_bind_unseparated(&employee.country);
        separated.push("updated_at = ");
        separated.push_bind_unseparated(employee.updated_at);
        query.push(" WHERE id = ");
        query.push_bind(&employee.id);
        query.push(format!(" RETURNING {}", EMPLOYEE_COLUMNS));

        let updated = query
            .build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_employee(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_skills(&self) -> StoreResult<Vec<Skill>> {
        let sql = format!("SELECT {} FROM skills ORDER BY name, id", SKILL_COLUMNS);
        let skills = sqlx::query_as::<_, Skill>(&sql).fetch_all(&self.pool).await?;
        Ok(skills)
    }

    async fn skills_for_employees(&self, employee_ids: &[String]) -> StoreResult<Vec<Skill>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM skills WHERE employee_id = ANY($1) ORDER BY name, id",
            SKILL_COLUMNS
        );
        let skills = sqlx::query_as::<_, Skill>(&sql)
            .bind(employee_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(skills)
    }

    async fn get_skill(&self, id: i64) -> StoreResult<Option<Skill>> {
        let sql = format!("SELECT {} FROM skills WHERE id = $1", SKILL_COLUMNS);
        let skill = sqlx::query_as::<_, Skill>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(skill)
    }

    async fn skill_name_taken(&self, name: &str, employee_id: &str, exclude_id: Option<i64>) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM skills WHERE name = $1 AND employee_id = $2 AND ($3::BIGINT IS NULL OR id <> $3::BIGINT))",
        )
        .bind(name)
        .bind(employee_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_skill(&self, skill: &SkillRecord) -> StoreResult<Skill> {
        let sql = format!(
            "INSERT INTO skills (name, employee_id, yrs_exp, seniority, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            SKILL_COLUMNS
        );
        let created = sqlx::query_as::<_, Skill>(&sql)
            .bind(&skill.name)
            .bind(&skill.employee_id)
            .bind(skill.yrs_exp)
            .bind(&skill.seniority)
            .bind(skill.created_at)
            .bind(skill.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_skill(&self, skill: &Skill) -> StoreResult<Option<Skill>> {
        let sql = format!(
            "UPDATE skills SET name = $1, employee_id = $2, yrs_exp = $3, seniority = $4, updated_at = $5 \
             WHERE id = $6 RETURNING {}",
            SKILL_COLUMNS
        );
        let updated = sqlx::query_as::<_, Skill>(&sql)
            .bind(&skill.name)
            .bind(&skill.employee_id)
            .bind(skill.yrs_exp)
            .bind(&skill.seniority)
            .bind(skill.updated_at)
            .bind(skill.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_skill(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
