use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::Value;
use validator::Validate;
use crate::errors::{AppError, FieldErrors, NON_FIELD_ERRORS};
use crate::models::skill::{Skill, SkillRecord};
use crate::store::{Store, StoreError, SKILL_EMPLOYEE_FKEY, SKILL_NAME_EMPLOYEE_KEY};
use crate::utils::payload::JsonFields;
use crate::utils::validation::{require, validate_not_blank, validate_payload};

const NOT_UNIQUE: &str = "The fields name, employee must make a unique set.";

#[derive(Validate, Debug, Default)]
pub struct SkillPayload {
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    name: Option<String>,
    employee: Option<String>,
    yrs_exp: Option<i32>,
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    seniority: Option<String>,
}

impl SkillPayload {
    /// Known fields of `body` plus the values rejected while reading them.
    fn from_json(body: Value) -> Result<(Self, FieldErrors), AppError> {
        let mut fields = JsonFields::new(body)?;
        let payload = SkillPayload {
            name: fields.string("name"),
            employee: fields.string("employee"),
            yrs_exp: fields.integer("yrs_exp"),
            seniority: fields.string("seniority"),
        };
        Ok((payload, fields.into_errors()))
    }

    fn require_all(&self, errors: &mut FieldErrors) {
        require(
            errors,
            &[
                ("name", self.name.is_some()),
                ("employee", self.employee.is_some()),
                ("yrs_exp", self.yrs_exp.is_some()),
                ("seniority", self.seniority.is_some()),
            ],
        );
    }

    fn apply_to(self, skill: &mut Skill) {
        if let Some(name) = self.name {
            skill.name = name;
        }
        if let Some(employee) = self.employee {
            skill.employee_id = employee;
        }
        if let Some(yrs_exp) = self.yrs_exp {
            skill.yrs_exp = yrs_exp;
        }
        if let Some(seniority) = self.seniority {
            skill.seniority = seniority;
        }
    }
}

fn skill_not_found() -> AppError {
    AppError::NotFound("Skill not found".to_string())
}

fn unknown_employee(id: &str) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

/// Checks the owner and the (name, employee) pair. `errors` holds the
/// rejections already found in the payload.
async fn check_relations(
    store: &dyn Store,
    mut errors: FieldErrors,
    name: Option<&str>,
    employee_id: Option<&str>,
    current_id: Option<i64>,
) -> Result<(), AppError> {
    if let Some(employee_id) = employee_id {
        if errors.get("employee").is_none() && !store.employee_exists(employee_id).await? {
            errors.add("employee", unknown_employee(employee_id));
        }
    }

    if errors.is_empty() {
        if let (Some(name), Some(employee_id)) = (name, employee_id) {
            if store.skill_name_taken(name, employee_id, current_id).await? {
                errors.add(NON_FIELD_ERRORS, NOT_UNIQUE);
            }
        }
    }

    errors.into_result()
}

/// Constraint violations that slipped past the pre-checks map to the same
/// field errors.
fn write_error(err: StoreError, employee_id: &str) -> AppError {
    let mut fields = FieldErrors::new();
    if err.violates(SKILL_NAME_EMPLOYEE_KEY) {
        fields.add(NON_FIELD_ERRORS, NOT_UNIQUE);
        return AppError::Validation(fields);
    }
    if let StoreError::ForeignKeyViolation { constraint } = &err {
        if constraint.as_deref().map_or(true, |c| c == SKILL_EMPLOYEE_FKEY) {
            fields.add("employee", unknown_employee(employee_id));
            return AppError::Validation(fields);
        }
    }
    err.into()
}

pub async fn get_skills(store: web::Data<dyn Store>) -> Result<HttpResponse, AppError> {
    let skills = store.list_skills().await?;
    Ok(HttpResponse::Ok().json(skills))
}

pub async fn get_skill(
    store: web::Data<dyn Store>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let skill = store
        .get_skill(id.into_inner())
        .await?
        .ok_or_else(skill_not_found)?;

    Ok(HttpResponse::Ok().json(skill))
}

pub async fn create_skill(
    store: web::Data<dyn Store>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let (new_skill, mut errors) = SkillPayload::from_json(body.into_inner())?;
    errors.merge(validate_payload(&new_skill));
    new_skill.require_all(&mut errors);
    check_relations(
        store.get_ref(),
        errors,
        new_skill.name.as_deref(),
        new_skill.employee.as_deref(),
        None,
    )
    .await?;

    let (Some(name), Some(employee_id), Some(yrs_exp), Some(seniority)) =
        (new_skill.name, new_skill.employee, new_skill.yrs_exp, new_skill.seniority)
    else {
        return Err(AppError::BadRequest("Incomplete skill payload".to_string()));
    };

    let now = Utc::now();
    let record = SkillRecord {
        name,
        employee_id,
        yrs_exp,
        seniority,
        created_at: now,
        updated_at: now,
    };
    let created = store
        .insert_skill(&record)
        .await
        .map_err(|err| write_error(err, &record.employee_id))?;
    info!("Created skill {} for employee {}", created.id, created.employee_id);

    Ok(HttpResponse::Created().json(created))
}

async fn apply_update(
    store: &dyn Store,
    id: i64,
    body: Value,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let mut skill = store.get_skill(id).await?.ok_or_else(skill_not_found)?;

    let (updates, mut errors) = SkillPayload::from_json(body)?;
    errors.merge(validate_payload(&updates));
    if !partial {
        updates.require_all(&mut errors);
    }

    updates.apply_to(&mut skill);
    skill.updated_at = Utc::now();

    // The pair is checked as it will be stored, so a partial update of one half
    // still has to stay unique.
    check_relations(store, errors, Some(&skill.name), Some(&skill.employee_id), Some(skill.id)).await?;

    let updated = store
        .update_skill(&skill)
        .await
        .map_err(|err| write_error(err, &skill.employee_id))?
        .ok_or_else(skill_not_found)?;
    info!("Updated skill {}", updated.id);

    Ok(HttpResponse::Ok().json(updated))
}

pub async fn update_skill(
    store: web::Data<dyn Store>,
    id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    apply_update(store.get_ref(), id.into_inner(), body.into_inner(), false).await
}

pub async fn partial_update_skill(
    store: web::Data<dyn Store>,
    id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    apply_update(store.get_ref(), id.into_inner(), body.into_inner(), true).await
}

pub async fn delete_skill(
    store: web::Data<dyn Store>,
    id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();

    if !store.delete_skill(id).await? {
        return Err(skill_not_found());
    }
    info!("Deleted skill {}", id);

    Ok(HttpResponse::NoContent().finish())
}
