use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use serde_json::Value;
use validator::Validate;
use crate::errors::{AppError, FieldErrors};
use crate::models::employee::{Employee, EmployeeWithSkills};
use crate::store::Store;
use crate::utils::filter::EmployeeFilter;
use crate::utils::id::insert_with_unique_id;
use crate::utils::payload::JsonFields;
use crate::utils::validation::{
    email_conflict, email_constraint_error, require, validate_contact_number, validate_date_of_birth,
    validate_not_blank, validate_payload, EMAIL_TAKEN_BY_OTHER,
};

/// Employee write body. Every field is required on create and full update;
/// a partial update validates only what it carries.
#[derive(Validate, Debug, Default)]
pub struct EmployeePayload {
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    first_name: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "Ensure this field has no more than 254 characters."))]
    email: Option<String>,
    #[validate(custom = "validate_date_of_birth")]
    date_of_birth: Option<NaiveDate>,
    #[validate(custom = "validate_contact_number")]
    contact_number: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    street_address: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    city: Option<String>,
    #[validate(length(equal = 4, message = "Postcode must be 4 characters"))]
    postcode: Option<String>,
    #[validate(custom = "validate_not_blank", length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    country: Option<String>,
}

impl EmployeePayload {
    /// Reads the known fields of `body`, along with the values rejected while
    /// reading them. Other keys, `id` included, are ignored.
    fn from_json(body: Value) -> Result<(Self, FieldErrors), AppError> {
        let mut fields = JsonFields::new(body)?;
        let payload = EmployeePayload {
            first_name: fields.string("first_name"),
            last_name: fields.string("last_name"),
            email: fields.string("email"),
            date_of_birth: fields.date("date_of_birth"),
            contact_number: fields.string("contact_number"),
            street_address: fields.string("street_address"),
            city: fields.string("city"),
            postcode: fields.string("postcode"),
            country: fields.string("country"),
        };
        Ok((payload, fields.into_errors()))
    }

    fn require_all(&self, errors: &mut FieldErrors) {
        require(
            errors,
            &[
                ("first_name", self.first_name.is_some()),
                ("last_name", self.last_name.is_some()),
                ("email", self.email.is_some()),
                ("date_of_birth", self.date_of_birth.is_some()),
                ("contact_number", self.contact_number.is_some()),
                ("street_address", self.street_address.is_some()),
                ("city", self.city.is_some()),
                ("postcode", self.postcode.is_some()),
                ("country", self.country.is_some()),
            ],
        );
    }

    /// New employee without an id; `None` if a required field is missing.
    fn into_employee(self, now: DateTime<Utc>) -> Option<Employee> {
        Some(Employee {
            id: String::new(),
            first_name: self.first_name?,
            last_name: self.last_name?,
            email: self.email?,
            date_of_birth: self.date_of_birth?,
            contact_number: self.contact_number,
            street_address: self.street_address,
            city: self.city,
            postcode: self.postcode,
            country: self.country,
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_to(self, employee: &mut Employee) {
        if let Some(first_name) = self.first_name {
            employee.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            employee.last_name = last_name;
        }
        if let Some(email) = self.email {
            employee.email = email;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            employee.date_of_birth = date_of_birth;
        }
        if self.contact_number.is_some() {
            employee.contact_number = self.contact_number;
        }
        if self.street_address.is_some() {
            employee.street_address = self.street_address;
        }
        if self.city.is_some() {
            employee.city = self.city;
        }
        if self.postcode.is_some() {
            employee.postcode = self.postcode;
        }
        if self.country.is_some() {
            employee.country = self.country;
        }
    }
}

fn employee_not_found() -> AppError {
    AppError::NotFound("Employee not found".to_string())
}

/// Field validators plus the email uniqueness check, reported together with
/// the `errors` already found while reading the body.
async fn validate_employee(
    store: &dyn Store,
    payload: &EmployeePayload,
    mut errors: FieldErrors,
    current_id: Option<&str>,
    partial: bool,
) -> Result<(), AppError> {
    errors.merge(validate_payload(payload));
    if !partial {
        payload.require_all(&mut errors);
    }

    if errors.get("email").is_none() {
        if let Some(email) = &payload.email {
            if let Some(reason) = email_conflict(store, email, current_id).await? {
                errors.add("email", reason);
            }
        }
    }

    errors.into_result()
}

async fn with_skills(store: &dyn Store, employee: Employee) -> Result<EmployeeWithSkills, AppError> {
    let skills = store.skills_for_employees(&[employee.id.clone()]).await?;
    Ok(EmployeeWithSkills { employee, skills })
}

pub async fn get_employees(
    req: HttpRequest,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let filter = EmployeeFilter::from_query_string(req.query_string()).map_err(AppError::Validation)?;

    let employees = store.list_employees(&filter).await?;
    let ids: Vec<String> = employees.iter().map(|e| e.id.clone()).collect();
    let skills = store.skills_for_employees(&ids).await?;

    Ok(HttpResponse::Ok().json(EmployeeWithSkills::aggregate(employees, skills)))
}

pub async fn get_employee(
    store: web::Data<dyn Store>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee = store
        .get_employee(&id)
        .await?
        .ok_or_else(employee_not_found)?;

    Ok(HttpResponse::Ok().json(with_skills(store.get_ref(), employee).await?))
}

pub async fn create_employee(
    store: web::Data<dyn Store>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let (new_employee, errors) = EmployeePayload::from_json(body.into_inner())?;
    validate_employee(store.get_ref(), &new_employee, errors, None, false).await?;

    let draft = new_employee
        .into_employee(Utc::now())
        .ok_or_else(|| AppError::BadRequest("Incomplete employee payload".to_string()))?;
    let created = insert_with_unique_id(store.get_ref(), draft).await?;
    info!("Created employee {}", created.id);

    Ok(HttpResponse::Created().json(EmployeeWithSkills { employee: created, skills: Vec::new() }))
}

async fn apply_update(
    store: &dyn Store,
    id: &str,
    body: Value,
    partial: bool,
) -> Result<HttpResponse, AppError> {
    let mut employee = store.get_employee(id).await?.ok_or_else(employee_not_found)?;
    let (updates, errors) = EmployeePayload::from_json(body)?;
    validate_employee(store, &updates, errors, Some(&employee.id), partial).await?;

    updates.apply_to(&mut employee);
    employee.updated_at = Utc::now();

    let updated = store
        .update_employee(&employee)
        .await
        .map_err(|err| email_constraint_error(err, EMAIL_TAKEN_BY_OTHER))?
        .ok_or_else(employee_not_found)?;
    info!("Updated employee {}", updated.id);

    Ok(HttpResponse::Ok().json(with_skills(store, updated).await?))
}

pub async fn update_employee(
    store: web::Data<dyn Store>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    apply_update(store.get_ref(), &id, body.into_inner(), false).await
}

pub async fn partial_update_employee(
    store: web::Data<dyn Store>,
    id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    apply_update(store.get_ref(), &id, body.into_inner(), true).await
}

pub async fn delete_employee(
    store: web::Data<dyn Store>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = id.into_inner();

    if !store.delete_employee(&id).await? {
        return Err(employee_not_found());
    }
    info!("Deleted employee {} and its skills", id);

    Ok(HttpResponse::NoContent().finish())
}
