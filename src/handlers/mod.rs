use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest};
use crate::errors::AppError;

#[cfg(test)]
macro_rules! test_app {
    ($store:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from($store.clone()))
                .configure(crate::handlers::configure),
        )
        .await
    };
}

pub mod email;
pub mod employee;
pub mod skill;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::resource("/api/employees/")
                .route(web::get().to(employee::get_employees))
                .route(web::post().to(employee::create_employee)),
        )
        .service(
            web::resource("/api/employees/{id}/")
                .route(web::get().to(employee::get_employee))
                .route(web::put().to(employee::update_employee))
                .route(web::patch().to(employee::partial_update_employee))
                .route(web::delete().to(employee::delete_employee)),
        )
        .service(
            web::resource("/api/skills/")
                .route(web::get().to(skill::get_skills))
                .route(web::post().to(skill::create_skill)),
        )
        .service(
            web::resource("/api/skills/{id}/")
                .route(web::get().to(skill::get_skill))
                .route(web::put().to(skill::update_skill))
                .route(web::patch().to(skill::partial_update_skill))
                .route(web::delete().to(skill::delete_skill)),
        )
        .service(
            web::resource("/api/check-email/{email}/")
                .route(web::post().to(email::check_email_exists)),
        );
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use chrono::{NaiveDate, Utc};
    use serde_json::{json, Value};
    use crate::models::employee::Employee;
    use crate::models::skill::{Skill, SkillRecord};
    use crate::store::{MemoryStore, Store};

    pub fn memory_store() -> Arc<dyn Store> {
        Arc::new(MemoryStore::new())
    }

    pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A complete, valid create/update body.
    pub fn employee_body(first_name: &str, email: &str) -> Value {
        json!({
            "first_name": first_name,
            "last_name": "Doe",
            "email": email,
            "date_of_birth": "1990-01-01",
            "contact_number": "1234567890",
            "street_address": "123 Main Street",
            "city": "New York",
            "postcode": "1234",
            "country": "US",
        })
    }

    pub async fn seed_employee(store: &Arc<dyn Store>, id: &str, first_name: &str, born: NaiveDate) -> Employee {
        let now = Utc::now();
        let employee = Employee {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: "Doe".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            date_of_birth: born,
            contact_number: Some("1234567890".to_string()),
            street_address: Some("123 Main Street".to_string()),
            city: Some("New York".to_string()),
            postcode: Some("1234".to_string()),
            country: Some("US".to_string()),
            created_at: now,
            updated_at: now,
        };
        store.insert_employee(&employee).await.unwrap()
    }

    pub async fn seed_skill(store: &Arc<dyn Store>, name: &str, employee_id: &str) -> Skill {
        let now = Utc::now();
        store
            .insert_skill(&SkillRecord {
                name: name.to_string(),
                employee_id: employee_id.to_string(),
                yrs_exp: 2,
                seniority: "Senior".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }
}
