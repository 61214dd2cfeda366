//! Query-parameter filtering and search over employees.
//!
//! Each recognised parameter maps to a builder producing one [`Predicate`];
//! an employee is listed only if it satisfies all of them. The same
//! predicates are rendered to SQL by the Postgres store and evaluated directly
//! by the in-memory one.

use std::collections::HashMap;
use chrono::NaiveDate;
use crate::errors::FieldErrors;
use crate::models::employee::Employee;
use crate::models::skill::Skill;

const DATE_FORMAT: &str = "%Y-%m-%d";
const INVALID_DATE: &str = "Enter a valid date.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    FirstName,
    LastName,
    Email,
}

impl TextField {
    /// Fields covered by the free-text `search` parameter.
    pub const SEARCHABLE: [TextField; 3] = [TextField::FirstName, TextField::LastName, TextField::Email];

    pub fn column(self) -> &'static str {
        match self {
            TextField::FirstName => "first_name",
            TextField::LastName => "last_name",
            TextField::Email => "email",
        }
    }

    pub fn value(self, employee: &Employee) -> &str {
        match self {
            TextField::FirstName => &employee.first_name,
            TextField::LastName => &employee.last_name,
            TextField::Email => &employee.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match on one column.
    Contains(TextField, String),
    BornOn(NaiveDate),
    BornOnOrAfter(NaiveDate),
    BornOnOrBefore(NaiveDate),
    /// At least one skill named exactly one of these.
    HasAnySkill(Vec<String>),
    /// Every term is contained in at least one searchable field.
    Search(Vec<String>),
}

impl Predicate {
    /// Evaluates the predicate against an employee and the skills it owns.
    pub fn matches(&self, employee: &Employee, skills: &[Skill]) -> bool {
        match self {
            Predicate::Contains(field, needle) => contains_ignore_case(field.value(employee), needle),
            Predicate::BornOn(date) => employee.date_of_birth == *date,
            Predicate::BornOnOrAfter(date) => employee.date_of_birth >= *date,
            Predicate::BornOnOrBefore(date) => employee.date_of_birth <= *date,
            Predicate::HasAnySkill(names) => skills.iter().any(|s| names.contains(&s.name)),
            Predicate::Search(terms) => terms.iter().all(|term| {
                TextField::SEARCHABLE
                    .iter()
                    .any(|field| contains_ignore_case(field.value(employee), term))
            }),
        }
    }
}

type Builder = fn(&[String]) -> Result<Option<Predicate>, String>;

/// Recognised query parameters and their predicate builders.
const FILTERS: &[(&str, Builder)] = &[
    ("first_name", first_name),
    ("last_name", last_name),
    ("email", email),
    ("date_of_birth", date_of_birth),
    ("start_date_of_birth", start_date_of_birth),
    ("end_date_of_birth", end_date_of_birth),
    ("skills", skills),
    ("search", search),
];

fn last(values: &[String]) -> Option<&str> {
    values.last().map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn contains(field: TextField, values: &[String]) -> Result<Option<Predicate>, String> {
    Ok(last(values).map(|v| Predicate::Contains(field, v.to_string())))
}

fn date(values: &[String], build: fn(NaiveDate) -> Predicate) -> Result<Option<Predicate>, String> {
    match last(values) {
        Some(v) => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .map(|d| Some(build(d)))
            .map_err(|_| INVALID_DATE.to_string()),
        None => Ok(None),
    }
}

fn first_name(values: &[String]) -> Result<Option<Predicate>, String> {
    contains(TextField::FirstName, values)
}

fn last_name(values: &[String]) -> Result<Option<Predicate>, String> {
    contains(TextField::LastName, values)
}

fn email(values: &[String]) -> Result<Option<Predicate>, String> {
    contains(TextField::Email, values)
}

fn date_of_birth(values: &[String]) -> Result<Option<Predicate>, String> {
    date(values, Predicate::BornOn)
}

fn start_date_of_birth(values: &[String]) -> Result<Option<Predicate>, String> {
    date(values, Predicate::BornOnOrAfter)
}

fn end_date_of_birth(values: &[String]) -> Result<Option<Predicate>, String> {
    date(values, Predicate::BornOnOrBefore)
}

fn skills(values: &[String]) -> Result<Option<Predicate>, String> {
    let mut names: Vec<String> = Vec::new();
    for value in values {
        if !value.is_empty() && !names.contains(value) {
            names.push(value.clone());
        }
    }
    Ok((!names.is_empty()).then_some(Predicate::HasAnySkill(names)))
}

fn search(values: &[String]) -> Result<Option<Predicate>, String> {
    let terms: Vec<String> = last(values)
        .map(|v| {
            v.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok((!terms.is_empty()).then_some(Predicate::Search(terms)))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilter {
    predicates: Vec<Predicate>,
}

impl EmployeeFilter {
    /// Builds the filter from raw name/value pairs. Unknown names and empty
    /// values are ignored; unparseable dates are reported per parameter.
    /// Postgres text cannot hold NUL, so it is dropped from every value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FieldErrors>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in pairs {
            let value: String = value.into();
            let value = value.replace('\0', "");
            if value.trim().is_empty() {
                continue;
            }
            grouped.entry(name.into()).or_default().push(value);
        }

        let mut predicates = Vec::new();
        let mut errors = FieldErrors::new();
        for (name, build) in FILTERS {
            let Some(values) = grouped.get(*name) else {
                continue;
            };
            match build(values) {
                Ok(Some(predicate)) => predicates.push(predicate),
                Ok(None) => {}
                Err(reason) => errors.add(*name, reason),
            }
        }

        if errors.is_empty() {
            Ok(EmployeeFilter { predicates })
        } else {
            Err(errors)
        }
    }

    /// Parses a raw (still percent-encoded) query string.
    pub fn from_query_string(query: &str) -> Result<Self, FieldErrors> {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, employee: &Employee, skills: &[Skill]) -> bool {
        self.predicates.iter().all(|p| p.matches(employee, skills))
    }
}
