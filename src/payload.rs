//! Validation of write payloads before they reach the statement builders.

use serde_json::{Map, Value};

use crate::{
    error::AppError,
    models::{NewCompany, NewJob},
    query::{SparseFields, SqlValue},
};

/// FieldKind
///
/// The accepted JSON shape of an updatable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string.
    Text,
    /// Any string, including empty.
    FreeText,
    /// String starting with `http://` or `https://`.
    Url,
    /// Integer in `0..=i32::MAX`.
    Count,
    /// Number in `0.0..=1.0`.
    Fraction,
}

/// UpdateRules
///
/// Per-resource contract for PATCH bodies: which fields may change, which identifiers are
/// frozen, and how external names map onto storage columns.
#[derive(Debug)]
pub struct UpdateRules {
    pub fields: &'static [(&'static str, FieldKind)],
    pub immutable: &'static [&'static str],
    pub columns: &'static [(&'static str, &'static str)],
}

pub static COMPANY_UPDATE: UpdateRules = UpdateRules {
    fields: &[
        ("name", FieldKind::Text),
        ("description", FieldKind::FreeText),
        ("numEmployees", FieldKind::Count),
        ("logoUrl", FieldKind::Url),
    ],
    immutable: &["handle"],
    columns: &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")],
};

pub static JOB_UPDATE: UpdateRules = UpdateRules {
    fields: &[
        ("title", FieldKind::Text),
        ("salary", FieldKind::Count),
        ("equity", FieldKind::Fraction),
    ],
    immutable: &["id", "companyHandle"],
    columns: &[("companyHandle", "company_handle")],
};

impl UpdateRules {
    /// sparse_fields
    ///
    /// Checks every entry of a PATCH body and converts the accepted ones into bindable
    /// values, preserving the order the client sent them in. All violations are reported
    /// together. An empty body passes here and is rejected by the binder.
    pub fn sparse_fields(&self, payload: Map<String, Value>) -> Result<SparseFields, AppError> {
        let mut fields = SparseFields::new();
        let mut errors = Vec::new();

        for (name, value) in payload {
            if self.immutable.iter().any(|frozen| *frozen == name) {
                errors.push(format!("{} cannot be updated", name));
                continue;
            }

            let Some((_, kind)) = self.fields.iter().find(|(field, _)| *field == name) else {
                errors.push(format!("{} is not an updatable field", name));
                continue;
            };

            match convert(&name, *kind, &value) {
                Ok(converted) => fields.insert(name, converted),
                Err(message) => errors.push(message),
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Invalid(errors));
        }
        Ok(fields)
    }
}

fn convert(name: &str, kind: FieldKind, value: &Value) -> Result<SqlValue, String> {
    match kind {
        FieldKind::Text => match value.as_str() {
            Some(text) if !text.is_empty() => Ok(SqlValue::Text(text.to_string())),
            _ => Err(format!("{} must be a non-empty string", name)),
        },
        FieldKind::FreeText => value
            .as_str()
            .map(|text| SqlValue::Text(text.to_string()))
            .ok_or_else(|| format!("{} must be a string", name)),
        FieldKind::Url => match value.as_str() {
            Some(text) if is_url(text) => Ok(SqlValue::Text(text.to_string())),
            _ => Err(format!("{} must be an http(s) URL", name)),
        },
        FieldKind::Count => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n >= 0)
            .map(SqlValue::Int)
            .ok_or_else(|| format!("{} must be a non-negative integer", name)),
        FieldKind::Fraction => value
            .as_f64()
            .filter(|n| (0.0..=1.0).contains(n))
            .map(SqlValue::Float)
            .ok_or_else(|| format!("{} must be a number between 0 and 1", name)),
    }
}

fn is_url(text: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| text.len() > scheme.len() && text.starts_with(scheme))
}

// --- Creation payloads ---

impl NewCompany {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.handle.is_empty() || self.handle.len() > 25 {
            errors.push("handle must be between 1 and 25 characters".to_string());
        }
        if self.handle != self.handle.to_lowercase() {
            errors.push("handle must be lowercase".to_string());
        }
        if self.name.is_empty() {
            errors.push("name must be a non-empty string".to_string());
        }
        if self.num_employees.is_some_and(|n| n < 0) {
            errors.push("numEmployees must be a non-negative integer".to_string());
        }
        if self.logo_url.as_deref().is_some_and(|url| !is_url(url)) {
            errors.push("logoUrl must be an http(s) URL".to_string());
        }
        into_result(errors)
    }
}

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        if self.title.is_empty() {
            errors.push("title must be a non-empty string".to_string());
        }
        if self.salary.is_some_and(|n| n < 0) {
            errors.push("salary must be a non-negative integer".to_string());
        }
        if self.equity.is_some_and(|n| !(0.0..=1.0).contains(&n)) {
            errors.push("equity must be a number between 0 and 1".to_string());
        }
        if self.company_handle.is_empty() {
            errors.push("companyHandle must be a non-empty string".to_string());
        }
        into_result(errors)
    }
}

fn into_result(errors: Vec<String>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Invalid(errors))
    }
}
