use serde::Deserialize;

use crate::{
    error::AppError,
    query::{
        Criteria, FilterDescriptor, FilterTable, FilterValue, Operator, RangeRule,
        filter::{contains_pattern, identity},
    },
};

// --- Query-string shapes ---

/// CompanyQuery
///
/// Raw query parameters accepted by `GET /companies` and `GET /companies/dynamicQuery`.
/// Values stay as strings here; numeric coercion happens in [`CompanyCriteria::try_from`]
/// so the client gets a 400 that names the offending field.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyQuery {
    /// Case-insensitive substring of the company name.
    pub name: Option<String>,
    /// Inclusive lower bound on headcount.
    pub min_employees: Option<String>,
    /// Inclusive upper bound on headcount.
    pub max_employees: Option<String>,
}

impl CompanyQuery {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.min_employees.is_none() && self.max_employees.is_none()
    }
}

/// JobQuery
///
/// Raw query parameters accepted by `GET /jobs`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobQuery {
    /// Case-insensitive substring of the job title.
    pub title: Option<String>,
    /// Inclusive lower bound on salary.
    pub min_salary: Option<String>,
    /// `"true"` restricts to jobs with non-zero equity; `"false"` does not narrow.
    pub has_equity: Option<String>,
}

// --- Coerced criteria ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyCriteria {
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl TryFrom<CompanyQuery> for CompanyCriteria {
    type Error = AppError;

    fn try_from(query: CompanyQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            name: query.name,
            min_employees: parse_count("minEmployees", query.min_employees)?,
            max_employees: parse_count("maxEmployees", query.max_employees)?,
        })
    }
}

impl Criteria for CompanyCriteria {
    fn get(&self, field: &str) -> Option<FilterValue> {
        match field {
            "name" => self.name.clone().map(FilterValue::Text),
            "minEmployees" => self.min_employees.map(FilterValue::Int),
            "maxEmployees" => self.max_employees.map(FilterValue::Int),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobCriteria {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl TryFrom<JobQuery> for JobCriteria {
    type Error = AppError;

    fn try_from(query: JobQuery) -> Result<Self, Self::Error> {
        let has_equity = match query.has_equity.as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "hasEquity must be \"true\" or \"false\", got \"{}\"",
                    other
                )));
            }
        };

        Ok(Self {
            title: query.title,
            min_salary: parse_count("minSalary", query.min_salary)?,
            has_equity,
        })
    }
}

impl Criteria for JobCriteria {
    fn get(&self, field: &str) -> Option<FilterValue> {
        match field {
            "title" => self.title.clone().map(FilterValue::Text),
            "minSalary" => self.min_salary.map(FilterValue::Int),
            "hasEquity" => self.has_equity.map(FilterValue::Flag),
            _ => None,
        }
    }
}

fn parse_count(field: &str, raw: Option<String>) -> Result<Option<i32>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<i32>() {
        Ok(n) if n >= 0 => Ok(Some(n)),
        _ => Err(AppError::BadRequest(format!(
            "{} must be a non-negative integer",
            field
        ))),
    }
}

// --- Descriptor tables ---

/// Upper headcount injected by the legacy listing when `maxEmployees` is absent.
pub const HEADCOUNT_CEILING: i32 = 1_000_000_000;

static COMPANY_DESCRIPTORS: [FilterDescriptor; 3] = [
    FilterDescriptor {
        field: "name",
        column: "name",
        operator: Operator::ContainsInsensitive,
        preprocess: contains_pattern,
        fallback: None,
    },
    FilterDescriptor {
        field: "minEmployees",
        column: "num_employees",
        operator: Operator::AtLeast,
        preprocess: identity,
        fallback: Some(FilterValue::Int(1)),
    },
    FilterDescriptor {
        field: "maxEmployees",
        column: "num_employees",
        operator: Operator::AtMost,
        preprocess: identity,
        fallback: Some(FilterValue::Int(HEADCOUNT_CEILING)),
    },
];

static COMPANY_RANGES: [RangeRule; 1] = [RangeRule {
    lower: "minEmployees",
    upper: "maxEmployees",
    message: "minEmployees cannot be greater than maxEmployees",
}];

pub static COMPANY_FILTERS: FilterTable = FilterTable {
    descriptors: &COMPANY_DESCRIPTORS,
    ranges: &COMPANY_RANGES,
    order_by: "name",
};

static JOB_DESCRIPTORS: [FilterDescriptor; 3] = [
    FilterDescriptor {
        field: "title",
        column: "title",
        operator: Operator::ContainsInsensitive,
        preprocess: contains_pattern,
        fallback: None,
    },
    FilterDescriptor {
        field: "minSalary",
        column: "salary",
        operator: Operator::AtLeast,
        preprocess: identity,
        fallback: None,
    },
    FilterDescriptor {
        field: "hasEquity",
        column: "equity",
        operator: Operator::PositiveWhenSet,
        preprocess: identity,
        fallback: None,
    },
];

pub static JOB_FILTERS: FilterTable = FilterTable {
    descriptors: &JOB_DESCRIPTORS,
    ranges: &[],
    order_by: "id",
};
