use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Records (Mapped to Database) ---

/// Company
///
/// A hiring organization from the `companies` table, identified by its `handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// Job
///
/// A job posting from the `jobs` table. `equity` is stored as NUMERIC and read back as a
/// float by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

/// CompanyDetail
///
/// A company together with every job it has posted, as returned by `GET /companies/{handle}`.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

/// The identifying part of a deleted job.
#[derive(Debug, Clone, PartialEq, Serialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct RemovedJob {
    pub id: i32,
    pub title: String,
}

/// User
///
/// A user from the `users` table with the ids of the jobs they applied to. Credentials are
/// never selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub jobs: Vec<i32>,
}

// --- Request Payloads (Input Schemas) ---

/// NewCompany
///
/// Body of `POST /companies`. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// NewJob
///
/// Body of `POST /jobs`. The id is assigned by the database.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[ts(export)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

// --- Response Envelopes ---

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyList {
    pub companies: Vec<Company>,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyEnvelope {
    pub company: Company,
}

#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct CompanyDetailEnvelope {
    pub company: CompanyDetail,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobList {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobEnvelope {
    pub job: Job,
}

/// `{ "deleted": handle }`
#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct DeletedCompany {
    pub deleted: String,
}

/// `{ "deleted": { id, title } }`
#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct DeletedJob {
    pub deleted: RemovedJob,
}

/// `{ "applied": jobId }`
#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct Applied {
    pub applied: i32,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserList {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserEnvelope {
    pub user: User,
}

/// `{ "deleted": username }`
#[derive(Debug, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct DeletedUser {
    pub deleted: String,
}
