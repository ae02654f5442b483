use crate::{
    AppState,
    auth::Access,
    criteria::{COMPANY_FILTERS, CompanyCriteria, CompanyQuery, JOB_FILTERS, JobCriteria, JobQuery},
    error::{AppError, ErrorBody},
    models::{
        Applied, CompanyDetailEnvelope, CompanyEnvelope, CompanyList, DeletedCompany, DeletedJob,
        DeletedUser, JobEnvelope, JobList, NewCompany, NewJob, UserEnvelope, UserList,
    },
    payload::{COMPANY_UPDATE, JOB_UPDATE},
    query::{FilterMode, bind_partial_update, compile, require_row, require_rows},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde_json::{Map, Value};

/// Parses a job id path segment, answering 400 for anything that is not an integer.
fn parse_job_id(raw: &str) -> Result<i32, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("job id must be an integer, got \"{}\"", raw)))
}

// --- Companies ---

/// list_companies
///
/// [Public Route] Lists companies ordered by name.
///
/// Without query parameters every company is returned. With any parameter the criteria are
/// compiled in explicit-only mode, and a search that matches nothing answers 404.
#[utoipa::path(
    get,
    path = "/companies",
    params(CompanyQuery),
    responses(
        (status = 200, description = "Matching companies", body = CompanyList),
        (status = 400, description = "Invalid criteria", body = ErrorBody),
        (status = 404, description = "No company matches", body = ErrorBody)
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    query: Result<Query<CompanyQuery>, QueryRejection>,
) -> Result<Json<CompanyList>, AppError> {
    let Query(query) = query?;
    search_companies(&state, query, FilterMode::ExplicitOnly).await
}

/// list_companies_legacy
///
/// [Public Route] Same listing as `GET /companies`, but absent headcount bounds are filled
/// with defaults (`minEmployees = 1`, `maxEmployees = 1000000000`) before compiling. Companies
/// without a headcount therefore never match a filtered request on this route.
#[utoipa::path(
    get,
    path = "/companies/dynamicQuery",
    params(CompanyQuery),
    responses(
        (status = 200, description = "Matching companies", body = CompanyList),
        (status = 400, description = "Invalid criteria", body = ErrorBody),
        (status = 404, description = "No company matches", body = ErrorBody)
    )
)]
pub async fn list_companies_legacy(
    State(state): State<AppState>,
    query: Result<Query<CompanyQuery>, QueryRejection>,
) -> Result<Json<CompanyList>, AppError> {
    let Query(query) = query?;
    search_companies(&state, query, FilterMode::InjectDefaults).await
}

async fn search_companies(
    state: &AppState,
    query: CompanyQuery,
    mode: FilterMode,
) -> Result<Json<CompanyList>, AppError> {
    if query.is_empty() {
        let companies = state.repo.list_companies().await?;
        return Ok(Json(CompanyList { companies }));
    }

    let criteria = CompanyCriteria::try_from(query)?;
    let filter = compile(&criteria, &COMPANY_FILTERS, mode)?;
    let companies = require_rows(state.repo.filter_companies(&filter).await?, || {
        "No companies match the given filters".to_string()
    })?;
    Ok(Json(CompanyList { companies }))
}

/// get_company
///
/// [Public Route] A single company with all of its jobs.
#[utoipa::path(
    get,
    path = "/companies/{handle}",
    params(("handle" = String, Path, description = "Company handle")),
    responses(
        (status = 200, description = "Found", body = CompanyDetailEnvelope),
        (status = 404, description = "No such company", body = ErrorBody)
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<CompanyDetailEnvelope>, AppError> {
    let company = require_row(state.repo.get_company(&handle).await?, || {
        format!("No company: {}", handle)
    })?;
    Ok(Json(CompanyDetailEnvelope { company }))
}

/// create_company
///
/// [Admin Route] Creates a company. A duplicate handle or name answers 400.
#[utoipa::path(
    post,
    path = "/companies",
    request_body = NewCompany,
    responses(
        (status = 201, description = "Created", body = CompanyEnvelope),
        (status = 400, description = "Invalid payload or duplicate", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn create_company(
    access: Access,
    State(state): State<AppState>,
    payload: Result<Json<NewCompany>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyEnvelope>), AppError> {
    let admin = access.require_privileged()?;
    let Json(new_company) = payload?;
    new_company.validate()?;

    let company = state.repo.create_company(new_company).await?;
    tracing::info!(handle = %company.handle, by = %admin.subject, "company created");
    Ok((StatusCode::CREATED, Json(CompanyEnvelope { company })))
}

/// update_company
///
/// [Admin Route] Sparse update of `name`, `description`, `numEmployees` and `logoUrl`.
/// The handle is immutable.
#[utoipa::path(
    patch,
    path = "/companies/{handle}",
    params(("handle" = String, Path, description = "Company handle")),
    responses(
        (status = 200, description = "Updated", body = CompanyEnvelope),
        (status = 400, description = "Invalid or empty payload", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No such company", body = ErrorBody)
    )
)]
pub async fn update_company(
    access: Access,
    State(state): State<AppState>,
    Path(handle): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<CompanyEnvelope>, AppError> {
    let admin = access.require_privileged()?;
    let Json(payload) = payload?;

    let fields = COMPANY_UPDATE.sparse_fields(payload)?;
    let update = bind_partial_update(&fields, COMPANY_UPDATE.columns)?;

    let company = require_row(state.repo.update_company(&handle, &update).await?, || {
        format!("No company: {}", handle)
    })?;
    tracing::info!(handle = %company.handle, by = %admin.subject, "company updated");
    Ok(Json(CompanyEnvelope { company }))
}

/// delete_company
///
/// [Admin Route] Removes a company; its jobs go with it.
#[utoipa::path(
    delete,
    path = "/companies/{handle}",
    params(("handle" = String, Path, description = "Company handle")),
    responses(
        (status = 200, description = "Deleted", body = DeletedCompany),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No such company", body = ErrorBody)
    )
)]
pub async fn delete_company(
    access: Access,
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<DeletedCompany>, AppError> {
    let admin = access.require_privileged()?;

    if !state.repo.remove_company(&handle).await? {
        return Err(AppError::NotFound(format!("No company: {}", handle)));
    }
    tracing::info!(handle = %handle, by = %admin.subject, "company deleted");
    Ok(Json(DeletedCompany { deleted: handle }))
}

// --- Jobs ---

/// list_jobs
///
/// [Public Route] Lists jobs ordered by id, optionally narrowed by `title`, `minSalary`
/// and `hasEquity`. An empty result answers 404 whether or not criteria were given.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobQuery),
    responses(
        (status = 200, description = "Matching jobs", body = JobList),
        (status = 400, description = "Invalid criteria", body = ErrorBody),
        (status = 404, description = "No job matches", body = ErrorBody)
    )
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<JobQuery>, QueryRejection>,
) -> Result<Json<JobList>, AppError> {
    let Query(query) = query?;
    let criteria = JobCriteria::try_from(query)?;
    let filter = compile(&criteria, &JOB_FILTERS, FilterMode::ExplicitOnly)?;

    let jobs = require_rows(state.repo.filter_jobs(&filter).await?, || {
        "No jobs found".to_string()
    })?;
    Ok(Json(JobList { jobs }))
}

/// get_job
///
/// [Public Route] A single job by id.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = i32, Path, description = "Job id")),
    responses(
        (status = 200, description = "Found", body = JobEnvelope),
        (status = 400, description = "Non-integer id", body = ErrorBody),
        (status = 404, description = "No such job", body = ErrorBody)
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<JobEnvelope>, AppError> {
    let Path(raw_id) = path?;
    let id = parse_job_id(&raw_id)?;
    let job = require_row(state.repo.get_job(id).await?, || format!("No job: {}", id))?;
    Ok(Json(JobEnvelope { job }))
}

/// get_jobs_by_title
///
/// [Public Route] Jobs whose title equals the path segment exactly.
#[utoipa::path(
    get,
    path = "/jobs/title/{title}",
    params(("title" = String, Path, description = "Exact job title")),
    responses(
        (status = 200, description = "Found", body = JobList),
        (status = 404, description = "No job has this title", body = ErrorBody)
    )
)]
pub async fn get_jobs_by_title(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> Result<Json<JobList>, AppError> {
    let jobs = require_rows(state.repo.jobs_by_title(&title).await?, || {
        format!("No job titled: {}", title)
    })?;
    Ok(Json(JobList { jobs }))
}

/// create_job
///
/// [Admin Route] Creates a job under an existing company. An unknown `companyHandle`
/// answers 400.
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = NewJob,
    responses(
        (status = 201, description = "Created", body = JobEnvelope),
        (status = 400, description = "Invalid payload or unknown company", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn create_job(
    access: Access,
    State(state): State<AppState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> Result<(StatusCode, Json<JobEnvelope>), AppError> {
    let admin = access.require_privileged()?;
    let Json(new_job) = payload?;
    new_job.validate()?;

    let job = state.repo.create_job(new_job).await?;
    tracing::info!(id = job.id, company = %job.company_handle, by = %admin.subject, "job created");
    Ok((StatusCode::CREATED, Json(JobEnvelope { job })))
}

/// update_job
///
/// [Admin Route] Sparse update of `title`, `salary` and `equity`. Neither `id` nor
/// `companyHandle` may appear in the payload.
#[utoipa::path(
    patch,
    path = "/jobs/{id}",
    params(("id" = i32, Path, description = "Job id")),
    responses(
        (status = 200, description = "Updated", body = JobEnvelope),
        (status = 400, description = "Invalid or empty payload", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No such job", body = ErrorBody)
    )
)]
pub async fn update_job(
    access: Access,
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<JobEnvelope>, AppError> {
    let admin = access.require_privileged()?;
    let Path(raw_id) = path?;
    let id = parse_job_id(&raw_id)?;
    let Json(payload) = payload?;

    let fields = JOB_UPDATE.sparse_fields(payload)?;
    let update = bind_partial_update(&fields, JOB_UPDATE.columns)?;

    let job = require_row(state.repo.update_job(id, &update).await?, || {
        format!("No job: {}", id)
    })?;
    tracing::info!(id = job.id, by = %admin.subject, "job updated");
    Ok(Json(JobEnvelope { job }))
}

/// delete_job
///
/// [Admin Route] Removes a job and answers with its id and title.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = i32, Path, description = "Job id")),
    responses(
        (status = 200, description = "Deleted", body = DeletedJob),
        (status = 403, description = "Not an admin", body = ErrorBody),
        (status = 404, description = "No such job", body = ErrorBody)
    )
)]
pub async fn delete_job(
    access: Access,
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<DeletedJob>, AppError> {
    let admin = access.require_privileged()?;
    let Path(raw_id) = path?;
    let id = parse_job_id(&raw_id)?;

    let removed = require_row(state.repo.remove_job(id).await?, || format!("No job: {}", id))?;
    tracing::info!(id = removed.id, by = %admin.subject, "job deleted");
    Ok(Json(DeletedJob { deleted: removed }))
}

// --- Users ---

/// list_users
///
/// [Admin Route] Every user with the ids of the jobs they applied to.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = UserList),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Not an admin", body = ErrorBody)
    )
)]
pub async fn list_users(
    access: Access,
    State(state): State<AppState>,
) -> Result<Json<UserList>, AppError> {
    access.require_privileged()?;
    let users = state.repo.list_users().await?;
    Ok(Json(UserList { users }))
}

/// get_user
///
/// [Authenticated Route] One user and their applications. Allowed for admins and for the
/// user themselves.
#[utoipa::path(
    get,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Found", body = UserEnvelope),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Neither admin nor the named user", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn get_user(
    access: Access,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserEnvelope>, AppError> {
    access.require_privileged_or_owner(&username)?;
    let user = require_row(state.repo.get_user(&username).await?, || {
        format!("No user: {}", username)
    })?;
    Ok(Json(UserEnvelope { user }))
}

/// delete_user
///
/// [Authenticated Route] Removes a user together with their applications. Allowed for admins
/// and for the user themselves.
#[utoipa::path(
    delete,
    path = "/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Deleted", body = DeletedUser),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Neither admin nor the named user", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    )
)]
pub async fn delete_user(
    access: Access,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<DeletedUser>, AppError> {
    let grant = access.require_privileged_or_owner(&username)?;

    if !state.repo.remove_user(&username).await? {
        return Err(AppError::NotFound(format!("No user: {}", username)));
    }
    tracing::info!(username = %username, ?grant, "user deleted");
    Ok(Json(DeletedUser { deleted: username }))
}

// --- Applications ---

/// apply_for_job
///
/// [Authenticated Route] Records that `username` applied to job `id`. Allowed for admins and
/// for the user named in the path.
#[utoipa::path(
    post,
    path = "/users/{username}/jobs/{id}",
    params(
        ("username" = String, Path, description = "Applicant"),
        ("id" = i32, Path, description = "Job id")
    ),
    responses(
        (status = 201, description = "Applied", body = Applied),
        (status = 400, description = "Unknown user or job", body = ErrorBody),
        (status = 401, description = "Not logged in", body = ErrorBody),
        (status = 403, description = "Neither admin nor the named user", body = ErrorBody)
    )
)]
pub async fn apply_for_job(
    access: Access,
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<(StatusCode, Json<Applied>), AppError> {
    let Path((username, raw_id)) = path?;
    let grant = access.require_privileged_or_owner(&username)?;
    let id = parse_job_id(&raw_id)?;

    state.repo.apply_for_job(&username, id).await?;
    tracing::info!(username = %username, job = id, ?grant, "application recorded");
    Ok((StatusCode::CREATED, Json(Applied { applied: id })))
}

/// Fallback for unmatched routes, so they share the JSON error body.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
