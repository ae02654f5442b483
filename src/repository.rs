use crate::{
    error::AppError,
    models::{Company, CompanyDetail, Job, NewCompany, NewJob, RemovedJob, User},
    query::{CompiledFilter, PartialUpdate, SqlValue},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, postgres::PgArguments, query::QueryAs};
use std::sync::Arc;

/// Repository Trait
///
/// Abstract contract for every persistence operation. Handlers only ever see this trait,
/// which lets the tests swap in a mock.
///
/// Filter and update statements arrive pre-compiled; implementations execute them as given.
/// `Option`/`bool` returns mean "no matching row" and are turned into 404s by the caller.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Companies ---
    async fn list_companies(&self) -> Result<Vec<Company>, AppError>;
    async fn filter_companies(&self, filter: &CompiledFilter) -> Result<Vec<Company>, AppError>;
    async fn get_company(&self, handle: &str) -> Result<Option<CompanyDetail>, AppError>;
    // Duplicate handle or name is reported as BadRequest.
    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError>;
    async fn update_company(
        &self,
        handle: &str,
        update: &PartialUpdate,
    ) -> Result<Option<Company>, AppError>;
    async fn remove_company(&self, handle: &str) -> Result<bool, AppError>;

    // --- Jobs ---
    async fn filter_jobs(&self, filter: &CompiledFilter) -> Result<Vec<Job>, AppError>;
    async fn get_job(&self, id: i32) -> Result<Option<Job>, AppError>;
    async fn jobs_by_title(&self, title: &str) -> Result<Vec<Job>, AppError>;
    // Unknown company handle is reported as BadRequest.
    async fn create_job(&self, job: NewJob) -> Result<Job, AppError>;
    async fn update_job(&self, id: i32, update: &PartialUpdate) -> Result<Option<Job>, AppError>;
    async fn remove_job(&self, id: i32) -> Result<Option<RemovedJob>, AppError>;

    // --- Users ---
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError>;
    // Applications of the user go with it.
    async fn remove_user(&self, username: &str) -> Result<bool, AppError>;

    // --- Applications ---
    // Unknown user or job is reported as BadRequest.
    async fn apply_for_job(&self, username: &str, job_id: i32) -> Result<(), AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";
const JOB_COLUMNS: &str = "id, title, salary, equity::float8 AS equity, company_handle";
const COMPANY_NAME_KEY: &str = "companies_name_key";

/// Users joined with their applications; `jobs` is an empty array for users who never applied.
const USER_SELECT: &str = "SELECT u.username, u.first_name, u.last_name, u.email, u.is_admin, \
     COALESCE(array_agg(a.job_id ORDER BY a.job_id) FILTER (WHERE a.job_id IS NOT NULL), '{}') AS jobs \
     FROM users u LEFT JOIN applications a ON a.username = u.username";

/// PostgresRepository
///
/// Implementation of `Repository` backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Binds values in placeholder order onto a runtime query.
fn bind_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(text) => query.bind(text.clone()),
            SqlValue::Int(number) => query.bind(*number),
            SqlValue::Float(number) => query.bind(*number),
        };
    }
    query
}

/// Constraint name carried by a database error, if it is of the given class.
fn violated_constraint(error: &sqlx::Error, foreign_key: bool) -> Option<String> {
    let sqlx::Error::Database(db) = error else {
        return None;
    };
    let matches = if foreign_key {
        db.is_foreign_key_violation()
    } else {
        db.is_unique_violation()
    };
    matches.then(|| db.constraint().unwrap_or_default().to_string())
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        let sql = format!("SELECT {COMPANY_COLUMNS} FROM companies ORDER BY name");
        let companies = sqlx::query_as::<_, Company>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    /// filter_companies
    ///
    /// Executes a compiled company filter. The clause only ever contains placeholders for
    /// client-supplied values, so nothing from the request is spliced into the SQL text.
    async fn filter_companies(&self, filter: &CompiledFilter) -> Result<Vec<Company>, AppError> {
        let sql = filter.select_from(&format!("SELECT {COMPANY_COLUMNS} FROM companies"));
        tracing::debug!(sql = %sql, params = ?filter.params, "filter_companies");
        let companies = bind_values(sqlx::query_as::<_, Company>(&sql), &filter.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    /// get_company
    ///
    /// Loads the company and its jobs concurrently on two pooled connections.
    async fn get_company(&self, handle: &str) -> Result<Option<CompanyDetail>, AppError> {
        let company_sql = format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE handle = $1");
        let jobs_sql =
            format!("SELECT {JOB_COLUMNS} FROM jobs WHERE company_handle = $1 ORDER BY id");

        let (company, jobs) = tokio::try_join!(
            sqlx::query_as::<_, Company>(&company_sql)
                .bind(handle)
                .fetch_optional(&self.pool),
            sqlx::query_as::<_, Job>(&jobs_sql)
                .bind(handle)
                .fetch_all(&self.pool),
        )?;

        Ok(company.map(|company| CompanyDetail { company, jobs }))
    }

    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError> {
        let sql = format!(
            "INSERT INTO companies ({COMPANY_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {COMPANY_COLUMNS}"
        );
        let result = sqlx::query_as::<_, Company>(&sql)
            .bind(&company.handle)
            .bind(&company.name)
            .bind(&company.description)
            .bind(company.num_employees)
            .bind(&company.logo_url)
            .fetch_one(&self.pool)
            .await;

        let e = match result {
            Ok(created) => return Ok(created),
            Err(e) => e,
        };
        // Either the handle (primary key) or the name collided.
        match violated_constraint(&e, false).as_deref() {
            Some(COMPANY_NAME_KEY) => Err(AppError::BadRequest(format!(
                "Duplicate company name: {}",
                company.name
            ))),
            Some(_) => Err(AppError::BadRequest(format!(
                "Duplicate company: {}",
                company.handle
            ))),
            None => Err(e.into()),
        }
    }

    async fn update_company(
        &self,
        handle: &str,
        update: &PartialUpdate,
    ) -> Result<Option<Company>, AppError> {
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {COMPANY_COLUMNS}",
            update.assignments,
            update.next_placeholder()
        );
        tracing::debug!(sql = %sql, params = ?update.values, "update_company");
        let result = bind_values(sqlx::query_as::<_, Company>(&sql), &update.values)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(updated) => Ok(updated),
            Err(e) if violated_constraint(&e, false).is_some() => Err(AppError::BadRequest(
                format!("Duplicate company name: {} cannot take a name already in use", handle),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_company(&self, handle: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE handle = $1")
            .bind(handle)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn filter_jobs(&self, filter: &CompiledFilter) -> Result<Vec<Job>, AppError> {
        let sql = filter.select_from(&format!("SELECT {JOB_COLUMNS} FROM jobs"));
        tracing::debug!(sql = %sql, params = ?filter.params, "filter_jobs");
        let jobs = bind_values(sqlx::query_as::<_, Job>(&sql), &filter.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn get_job(&self, id: i32) -> Result<Option<Job>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// jobs_by_title
    ///
    /// Exact, case-sensitive title match.
    async fn jobs_by_title(&self, title: &str) -> Result<Vec<Job>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE title = $1 ORDER BY id");
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(title)
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, AppError> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        );
        let result = sqlx::query_as::<_, Job>(&sql)
            .bind(&job.title)
            .bind(job.salary)
            .bind(job.equity)
            .bind(&job.company_handle)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if violated_constraint(&e, true).is_some() => Err(AppError::BadRequest(
                format!("No company: {}", job.company_handle),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_job(&self, id: i32, update: &PartialUpdate) -> Result<Option<Job>, AppError> {
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {JOB_COLUMNS}",
            update.assignments,
            update.next_placeholder()
        );
        tracing::debug!(sql = %sql, params = ?update.values, "update_job");
        let updated = bind_values(sqlx::query_as::<_, Job>(&sql), &update.values)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn remove_job(&self, id: i32) -> Result<Option<RemovedJob>, AppError> {
        let removed = sqlx::query_as::<_, RemovedJob>(
            "DELETE FROM jobs WHERE id = $1 RETURNING id, title",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(removed)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("{USER_SELECT} GROUP BY u.username ORDER BY u.username");
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("{USER_SELECT} WHERE u.username = $1 GROUP BY u.username");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn remove_user(&self, username: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// apply_for_job
    ///
    /// Records an application. A foreign-key failure means the user or the job does not
    /// exist; the constraint name tells which one.
    async fn apply_for_job(&self, username: &str, job_id: i32) -> Result<(), AppError> {
        let result = sqlx::query("INSERT INTO applications (username, job_id) VALUES ($1, $2)")
            .bind(username)
            .bind(job_id)
            .execute(&self.pool)
            .await;

        let Err(e) = result else {
            return Ok(());
        };

        if let Some(constraint) = violated_constraint(&e, true) {
            let message = match constraint.as_str() {
                "applications_username_fkey" => format!("No user: {}", username),
                "applications_job_id_fkey" => format!("No job: {}", job_id),
                _ => format!("Cannot apply {} to job {}", username, job_id),
            };
            return Err(AppError::BadRequest(message));
        }
        if violated_constraint(&e, false).is_some() {
            return Err(AppError::BadRequest(format!(
                "{} already applied to job {}",
                username, job_id
            )));
        }
        Err(e.into())
    }
}
