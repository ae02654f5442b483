#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jobly_listings::{
    AppConfig, AppState,
    auth::Claims,
    error::AppError,
    models::{Company, CompanyDetail, Job, NewCompany, NewJob, RemovedJob, User},
    query::{CompiledFilter, PartialUpdate},
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::{Arc, Mutex};

// --- MOCK REPOSITORY IMPLEMENTATION ---

/// In-memory stand-in for the database. Filter and update statements are recorded rather
/// than evaluated, so tests can assert on what the handlers compiled.
#[derive(Default)]
pub struct MockRepo {
    pub companies: Vec<Company>,
    pub jobs: Vec<Job>,
    pub users: Vec<User>,
    /// When set, every call fails the way a lost connection would.
    pub store_down: bool,
    pub filters: Mutex<Vec<CompiledFilter>>,
    pub updates: Mutex<Vec<PartialUpdate>>,
    pub applications: Mutex<Vec<(String, i32)>>,
}

impl MockRepo {
    pub fn seeded() -> Self {
        Self {
            companies: fixture_companies(),
            jobs: fixture_jobs(),
            users: fixture_users(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn filter_calls(&self) -> usize {
        self.filters.lock().unwrap().len()
    }

    pub fn last_filter(&self) -> Option<CompiledFilter> {
        self.filters.lock().unwrap().last().cloned()
    }

    pub fn last_update(&self) -> Option<PartialUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }

    fn check_store(&self) -> Result<(), AppError> {
        if self.store_down {
            return Err(AppError::Store(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.check_store()?;
        Ok(self.companies.clone())
    }

    async fn filter_companies(&self, filter: &CompiledFilter) -> Result<Vec<Company>, AppError> {
        self.check_store()?;
        self.filters.lock().unwrap().push(filter.clone());
        Ok(self.companies.clone())
    }

    async fn get_company(&self, handle: &str) -> Result<Option<CompanyDetail>, AppError> {
        self.check_store()?;
        Ok(self
            .companies
            .iter()
            .find(|c| c.handle == handle)
            .map(|company| CompanyDetail {
                company: company.clone(),
                jobs: self
                    .jobs
                    .iter()
                    .filter(|j| j.company_handle == handle)
                    .cloned()
                    .collect(),
            }))
    }

    async fn create_company(&self, company: NewCompany) -> Result<Company, AppError> {
        self.check_store()?;
        if self.companies.iter().any(|c| c.handle == company.handle) {
            return Err(AppError::BadRequest(format!(
                "Duplicate company: {}",
                company.handle
            )));
        }
        Ok(Company {
            handle: company.handle,
            name: company.name,
            description: company.description,
            num_employees: company.num_employees,
            logo_url: company.logo_url,
        })
    }

    async fn update_company(
        &self,
        handle: &str,
        update: &PartialUpdate,
    ) -> Result<Option<Company>, AppError> {
        self.check_store()?;
        self.updates.lock().unwrap().push(update.clone());
        Ok(self.companies.iter().find(|c| c.handle == handle).cloned())
    }

    async fn remove_company(&self, handle: &str) -> Result<bool, AppError> {
        self.check_store()?;
        Ok(self.companies.iter().any(|c| c.handle == handle))
    }

    async fn filter_jobs(&self, filter: &CompiledFilter) -> Result<Vec<Job>, AppError> {
        self.check_store()?;
        self.filters.lock().unwrap().push(filter.clone());
        Ok(self.jobs.clone())
    }

    async fn get_job(&self, id: i32) -> Result<Option<Job>, AppError> {
        self.check_store()?;
        Ok(self.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn jobs_by_title(&self, title: &str) -> Result<Vec<Job>, AppError> {
        self.check_store()?;
        Ok(self.jobs.iter().filter(|j| j.title == title).cloned().collect())
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, AppError> {
        self.check_store()?;
        if !self.companies.iter().any(|c| c.handle == job.company_handle) {
            return Err(AppError::BadRequest(format!(
                "No company: {}",
                job.company_handle
            )));
        }
        Ok(Job {
            id: 99,
            title: job.title,
            salary: job.salary,
            equity: job.equity,
            company_handle: job.company_handle,
        })
    }

    async fn update_job(&self, id: i32, update: &PartialUpdate) -> Result<Option<Job>, AppError> {
        self.check_store()?;
        self.updates.lock().unwrap().push(update.clone());
        Ok(self.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn remove_job(&self, id: i32) -> Result<Option<RemovedJob>, AppError> {
        self.check_store()?;
        Ok(self.jobs.iter().find(|j| j.id == id).map(|j| RemovedJob {
            id: j.id,
            title: j.title.clone(),
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.check_store()?;
        Ok(self.users.clone())
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, AppError> {
        self.check_store()?;
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    async fn remove_user(&self, username: &str) -> Result<bool, AppError> {
        self.check_store()?;
        Ok(self.users.iter().any(|u| u.username == username))
    }

    async fn apply_for_job(&self, username: &str, job_id: i32) -> Result<(), AppError> {
        self.check_store()?;
        if !self.users.iter().any(|u| u.username == username) {
            return Err(AppError::BadRequest(format!("No user: {}", username)));
        }
        if !self.jobs.iter().any(|j| j.id == job_id) {
            return Err(AppError::BadRequest(format!("No job: {}", job_id)));
        }
        self.applications
            .lock()
            .unwrap()
            .push((username.to_string(), job_id));
        Ok(())
    }
}

// --- Fixtures ---

pub fn fixture_companies() -> Vec<Company> {
    (1..=3)
        .map(|n| Company {
            handle: format!("c{}", n),
            name: format!("C{}", n),
            description: format!("Desc{}", n),
            num_employees: Some(n),
            logo_url: Some(format!("http://c{}.img", n)),
        })
        .collect()
}

pub fn fixture_jobs() -> Vec<Job> {
    vec![
        Job {
            id: 1,
            title: "testjob1".to_string(),
            salary: Some(10000),
            equity: Some(0.0),
            company_handle: "c1".to_string(),
        },
        Job {
            id: 2,
            title: "testjob2".to_string(),
            salary: Some(20000),
            equity: Some(0.02),
            company_handle: "c2".to_string(),
        },
        Job {
            id: 3,
            title: "testjob3".to_string(),
            salary: Some(30000),
            equity: Some(0.03),
            company_handle: "c3".to_string(),
        },
    ]
}

pub fn fixture_users() -> Vec<User> {
    vec![
        User {
            username: "u1".to_string(),
            first_name: "U1F".to_string(),
            last_name: "U1L".to_string(),
            email: "u1@email.com".to_string(),
            is_admin: false,
            jobs: vec![1],
        },
        User {
            username: "u2".to_string(),
            first_name: "U2F".to_string(),
            last_name: "U2L".to_string(),
            email: "u2@email.com".to_string(),
            is_admin: false,
            jobs: Vec::new(),
        },
    ]
}

pub fn state_with(repo: Arc<MockRepo>) -> AppState {
    AppState {
        repo,
        config: AppConfig::default(),
    }
}

// --- Tokens ---

pub fn token_with(secret: &str, username: &str, is_admin: bool, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        username: username.to_string(),
        is_admin,
        iat: now,
        exp: now + exp_offset,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding")
}

/// A valid token signed with the default test configuration's secret.
pub fn token(username: &str, is_admin: bool) -> String {
    token_with(&AppConfig::default().jwt_secret, username, is_admin, 3600)
}
