mod common;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use common::{MockRepo, state_with};
use jobly_listings::{
    auth::{Access, Principal},
    criteria::{CompanyQuery, JobQuery},
    error::ErrorKind,
    handlers,
    models::{NewCompany, NewJob},
    query::SqlValue,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn admin() -> Access {
    Access::Authenticated(Principal {
        subject: "admin".to_string(),
        is_privileged: true,
        issued_at: Utc::now(),
    })
}

fn user(name: &str) -> Access {
    Access::Authenticated(Principal {
        subject: name.to_string(),
        is_privileged: false,
        issued_at: Utc::now(),
    })
}

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn company_query(name: Option<&str>, min: Option<&str>, max: Option<&str>) -> CompanyQuery {
    CompanyQuery {
        name: name.map(str::to_string),
        min_employees: min.map(str::to_string),
        max_employees: max.map(str::to_string),
    }
}

// --- Company listing ---

#[tokio::test]
async fn test_list_companies_without_query_skips_compiler() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let Json(list) = handlers::list_companies(State(state), Ok(Query(CompanyQuery::default())))
        .await
        .unwrap();

    assert_eq!(list.companies.len(), 3);
    assert_eq!(repo.filter_calls(), 0);
}

#[tokio::test]
async fn test_list_companies_unfiltered_empty_is_not_an_error() {
    let state = state_with(Arc::new(MockRepo::empty()));

    let Json(list) = handlers::list_companies(State(state), Ok(Query(CompanyQuery::default())))
        .await
        .unwrap();
    assert!(list.companies.is_empty());
}

#[tokio::test]
async fn test_list_companies_compiles_explicit_filter() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let query = company_query(Some("c"), Some("2"), Some("3"));
    handlers::list_companies(State(state), Ok(Query(query)))
        .await
        .unwrap();

    let filter = repo.last_filter().expect("filter was executed");
    assert_eq!(
        filter.clause,
        "1=1 AND name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
    );
}

#[tokio::test]
async fn test_list_companies_legacy_injects_defaults() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let query = company_query(Some("c"), None, None);
    handlers::list_companies_legacy(State(state), Ok(Query(query)))
        .await
        .unwrap();

    let filter = repo.last_filter().expect("filter was executed");
    assert_eq!(filter.params.len(), 3);
    assert_eq!(filter.params[1], SqlValue::Int(1));
}

#[tokio::test]
async fn test_inverted_range_never_reaches_the_store() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let query = company_query(None, Some("3"), Some("1"));
    let err = handlers::list_companies(State(state), Ok(Query(query)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(repo.filter_calls(), 0);
}

#[tokio::test]
async fn test_filtered_listing_with_no_rows_is_not_found() {
    let state = state_with(Arc::new(MockRepo::empty()));

    let query = company_query(Some("zzz"), None, None);
    let err = handlers::list_companies(State(state), Ok(Query(query)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_store_failure_is_internal() {
    let repo = MockRepo {
        store_down: true,
        ..MockRepo::default()
    };
    let state = state_with(Arc::new(repo));

    let err = handlers::list_companies(State(state), Ok(Query(CompanyQuery::default())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

// --- Company detail and mutations ---

#[tokio::test]
async fn test_get_company_includes_jobs() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(envelope) = handlers::get_company(State(state), Path("c2".to_string()))
        .await
        .unwrap();

    assert_eq!(envelope.company.company.name, "C2");
    assert_eq!(envelope.company.jobs.len(), 1);
    assert_eq!(envelope.company.jobs[0].title, "testjob2");
}

#[tokio::test]
async fn test_get_missing_company_is_not_found() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let err = handlers::get_company(State(state), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_company_as_admin() {
    let state = state_with(Arc::new(MockRepo::seeded()));
    let new_company = NewCompany {
        handle: "new".to_string(),
        name: "New".to_string(),
        description: "DescNew".to_string(),
        num_employees: Some(10),
        logo_url: Some("http://new.img".to_string()),
    };

    let (status, Json(envelope)) =
        handlers::create_company(admin(), State(state), Ok(Json(new_company)))
            .await
            .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(envelope.company.handle, "new");
}

#[tokio::test]
async fn test_create_company_rejects_non_admin_before_validation() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let err = handlers::create_company(user("u1"), State(state), Ok(Json(NewCompany::default())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_create_company_validates_payload() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let err = handlers::create_company(admin(), State(state), Ok(Json(NewCompany::default())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_create_company_rejects_uppercase_handle() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());
    let company = NewCompany {
        handle: "Upper".to_string(),
        name: "Upper".to_string(),
        description: "Mixed case".to_string(),
        ..NewCompany::default()
    };

    let err = handlers::create_company(admin(), State(state), Ok(Json(company)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(err.to_string().contains("lowercase"));
}

#[tokio::test]
async fn test_create_duplicate_company_is_bad_request() {
    let state = state_with(Arc::new(MockRepo::seeded()));
    let duplicate = NewCompany {
        handle: "c1".to_string(),
        name: "C1 again".to_string(),
        description: "dup".to_string(),
        ..NewCompany::default()
    };

    let err = handlers::create_company(admin(), State(state), Ok(Json(duplicate)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_update_company_binds_fields_then_handle() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let payload = body(json!({ "name": "C1-new", "numEmployees": 11 }));
    handlers::update_company(admin(), State(state), Path("c1".to_string()), Ok(Json(payload)))
        .await
        .unwrap();

    let update = repo.last_update().expect("update was executed");
    assert_eq!(update.assignments, "\"name\"=$1, \"num_employees\"=$2");
    assert_eq!(update.next_placeholder(), 3);
}

#[tokio::test]
async fn test_update_company_rejects_handle_change() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let payload = body(json!({ "handle": "c1-new" }));
    let err = handlers::update_company(admin(), State(state), Path("c1".to_string()), Ok(Json(payload)))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(repo.last_update().is_none());
}

#[tokio::test]
async fn test_update_company_with_empty_payload() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let err = handlers::update_company(admin(), State(state), Path("c1".to_string()), Ok(Json(Map::new())))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No data");
}

#[tokio::test]
async fn test_update_missing_company_is_not_found() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let payload = body(json!({ "name": "Ghost" }));
    let err = handlers::update_company(admin(), State(state), Path("nope".to_string()), Ok(Json(payload)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_company() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(deleted) = handlers::delete_company(admin(), State(state.clone()), Path("c1".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted.deleted, "c1");

    let err = handlers::delete_company(admin(), State(state), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// --- Jobs ---

#[tokio::test]
async fn test_list_jobs_always_compiles() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let Json(list) = handlers::list_jobs(State(state), Ok(Query(JobQuery::default())))
        .await
        .unwrap();

    assert_eq!(list.jobs.len(), 3);
    assert_eq!(repo.last_filter().unwrap().clause, "1=1");
}

#[tokio::test]
async fn test_list_jobs_empty_is_not_found() {
    let state = state_with(Arc::new(MockRepo::empty()));

    let err = handlers::list_jobs(State(state), Ok(Query(JobQuery::default())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_jobs_with_equity_flag() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let query = JobQuery {
        has_equity: Some("true".to_string()),
        ..JobQuery::default()
    };
    handlers::list_jobs(State(state), Ok(Query(query))).await.unwrap();

    let filter = repo.last_filter().unwrap();
    assert_eq!(filter.clause, "1=1 AND equity > 0");
    assert!(filter.params.is_empty());
}

#[tokio::test]
async fn test_get_job_parses_id() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(envelope) = handlers::get_job(State(state.clone()), Ok(Path("2".to_string())))
        .await
        .unwrap();
    assert_eq!(envelope.job.title, "testjob2");

    let err = handlers::get_job(State(state.clone()), Ok(Path("abc".to_string())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = handlers::get_job(State(state), Ok(Path("0".to_string())))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_get_jobs_by_title_is_exact() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(list) = handlers::get_jobs_by_title(State(state.clone()), Path("testjob1".to_string()))
        .await
        .unwrap();
    assert_eq!(list.jobs.len(), 1);

    let err = handlers::get_jobs_by_title(State(state), Path("testjob".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_job_for_unknown_company() {
    let state = state_with(Arc::new(MockRepo::seeded()));
    let job = NewJob {
        title: "Engineer".to_string(),
        salary: Some(100),
        equity: Some(0.1),
        company_handle: "ghost".to_string(),
    };

    let err = handlers::create_job(admin(), State(state), Ok(Json(job)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_update_job_rejects_company_handle() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let payload = body(json!({ "title": "New", "companyHandle": "c2" }));
    let err = handlers::update_job(admin(), State(state), Ok(Path("1".to_string())), Ok(Json(payload)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_delete_job_returns_identity() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(deleted) = handlers::delete_job(admin(), State(state), Ok(Path("3".to_string())))
        .await
        .unwrap();
    assert_eq!(deleted.deleted.id, 3);
    assert_eq!(deleted.deleted.title, "testjob3");
}

// --- Applications ---

#[tokio::test]
async fn test_owner_can_apply() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let (status, Json(applied)) = handlers::apply_for_job(
        user("u1"),
        State(state),
        Ok(Path(("u1".to_string(), "1".to_string()))),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(applied.applied, 1);
    assert_eq!(
        repo.applications.lock().unwrap().as_slice(),
        &[("u1".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_other_user_cannot_apply() {
    let repo = Arc::new(MockRepo::seeded());
    let state = state_with(repo.clone());

    let err = handlers::apply_for_job(
        user("u2"),
        State(state),
        Ok(Path(("u1".to_string(), "1".to_string()))),
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(repo.applications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_can_apply_for_anyone() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let result = handlers::apply_for_job(
        admin(),
        State(state),
        Ok(Path(("u1".to_string(), "2".to_string()))),
    )
    .await;
    assert!(result.is_ok());
}

// --- Users ---

#[tokio::test]
async fn test_list_users_requires_admin() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let err = handlers::list_users(user("u1"), State(state.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let Json(list) = handlers::list_users(admin(), State(state)).await.unwrap();
    assert_eq!(list.users.len(), 2);
    assert_eq!(list.users[0].jobs, vec![1]);
}

#[tokio::test]
async fn test_get_user_for_owner_and_admin_only() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(envelope) = handlers::get_user(user("u1"), State(state.clone()), Path("u1".to_string()))
        .await
        .unwrap();
    assert_eq!(envelope.user.email, "u1@email.com");

    let err = handlers::get_user(user("u2"), State(state.clone()), Path("u1".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = handlers::get_user(admin(), State(state), Path("ghost".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_user() {
    let state = state_with(Arc::new(MockRepo::seeded()));

    let Json(deleted) = handlers::delete_user(user("u2"), State(state.clone()), Path("u2".to_string()))
        .await
        .unwrap();
    assert_eq!(deleted.deleted, "u2");

    let err = handlers::delete_user(user("u2"), State(state.clone()), Path("u1".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = handlers::delete_user(admin(), State(state), Path("ghost".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
