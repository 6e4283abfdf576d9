// tests/admin_provisioning_tests.rs

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use common::{auth_header, insert_user, test_state, RecordingMailer, TEST_PASSWORD};
use electro_flow::ContextData;
use serde_json::{json, Value};
use std::sync::Arc;
use todo_electro::errors::AppError;
use todo_electro::models::{Account, AccountStatus};
use todo_electro::pipelines::contexts::AdminProvisioningCtxData;
use todo_electro::state::AppState;
use todo_electro::web::{configure_app_routes, json_config};

async fn provision(state: &AppState, requester: &Account, name: &str, email: &str, role: &str) -> Result<Account, AppError> {
  let ctx_data = ContextData::new(AdminProvisioningCtxData {
    app_state: state.clone(),
    requester: requester.clone(),
    name: name.to_string(),
    email: email.to_string(),
    password: TEST_PASSWORD.to_string(),
    role: role.to_string(),
    created: None,
  });
  state.flows.run(ctx_data.clone()).await?;
  Ok(ctx_data.with(|c| c.created.clone()).unwrap())
}

#[tokio::test]
async fn staff_without_superuser_is_forbidden() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let staff = insert_user(&state, "staff", true, false).await;

  let err = provision(&state, &staff, "nuevo", "nuevo@example.com", "admin").await.unwrap_err();
  assert!(matches!(err, AppError::Forbidden(_)));
  assert!(!state.store.username_exists("nuevo").await.unwrap());
}

#[tokio::test]
async fn superuser_creates_active_staff_and_superadmin_accounts() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let root = insert_user(&state, "admin", true, true).await;

  let regular = provision(&state, &root, "gestor", "gestor@example.com", "admin").await.unwrap();
  assert_eq!(regular.status(), AccountStatus::Active);
  assert!(regular.user.is_staff && !regular.user.is_superuser);
  assert!(regular.profile.is_email_verified);

  let full = provision(&state, &root, "jefa", "jefa@example.com", "superadmin").await.unwrap();
  assert!(full.user.is_staff && full.user.is_superuser);
}

#[tokio::test]
async fn duplicate_name_and_unknown_role_are_field_errors() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let root = insert_user(&state, "admin", true, true).await;
  insert_user(&state, "gestor", true, false).await;

  let err = provision(&state, &root, "gestor", "otro@example.com", "admin").await.unwrap_err();
  let fields = err.field_errors().unwrap();
  assert!(fields.contains_key("name"));
  assert!(!fields.contains_key("username"));

  let err = provision(&state, &root, "tercero", "tercero@example.com", "owner").await.unwrap_err();
  assert!(err.field_errors().unwrap().contains_key("role"));
}

#[actix_rt::test]
async fn admin_endpoint_enforces_superuser() {
  let state = test_state(Arc::new(RecordingMailer::default()));
  let root = insert_user(&state, "admin", true, true).await;
  let staff = insert_user(&state, "staff", true, false).await;
  let root_header = auth_header(&state, &root).await;
  let staff_header = auth_header(&state, &staff).await;
  let app = test::init_service(
    App::new()
      .app_data(web::Data::new(state.clone()))
      .app_data(json_config())
      .configure(configure_app_routes),
  )
  .await;
  let payload = json!({ "name": "gestor", "email": "gestor@example.com", "password": TEST_PASSWORD });

  let req = test::TestRequest::post()
    .uri("/api/users/admin/")
    .insert_header(staff_header)
    .set_json(&payload)
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri("/api/users/admin/")
    .insert_header(root_header.clone())
    .set_json(&payload)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["username"], "gestor");
  assert_eq!(body["is_staff"], true);
  assert_eq!(body["is_superuser"], false);

  let req = test::TestRequest::get()
    .uri("/api/users/admin-users/")
    .insert_header(root_header)
    .to_request();
  let staff_list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
  let names: Vec<&str> = staff_list.iter().filter_map(|u| u["username"].as_str()).collect();
  assert_eq!(names, vec!["admin", "gestor", "staff"]);
}
