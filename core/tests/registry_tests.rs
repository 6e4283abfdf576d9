// tests/registry_tests.rs
mod common;

use common::*;
use electro_flow::{ContextData, FlowError, Flows, Pipeline, PipelineControl, PipelineResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RegistryContextAlpha {
  val: String,
}
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct RegistryContextBeta {
  num: i32,
}

#[tokio::test]
async fn test_registry_run_correct_pipeline() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  let mut p_alpha = Pipeline::<RegistryContextAlpha, TestError>::new(&[("alpha_task", false, None)]);
  p_alpha
    .on_root("alpha_task", |ctx: ContextData<RegistryContextAlpha>| {
      Box::pin(async move {
        ctx.write().val = "alpha_processed".to_string();
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();
  flows.register_pipeline(p_alpha);

  let mut p_beta = Pipeline::<RegistryContextBeta, TestError>::new(&[("beta_task", false, None)]);
  p_beta
    .on_root("beta_task", |ctx: ContextData<RegistryContextBeta>| {
      Box::pin(async move {
        ctx.write().num = 100;
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();
  flows.register_pipeline(p_beta);

  assert!(flows.is_registered::<RegistryContextAlpha>());
  assert!(flows.is_registered::<RegistryContextBeta>());

  let ctx_alpha = ContextData::new(RegistryContextAlpha::default());
  assert_eq!(flows.run(ctx_alpha.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_alpha.read().val, "alpha_processed");

  let ctx_beta = ContextData::new(RegistryContextBeta::default());
  assert_eq!(flows.run(ctx_beta.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx_beta.read().num, 100);
}

#[tokio::test]
async fn test_registry_pipeline_not_found() {
  setup_tracing();
  let flows = Flows::<TestError>::new();

  #[derive(Clone, Debug, Default)]
  struct UnregisteredContext;

  let result = flows.run(ContextData::new(UnregisteredContext)).await;
  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("PipelineNotRegistered"));
      assert!(s.contains("UnregisteredContext"));
    }
    other => panic!("Expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn test_registry_maps_handler_errors_to_application_error() {
  setup_tracing();
  let flows = Flows::<TestError>::new();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("fails", false, None)]);
  pipeline.on_root("fails", create_failing_handler("fails", "nope")).unwrap();
  flows.register_pipeline(pipeline);

  let result = flows.run(ContextData::new(TestContext::default())).await;
  assert_eq!(result, Err(TestError::Handler("nope".to_string())));
}
