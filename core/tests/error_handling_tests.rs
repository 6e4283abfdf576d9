// tests/error_handling_tests.rs
mod common;

use common::*;
use electro_flow::{ContextData, FlowError, Pipeline, PipelineControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_pipeline_run_catches_handler_missing() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("missing", false, None)]);
  let ctx = ContextData::new(TestContext::default());
  match pipeline.run(ctx).await {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Flow(HandlerMissing), got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_flow_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, FlowError>::new(&[("task", false, None)]);
  pipeline
    .on_root("task", |ctx: ContextData<TestContext>| {
      Box::pin(async move {
        ctx.write().counter = 1;
        Ok::<PipelineControl, FlowError>(PipelineControl::Continue)
      })
    })
    .unwrap();

  let ctx = ContextData::new(TestContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().counter, 1);

  let mut failing_pipeline = Pipeline::<TestContext, FlowError>::new(&[("fail_task", false, None)]);
  failing_pipeline
    .on_root("fail_task", |_ctx| {
      Box::pin(async move { Err(FlowError::Internal("Intentional FlowError".to_string())) })
    })
    .unwrap();
  match failing_pipeline.run(ContextData::new(TestContext::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "Intentional FlowError"),
    other => panic!("Expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_anyhow_errors_become_handler_errors() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, FlowError>::new(&[("io", false, None)]);
  pipeline
    .on_root("io", |_ctx| {
      Box::pin(async move { Err::<PipelineControl, anyhow::Error>(anyhow::anyhow!("disk on fire")) })
    })
    .unwrap();

  match pipeline.run(ContextData::new(TestContext::default())).await {
    Err(FlowError::HandlerError { source }) => assert_eq!(source.to_string(), "disk on fire"),
    other => panic!("Expected FlowError::HandlerError, got {:?}", other),
  }
}
