// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use electro_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1")).unwrap();
  pipeline.on_root("step2", create_simple_handler("step2", " S2")).unwrap();
  pipeline.on_root("step3", create_simple_handler("step3", " S3")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stepA", false, None),
    ("stopStep", false, None),
    ("stepC", false, None),
  ]);

  pipeline.on_root("stepA", create_simple_handler("stepA", "A")).unwrap();
  pipeline
    .on_root("stopStep", |ctx: ContextData<TestContext>| {
      Box::pin(async move {
        ctx.write().steps_executed.push("stopStep".to_string());
        Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
      })
    })
    .unwrap();
  pipeline.on_root("stepC", create_simple_handler("stepC", "C")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("another_step", false, None),
  ]);

  pipeline.on_root("good_step", create_simple_handler("good_step", "Good")).unwrap();
  pipeline.on_root("bad_step", create_failing_handler("bad_step", "I am a bad step!")).unwrap();
  pipeline.on_root("another_step", create_simple_handler("another_step", "NeverRun")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result, Err(TestError::Handler("I am a bad step!".to_string())));
  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("step1", false, None),
    (
      "step_to_skip",
      false,
      Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  pipeline.on_root("step1", create_simple_handler("step1", " S1")).unwrap();
  pipeline.on_root("step_to_skip", create_simple_handler("step_to_skip", " SKIPPED")).unwrap();
  pipeline.on_root("step3", create_simple_handler("step3", " S3")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("required", false, None), ("nice_to_have", true, None)]);
  pipeline.on_root("required", create_simple_handler("required", "R")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["required"]);
}

#[tokio::test]
#[serial]
async fn test_multiple_handlers_on_one_step_run_in_registration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("shared", false, None)]);
  pipeline.on_root("shared", create_simple_handler("first", "1")).unwrap();
  pipeline.on_root("shared", create_simple_handler("second", "2")).unwrap();

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "12");
}

#[tokio::test]
#[serial]
async fn test_stop_inside_step_skips_remaining_handlers() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("shared", false, None), ("later", false, None)]);
  pipeline.on_root("shared", create_simple_handler("first", "1")).unwrap();
  pipeline.on_root("shared", create_simple_handler("second", "2")).unwrap();
  pipeline.on_root("later", create_simple_handler("later", "L")).unwrap();

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("first".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["first"]);
}

#[test]
fn test_registering_handler_for_unknown_step_fails() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("known", false, None)]);
  let result = pipeline.on_root("unknown", create_simple_handler("unknown", "X"));
  assert!(matches!(result, Err(FlowError::StepNotFound { step_name }) if step_name == "unknown"));
  assert_eq!(pipeline.step_names(), vec!["known"]);
}
