use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

use crate::infra::{
    default_matching_config, demo_org, dependencies, seed_demo_world, InMemoryDispatchStore,
};
use dispatch_ai::error::AppError;
use dispatch_ai::workflows::dispatch::{
    ActorContext, AssignmentId, AutofillRequest, AutotuneController, FeedbackEntry,
    FeedbackRequest, FeedbackResult, MatchingService, PredictRequest, ShiftId,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Shift date for the seeded scenario (YYYY-MM-DD). Defaults to tomorrow.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) shift_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct AutotuneArgs {
    /// Synthetic feedback rows to seed before the pass
    #[arg(long, default_value_t = 20)]
    pub(crate) samples: usize,
    /// Share of seeded rows marked successful, in percent
    #[arg(long, default_value_t = 30)]
    pub(crate) success_percent: usize,
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

fn seed_feedback(store: &InMemoryDispatchStore, samples: usize, success_percent: usize) {
    let successes = samples * success_percent.min(100) / 100;
    for index in 0..samples {
        store.add_feedback(FeedbackEntry {
            assignment_id: AssignmentId(format!("asg-seed-{index:04}")),
            result: if index < successes {
                FeedbackResult::Success
            } else {
                FeedbackResult::Fail
            },
            responded_in: Some(if index % 2 == 0 { 120 } else { 600 }),
            recorded_at: Utc::now() - Duration::days(1),
        });
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let shift_date = args
        .shift_date
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(1));

    let store = Arc::new(InMemoryDispatchStore::default());
    seed_demo_world(&store, shift_date);

    let config = default_matching_config();
    let service = MatchingService::new(dependencies(&store), config.clone());
    let controller = AutotuneController::new(store.clone(), store.clone(), config);

    println!("Dispatch matching demo (shift date {shift_date})");

    println!("\n== Dry-run prediction for shift-s1 ==");
    let dry = service.predict(PredictRequest {
        shift_id: ShiftId("shift-s1".to_string()),
        organization_id: demo_org(),
        criteria: Vec::new(),
        auto_assign: true,
        dry_run: true,
        actor: ActorContext::default(),
    })?;
    println!("{}", pretty(&dry));

    println!("\n== Auto-assigning shift-s1 ==");
    let committed = service.predict(PredictRequest {
        shift_id: ShiftId("shift-s1".to_string()),
        organization_id: demo_org(),
        criteria: Vec::new(),
        auto_assign: true,
        dry_run: false,
        actor: ActorContext::default(),
    })?;
    println!("{}", pretty(&committed));

    println!("\n== Autofilling remaining open shifts ==");
    let autofill = service.autofill(AutofillRequest {
        organization_id: demo_org(),
        limit: 5,
        criteria: Vec::new(),
        actor: ActorContext::default(),
    })?;
    println!("{}", pretty(&autofill));

    if let Some(assignment_id) = committed.assignment_id() {
        println!("\n== Recording feedback for {} ==", assignment_id.0);
        let entry = service.record_feedback(FeedbackRequest {
            assignment_id: assignment_id.clone(),
            result: FeedbackResult::Success,
            responded_in: Some(90),
        })?;
        println!("{}", pretty(&entry));
    }

    println!("\n== Autotune pass over a struggling month ==");
    seed_feedback(&store, 19, 30);
    let report = controller.run();
    println!("{}", pretty(&report));

    println!("\n== Active weights after the pass ==");
    println!("{}", pretty(&service.weights_view()));

    Ok(())
}

pub(crate) fn run_autotune(args: AutotuneArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryDispatchStore::default());
    seed_feedback(&store, args.samples, args.success_percent);

    let controller =
        AutotuneController::new(store.clone(), store.clone(), default_matching_config());
    let report = controller.run();
    println!("{}", pretty(&report));

    Ok(())
}
