use super::args::{Cli, Command};
use crate::exit_codes;
use anyhow::Context;
use triage_core::config::{load_settings, Settings};
use triage_core::errors::PipelineError;
use triage_core::model::DateFilter;
use triage_core::service::ReviewService;

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn error_code(e: &PipelineError) -> i32 {
    if e.is_not_found() {
        exit_codes::NOT_FOUND
    } else {
        exit_codes::PIPELINE_ERROR
    }
}

fn report(e: PipelineError) -> i32 {
    eprintln!("error: {}", e);
    error_code(&e)
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let mut settings = if cli.settings.is_file() {
        load_settings(&cli.settings).with_context(|| {
            format!("failed to load settings from {}", cli.settings.display())
        })?
    } else {
        Settings::default()
    };
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }
    let svc = ReviewService::from_settings(&settings)?;

    let code = match cli.command {
        Command::CreateRun { days_back } => {
            let filter = days_back.map(|days_back| DateFilter { days_back });
            match svc.create_run(filter) {
                Ok(run_id) => {
                    print_json(&serde_json::json!({ "run_id": run_id }));
                    exit_codes::OK
                }
                Err(e) => report(e),
            }
        }
        Command::RunStage {
            run_id,
            variant,
            stage,
        } => match svc.run_stage(run_id, &variant, stage).await {
            Ok(outcome) => {
                print_json(&serde_json::to_value(&outcome)?);
                exit_codes::OK
            }
            Err(e) => report(e),
        },
        Command::Variants => {
            print_json(&serde_json::to_value(svc.list_variants())?);
            exit_codes::OK
        }
        Command::Runs => match svc.list_runs() {
            Ok(runs) => {
                print_json(&serde_json::to_value(runs)?);
                exit_codes::OK
            }
            Err(e) => report(e),
        },
        Command::Show {
            run_id,
            variant,
            stage,
        } => match svc.get_artifact(run_id, &variant, stage) {
            Ok(artifact) => {
                print_json(&artifact.to_json()?);
                exit_codes::OK
            }
            Err(e) => report(e),
        },
        Command::Summary { run_id, variant } => match svc.get_summary(run_id, &variant) {
            Ok(summary) => {
                print_json(&serde_json::to_value(summary)?);
                exit_codes::OK
            }
            Err(e) => report(e),
        },
        Command::Status { run_id, variant } => {
            let result = match variant {
                Some(variant) => svc
                    .run_state(run_id, &variant)
                    .and_then(|state| Ok(serde_json::to_value(state)?)),
                None => svc
                    .resume_run(run_id)
                    .and_then(|overview| Ok(serde_json::to_value(overview)?)),
            };
            match result {
                Ok(value) => {
                    print_json(&value);
                    exit_codes::OK
                }
                Err(e) => report(e),
            }
        }
        Command::Override {
            run_id,
            variant,
            video_id,
            verdict,
        } => match svc.override_verdict(run_id, &variant, &video_id, verdict) {
            Ok(outcome) => {
                print_json(&serde_json::to_value(&outcome)?);
                exit_codes::OK
            }
            Err(e) => report(e),
        },
    };
    Ok(code)
}
