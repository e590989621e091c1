use super::super::args::BatchArgs;
use super::runner_builder::{build_runner, provenance, resolve_config};
use crate::exit_codes;
use gitqa_core::engine::TaskOutcome;
use gitqa_core::errors::RunErrorKind;
use gitqa_core::report::console;
use gitqa_core::report::json::BatchReport;
use gitqa_core::report::summary::write_report;

pub async fn run(args: BatchArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.common, &args.judge)?;
    let runner = build_runner(&cfg, &args.judge)?;

    let outcomes = runner.run_batch(&cfg.envs_dir).await;
    let report = BatchReport::new(&outcomes, provenance(&runner));
    console::print_batch(&outcomes, &report.summary);

    if let Some(out) = &args.output {
        write_report(&report, out)?;
        eprintln!("Results saved to: {}", out.display());
    }
    Ok(batch_exit_code(&outcomes))
}

/// Judge trouble outranks ordinary task errors.
pub(crate) fn batch_exit_code(outcomes: &[TaskOutcome]) -> i32 {
    let kinds: Vec<RunErrorKind> = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().err().map(|e| e.kind()))
        .collect();
    if kinds.is_empty() {
        exit_codes::SUCCESS
    } else if kinds
        .iter()
        .any(|k| exit_codes::for_kind(*k) == exit_codes::INFRA_ERROR)
    {
        exit_codes::INFRA_ERROR
    } else {
        exit_codes::TEST_FAILURE
    }
}
