use super::super::args::FixturesArgs;
use super::batch::batch_exit_code;
use super::runner_builder::{build_runner, provenance, resolve_config};
use crate::exit_codes;
use gitqa_core::fixtures::FixtureSuite;
use gitqa_core::report::console;
use gitqa_core::report::json::FixtureReport;
use gitqa_core::report::summary::write_report;

pub async fn run(args: FixturesArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.common, &args.judge)?;
    let runner = build_runner(&cfg, &args.judge)?;

    let suite = match &args.suite {
        Some(path) => {
            let suite = FixtureSuite::load(path)?;
            if suite.task_id != args.task_id {
                anyhow::bail!(
                    "config error: suite {} is for task '{}', not '{}'",
                    path.display(),
                    suite.task_id,
                    args.task_id
                );
            }
            suite
        }
        None => FixtureSuite::standard(&args.task_id, &cfg.dataset_dir),
    };
    // Unknown task: fail fast instead of erroring every case.
    runner.corpus.task(&args.task_id)?;

    let (outcomes, results) = suite.run(&runner).await;
    let report = FixtureReport::new(&outcomes, &results, provenance(&runner));
    console::print_fixtures(&outcomes, &results, &report.summary);

    if let Some(out) = &args.output {
        write_report(&report, out)?;
        eprintln!("Detailed results saved to: {}", out.display());
    }

    if report.summary.all_tests_passed {
        eprintln!("All tests passed.");
        return Ok(exit_codes::SUCCESS);
    }
    let code = batch_exit_code(&outcomes);
    Ok(if code == exit_codes::INFRA_ERROR {
        code
    } else {
        exit_codes::TEST_FAILURE
    })
}
