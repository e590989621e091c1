use super::super::args::EvalArgs;
use super::runner_builder::{build_runner, provenance, resolve_config};
use crate::exit_codes;
use gitqa_core::candidate::CandidateSource;
use gitqa_core::report::console;
use gitqa_core::report::json::SingleReport;
use gitqa_core::report::summary::write_report;

pub async fn run(args: EvalArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.common, &args.judge)?;
    let runner = build_runner(&cfg, &args.judge)?;

    let env_dir = args
        .env_path
        .clone()
        .unwrap_or_else(|| cfg.envs_dir.join(&args.task_id));
    let source = match (&args.answer_text, &args.agent_answer) {
        (Some(text), _) => CandidateSource::Text(text.clone()),
        (None, Some(path)) => CandidateSource::File {
            path: path.clone(),
            env_dir: Some(env_dir),
        },
        (None, None) => CandidateSource::EnvDir(env_dir),
    };

    let scored = match runner.evaluate(&args.task_id, &source).await {
        Ok(scored) => scored,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(exit_codes::for_error(&e));
        }
    };

    console::print_task(&scored);
    println!("{:.2}", scored.score());

    if let Some(out) = &args.output {
        write_report(&SingleReport::new(&scored, provenance(&runner)), out)?;
        eprintln!("Results saved to: {}", out.display());
    }
    Ok(exit_codes::SUCCESS)
}
