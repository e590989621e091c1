use super::super::args::{TasksArgs, TasksSub};
use super::runner_builder::{load_corpus, resolve_config};
use crate::exit_codes;
use gitqa_core::model::{Category, Task};

pub fn run(args: TasksArgs) -> anyhow::Result<i32> {
    match args.cmd {
        TasksSub::List {
            category,
            json,
            common,
        } => {
            // Listing never calls the judge.
            let cfg = resolve_config(&common, &none_judge())?;
            let corpus = load_corpus(&cfg)?;
            let filter = category
                .as_deref()
                .map(str::parse::<Category>)
                .transpose()
                .map_err(|e| anyhow::anyhow!("config error: {}", e))?;

            let tasks: Box<dyn Iterator<Item = &Task> + '_> = match filter {
                Some(c) => Box::new(corpus.catalog.in_category(c)),
                None => Box::new(corpus.catalog.iter()),
            };
            for task in tasks {
                if json {
                    println!("{}", serde_json::to_string(task)?);
                } else {
                    println!("{:<48} {}", task.task_id, task.category);
                }
            }
            Ok(exit_codes::SUCCESS)
        }
        TasksSub::Check { common } => {
            let cfg = resolve_config(&common, &none_judge())?;
            let corpus = load_corpus(&cfg)?;
            let missing = corpus.missing_references();
            let rejected = corpus.catalog.rejected();
            eprintln!("Loaded {} tasks", corpus.catalog.len());
            for task in corpus.catalog.iter() {
                if missing.contains(&task.task_id.as_str()) {
                    eprintln!("❌ Missing source answer: {}", task.task_id);
                } else {
                    eprintln!("✅ Found source answer: {}", task.task_id);
                }
            }
            for r in rejected {
                eprintln!("❌ Invalid task: {} ({})", r.task_id, r.reason);
            }
            if missing.is_empty() && rejected.is_empty() {
                Ok(exit_codes::SUCCESS)
            } else {
                Ok(exit_codes::TEST_FAILURE)
            }
        }
    }
}

fn none_judge() -> super::super::args::JudgeArgs {
    super::super::args::JudgeArgs {
        judge: Some("none".into()),
        ..Default::default()
    }
}
