use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gitqa",
    version,
    about = "Score agent answers to git-history questions against reference answers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score one agent answer for one task
    Eval(EvalArgs),
    /// Score every task in the catalog from the agents' environment directories
    Batch(BatchArgs),
    /// Run calibration fixtures and check each score lands in its expected range
    Fixtures(FixturesArgs),
    /// Inspect the task catalog
    Tasks(TasksArgs),
    Version,
}

/// Where the dataset lives and how much to run at once. Flags override the config file.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct CommonArgs {
    /// Config file (default: ./gitqa.yaml when present)
    #[arg(long, env = "GITQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dataset directory containing questions.json and source_answers/
    #[arg(long, env = "GITQA_DATASET_DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Directory holding one environment directory per task
    #[arg(long, env = "GITQA_ENVS_DIR")]
    pub envs_dir: Option<PathBuf>,

    /// Maximum concurrent task evaluations
    #[arg(long, env = "GITQA_PARALLEL")]
    pub parallel: Option<usize>,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct JudgeArgs {
    /// Judge backend
    /// - openai: live judge calls (OPENAI_API_KEY required)
    /// - fake: deterministic offline judge (tests/dev)
    /// - none: judge disabled; only empty answers can be scored
    #[arg(long, env = "GITQA_JUDGE")]
    pub judge: Option<String>,

    /// Judge model identifier (provider-specific)
    /// Example: gpt-4o-mini
    #[arg(long, env = "GITQA_JUDGE_MODEL")]
    pub judge_model: Option<String>,

    /// OpenAI-compatible endpoint, e.g. a local gateway
    #[arg(long, env = "GITQA_JUDGE_BASE_URL")]
    pub judge_base_url: Option<String>,

    /// Temperature used for judge calls
    /// Default: 0.0
    #[arg(long, env = "GITQA_JUDGE_TEMPERATURE")]
    pub judge_temperature: Option<f32>,

    #[arg(long, env = "GITQA_JUDGE_MAX_TOKENS")]
    pub judge_max_tokens: Option<u32>,

    /// Retries after the first attempt on transient judge failures
    #[arg(long, env = "GITQA_JUDGE_MAX_RETRIES")]
    pub judge_max_retries: Option<u32>,

    /// Deadline for one judge call, in seconds
    #[arg(long, env = "GITQA_JUDGE_TIMEOUT_SECS")]
    pub judge_timeout_secs: Option<u64>,

    /// Canned response for --judge fake
    #[arg(long, hide = true, env = "GITQA_FAKE_RESPONSE")]
    pub fake_response: Option<String>,
}

#[derive(Parser, Clone, Debug)]
pub struct EvalArgs {
    #[arg(long)]
    pub task_id: String,

    /// File holding the agent's answer (falls back to the environment directory)
    #[arg(long, conflicts_with = "answer_text")]
    pub agent_answer: Option<PathBuf>,

    /// The agent's answer as literal text
    #[arg(long)]
    pub answer_text: Option<String>,

    /// Agent environment directory (default: <envs_dir>/<task_id>)
    #[arg(long)]
    pub env_path: Option<PathBuf>,

    /// Write the scored result as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct BatchArgs {
    /// Write the batch report as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct FixturesArgs {
    #[arg(long)]
    pub task_id: String,

    /// Fixture suite YAML (default: the four standard tiers from <dataset>/tests/mock)
    #[arg(long)]
    pub suite: Option<PathBuf>,

    /// Write fixture results as JSON
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(Parser, Clone, Debug)]
pub struct TasksArgs {
    #[command(subcommand)]
    pub cmd: TasksSub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum TasksSub {
    /// List tasks, optionally filtered by category
    List {
        #[arg(long)]
        category: Option<String>,

        /// Print tasks as JSON lines
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Verify that every task has a reference answer
    Check {
        #[command(flatten)]
        common: CommonArgs,
    },
}
