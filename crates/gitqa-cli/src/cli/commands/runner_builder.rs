use super::super::args::{CommonArgs, JudgeArgs};
use gitqa_core::config::{load_config, EvalConfig, DEFAULT_CONFIG_FILE};
use gitqa_core::corpus::Corpus;
use gitqa_core::engine::Runner;
use gitqa_core::judge::JudgeService;
use gitqa_core::providers::llm::{FakeClient, LlmClient, OpenAIClient};
use gitqa_core::report::Provenance;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Config file (explicit, or ./gitqa.yaml when present) with flag overrides applied.
pub(crate) fn resolve_config(common: &CommonArgs, judge: &JudgeArgs) -> anyhow::Result<EvalConfig> {
    let mut cfg = match &common.config {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => EvalConfig::default(),
    };

    if let Some(dir) = &common.dataset_dir {
        cfg.dataset_dir = dir.clone();
    }
    if let Some(dir) = &common.envs_dir {
        cfg.envs_dir = dir.clone();
    }
    if let Some(n) = common.parallel {
        cfg.parallel = n;
    }

    let j = &mut cfg.judge;
    if let Some(p) = &judge.judge {
        j.provider = p.clone();
    }
    if judge.judge_model.is_some() {
        j.model = judge.judge_model.clone();
    }
    if judge.judge_base_url.is_some() {
        j.base_url = judge.judge_base_url.clone();
    }
    if let Some(t) = judge.judge_temperature {
        j.temperature = t;
    }
    if let Some(n) = judge.judge_max_tokens {
        j.max_tokens = n;
    }
    if let Some(n) = judge.judge_max_retries {
        j.max_retries = n;
    }
    if let Some(s) = judge.judge_timeout_secs {
        j.timeout_secs = s;
    }

    cfg.validate()?;
    Ok(cfg)
}

pub(crate) fn load_corpus(cfg: &EvalConfig) -> anyhow::Result<Arc<Corpus>> {
    let corpus = Corpus::load(&cfg.dataset_dir)?;
    tracing::debug!(
        tasks = corpus.catalog.len(),
        references = corpus.references.len(),
        digest = corpus.digest(),
        "corpus loaded"
    );
    Ok(Arc::new(corpus))
}

fn build_judge_client(
    cfg: &EvalConfig,
    judge_args: &JudgeArgs,
) -> anyhow::Result<Option<Arc<dyn LlmClient>>> {
    let settings = &cfg.judge;
    let client: Option<Arc<dyn LlmClient>> = match settings.provider.as_str() {
        "openai" => {
            let key = std::env::var("OPENAI_API_KEY").map_err(|_| {
                anyhow::anyhow!(
                    "judge provider 'openai' requires OPENAI_API_KEY.\n\
                     hint: export OPENAI_API_KEY, or run with --judge fake for an offline dry run"
                )
            })?;
            let model = settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
            let mut client =
                OpenAIClient::new(model, key, settings.temperature, settings.max_tokens);
            if let Some(url) = &settings.base_url {
                client = client.with_base_url(url.as_str());
            }
            Some(Arc::new(client))
        }
        "fake" => {
            let model = settings.model.clone().unwrap_or_else(|| "fake-judge".into());
            let mut client = FakeClient::new(model);
            if let Some(resp) = &judge_args.fake_response {
                client = client.with_response(resp.clone());
            }
            Some(Arc::new(client))
        }
        "none" => None,
        other => anyhow::bail!("unknown judge provider: {}", other),
    };
    Ok(client)
}

pub(crate) fn build_runner(cfg: &EvalConfig, judge_args: &JudgeArgs) -> anyhow::Result<Runner> {
    let corpus = load_corpus(cfg)?;
    let client = build_judge_client(cfg, judge_args)?;
    let judge = JudgeService::new(cfg.judge.runtime(), client);
    Ok(Runner::new(corpus, Arc::new(judge), cfg.parallel))
}

pub(crate) fn provenance(runner: &Runner) -> Provenance {
    Provenance::new(
        env!("CARGO_PKG_VERSION"),
        &runner.scorer.describe(),
        runner.corpus.digest(),
    )
}
