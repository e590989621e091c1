use crate::errors::{EvalError, EvalResult};
use crate::judge::{
    JudgeRuntimeConfig, DEFAULT_BACKOFF_BASE_MS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "gitqa.yaml";
pub const JUDGE_PROVIDERS: [&str; 3] = ["openai", "fake", "none"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    pub version: u32,
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: PathBuf,
    #[serde(default = "default_envs_dir")]
    pub envs_dir: PathBuf,
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default)]
    pub judge: JudgeSettings,
}

fn default_dataset_dir() -> PathBuf {
    PathBuf::from("dataset_from_dspy")
}

fn default_envs_dir() -> PathBuf {
    PathBuf::from("envs")
}

fn default_parallel() -> usize {
    1
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            dataset_dir: default_dataset_dir(),
            envs_dir: default_envs_dir(),
            parallel: default_parallel(),
            judge: JudgeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct JudgeSettings {
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub backoff_base_ms: u64,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            temperature: 0.0,
            max_tokens: 1_000,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl JudgeSettings {
    pub fn runtime(&self) -> JudgeRuntimeConfig {
        JudgeRuntimeConfig {
            provider: self.provider.clone(),
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout_secs),
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            hijack_defense: true,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> EvalResult<()> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(EvalError::config(format!(
                "unsupported config version {} (supported: {})",
                self.version, SUPPORTED_CONFIG_VERSION
            )));
        }
        if self.parallel == 0 {
            return Err(EvalError::config("parallel must be at least 1"));
        }
        if !JUDGE_PROVIDERS.contains(&self.judge.provider.as_str()) {
            return Err(EvalError::config(format!(
                "unknown judge provider '{}' (expected one of: {})",
                self.judge.provider,
                JUDGE_PROVIDERS.join(", ")
            )));
        }
        if !(0.0..=2.0).contains(&self.judge.temperature) {
            return Err(EvalError::config(format!(
                "judge temperature {} out of range 0-2",
                self.judge.temperature
            )));
        }
        if self.judge.timeout_secs == 0 {
            return Err(EvalError::config("judge timeout_secs must be positive"));
        }
        Ok(())
    }
}

/// Load and validate a config file. Relative directories are taken relative to the file.
pub fn load_config(path: &Path) -> EvalResult<EvalConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let mut cfg: EvalConfig = serde_yaml::from_str(&raw).map_err(|e| {
        EvalError::config(format!("failed to parse {}: {}", path.display(), e))
    })?;
    cfg.validate()?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    if cfg.dataset_dir.is_relative() {
        cfg.dataset_dir = base.join(&cfg.dataset_dir);
    }
    if cfg.envs_dir.is_relative() {
        cfg.envs_dir = base.join(&cfg.envs_dir);
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn minimal_config_gets_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "version: 1\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.parallel, 1);
        assert_eq!(cfg.judge.provider, "openai");
        assert_eq!(cfg.judge.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(cfg.dataset_dir, dir.path().join("dataset_from_dspy"));
    }

    #[test]
    fn judge_block_maps_to_runtime_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(
            &path,
            "version: 1\nparallel: 4\ndataset_dir: /data/qa\njudge:\n  provider: fake\n  max_retries: 5\n  timeout_secs: 10\n  backoff_base_ms: 250\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.dataset_dir, PathBuf::from("/data/qa"));
        let rt = cfg.judge.runtime();
        assert_eq!(rt.provider, "fake");
        assert_eq!(rt.max_retries, 5);
        assert_eq!(rt.timeout, Duration::from_secs(10));
        assert_eq!(rt.backoff_base, Duration::from_millis(250));
    }

    #[test]
    fn unknown_fields_and_bad_values_are_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let cases = [
            "version: 1\nparalel: 2\n",
            "version: 2\n",
            "version: 1\nparallel: 0\n",
            "version: 1\njudge:\n  provider: claude\n",
            "version: 1\njudge:\n  temprature: 0.2\n",
        ];
        for raw in cases {
            std::fs::write(&path, raw).unwrap();
            let err = load_config(&path).unwrap_err();
            assert_eq!(err.kind(), crate::errors::RunErrorKind::Config, "{raw}");
        }
    }
}
