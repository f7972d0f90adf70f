use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use client_core::OverlapPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "server-manager.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub report_dir: PathBuf,
    pub log_filter: String,
    pub overlap_policy: OverlapPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".into(),
            report_dir: PathBuf::from("."),
            log_filter: "info".into(),
            overlap_policy: OverlapPolicy::LastResolvedWins,
        }
    }
}

/// Defaults, then the TOML file, then the environment. An explicitly named
/// config file must exist; the default one is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("cannot read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("report_dir") {
        settings.report_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    if let Some(v) = file_cfg.get("overlap_policy") {
        settings.overlap_policy = parse_overlap_policy(v)?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("SERVER_MANAGER_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = lookup("APP__REPORT_DIR") {
        settings.report_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("APP__OVERLAP_POLICY") {
        settings.overlap_policy = parse_overlap_policy(&v)?;
    }
    Ok(())
}

pub fn parse_overlap_policy(raw: &str) -> anyhow::Result<OverlapPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "last-resolved" | "last_resolved" => Ok(OverlapPolicy::LastResolvedWins),
        "latest-issued" | "latest_issued" => Ok(OverlapPolicy::LatestIssuedWins),
        other => bail!("unknown overlap policy '{other}' (expected last-resolved or latest-issued)"),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
api_url = "http://directory.internal:9000/api"
report_dir = "./reports"
overlap_policy = "latest-issued"
"#,
        )
        .expect("apply file");

        assert_eq!(settings.api_url, "http://directory.internal:9000/api");
        assert_eq!(settings.report_dir, PathBuf::from("./reports"));
        assert_eq!(settings.log_filter, "info");
        assert_eq!(settings.overlap_policy, OverlapPolicy::LatestIssuedWins);
    }

    #[test]
    fn app_prefixed_env_wins_over_plain_env() {
        let mut settings = Settings::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("SERVER_MANAGER_API_URL", "http://plain:8080"),
            ("APP__API_URL", "http://prefixed:8080"),
            ("APP__LOG_FILTER", "client_core=debug"),
        ]);

        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string())).expect("apply env");

        assert_eq!(settings.api_url, "http://prefixed:8080");
        assert_eq!(settings.log_filter, "client_core=debug");
    }

    #[test]
    fn rejects_unknown_overlap_policy() {
        assert!(parse_overlap_policy("first-come").is_err());
        assert_eq!(
            parse_overlap_policy("LAST_RESOLVED").expect("policy"),
            OverlapPolicy::LastResolvedWins
        );
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let missing = env::temp_dir().join(format!("server_manager_missing_{suffix}.toml"));

        let err = load_settings(Some(&missing)).expect_err("must fail");
        assert!(err.to_string().contains("cannot read config file"));
    }

    #[test]
    fn reads_explicit_config_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("server_manager_config_{suffix}.toml"));
        fs::write(&path, "report_dir = \"/tmp/server-reports\"\n").expect("write config");

        let settings = load_settings(Some(&path)).expect("load");
        assert_eq!(settings.report_dir, PathBuf::from("/tmp/server-reports"));

        fs::remove_file(path).expect("cleanup");
    }
}
