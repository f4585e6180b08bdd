#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow, bail};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::pipeline::DEFAULT_MAX_RESULTS;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_DELAY_SECONDS: f64 = 1.0;

pub const API_KEY_VAR: &str = "YOUTUBE_API_KEY";
pub const MAX_RESULTS_VAR: &str = "EXPORT_MAX_RESULTS";
pub const DELAY_VAR: &str = "EXPORT_DELAY_SECONDS";

pub const MAX_RESULTS_RANGE: (usize, usize) = (1, 1000);
pub const DELAY_RANGE: (f64, f64) = (0.1, 10.0);

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub api_key: String,
    pub max_results: usize,
    pub delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub api_key: Option<String>,
    pub max_results: Option<usize>,
    pub delay_seconds: Option<f64>,
    pub env_path: Option<PathBuf>,
}

pub fn load_settings() -> Result<ExportSettings> {
    resolve_settings(SettingsOverrides::default())
}

/// Resolves settings with precedence override > process env > env file >
/// default, then validates the ranges.
pub fn resolve_settings(overrides: SettingsOverrides) -> Result<ExportSettings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_settings_with_overrides(&file_vars, env_var_string, overrides)
}

/// Looks up only the API key, for commands that need nothing else.
pub fn resolve_api_key(explicit: Option<String>, env_path: Option<&Path>) -> Result<String> {
    let env_path = env_path.unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    api_key_from(explicit, &file_vars, &env_var_string)
}

#[cfg(test)]
fn build_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<ExportSettings> {
    build_settings_with_overrides(file_vars, env_lookup, SettingsOverrides::default())
}

fn build_settings_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: SettingsOverrides,
) -> Result<ExportSettings> {
    let api_key = api_key_from(overrides.api_key, file_vars, &env_lookup)?;
    let max_results = overrides
        .max_results
        .or_else(|| {
            lookup_value(MAX_RESULTS_VAR, file_vars, &env_lookup)
                .and_then(|value| value.parse::<usize>().ok())
        })
        .unwrap_or(DEFAULT_MAX_RESULTS);
    let delay_seconds = overrides
        .delay_seconds
        .or_else(|| {
            lookup_value(DELAY_VAR, file_vars, &env_lookup)
                .and_then(|value| value.parse::<f64>().ok())
        })
        .unwrap_or(DEFAULT_DELAY_SECONDS);

    let (min_results, max_allowed) = MAX_RESULTS_RANGE;
    if !(min_results..=max_allowed).contains(&max_results) {
        bail!("max results must be between {min_results} and {max_allowed}, got {max_results}");
    }
    let (min_delay, max_delay) = DELAY_RANGE;
    if !delay_seconds.is_finite() || !(min_delay..=max_delay).contains(&delay_seconds) {
        bail!("delay must be between {min_delay} and {max_delay} seconds, got {delay_seconds}");
    }

    Ok(ExportSettings {
        api_key,
        max_results,
        delay: Duration::from_secs_f64(delay_seconds),
    })
}

fn api_key_from(
    explicit: Option<String>,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Result<String> {
    explicit
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| lookup_value(API_KEY_VAR, file_vars, env_lookup))
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{API_KEY_VAR} not set; pass --api-key or add it to .env"))
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| file_vars.get(key).cloned())
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Updates or appends a single env var inside the target file while preserving
/// unrelated lines and comments.
pub fn upsert_env_value(path: &Path, key: &str, value: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }

    let raw = fs::read_to_string(path).unwrap_or_default();
    let mut lines = Vec::new();
    let mut updated = false;
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");

    for line in raw.lines() {
        let trimmed = line.trim_start();
        let indent_len = line.len() - trimmed.len();
        let indent = &line[..indent_len];
        let (prefix, rest) = if let Some(stripped) = trimmed.strip_prefix("export ") {
            ("export ", stripped)
        } else {
            ("", trimmed)
        };
        let Some((candidate, _)) = rest.split_once('=') else {
            lines.push(line.to_string());
            continue;
        };
        if candidate.trim() == key {
            lines.push(format!("{indent}{prefix}{key}=\"{escaped}\""));
            updated = true;
        } else {
            lines.push(line.to_string());
        }
    }

    if !updated {
        lines.push(format!("{key}=\"{escaped}\""));
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, lines.join("\n") + "\n")
        .with_context(|| format!("Writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("Replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn settings_from(contents: &str) -> Result<ExportSettings> {
        let cfg = make_config(contents);
        let vars = read_env_file(cfg.path()).unwrap();
        build_settings(&vars, |_| None)
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = settings_from("YOUTUBE_API_KEY=\"abc\"\n").unwrap();
        assert_eq!(settings.api_key, "abc");
        assert_eq!(settings.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(settings.delay, Duration::from_secs(1));
    }

    #[test]
    fn reads_limits_from_file() {
        let settings = settings_from(
            "YOUTUBE_API_KEY=abc\nEXPORT_MAX_RESULTS=\"250\"\nEXPORT_DELAY_SECONDS=0.5\n",
        )
        .unwrap();
        assert_eq!(settings.max_results, 250);
        assert_eq!(settings.delay, Duration::from_millis(500));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = settings_from("EXPORT_MAX_RESULTS=10\n").unwrap_err();
        assert!(err.to_string().contains(API_KEY_VAR));

        let blank = settings_from("YOUTUBE_API_KEY=\"   \"\n").unwrap_err();
        assert!(blank.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = settings_from("YOUTUBE_API_KEY=k\nEXPORT_MAX_RESULTS=1001\n").unwrap_err();
        assert!(err.to_string().contains("max results"));

        let err = settings_from("YOUTUBE_API_KEY=k\nEXPORT_DELAY_SECONDS=0.05\n").unwrap_err();
        assert!(err.to_string().contains("delay"));

        let vars = HashMap::from([(API_KEY_VAR.to_string(), "k".to_string())]);
        let err = build_settings_with_overrides(
            &vars,
            |_| None,
            SettingsOverrides {
                max_results: Some(0),
                ..SettingsOverrides::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("between 1 and 1000"));
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let settings = settings_from(
            "YOUTUBE_API_KEY=k\nEXPORT_MAX_RESULTS=lots\nEXPORT_DELAY_SECONDS=soon\n",
        )
        .unwrap();
        assert_eq!(settings.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(settings.delay, Duration::from_secs(1));
    }

    #[test]
    fn env_wins_over_file_and_overrides_win_over_env() {
        let vars = read_env_file(
            make_config("YOUTUBE_API_KEY=\"file-key\"\nEXPORT_MAX_RESULTS=\"20\"\n").path(),
        )
        .unwrap();

        let from_env = build_settings(&vars, |key| {
            if key == API_KEY_VAR {
                Some("env-key".to_string())
            } else {
                None
            }
        })
        .unwrap();
        assert_eq!(from_env.api_key, "env-key");
        assert_eq!(from_env.max_results, 20);

        let overridden = build_settings_with_overrides(
            &vars,
            |key| {
                if key == MAX_RESULTS_VAR {
                    Some("30".to_string())
                } else {
                    None
                }
            },
            SettingsOverrides {
                api_key: Some("flag-key".into()),
                max_results: Some(5),
                delay_seconds: Some(2.5),
                env_path: None,
            },
        )
        .unwrap();
        assert_eq!(overridden.api_key, "flag-key");
        assert_eq!(overridden.max_results, 5);
        assert_eq!(overridden.delay, Duration::from_millis(2500));
    }

    #[test]
    fn blank_override_key_falls_back() {
        let vars = HashMap::from([(API_KEY_VAR.to_string(), "file-key".to_string())]);
        let key = api_key_from(Some("  ".into()), &vars, &|_: &str| None).unwrap();
        assert_eq!(key, "file-key");
    }

    #[test]
    fn read_env_file_handles_export_and_quotes() {
        let cfg = make_config(
            r#"
            export YOUTUBE_API_KEY="AIza-test"
            EXPORT_DELAY_SECONDS='2.0'
            EXPORT_MAX_RESULTS =  "75"
            # comment
            INVALID_LINE
            "#,
        );
        let vars = read_env_file(cfg.path()).unwrap();
        assert_eq!(vars.get(API_KEY_VAR).unwrap(), "AIza-test");
        assert_eq!(vars.get(DELAY_VAR).unwrap(), "2.0");
        assert_eq!(vars.get(MAX_RESULTS_VAR).unwrap(), "75");
        assert!(!vars.contains_key("INVALID_LINE"));
    }

    #[test]
    fn read_env_file_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_env_file(&dir.path().join("missing.env")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn upsert_env_value_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# settings\nexport YOUTUBE_API_KEY=\"old\"\nEXPORT_MAX_RESULTS=10\n",
        )
        .unwrap();

        upsert_env_value(&path, API_KEY_VAR, "new\"key").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "# settings\nexport YOUTUBE_API_KEY=\"new\\\"key\"\nEXPORT_MAX_RESULTS=10\n"
        );
    }

    #[test]
    fn upsert_env_value_appends_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".env");

        upsert_env_value(&path, API_KEY_VAR, "fresh").unwrap();

        let vars = read_env_file(&path).unwrap();
        assert_eq!(vars.get(API_KEY_VAR).unwrap(), "fresh");
    }
}
