use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use vn_core::VnError;
use vn_runtime::SessionConfig;
use walkdir::WalkDir;

use crate::{
    map_cli_config_invalid, map_cli_config_read, map_cli_source_path, map_cli_source_read,
    map_cli_source_scan, LoadedScenario, SessionArgs,
};

const SCENARIO_REF_PREFIX: &str = "scripts-dir:";

pub(crate) fn load_source_by_scripts_dir(scripts_dir: &str) -> Result<LoadedScenario, VnError> {
    let scripts_root = resolve_scripts_dir(scripts_dir)?;
    let scripts_json = read_scripts_json_from_dir(&scripts_root)?;
    Ok(LoadedScenario {
        id: make_scripts_dir_scenario_id(&scripts_root),
        scripts_json,
    })
}

pub(crate) fn load_source_by_ref(scenario_ref: &str) -> Result<LoadedScenario, VnError> {
    let Some(raw) = scenario_ref.strip_prefix(SCENARIO_REF_PREFIX) else {
        return Err(VnError::usage(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported scenario ref: {}", scenario_ref),
        ));
    };
    load_source_by_scripts_dir(raw)
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, VnError> {
    let path = PathBuf::from(scripts_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(VnError::usage(
            "CLI_SOURCE_NOT_FOUND",
            format!("scripts-dir does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_dir() {
        return Err(VnError::usage(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

/// Every `.json` file below `scripts_dir`, keyed by its relative path.
pub(crate) fn read_scripts_json_from_dir(
    scripts_dir: &Path,
) -> Result<BTreeMap<String, String>, VnError> {
    let mut scripts = BTreeMap::new();

    for entry in WalkDir::new(scripts_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let relative = path
            .strip_prefix(scripts_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        scripts.insert(relative, content);
    }

    if scripts.is_empty() {
        return Err(VnError::usage(
            "CLI_SOURCE_EMPTY",
            format!("No .json script files under {}", scripts_dir.display()),
        ));
    }
    tracing::debug!(files = scripts.len(), dir = %scripts_dir.display(), "scripts read");
    Ok(scripts)
}

pub(crate) fn make_scripts_dir_scenario_id(scripts_dir: &Path) -> String {
    format!("{}{}", SCENARIO_REF_PREFIX, scripts_dir.display())
}

/// Config file first, then command-line overrides.
pub(crate) fn load_session_config(args: &SessionArgs) -> Result<SessionConfig, VnError> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(map_cli_config_read)?;
            serde_json::from_str::<SessionConfig>(&raw).map_err(map_cli_config_invalid)?
        }
        None => SessionConfig::default(),
    };
    if let Some(language) = &args.language {
        config.language = Some(language.clone());
    }
    if args.developer {
        config.developer = true;
    }
    Ok(config)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;
    use pretty_assertions::assert_eq;
    use vn_runtime::ErrorPolicy;

    #[test]
    fn load_source_by_ref_validates_ref_prefix() {
        let error = load_source_by_ref("unknown:main").expect_err("invalid ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
        let error = load_source_by_ref("").expect_err("empty ref should fail");
        assert_eq!(error.code, "CLI_SOURCE_REF_INVALID");
    }

    #[test]
    fn resolve_scripts_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_scripts_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_scripts_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn read_scripts_json_from_dir_keeps_json_files_only() {
        let root = temp_path("scripts-dir");
        write_file(&root.join("script.json"), "[]");
        write_file(&root.join("chapters/one.json"), "[]");
        write_file(&root.join("notes.txt"), "ignored");

        let scripts = read_scripts_json_from_dir(&root).expect("scan should pass");
        assert_eq!(
            scripts.keys().cloned().collect::<Vec<_>>(),
            vec!["chapters/one.json".to_string(), "script.json".to_string()]
        );
    }

    #[test]
    fn read_scripts_json_from_dir_errors_when_no_source_files() {
        let root = temp_path("empty-scripts-dir");
        write_file(&root.join("readme.txt"), "not source");
        let error = read_scripts_json_from_dir(&root).expect_err("empty source set should fail");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn scenario_ids_round_trip_through_refs() {
        let root = temp_path("scenario-id");
        write_file(&root.join("script.json"), "[]");
        let loaded =
            load_source_by_scripts_dir(&root.to_string_lossy()).expect("load should pass");
        assert!(loaded.id.starts_with(SCENARIO_REF_PREFIX));
        let again = load_source_by_ref(&loaded.id).expect("ref should load");
        assert_eq!(again.id, loaded.id);
        assert_eq!(again.scripts_json, loaded.scripts_json);
    }

    #[test]
    fn session_config_applies_overrides_after_the_file() {
        let path = temp_path("config").join("config.json");
        write_file(&path, r#"{"error_policy": "ignore", "language": "fr"}"#);
        let config = load_session_config(&SessionArgs {
            config: Some(path.to_string_lossy().to_string()),
            language: Some("de".to_string()),
            developer: true,
        })
        .expect("config should load");
        assert_eq!(config.error_policy, ErrorPolicy::Ignore);
        assert_eq!(config.language.as_deref(), Some("de"));
        assert!(config.developer);

        write_file(&path, "{");
        let error = load_session_config(&SessionArgs {
            config: Some(path.to_string_lossy().to_string()),
            ..SessionArgs::default()
        })
        .expect_err("broken config should fail");
        assert_eq!(error.code, "CLI_CONFIG_INVALID");
    }
}
