use std::fmt::Display;

use vn_core::{ErrorKind, VnError};

fn map_error(code: &'static str, error: impl Display) -> VnError {
    VnError::new(ErrorKind::Io, code, error.to_string())
}

pub(crate) fn emit_error(error: VnError) -> i32 {
    tracing::debug!(error = %error.describe(), "command failed");
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_KIND:{}", error.kind);
    if let Some(location) = &error.location {
        println!("ERROR_AT:{}:{}", location.filename, location.line);
    }
    println!("ERROR_MSG_JSON:{}", json_string(&error.message));
    1
}

pub(crate) fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

pub(crate) fn map_cli_io(error: std::io::Error) -> VnError {
    map_error("CLI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> VnError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> VnError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> VnError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_config_read(error: std::io::Error) -> VnError {
    map_error("CLI_CONFIG_READ", error)
}

pub(crate) fn map_cli_config_invalid(error: serde_json::Error) -> VnError {
    map_error("CLI_CONFIG_INVALID", error)
}

pub(crate) fn map_cli_state_write(error: std::io::Error) -> VnError {
    map_error("CLI_STATE_WRITE", error)
}

pub(crate) fn map_cli_state_read(error: std::io::Error) -> VnError {
    map_error("CLI_STATE_READ", error)
}

pub(crate) fn map_cli_state_invalid(error: serde_json::Error) -> VnError {
    map_error("CLI_STATE_INVALID", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(VnError::usage("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn json_string_escapes_quotes() {
        assert_eq!(json_string("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(map_cli_io(std::io::Error::other("io")).code, "CLI_IO");
        assert_eq!(
            map_cli_source_path(std::io::Error::other("path")).code,
            "CLI_SOURCE_PATH"
        );

        let strip_error = std::path::Path::new("/a")
            .strip_prefix("/b")
            .expect_err("strip prefix");
        assert_eq!(map_cli_source_scan(strip_error).code, "CLI_SOURCE_SCAN");
        assert_eq!(
            map_cli_source_read(std::io::Error::other("read")).code,
            "CLI_SOURCE_READ"
        );
        assert_eq!(
            map_cli_config_read(std::io::Error::other("read")).code,
            "CLI_CONFIG_READ"
        );
        assert_eq!(
            map_cli_state_write(std::io::Error::other("write")).code,
            "CLI_STATE_WRITE"
        );
        assert_eq!(
            map_cli_state_read(std::io::Error::other("read")).code,
            "CLI_STATE_READ"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_state_invalid(invalid).code, "CLI_STATE_INVALID");
        let invalid = serde_json::from_str::<serde_json::Value>("[").expect_err("invalid json");
        assert_eq!(map_cli_config_invalid(invalid).code, "CLI_CONFIG_INVALID");
    }
}
