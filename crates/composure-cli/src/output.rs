//! Formatted output helpers for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

/// Serialization format of printed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Serializes `value` in `format`, always ending with a newline.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    let mut text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Ok(text)
}

/// Writes command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn render_json_is_pretty() {
        let text = render(&json!({"a": 1}), OutputFormat::Json).expect("render");
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn render_yaml_keeps_key_order() {
        let text = render(&json!({"version": "2.1", "services": {}}), OutputFormat::Yaml)
            .expect("render");
        assert_eq!(text, "version: '2.1'\nservices: {}\n");
    }
}
