//! Reading invocation parameters from a file or stdin.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read a YAML (or JSON) parameter mapping. `None` or `-` reads stdin.
pub fn read_params(source: Option<&Path>) -> Result<Value> {
    let (origin, text) = match source {
        Some(path) if path != Path::new("-") => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading parameters from {}", path.display()))?;
            (path.display().to_string(), text)
        }
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("reading parameters from stdin")?;
            ("stdin".to_string(), text)
        }
    };

    parse_params(&text).with_context(|| format!("parsing parameters from {origin}"))
}

fn parse_params(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        bail!("no parameters given");
    }
    let value: Value = serde_yaml::from_str(text)?;
    if !value.is_object() {
        bail!("expected a mapping of parameters");
    }
    Ok(value)
}

/// The `region` parameter, if the invocation names one.
pub fn requested_region(raw: &Value) -> Option<String> {
    raw.get("region")
        .and_then(Value::as_str)
        .filter(|r| !r.trim().is_empty())
        .map(str::to_string)
}

/// Override the invocation's `check_mode` with `true`.
pub fn force_check_mode(raw: &mut Value) {
    if let Value::Object(map) = raw {
        map.insert("check_mode".to_string(), Value::Bool(true));
    }
}
