//! Recursive environment-variable expansion over a parsed YAML document,
//! applied before any schema validation sees the config.

use std::env;

use regex::Regex;
use serde_yaml::Value;

fn pattern() -> Regex {
    // ${VAR}, ${VAR:-default}, or bare $VAR.
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env expansion regex is well-formed")
}

/// Expands `${VAR}`, `${VAR:-default}` and `$VAR` references in a single
/// string. A reference with no default and no env value is left as the
/// literal matched text, matching `os.path.expandvars` semantics.
pub fn expand_str(input: &str) -> String {
    pattern()
        .replace_all(input, |caps: &regex::Captures| {
            if let Some(name) = caps.get(1) {
                match env::var(name.as_str()) {
                    Ok(value) => value,
                    Err(_) => match caps.get(3) {
                        Some(default) => default.as_str().to_string(),
                        None => caps.get(0).unwrap().as_str().to_string(),
                    },
                }
            } else if let Some(name) = caps.get(4) {
                env::var(name.as_str()).unwrap_or_else(|_| caps.get(0).unwrap().as_str().to_string())
            } else {
                caps.get(0).unwrap().as_str().to_string()
            }
        })
        .into_owned()
}

/// Walks a YAML value recursively, expanding environment variables in every
/// string found, including mapping keys.
pub fn expand_all(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(expand_str(&s)),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(expand_all).collect()),
        Value::Mapping(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (k, v) in map {
                let k = expand_all(k);
                out.insert(k, expand_all(v));
            }
            Value::Mapping(out)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_and_bare() {
        std::env::set_var("SYNC_CONFIG_TEST_VAR", "hello");
        assert_eq!(expand_str("${SYNC_CONFIG_TEST_VAR}"), "hello");
        assert_eq!(expand_str("$SYNC_CONFIG_TEST_VAR-suffix"), "hello-suffix");
    }

    #[test]
    fn falls_back_to_default() {
        std::env::remove_var("SYNC_CONFIG_TEST_UNSET");
        assert_eq!(expand_str("${SYNC_CONFIG_TEST_UNSET:-fallback}"), "fallback");
    }
}
