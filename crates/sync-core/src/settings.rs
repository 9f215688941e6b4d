use std::env;

/// Ambient process settings, layered built-in default < environment
/// variable < explicit config-file value. Environment variables bind to
/// settings keys with a prefix scheme: `X_FOO_BAR` maps to `x.foo_bar`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub config_path: String,
    pub ini_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            config_path: "config".to_string(),
            ini_path: None,
        }
    }
}

impl Settings {
    /// Build settings from environment variables under the given prefix,
    /// falling back to defaults for anything unset. `prefix` is matched
    /// case-sensitively against the leading `X_` style segment, e.g.
    /// prefix `"SYNCD"` reads `SYNCD_LOG_LEVEL`, `SYNCD_CONFIG_PATH`,
    /// `SYNCD_INI_PATH`.
    pub fn from_env(prefix: &str) -> Self {
        let mut settings = Settings::default();
        if let Ok(v) = env::var(format!("{prefix}_LOG_LEVEL")) {
            settings.log_level = v;
        }
        if let Ok(v) = env::var(format!("{prefix}_CONFIG_PATH")) {
            settings.config_path = v;
        }
        if let Ok(v) = env::var(format!("{prefix}_INI_PATH")) {
            settings.ini_path = Some(v);
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.log_level, "info");
        assert!(s.ini_path.is_none());
    }
}
