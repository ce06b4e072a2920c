//! Loader for service configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, YAML sources in the order
//! they were attached, then `TAGSCOPE__`-prefixed environment variables
//! (`TAGSCOPE__SERVER__PORT=9000`). After merging, `${VAR}` placeholders in any
//! string are expanded from the process environment. Instagram credentials
//! left unset afterwards are filled from the legacy variables listed in
//! [`LEGACY_CREDENTIAL_ENV`].
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TAGSCOPE";

/// Legacy environment variable names for each credential field.
pub const LEGACY_CREDENTIAL_ENV: [(&str, &str); 6] = [
    ("cookie", "COOKIE"),
    ("user_agent", "USER_AGENT"),
    ("asbd_id", "X_ASBD_ID"),
    ("csrf_token", "X_CSRFTOKEN"),
    ("ig_app_id", "X_IG_APP_ID"),
    ("ig_www_claim", "X_IG_WWW_CLAIM"),
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TagscopeConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub version: Option<String>,
    pub server: ServerConfig,
    pub output: OutputConfig,
    pub filter: FilterConfig,
    pub export: ExportConfig,
    pub instagram: InstagramConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_allowed_origins: vec!["*".into()],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where raw and extracted artifacts are written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/app/output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Look-back window applied when a request has no `limit`.
    pub default_window_days: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub csv_header: CsvHeaderStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvHeaderStyle {
    #[default]
    Indonesian,
    English,
}

/// Endpoint, timeout and request credentials for the Instagram fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstagramConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub cookie: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub user_agent: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub asbd_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub csrf_token: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ig_app_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub ig_www_claim: Option<String>,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".into(),
            timeout_secs: 30,
            cookie: None,
            user_agent: None,
            asbd_id: None,
            csrf_token: None,
            ig_app_id: None,
            ig_www_claim: None,
        }
    }
}

impl InstagramConfig {
    fn credential_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "cookie" => Some(&mut self.cookie),
            "user_agent" => Some(&mut self.user_agent),
            "asbd_id" => Some(&mut self.asbd_id),
            "csrf_token" => Some(&mut self.csrf_token),
            "ig_app_id" => Some(&mut self.ig_app_id),
            "ig_www_claim" => Some(&mut self.ig_www_claim),
            _ => None,
        }
    }

    /// Drop blank or unexpanded values, then fill the gaps via `lookup` using
    /// the legacy variable names.
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, var) in LEGACY_CREDENTIAL_ENV {
            let Some(slot) = self.credential_mut(field) else {
                continue;
            };
            *slot = slot.take().filter(|v| is_usable(v));
            if slot.is_none() {
                *slot = lookup(var).filter(|v| is_usable(v));
            }
        }
    }
}

fn is_usable(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.contains("${")
}

/// Accept strings, numbers and booleans for string-typed fields; YAML and
/// parsed env values turn things like app ids into integers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {other}"
        ))),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TagscopeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TagscopeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagscopeConfigLoader {
    /// Start with no file sources; environment overrides are attached last in
    /// [`TagscopeConfigLoader::load`] so they always win.
    ///
    /// ```
    /// use tagscope_config::TagscopeConfigLoader;
    ///
    /// let config = TagscopeConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.server.port, 8000);
    /// assert_eq!(config.filter.default_window_days, 30);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate infers
    /// the format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for deployments configured purely
    /// through the environment.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use tagscope_config::{CsvHeaderStyle, TagscopeConfigLoader};
    ///
    /// let cfg = TagscopeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// output:
    ///   dir: "/tmp/tagscope"
    /// export:
    ///   csv_header: english
    /// instagram:
    ///   ig_app_id: 936619743392459
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.output.dir.to_str(), Some("/tmp/tagscope"));
    /// assert_eq!(cfg.export.csv_header, CsvHeaderStyle::English);
    /// assert_eq!(cfg.instagram.ig_app_id.as_deref(), Some("936619743392459"));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    pub fn load(self) -> Result<TagscopeConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: TagscopeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .instagram
            .apply_legacy_env(|name| std::env::var(name).ok());

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn expands_placeholders_in_nested_values() {
        temp_env::with_vars(
            [("IG_COOKIE", Some("sessionid=abc")), ("IG_HOST", Some("example.test"))],
            || {
                let mut v = json!({
                    "instagram": { "cookie": "${IG_COOKIE}", "base_url": "https://$IG_HOST" },
                    "server": { "cors_allowed_origins": ["https://${IG_HOST}"], "port": 8000 }
                });
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!({
                        "instagram": {
                            "cookie": "sessionid=abc",
                            "base_url": "https://example.test"
                        },
                        "server": { "cors_allowed_origins": ["https://example.test"], "port": 8000 }
                    })
                );
            },
        );
    }

    #[test]
    fn expansion_follows_chained_references() {
        temp_env::with_vars(
            [
                ("INNER", Some("token")),
                ("OUTER", Some("csrf-${INNER}")),
            ],
            || {
                let mut v = json!("${OUTER}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("csrf-token"));
            },
        );
    }

    #[test]
    fn expansion_terminates_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${TAGSCOPE_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${TAGSCOPE_DOES_NOT_EXIST}"));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: TagscopeConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8000");
        assert_eq!(cfg.server.cors_allowed_origins, vec!["*".to_string()]);
        assert_eq!(cfg.output.dir, PathBuf::from("/app/output"));
        assert_eq!(cfg.export.csv_header, CsvHeaderStyle::Indonesian);
        assert_eq!(cfg.instagram.base_url, "https://www.instagram.com");
        assert_eq!(cfg.instagram.timeout_secs, 30);
        assert!(cfg.instagram.cookie.is_none());
    }

    #[test]
    fn lenient_strings_accept_numbers_and_reject_maps() {
        let cfg: TagscopeConfig =
            serde_json::from_value(json!({ "version": 0.1, "instagram": { "asbd_id": 129477 } }))
                .unwrap();
        assert_eq!(cfg.version.as_deref(), Some("0.1"));
        assert_eq!(cfg.instagram.asbd_id.as_deref(), Some("129477"));

        let err = serde_json::from_value::<TagscopeConfig>(json!({
            "instagram": { "cookie": { "nested": true } }
        }));
        assert!(err.is_err());
    }

    #[test]
    fn legacy_env_fills_only_missing_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COOKIE", "from-env"),
            ("X_CSRFTOKEN", "csrf-env"),
            ("X_IG_APP_ID", ""),
        ]);
        let mut ig = InstagramConfig {
            cookie: Some("from-file".into()),
            csrf_token: Some("${UNSET_PLACEHOLDER}".into()),
            user_agent: Some("   ".into()),
            ..InstagramConfig::default()
        };

        ig.apply_legacy_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(ig.cookie.as_deref(), Some("from-file"));
        assert_eq!(ig.csrf_token.as_deref(), Some("csrf-env"));
        assert_eq!(ig.user_agent, None);
        assert_eq!(ig.ig_app_id, None);
        assert_eq!(ig.ig_www_claim, None);
    }
}
