use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "ghdb.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value `{0}`")]
    Missing(&'static str),

    #[error("either `es_url` or `cloud_id` must be configured")]
    NoIndexEndpoint,

    #[error("could not load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

/// Every recognized option of both pipelines. Values that have no sensible
/// default stay `None` until a pipeline asks for them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub search_term: Option<String>,
    pub state: String,
    pub output: PathBuf,
    pub org: Option<String>,
    pub project_number: u64,
    pub gh_program: String,
    pub cloud_id: Option<String>,
    pub es_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub index_name: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            base_url: None,
            search_term: None,
            state: "open".to_string(),
            output: PathBuf::from("filtered_issues.csv"),
            org: None,
            project_number: 1,
            gh_program: "gh".to_string(),
            cloud_id: None,
            es_url: None,
            user: None,
            password: None,
            index_name: "issues_github".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Where the search index lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexEndpoint {
    Url(String),
    CloudId(String),
}

#[derive(Clone, Debug)]
pub struct FilterSettings {
    pub token: String,
    pub base_url: String,
    pub search_term: String,
    pub state: String,
    pub output: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SyncSettings {
    pub token: String,
    pub base_url: String,
    pub state: String,
    pub org: String,
    pub project_number: u64,
    pub gh_program: String,
    pub endpoint: IndexEndpoint,
    pub user: Option<String>,
    pub password: Option<String>,
    pub index_name: String,
}

impl Config {
    /// Loads defaults, then `path` (or `ghdb.toml`), then `GITHUB_TOKEN`,
    /// then `GHDB_*` variables. Later sources win.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::raw().only(&["GITHUB_TOKEN"]).map(|_| "token".into()))
            .merge(Env::prefixed("GHDB_"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn filter_settings(&self) -> Result<FilterSettings, ConfigError> {
        Ok(FilterSettings {
            token: required(&self.token, "token")?,
            base_url: required(&self.base_url, "base_url")?,
            search_term: required(&self.search_term, "search_term")?,
            state: self.state.clone(),
            output: self.output.clone(),
        })
    }

    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let endpoint = match (non_empty(&self.es_url), non_empty(&self.cloud_id)) {
            (Some(url), _) => IndexEndpoint::Url(url.to_owned()),
            (None, Some(id)) => IndexEndpoint::CloudId(id.to_owned()),
            (None, None) => return Err(ConfigError::NoIndexEndpoint),
        };
        Ok(SyncSettings {
            token: required(&self.token, "token")?,
            base_url: required(&self.base_url, "base_url")?,
            state: self.state.clone(),
            org: required(&self.org, "org")?,
            project_number: self.project_number,
            gh_program: self.gh_program.clone(),
            endpoint,
            user: self.user.clone(),
            password: self.password.clone(),
            index_name: self.index_name.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    non_empty(value)
        .map(str::to_owned)
        .ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_any_source() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load(None).unwrap();
            assert_eq!(config.state, "open");
            assert_eq!(config.output, PathBuf::from("filtered_issues.csv"));
            assert_eq!(config.index_name, "issues_github");
            assert_eq!(config.project_number, 1);
            assert!(config.token.is_none());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "ghdb.toml",
                r#"
                    token = "from-file"
                    base_url = "https://api.github.com/repos/o/r/issues"
                    search_term = "crash"
                "#,
            )?;
            jail.set_env("GHDB_SEARCH_TERM", "timeout");
            let settings = Config::load(None).unwrap().filter_settings().unwrap();
            assert_eq!(settings.token, "from-file");
            assert_eq!(settings.search_term, "timeout");
            Ok(())
        });
    }

    #[test]
    fn github_token_variable_is_recognized() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GITHUB_TOKEN", "ghp_env");
            let config = Config::load(None).unwrap();
            assert_eq!(config.token.as_deref(), Some("ghp_env"));

            jail.set_env("GHDB_TOKEN", "ghp_prefixed");
            let config = Config::load(None).unwrap();
            assert_eq!(config.token.as_deref(), Some("ghp_prefixed"));
            Ok(())
        });
    }

    #[test]
    fn explicit_path_is_used() {
        Jail::expect_with(|jail| {
            jail.create_file("other.toml", r#"org = "acme""#)?;
            let config = Config::load(Some(Path::new("other.toml"))).unwrap();
            assert_eq!(config.org.as_deref(), Some("acme"));
            Ok(())
        });
    }

    #[test]
    fn missing_values_are_named() {
        let config = Config {
            token: Some("t".to_string()),
            ..Config::default()
        };
        let err = config.filter_settings().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("base_url")));

        let config = Config {
            token: Some(String::new()),
            ..Config::default()
        };
        assert!(matches!(
            config.filter_settings().unwrap_err(),
            ConfigError::Missing("token")
        ));
    }

    #[test]
    fn sync_needs_an_index_endpoint() {
        let mut config = Config {
            token: Some("t".to_string()),
            base_url: Some("https://api.github.com/repos/o/r/issues".to_string()),
            org: Some("acme".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.sync_settings().unwrap_err(),
            ConfigError::NoIndexEndpoint
        ));

        config.cloud_id = Some(String::new());
        assert!(matches!(
            config.sync_settings().unwrap_err(),
            ConfigError::NoIndexEndpoint
        ));

        config.cloud_id = Some("name:abc".to_string());
        assert_eq!(
            config.sync_settings().unwrap().endpoint,
            IndexEndpoint::CloudId("name:abc".to_string())
        );

        config.es_url = Some("http://localhost:9200".to_string());
        assert_eq!(
            config.sync_settings().unwrap().endpoint,
            IndexEndpoint::Url("http://localhost:9200".to_string())
        );
    }
}
