use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_DATABASE_PATH: &str = "database.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to, `host:port`
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// SQLite database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_database_path() -> String {
    DEFAULT_DATABASE_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
        }
    }
}

/// Environment variables take precedence over whatever the file provided.
fn with_overrides(cfg: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    Config {
        bind_addr: lookup("NOTES_API_BIND_ADDR").unwrap_or(cfg.bind_addr),
        database_path: lookup("NOTES_API_DATABASE_PATH").unwrap_or(cfg.database_path),
    }
}

fn load_from_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(Into::into)
}

fn load_from_files() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("NOTES_API_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path
    if Path::new(&config_path).exists() {
        return load_from_file(&config_path);
    }

    // Fallback to config.yaml
    if Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file("config.yaml");
    }

    // Fallback to config.example.yaml
    if Path::new("config.example.yaml").exists() {
        tracing::warn!(
            "Config file '{}' and 'config.yaml' not found, falling back to 'config.example.yaml'",
            config_path
        );
        return load_from_file("config.example.yaml");
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

/// Loads the first config file found, then applies `NOTES_API_BIND_ADDR` and
/// `NOTES_API_DATABASE_PATH` on top.
pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let cfg = load_from_files()?;

    Ok(with_overrides(cfg, |key| env::var(key).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    #[test]
    fn yaml_fields_default_when_absent() {
        let cfg: Config = serde_yaml::from_str("database_path: notes.db\n").unwrap();

        assert_eq!(cfg.database_path, "notes.db");
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars = HashMap::from([("NOTES_API_BIND_ADDR", "0.0.0.0:8080")]);

        let cfg = with_overrides(Config::default(), |key| {
            vars.get(key).map(ToString::to_string)
        });

        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.database_path, DEFAULT_DATABASE_PATH);
    }

    #[test]
    fn environment_overrides_values_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "bind_addr: \"127.0.0.1:9000\"\ndatabase_path: \"file.db\"\n").unwrap();
        let vars = HashMap::from([("NOTES_API_DATABASE_PATH", "/tmp/env.db")]);

        let from_file = load_from_file(path.to_str().unwrap()).unwrap();
        let cfg = with_overrides(from_file.clone(), |key| {
            vars.get(key).map(ToString::to_string)
        });

        assert_eq!(cfg.database_path, "/tmp/env.db");
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");

        let untouched = with_overrides(from_file.clone(), |_| None);
        assert_eq!(untouched, from_file);
    }

    #[test]
    fn reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "bind_addr: \"127.0.0.1:9000\"\ndatabase_path: \":memory:\"\n").unwrap();

        let cfg = load_from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(
            cfg,
            Config {
                bind_addr: "127.0.0.1:9000".to_string(),
                database_path: ":memory:".to_string(),
            }
        );
    }
}
