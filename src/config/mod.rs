//! Layered configuration.
//!
//! Values are looked up across layers, later layers winning:
//!
//! 1. global rc file `~/.dbm/.dbmrc`
//! 2. project rc file `.dbmrc`, found by walking up from the working directory
//! 3. environment variables `DBM_CONFIG_<KEY>`
//! 4. command line overrides
//!
//! Only keys declared through a [`ConfigSpec`] can be read. Stores declare
//! their own keys with [`Config::extend_specs`].

use anyhow::{Context, Result, bail};
use ini::Ini;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::runtime::{self, Runtime};

pub const APP_NAME: &str = "dbm";
pub const RC_FILE: &str = ".dbmrc";
pub const ENV_PREFIX: &str = "DBM_CONFIG_";
pub const ROOT_DIR_ENV: &str = "DEPENDENCY_BUNDLE_ROOT";
pub const DEFAULT_ROOT_DIR: &str = ".ndb";
pub const DEFAULT_TAG: &str = "latest";

/// A known configuration key and its fallback value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSpec {
    pub name: String,
    pub default: Option<String>,
}

impl ConfigSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Layer {
    source: String,
    values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    specs: Vec<ConfigSpec>,
    layers: Vec<Layer>,
}

impl Config {
    pub fn new(specs: Vec<ConfigSpec>) -> Self {
        let mut config = Self::default();
        config.extend_specs(specs);
        config
    }

    /// Add a layer on top of the existing ones.
    pub fn with_layer(mut self, source: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        self.layers.push(Layer {
            source: source.into(),
            values,
        });
        self
    }

    /// Set a value in the topmost override layer.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if self.layers.last().is_none_or(|l| l.source != "overrides") {
            self.layers.push(Layer {
                source: "overrides".to_string(),
                values: BTreeMap::new(),
            });
        }
        if let Some(layer) = self.layers.last_mut() {
            layer.values.insert(key.into(), value.into());
        }
    }

    /// Declare more keys. A spec with an existing name replaces it.
    pub fn extend_specs(&mut self, specs: impl IntoIterator<Item = ConfigSpec>) {
        for spec in specs {
            match self.specs.iter_mut().find(|s| s.name == spec.name) {
                Some(existing) => *existing = spec,
                None => self.specs.push(spec),
            }
        }
    }

    pub fn has_spec(&self, key: &str) -> bool {
        self.specs.iter().any(|s| s.name == key)
    }

    /// Value of `key`, falling back to its [`ConfigSpec`] default. Unknown keys are an error.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(spec) = self.specs.iter().find(|s| s.name == key) else {
            bail!("Unknown config key {}", key);
        };
        let value = self
            .layers
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(key))
            .cloned()
            .or_else(|| spec.default.clone());
        Ok(value)
    }

    /// Like [`Config::get`], failing when the key has no value at all.
    pub fn require(&self, key: &str) -> Result<String> {
        self.get(key)?
            .with_context(|| format!("Missing config value for {}", key))
    }

    /// Boolean value of `key`. `true`, `1`, `yes` and `on` are truthy.
    pub fn get_flag(&self, key: &str) -> Result<bool> {
        Ok(self
            .get(key)?
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false))
    }

    /// Every declared key that has a value, in declaration order.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for spec in &self.specs {
            if let Some(value) = self.get(&spec.name)? {
                entries.push((spec.name.clone(), value));
            }
        }
        Ok(entries)
    }
}

/// Built-in keys. `store` defaults to `default_store`.
pub fn default_specs<R: Runtime>(runtime: &R, default_store: &str) -> Result<Vec<ConfigSpec>> {
    let basedir = runtime.current_dir()?;
    Ok(vec![
        ConfigSpec::with_default("store", default_store),
        ConfigSpec::with_default("basedir", basedir.to_string_lossy()),
        ConfigSpec::with_default("tag", DEFAULT_TAG),
        ConfigSpec::with_default("check", "false"),
        ConfigSpec::with_default("rootdir", default_root_dir(runtime)?.to_string_lossy()),
    ])
}

/// `$DEPENDENCY_BUNDLE_ROOT`, else `~/.ndb`.
pub fn default_root_dir<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if let Ok(root) = runtime.env_var(ROOT_DIR_ENV)
        && !root.is_empty()
    {
        return Ok(PathBuf::from(root));
    }
    let home = runtime
        .home_dir()
        .context("Could not find home directory")?;
    Ok(home.join(DEFAULT_ROOT_DIR))
}

/// Build the configuration from rc files, the environment and `overrides`.
#[tracing::instrument(skip(runtime, overrides))]
pub fn load<R: Runtime>(
    runtime: &R,
    default_store: &str,
    overrides: BTreeMap<String, String>,
) -> Result<Config> {
    let mut config = Config::new(default_specs(runtime, default_store)?);

    if let Some(home) = runtime.home_dir() {
        let global = home.join(format!(".{}", APP_NAME)).join(RC_FILE);
        config = config.with_layer(global.display().to_string(), read_ini(runtime, &global)?);
    }

    let cwd = runtime.current_dir()?;
    if let Some(project) = find_up(runtime, &cwd, RC_FILE) {
        config = config.with_layer(project.display().to_string(), read_ini(runtime, &project)?);
    }

    config = config.with_layer("environment", read_env(runtime.env_vars()));
    config = config.with_layer("overrides", overrides);
    Ok(config)
}

/// Top level `key = value` pairs of an INI file. A missing file is empty.
pub fn read_ini<R: Runtime>(runtime: &R, path: &Path) -> Result<BTreeMap<String, String>> {
    let content = match runtime.read_to_string(path) {
        Ok(content) => content,
        Err(e) if runtime::is_not_found(&e) => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.context(format!("Failed to read {:?}", path))),
    };
    let ini = Ini::load_from_str(&content).with_context(|| format!("Invalid rc file {:?}", path))?;
    debug!("Loaded config from {:?}", path);
    Ok(ini
        .general_section()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect())
}

/// Nearest `file_name` in `start` or one of its ancestors.
pub fn find_up<R: Runtime>(runtime: &R, start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|candidate| runtime.exists(candidate) && !runtime.is_dir(candidate))
}

/// `DBM_CONFIG_ROOT_DIR=x` becomes `root-dir = x`. Matching is case-insensitive.
pub fn read_env(vars: impl IntoIterator<Item = (String, String)>) -> BTreeMap<String, String> {
    let prefix = ENV_PREFIX.to_lowercase();
    vars.into_iter()
        .filter_map(|(key, value)| {
            let lower = key.to_lowercase();
            let rest = lower.strip_prefix(&prefix)?;
            let key: String = rest
                .chars()
                .enumerate()
                .map(|(i, c)| if i > 0 && c == '_' { '-' } else { c })
                .collect();
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::TempDir;

    fn specs() -> Vec<ConfigSpec> {
        vec![
            ConfigSpec::with_default("store", "git"),
            ConfigSpec::with_default("tag", "latest"),
            ConfigSpec::new("rootdir"),
        ]
    }

    #[test]
    fn test_later_layers_win() {
        let config = Config::new(specs())
            .with_layer("global", BTreeMap::from([("store".into(), "local".into())]))
            .with_layer(
                "project",
                BTreeMap::from([("store".into(), "git".into()), ("tag".into(), "beta".into())]),
            )
            .with_value("tag", "rc");

        assert_eq!(config.get("store").unwrap().as_deref(), Some("git"));
        assert_eq!(config.get("tag").unwrap().as_deref(), Some("rc"));
        assert_eq!(config.get("rootdir").unwrap(), None);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let config = Config::new(specs()).with_value("repo", "git@github.com:user");
        let err = config.get("repo").unwrap_err();
        assert_eq!(err.to_string(), "Unknown config key repo");
    }

    #[test]
    fn test_extend_specs() {
        let mut config = Config::new(specs()).with_value("repo", "git@github.com:user");
        config.extend_specs(vec![ConfigSpec::new("repo"), ConfigSpec::with_default("tag", "next")]);

        assert_eq!(
            config.get("repo").unwrap().as_deref(),
            Some("git@github.com:user")
        );
        assert_eq!(config.get("tag").unwrap().as_deref(), Some("next"));
        assert!(config.has_spec("repo"));
        let keys: Vec<String> = config.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["store", "tag", "repo"]);
    }

    #[test]
    fn test_flags_and_require() {
        let config = Config::new(vec![
            ConfigSpec::with_default("check", "false"),
            ConfigSpec::new("force"),
            ConfigSpec::new("basedir"),
        ])
        .with_value("force", "Yes");

        assert!(!config.get_flag("check").unwrap());
        assert!(config.get_flag("force").unwrap());
        assert!(config.require("basedir").is_err());
    }

    #[test]
    fn test_read_env() {
        let vars = vec![
            ("DBM_CONFIG_STORE".to_string(), "local".to_string()),
            ("dbm_config_root_dir".to_string(), "/opt/ndb".to_string()),
            ("DBM_CONFIG_".to_string(), "ignored".to_string()),
            ("HOME".to_string(), "/home/user".to_string()),
        ];
        let env = read_env(vars);
        assert_eq!(
            env,
            BTreeMap::from([
                ("store".to_string(), "local".to_string()),
                ("root-dir".to_string(), "/opt/ndb".to_string()),
            ])
        );
    }

    #[test]
    fn test_default_root_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ROOT_DIR_ENV))
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/user")));
        assert_eq!(
            default_root_dir(&runtime).unwrap(),
            PathBuf::from("/home/user/.ndb")
        );

        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(ROOT_DIR_ENV))
            .returning(|_| Ok("/srv/bundles".to_string()));
        assert_eq!(
            default_root_dir(&runtime).unwrap(),
            PathBuf::from("/srv/bundles")
        );
    }

    #[test]
    fn test_find_up_and_read_ini() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join("a").join(RC_FILE),
            "store = local\nrepo = /srv/store\n\n[ignored]\nstore = git\n",
        )
        .unwrap();

        let found = find_up(&RealRuntime, &nested, RC_FILE).unwrap();
        assert_eq!(found, dir.path().join("a").join(RC_FILE));

        let values = read_ini(&RealRuntime, &found).unwrap();
        assert_eq!(values.get("store").map(String::as_str), Some("local"));
        assert_eq!(values.get("repo").map(String::as_str), Some("/srv/store"));
        assert!(
            read_ini(&RealRuntime, &dir.path().join("missing"))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_load_layers() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let project = dir.path().join("work/app");
        fs::create_dir_all(home.join(".dbm")).unwrap();
        fs::create_dir_all(&project).unwrap();
        fs::write(home.join(".dbm").join(RC_FILE), "store = local\ntag = stable\n").unwrap();
        fs::write(dir.path().join("work").join(RC_FILE), "tag = beta\n").unwrap();

        let mut runtime = MockRuntime::new();
        let home_dir = home.clone();
        runtime.expect_home_dir().returning(move || Some(home_dir.clone()));
        let cwd = project.clone();
        runtime.expect_current_dir().returning(move || Ok(cwd.clone()));
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime.expect_env_vars().returning(|| {
            vec![("DBM_CONFIG_CHECK".to_string(), "true".to_string())]
        });
        runtime
            .expect_read_to_string()
            .returning(|p| RealRuntime.read_to_string(p));
        runtime.expect_exists().returning(|p| p.exists());
        runtime.expect_is_dir().returning(|p| p.is_dir());

        let config = load(
            &runtime,
            "git",
            BTreeMap::from([("rootdir".to_string(), "/tmp/ndb".to_string())]),
        )
        .unwrap();

        assert_eq!(config.get("store").unwrap().as_deref(), Some("local"));
        assert_eq!(config.get("tag").unwrap().as_deref(), Some("beta"));
        assert!(config.get_flag("check").unwrap());
        assert_eq!(config.get("rootdir").unwrap().as_deref(), Some("/tmp/ndb"));
        assert_eq!(
            config.get("basedir").unwrap(),
            Some(project.to_string_lossy().into_owned())
        );
    }
}
