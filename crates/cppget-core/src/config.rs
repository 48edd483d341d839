//! Run configuration: the root being bundled and the layered options.
//!
//! [`RootConfig`] pins down where a run reads from and writes to.
//! [`ResolvedOptions`] merges option values from several sources.
//!
//! Precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`CPPGET_GATHER`, `CPPGET_IGNORE`, `CPPGET_DEBUG`)
//! 3. Defaults
//!
//! List options (extensions, ignore globs) accumulate across sources instead
//! of replacing each other: defaults first, then environment, then CLI.

use std::path::{Path, PathBuf};

use crate::bundle::GatherOptions;
use crate::error::{GatherError, GatherResult};
use crate::rules::{FilterRules, CLI_EXTENSIONS};

/// Project name used when the root has no final path segment (e.g. `/`).
pub const FALLBACK_PROJECT_NAME: &str = "root";

/// Suffix appended to the project name to form the default bundle filename.
pub const OUTPUT_SUFFIX: &str = "-project.txt";

/// Comma-separated extra extensions.
pub const ENV_GATHER: &str = "CPPGET_GATHER";
/// Comma-separated ignore globs.
pub const ENV_IGNORE: &str = "CPPGET_IGNORE";
/// Boolean debug switch.
pub const ENV_DEBUG: &str = "CPPGET_DEBUG";

// ============================================================================
// Root Configuration
// ============================================================================

/// Where a run reads from and where its bundle goes. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    root_dir: PathBuf,
    project_name: String,
    output_file: PathBuf,
}

impl RootConfig {
    /// Resolve a root directory.
    ///
    /// Expands a leading `~`, canonicalizes the path and checks that it is a
    /// directory. The bundle defaults to `<project>-project.txt`, relative to
    /// the working directory.
    pub fn new(root: impl AsRef<Path>) -> GatherResult<Self> {
        let expanded = expand_home(root.as_ref());
        let root_dir = expanded
            .canonicalize()
            .map_err(|e| GatherError::from_root_io(&expanded, e))?;

        if !root_dir.is_dir() {
            return Err(GatherError::RootNotDirectory { path: root_dir });
        }

        let project_name = root_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string());
        let output_file = PathBuf::from(format!("{}{}", project_name, OUTPUT_SUFFIX));

        Ok(RootConfig {
            root_dir,
            project_name,
            output_file,
        })
    }

    /// Replace the bundle destination.
    pub fn with_output_file(mut self, output_file: impl Into<PathBuf>) -> Self {
        self.output_file = output_file.into();
        self
    }

    /// Canonical root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Final segment of the root directory.
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Bundle destination.
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }
}

/// Replace a leading `~` component with the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From environment variable.
    EnvVar = 1,
    /// From CLI flag (highest precedence).
    CliFlag = 2,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

/// Option values supplied on the command line.
///
/// `None` means the flag was not given and lower layers decide.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub extra_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub debug: Option<bool>,
    pub include_empty: Option<bool>,
    pub append_tree: Option<bool>,
    pub output_file: Option<PathBuf>,
}

// ============================================================================
// Configuration Resolution
// ============================================================================

/// Resolved options with precedence information.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// Extensions in the order their sources were applied.
    pub extensions: Vec<String>,
    /// Ignore globs in the order their sources were applied.
    pub ignore_patterns: Vec<String>,
    pub debug: ConfigValue<bool>,
    pub include_empty: ConfigValue<bool>,
    pub append_tree: ConfigValue<bool>,
    pub output_file: Option<ConfigValue<PathBuf>>,
    /// Problems found while reading the environment, for the caller to log
    /// once its subscriber is installed.
    pub warnings: Vec<String>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        ResolvedOptions {
            extensions: CLI_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            ignore_patterns: Vec::new(),
            debug: ConfigValue::new(false, ConfigSource::Default),
            include_empty: ConfigValue::new(false, ConfigSource::Default),
            append_tree: ConfigValue::new(false, ConfigSource::Default),
            output_file: None,
            warnings: Vec::new(),
        }
    }
}

impl ResolvedOptions {
    /// Resolve options from the process environment and CLI overrides.
    pub fn resolve(cli: &CliOverrides) -> Self {
        Self::resolve_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Resolve options with an explicit environment lookup.
    pub fn resolve_with_env<F>(cli: &CliOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = ResolvedOptions::default();
        options.apply_env_vars(env);
        options.apply_cli_overrides(cli);
        options
    }

    fn apply_env_vars<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(gather) = env(ENV_GATHER) {
            self.extensions.extend(split_list(&gather));
        }

        if let Some(ignore) = env(ENV_IGNORE) {
            self.ignore_patterns.extend(split_list(&ignore));
        }

        if let Some(raw) = env(ENV_DEBUG) {
            match parse_bool(&raw) {
                Some(debug) => {
                    self.debug = self
                        .debug
                        .clone()
                        .merge(ConfigValue::new(debug, ConfigSource::EnvVar));
                }
                None => self
                    .warnings
                    .push(format!("ignoring {}={:?}: not a boolean", ENV_DEBUG, raw)),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        self.extensions.extend(cli.extra_extensions.iter().cloned());
        self.ignore_patterns.extend(cli.ignore_patterns.iter().cloned());

        if let Some(debug) = cli.debug {
            self.debug = ConfigValue::new(debug, ConfigSource::CliFlag);
        }
        if let Some(include_empty) = cli.include_empty {
            self.include_empty = ConfigValue::new(include_empty, ConfigSource::CliFlag);
        }
        if let Some(append_tree) = cli.append_tree {
            self.append_tree = ConfigValue::new(append_tree, ConfigSource::CliFlag);
        }
        if let Some(ref output_file) = cli.output_file {
            self.output_file = Some(ConfigValue::new(output_file.clone(), ConfigSource::CliFlag));
        }
    }

    /// Build the filter rules for these options.
    ///
    /// Fails if an ignore glob does not compile.
    pub fn filter_rules(&self) -> GatherResult<FilterRules> {
        FilterRules::builder()
            .extensions(&self.extensions)
            .ignore_patterns(self.ignore_patterns.iter().cloned())
            .build()
    }

    /// Bundling switches for these options.
    pub fn gather_options(&self) -> GatherOptions {
        GatherOptions {
            include_empty: self.include_empty.value,
            append_tree: self.append_tree.value,
        }
    }

    /// Resolve the root directory and apply any output override.
    pub fn root_config(&self, root: impl AsRef<Path>) -> GatherResult<RootConfig> {
        let config = RootConfig::new(root)?;
        Ok(match &self.output_file {
            Some(output) => config.with_output_file(output.value.clone()),
            None => config,
        })
    }
}

/// Split a comma-separated list, dropping blank items.
fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    mod root_config {
        use super::*;

        #[test]
        fn derives_project_name_and_output() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().join("gecs");
            fs::create_dir(&root).unwrap();

            let config = RootConfig::new(&root).unwrap();
            assert_eq!(config.project_name(), "gecs");
            assert_eq!(config.output_file(), Path::new("gecs-project.txt"));
            assert_eq!(config.root_dir(), root.canonicalize().unwrap());
        }

        #[test]
        fn canonicalizes_relative_segments() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().join("demo");
            fs::create_dir_all(root.join("src")).unwrap();

            let config = RootConfig::new(root.join("src").join("..")).unwrap();
            assert_eq!(config.project_name(), "demo");
        }

        #[test]
        fn missing_root_is_root_not_found() {
            let dir = TempDir::new().unwrap();
            let result = RootConfig::new(dir.path().join("missing"));
            assert!(matches!(result, Err(GatherError::RootNotFound { .. })));
        }

        #[test]
        fn file_root_is_not_directory() {
            let dir = TempDir::new().unwrap();
            let file = dir.path().join("SConstruct");
            fs::write(&file, "x").unwrap();
            let result = RootConfig::new(&file);
            assert!(matches!(result, Err(GatherError::RootNotDirectory { .. })));
        }

        #[test]
        fn output_override() {
            let dir = TempDir::new().unwrap();
            let config = RootConfig::new(dir.path())
                .unwrap()
                .with_output_file("/tmp/bundle.txt");
            assert_eq!(config.output_file(), Path::new("/tmp/bundle.txt"));
        }

        #[test]
        fn expand_home_leaves_plain_paths() {
            assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
            assert_eq!(expand_home(Path::new("~user/x")), PathBuf::from("~user/x"));
        }

        #[test]
        fn expand_home_replaces_tilde() {
            if let Some(home) = dirs::home_dir() {
                assert_eq!(expand_home(Path::new("~/proj")), home.join("proj"));
            }
        }
    }

    mod resolution {
        use super::*;

        #[test]
        fn defaults_use_cli_extension_set() {
            let options = ResolvedOptions::resolve_with_env(&CliOverrides::default(), no_env);
            assert_eq!(options.extensions, CLI_EXTENSIONS);
            assert!(!options.debug.value);
            assert!(options.ignore_patterns.is_empty());
        }

        #[test]
        fn env_and_cli_lists_accumulate_in_order() {
            let env = env_from(&[(ENV_GATHER, "glsl, inc"), (ENV_IGNORE, "gen/*,,tmp_*")]);
            let cli = CliOverrides {
                extra_extensions: vec!["tscn".to_string()],
                ignore_patterns: vec!["test_*.cpp".to_string()],
                ..Default::default()
            };
            let options = ResolvedOptions::resolve_with_env(&cli, env);

            assert_eq!(options.ignore_patterns, vec!["gen/*", "tmp_*", "test_*.cpp"]);

            let rules = options.filter_rules().unwrap();
            for ext in ["cpp", "glsl", "inc", "tscn"] {
                assert!(rules.extensions().contains(ext), "missing {}", ext);
            }
        }

        #[test]
        fn env_debug_is_overridden_by_cli() {
            let env = env_from(&[(ENV_DEBUG, "1")]);
            let options = ResolvedOptions::resolve_with_env(&CliOverrides::default(), &env);
            assert!(options.debug.value);
            assert_eq!(options.debug.source, ConfigSource::EnvVar);

            let cli = CliOverrides {
                debug: Some(false),
                ..Default::default()
            };
            let options = ResolvedOptions::resolve_with_env(&cli, &env);
            assert!(!options.debug.value);
            assert_eq!(options.debug.source, ConfigSource::CliFlag);
        }

        #[test]
        fn invalid_env_bool_is_ignored() {
            let env = env_from(&[(ENV_DEBUG, "maybe")]);
            let options = ResolvedOptions::resolve_with_env(&CliOverrides::default(), env);
            assert!(!options.debug.value);
            assert_eq!(options.debug.source, ConfigSource::Default);
            assert_eq!(
                options.warnings,
                vec![format!("ignoring {}=\"maybe\": not a boolean", ENV_DEBUG)]
            );
        }

        #[test]
        fn clean_env_has_no_warnings() {
            let env = env_from(&[(ENV_DEBUG, "true"), (ENV_GATHER, "glsl")]);
            let options = ResolvedOptions::resolve_with_env(&CliOverrides::default(), env);
            assert!(options.warnings.is_empty());
        }

        #[test]
        fn gather_options_reflect_flags() {
            let cli = CliOverrides {
                include_empty: Some(true),
                append_tree: Some(true),
                ..Default::default()
            };
            let options = ResolvedOptions::resolve_with_env(&cli, no_env);
            assert_eq!(
                options.gather_options(),
                GatherOptions {
                    include_empty: true,
                    append_tree: true,
                }
            );
        }

        #[test]
        fn invalid_ignore_glob_fails_rule_build() {
            let cli = CliOverrides {
                ignore_patterns: vec!["[z-a]".to_string()],
                ..Default::default()
            };
            let options = ResolvedOptions::resolve_with_env(&cli, no_env);
            assert!(matches!(
                options.filter_rules(),
                Err(GatherError::InvalidPattern { .. })
            ));
        }

        #[test]
        fn root_config_applies_output_override() {
            let dir = TempDir::new().unwrap();
            let cli = CliOverrides {
                output_file: Some(PathBuf::from("out/bundle.txt")),
                ..Default::default()
            };
            let options = ResolvedOptions::resolve_with_env(&cli, no_env);
            let config = options.root_config(dir.path()).unwrap();
            assert_eq!(config.output_file(), Path::new("out/bundle.txt"));
        }

        #[test]
        fn merge_prefers_higher_precedence() {
            let default = ConfigValue::new(1, ConfigSource::Default);
            let env = ConfigValue::new(2, ConfigSource::EnvVar);
            assert_eq!(default.clone().merge(env.clone()).value, 2);
            assert_eq!(env.merge(default).value, 2);
        }

        #[test]
        fn parse_bool_accepts_common_spellings() {
            assert_eq!(parse_bool("TRUE"), Some(true));
            assert_eq!(parse_bool(" on "), Some(true));
            assert_eq!(parse_bool("0"), Some(false));
            assert_eq!(parse_bool("nah"), None);
        }
    }
}
