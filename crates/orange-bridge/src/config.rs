//! Engine configuration

use crate::library;
use serde::Deserialize;
use std::path::PathBuf;

/// How the engine's entry points are bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Open the library at runtime and resolve symbols by name
    #[default]
    Dynamic,
    /// Use the entry points linked into the binary (`static-engine` feature)
    Static,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamic" => Ok(Self::Dynamic),
            "static" => Ok(Self::Static),
            other => Err(format!("unknown provider kind '{}'", other)),
        }
    }
}

/// Native engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the engine library, relative to the working directory
    pub library_dir: PathBuf,
    /// Library base name; the platform prefix and extension are added
    pub library_name: String,
    /// Full path override; takes precedence over `library_dir` + `library_name`
    pub library_path: Option<PathBuf>,
    /// Binding strategy
    pub provider: ProviderKind,
    /// Serialize every native call through one gate
    pub serialize_calls: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_dir: PathBuf::from("../dbms/bin"),
            library_name: "dbms".to_string(),
            library_path: None,
            provider: ProviderKind::Dynamic,
            serialize_calls: true,
        }
    }
}

impl EngineConfig {
    /// Resolve the library file for the running platform
    pub fn resolved_path(&self) -> PathBuf {
        match &self.library_path {
            Some(path) => path.clone(),
            None => library::library_path(&self.library_dir, &self.library_name),
        }
    }

    /// Overlay `ORANGE_LIB_*`, `ORANGE_PROVIDER` and `ORANGE_SERIALIZE_CALLS`
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("ORANGE_LIB_DIR") {
            self.library_dir = PathBuf::from(dir);
        }

        if let Ok(name) = std::env::var("ORANGE_LIB_NAME") {
            self.library_name = name;
        }

        if let Ok(path) = std::env::var("ORANGE_LIB_PATH") {
            self.library_path = Some(PathBuf::from(path));
        }

        if let Ok(provider) = std::env::var("ORANGE_PROVIDER") {
            match provider.parse() {
                Ok(kind) => self.provider = kind,
                Err(e) => tracing::warn!("Ignoring ORANGE_PROVIDER: {}", e),
            }
        }

        if let Ok(serialize) = std::env::var("ORANGE_SERIALIZE_CALLS") {
            if let Some(flag) = parse_flag("ORANGE_SERIALIZE_CALLS", &serialize) {
                self.serialize_calls = flag;
            }
        }

        self
    }

    /// Set an explicit library path
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

/// Parse a boolean environment value, warning when it is not `true`/`false`
fn parse_flag(name: &str, value: &str) -> Option<bool> {
    match value.trim().parse::<bool>() {
        Ok(flag) => Some(flag),
        Err(e) => {
            tracing::warn!("Ignoring {} '{}': {} (expected true or false)", name, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.library_dir, PathBuf::from("../dbms/bin"));
        assert_eq!(config.library_name, "dbms");
        assert!(config.library_path.is_none());
        assert_eq!(config.provider, ProviderKind::Dynamic);
        assert!(config.serialize_calls);
    }

    #[test]
    fn test_resolved_path_uses_override() {
        let config = EngineConfig::default().with_library_path("/opt/orange/libdbms.so");
        assert_eq!(config.resolved_path(), PathBuf::from("/opt/orange/libdbms.so"));
    }

    #[test]
    fn test_resolved_path_joins_dir_and_platform_name() {
        let config = EngineConfig::default();
        let path = config.resolved_path();
        assert!(path.starts_with("../dbms/bin"));
        assert_eq!(
            path.file_name().unwrap(),
            libloading::library_filename("dbms").as_os_str()
        );
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("dynamic".parse::<ProviderKind>(), Ok(ProviderKind::Dynamic));
        assert_eq!("STATIC".parse::<ProviderKind>(), Ok(ProviderKind::Static));
        assert!("plugin".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_engine_config_deserialize_partial() {
        let config: EngineConfig = toml::from_str(
            r#"
library_dir = "/srv/dbms"
serialize_calls = false
"#,
        )
        .unwrap();
        assert_eq!(config.library_dir, PathBuf::from("/srv/dbms"));
        assert_eq!(config.library_name, "dbms");
        assert!(!config.serialize_calls);
        assert_eq!(config.provider, ProviderKind::Dynamic);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("ORANGE_SERIALIZE_CALLS", "false"), Some(false));
        assert_eq!(parse_flag("ORANGE_SERIALIZE_CALLS", " true "), Some(true));
        assert_eq!(parse_flag("ORANGE_SERIALIZE_CALLS", "yes"), None);
        assert_eq!(parse_flag("ORANGE_SERIALIZE_CALLS", ""), None);
    }
}
