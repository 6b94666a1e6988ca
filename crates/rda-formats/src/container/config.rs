//! Loader configuration

use serde::{Deserialize, Serialize};

/// Configuration for [`ContainerFileLoader`](super::ContainerFileLoader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Extensions of embedded files loaded as nested containers, with the
    /// leading dot, compared case-sensitively
    pub container_extensions: Vec<String>,
    /// Exact names (final path component) of embedded containers
    pub container_file_names: Vec<String>,
    /// Whether embedded containers are expanded at all
    pub load_nested_containers: bool,
    /// Containers nested deeper than this are kept as plain files
    pub max_nesting_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            container_extensions: vec![".a6m".to_string(), ".a7m".to_string(), ".a7t".to_string()],
            container_file_names: vec!["rd3d.data".to_string()],
            load_nested_containers: true,
            max_nesting_depth: 16,
        }
    }
}

impl LoaderConfig {
    /// Set the nested container extensions
    #[must_use]
    pub fn with_container_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.container_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the nested container file names
    #[must_use]
    pub fn with_container_file_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.container_file_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable nested container expansion
    #[must_use]
    pub fn with_nested_containers(mut self, enabled: bool) -> Self {
        self.load_nested_containers = enabled;
        self
    }

    /// Set the maximum nesting depth
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.container_extensions, [".a6m", ".a7m", ".a7t"]);
        assert_eq!(config.container_file_names, ["rd3d.data"]);
        assert!(config.load_nested_containers);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{ "load_nested_containers": false }"#).unwrap();
        assert!(!config.load_nested_containers);
        assert_eq!(config.container_file_names, ["rd3d.data"]);
        assert_eq!(config.max_nesting_depth, 16);
    }

    #[test]
    fn test_builders() {
        let config = LoaderConfig::default()
            .with_container_extensions([".xyz"])
            .with_container_file_names(Vec::<String>::new())
            .with_max_nesting_depth(1);
        assert_eq!(config.container_extensions, [".xyz"]);
        assert!(config.container_file_names.is_empty());
        assert_eq!(config.max_nesting_depth, 1);
    }
}
