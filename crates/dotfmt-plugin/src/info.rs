//! Static plugin metadata served to the host.

use serde::Serialize;

/// Key the host uses for this plugin's section of its configuration file.
pub const CONFIG_KEY: &str = "dotnet";

/// Release feed the host polls for newer builds.
pub const UPDATE_URL: &str = "https://plugins.dprint.dev/dprint/dprint-plugin-roslyn/latest.json";

/// Licence text returned for `GetLicenseText`.
pub const LICENSE_TEXT: &str = include_str!("../../../LICENSE");

/// Payload of the `GetPluginInfo` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    /// Package name.
    pub name: &'static str,
    /// Package version.
    pub version: &'static str,
    /// See [`CONFIG_KEY`].
    pub config_key: &'static str,
    /// Extensions of files the plugin formats.
    pub file_extensions: Vec<&'static str>,
    /// Documentation link.
    pub help_url: &'static str,
    /// JSON schema for the plugin's configuration; none is published.
    pub config_schema_url: &'static str,
    /// See [`UPDATE_URL`].
    pub update_url: &'static str,
}

impl PluginInfo {
    /// Metadata for this build, advertising `file_extensions`.
    #[must_use]
    pub fn new(file_extensions: Vec<&'static str>) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            config_key: CONFIG_KEY,
            file_extensions,
            help_url: env!("CARGO_PKG_HOMEPAGE"),
            config_schema_url: "",
            update_url: UPDATE_URL,
        }
    }
}

/// Payload of the `GetFileMatchingInfo` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatchingInfo {
    /// Extensions of files the plugin formats.
    pub file_extensions: Vec<&'static str>,
    /// Exact file names the plugin formats.
    pub file_names: Vec<&'static str>,
}

impl FileMatchingInfo {
    /// Matches files by extension only.
    #[must_use]
    pub const fn by_extension(file_extensions: Vec<&'static str>) -> Self {
        Self {
            file_extensions,
            file_names: Vec::new(),
        }
    }
}
