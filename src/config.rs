//! Configuration management for docintake using the prefer crate.
//!
//! A config file (TOML, YAML or JSON) is discovered with `prefer` or given
//! explicitly; environment variables override it. The result is resolved into
//! [`Settings`], which is what the rest of the program reads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{DictionaryError, KeywordClassifier, KeywordDictionary};
use crate::drive::{parse_folder_reference, DriveClient, DriveConfig, DriveCredentials, DriveError};
use crate::ocr::{ConverterDeps, FallbackConverter, PdfToTextExtractor};
use crate::pipeline::IntakePipeline;
use crate::storage::{HierarchicalStore, MemoryStore};

/// Default bind address for the web server.
pub const DEFAULT_BIND: &str = "127.0.0.1:3030";

/// Default request body limit (50 MiB).
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Root folder id used by dry runs.
pub const DRY_RUN_ROOT: &str = "dry-run-root";

/// Errors while loading configuration or building services from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Invalid keyword dictionary: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Invalid Drive settings: {0}")]
    Drive(#[from] DriveError),

    #[error("Missing setting: {0}")]
    Missing(String),
}

/// A converter entry - either a single converter or a fallback chain.
///
/// Examples:
/// - `"drive"` - Drive OCR only
/// - `["drive", "convertapi"]` - tries Drive first, ConvertAPI if it fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConverterEntry {
    Single(String),
    Chain(Vec<String>),
}

impl ConverterEntry {
    /// Get all converter names in this entry.
    pub fn converters(&self) -> Vec<&str> {
        match self {
            ConverterEntry::Single(s) => vec![s.as_str()],
            ConverterEntry::Chain(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Parse a comma separated list, as given in `INTAKE_CONVERTERS`.
    pub fn parse_list(list: &str) -> Self {
        ConverterEntry::Chain(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl Default for ConverterEntry {
    fn default() -> Self {
        ConverterEntry::Chain(vec!["drive".to_string(), "convertapi".to_string()])
    }
}

/// `[drive]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveSection {
    /// Root folder id or Drive folder URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// `[ocr]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrSection {
    /// Converter order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converters: Option<ConverterEntry>,
    /// Folder for Drive's temporary OCR documents; the root folder if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_folder: Option<String>,
    /// pdftotext binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdftotext: Option<String>,
}

/// `[convertapi]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertApiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Request body limit in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_limit_mb: Option<usize>,
}

/// `[classifier]` section: an inline dictionary or a path to one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierSection {
    /// Standalone dictionary file (TOML, YAML or JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<crate::classifier::CategoryEntry>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub drive: DriveSection,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub convertapi: ConvertApiSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub server: ServerSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers docintake config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("docintake").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// The keyword dictionary this config selects.
    pub fn dictionary(&self, base_dir: &Path) -> Result<KeywordDictionary, ConfigError> {
        let section = &self.classifier;

        let mut dictionary = if let Some(ref path) = section.dictionary {
            KeywordDictionary::load_from_path(&self.resolve_path(path, base_dir))?
        } else if !section.categories.is_empty() {
            KeywordDictionary {
                categories: section.categories.clone(),
                ..KeywordDictionary::default()
            }
        } else {
            KeywordDictionary::default()
        };

        if let Some(ref fallback) = section.fallback {
            dictionary.fallback = fallback.clone();
        }

        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) -> Result<(), ConfigError> {
        let drive = &self.drive;
        if let Some(ref root) = drive.root_folder {
            settings.root_folder = Some(root.clone());
        }
        settings.access_token = drive.access_token.clone().or(settings.access_token.take());
        settings.client_id = drive.client_id.clone().or(settings.client_id.take());
        settings.client_secret = drive.client_secret.clone().or(settings.client_secret.take());
        settings.refresh_token = drive.refresh_token.clone().or(settings.refresh_token.take());
        if let Some(ref api_base) = drive.api_base {
            settings.drive.api_base = api_base.clone();
        }
        if let Some(ref upload_base) = drive.upload_base {
            settings.drive.upload_base = upload_base.clone();
        }
        if let Some(ref token_url) = drive.token_url {
            settings.drive.token_url = token_url.clone();
        }
        if let Some(timeout) = drive.timeout {
            settings.drive.timeout = Duration::from_secs(timeout);
        }

        if let Some(ref converters) = self.ocr.converters {
            settings.converters = converters.converters().into_iter().map(str::to_string).collect();
        }
        if let Some(ref scratch) = self.ocr.scratch_folder {
            settings.scratch_folder = Some(scratch.clone());
        }
        if let Some(ref pdftotext) = self.ocr.pdftotext {
            // A bare name is looked up on PATH
            settings.pdftotext = if pdftotext.contains('/') || pdftotext.starts_with('~') {
                self.resolve_path(pdftotext, base_dir).display().to_string()
            } else {
                pdftotext.clone()
            };
        }

        if let Some(ref secret) = self.convertapi.secret {
            settings.convertapi_secret = Some(secret.clone());
        }
        if let Some(ref url) = self.convertapi.base_url {
            settings.convertapi_url = Some(url.clone());
        }

        if let Some(ref bind) = self.server.bind {
            settings.bind = bind.clone();
        }
        if let Some(mb) = self.server.body_limit_mb {
            settings.body_limit_bytes = mb.saturating_mul(1024 * 1024);
        }

        settings.dictionary = self.dictionary(base_dir)?;
        Ok(())
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root folder id or URL holding the client folders.
    pub root_folder: Option<String>,
    pub access_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Drive endpoints and timeout.
    pub drive: DriveConfig,
    /// Converter names in fallback order.
    pub converters: Vec<String>,
    /// Folder for Drive's temporary OCR documents.
    pub scratch_folder: Option<String>,
    pub convertapi_secret: Option<String>,
    pub convertapi_url: Option<String>,
    /// pdftotext binary.
    pub pdftotext: String,
    pub dictionary: KeywordDictionary,
    /// Web server bind address.
    pub bind: String,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_folder: None,
            access_token: None,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            drive: DriveConfig::default(),
            converters: ConverterEntry::default()
                .converters()
                .into_iter()
                .map(str::to_string)
                .collect(),
            scratch_folder: None,
            convertapi_secret: None,
            convertapi_url: None,
            pdftotext: "pdftotext".to_string(),
            dictionary: KeywordDictionary::default(),
            bind: DEFAULT_BIND.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl Settings {
    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(root) = get("DRIVE_ROOT_FOLDER") {
            tracing::debug!("Using DRIVE_ROOT_FOLDER from environment");
            self.root_folder = Some(root);
        }
        if let Some(token) = get("GOOGLE_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(id) = get("GOOGLE_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(secret) = get("GOOGLE_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(token) = get("GOOGLE_REFRESH_TOKEN") {
            self.refresh_token = Some(token);
        }
        if let Some(secret) = get("CONVERTAPI_SECRET") {
            self.convertapi_secret = Some(secret);
        }
        if let Some(list) = get("INTAKE_CONVERTERS") {
            tracing::debug!("Using INTAKE_CONVERTERS from environment: {}", list);
            self.converters = ConverterEntry::parse_list(&list)
                .converters()
                .into_iter()
                .map(str::to_string)
                .collect();
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Drive credentials, preferring a refresh token over a static token.
    pub fn credentials(&self) -> Option<DriveCredentials> {
        match (&self.client_id, &self.client_secret, &self.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                Some(DriveCredentials::RefreshToken {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                })
            }
            _ => self.access_token.clone().map(DriveCredentials::AccessToken),
        }
    }

    /// Root folder id, with URLs reduced to their id.
    pub fn root_folder_id(&self) -> Result<String, ConfigError> {
        let reference = self.root_folder.as_deref().ok_or_else(|| {
            ConfigError::Missing("Drive root folder (DRIVE_ROOT_FOLDER or drive.root_folder)".to_string())
        })?;
        Ok(parse_folder_reference(reference)?)
    }

    /// Build the keyword classifier.
    pub fn classifier(&self) -> Result<KeywordClassifier, ConfigError> {
        Ok(KeywordClassifier::new(&self.dictionary)?)
    }

    /// Build a Drive client from the configured credentials.
    pub fn drive_client(&self) -> Result<DriveClient, ConfigError> {
        let credentials = self.credentials().ok_or_else(|| {
            ConfigError::Missing(
                "Google credentials (GOOGLE_ACCESS_TOKEN, or GOOGLE_CLIENT_ID + GOOGLE_CLIENT_SECRET + GOOGLE_REFRESH_TOKEN)"
                    .to_string(),
            )
        })?;
        Ok(DriveClient::new(self.drive.clone(), credentials)?)
    }

    /// Assemble the intake pipeline.
    ///
    /// With `dry_run` the documents go to an in-memory store (returned
    /// alongside) and Drive is never contacted; only ConvertAPI can OCR.
    pub fn build_pipeline(
        &self,
        dry_run: bool,
    ) -> Result<(IntakePipeline, Option<Arc<MemoryStore>>), ConfigError> {
        let classifier = Arc::new(self.classifier()?);
        let extractor = PdfToTextExtractor::new().with_binary(self.pdftotext.clone());
        if !extractor.is_available() {
            tracing::warn!(
                "'{}' not found on PATH; PDF text extraction will fail",
                self.pdftotext
            );
        }
        let extractor = Arc::new(extractor);
        let names: Vec<&str> = self.converters.iter().map(String::as_str).collect();

        let mut deps = ConverterDeps {
            convertapi_secret: self.convertapi_secret.clone(),
            convertapi_url: self.convertapi_url.clone(),
            ..ConverterDeps::default()
        };

        if dry_run {
            let memory = Arc::new(MemoryStore::new(DRY_RUN_ROOT));
            let converter = Arc::new(converter_chain(&names, &deps));
            let store: Arc<dyn HierarchicalStore> = memory.clone();
            let pipeline =
                IntakePipeline::new(store, converter, extractor, classifier, DRY_RUN_ROOT);
            return Ok((pipeline, Some(memory)));
        }

        let root = self.root_folder_id()?;
        let drive = Arc::new(self.drive_client()?);

        deps.drive = Some(drive.clone());
        deps.scratch_folder_id = match self.scratch_folder.as_deref() {
            Some(scratch) => parse_folder_reference(scratch)?,
            None => root.clone(),
        };

        let converter = Arc::new(converter_chain(&names, &deps));
        let pipeline = IntakePipeline::new(drive, converter, extractor, classifier, root);
        Ok((pipeline, None))
    }

    /// Effective settings for display, with secrets redacted.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        fn secret(value: &Option<String>) -> String {
            match value {
                Some(_) => "<set>".to_string(),
                None => "<unset>".to_string(),
            }
        }

        vec![
            (
                "drive.root_folder",
                self.root_folder.clone().unwrap_or_else(|| "<unset>".to_string()),
            ),
            ("drive.access_token", secret(&self.access_token)),
            (
                "drive.client_id",
                self.client_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            ),
            ("drive.client_secret", secret(&self.client_secret)),
            ("drive.refresh_token", secret(&self.refresh_token)),
            ("drive.api_base", self.drive.api_base.clone()),
            ("ocr.converters", self.converters.join(" -> ")),
            (
                "ocr.scratch_folder",
                self.scratch_folder.clone().unwrap_or_else(|| "<root folder>".to_string()),
            ),
            ("ocr.pdftotext", self.pdftotext.clone()),
            ("convertapi.secret", secret(&self.convertapi_secret)),
            (
                "classifier.categories",
                format!(
                    "{} ({} keywords, fallback '{}')",
                    self.dictionary.categories.len(),
                    self.dictionary.keyword_count(),
                    self.dictionary.fallback
                ),
            ),
            ("server.bind", self.bind.clone()),
            ("server.body_limit_bytes", self.body_limit_bytes.to_string()),
        ]
    }
}

fn converter_chain(names: &[&str], deps: &ConverterDeps) -> FallbackConverter {
    let chain = FallbackConverter::from_names(names, deps);
    if chain.has_converters() {
        tracing::debug!("OCR converters: {:?}", chain.available_converters());
    } else {
        tracing::warn!("No OCR converter available; images will end in extraction_failed");
    }
    chain
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    // An explicit --config must load; discovery falls back to defaults
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir)?;

    // Environment variables take highest precedence
    settings.apply_env();

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_toml_sections() {
        let config = Config::parse(
            r#"
[drive]
root_folder = "https://drive.google.com/drive/folders/abc123"

[ocr]
converters = ["convertapi"]

[server]
bind = "0.0.0.0:8080"
body_limit_mb = 10

[classifier]
fallback = "Outros"

[[classifier.categories]]
name = "Saúde"
keywords = ["hospital"]
"#,
            "toml",
        )
        .unwrap();

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/tmp")).unwrap();

        assert_eq!(settings.root_folder_id().unwrap(), "abc123");
        assert_eq!(settings.converters, vec!["convertapi"]);
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.body_limit_bytes, 10 * 1024 * 1024);
        assert_eq!(settings.dictionary.fallback, "Outros");
        assert_eq!(settings.dictionary.categories.len(), 1);
    }

    #[test]
    fn test_pdftotext_bare_name_kept() {
        let mut settings = Settings::default();
        let config = Config::parse("[ocr]\npdftotext = \"pdftotext-22\"\n", "toml").unwrap();
        config.apply_to_settings(&mut settings, Path::new("/etc/intake")).unwrap();
        assert_eq!(settings.pdftotext, "pdftotext-22");

        let config = Config::parse("[ocr]\npdftotext = \"bin/pdftotext\"\n", "toml").unwrap();
        config.apply_to_settings(&mut settings, Path::new("/etc/intake")).unwrap();
        assert_eq!(settings.pdftotext, "/etc/intake/bin/pdftotext");
    }

    #[test]
    fn test_single_converter_entry() {
        let config = Config::parse(r#"{"ocr": {"converters": "drive"}}"#, "json").unwrap();
        assert_eq!(
            config.ocr.converters,
            Some(ConverterEntry::Single("drive".to_string()))
        );
    }

    #[test]
    fn test_yaml_config() {
        let config = Config::parse("convertapi:\n  secret: abc\n", "yaml").unwrap();
        assert_eq!(config.convertapi.secret.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = Config::parse("not = [valid", "toml").unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_invalid_dictionary_rejected() {
        let config = Config::parse(
            r#"{"classifier": {"fallback": "Bancos", "categories": [{"name": "Bancos", "keywords": ["banco"]}]}}"#,
            "json",
        )
        .unwrap();
        let mut settings = Settings::default();
        let err = config
            .apply_to_settings(&mut settings, Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Dictionary(_)));
    }

    #[test]
    fn test_dictionary_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("dict.yaml")).unwrap();
        writeln!(
            file,
            "categories:\n  - name: Veículos\n    keywords: [ipva]\n"
        )
        .unwrap();

        let config = Config::parse(r#"{"classifier": {"dictionary": "dict.yaml"}}"#, "json").unwrap();
        let dictionary = config.dictionary(dir.path()).unwrap();
        assert_eq!(dictionary.categories[0].name, "Veículos");
        assert_eq!(dictionary.fallback, "Geral");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DRIVE_ROOT_FOLDER", "root-from-env"),
            ("GOOGLE_ACCESS_TOKEN", "tok"),
            ("CONVERTAPI_SECRET", ""),
            ("INTAKE_CONVERTERS", "convertapi, drive"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.root_folder.as_deref(), Some("root-from-env"));
        assert!(matches!(
            settings.credentials(),
            Some(DriveCredentials::AccessToken(_))
        ));
        assert_eq!(settings.convertapi_secret, None);
        assert_eq!(settings.converters, vec!["convertapi", "drive"]);
    }

    #[test]
    fn test_refresh_token_preferred() {
        let settings = Settings {
            access_token: Some("static".to_string()),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            refresh_token: Some("refresh".to_string()),
            ..Settings::default()
        };
        assert!(matches!(
            settings.credentials(),
            Some(DriveCredentials::RefreshToken { .. })
        ));
    }

    #[test]
    fn test_missing_root_folder() {
        let settings = Settings::default();
        assert!(matches!(
            settings.root_folder_id(),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn test_describe_redacts_secrets() {
        let settings = Settings {
            convertapi_secret: Some("super-secret".to_string()),
            refresh_token: Some("1//token".to_string()),
            ..Settings::default()
        };
        let printed = format!("{:?}", settings.describe());
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("1//token"));
        assert!(printed.contains("<set>"));
    }

    #[tokio::test]
    async fn test_dry_run_pipeline_needs_no_drive() {
        let settings = Settings::default();
        let (pipeline, memory) = settings.build_pipeline(true).unwrap();
        assert_eq!(pipeline.root_folder_id(), DRY_RUN_ROOT);
        assert!(memory.is_some());
        assert!(settings.build_pipeline(false).is_err());
    }
}
