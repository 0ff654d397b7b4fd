//! TOML settings for the CLI and the processors.
//!
//! Every section and field is optional; a missing file means built-in
//! defaults. CLI flags are applied on top by the binary.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::consts::{
    DEFAULT_CONCURRENCY, DEFAULT_CONNECTOR, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_INVOKE_TIMEOUT_SECS,
    DEFAULT_OCR_ENGINE, DEFAULT_OCR_HOST, DEFAULT_OCR_PORT, DEFAULT_OCR_SCHEME,
    DEFAULT_RESPONSE_CHARSET, DEFAULT_TARGET_LANGUAGE, LANGUAGE_AUTO, OPENOCR_IDENTITY,
};
use crate::engine::{Configuration, EngineIdentity};
use crate::request::RequestDefaults;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub translation: TranslationSettings,
    pub ocr: OcrSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings: {}", path.display()))?;
        let settings: Settings = toml::from_str(&raw)
            .with_context(|| format!("parsing TOML: {}", path.display()))?;
        Ok(settings)
    }

    /// Load `path` if given, else the default location if a file exists
    /// there, else defaults. An explicit path that doesn't exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => match crate::consts::default_config_path() {
                Some(p) if p.is_file() => Self::load(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            bail!("pipeline.concurrency must be at least 1");
        }
        if self.pipeline.invoke_timeout_secs == 0 {
            bail!("pipeline.invoke_timeout_secs must be at least 1");
        }
        if !matches!(self.ocr.scheme.as_str(), "http" | "https") {
            bail!("ocr.scheme must be http or https, got {:?}", self.ocr.scheme);
        }
        if self.ocr.port == 0 {
            bail!("ocr.port must be non-zero");
        }
        if self.ocr.host.trim().is_empty() {
            bail!("ocr.host must not be empty");
        }
        if self.translation.connector.trim().is_empty() {
            bail!("translation.connector must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Items in flight at once.
    pub concurrency: usize,
    /// Upper bound on a single engine call.
    pub invoke_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            invoke_timeout_secs: DEFAULT_INVOKE_TIMEOUT_SECS,
            output_dir: PathBuf::from("out"),
        }
    }
}

/// `source_language` and `target_language` may reference item attributes,
/// e.g. `"${lang}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub connector: String,
    pub connector_config: Map<String, Value>,
    pub source_language: String,
    pub target_language: String,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            connector: DEFAULT_CONNECTOR.to_string(),
            connector_config: Map::new(),
            source_language: LANGUAGE_AUTO.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
        }
    }
}

impl TranslationSettings {
    pub fn identity(&self) -> EngineIdentity {
        EngineIdentity::new(self.connector.clone())
    }

    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.connector_config.clone())
    }
}

/// `preprocessors` and `engine_args` are per-item expressions evaluated
/// against attributes; the `default_*` fields apply when they are unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub default_charset: String,
    pub engine: String,
    /// Comma-separated list, e.g. `"convert-pdf, stroke-width-transform"`.
    pub preprocessors: Option<String>,
    /// JSON object, e.g. `{"lang": "${lang}"}`.
    pub engine_args: Option<String>,
    pub default_preprocessors: Vec<String>,
    pub default_engine_args: Map<String, Value>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_OCR_SCHEME.to_string(),
            host: DEFAULT_OCR_HOST.to_string(),
            port: DEFAULT_OCR_PORT,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            default_charset: DEFAULT_RESPONSE_CHARSET.to_string(),
            engine: DEFAULT_OCR_ENGINE.to_string(),
            preprocessors: None,
            engine_args: None,
            default_preprocessors: Vec::new(),
            default_engine_args: Map::new(),
        }
    }
}

impl OcrSettings {
    pub fn identity(&self) -> EngineIdentity {
        EngineIdentity::new(OPENOCR_IDENTITY)
    }

    /// The endpoint part, as handed to the `openocr` engine.
    pub fn engine_configuration(&self) -> Configuration {
        let mut map = Map::new();
        map.insert("scheme".into(), Value::from(self.scheme.clone()));
        map.insert("host".into(), Value::from(self.host.clone()));
        map.insert("port".into(), Value::from(self.port));
        map.insert("timeout_secs".into(), Value::from(self.timeout_secs));
        map.insert(
            "default_charset".into(),
            Value::from(self.default_charset.clone()),
        );
        Configuration::new(map)
    }

    pub fn request_defaults(&self) -> RequestDefaults {
        RequestDefaults {
            engine: self.engine.clone(),
            preprocessors: self.default_preprocessors.clone(),
            engine_args: self.default_engine_args.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
