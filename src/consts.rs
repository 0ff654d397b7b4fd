//! Project-wide constants.

use std::path::PathBuf;

/// Source language sentinel meaning "let the engine detect it".
pub const LANGUAGE_AUTO: &str = "auto";

/// Reported by engines that don't know their own version.
pub const VERSION_UNKNOWN: &str = "unknown";

/// Default target language for translation.
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Default translation connector when none is configured.
pub const DEFAULT_CONNECTOR: &str = "echo";

/// Registry identity of the OpenOCR engine.
pub const OPENOCR_IDENTITY: &str = "openocr";

/// OCR engine requested from the OpenOCR server when none is set.
pub const DEFAULT_OCR_ENGINE: &str = "tesseract";

pub const DEFAULT_OCR_SCHEME: &str = "http";
pub const DEFAULT_OCR_HOST: &str = "localhost";
pub const DEFAULT_OCR_PORT: u16 = 9292;
pub const OCR_PATH: &str = "/ocr";

/// Charset used to decode response bodies that don't declare one.
pub const DEFAULT_RESPONSE_CHARSET: &str = "ISO-8859-1";

/// HTTP client timeout for a single remote call.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Upper bound on any single engine invocation.
pub const DEFAULT_INVOKE_TIMEOUT_SECS: u64 = 60;

/// Items processed concurrently by the CLI.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Item attribute holding the original file name.
pub const ATTR_FILENAME: &str = "filename";

/// Item attribute holding the original path.
pub const ATTR_PATH: &str = "path";

/// Default settings path: `~/.conduit/conduit.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".conduit").join("conduit.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_path_ends_with_conduit_toml() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(".conduit/conduit.toml"));
        }
    }

    #[test]
    fn ocr_defaults_match_openocr() {
        assert_eq!(DEFAULT_OCR_PORT, 9292);
        assert_eq!(DEFAULT_OCR_ENGINE, "tesseract");
        assert_eq!(OCR_PATH, "/ocr");
    }
}
