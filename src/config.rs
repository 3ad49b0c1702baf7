use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::chat::DEFAULT_REQUEST_TIMEOUT;
use crate::tools::DEFAULT_ROADMAP_DELAY;
use crate::video::DEFAULT_YOUTUBE_BASE_URL;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const CONFIG_DIR_NAME: &str = "career-mentor";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub config_is_explicit: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub youtube_api_key: Option<String>,
    pub youtube_base_url: String,
    pub request_timeout: Duration,
    pub roadmap_delay: Duration,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeConfig {
    pub preset: ThemePreset,
    pub styles: HashMap<ThemeToken, StyleOverride>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: ThemePreset::Default,
            styles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreset {
    Default,
    Light,
    HighContrast,
}

impl FromStr for ThemePreset {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "default" => Ok(Self::Default),
            "light" => Ok(Self::Light),
            "high-contrast" => Ok(Self::HighContrast),
            _ => Err(format!("unknown preset '{value}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    QuizPrompt,
    QuizOption,
    QuizProgress,
    ChatPrompt,
    UserInput,
    AssistantText,
    AssistantWaiting,
    ToolRequest,
    ToolResult,
    Diagram,
    CareerPanel,
    SystemInfo,
    SystemError,
}

impl ThemeToken {
    pub fn all() -> &'static [ThemeToken] {
        &[
            Self::QuizPrompt,
            Self::QuizOption,
            Self::QuizProgress,
            Self::ChatPrompt,
            Self::UserInput,
            Self::AssistantText,
            Self::AssistantWaiting,
            Self::ToolRequest,
            Self::ToolResult,
            Self::Diagram,
            Self::CareerPanel,
            Self::SystemInfo,
            Self::SystemError,
        ]
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "quiz_prompt" => Ok(Self::QuizPrompt),
            "quiz_option" => Ok(Self::QuizOption),
            "quiz_progress" => Ok(Self::QuizProgress),
            "chat_prompt" => Ok(Self::ChatPrompt),
            "user_input" => Ok(Self::UserInput),
            "assistant_text" => Ok(Self::AssistantText),
            "assistant_waiting" => Ok(Self::AssistantWaiting),
            "tool_request" => Ok(Self::ToolRequest),
            "tool_result" => Ok(Self::ToolResult),
            "diagram" => Ok(Self::Diagram),
            "career_panel" => Ok(Self::CareerPanel),
            "system_info" => Ok(Self::SystemInfo),
            "system_error" => Ok(Self::SystemError),
            _ => Err(format!("unknown token '{value}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOverride {
    pub fg: Option<HexColor>,
    pub bg: Option<HexColor>,
    pub modifiers: Option<Vec<ThemeModifier>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = value.as_bytes();
        if bytes.len() != 7 || bytes[0] != b'#' {
            return Err("invalid hex color, expected #RRGGBB".to_string());
        }

        let r = u8::from_str_radix(&value[1..3], 16)
            .map_err(|_| "invalid hex color, expected #RRGGBB".to_string())?;
        let g = u8::from_str_radix(&value[3..5], 16)
            .map_err(|_| "invalid hex color, expected #RRGGBB".to_string())?;
        let b = u8::from_str_radix(&value[5..7], 16)
            .map_err(|_| "invalid hex color, expected #RRGGBB".to_string())?;

        Ok(Self { r, g, b })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeModifier {
    Bold,
    Dim,
    Italic,
    Underlined,
    SlowBlink,
    RapidBlink,
    Reversed,
    Hidden,
    CrossedOut,
}

impl FromStr for ThemeModifier {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "bold" => Ok(Self::Bold),
            "dim" => Ok(Self::Dim),
            "italic" => Ok(Self::Italic),
            "underlined" => Ok(Self::Underlined),
            "slow_blink" => Ok(Self::SlowBlink),
            "rapid_blink" => Ok(Self::RapidBlink),
            "reversed" => Ok(Self::Reversed),
            "hidden" => Ok(Self::Hidden),
            "crossed_out" => Ok(Self::CrossedOut),
            _ => Err(format!("unknown modifier '{value}'")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFileConfig {
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    youtube_api_key: Option<String>,
    youtube_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    roadmap_delay_ms: Option<u64>,
    theme: Option<RawThemeConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThemeConfig {
    name: Option<String>,
    styles: Option<HashMap<String, RawStyleOverride>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStyleOverride {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Option<Vec<String>>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_path(None)
    }

    /// `Some(path)` must point at an existing file; `None` probes the XDG location.
    pub fn load_with_path(explicit: Option<&Path>) -> Result<Self> {
        let (config_path, config_is_explicit) = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Failed to load config {}: file not found", path.display());
                }
                (path.to_path_buf(), true)
            }
            None => (discover_config_path()?, false),
        };
        let file_config = load_file_config(&config_path)?;

        dotenvy::dotenv().ok();

        let file_value = |pick: fn(&RawFileConfig) -> Option<&String>| {
            file_config
                .as_ref()
                .and_then(pick)
                .and_then(|value| non_empty(value).map(ToOwned::to_owned))
        };

        let request_timeout = match file_config.as_ref().and_then(|cfg| cfg.request_timeout_ms) {
            Some(0) => {
                return Err(config_error(
                    &config_path,
                    "request_timeout_ms",
                    "must be greater than 0",
                ));
            }
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_REQUEST_TIMEOUT,
        };
        let roadmap_delay = file_config
            .as_ref()
            .and_then(|cfg| cfg.roadmap_delay_ms)
            .map_or(DEFAULT_ROADMAP_DELAY, Duration::from_millis);

        let theme = validate_theme(
            file_config.as_ref().and_then(|cfg| cfg.theme.as_ref()),
            &config_path,
        )?;

        Ok(Self {
            gemini_api_key: env_non_empty("GEMINI_API_KEY")
                .or_else(|| env_non_empty("GOOGLE_API_KEY"))
                .or_else(|| file_value(|cfg| cfg.gemini_api_key.as_ref())),
            gemini_model: env_non_empty("GEMINI_MODEL")
                .or_else(|| file_value(|cfg| cfg.gemini_model.as_ref()))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env_non_empty("GEMINI_BASE_URL")
                .or_else(|| file_value(|cfg| cfg.gemini_base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            youtube_api_key: env_non_empty("YOUTUBE_API_KEY")
                .or_else(|| file_value(|cfg| cfg.youtube_api_key.as_ref())),
            youtube_base_url: env_non_empty("YOUTUBE_BASE_URL")
                .or_else(|| file_value(|cfg| cfg.youtube_base_url.as_ref()))
                .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
            request_timeout,
            roadmap_delay,
            theme,
            config_path,
            config_is_explicit,
        })
    }
}

fn discover_config_path() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve config path: XDG_CONFIG_HOME is set but empty");
        }

        return Ok(PathBuf::from(trimmed)
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME));
    }

    let home = dirs::home_dir().ok_or_else(|| {
        anyhow!("Failed to resolve config path: HOME directory is unavailable")
    })?;

    Ok(home
        .join(".config")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME))
}

fn load_file_config(config_path: &Path) -> Result<Option<RawFileConfig>> {
    if !config_path.is_file() {
        return Ok(None);
    }

    let config_text = fs::read_to_string(config_path).map_err(|err| {
        anyhow!(
            "Failed to load config {}: unable to read file: {err}",
            config_path.display()
        )
    })?;

    toml::from_str(&config_text).map(Some).map_err(|err| {
        anyhow!(
            "Failed to load config {}: {err}",
            config_path.display()
        )
    })
}

fn validate_theme(raw_theme: Option<&RawThemeConfig>, config_path: &Path) -> Result<ThemeConfig> {
    let Some(theme) = raw_theme else {
        return Ok(ThemeConfig::default());
    };

    let mut config = ThemeConfig::default();

    if let Some(name) = &theme.name {
        config.preset = ThemePreset::from_str(name).map_err(|reason| {
            config_error(config_path, "theme.name", &reason)
        })?;
    }

    if let Some(styles) = &theme.styles {
        for (token_name, raw_style) in styles {
            let token = ThemeToken::from_str(token_name).map_err(|reason| {
                config_error(
                    config_path,
                    &format!("theme.styles.{token_name}"),
                    &reason,
                )
            })?;

            let fg = parse_color(raw_style.fg.as_deref(), config_path, token_name, "fg")?;
            let bg = parse_color(raw_style.bg.as_deref(), config_path, token_name, "bg")?;
            let modifiers =
                parse_modifiers(raw_style.modifiers.as_deref(), config_path, token_name)?;

            config.styles.insert(token, StyleOverride { fg, bg, modifiers });
        }
    }

    Ok(config)
}

fn parse_color(
    value: Option<&str>,
    config_path: &Path,
    token_name: &str,
    field_name: &str,
) -> Result<Option<HexColor>> {
    let Some(value) = value else {
        return Ok(None);
    };

    HexColor::from_str(value)
        .map(Some)
        .map_err(|reason| {
            config_error(
                config_path,
                &format!("theme.styles.{token_name}.{field_name}"),
                &reason,
            )
        })
}

fn parse_modifiers(
    values: Option<&[String]>,
    config_path: &Path,
    token_name: &str,
) -> Result<Option<Vec<ThemeModifier>>> {
    let Some(values) = values else {
        return Ok(None);
    };

    let mut parsed = Vec::with_capacity(values.len());
    for value in values {
        let modifier = ThemeModifier::from_str(value).map_err(|reason| {
            config_error(
                config_path,
                &format!("theme.styles.{token_name}.modifiers"),
                &reason,
            )
        })?;
        parsed.push(modifier);
    }

    Ok(Some(parsed))
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn config_error(config_path: &Path, key_path: &str, reason: &str) -> anyhow::Error {
    anyhow!(
        "Failed to load config {}: {key_path}: {reason}",
        config_path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AppConfig, DEFAULT_GEMINI_MODEL, HexColor, ThemeConfig, ThemeModifier, ThemePreset,
        ThemeToken,
    };
    use serial_test::serial;
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const ENV_KEYS: [&str; 7] = [
        "GEMINI_API_KEY",
        "GOOGLE_API_KEY",
        "GEMINI_MODEL",
        "GEMINI_BASE_URL",
        "YOUTUBE_API_KEY",
        "YOUTUBE_BASE_URL",
        "XDG_CONFIG_HOME",
    ];

    fn reset_vars() {
        for key in ENV_KEYS {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    fn with_cwd<T>(path: &Path, f: impl FnOnce() -> T) -> T {
        let cwd = env::current_dir().expect("current dir");
        env::set_current_dir(path).expect("set current dir");
        let result = f();
        env::set_current_dir(cwd).expect("restore current dir");
        result
    }

    /// Writes `career-mentor/config.toml` under a fresh XDG_CONFIG_HOME.
    fn xdg_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config_dir = tmp.path().join("career-mentor");
        fs::create_dir_all(&config_dir).expect("create config dir");
        let path = config_dir.join("config.toml");
        fs::write(&path, contents).expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }
        (tmp, path)
    }

    #[test]
    #[serial]
    fn load_uses_defaults_when_unset() {
        let tmp = tempfile::tempdir().expect("tempdir");
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(cfg.gemini_api_key, None);
        assert_eq!(cfg.youtube_api_key, None);
        assert_eq!(cfg.youtube_base_url, "https://www.googleapis.com");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.roadmap_delay, Duration::from_millis(1_000));
        assert_eq!(cfg.theme, ThemeConfig::default());
        assert!(!cfg.config_is_explicit);
        assert_eq!(
            cfg.config_path,
            tmp.path().join("career-mentor").join("config.toml")
        );
    }

    #[test]
    #[serial]
    fn load_env_overrides_file() {
        let (tmp, _) = xdg_config(
            r#"
gemini_api_key = "file_key"
gemini_model = "file_model"
gemini_base_url = "https://example.com"
youtube_api_key = "file_yt"
request_timeout_ms = 5000
roadmap_delay_ms = 0
"#,
        );
        unsafe {
            env::set_var("GEMINI_API_KEY", "os_key");
            env::set_var("GEMINI_MODEL", "os_model");
            env::set_var("YOUTUBE_API_KEY", "os_yt");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.gemini_model, "os_model");
        assert_eq!(cfg.gemini_base_url, "https://example.com");
        assert_eq!(cfg.youtube_api_key.as_deref(), Some("os_yt"));
        assert_eq!(cfg.request_timeout, Duration::from_millis(5_000));
        assert_eq!(cfg.roadmap_delay, Duration::ZERO);
    }

    #[test]
    #[serial]
    fn load_falls_back_to_google_api_key() {
        let (tmp, _) = xdg_config(r#"gemini_api_key = "file_key""#);
        unsafe {
            env::set_var("GOOGLE_API_KEY", "google_key");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("google_key"));
    }

    #[test]
    #[serial]
    fn load_does_not_override_existing_os_env_with_dotenv() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(".env"),
            "GEMINI_API_KEY=file_key\nGEMINI_MODEL=file_model\n",
        )
        .expect("write env file");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", tmp.path());
            env::set_var("GEMINI_API_KEY", "os_key");
            env::set_var("GEMINI_MODEL", "os_model");
        }

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("os_key"));
        assert_eq!(cfg.gemini_model, "os_model");
    }

    #[test]
    #[serial]
    fn load_with_explicit_path_skips_discovery() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("custom.toml");
        fs::write(&path, r#"gemini_model = "explicit_model""#).expect("write config");

        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let cfg = with_cwd(tmp.path(), || {
            AppConfig::load_with_path(Some(&path)).expect("load config")
        });
        assert_eq!(cfg.gemini_model, "explicit_model");
        assert!(cfg.config_is_explicit);
        assert_eq!(cfg.config_path, path);
    }

    #[test]
    #[serial]
    fn load_with_missing_explicit_path_fails() {
        reset_vars();
        let err = AppConfig::load_with_path(Some(Path::new("/definitely/missing.toml")))
            .expect_err("missing file should fail");
        assert!(
            err.to_string()
                .contains("Failed to load config /definitely/missing.toml: file not found")
        );
    }

    #[test]
    #[serial]
    fn load_fails_when_xdg_config_home_is_empty() {
        reset_vars();
        unsafe {
            env::set_var("XDG_CONFIG_HOME", "   ");
        }

        let err = AppConfig::load().expect_err("load should fail");
        assert!(
            err.to_string()
                .contains("Failed to resolve config path: XDG_CONFIG_HOME is set but empty")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_root_key() {
        let (tmp, _) = xdg_config("unknown_key = 1");

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(err.to_string().contains("Failed to load config"));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    #[serial]
    fn load_rejects_zero_request_timeout() {
        let (tmp, _) = xdg_config("request_timeout_ms = 0");

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("request_timeout_ms: must be greater than 0")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_style_token() {
        let (tmp, _) = xdg_config(
            r##"
[theme.styles.python_prompt]
fg = "#ffffff"
"##,
        );

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("theme.styles.python_prompt: unknown token 'python_prompt'")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_invalid_hex_color() {
        let (tmp, _) = xdg_config(
            r#"
[theme.styles.quiz_prompt]
fg = "red"
"#,
        );

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("theme.styles.quiz_prompt.fg: invalid hex color")
        );
    }

    #[test]
    #[serial]
    fn load_fails_on_unknown_modifier() {
        let (tmp, _) = xdg_config(
            r#"
[theme.styles.diagram]
modifiers = ["sparkly"]
"#,
        );

        let err = with_cwd(tmp.path(), || AppConfig::load().expect_err("load should fail"));
        assert!(
            err.to_string()
                .contains("theme.styles.diagram.modifiers: unknown modifier 'sparkly'")
        );
    }

    #[test]
    #[serial]
    fn load_parses_theme_config_with_strong_types() {
        let (tmp, _) = xdg_config(
            r##"
[theme]
name = "light"

[theme.styles.career_panel]
fg = "#A0B1C2"
modifiers = ["bold", "italic"]
"##,
        );

        let cfg = with_cwd(tmp.path(), || AppConfig::load().expect("load config"));
        assert_eq!(cfg.theme.preset, ThemePreset::Light);
        let style = cfg
            .theme
            .styles
            .get(&ThemeToken::CareerPanel)
            .expect("career_panel style");
        assert_eq!(
            style.fg,
            Some(HexColor {
                r: 0xA0,
                g: 0xB1,
                b: 0xC2
            })
        );
        assert_eq!(
            style.modifiers.as_deref(),
            Some(&[ThemeModifier::Bold, ThemeModifier::Italic][..])
        );
    }
}
