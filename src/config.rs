use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub gerrit: GerritConfig,
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GerritConfig {
    #[serde(default = "default_gerrit_url")]
    pub url: String,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditSettings {
    /// Prefix stripped from a change's project to get the repo name
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,
    /// Marker removed from repo names before mapping `_` to `/`
    #[serde(default = "default_repo_name_prefix")]
    pub repo_name_prefix: String,
    #[serde(default = "default_checkout_root")]
    pub checkout_root: PathBuf,
    #[serde(default = "default_target_branch")]
    pub target_branch: String,
    #[serde(default = "default_topic_pattern")]
    pub topic_pattern: String,
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    /// Repo names whose checkout directory does not follow the general rule
    #[serde(default = "default_path_overrides")]
    pub path_overrides: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExclusionConfig {
    #[serde(default = "default_excluded_topics")]
    pub topics: Vec<String>,
    #[serde(default = "default_excluded_repos")]
    pub repos: Vec<String>,
    #[serde(default = "default_excluded_changes")]
    pub changes: Vec<u64>,
    /// Repos used unmodified from upstream; the review server's status is trusted
    #[serde(default = "default_passthrough_repos")]
    pub passthrough_repos: Vec<String>,
}

impl Config {
    /// Load configuration from a specified path, or the default location if it exists.
    ///
    /// Without any configuration file the built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let default_path = dirs::home_dir().map(|home| config_path_in(&home));
        Self::load_or_default(path, default_path)
    }

    fn load_or_default(path: Option<&Path>, default_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match (path, default_path) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(default_path)) if default_path.exists() => default_path,
            (None, default_path) => {
                debug!("No configuration at {:?}, using defaults", default_path);
                return Ok(Self::default());
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?;

        config.audit.checkout_root = expand_tilde(&config.audit.checkout_root)?;
        config.audit.cache_file = expand_tilde(&config.audit.cache_file)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(config_path_in(&home))
    }
}

fn config_path_in(home: &Path) -> PathBuf {
    home.join(".config").join("asb-audit").join("config.toml")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gerrit: GerritConfig::default(),
            audit: AuditSettings::default(),
            exclusions: ExclusionConfig::default(),
        }
    }
}

impl Default for GerritConfig {
    fn default() -> Self {
        GerritConfig {
            url: default_gerrit_url(),
            query: default_query(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        AuditSettings {
            namespace_prefix: default_namespace_prefix(),
            repo_name_prefix: default_repo_name_prefix(),
            checkout_root: default_checkout_root(),
            target_branch: default_target_branch(),
            topic_pattern: default_topic_pattern(),
            cache_file: default_cache_file(),
            path_overrides: default_path_overrides(),
        }
    }
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        ExclusionConfig {
            topics: default_excluded_topics(),
            repos: default_excluded_repos(),
            changes: default_excluded_changes(),
            passthrough_repos: default_passthrough_repos(),
        }
    }
}

/// Expand tilde in paths to home directory
fn expand_tilde(path: &Path) -> Result<PathBuf> {
    if let Some(s) = path.to_str() {
        if let Some(rest) = s.strip_prefix("~/") {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            return Ok(home.join(rest));
        }
    }
    Ok(path.to_path_buf())
}

// Default value functions
fn default_gerrit_url() -> String {
    "https://review.lineageos.org".to_string()
}

fn default_query() -> String {
    "branch:cm-11.0".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_namespace_prefix() -> String {
    "LineageOS/".to_string()
}

fn default_repo_name_prefix() -> String {
    "android_".to_string()
}

fn default_checkout_root() -> PathBuf {
    PathBuf::from("/mnt/data2/mtk-aosp")
}

fn default_target_branch() -> String {
    "mtk-4.4.4".to_string()
}

/// Matches the topic names used for bulletins over the years, e.g.
/// `asb-2019.02`, `asb-2017.07.05-cm-11.0`, `cm-11-asb-2016.03-cm11`.
fn default_topic_pattern() -> String {
    r"^(?:cm-11-)?asb-\d{4}\.\d{2}(?:\.\d{2})?(?:-cm11|-cm-11\.0)?$".to_string()
}

fn default_cache_file() -> PathBuf {
    PathBuf::from("changes.json")
}

fn default_path_overrides() -> BTreeMap<String, PathBuf> {
    // Underscores in the directory name itself
    BTreeMap::from([(
        "android_external_wpa_supplicant_8".to_string(),
        PathBuf::from("external/wpa_supplicant_8"),
    )])
}

fn default_excluded_topics() -> Vec<String> {
    vec!["asb-2017.07.05-cm-11.0".to_string()]
}

fn default_excluded_repos() -> Vec<String> {
    [
        "android",
        "android_bootable_recovery",
        "android_bootable_recovery-cm",
        "android_hardware_qcom_audio",
        "android_hardware_qcom_audio-caf",
        "android_hardware_qcom_media",
        "android_hardware_qcom_media-caf",
        "android_kernel_samsung_jf",
        "android_kernel_samsung_smdk4412",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_excluded_changes() -> Vec<u64> {
    vec![
        143014, // revert of a commit that never existed
        127580, // Nfc: not used
        4776, 4775, 162887, 162888, // Dalvik: files removed by MTK
        236196, 234632, 241451, // BT: no 'HID Device Role'
    ]
}

fn default_passthrough_repos() -> Vec<String> {
    [
        "android_external_chromium",
        "android_external_chromium_org_third_party_openssl",
        "android_external_expat",
        "android_external_freetype",
        "android_external_libnfc-nci",
        "android_external_libvorbis",
        "android_external_libxml2",
        "android_external_neven",
        "android_external_sfntly",
        "android_external_tremolo",
        "android_system_media",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
