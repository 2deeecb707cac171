//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Global configuration instance / 全局配置实例
static CONFIG: OnceCell<Arc<RwLock<AppConfig>>> = OnceCell::new();

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Search controller configuration / 搜索控制器配置
    #[serde(default)]
    pub search: SearchConfig,
    /// NCES feature service configuration / NCES 服务配置
    #[serde(default)]
    pub nces: NcesConfig,
}

/// Search controller configuration / 搜索控制器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a keyword is searched (ms) / 防抖延迟
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Result set cap / 结果数量上限
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Upper bound for a single fetch (ms) / 单次请求超时
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Clear results when a search can't run (e.g. keyword emptied) / 输入缺失时清空旧结果
    #[serde(default)]
    pub clear_stale_results: bool,
}

/// NCES feature service configuration / NCES 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NcesConfig {
    /// School district layer query endpoint / 学区图层查询地址
    #[serde(default = "default_district_url")]
    pub district_url: String,
    /// Public school layer query endpoint / 学校图层查询地址
    #[serde(default = "default_school_url")]
    pub school_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// HTTP client timeout (seconds), a backstop for direct client use;
    /// controllers cut fetches off at `search.fetch_timeout_ms` / HTTP 客户端超时
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_max_results() -> usize {
    100
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_district_url() -> String {
    "https://nces.ed.gov/opengis/rest/services/K12_School_Locations/EDGE_ADMINDATA_SCHOOLDISTRICTS_TL23_SY2223/MapServer/0/query".to_string()
}

fn default_school_url() -> String {
    "https://nces.ed.gov/opengis/rest/services/K12_School_Locations/EDGE_ADMINDATA_PUBLICSCH_2223/MapServer/0/query".to_string()
}

fn default_user_agent() -> String {
    concat!("school-finder/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_results: default_max_results(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            clear_stale_results: false,
        }
    }
}

impl Default for NcesConfig {
    fn default() -> Self {
        Self {
            district_url: default_district_url(),
            school_url: default_school_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl NcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Parse configuration text / 解析配置内容
pub fn parse_config(content: &str) -> Result<AppConfig, String> {
    serde_json::from_str(content).map_err(|e| format!("Failed to parse config file: {}", e))
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config = parse_config(&content)?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(&config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig) -> Result<(), String> {
    let config_path = get_config_path();

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(&config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

/// Initialize global configuration / 初始化全局配置
pub fn init_config() -> Result<Arc<RwLock<AppConfig>>, String> {
    let config = load_config()?;

    let config_arc = Arc::new(RwLock::new(config));

    CONFIG.set(config_arc.clone())
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(config_arc)
}

/// Get global configuration instance / 获取全局配置实例
pub fn get_config() -> Arc<RwLock<AppConfig>> {
    CONFIG.get_or_init(|| {
        let config = load_config().unwrap_or_default();
        Arc::new(RwLock::new(config))
    }).clone()
}

/// Get a read-only snapshot of current config / 获取当前配置的只读快照
pub fn config() -> AppConfig {
    get_config().read().clone()
}
