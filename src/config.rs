use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    #[serde(default)]
    pub escrow: EscrowConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EscrowConfig {
    /// Expiry window applied when the caller does not pick one
    pub default_expiry_days: u32,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            default_expiry_days: 7,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "escrow.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            escrow: EscrowConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        Self::from_yaml(&content)
    }

    /// Load the named config, falling back to defaults when the file is
    /// absent (demo/dev convenience)
    pub fn load_or_default(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        match fs::read_to_string(&config_path) {
            Ok(content) => Self::from_yaml(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn from_yaml(content: &str) -> Self {
        serde_yaml::from_str(content).expect("Failed to parse config yaml")
    }
}
