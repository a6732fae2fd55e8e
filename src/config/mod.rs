use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: String,

    /// Fixed facility timezone as minutes east of UTC. All civil-date
    /// logic (rules, day rollover) uses this one offset.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_minutes: i32,

    /// Local hour used to close forgotten logs (rollover / sweep).
    #[serde(default = "default_close_hour")]
    pub auto_close_hour: u32,

    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_org_name")]
    pub organization_name: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Guardian mail transport: "console" or "outbox".
    #[serde(default = "default_mailer")]
    pub mailer: String,
    #[serde(default)]
    pub outbox_dir: String,

    /// Max queued messages retried per sweep.
    #[serde(default = "default_retry_batch")]
    pub retry_batch: i64,

    /// Keep-alive interval for subscribed viewers, seconds.
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

fn default_utc_offset() -> i32 {
    540 // UTC+9
}
fn default_close_hour() -> u32 {
    22
}
fn default_app_name() -> String {
    "Study Hall".to_string()
}
fn default_org_name() -> String {
    "Study Hall".to_string()
}
fn default_sender_name() -> String {
    "Study Hall Reception".to_string()
}
fn default_mailer() -> String {
    "console".to_string()
}
fn default_retry_batch() -> i64 {
    10
}
fn default_keepalive_secs() -> u64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            utc_offset_minutes: default_utc_offset(),
            auto_close_hour: default_close_hour(),
            app_name: default_app_name(),
            organization_name: default_org_name(),
            sender_name: default_sender_name(),
            mailer: default_mailer(),
            outbox_dir: String::new(),
            retry_batch: default_retry_batch(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("studyhall")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".studyhall")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("studyhall.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("studyhall.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Self {
        let path = Self::config_file();

        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
                Err(_) => Config::default(),
            }
        } else {
            Config::default()
        }
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> io::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)
                .map_err(|e| io::Error::other(format!("config serialize failed: {}", e)))?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(())
    }
}
