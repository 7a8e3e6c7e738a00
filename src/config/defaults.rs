use super::*;

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/tmp/hdo-cache"),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["hdo-data.py".to_string()],
            working_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/hdo-tariffs.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            cache: CacheConfig::default(),
            fetcher: FetcherConfig::default(),
            logging: LoggingConfig::default(),
            timezone: "Europe/Prague".to_string(),
        }
    }
}
