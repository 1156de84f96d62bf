use std::{env, fmt, fs, path::Path, str::FromStr};

use url::Url;

use crate::error::Error;

pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Ranked-list query sent on every extraction.
pub const MARKETS_QUERY: [(&str, &str); 5] = [
    ("vs_currency", "usd"),
    ("order", "market_cap_desc"),
    ("per_page", "50"),
    ("page", "1"),
    ("sparkline", "false"),
];

const DATABASE_PARAMS: [&str; 5] =
    ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASS"];

/// Which stages the process is about to run. Decides what must be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Load,
    Run,
}

impl Stage {
    fn needs_database(&self) -> bool {
        matches!(self, Stage::Load | Stage::Run)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stage::Extract => write!(f, "extract"),
            Stage::Load => write!(f, "load"),
            Stage::Run => write!(f, "run"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket_name: String,
    /// Unset leaves the region to the default AWS provider chain.
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub credentials: Option<StorageCredentials>,
    pub timeout: u64,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub timeout: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_timeout: u64,
    pub storage: StorageConfig,
    pub database: Option<DatabaseConfig>,
    pub retries: u32,
    pub retry_delay: u64,
}

impl Config {
    pub fn get_markets_url(&self) -> Result<Url, Error> {
        let base = self.api_url.trim_end_matches('/');
        let url = Url::parse_with_params(
            &format!("{}/coins/markets", base),
            MARKETS_QUERY,
        )?;
        Ok(url)
    }

    pub fn database(&self) -> Result<&DatabaseConfig, Error> {
        self.database.as_ref().ok_or_else(|| {
            Error::MissingParams(DATABASE_PARAMS.join(", "))
        })
    }

    /// Builds the configuration for `stage` from a variable lookup. Every
    /// required variable is checked before anything else happens, and all the
    /// missing ones are reported together.
    pub fn from_lookup<F>(stage: Stage, lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut required = vec!["S3_BUCKET_NAME"];
        if stage.needs_database() {
            required.extend(DATABASE_PARAMS);
        }

        let missing = required
            .iter()
            .copied()
            .filter(|key| var(key).is_none())
            .collect::<Vec<&str>>();

        if !missing.is_empty() {
            return Err(Error::MissingParams(missing.join(", ")));
        }

        let required_var = |key: &str| {
            var(key).ok_or_else(|| Error::MissingParams(key.to_owned()))
        };

        let credentials = match (
            var("AWS_ACCESS_KEY_ID"),
            var("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => {
                Some(StorageCredentials {
                    access_key_id,
                    secret_access_key,
                })
            },
            (None, None) => None,
            (Some(_), None) => {
                return Err(Error::ConfigurationError(String::from(
                    "AWS_ACCESS_KEY_ID is set without AWS_SECRET_ACCESS_KEY",
                )));
            },
            (None, Some(_)) => {
                return Err(Error::ConfigurationError(String::from(
                    "AWS_SECRET_ACCESS_KEY is set without AWS_ACCESS_KEY_ID",
                )));
            },
        };

        let storage = StorageConfig {
            bucket_name: required_var("S3_BUCKET_NAME")?,
            region: var("AWS_REGION"),
            endpoint_url: var("S3_ENDPOINT_URL"),
            credentials,
            timeout: parse_or("STORAGE_TIMEOUT", var("STORAGE_TIMEOUT"), 30)?,
        };

        let database = if stage.needs_database() {
            Some(DatabaseConfig {
                host: required_var("DB_HOST")?,
                port: parse_or("DB_PORT", var("DB_PORT"), 5432)?,
                name: required_var("DB_NAME")?,
                user: required_var("DB_USER")?,
                password: required_var("DB_PASS")?,
                timeout: parse_or("DB_TIMEOUT", var("DB_TIMEOUT"), 30)?,
            })
        } else {
            None
        };

        let config = Config {
            api_url: var("COINGECKO_API_URL")
                .unwrap_or_else(|| String::from(DEFAULT_API_URL)),
            api_timeout: parse_or("API_TIMEOUT", var("API_TIMEOUT"), 10)?,
            storage,
            database,
            retries: parse_or("STAGE_RETRIES", var("STAGE_RETRIES"), 1)?,
            retry_delay: parse_or(
                "STAGE_RETRY_DELAY",
                var("STAGE_RETRY_DELAY"),
                300,
            )?,
        };

        Url::parse(&config.api_url).map_err(|e| {
            Error::ConfigurationError(format!("COINGECKO_API_URL: {}", e))
        })?;

        Ok(config)
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|e| {
            Error::ConfigurationError(format!("{}={}: {}", key, value, e))
        }),
        None => Ok(default),
    }
}

pub fn get_configuration(stage: Stage) -> Result<Config, Error> {
    Config::from_lookup(stage, |key| env::var(key).ok())
}

/// Seeds the process environment from `.env` in the working directory, if
/// there is one. Variables already present in the environment are kept.
pub fn set_configuration() -> Result<(), Error> {
    let path = Path::new(".env");

    if !path.exists() {
        return Ok(());
    }

    let config_string = fs::read_to_string(path)?;
    for (key, value) in parse_config_string(&config_string) {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }

    Ok(())
}

fn parse_config_string(config: &str) -> Vec<(String, String)> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_at(line.find('=')?);
            let value = value[1..].trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| {
                    value.strip_prefix('\'').and_then(|v| v.strip_suffix('\''))
                })
                .unwrap_or(value);
            Some((key.trim().to_owned(), value.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<String, String>>();
        move |key| map.get(key).cloned()
    }

    const FULL: [(&str, &str); 6] = [
        ("S3_BUCKET_NAME", "lakehouse"),
        ("DB_HOST", "localhost"),
        ("DB_PORT", "5433"),
        ("DB_NAME", "warehouse"),
        ("DB_USER", "etl"),
        ("DB_PASS", "secret"),
    ];

    #[test]
    fn test_extract_requires_bucket() {
        let err = Config::from_lookup(Stage::Extract, lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Missing params: S3_BUCKET_NAME");
    }

    #[test]
    fn test_blank_bucket_is_missing() {
        let err =
            Config::from_lookup(Stage::Extract, lookup(&[("S3_BUCKET_NAME", "  ")]))
                .unwrap_err();
        assert!(matches!(err, Error::MissingParams(_)));
    }

    #[test]
    fn test_extract_does_not_need_database() {
        let config = Config::from_lookup(
            Stage::Extract,
            lookup(&[("S3_BUCKET_NAME", "lakehouse")]),
        )
        .unwrap();

        assert!(config.database.is_none());
        assert!(config.database().is_err());
        assert_eq!(config.storage.bucket_name, "lakehouse");
        assert_eq!(config.storage.region, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_timeout, 10);
        assert_eq!(config.retries, 1);
        assert_eq!(config.retry_delay, 300);
    }

    #[test]
    fn test_region_is_passed_only_when_set() {
        let config = Config::from_lookup(
            Stage::Extract,
            lookup(&[("S3_BUCKET_NAME", "lakehouse"), ("AWS_REGION", "eu-west-1")]),
        )
        .unwrap();

        assert_eq!(config.storage.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_load_reports_every_missing_database_param() {
        let err = Config::from_lookup(
            Stage::Load,
            lookup(&[("S3_BUCKET_NAME", "lakehouse"), ("DB_HOST", "db")]),
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing params: DB_PORT, DB_NAME, DB_USER, DB_PASS"
        );
    }

    #[test]
    fn test_load_configuration() {
        let config = Config::from_lookup(Stage::Load, lookup(&FULL)).unwrap();
        let database = config.database().unwrap();

        assert_eq!(database.host, "localhost");
        assert_eq!(database.port, 5433);
        assert_eq!(database.name, "warehouse");
        assert!(!format!("{:?}", database).contains("secret"));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = FULL.to_vec();
        pairs[2] = ("DB_PORT", "not-a-port");
        let err = Config::from_lookup(Stage::Run, lookup(&pairs)).unwrap_err();

        assert!(matches!(err, Error::ConfigurationError(_)));
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_credentials_must_come_in_pairs() {
        let err = Config::from_lookup(
            Stage::Extract,
            lookup(&[
                ("S3_BUCKET_NAME", "lakehouse"),
                ("AWS_ACCESS_KEY_ID", "AKIA"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY"));

        let config = Config::from_lookup(
            Stage::Extract,
            lookup(&[
                ("S3_BUCKET_NAME", "lakehouse"),
                ("AWS_ACCESS_KEY_ID", "AKIA"),
                ("AWS_SECRET_ACCESS_KEY", "shh"),
            ]),
        )
        .unwrap();
        let credentials = config.storage.credentials.unwrap();
        assert_eq!(credentials.access_key_id, "AKIA");
        assert!(!format!("{:?}", credentials).contains("shh"));
    }

    #[test]
    fn test_markets_url() {
        let config = Config::from_lookup(
            Stage::Extract,
            lookup(&[
                ("S3_BUCKET_NAME", "lakehouse"),
                ("COINGECKO_API_URL", "http://127.0.0.1:8080/api/v3/"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.get_markets_url().unwrap().as_str(),
            "http://127.0.0.1:8080/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=50&page=1&sparkline=false"
        );
    }

    #[test]
    fn test_parse_config_string() {
        let parsed = parse_config_string(
            "# comment\nS3_BUCKET_NAME=lakehouse\n\nexport DB_PASS=\"p=ss\"\nbroken line\n",
        );

        assert_eq!(
            parsed,
            vec![
                (String::from("S3_BUCKET_NAME"), String::from("lakehouse")),
                (String::from("DB_PASS"), String::from("p=ss")),
            ]
        );
    }
}
