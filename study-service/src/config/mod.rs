use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct StudyConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub assignments: AssignmentsConfig,
    pub identity: IdentityConfig,
    pub cors: CorsConfig,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<Secret<String>>,
    /// Pin the Stable API v1 in strict mode.
    pub stable_api: bool,
}

#[derive(Debug, Clone)]
pub struct AssignmentsConfig {
    pub update_policy: AssignmentUpdatePolicy,
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub source: IdentitySource,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// What `PUT /assignments/:id` does when no assignment has the requested id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentUpdatePolicy {
    /// Reject with 404.
    #[default]
    UpdateOnly,
    /// Insert a new assignment under the requested id.
    Upsert,
}

/// Where the caller's email comes from on submission routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentitySource {
    /// `X-User-Email`, set by the authenticating gateway.
    #[default]
    Header,
    /// The unverified `email` query parameter.
    Query,
}

impl FromStr for AssignmentUpdatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "update-only" => Ok(AssignmentUpdatePolicy::UpdateOnly),
            "upsert" => Ok(AssignmentUpdatePolicy::Upsert),
            _ => Err(format!("Invalid assignment update policy: {}", s)),
        }
    }
}

impl FromStr for IdentitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "header" => Ok(IdentitySource::Header),
            "query" => Ok(IdentitySource::Query),
            _ => Err(format!("Invalid identity source: {}", s)),
        }
    }
}

impl StudyConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, APP__ prefix and PORT)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let username = env::var("DB_USER").ok().filter(|v| !v.is_empty());
        let password = env::var("DB_PASS")
            .ok()
            .filter(|v| !v.is_empty())
            .map(Secret::new);

        Ok(StudyConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("onlineGroupStudyDB"), false)?,
                username,
                password,
                stable_api: parse_bool(&get_env("MONGODB_STABLE_API", Some("true"), false)?)?,
            },
            assignments: AssignmentsConfig {
                update_policy: get_env("ASSIGNMENT_UPDATE_POLICY", Some("update-only"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            identity: IdentityConfig {
                source: get_env("IDENTITY_SOURCE", Some("header"), false)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env("CORS_ALLOWED_ORIGINS", Some("*"), false)?),
            },
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
        })
    }

    /// Config for tests and local tooling: no credentials, default policies.
    pub fn local(database: impl Into<String>) -> Self {
        StudyConfig {
            common: core_config::Config { port: 0 },
            mongodb: MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: database.into(),
                username: None,
                password: None,
                stable_api: false,
            },
            assignments: AssignmentsConfig {
                update_policy: AssignmentUpdatePolicy::default(),
            },
            identity: IdentityConfig {
                source: IdentitySource::default(),
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
            log_level: "error".to_string(),
            otlp_endpoint: None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool, AppError> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid boolean value: {}",
            raw
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_policy_parses_both_spellings() {
        assert_eq!(
            "update-only".parse::<AssignmentUpdatePolicy>().unwrap(),
            AssignmentUpdatePolicy::UpdateOnly
        );
        assert_eq!(
            "UPDATE_ONLY".parse::<AssignmentUpdatePolicy>().unwrap(),
            AssignmentUpdatePolicy::UpdateOnly
        );
        assert_eq!(
            "upsert".parse::<AssignmentUpdatePolicy>().unwrap(),
            AssignmentUpdatePolicy::Upsert
        );
        assert!("replace".parse::<AssignmentUpdatePolicy>().is_err());
    }

    #[test]
    fn identity_source_defaults_to_header() {
        assert_eq!(IdentitySource::default(), IdentitySource::Header);
        assert_eq!(
            "Query".parse::<IdentitySource>().unwrap(),
            IdentitySource::Query
        );
        assert!("cookie".parse::<IdentitySource>().is_err());
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn bool_values_are_strict() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
