use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    pub order: OrderConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub expiry_days: i64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OrderConfig {
    pub currency: String,
    pub unknown_course_policy: UnknownCoursePolicy,
}

/// What to do when an order request names course ids missing from the catalog.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCoursePolicy {
    /// Price only the ids that resolve, ignore the rest.
    Drop,
    /// Reject the whole order request.
    Reject,
}

impl FromStr for UnknownCoursePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(UnknownCoursePolicy::Drop),
            "reject" => Ok(UnknownCoursePolicy::Reject),
            other => Err(anyhow!("Unknown course policy: {}", other)),
        }
    }
}

impl DatabaseConfig {
    /// Load only the database section. The catalog seeder uses this so it
    /// does not demand payment or token secrets.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let url = env::var("COURSE_DATABASE_URL")
            .map_err(|_| anyhow!("COURSE_DATABASE_URL must be set"))?;
        let db_name =
            env::var("COURSE_DATABASE_NAME").unwrap_or_else(|_| "course_db".to_string());

        Ok(Self {
            url: Secret::new(url),
            db_name,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("COURSE_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("COURSE_SERVICE_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let database = DatabaseConfig::from_env()?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;
        let jwt_expiry_days = env::var("JWT_EXPIRY_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()?;

        let razorpay_key_id =
            env::var("RAZORPAY_KEY_ID").map_err(|_| anyhow!("RAZORPAY_KEY_ID must be set"))?;
        let razorpay_key_secret = env::var("RAZORPAY_KEY_SECRET")
            .map_err(|_| anyhow!("RAZORPAY_KEY_SECRET must be set"))?;
        let razorpay_api_base_url = env::var("RAZORPAY_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string());
        let razorpay_timeout_seconds = env::var("RAZORPAY_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let unknown_course_policy = env::var("ORDER_UNKNOWN_COURSE_POLICY")
            .unwrap_or_else(|_| "drop".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database,
            jwt: JwtConfig {
                secret: Secret::new(jwt_secret),
                expiry_days: jwt_expiry_days,
            },
            razorpay: RazorpayConfig {
                key_id: razorpay_key_id,
                key_secret: Secret::new(razorpay_key_secret),
                api_base_url: razorpay_api_base_url,
                timeout_seconds: razorpay_timeout_seconds,
            },
            order: OrderConfig {
                // Single-currency deployment; Razorpay settles in INR.
                currency: "INR".to_string(),
                unknown_course_policy,
            },
            service_name: "course-service".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_config_needs_only_database_vars() {
        env::set_var("COURSE_DATABASE_URL", "mongodb://localhost:27017");
        env::remove_var("COURSE_DATABASE_NAME");
        env::remove_var("JWT_SECRET");
        env::remove_var("RAZORPAY_KEY_ID");
        env::remove_var("RAZORPAY_KEY_SECRET");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.db_name, "course_db");
    }

    #[test]
    fn unknown_course_policy_parses() {
        assert_eq!(
            "drop".parse::<UnknownCoursePolicy>().unwrap(),
            UnknownCoursePolicy::Drop
        );
        assert_eq!(
            "REJECT".parse::<UnknownCoursePolicy>().unwrap(),
            UnknownCoursePolicy::Reject
        );
        assert!("keep".parse::<UnknownCoursePolicy>().is_err());
    }
}
