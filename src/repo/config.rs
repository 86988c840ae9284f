use std::{fmt, path::PathBuf, time::Duration};

use crate::{
    cli::Args,
    client::px6::PX6_BASE_URL_API,
    error::{FetcherError, Result},
};

pub const API_KEY_VAR: &str = "PX6_API_KEY";
pub const API_ROOT_VAR: &str = "PX6_API_ROOT";

pub struct ConfigRepo {
    pub api_key: String,
    pub api_root: String,
    pub output: PathBuf,
    pub timeout: Duration,
    pub print_env: bool,
    pub strategy: String,
}

impl fmt::Debug for ConfigRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRepo")
            .field("api_key", &"<redacted>")
            .field("api_root", &self.api_root)
            .field("output", &self.output)
            .field("timeout", &self.timeout)
            .field("print_env", &self.print_env)
            .field("strategy", &self.strategy)
            .finish()
    }
}

impl ConfigRepo {
    pub fn new(args: &Args) -> Result<Self> {
        Self::from_source(args, |key| std::env::var(key).ok())
    }

    /// Resolves flags first, then `env` (the process environment, which
    /// includes anything loaded from `.env`).
    pub fn from_source(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = args
            .api_key
            .clone()
            .or_else(|| env(API_KEY_VAR))
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                FetcherError::Config(format!(
                    "provide --api-key or set the {API_KEY_VAR} environment variable"
                ))
            })?;

        if args.timeout == 0 {
            return Err(FetcherError::Config(
                "--timeout must be greater than zero".to_string(),
            ));
        }

        let api_root = env(API_ROOT_VAR)
            .map(|root| root.trim().to_string())
            .filter(|root| !root.is_empty())
            .unwrap_or_else(|| PX6_BASE_URL_API.to_string());

        Ok(Self {
            api_key,
            api_root,
            output: args.output.clone(),
            timeout: Duration::from_secs(args.timeout),
            print_env: args.print_env,
            strategy: args.strategy.clone(),
        })
    }
}
