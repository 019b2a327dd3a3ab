use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

/// Process-level settings supplied through the environment. The API base
/// URI and job selection arrive per invocation on the command line; only
/// credentials and transport tuning live here.
#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "API_USER")]
    pub api_user: String,

    #[envconfig(from = "API_PASS")]
    pub api_pass: String,

    #[envconfig(from = "REQUEST_TIMEOUT_MS", default = "3000")]
    pub request_timeout: EnvMsDuration,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ms_duration() {
        let parsed: EnvMsDuration = "3000".parse().expect("failed to parse duration");
        assert_eq!(parsed.0, time::Duration::from_secs(3));

        assert!("".parse::<EnvMsDuration>().is_err());
        assert!("2s".parse::<EnvMsDuration>().is_err());
    }
}
