use thiserror::Error;

/// Configuration errors.
///
/// Every variable has a default, so the only failure mode is a value
/// that is present but unparseable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: expected {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_var_display() {
        let err = ConfigError::Invalid {
            var: "DB_PORT",
            value: "fivethousand".into(),
            expected: "a port number",
        };
        assert_eq!(
            err.to_string(),
            "invalid value 'fivethousand' for DB_PORT: expected a port number"
        );
    }
}
