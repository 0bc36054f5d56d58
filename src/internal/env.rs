use std::{collections::HashMap, env::VarError};

use crate::ConfigureError;

/// Reads `key` from the environment.
///
/// If `env` is provided, it is used instead of the process environment. A variable which is
/// present but not valid UTF-8 is an error rather than being treated as absent.
pub(crate) fn get_optional_env(
    key: &str,
    env: Option<&HashMap<String, String>>,
) -> Result<Option<String>, ConfigureError> {
    if let Some(env) = env {
        return Ok(env.get(key).cloned());
    }
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigureError::Other(
            format!("{key} is not valid UTF-8").into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_env_override_is_used() {
        let env = HashMap::from([("FOO".to_string(), "bar".to_string())]);
        assert_eq!(
            get_optional_env("FOO", Some(&env)).unwrap(),
            Some("bar".to_string())
        );
        assert_eq!(get_optional_env("MISSING", Some(&env)).unwrap(), None);
    }
}
