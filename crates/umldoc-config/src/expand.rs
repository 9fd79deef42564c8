//! `${VAR}` expansion for path-like configuration strings.
//!
//! `${VAR:-default}` falls back to `default`; a bare `$VAR` is left alone so
//! destinations containing a literal dollar sign keep working.

use std::env::{self, VarError};

use crate::ConfigError;

/// Expand `${VAR}` references in `slot` in place.
///
/// `field` is the dotted config path reported when a variable is missing or
/// not valid unicode. `slot` is untouched on error.
pub(crate) fn expand_in_place(slot: &mut String, field: &str) -> Result<(), ConfigError> {
    if !slot.contains("${") {
        return Ok(());
    }

    let expanded = shellexpand::env_with_context(slot.as_str(), |var| env::var(var).map(Some))
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: match e.cause {
                VarError::NotPresent => format!("${{{}}} not set", e.var_name),
                VarError::NotUnicode(_) => format!("${{{}}} is not valid unicode", e.var_name),
            },
        })?
        .into_owned();
    *slot = expanded;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expand(value: &str, field: &str) -> Result<String, ConfigError> {
        let mut slot = value.to_owned();
        expand_in_place(&mut slot, field).map(|()| slot)
    }

    #[test]
    fn test_destination_with_var_and_suffix() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::set_var("UMLDOC_TEST_OUT", "/tmp/out");
        }
        assert_eq!(
            expand("${UMLDOC_TEST_OUT}/puml", "plantuml.puml.destination").unwrap(),
            "/tmp/out/puml"
        );
        unsafe {
            env::remove_var("UMLDOC_TEST_OUT");
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::remove_var("UMLDOC_TEST_UNSET");
        }
        assert_eq!(
            expand("${UMLDOC_TEST_UNSET:-./docs/images}", "plantuml.images.destination").unwrap(),
            "./docs/images"
        );
    }

    #[test]
    fn test_missing_var_leaves_slot_and_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            env::remove_var("UMLDOC_TEST_MISSING");
        }
        let mut slot = "${UMLDOC_TEST_MISSING}".to_owned();

        let err = expand_in_place(&mut slot, "kroki.url").unwrap_err();

        assert_eq!(slot, "${UMLDOC_TEST_MISSING}");
        assert_eq!(
            err.to_string(),
            "Environment variable error in kroki.url: ${UMLDOC_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_plain_values_unchanged() {
        assert_eq!(expand("./jsDoc/puml", "f").unwrap(), "./jsDoc/puml");
        assert_eq!(expand("$HOME/puml", "f").unwrap(), "$HOME/puml");
    }
}
