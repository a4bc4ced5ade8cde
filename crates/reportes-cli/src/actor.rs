//! Actor identity resolution for mutating commands.
//!
//! The resolution chain: `--actor` flag > `REPORTES_ACTOR` env > `ACTOR` env.
//! The resolved id must name a user in the data file.

use std::env;

use reportes_core::{ReportDesk, UserRef};

/// Errors from actor resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorResolutionError {
    pub message: String,
    pub code: &'static str,
}

impl std::fmt::Display for ActorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActorResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

fn resolve_actor_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(actor) = cli_flag.filter(|a| !a.is_empty()) {
        return Some(actor.to_string());
    }
    env.get("REPORTES_ACTOR").or_else(|| env.get("ACTOR"))
}

/// Resolve the acting user, returning an error if no id is set or the id is
/// not a known user.
pub fn require_actor(
    cli_flag: Option<&str>,
    desk: &ReportDesk,
) -> Result<UserRef, ActorResolutionError> {
    let Some(id) = resolve_actor_with(cli_flag, &RealEnv) else {
        return Err(ActorResolutionError {
            message: "Actor identity required for this command. \
                      Set --actor, REPORTES_ACTOR, or ACTOR."
                .to_string(),
            code: "missing_actor",
        });
    };

    desk.find_user(&id).cloned().ok_or_else(|| ActorResolutionError {
        message: format!("actor '{id}' is not a known user"),
        code: "unknown_actor",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MockEnv {
        vars: HashMap<String, String>,
    }

    impl MockEnv {
        fn new() -> Self {
            Self {
                vars: HashMap::new(),
            }
        }

        fn var(mut self, key: &str, val: &str) -> Self {
            self.vars.insert(key.to_string(), val.to_string());
            self
        }
    }

    impl EnvReader for MockEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).filter(|v| !v.is_empty()).cloned()
        }
    }

    #[test]
    fn cli_flag_takes_priority() {
        let env = MockEnv::new()
            .var("REPORTES_ACTOR", "u-env")
            .var("ACTOR", "u-generic");
        assert_eq!(resolve_actor_with(Some("u-flag"), &env).as_deref(), Some("u-flag"));
    }

    #[test]
    fn reportes_actor_beats_generic_actor() {
        let env = MockEnv::new()
            .var("REPORTES_ACTOR", "u-env")
            .var("ACTOR", "u-generic");
        assert_eq!(resolve_actor_with(None, &env).as_deref(), Some("u-env"));
    }

    #[test]
    fn empty_values_are_skipped() {
        let env = MockEnv::new().var("REPORTES_ACTOR", "").var("ACTOR", "u-generic");
        assert_eq!(resolve_actor_with(Some(""), &env).as_deref(), Some("u-generic"));
    }

    #[test]
    fn nothing_set_resolves_to_none() {
        assert_eq!(resolve_actor_with(None, &MockEnv::new()), None);
    }
}
