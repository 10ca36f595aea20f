//! Workspace name expansion.
//!
//! The binder only needs "format in, name out", so expansion sits behind the
//! [`NameExpander`] trait. [`VariableExpander`] is the stock implementation:
//! it replaces `${VAR}` with values from a variable map (usually the build
//! environment) and leaves unknown placeholders as they are.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder pattern is valid");
}

#[mockall::automock]
pub trait NameExpander: Send + Sync {
    fn expand(&self, format: &str) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct VariableExpander {
    vars: HashMap<String, String>,
}

impl VariableExpander {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Variables taken from the process environment.
    pub fn from_env() -> Self {
        Self::new(std::env::vars().collect())
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Add `vars`, replacing existing keys.
    pub fn extend<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.vars.extend(vars);
        self
    }
}

impl NameExpander for VariableExpander {
    fn expand(&self, format: &str) -> String {
        PLACEHOLDER
            .replace_all(format, |caps: &Captures| match self.vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// True when `name` still carries a `${...}` placeholder after expansion.
pub fn has_unresolved(name: &str) -> bool {
    PLACEHOLDER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expander() -> VariableExpander {
        VariableExpander::default()
            .with_var("NODE_NAME", "agent1")
            .with_var("JOB_NAME", "myjob")
    }

    #[test]
    fn test_expand_known_variables() {
        assert_eq!(
            expander().expand("jenkins-${NODE_NAME}-${JOB_NAME}"),
            "jenkins-agent1-myjob"
        );
    }

    #[test]
    fn test_unknown_variables_are_kept() {
        let name = expander().expand("ws-${NODE_NAME}-${EXECUTOR_NUMBER}");
        assert_eq!(name, "ws-agent1-${EXECUTOR_NUMBER}");
        assert!(has_unresolved(&name));
    }

    #[test]
    fn test_literal_text_untouched() {
        assert_eq!(expander().expand("fixed-name"), "fixed-name");
        assert_eq!(expander().expand("odd}${"), "odd}${");
        assert!(!has_unresolved("odd}${"));
    }

    #[test]
    fn test_extend_replaces_existing() {
        let expander = expander().extend([("NODE_NAME".to_string(), "agent2".to_string())]);
        assert_eq!(expander.expand("${NODE_NAME}"), "agent2");
    }
}
