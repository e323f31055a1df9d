//! Entity lifecycle states and the transition gate.
//!
//! ```text
//! Staged    -> Activated | Suspended
//! Activated -> Suspended
//! Suspended -> Activated
//! ```
//!
//! Staged is only reachable through create. Self-transitions always pass.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Lifecycle state of a directory entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    #[default]
    Staged,
    Activated,
    Suspended,
}

impl State {
    pub const ALL: [State; 3] = [State::Staged, State::Activated, State::Suspended];

    /// Uppercase wire spelling.
    pub fn as_wire(&self) -> &'static str {
        match self {
            State::Staged => "STAGED",
            State::Activated => "ACTIVATED",
            State::Suspended => "SUSPENDED",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for State {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STAGED" => Ok(State::Staged),
            "ACTIVATED" => Ok(State::Activated),
            "SUSPENDED" => Ok(State::Suspended),
            _ => Err(ValidationError::UnknownState {
                value: s.to_owned(),
            }),
        }
    }
}

/// States reachable from `from` in one step, excluding the self-transition.
pub fn allowed_targets(from: State) -> &'static [State] {
    match from {
        State::Staged => &[State::Activated, State::Suspended],
        State::Activated => &[State::Suspended],
        State::Suspended => &[State::Activated],
    }
}

pub fn is_allowed(from: State, to: State) -> bool {
    from == to || allowed_targets(from).contains(&to)
}

/// Reject any transition not in the table.
pub fn validate_transition(from: State, to: State) -> Result<(), ValidationError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(ValidationError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("activated".parse::<State>().unwrap(), State::Activated);
        assert_eq!(" Suspended ".parse::<State>().unwrap(), State::Suspended);
        assert!(matches!(
            "DISABLED".parse::<State>(),
            Err(ValidationError::UnknownState { .. })
        ));
    }

    #[test]
    fn wire_spelling_is_uppercase() {
        assert_eq!(State::Staged.to_string(), "STAGED");
        assert_eq!(
            serde_json::to_string(&State::Activated).unwrap(),
            "\"ACTIVATED\""
        );
    }

    #[test]
    fn illegal_transition_names_the_pair() {
        let err = validate_transition(State::Activated, State::Staged).unwrap_err();
        assert_eq!(err.to_string(), "illegal state transition ACTIVATED -> STAGED");
    }
}
