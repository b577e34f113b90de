//! Pipeline stage enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four fixed stages a request passes through, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Authorization filters decide whether the request may proceed.
    Authorization,
    /// Exception filters wrap everything downstream and observe failures.
    Exception,
    /// Action filters wrap the action invocation.
    Action,
    /// Result filters wrap the dispatch of the final result.
    Result,
}

impl Stage {
    /// Returns all stages in execution order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Authorization, Self::Exception, Self::Action, Self::Result]
    }

    /// Returns the stage name used in logs and events.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::Exception => "exception",
            Self::Action => "action",
            Self::Result => "result",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
