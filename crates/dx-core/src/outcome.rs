use dx_domain::DependencyError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: CommandStatus,
    pub message: String,
    #[serde(default)]
    pub details: Value,
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: message.into(),
            details,
        }
    }

    pub fn failure(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::Failure,
            message: message.into(),
            details,
        }
    }

    pub fn user_error(message: impl Into<String>, details: Value) -> Self {
        Self {
            status: CommandStatus::UserError,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Ok => 0,
            CommandStatus::UserError => 1,
            CommandStatus::Failure => 2,
        }
    }
}

/// Bad requirement, link or marker text is the caller's mistake.
impl From<DependencyError> for ExecutionOutcome {
    fn from(err: DependencyError) -> Self {
        Self::user_error(err.to_string(), err.details())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    UserError,
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dx_domain::Markers;

    #[test]
    fn dependency_errors_become_user_errors() {
        let err = Markers::parse("os_name ==").unwrap_err();
        let outcome = ExecutionOutcome::from(err);
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(outcome.details["code"], "DX103");
        assert_eq!(outcome.details["input"], "os_name ==");
    }

    #[test]
    fn status_serializes_by_name() {
        let outcome = ExecutionOutcome::failure("boom", Value::Null);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "Failure");
        assert_eq!(outcome.exit_code(), 2);
    }
}
