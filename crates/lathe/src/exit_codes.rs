//! Exit codes for the CLI

use lathe_core::{ConfigError, LatheError};
use lathe_tasks::{ParseError, TaskError};

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Declaration or configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Unknown target, dependency cycle, or nothing to run
pub const RESOLUTION_ERROR: u8 = 3;

/// A command could not be started
pub const SPAWN_ERROR: u8 = 127;

/// User cancelled
pub const CANCELLED: u8 = 130;

/// Pick the exit code for the first recognised error in the chain
pub fn for_error(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(task_err) = cause.downcast_ref::<TaskError>() {
            return for_task_error(task_err);
        }
        if cause.downcast_ref::<ParseError>().is_some()
            || cause.downcast_ref::<ConfigError>().is_some()
        {
            return CONFIG_ERROR;
        }
        if let Some(lathe_err) = cause.downcast_ref::<LatheError>() {
            if lathe_err.is_config_error() {
                return CONFIG_ERROR;
            }
        }
    }

    ERROR
}

fn for_task_error(err: &TaskError) -> u8 {
    match err {
        _ if err.is_resolution_error() => RESOLUTION_ERROR,
        TaskError::Parse(_) | TaskError::Io(_) => CONFIG_ERROR,
        TaskError::CommandFailure { code, .. } => u8::try_from(*code)
            .ok()
            .filter(|c| *c != SUCCESS)
            .unwrap_or(ERROR),
        TaskError::Spawn { .. } => SPAWN_ERROR,
        TaskError::Interrupted { .. } => CANCELLED,
        _ => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use lathe_tasks::ParseErrorKind;

    fn failure(code: i32) -> anyhow::Error {
        TaskError::CommandFailure {
            target: "test".to_string(),
            command: "pytest".to_string(),
            code,
        }
        .into()
    }

    #[test]
    fn test_command_failure_passes_code_through() {
        assert_eq!(for_error(&failure(7)), 7);
        assert_eq!(for_error(&failure(255)), 255);
    }

    #[test]
    fn test_out_of_range_command_codes() {
        assert_eq!(for_error(&failure(0)), ERROR);
        assert_eq!(for_error(&failure(256)), ERROR);
        assert_eq!(for_error(&failure(-1)), ERROR);
    }

    #[test]
    fn test_resolution_errors() {
        let err: anyhow::Error = TaskError::CyclicDependency(vec!["X".into(), "Y".into()]).into();
        assert_eq!(for_error(&err), RESOLUTION_ERROR);

        let err: anyhow::Error = TaskError::NoTargets.into();
        assert_eq!(for_error(&err), RESOLUTION_ERROR);
    }

    #[test]
    fn test_context_is_skipped() {
        let result: Result<(), TaskError> = Err(TaskError::UnknownTarget {
            name: "Z".to_string(),
            referenced_by: None,
        });
        let err = result.context("while planning").unwrap_err();
        assert_eq!(for_error(&err), RESOLUTION_ERROR);
    }

    #[test]
    fn test_declaration_and_config_errors() {
        let err: anyhow::Error =
            TaskError::Parse(ParseError::new(1, ParseErrorKind::MissingSeparator)).into();
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err: anyhow::Error = LatheError::DeclarationNotFound {
            dir: "/tmp".into(),
            candidates: "Makefile".to_string(),
        }
        .into();
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err: anyhow::Error = ConfigError::InvalidValue {
            field: "shell.program".to_string(),
            message: "empty".to_string(),
        }
        .into();
        assert_eq!(for_error(&err), CONFIG_ERROR);
    }

    #[test]
    fn test_spawn_and_interrupt() {
        let err: anyhow::Error = TaskError::Interrupted {
            target: "serve".to_string(),
            command: "python -m http.server".to_string(),
        }
        .into();
        assert_eq!(for_error(&err), CANCELLED);

        let err: anyhow::Error = TaskError::Spawn {
            target: "x".to_string(),
            command: "true".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(for_error(&err), SPAWN_ERROR);
    }

    #[test]
    fn test_generic_error() {
        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }
}
