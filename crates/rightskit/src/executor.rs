//! Execution engine - runs a request's operations in detect or apply mode

use crate::error::Result;
use crate::planner::{plan, scanner};
use crate::types::{ChangeRequest, ExecutionResult};

/// Run `request` in the mode it asks for.
pub fn execute(request: &ChangeRequest) -> Result<ExecutionResult> {
    if request.is_dry_run() {
        detect(request)
    } else {
        apply(request)
    }
}

/// Report what would change. Never mutates the tree.
///
/// Every operation is checked, in order; messages come only from those
/// that found work. With no work anywhere the result is "Nothing to do."
/// with exit code 1. The first scan failure is returned as an error.
pub fn detect(request: &ChangeRequest) -> Result<ExecutionResult> {
    let scanner = scanner(request);
    let mut messages = Vec::new();
    for operation in plan(request) {
        let detection = operation.detect(&scanner)?;
        if detection.has_work() {
            messages.push(detection.message);
        }
    }

    if messages.is_empty() {
        Ok(ExecutionResult::nothing_to_do())
    } else {
        Ok(ExecutionResult::work_found(messages))
    }
}

/// Apply every operation, in order, without checking first.
///
/// The first failure aborts the run. Operations already applied stay
/// applied; later ones are not attempted.
pub fn apply(request: &ChangeRequest) -> Result<ExecutionResult> {
    let scanner = scanner(request);
    for operation in plan(request) {
        operation.apply(&scanner)?;
    }
    Ok(ExecutionResult::applied())
}

/// Run several requests one after another and combine their results.
///
/// Stops at the first error, like [`apply`] does within one request.
pub fn execute_all<'a>(
    requests: impl IntoIterator<Item = &'a ChangeRequest>,
) -> Result<ExecutionResult> {
    let mut results = Vec::new();
    for request in requests {
        log::info!("enforcing {}", request.root().display());
        results.push(execute(request)?);
    }
    Ok(ExecutionResult::merge(results))
}
