//! Training completion criterion and progress validation.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::policy::TrainingScope;
use crate::types::DbId;

/// Percent value recorded for a completed module.
pub const COMPLETE_PERCENT: i32 = 100;

/// Training module content kinds.
pub const MODULE_TYPE_VIDEO: &str = "video";
pub const MODULE_TYPE_PDF: &str = "pdf";
pub const MODULE_TYPE_ARTICLE: &str = "article";

/// All valid module content kinds.
pub const VALID_MODULE_TYPES: &[&str] = &[MODULE_TYPE_VIDEO, MODULE_TYPE_PDF, MODULE_TYPE_ARTICLE];

/// The part of a training module needed to evaluate completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleRequirement {
    pub module_id: DbId,
    pub is_required: bool,
}

/// Modules that count towards the training gate under `scope`.
///
/// With [`TrainingScope::Required`] and a catalog that marks nothing as
/// required, every module counts.
pub fn counted_modules(modules: &[ModuleRequirement], scope: TrainingScope) -> Vec<DbId> {
    let required: Vec<DbId> = modules
        .iter()
        .filter(|m| m.is_required)
        .map(|m| m.module_id)
        .collect();

    match scope {
        TrainingScope::Required if !required.is_empty() => required,
        _ => modules.iter().map(|m| m.module_id).collect(),
    }
}

/// Whether every counted module appears in `completed`.
///
/// An empty catalog never completes training.
pub fn training_complete(
    modules: &[ModuleRequirement],
    completed: &HashSet<DbId>,
    scope: TrainingScope,
) -> bool {
    let counted = counted_modules(modules, scope);
    !counted.is_empty() && counted.iter().all(|id| completed.contains(id))
}

/// Reject progress values outside 0..=100.
pub fn validate_progress_percent(percent: i32) -> Result<(), CoreError> {
    if !(0..=COMPLETE_PERCENT).contains(&percent) {
        return Err(CoreError::Validation(format!(
            "Progress percent must be between 0 and {COMPLETE_PERCENT}, got {percent}"
        )));
    }
    Ok(())
}

/// Validate a module content type string.
pub fn validate_module_type(module_type: &str) -> Result<(), CoreError> {
    if VALID_MODULE_TYPES.contains(&module_type) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid module type '{module_type}'. Must be one of: {}",
            VALID_MODULE_TYPES.join(", ")
        )))
    }
}
