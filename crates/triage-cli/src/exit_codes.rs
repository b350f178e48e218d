pub const OK: i32 = 0;
/// Pipeline-level failure (ordering violation, unavailable collaborator).
pub const PIPELINE_ERROR: i32 = 1;
/// Bad settings or unusable arguments.
pub const CONFIG_ERROR: i32 = 2;
/// Run, variant, artifact, or item not found.
pub const NOT_FOUND: i32 = 3;
