// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Reference aggregates built on the kernel. Each aggregate has its own
// subdirectory with events, commands, errors and the aggregate itself.
//
// - account: handlers declared through a dispatch table
// - order:   closed event enum applied by its own EventApplier
//
// ============================================================================

pub mod account;
pub mod order;
