/// Router Module Index
///
/// Routes are split by the guard they sit behind. Protected routers are wrapped in the
/// login layer by `create_router`; stricter checks happen inside the handlers.

/// Routes open to anonymous callers (all read-only).
pub mod public;

/// Routes that need a verified caller, further narrowed to admin-or-owner in the handler.
pub mod authenticated;

/// Mutating routes restricted to admins.
pub mod admin;
