/// Router Module Index
///
/// Routes are split by how the caller reaches them. Authorization itself is decided per
/// handler by the `AccessGate`; the split only controls where authentication is required.

/// Routes open to anonymous callers: health, registration, login and token flows.
pub mod public;

/// Routes behind the auth middleware. Each handler asks the gate for its resource.
pub mod authenticated;

/// Administrative routes under `/admin`, behind the same middleware and gate. The default
/// policy grants their resources only to admins.
pub mod admin;
