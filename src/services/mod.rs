//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own workspace behaviour (routing input, running panes,
//! rendering and publishing, property lookup) so route handlers can stay
//! focused on protocol translation.

pub mod lookup;
pub mod pane;
pub mod publish;
pub mod router;

#[cfg(test)]
pub(crate) mod test_support;
