//! Whiteboard authoring workspace: a shared whiteboard document, independent
//! conversation panes backed by chat completion and image generation, a
//! property lookup, and publication of the whiteboard as a shareable link.

pub mod config;
pub mod credentials;
pub mod document;
pub mod entry;
pub mod error;
pub mod llm;
pub mod routes;
pub mod services;
pub mod state;
