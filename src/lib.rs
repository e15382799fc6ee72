// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod analytics;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod export;
pub mod question;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod util;
