//! REST API over the application services.
//!
//! ```text
//! /{API_PREFIX}
//!   ├── /health
//!   ├── /articles/...          (no user required)
//!   ├── /user-outputs/...      ┐
//!   ├── /memory-items/...      ├ x-user-id header
//!   └── /reading-sessions/...  ┘
//! ```

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use extract::{CurrentUser, USER_HEADER};
pub use server::{AppState, ServerConfig, build_router, serve};
