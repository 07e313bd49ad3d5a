//! Taskboard backend: REST API over SQLite with an optional AI bridge.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────┐
//! │  Client  │ ───────> │  app.rs  (Router, CORS, start_server)        │
//! │  (board) │ <─────── │    └─ api.rs  (route handlers, AppState)     │
//! └──────────┘          │         │                   │                │
//!                       │         v                   v                │
//!                       │  db.rs (DbHandle)     ai.rs (AiBridge)       │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! | Module | Responsibility                                              |
//! |--------|-------------------------------------------------------------|
//! | `db`   | Projects and tasks tables, cascade and soft delete          |
//! | `ai`   | Prompt building, `TextGenerator` trait, Gemini provider     |
//! | `api`  | Validation, status codes, `{"message": ...}` error bodies   |
//! | `app`  | Router assembly, CORS policy, bind and graceful shutdown    |

pub mod ai;
pub mod api;
pub mod app;
pub mod db;

pub use app::{build_router, cors_layer, start_server};
