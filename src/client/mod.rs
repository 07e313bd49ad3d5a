//! Board client: REST access, the three-bucket board, and the syncing store.
//!
//! | Module  | Responsibility                                                |
//! |---------|---------------------------------------------------------------|
//! | `api`   | `RemoteApi` trait and its `reqwest` implementation `HttpApi`  |
//! | `board` | `TaskBoard` buckets, `Slot`, `apply_move`, text rendering     |
//! | `store` | `BoardStore` with `SyncPolicy`, `Origin`, offline fallbacks    |

pub mod api;
pub mod board;
pub mod store;

pub use api::{HttpApi, RemoteApi};
pub use board::{MoveOutcome, Slot, TaskBoard};
pub use store::{BoardStore, Origin, SyncMode, SyncPolicy};
