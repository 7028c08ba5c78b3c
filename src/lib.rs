//! # SmeHub Report
//!
//! Backend service that turns report requests into markdown business
//! reports stored in a document database.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌───────────────────────┐
//! │   HTTP   │──▶│ ReportHandler │──▶│ ReportGenerator       │
//! │  (axum)  │   │ status machine│   │ search ─▶ completion  │
//! └──────────┘   └──────┬────────┘   └──────────┬────────────┘
//!                       │                       │ failure
//!                       ▼                       ▼
//!                ┌─────────────┐        ┌──────────────┐
//!                │ Firestore / │        │   fallback   │
//!                │  in-memory  │        │   template   │
//!                └─────────────┘        └──────────────┘
//! ```
//!
//! ## Request Lifecycle
//!
//! 1. The frontend creates the report document (`pending_backend_processing`)
//!    and calls `POST /api/request-report`.
//! 2. The [`handler`] validates the request, checks the document exists and
//!    writes `processing`.
//! 3. The [`generator`] gathers web context via the search provider
//!    ([`web_search`]) and asks the completion provider ([`completion`]) for
//!    the report.
//! 4. On success the report is stored as `completed`; if generation fails
//!    the fallback template is stored as `completed` instead.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`handler`] | Report status state machine |
//! | [`generator`] | Search-augmented AI generation |
//! | [`completion`] | Completion providers (OpenAI, disabled) |
//! | [`web_search`] | Search providers (Tavily, disabled) |
//! | [`firestore`] | Firestore REST document store |
//! | [`store`] | Store selection |
//! | [`server`] | HTTP server |
//! | [`observability`] | Logging setup |

pub mod check;
pub mod completion;
pub mod config;
pub mod firestore;
pub mod generate_cmd;
pub mod generator;
pub mod handler;
pub mod observability;
pub mod server;
pub mod store;
pub mod web_search;
