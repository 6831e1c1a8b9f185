#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Kitchen Dashboard
//!
//! > **The employee side of a restaurant's order pipeline.**
//!
//! Kitchen, packing and delivery staff use this crate to see the orders of their
//! location and move each one through its stages. Administrators additionally get
//! aggregate figures over the same orders.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Local view, remote authority
//!
//! The backend workflow owns every order. The dashboard keeps a local copy and never
//! advances an order on its own:
//! - **Transitions are confirmed first**: the local status changes only after the
//!   pipeline accepted the stage.
//! - **Analytics are derived**: every snapshot is computed from the store right after
//!   it changes, never patched incrementally.
//! - **Failures change nothing**: a rejected or failed request leaves the store as it was.
//!
//! ## 🚀 Core Concepts
//!
//! ### The order lifecycle
//!
//! ```text
//! pendiente -> en_preparacion -> en_cocina -> empaquetado -> en_delivery -> entregado
//!                                                                            cancelado
//! ```
//!
//! `entregado` and `cancelado` are terminal. Cancellation happens on the pipeline
//! side; the dashboard only observes it.
//!
//! ### Mocking: Testing without a backend
//! Every remote call goes through the [`OrderPipeline`](clients::OrderPipeline) trait.
//! [`MockPipeline`](clients::mock::MockPipeline) scripts its replies and
//! [`InMemoryPipeline`](clients::InMemoryPipeline) enforces the backend's rules locally.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Each layer defines its own error type ([`TransitionError`](transition::TransitionError),
//! [`PipelineError`](clients::PipelineError), [`DashboardError`](runtime::DashboardError))
//! and converts the one below it with `#[from]`.
//!
//! ### 2. Concurrency Model
//! The store sits behind a `RwLock` that is never held across an `.await`. A periodic
//! refresher runs in its own Tokio task and replaces the store wholesale.
//! Two transitions for the same order are never in flight at once.
//!
//! ### 3. Observability
//! We use `tracing` everywhere with structured logging. See [`runtime::setup_tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Model ([`domain`])
//! Orders, statuses and the employee session, plus lenient decoding of backend records.
//!
//! ### 2. The Store ([`store`])
//! Orders keyed by id with the active status filter.
//! - **Key items**: [`OrderStore`](store::OrderStore), [`StatusFilter`](store::StatusFilter).
//!
//! ### 3. The Engine ([`transition`])
//! Validates a requested stage, submits it and applies the confirmed status.
//! - **Key items**: [`TransitionEngine`](transition::TransitionEngine),
//!   [`TransitionAction`](transition::TransitionAction).
//!
//! ### 4. The Figures ([`analytics`])
//! Per-status counts, delivered revenue, completion and cancellation rates.
//!
//! ### 5. The Interface ([`clients`])
//! The pipeline trait and its HTTP, in-memory and mock implementations.
//!
//! ### 6. The Orchestrator ([`runtime`])
//! [`Dashboard`](runtime::Dashboard) wires everything together for one session
//! and owns the background refresher.
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! # Against the built-in in-memory pipeline
//! RUST_LOG=info cargo run
//!
//! # Against real services
//! DASHBOARD_CONFIG=dashboard.toml cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod analytics;
pub mod clients;
pub mod config;
pub mod domain;
pub mod runtime;
pub mod store;
pub mod transition;
