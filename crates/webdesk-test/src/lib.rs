//! WebDesk Test - Shared test utilities for the desktop host.
//!
//! This crate provides manifest fixtures, mock storage providers and a
//! booted-desktop harness that can be used across the workspace as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! webdesk-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use webdesk_test::{TestDesk, calc_manifest};
//!
//! #[tokio::test]
//! async fn test_calc_launches() {
//!     let desk = TestDesk::boot().await;
//!     desk.handle.install(calc_manifest()).await.unwrap();
//!     let app = desk.launch("calc").await.unwrap();
//!     assert_eq!(app.process.app_id.as_str(), "calc");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
