#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # lazysim
//!
//! Headless driver for the lazy simulation stack.
//!
//! ## The Crates
//!
//! -   **[`scene`]:** the editable scene document and its JSON description
//!     format.
//! -   **[`physics`]:** the runtime compiled from a document snapshot.
//! -   **[`session`]:** keeps the two in sync, caches derived assets and
//!     hot-swaps an attached viewer onto rebuilt runtimes.
//!
//! The `lazysim` binary loads a scene, attaches a headless viewer, spawns
//! cubes while stepping and re-syncs the viewer after every step. Files
//! below the asset directory are watched so edited textures and meshes are
//! evicted from the caches and picked up on the next rebuild.

pub mod app;
pub mod watcher;

pub use physics;
pub use scene;
pub use session;
