#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Lazy Simulation Session
//!
//! Reconciles a freely edited [`scene::SceneDocument`] with the expensive
//! [`physics::PhysicsSim`] compiled from it. Edits only flag the compiled
//! state as stale; the runtime is rebuilt once, on the next request, no
//! matter how many edits happened in between.
//!
//! ## Key Components
//!
//! -   **[`Session`]:** the single owner of the document, the runtime, the
//!     asset caches and the live view. [`Session::edit`] is the only way to
//!     mutate the document and [`Session::runtime`] the only way to obtain a
//!     runtime, so neither can drift out of sync unnoticed.
//! -   **[`AssetCache`]:** FIFO, capacity-bounded deduplication of the
//!     document nodes derived from texture and mesh files. Evicted entries
//!     are removed from the document, which in turn invalidates the runtime.
//! -   **[`LiveView`]:** the seam to an external viewer. A passive viewer is
//!     hot-swapped onto a rebuilt runtime by [`Session::sync`] after edits.
//! -   **[`elements`]:** typed handles (`Body`, `Geom`, `Joint`, `Site`,
//!     `Light`, `Camera`) whose setters go through [`Session::edit`].
//!
//! ```rust,ignore
//! use session::{elements::{Geom, GeomOptions}, Session, SessionConfig};
//!
//! let mut session = Session::from_path("scene.json", &SessionConfig::default())?;
//! let cube = Geom::create(&mut session, None, &GeomOptions::default())?;
//! session.step_n(100)?; // one rebuild, then 100 steps
//! ```

pub mod asset_cache;
pub mod assets;
pub mod config;
mod controller;
pub mod elements;
pub mod error;
pub mod live_view;
pub mod session;

pub use asset_cache::{AssetCache, AssetKey, AssetKind, CacheWarning, DerivedAsset, StoreOutcome};
pub use assets::{MeshOptions, TextureMapping, TextureOptions};
pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use live_view::{HeadlessViewer, LaunchMode, LiveView, ViewState, ViewerError, ViewerProbe, ViewerStats};
pub use session::{LoadOptions, Session};
