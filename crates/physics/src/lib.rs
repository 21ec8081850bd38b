#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Compiled Runtime
//!
//! The expensive half of the document/runtime pair. [`PhysicsSim::build`]
//! compiles a [`scene::SceneDocument`] snapshot into flat, index-addressed
//! arrays and a binding table from document nodes to those arrays. The
//! result never changes shape afterwards: reflecting a document edit means
//! building a new runtime.
//!
//! ## Key Components
//!
//! -   **Build:** [`PhysicsSim::build`] in the [`builder`] module validates
//!     every node and reports the first problem as a [`BuildError`].
//! -   **Simulation:** [`PhysicsSim::step`] in the [`simulation`] module
//!     integrates spring-driven hinge and slide joints and free bodies,
//!     then recomputes world poses and contacts.
//! -   **Queries:** positions, orientations, colours, joint state and
//!     contacts are all looked up by [`scene::NodeId`].
//!
//! ```rust,ignore
//! use physics::PhysicsSim;
//! use scene::SceneDocument;
//!
//! let doc = SceneDocument::from_path("scene.json")?;
//! let mut sim = PhysicsSim::build(&doc)?;
//! sim.step_n(100);
//! ```

pub mod builder;
pub mod collision;
pub mod error;
pub mod integrator;
pub mod simulation;
pub mod transform;
pub mod types;

pub use error::BuildError;
pub use glam::{Quat, Vec3};
pub use simulation::PhysicsSim;
pub use types::{
    from_wxyz, wxyz, Binding, Body, BodyPose, BuildId, Camera, Contact, Geom, GeomType, Joint,
    JointType, Light, Site,
};
