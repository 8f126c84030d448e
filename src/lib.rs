// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Component, representation and picking core for interactive molecular
//! visualization.
//!
//! A [`stage::Stage`] owns components wrapping loaded data (structures,
//! surfaces, volumes, shapes, scripts). Each component carries
//! representations that turn its data into display [`buffer::Buffer`]s and
//! mirror them into a [`viewer::Viewer`] backend. Picking runs the other way:
//! the viewer reports a buffer and a pick id, the buffer's
//! [`picking::Picker`] resolves it to an atom, bond, voxel or shape
//! primitive, and [`picking::PickingControls`] wraps the result in a
//! [`picking::PickingProxy`].
//!
//! # Key entry points
//!
//! - [`stage::Stage`] - components, global parameters, loading, mouse wiring
//! - [`component::Component`] - one loaded object with its representations
//!   and trajectories
//! - [`representation::RepresentationRegistry`] - the representation kinds
//! - [`options::StageParameters`] - global settings with TOML presets
//! - [`viewer::HeadlessViewer`] - a backend without a GPU
//!
//! Everything is single-threaded: components share the stage context
//! through `Rc`, and loads are futures driven on the embedder's executor.

pub mod buffer;
pub mod component;
pub mod data;
pub mod error;
pub mod input;
pub mod options;
pub mod params;
pub mod picking;
pub mod representation;
pub mod signal;
pub mod stage;
pub mod viewer;
