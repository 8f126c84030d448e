//! Representations: geometry built from a data object and a parameter set.
//!
//! A [`Representation`] is a renderer-independent recipe. Given a
//! [`RepresentationSource`] it creates a list of [`Buffer`]s, and after a
//! parameter change it either rewrites those buffers in place (colors,
//! radii, label sizes) or is asked to create them again. Which of the two
//! happens is declared per parameter in the kind's [`ParamSpec`] table.
//!
//! The shipped kinds are registered by name in a
//! [`RepresentationRegistry`]:
//!
//! | name | source | geometry |
//! |------|--------|----------|
//! | `spacefill`, `ball+stick`, `licorice`, `hyperball` | structure | atoms and bonds |
//! | `backbone`, `trace`, `tube`, `cartoon`, `ribbon`, `rope` | structure | CA trace |
//! | `distance` | structure | atom-pair cylinders and labels |
//! | `contact` | structure | polar contact cylinders |
//! | `validation` | structure with a report | clash cylinders |
//! | `trajectory` | structure with a trajectory | atom path |
//! | `surface` | surface | mesh |
//! | `dot` | volume | voxel points |
//! | `slice` | volume | image plane |
//! | `buffer` | shape | shape primitives |

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::buffer::{Buffer, BufferError, BufferKind, BufferParams};
use crate::data::{Selection, Shape, StructureView, Surface, Trajectory, Validation, Volume};
use crate::error::StageError;
use crate::options::Quality;
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};

/// Implements the parameter plumbing of [`Representation`] for a kind that
/// stores its options in `self.params` with a flattened `display` field.
macro_rules! params_accessors {
    () => {
        fn parameters(&self) -> serde_json::Map<String, serde_json::Value> {
            $crate::params::to_map(&self.params)
        }

        fn merge_parameters(
            &mut self,
            patch: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<(), $crate::error::StageError> {
            $crate::params::merge(&mut self.params, patch)
        }

        fn display(&self) -> &$crate::representation::DisplayParams {
            &self.params.display
        }

        fn display_mut(&mut self) -> &mut $crate::representation::DisplayParams {
            &mut self.params.display
        }
    };
}

mod atoms;
mod backbone;
pub mod color;
mod contact;
mod distance;
mod registry;
mod shape;
mod slice;
mod spline;
mod surface;
mod trajectory;
mod validation;

pub use atoms::{AtomParams, AtomRepresentation, RadiusType};
pub use backbone::{BackboneParams, BackboneRepresentation};
pub use color::ColorScheme;
pub use contact::{ContactParams, ContactRepresentation};
pub use distance::{DistanceParams, DistanceRepresentation};
pub use registry::{RepresentationFactory, RepresentationRegistry};
pub use shape::{ShapeParams, ShapeRepresentation};
pub use slice::{Dimension, SliceParams, SliceRepresentation, FILTERS};
pub use surface::{
    DotParams, DotRepresentation, SurfaceParams, SurfaceRepresentation, ThresholdType,
};
pub use trajectory::{TrajectoryParams, TrajectoryRepresentation};
pub use validation::{ValidationParams, ValidationRepresentation};

/// Kinds that can draw raycasted impostors. `set_impostor` rebuilds them;
/// `set_quality` only touches them when impostors are off.
pub const IMPOSTOR_TYPES: &[&str] = &[
    "spacefill",
    "ball+stick",
    "licorice",
    "hyperball",
    "backbone",
    "rocket",
    "contact",
    "distance",
    "dot",
    "helixorient",
];

/// Kinds whose geometry depends only on quality.
pub const QUALITY_TYPES: &[&str] = &["tube", "cartoon", "ribbon", "trace", "rope"];

/// Options shared by every representation kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayParams {
    /// Tessellation detail.
    pub quality: Quality,
    /// Draw tessellated geometry even where impostors are possible.
    pub disable_impostor: bool,
    /// 0.0 (transparent) to 1.0 (opaque).
    pub opacity: f32,
    /// Draw triangle edges only.
    pub wireframe: bool,
    /// Color used by the `uniform` scheme.
    pub color: [f32; 3],
    /// Coloring scheme.
    pub color_scheme: ColorScheme,
    /// Atom selection the representation is restricted to.
    pub sele: String,
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self {
            quality: Quality::Medium,
            disable_impostor: false,
            opacity: 1.0,
            wireframe: false,
            color: [0.9, 0.9, 0.9],
            color_scheme: ColorScheme::Element,
            sele: String::new(),
        }
    }
}

impl DisplayParams {
    /// Parsed `sele`.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::new(&self.sele)
    }

    /// Buffer parameters for an object with `atom_count` atoms.
    #[must_use]
    pub fn buffer_params(&self, atom_count: usize) -> BufferParams {
        BufferParams {
            opacity: self.opacity,
            wireframe: self.wireframe,
            impostor: !self.disable_impostor,
            radial_segments: self.quality.radial_segments(atom_count),
            sphere_detail: self.quality.sphere_detail(atom_count),
            ..BufferParams::default()
        }
    }
}

/// Declared table for [`DisplayParams`].
pub const DISPLAY_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("quality", ParamKind::Select(&Quality::ALL), ChangeClass::Rebuild),
    ParamSpec::new("disable_impostor", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new(
        "opacity",
        ParamKind::Number { min: 0.0, max: 1.0 },
        ChangeClass::Buffer,
    ),
    ParamSpec::new("wireframe", ParamKind::Bool, ChangeClass::Buffer),
    ParamSpec::new("color", ParamKind::Color, ChangeClass::Update(Attribute::Color)),
    ParamSpec::new(
        "color_scheme",
        ParamKind::Select(&ColorScheme::ALL),
        ChangeClass::Update(Attribute::Color),
    ),
    ParamSpec::new("sele", ParamKind::Text, ChangeClass::Rebuild),
];

/// Structure data a representation reads from.
#[derive(Debug, Clone)]
pub struct StructureSource {
    /// Atoms the owning component exposes.
    pub view: StructureView,
    /// Validation report attached to the structure.
    pub validation: Option<Rc<Validation>>,
    /// Trajectory, for representations owned by a trajectory attachment.
    pub trajectory: Option<Rc<Trajectory>>,
}

impl StructureSource {
    /// Source over `view` without report or trajectory.
    #[must_use]
    pub fn new(view: StructureView) -> Self {
        Self {
            view,
            validation: None,
            trajectory: None,
        }
    }

    /// Atoms of the view matching `sele`, ascending.
    #[must_use]
    pub fn atoms(&self, sele: &str) -> Vec<usize> {
        self.view.atom_indices(&Selection::new(sele))
    }
}

/// The data object a representation is built from.
#[derive(Debug, Clone)]
pub enum RepresentationSource {
    /// A structure view.
    Structure(StructureSource),
    /// A triangulated surface.
    Surface(Rc<Surface>),
    /// A volumetric grid.
    Volume(Rc<Volume>),
    /// Shape primitives.
    Shape(Rc<Shape>),
}

impl RepresentationSource {
    /// Structure part, if this is a structure source.
    #[must_use]
    pub fn structure(&self) -> Option<&StructureSource> {
        match self {
            Self::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Size used to resolve `auto` quality.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        match self {
            Self::Structure(s) => s.view.atom_count(),
            Self::Surface(s) => s.vertex_count(),
            Self::Volume(v) => v.voxel_count(),
            Self::Shape(_) => 0,
        }
    }
}

/// A representation kind.
pub trait Representation: fmt::Debug {
    /// Registered name, e.g. `"cartoon"`.
    fn type_name(&self) -> &'static str;

    /// Kind-specific parameter table. [`DISPLAY_PARAMS`] applies to every
    /// kind in addition.
    fn param_specs(&self) -> &'static [ParamSpec];

    /// Current parameters as a JSON object.
    fn parameters(&self) -> Map<String, Value>;

    /// Merge an already validated patch.
    fn merge_parameters(&mut self, patch: &Map<String, Value>) -> Result<(), StageError>;

    /// Shared options.
    fn display(&self) -> &DisplayParams;

    /// Mutable shared options.
    fn display_mut(&mut self) -> &mut DisplayParams;

    /// Whether this kind can be built from `source`.
    fn supports(&self, source: &RepresentationSource) -> bool;

    /// Build every buffer from scratch.
    fn create(&self, source: &RepresentationSource) -> Vec<Buffer>;

    /// Rewrite the attribute groups in `what` of buffers previously
    /// returned by [`Representation::create`]. Must not change any
    /// attribute length; returns an error when that would be required.
    fn update(
        &self,
        source: &RepresentationSource,
        what: What,
        buffers: &mut [Buffer],
    ) -> Result<(), BufferError>;

    /// Apply buffer-class parameters to a built buffer.
    fn apply_buffer_params(&self, buffer: &mut Buffer) {
        let d = self.display();
        let p = buffer.params_mut();
        p.opacity = d.opacity;
        p.wireframe = d.wireframe;
    }

    /// Whether a buffer is drawn when the representation itself is visible.
    fn buffer_visible(&self, _buffer: &Buffer) -> bool {
        true
    }
}

/// Replace one attribute of every buffer of `kind`.
pub(crate) fn set_kind_attribute(
    buffers: &mut [Buffer],
    kind: BufferKind,
    name: &str,
    values: &[f32],
) -> Result<(), BufferError> {
    for b in buffers.iter_mut().filter(|b| b.kind() == kind) {
        b.set_attribute(name, values.to_vec())?;
    }
    Ok(())
}
