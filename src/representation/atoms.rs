//! Atom-based representations: spacefill, ball+stick, licorice, hyperball.
//!
//! All four draw one sphere per selected atom. Everything but spacefill
//! also draws one cylinder per bond whose atoms are both selected. They
//! differ only in how sphere and bond radii are derived.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::color::Colormaker;
use super::{
    set_kind_attribute, DisplayParams, Representation, RepresentationSource,
    StructureSource,
};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{flatten_vec3, Structure};
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;

/// Where sphere radii come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RadiusType {
    /// Van der Waals radius of the element.
    Vdw,
    /// Covalent radius of the element.
    Covalent,
    /// The `size` parameter.
    Size,
}

impl RadiusType {
    const ALL: [&'static str; 3] = ["vdw", "covalent", "size"];
}

fn vdw_radius(element: &str) -> f32 {
    match element.to_ascii_uppercase().as_str() {
        "H" => 1.1,
        "C" => 1.7,
        "N" => 1.55,
        "O" => 1.52,
        "S" => 1.8,
        "P" => 1.8,
        _ => 2.0,
    }
}

fn covalent_radius(element: &str) -> f32 {
    match element.to_ascii_uppercase().as_str() {
        "H" => 0.31,
        "C" => 0.76,
        "N" => 0.71,
        "O" => 0.66,
        "S" => 1.05,
        "P" => 1.07,
        _ => 1.5,
    }
}

/// Parameters of the atom representations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AtomParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Radius source for spheres.
    pub radius_type: RadiusType,
    /// Sphere radius for `size`, and bond radius.
    pub size: f32,
    /// Factor on every sphere radius.
    pub scale: f32,
    /// Sphere radius relative to the bond radius.
    pub aspect_ratio: f32,
}

impl Default for AtomParams {
    fn default() -> Self {
        Self {
            display: DisplayParams::default(),
            radius_type: RadiusType::Size,
            size: 0.15,
            scale: 1.0,
            aspect_ratio: 1.0,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new(
        "radius_type",
        ParamKind::Select(&RadiusType::ALL),
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "size",
        ParamKind::Number { min: 0.001, max: 10.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "scale",
        ParamKind::Number { min: 0.001, max: 10.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "aspect_ratio",
        ParamKind::Number { min: 1.0, max: 10.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomKind {
    Spacefill,
    BallAndStick,
    Licorice,
    Hyperball,
}

/// Sphere (and bond) representation of atoms.
#[derive(Debug, Clone)]
pub struct AtomRepresentation {
    kind: AtomKind,
    params: AtomParams,
}

impl AtomRepresentation {
    fn with(kind: AtomKind, params: AtomParams) -> Self {
        Self { kind, params }
    }

    /// `spacefill`: van der Waals spheres, no bonds.
    #[must_use]
    pub fn spacefill() -> Self {
        Self::with(
            AtomKind::Spacefill,
            AtomParams {
                radius_type: RadiusType::Vdw,
                ..AtomParams::default()
            },
        )
    }

    /// `ball+stick`: small spheres twice the bond radius.
    #[must_use]
    pub fn ball_and_stick() -> Self {
        Self::with(
            AtomKind::BallAndStick,
            AtomParams {
                aspect_ratio: 2.0,
                ..AtomParams::default()
            },
        )
    }

    /// `licorice`: spheres as wide as the bonds.
    #[must_use]
    pub fn licorice() -> Self {
        Self::with(
            AtomKind::Licorice,
            AtomParams {
                size: 0.2,
                ..AtomParams::default()
            },
        )
    }

    /// `hyperball`: scaled van der Waals spheres with thin bonds.
    #[must_use]
    pub fn hyperball() -> Self {
        Self::with(
            AtomKind::Hyperball,
            AtomParams {
                radius_type: RadiusType::Vdw,
                scale: 0.2,
                ..AtomParams::default()
            },
        )
    }

    fn draws_bonds(&self) -> bool {
        self.kind != AtomKind::Spacefill
    }

    fn sphere_radius(&self, structure: &Structure, atom: usize) -> f32 {
        let p = &self.params;
        let base = match p.radius_type {
            RadiusType::Vdw => vdw_radius(structure.element(atom)),
            RadiusType::Covalent => covalent_radius(structure.element(atom)),
            RadiusType::Size => p.size * p.aspect_ratio,
        };
        base * p.scale
    }

    fn radii(&self, structure: &Structure, atoms: &[usize]) -> Vec<f32> {
        atoms.iter().map(|&a| self.sphere_radius(structure, a)).collect()
    }

    fn colormaker(&self, structure: &Structure) -> Colormaker {
        let d = &self.params.display;
        Colormaker::new(d.color_scheme, d.color, structure)
    }

    fn bond_arrays(&self, source: &StructureSource, bonds: &[usize]) -> BondArrays {
        let structure = source.view.structure();
        let store = structure.bonds();
        let colormaker = self.colormaker(structure);
        let mut out = BondArrays::default();
        for &b in bonds {
            let (a1, a2) = store.atoms(b);
            out.position1.extend_from_slice(&structure.position(a1).to_array());
            out.position2.extend_from_slice(&structure.position(a2).to_array());
            out.color1.extend(colormaker.atom_color(structure, a1));
            out.color2.extend(colormaker.atom_color(structure, a2));
        }
        out.radius = vec![self.params.size; bonds.len()];
        out
    }
}

#[derive(Debug, Default)]
struct BondArrays {
    position1: Vec<f32>,
    position2: Vec<f32>,
    color1: Vec<f32>,
    color2: Vec<f32>,
    radius: Vec<f32>,
}

impl Representation for AtomRepresentation {
    fn type_name(&self) -> &'static str {
        match self.kind {
            AtomKind::Spacefill => "spacefill",
            AtomKind::BallAndStick => "ball+stick",
            AtomKind::Licorice => "licorice",
            AtomKind::Hyperball => "hyperball",
        }
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    params_accessors!();

    fn supports(&self, source: &RepresentationSource) -> bool {
        source.structure().is_some()
    }

    fn create(&self, source: &RepresentationSource) -> Vec<Buffer> {
        let Some(src) = source.structure() else {
            return Vec::new();
        };
        let d = &self.params.display;
        let atoms = src.atoms(&d.sele);
        if atoms.is_empty() {
            return Vec::new();
        }
        let structure = src.view.structure();
        let params = d.buffer_params(src.view.atom_count());
        let positions: Vec<_> = atoms.iter().map(|&a| structure.position(a)).collect();

        let spheres = Buffer::new(BufferKind::Sphere, flatten_vec3(&positions))
            .with_attribute("color", self.colormaker(structure).atom_colors(structure, &atoms))
            .with_attribute("radius", self.radii(structure, &atoms))
            .with_picker(Picker::Atom {
                structure: Rc::clone(structure),
                array: Some(atoms.clone()),
            })
            .with_instances(structure.instances().to_vec())
            .with_params(params.clone());
        let mut buffers = vec![spheres];

        if self.draws_bonds() {
            let bonds = src.view.bonds_within(&atoms);
            if !bonds.is_empty() {
                let a = self.bond_arrays(src, &bonds);
                buffers.push(
                    Buffer::new(BufferKind::Cylinder, a.position1)
                        .with_attribute("position2", a.position2)
                        .with_attribute("color", a.color1)
                        .with_attribute("color2", a.color2)
                        .with_attribute("radius", a.radius)
                        .with_picker(Picker::Bond {
                            structure: Rc::clone(structure),
                            bonds: Rc::clone(structure.bonds()),
                            array: Some(bonds),
                        })
                        .with_instances(structure.instances().to_vec())
                        .with_params(params),
                );
            }
        }
        buffers
    }

    fn update(
        &self,
        source: &RepresentationSource,
        what: What,
        buffers: &mut [Buffer],
    ) -> Result<(), BufferError> {
        let Some(src) = source.structure() else {
            return Ok(());
        };
        let atoms = src.atoms(&self.params.display.sele);
        let structure = src.view.structure();

        if what.position {
            let positions: Vec<_> = atoms.iter().map(|&a| structure.position(a)).collect();
            set_kind_attribute(buffers, BufferKind::Sphere, "position", &flatten_vec3(&positions))?;
        }
        if what.color {
            let colors = self.colormaker(structure).atom_colors(structure, &atoms);
            set_kind_attribute(buffers, BufferKind::Sphere, "color", &colors)?;
        }
        if what.radius {
            let radii = self.radii(structure, &atoms);
            set_kind_attribute(buffers, BufferKind::Sphere, "radius", &radii)?;
        }

        if !self.draws_bonds() || !(what.position || what.color || what.radius) {
            return Ok(());
        }
        let a = self.bond_arrays(src, &src.view.bonds_within(&atoms));
        if what.position {
            set_kind_attribute(buffers, BufferKind::Cylinder, "position", &a.position1)?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "position2", &a.position2)?;
        }
        if what.color {
            set_kind_attribute(buffers, BufferKind::Cylinder, "color", &a.color1)?;
            set_kind_attribute(buffers, BufferKind::Cylinder, "color2", &a.color2)?;
        }
        if what.radius {
            set_kind_attribute(buffers, BufferKind::Cylinder, "radius", &a.radius)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures, Selection, StructureView};
    use crate::representation::{ColorScheme, StructureSource};

    fn source(residues: i32) -> RepresentationSource {
        let s = Rc::new(fixtures::peptide(residues));
        RepresentationSource::Structure(StructureSource::new(StructureView::new(
            s,
            &Selection::all(),
        )))
    }

    #[test]
    fn spacefill_draws_only_spheres() {
        let buffers = AtomRepresentation::spacefill().create(&source(2));
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].kind(), BufferKind::Sphere);
        assert_eq!(buffers[0].count(), 6);
        assert_eq!(buffers[0].attribute("radius").map(|r| r[0]), Some(1.55));
    }

    #[test]
    fn ball_and_stick_draws_bonds() {
        let buffers = AtomRepresentation::ball_and_stick().create(&source(2));
        assert_eq!(buffers.len(), 2);
        // N-CA, CA-C per residue plus one peptide bond
        assert_eq!(buffers[1].count(), 5);
        assert_eq!(buffers[0].attribute("radius").map(|r| r[0]), Some(0.3));
        assert_eq!(buffers[1].picker().map(|p| p.picker_type().as_str()), Some("bond"));
    }

    #[test]
    fn empty_selection_builds_nothing() {
        let mut repr = AtomRepresentation::licorice();
        repr.params.display.sele = "hetero".into();
        assert!(repr.create(&source(2)).is_empty());
    }

    #[test]
    fn color_update_keeps_lengths() {
        let src = source(3);
        let mut repr = AtomRepresentation::ball_and_stick();
        let mut buffers = repr.create(&src);
        let before: Vec<_> = buffers.iter().map(Buffer::attribute_lengths).collect();
        repr.params.display.color_scheme = ColorScheme::Uniform;
        repr.params.display.color = [0.0, 1.0, 0.0];
        let what = What {
            color: true,
            ..What::default()
        };
        repr.update(&src, what, &mut buffers).unwrap();
        let after: Vec<_> = buffers.iter().map(Buffer::attribute_lengths).collect();
        assert_eq!(before, after);
        assert_eq!(buffers[0].attribute("color").map(|c| &c[..3]), Some(&[0.0, 1.0, 0.0][..]));
    }

    #[test]
    fn radius_update_rescales_spheres() {
        let src = source(1);
        let mut repr = AtomRepresentation::licorice();
        let mut buffers = repr.create(&src);
        repr.params.size = 0.5;
        let what = What {
            radius: true,
            ..What::default()
        };
        repr.update(&src, what, &mut buffers).unwrap();
        assert_eq!(buffers[0].attribute("radius"), Some(&[0.5, 0.5, 0.5][..]));
        assert_eq!(buffers[1].attribute("radius"), Some(&[0.5, 0.5][..]));
    }
}
