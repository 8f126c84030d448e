//! CA-trace representations: backbone, trace, tube, cartoon, ribbon, rope.
//!
//! Every kind walks the selected CA atoms chain by chain. `backbone`
//! draws spheres on the CAs joined by cylinders, `trace` draws straight
//! lines, and the remaining kinds sweep a profile along a Hermite spline
//! through the trace.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::Colormaker;
use super::spline::{smooth, spline_points, sweep, ProfileMesh};
use super::{
    set_kind_attribute, DisplayParams, Representation, RepresentationSource,
    StructureSource,
};
use crate::buffer::{Buffer, BufferError, BufferKind};
use crate::data::{flatten_vec3, BondStore, Structure};
use crate::params::{Attribute, ChangeClass, ParamKind, ParamSpec, What};
use crate::picking::Picker;

/// Parameters of the trace representations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackboneParams {
    /// Shared options.
    #[serde(flatten)]
    pub display: DisplayParams,
    /// Tube / sphere radius.
    pub radius: f32,
    /// Profile width relative to its height.
    pub aspect_ratio: f32,
    /// Trace smoothing passes before the spline is built.
    pub smooth: u32,
}

impl Default for BackboneParams {
    fn default() -> Self {
        Self {
            display: DisplayParams::default(),
            radius: 0.3,
            aspect_ratio: 1.0,
            smooth: 0,
        }
    }
}

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new(
        "radius",
        ParamKind::Number { min: 0.01, max: 10.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "aspect_ratio",
        ParamKind::Number { min: 1.0, max: 10.0 },
        ChangeClass::Update(Attribute::Radius),
    ),
    ParamSpec::new(
        "smooth",
        ParamKind::Integer { min: 0, max: 10 },
        ChangeClass::Rebuild,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceKind {
    Backbone,
    Trace,
    Tube,
    Cartoon,
    Ribbon,
    Rope,
}

/// Representation of the CA trace.
#[derive(Debug, Clone)]
pub struct BackboneRepresentation {
    kind: TraceKind,
    params: BackboneParams,
}

/// Selected CA atoms split into chains.
fn chains(source: &StructureSource, sele: &str) -> Vec<Vec<usize>> {
    let structure = source.view.structure();
    let mut out: Vec<Vec<usize>> = Vec::new();
    for atom in source.atoms(sele) {
        if structure.atom_name(atom) != "CA" {
            continue;
        }
        match out.last_mut() {
            Some(chain)
                if chain
                    .last()
                    .is_some_and(|&p| structure.chain(p) == structure.chain(atom)) =>
            {
                chain.push(atom);
            }
            _ => out.push(vec![atom]),
        }
    }
    out
}

impl BackboneRepresentation {
    fn with(kind: TraceKind, params: BackboneParams) -> Self {
        Self { kind, params }
    }

    /// `backbone`: CA spheres and cylinders.
    #[must_use]
    pub fn backbone() -> Self {
        Self::with(
            TraceKind::Backbone,
            BackboneParams {
                radius: 0.25,
                ..BackboneParams::default()
            },
        )
    }

    /// `trace`: straight CA-CA lines.
    #[must_use]
    pub fn trace() -> Self {
        Self::with(TraceKind::Trace, BackboneParams::default())
    }

    /// `tube`: round tube along the spline.
    #[must_use]
    pub fn tube() -> Self {
        Self::with(TraceKind::Tube, BackboneParams::default())
    }

    /// `cartoon`: flattened tube along the spline.
    #[must_use]
    pub fn cartoon() -> Self {
        Self::with(
            TraceKind::Cartoon,
            BackboneParams {
                aspect_ratio: 5.0,
                ..BackboneParams::default()
            },
        )
    }

    /// `ribbon`: flat band along the spline.
    #[must_use]
    pub fn ribbon() -> Self {
        Self::with(
            TraceKind::Ribbon,
            BackboneParams {
                radius: 1.0,
                ..BackboneParams::default()
            },
        )
    }

    /// `rope`: tube along a smoothed trace.
    #[must_use]
    pub fn rope() -> Self {
        Self::with(
            TraceKind::Rope,
            BackboneParams {
                radius: 0.5,
                smooth: 2,
                ..BackboneParams::default()
            },
        )
    }

    fn colormaker(&self, structure: &Structure) -> Colormaker {
        let d = &self.params.display;
        Colormaker::new(d.color_scheme, d.color, structure)
    }

    fn segments(&self, atom_count: usize) -> usize {
        if self.kind == TraceKind::Ribbon {
            2
        } else {
            self.params.display.quality.radial_segments(atom_count) as usize
        }
    }

    /// Swept mesh over every chain with at least two CAs, together with
    /// the CA atom each vertex belongs to.
    fn mesh(&self, source: &StructureSource, chains: &[Vec<usize>]) -> (ProfileMesh, Vec<usize>) {
        let structure = source.view.structure();
        let count = source.view.atom_count();
        let subdiv = self.params.display.quality.subdiv(count) as usize;
        let segments = self.segments(count);
        let mut mesh = ProfileMesh::default();
        let mut vertex_atoms = Vec::new();
        for chain in chains.iter().filter(|c| c.len() >= 2) {
            let trace: Vec<Vec3> = chain.iter().map(|&a| structure.position(a)).collect();
            let trace = smooth(&trace, self.params.smooth as usize);
            let points = spline_points(&trace, subdiv);
            let part = sweep(
                &points,
                segments,
                self.params.radius,
                self.params.aspect_ratio,
                (mesh.position.len() / 3) as u32,
            );
            vertex_atoms.extend(part.control.iter().map(|&c| chain[c]));
            mesh.position.extend(part.position);
            mesh.control.extend(part.control);
            mesh.index.extend(part.index);
        }
        (mesh, vertex_atoms)
    }

    /// CA-CA links as a pseudo bond store.
    fn links(chains: &[Vec<usize>]) -> BondStore {
        let mut store = BondStore::new();
        for chain in chains {
            for pair in chain.windows(2) {
                store.add_bond(pair[0], pair[1], 1);
            }
        }
        store
    }

    fn link_arrays(&self, structure: &Structure, links: &BondStore) -> [Vec<f32>; 4] {
        let colormaker = self.colormaker(structure);
        let mut out: [Vec<f32>; 4] = Default::default();
        for b in 0..links.count() {
            let (a1, a2) = links.atoms(b);
            out[0].extend_from_slice(&structure.position(a1).to_array());
            out[1].extend_from_slice(&structure.position(a2).to_array());
            out[2].extend(colormaker.atom_color(structure, a1));
            out[3].extend(colormaker.atom_color(structure, a2));
        }
        out
    }

    fn create_backbone(&self, src: &StructureSource, chains: &[Vec<usize>]) -> Vec<Buffer> {
        let structure = src.view.structure();
        let d = &self.params.display;
        let params = d.buffer_params(src.view.atom_count());
        let atoms: Vec<usize> = chains.concat();
        let positions: Vec<Vec3> = atoms.iter().map(|&a| structure.position(a)).collect();
        let mut buffers = vec![Buffer::new(BufferKind::Sphere, flatten_vec3(&positions))
            .with_attribute("color", self.colormaker(structure).atom_colors(structure, &atoms))
            .with_attribute("radius", vec![self.params.radius; atoms.len()])
            .with_picker(Picker::Atom {
                structure: Rc::clone(structure),
                array: Some(atoms),
            })
            .with_instances(structure.instances().to_vec())
            .with_params(params.clone())];

        let links = Self::links(chains);
        if links.count() > 0 {
            let [p1, p2, c1, c2] = self.link_arrays(structure, &links);
            buffers.push(
                Buffer::new(BufferKind::Cylinder, p1)
                    .with_attribute("position2", p2)
                    .with_attribute("color", c1)
                    .with_attribute("color2", c2)
                    .with_attribute("radius", vec![self.params.radius; links.count()])
                    .with_picker(Picker::Bond {
                        structure: Rc::clone(structure),
                        bonds: Rc::new(links),
                        array: None,
                    })
                    .with_instances(structure.instances().to_vec())
                    .with_params(params),
            );
        }
        buffers
    }

    fn create_trace(&self, src: &StructureSource, chains: &[Vec<usize>]) -> Vec<Buffer> {
        let structure = src.view.structure();
        let links = Self::links(chains);
        if links.count() == 0 {
            return Vec::new();
        }
        let first_atoms = (0..links.count()).map(|b| links.atoms(b).0).collect();
        let [p1, p2, c1, c2] = self.link_arrays(structure, &links);
        vec![Buffer::new(BufferKind::Line, p1)
            .with_attribute("position2", p2)
            .with_attribute("color", c1)
            .with_attribute("color2", c2)
            .with_picker(Picker::Atom {
                structure: Rc::clone(structure),
                array: Some(first_atoms),
            })
            .with_instances(structure.instances().to_vec())
            .with_params(self.params.display.buffer_params(src.view.atom_count()))]
    }

    fn create_mesh(&self, src: &StructureSource, chains: &[Vec<usize>]) -> Vec<Buffer> {
        let structure = src.view.structure();
        let (mesh, vertex_atoms) = self.mesh(src, chains);
        if mesh.index.is_empty() {
            return Vec::new();
        }
        let colors = self.colormaker(structure).atom_colors(structure, &vertex_atoms);
        vec![Buffer::new(BufferKind::Mesh, mesh.position)
            .with_attribute("color", colors)
            .with_index(mesh.index)
            .with_picker(Picker::Atom {
                structure: Rc::clone(structure),
                array: Some(vertex_atoms),
            })
            .with_instances(structure.instances().to_vec())
            .with_params(self.params.display.buffer_params(src.view.atom_count()))]
    }
}

impl Representation for BackboneRepresentation {
    fn type_name(&self) -> &'static str {
        match self.kind {
            TraceKind::Backbone => "backbone",
            TraceKind::Trace => "trace",
            TraceKind::Tube => "tube",
            TraceKind::Cartoon => "cartoon",
            TraceKind::Ribbon => "ribbon",
            TraceKind::Rope => "rope",
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
        let chains = chains(src, &self.params.display.sele);
        if chains.is_empty() {
            return Vec::new();
        }
        match self.kind {
            TraceKind::Backbone => self.create_backbone(src, &chains),
            TraceKind::Trace => self.create_trace(src, &chains),
            _ => self.create_mesh(src, &chains),
        }
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
        let structure = src.view.structure();
        let chains = chains(src, &self.params.display.sele);
        match self.kind {
            TraceKind::Backbone | TraceKind::Trace => {
                let atoms = chains.concat();
                let links = Self::links(&chains);
                let [p1, p2, c1, c2] = self.link_arrays(structure, &links);
                let link_kind = if self.kind == TraceKind::Trace {
                    BufferKind::Line
                } else {
                    BufferKind::Cylinder
                };
                if what.position {
                    let positions: Vec<Vec3> =
                        atoms.iter().map(|&a| structure.position(a)).collect();
                    let flat = flatten_vec3(&positions);
                    set_kind_attribute(buffers, BufferKind::Sphere, "position", &flat)?;
                    set_kind_attribute(buffers, link_kind, "position", &p1)?;
                    set_kind_attribute(buffers, link_kind, "position2", &p2)?;
                }
                if what.color {
                    let colors = self.colormaker(structure).atom_colors(structure, &atoms);
                    set_kind_attribute(buffers, BufferKind::Sphere, "color", &colors)?;
                    set_kind_attribute(buffers, link_kind, "color", &c1)?;
                    set_kind_attribute(buffers, link_kind, "color2", &c2)?;
                }
                if what.radius && self.kind == TraceKind::Backbone {
                    let r = self.params.radius;
                    let sphere_radii = vec![r; atoms.len()];
                    let link_radii = vec![r; links.count()];
                    set_kind_attribute(buffers, BufferKind::Sphere, "radius", &sphere_radii)?;
                    set_kind_attribute(buffers, BufferKind::Cylinder, "radius", &link_radii)?;
                }
            }
            _ => {
                let (mesh, vertex_atoms) = self.mesh(src, &chains);
                if what.position || what.radius {
                    set_kind_attribute(buffers, BufferKind::Mesh, "position", &mesh.position)?;
                }
                if what.color {
                    let colors = self.colormaker(structure).atom_colors(structure, &vertex_atoms);
                    set_kind_attribute(buffers, BufferKind::Mesh, "color", &colors)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{fixtures, Selection, StructureView};
    use crate::options::Quality;

    fn source(structure: Structure) -> RepresentationSource {
        RepresentationSource::Structure(StructureSource::new(StructureView::new(
            Rc::new(structure),
            &Selection::all(),
        )))
    }

    #[test]
    fn backbone_joins_consecutive_cas() {
        let buffers = BackboneRepresentation::backbone().create(&source(fixtures::peptide(4)));
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0].count(), 4);
        assert_eq!(buffers[1].count(), 3);
    }

    #[test]
    fn chains_are_not_joined() {
        let src = source(fixtures::peptide_with_ligand(3));
        let RepresentationSource::Structure(s) = &src else {
            unreachable!()
        };
        assert_eq!(chains(s, ""), vec![vec![1, 4, 7]]);
    }

    #[test]
    fn single_ca_has_no_trace() {
        let single = source(fixtures::ca_trace(1));
        assert!(BackboneRepresentation::trace().create(&single).is_empty());
        assert!(BackboneRepresentation::cartoon().create(&single).is_empty());
    }

    #[test]
    fn mesh_vertices_map_to_cas() {
        let mut repr = BackboneRepresentation::tube();
        repr.params.display.quality = Quality::Low;
        let buffers = repr.create(&source(fixtures::ca_trace(3)));
        assert_eq!(buffers.len(), 1);
        let b = &buffers[0];
        let points = 2 * Quality::Low.subdiv(0) as usize + 1;
        let segments = Quality::Low.radial_segments(0) as usize;
        assert_eq!(b.count(), points * segments);
        let array = b.picker().and_then(|p| p.array()).map(<[usize]>::len);
        assert_eq!(array, Some(b.count()));
    }

    #[test]
    fn radius_update_moves_mesh_vertices() {
        let src = source(fixtures::ca_trace(4));
        let mut repr = BackboneRepresentation::cartoon();
        let mut buffers = repr.create(&src);
        let before = buffers[0].attribute("position").map(<[f32]>::to_vec);
        repr.params.radius = 0.6;
        let what = What {
            radius: true,
            ..What::default()
        };
        repr.update(&src, what, &mut buffers).unwrap();
        assert_ne!(buffers[0].attribute("position").map(<[f32]>::to_vec), before);
    }

    #[test]
    fn ribbon_is_a_flat_band() {
        let buffers = BackboneRepresentation::ribbon().create(&source(fixtures::ca_trace(2)));
        let points = Quality::Medium.subdiv(0) as usize + 1;
        assert_eq!(buffers[0].count(), points * 2);
    }
}
