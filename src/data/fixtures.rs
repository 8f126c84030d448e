//! Small synthetic data objects shared by unit tests.

use glam::{Mat4, Vec3};

use super::{
    AtomRecord, Clash, Shape, Structure, StructureBuilder, Surface, Trajectory,
    Validation, Volume,
};

/// CA spacing along x, in angstroms.
pub const CA_SPACING: f32 = 3.8;

fn atom(name: &str, resno: i32, position: Vec3) -> AtomRecord {
    AtomRecord {
        name: name.to_owned(),
        resname: "ALA".to_owned(),
        resno,
        chain: "A".to_owned(),
        element: name[..1].to_owned(),
        hetero: false,
        position,
    }
}

fn ca_position(resno: i32) -> Vec3 {
    Vec3::new(CA_SPACING * (resno - 1) as f32, 0.0, 0.0)
}

fn add_peptide(b: &mut StructureBuilder, residues: i32) {
    let mut prev_c = None;
    for resno in 1..=residues {
        let ca = ca_position(resno);
        let n = b.add_atom(atom("N", resno, ca - Vec3::new(1.0, 0.5, 0.0)));
        let a = b.add_atom(atom("CA", resno, ca));
        let c = b.add_atom(atom("C", resno, ca + Vec3::new(1.0, 0.5, 0.0)));
        if let Some(prev) = prev_c {
            let _ = b.add_bond(prev, n, 1);
        }
        let _ = b.add_bond(n, a, 1).add_bond(a, c, 1);
        prev_c = Some(c);
    }
}

/// `residues` residues with atoms N, CA, C each, bonded as a chain.
pub fn peptide(residues: i32) -> Structure {
    let mut b = StructureBuilder::new("peptide");
    add_peptide(&mut b, residues);
    b.build()
}

/// [`peptide`] followed by a two-atom hetero ligand.
pub fn peptide_with_ligand(residues: i32) -> Structure {
    let mut b = StructureBuilder::new("complex");
    add_peptide(&mut b, residues);
    let lig = |name: &str, position: Vec3| AtomRecord {
        name: name.to_owned(),
        resname: "LIG".to_owned(),
        resno: 900,
        chain: "B".to_owned(),
        element: "C".to_owned(),
        hetero: true,
        position,
    };
    let l1 = b.add_atom(lig("C1", Vec3::new(0.0, 5.0, 0.0)));
    let l2 = b.add_atom(lig("C2", Vec3::new(1.5, 5.0, 0.0)));
    let _ = b.add_bond(l1, l2, 2);
    b.build()
}

/// `residues` residues with a single CA atom each (one atom per residue).
pub fn ca_trace(residues: i32) -> Structure {
    let mut b = StructureBuilder::new("trace");
    for resno in 1..=residues {
        let _ = b.add_atom(atom("CA", resno, ca_position(resno)));
    }
    b.build()
}

/// Shape with one primitive of every kind.
pub fn shape() -> Shape {
    let mut s = Shape::new("shape");
    s.add_sphere(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 0.0, 0.0), 1.5, "sphere");
    s.add_cylinder(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::ONE, 0.5, "cyl");
    s.add_cone(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), Vec3::ONE, 1.0, "cone");
    s.add_arrow(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 6.0), Vec3::ONE, 0.2, "arrow");
    s.add_ellipsoid(
        Vec3::new(5.0, 5.0, 5.0),
        Vec3::ONE,
        2.0,
        Vec3::X,
        Vec3::Y,
        "ellipsoid",
    );
    s.add_mesh(
        vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0],
        vec![1.0; 9],
        vec![0, 1, 2],
        "triangle",
    );
    s
}

/// 4x3x2 grid with values equal to the flat index, scaled by 2 angstroms.
pub fn volume() -> Volume {
    let data = (0..24).map(|i| i as f32).collect();
    Volume::new("density", 4, 3, 2, data, Mat4::from_scale(Vec3::splat(2.0)))
}

/// A single triangle surface.
pub fn surface() -> Surface {
    Surface::new(
        "surf",
        vec![0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0, 0.0],
        vec![0, 1, 2],
    )
}

/// Validation report with one clash between residue 1 N and residue 2 C.
pub fn validation() -> Validation {
    Validation::new(
        "validation",
        vec![Clash {
            sele1: "1.N".to_owned(),
            sele2: "2.C".to_owned(),
        }],
    )
}

/// `frames` frames of `structure`, each shifted by `frame * 1.0` along z.
pub fn trajectory(structure: &Structure, frames: usize) -> Trajectory {
    let frames = (0..frames)
        .map(|f| {
            structure
                .positions()
                .iter()
                .map(|p| *p + Vec3::Z * f as f32)
                .collect()
        })
        .collect();
    Trajectory::new("traj", frames)
}
