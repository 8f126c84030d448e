//! Representations added after a load when `default_representation` is set.

use rustc_hash::FxHashSet;
use serde_json::{Map, Value};

use super::Stage;
use crate::component::{ComponentData, ComponentId};
use crate::data::{Selection, Structure};

type Plan = Vec<(&'static str, Map<String, Value>)>;

fn params(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Atom count weighted for rendering cost. Coarse (backbone-only) models
/// count ten times.
fn weighted_size(structure: &Structure) -> usize {
    let atoms = structure.atom_count();
    let size = atoms * structure.instances().len().max(1);
    if atoms < 2 * structure.residue_count() {
        size * 10
    } else {
        size
    }
}

/// Color by residue index for single-chain polymers, by chain otherwise.
fn polymer_color_scheme(structure: &Structure) -> &'static str {
    let polymer = Selection::new("polymer");
    let chains: FxHashSet<&str> = structure
        .atom_indices(&polymer)
        .into_iter()
        .map(|i| structure.chain(i))
        .collect();
    if chains.len() == 1 {
        "residueindex"
    } else {
        "chainname"
    }
}

fn structure_plan(structure: &Structure) -> Plan {
    let size = weighted_size(structure);
    if size > 250_000 {
        // Line-only CA backbone.
        return vec![("trace", Map::new())];
    }
    if size > 100_000 {
        return vec![(
            "backbone",
            params(&[
                ("quality", Value::from("low")),
                ("disable_impostor", Value::Bool(true)),
            ]),
        )];
    }
    if size > 80_000 {
        return vec![("backbone", Map::new())];
    }
    vec![
        (
            "cartoon",
            params(&[
                ("color_scheme", Value::from(polymer_color_scheme(structure))),
                ("aspect_ratio", Value::from(5.0)),
                ("quality", Value::from("auto")),
            ]),
        ),
        (
            "ball+stick",
            params(&[
                ("sele", Value::from("hetero and not water")),
                ("color_scheme", Value::from("element")),
                ("aspect_ratio", Value::from(1.5)),
                ("quality", Value::from("auto")),
            ]),
        ),
    ]
}

fn plan(data: &ComponentData) -> Plan {
    match data {
        ComponentData::Structure(s) => structure_plan(&s.structure),
        ComponentData::Surface(_) => vec![("surface", Map::new())],
        ComponentData::Volume(_) => vec![("dot", Map::new())],
        _ => Vec::new(),
    }
}

/// Add the default representations for component `id` and center the view.
pub(super) fn apply(stage: &mut Stage, id: ComponentId) {
    let Some(component) = stage.component_mut(id) else {
        return;
    };
    for (kind, p) in plan(component.data()) {
        if component.add_representation(kind, &p).is_none() {
            log::warn!("default '{kind}' representation could not be added");
        }
    }
    stage.center_view(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn kinds(plan: &Plan) -> Vec<&'static str> {
        plan.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn small_protein_gets_cartoon_and_ligands() {
        let s = fixtures::peptide_with_ligand(20);
        let plan = structure_plan(&s);
        assert_eq!(kinds(&plan), ["cartoon", "ball+stick"]);
        assert_eq!(plan[0].1["color_scheme"], "residueindex");
        assert_eq!(plan[1].1["sele"], "hetero and not water");
    }

    #[test]
    fn coarse_models_are_weighted() {
        // 9000 CA-only residues weigh 90k atoms.
        let plan = structure_plan(&fixtures::ca_trace(9000));
        assert_eq!(kinds(&plan), ["backbone"]);
        assert!(plan[0].1.is_empty());

        let plan = structure_plan(&fixtures::ca_trace(11_000));
        assert_eq!(plan[0].1["disable_impostor"], true);

        let plan = structure_plan(&fixtures::ca_trace(30_000));
        assert_eq!(kinds(&plan), ["trace"]);
        assert!(plan[0].1.is_empty());
    }

    #[test]
    fn non_structures() {
        assert_eq!(kinds(&plan(&ComponentData::Volume(fixtures::volume().into()))), ["dot"]);
        assert_eq!(
            kinds(&plan(&ComponentData::Surface(fixtures::surface().into()))),
            ["surface"]
        );
        assert!(plan(&ComponentData::Placeholder).is_empty());
    }
}
