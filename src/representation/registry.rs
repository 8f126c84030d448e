//! Name → constructor table for representation kinds.

use rustc_hash::FxHashMap;

use super::atoms::AtomRepresentation;
use super::backbone::BackboneRepresentation;
use super::contact::ContactRepresentation;
use super::distance::DistanceRepresentation;
use super::shape::ShapeRepresentation;
use super::slice::SliceRepresentation;
use super::surface::{DotRepresentation, SurfaceRepresentation};
use super::trajectory::TrajectoryRepresentation;
use super::validation::ValidationRepresentation;
use super::Representation;

/// Creates a representation with default parameters.
pub type RepresentationFactory = fn() -> Box<dyn Representation>;

/// Registered representation kinds.
#[derive(Debug, Clone, Default)]
pub struct RepresentationRegistry {
    factories: FxHashMap<&'static str, RepresentationFactory>,
}

impl RepresentationRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register("spacefill", || Box::new(AtomRepresentation::spacefill()));
        r.register("ball+stick", || Box::new(AtomRepresentation::ball_and_stick()));
        r.register("licorice", || Box::new(AtomRepresentation::licorice()));
        r.register("hyperball", || Box::new(AtomRepresentation::hyperball()));
        r.register("backbone", || Box::new(BackboneRepresentation::backbone()));
        r.register("trace", || Box::new(BackboneRepresentation::trace()));
        r.register("tube", || Box::new(BackboneRepresentation::tube()));
        r.register("cartoon", || Box::new(BackboneRepresentation::cartoon()));
        r.register("ribbon", || Box::new(BackboneRepresentation::ribbon()));
        r.register("rope", || Box::new(BackboneRepresentation::rope()));
        r.register("distance", || Box::new(DistanceRepresentation::new()));
        r.register("contact", || Box::new(ContactRepresentation::new()));
        r.register("validation", || Box::new(ValidationRepresentation::new()));
        r.register("trajectory", || Box::new(TrajectoryRepresentation::new()));
        r.register("surface", || Box::new(SurfaceRepresentation::new()));
        r.register("dot", || Box::new(DotRepresentation::new()));
        r.register("slice", || Box::new(SliceRepresentation::new()));
        r.register("buffer", || Box::new(ShapeRepresentation::new()));
        r
    }

    /// Add or replace a kind.
    pub fn register(&mut self, name: &'static str, factory: RepresentationFactory) {
        if self.factories.insert(name, factory).is_some() {
            log::debug!("representation '{name}' re-registered");
        }
    }

    /// New representation of kind `name`, if registered.
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Box<dyn Representation>> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::{IMPOSTOR_TYPES, QUALITY_TYPES};

    #[test]
    fn factories_report_their_name() {
        let r = RepresentationRegistry::with_defaults();
        for name in r.names() {
            assert_eq!(r.create(name).map(|repr| repr.type_name()), Some(name));
        }
    }

    #[test]
    fn quality_types_are_registered() {
        let r = RepresentationRegistry::with_defaults();
        assert!(QUALITY_TYPES.iter().all(|t| r.contains(t)));
        assert!(r.contains(IMPOSTOR_TYPES[0]));
        assert!(r.create("rocket").is_none());
    }
}
