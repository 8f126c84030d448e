//! Object type → component constructor table.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{Component, ComponentData};
use crate::stage::{LoadedObject, ObjectData, StageContext};

/// Wraps loaded data in a component. Returns `None` when the data is not
/// of the type the factory was registered for.
pub type ComponentFactory = fn(&Rc<StageContext>, &str, ObjectData) -> Option<Component>;

/// Registered component types, keyed by [`ObjectData::type_name`].
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: FxHashMap<&'static str, ComponentFactory>,
}

fn structure(ctx: &Rc<StageContext>, name: &str, data: ObjectData) -> Option<Component> {
    match data {
        ObjectData::Structure(s) => Some(Component::new(ctx, name, ComponentData::structure(s))),
        _ => None,
    }
}

fn surface(ctx: &Rc<StageContext>, name: &str, data: ObjectData) -> Option<Component> {
    match data {
        ObjectData::Surface(s) => Some(Component::new(ctx, name, ComponentData::Surface(s))),
        _ => None,
    }
}

fn volume(ctx: &Rc<StageContext>, name: &str, data: ObjectData) -> Option<Component> {
    match data {
        ObjectData::Volume(v) => Some(Component::new(ctx, name, ComponentData::Volume(v))),
        _ => None,
    }
}

fn shape(ctx: &Rc<StageContext>, name: &str, data: ObjectData) -> Option<Component> {
    match data {
        ObjectData::Shape(s) => Some(Component::new(ctx, name, ComponentData::Shape(s))),
        _ => None,
    }
}

fn script(ctx: &Rc<StageContext>, name: &str, data: ObjectData) -> Option<Component> {
    match data {
        ObjectData::Script(s) => Some(Component::new(ctx, name, ComponentData::Script(s))),
        _ => None,
    }
}

impl ComponentRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Structure, surface, volume, shape and script components.
    /// Validation reports and trajectories attach to existing structure
    /// components and are not registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register("structure", structure);
        r.register("surface", surface);
        r.register("volume", volume);
        r.register("shape", shape);
        r.register("script", script);
        r
    }

    /// Add or replace a component type.
    pub fn register(&mut self, type_name: &'static str, factory: ComponentFactory) {
        if self.factories.insert(type_name, factory).is_some() {
            log::debug!("component type '{type_name}' re-registered");
        }
    }

    /// Whether `type_name` is registered.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Wrap `object` in a component of the registered type. Unknown types
    /// log a warning and return `None`.
    #[must_use]
    pub fn create(&self, ctx: &Rc<StageContext>, object: LoadedObject) -> Option<Component> {
        let type_name = object.data.type_name();
        let Some(factory) = self.factories.get(type_name) else {
            log::warn!("no component for object type '{type_name}'");
            return None;
        };
        let component = factory(ctx, &object.name, object.data);
        if component.is_none() {
            log::warn!("component factory for '{type_name}' rejected '{}'", object.name);
        }
        component
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;
    use crate::representation::RepresentationRegistry;
    use crate::viewer::HeadlessViewer;

    fn ctx() -> Rc<StageContext> {
        Rc::new(StageContext::new(
            Box::new(HeadlessViewer::new()),
            RepresentationRegistry::new(),
        ))
    }

    #[test]
    fn object_type_selects_component_kind() {
        let registry = ComponentRegistry::with_defaults();
        let object = LoadedObject {
            name: "vol".into(),
            data: ObjectData::Volume(Rc::new(fixtures::volume())),
        };
        let c = registry.create(&ctx(), object).unwrap();
        assert_eq!(c.kind(), "volume");
        assert_eq!(c.name(), "vol");
    }

    #[test]
    fn unregistered_types_are_refused() {
        let registry = ComponentRegistry::with_defaults();
        assert!(!registry.contains("validation"));
        let object = LoadedObject {
            name: "report".into(),
            data: ObjectData::Validation(Rc::new(fixtures::validation())),
        };
        assert!(registry.create(&ctx(), object).is_none());
    }

    #[test]
    fn mismatched_factory_is_refused() {
        let mut registry = ComponentRegistry::new();
        registry.register("surface", volume);
        let object = LoadedObject {
            name: "s".into(),
            data: ObjectData::Surface(Rc::new(fixtures::surface())),
        };
        assert!(registry.create(&ctx(), object).is_none());
    }
}
