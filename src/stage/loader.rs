//! The loader contract and an in-memory implementation.
//!
//! Parsing lives outside this crate. A [`Loader`] turns a path into a
//! [`LoadedObject`] whose [`ObjectData`] variant tells the stage which
//! component to build for it.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::component::Script;
use crate::data::{Shape, Structure, Surface, Trajectory, Validation, Volume};
use crate::error::StageError;

/// Pending result of [`Loader::auto_load`].
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<LoadedObject, StageError>>>>;

/// Options of `Stage::load_file`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadParams {
    /// Component name; defaults to the file name without extension.
    pub name: Option<String>,
    /// File type; defaults to the path's extension.
    pub ext: Option<String>,
    /// Add representations chosen from the loaded data.
    pub default_representation: bool,
}

/// Parsed data, tagged with its type.
#[derive(Debug, Clone)]
pub enum ObjectData {
    /// A molecular structure.
    Structure(Rc<Structure>),
    /// A triangulated surface.
    Surface(Rc<Surface>),
    /// A volumetric grid.
    Volume(Rc<Volume>),
    /// Shape primitives.
    Shape(Rc<Shape>),
    /// A stage script.
    Script(Script),
    /// A validation report.
    Validation(Rc<Validation>),
    /// Coordinate frames.
    Trajectory(Rc<Trajectory>),
}

impl ObjectData {
    /// Type name the component registry is keyed by.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Structure(_) => "structure",
            Self::Surface(_) => "surface",
            Self::Volume(_) => "volume",
            Self::Shape(_) => "shape",
            Self::Script(_) => "script",
            Self::Validation(_) => "validation",
            Self::Trajectory(_) => "trajectory",
        }
    }
}

/// A loaded, named data object.
#[derive(Debug, Clone)]
pub struct LoadedObject {
    /// Name reported by the parser.
    pub name: String,
    /// The data.
    pub data: ObjectData,
}

/// Source of data objects.
pub trait Loader {
    /// Start loading `path`. The future must not borrow the loader.
    fn auto_load(&self, path: &str, params: &LoadParams) -> LoadFuture;
}

/// File name without directories, compression suffix or extension, and the
/// lowercased extension.
#[must_use]
pub fn file_info(path: &str) -> (String, String) {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let base = base
        .strip_suffix(".gz")
        .or_else(|| base.strip_suffix(".zip"))
        .unwrap_or(base);
    match base.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() => (name.to_owned(), ext.to_lowercase()),
        _ => (base.to_owned(), String::new()),
    }
}

/// Serves objects registered in advance; every other path fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: FxHashMap<String, Result<LoadedObject, String>>,
}

impl MemoryLoader {
    /// Loader with nothing registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` under `path`.
    pub fn insert(&mut self, path: &str, name: &str, data: ObjectData) {
        let object = LoadedObject {
            name: name.to_owned(),
            data,
        };
        let _ = self.entries.insert(path.to_owned(), Ok(object));
    }

    /// Make loading `path` fail with `reason`.
    pub fn fail(&mut self, path: &str, reason: &str) {
        let _ = self.entries.insert(path.to_owned(), Err(reason.to_owned()));
    }
}

impl Loader for MemoryLoader {
    fn auto_load(&self, path: &str, _params: &LoadParams) -> LoadFuture {
        let result = match self.entries.get(path) {
            Some(Ok(object)) => Ok(object.clone()),
            Some(Err(reason)) => Err(StageError::Load {
                path: path.to_owned(),
                reason: reason.clone(),
            }),
            None => Err(StageError::Load {
                path: path.to_owned(),
                reason: "not found".to_owned(),
            }),
        };
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn file_info_strips_directories_and_compression() {
        assert_eq!(file_info("data/1crn.cif"), ("1crn".into(), "cif".into()));
        assert_eq!(file_info("1CRN.PDB.gz"), ("1CRN".into(), "pdb".into()));
        assert_eq!(file_info("md.dcd"), ("md".into(), "dcd".into()));
        assert_eq!(file_info("README"), ("README".into(), String::new()));
        assert_eq!(file_info(".hidden"), (".hidden".into(), String::new()));
    }

    #[test]
    fn memory_loader_serves_and_fails() {
        let mut loader = MemoryLoader::new();
        loader.insert("a.pdb", "a", ObjectData::Structure(Rc::new(fixtures::peptide(2))));
        loader.fail("b.pdb", "corrupt");
        let params = LoadParams::default();

        let a = pollster::block_on(loader.auto_load("a.pdb", &params)).unwrap();
        assert_eq!(a.name, "a");
        assert_eq!(a.data.type_name(), "structure");

        let b = pollster::block_on(loader.auto_load("b.pdb", &params));
        assert!(matches!(b, Err(StageError::Load { reason, .. }) if reason == "corrupt"));

        let c = pollster::block_on(loader.auto_load("c.pdb", &params));
        assert!(c.is_err());
    }
}
