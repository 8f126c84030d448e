//! Declared parameter tables and patch merging.
//!
//! Stage parameters and every representation kind describe their options
//! as a static [`ParamSpec`] table: the JSON kind, numeric bounds and the
//! change class a new value triggers. Patches arrive as JSON objects, are
//! checked against the table (unknown keys and wrong kinds are logged and
//! skipped, numbers are clamped) and merged into a typed `serde` struct.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StageError;

/// JSON shape and bounds of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// `true` / `false`.
    Bool,
    /// Integer clamped to `min..=max`.
    Integer {
        /// Lower bound.
        min: i64,
        /// Upper bound.
        max: i64,
    },
    /// Number clamped to `min..=max`.
    Number {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// One of a fixed set of strings.
    Select(&'static [&'static str]),
    /// `[r, g, b]` with components in `0.0..=1.0`.
    Color,
    /// Free text (selection strings, names).
    Text,
    /// List of `[selection, selection]` pairs.
    Pairs,
}

/// Buffer attribute group touched by an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// Primitive positions.
    Position,
    /// Primitive colors.
    Color,
    /// Radii and sizes.
    Radius,
    /// Text label attributes.
    Labels,
}

/// What a changed parameter requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    /// Regenerate every buffer.
    Rebuild,
    /// Rewrite one attribute group in place.
    Update(Attribute),
    /// Change buffer-level material parameters.
    Buffer,
    /// Recompute buffer visibility.
    Visibility,
    /// Stored only.
    None,
}

/// One declared parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Key in the parameter object.
    pub name: &'static str,
    /// JSON kind and bounds.
    pub kind: ParamKind,
    /// Reaction to a new value.
    pub change: ChangeClass,
}

impl ParamSpec {
    /// Shorthand constructor for static tables.
    #[must_use]
    pub const fn new(
        name: &'static str,
        kind: ParamKind,
        change: ChangeClass,
    ) -> Self {
        Self { name, kind, change }
    }

    /// Check `value` against the kind. Returns the (clamped) value, or
    /// `None` when it has the wrong shape.
    #[must_use]
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self.kind {
            ParamKind::Bool => value.is_boolean().then(|| value.clone()),
            ParamKind::Integer { min, max } => {
                let v = value
                    .as_i64()
                    .or_else(|| value.as_f64().map(|f| f.round() as i64))?;
                Some(Value::from(v.clamp(min, max)))
            }
            ParamKind::Number { min, max } => {
                let v = value.as_f64()?;
                Some(Value::from(v.clamp(min, max)))
            }
            ParamKind::Select(options) => {
                let s = value.as_str()?;
                options.contains(&s).then(|| value.clone())
            }
            ParamKind::Color => {
                let a = value.as_array()?;
                if a.len() != 3 {
                    return None;
                }
                let rgb: Option<Vec<Value>> = a
                    .iter()
                    .map(|c| c.as_f64().map(|f| Value::from(f.clamp(0.0, 1.0))))
                    .collect();
                rgb.map(Value::Array)
            }
            ParamKind::Text => value.is_string().then(|| value.clone()),
            ParamKind::Pairs => {
                let ok = value.as_array()?.iter().all(|pair| {
                    pair.as_array().is_some_and(|p| {
                        p.len() == 2 && p.iter().all(Value::is_string)
                    })
                });
                ok.then(|| value.clone())
            }
        }
    }
}

/// Attribute groups requested by an in-place update.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct What {
    /// Positions changed.
    pub position: bool,
    /// Colors changed.
    pub color: bool,
    /// Radii / sizes changed.
    pub radius: bool,
    /// Label attributes changed.
    pub labels: bool,
}

impl What {
    /// Only positions.
    pub const POSITION: Self = Self {
        position: true,
        color: false,
        radius: false,
        labels: false,
    };

    /// Whether nothing is requested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.position || self.color || self.radius || self.labels)
    }

    fn insert(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Position => self.position = true,
            Attribute::Color => self.color = true,
            Attribute::Radius => self.radius = true,
            Attribute::Labels => self.labels = true,
        }
    }
}

/// Union of the change classes of an accepted patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Some key requires a rebuild.
    pub rebuild: bool,
    /// Attribute groups to rewrite in place.
    pub update: What,
    /// Buffer-level parameters changed.
    pub buffer: bool,
    /// Visibility must be recomputed.
    pub visibility: bool,
}

impl ChangeSet {
    /// Fold one change class into the set.
    pub fn add(&mut self, change: ChangeClass) {
        match change {
            ChangeClass::Rebuild => self.rebuild = true,
            ChangeClass::Update(a) => self.update.insert(a),
            ChangeClass::Buffer => self.buffer = true,
            ChangeClass::Visibility => self.visibility = true,
            ChangeClass::None => {}
        }
    }
}

/// Look up `name` in a list of tables; earlier tables win.
#[must_use]
pub fn find_spec<'a>(
    tables: &[&'a [ParamSpec]],
    name: &str,
) -> Option<&'a ParamSpec> {
    tables
        .iter()
        .find_map(|table| table.iter().find(|s| s.name == name))
}

/// Check a patch against declared tables.
///
/// Returns the accepted (and clamped) entries together with the union of
/// their change classes. `owner` prefixes the log messages.
#[must_use]
pub fn validate(
    tables: &[&[ParamSpec]],
    patch: &Map<String, Value>,
    owner: &str,
) -> (Map<String, Value>, ChangeSet) {
    let mut accepted = Map::new();
    let mut changes = ChangeSet::default();
    for (key, value) in patch {
        let Some(spec) = find_spec(tables, key) else {
            log::warn!("{owner}: unknown parameter '{key}', ignored");
            continue;
        };
        let Some(coerced) = spec.coerce(value) else {
            log::warn!("{owner}: invalid value {value} for '{key}', ignored");
            continue;
        };
        if &coerced != value {
            log::debug!("{owner}: '{key}' clamped to {coerced}");
        }
        let _ = accepted.insert(key.clone(), coerced);
        changes.add(spec.change);
    }
    (accepted, changes)
}

/// Serialize a parameter struct into a JSON object.
#[must_use]
pub fn to_map<T: Serialize>(params: &T) -> Map<String, Value> {
    match serde_json::to_value(params) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Merge accepted entries into a typed parameter struct.
pub fn merge<T: Serialize + DeserializeOwned>(
    target: &mut T,
    patch: &Map<String, Value>,
) -> Result<(), StageError> {
    let mut map = to_map(target);
    for (key, value) in patch {
        let _ = map.insert(key.clone(), value.clone());
    }
    *target = serde_json::from_value(Value::Object(map))?;
    Ok(())
}
