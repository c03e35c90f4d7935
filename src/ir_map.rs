use std::collections::HashMap;
use std::path::PathBuf;

use crate::layer::LayerRole;

/// Canonical, format-agnostic map.
pub struct IrMap {
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Width in tiles.
    pub cols: u32,
    /// Height in tiles.
    pub rows: u32,
    /// Custom properties.
    pub properties: Properties,
    /// Tilesets in declaration order; sorted by `first_gid` on registration.
    pub tilesets: Vec<IrTileset>, // declaration order; sorted by first_gid on registration
    /// Tile layers in document order.
    pub layers: Vec<IrLayer>,     // draw order within a role: array order
}

/// A tileset declaration, inline or read from a `.tsx`.
pub struct IrTileset {
    /// First GID owned by this tileset.
    pub first_gid: u32,
    /// Display name.
    pub name: String,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Declared tiles per row.
    pub columns: Option<u32>,
    /// Declared number of tiles.
    pub tilecount: Option<u32>,
    /// `None` means "use the built-in 2x2 placeholder sheet".
    pub image: Option<IrImage>,
}

/// Image reference, already resolved against the document that declared it.
pub struct IrImage {
    /// Image path.
    pub path: PathBuf,
    /// Declared width in pixels.
    pub width: Option<u32>,
    /// Declared height in pixels.
    pub height: Option<u32>,
}

/// A decoded tile layer.
pub struct IrLayer {
    /// Layer name from the document.
    pub name: String,
    /// Drawn when true.
    pub visible: bool,
    /// Semantic role from the `type` property.
    pub role: LayerRole,
    /// Custom properties.
    pub properties: Properties,
    /// `rows * cols` masked GIDs, row-major.
    pub cells: Vec<u32>,
}

/// A single custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `type="bool"`.
    Bool(bool),
    /// `type="int"` or `type="object"`.
    Int(i64),
    /// `type="float"`.
    Float(f32),
    /// Everything else, and values that failed to parse as their declared type.
    String(String),
}

impl PropertyValue {
    /// Decode a Tiled property from its declared type and textual value.
    ///
    /// Never fails: a value that does not parse as its declared type is kept
    /// as a string.
    pub fn from_tiled(kind: Option<&str>, value: &str) -> Self {
        let trimmed = value.trim();
        let parsed = match kind {
            Some("bool") => match trimmed {
                "true" | "1" => Some(PropertyValue::Bool(true)),
                "false" | "0" => Some(PropertyValue::Bool(false)),
                _ => None,
            },
            Some("int") | Some("object") => trimmed.parse().ok().map(PropertyValue::Int),
            Some("float") => trimmed.parse().ok().map(PropertyValue::Float),
            _ => None,
        };
        parsed.unwrap_or_else(|| PropertyValue::String(value.to_owned()))
    }
}

/// String-keyed property bag attached to maps and layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    /// Raw lookup.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Boolean property, `None` if absent or of another type.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property, `None` if absent or of another type.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer property that fits in `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Float property; integers are widened.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String property.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Integer view of a property regardless of how it was declared.
    ///
    /// Strings are parsed, floats truncated; booleans and unparseable text give `None`.
    pub fn get_int_lossy(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Float(v) if v.is_finite() => Some(*v as i64),
            PropertyValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All properties, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_values_decode() {
        assert_eq!(PropertyValue::from_tiled(Some("int"), "3"), PropertyValue::Int(3));
        assert_eq!(
            PropertyValue::from_tiled(Some("bool"), "true"),
            PropertyValue::Bool(true)
        );
        assert_eq!(
            PropertyValue::from_tiled(Some("float"), "9.5"),
            PropertyValue::Float(9.5)
        );
        assert_eq!(
            PropertyValue::from_tiled(None, "forest"),
            PropertyValue::String("forest".into())
        );
    }

    #[test]
    fn bad_typed_values_fall_back_to_string() {
        assert_eq!(
            PropertyValue::from_tiled(Some("int"), "abc"),
            PropertyValue::String("abc".into())
        );
    }

    #[test]
    fn lossy_int_reads_strings_and_ints() {
        let mut props = Properties::new();
        props.insert("a", PropertyValue::Int(2));
        props.insert("b", PropertyValue::String(" 3 ".into()));
        props.insert("c", PropertyValue::String("grass".into()));
        props.insert("big", PropertyValue::Int(5_000_000_000));

        assert_eq!(props.get_int_lossy("a"), Some(2));
        assert_eq!(props.get_int_lossy("b"), Some(3));
        assert_eq!(props.get_int_lossy("c"), None);
        assert_eq!(props.get_int_lossy("missing"), None);
        assert_eq!(props.get_i64("big"), Some(5_000_000_000));
        assert_eq!(props.get_i32("big"), None);
    }
}
