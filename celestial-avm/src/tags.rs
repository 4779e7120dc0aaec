//! AVM tag values and the lookup trait the extractor reads from.
//!
//! A metadata reader hands over a mapping from tag name (for example
//! `Spatial.ReferenceValue`) to a [`TagValue`]. Numeric tags may arrive as
//! numbers or as text, and vector tags as an ordered sequence of either.
//! [`TagProvider`] turns those into fixed-size `f64` arrays and reports
//! missing or unusable tags as [`AvmError`]s.

use std::collections::HashMap;

use crate::error::{AvmError, AvmResult};

pub const REFERENCE_VALUE: &str = "Spatial.ReferenceValue";
pub const REFERENCE_PIXEL: &str = "Spatial.ReferencePixel";
pub const REFERENCE_DIMENSION: &str = "Spatial.ReferenceDimension";
pub const CD_MATRIX: &str = "Spatial.CDMatrix";
pub const SCALE: &str = "Spatial.Scale";
pub const ROTATION: &str = "Spatial.Rotation";
pub const COORDINATE_FRAME: &str = "Spatial.CoordinateFrame";
pub const IMAGE_WIDTH: &str = "Image Width";
pub const IMAGE_HEIGHT: &str = "Image Height";

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Number(f64),
    Text(String),
    Seq(Vec<TagValue>),
}

impl TagValue {
    /// Leaves in document order, each parsed as `f64`.
    ///
    /// Text leaves are trimmed and may be written as XMP rationals (`"1/2"`).
    /// The first unparsable leaf is returned as the error message.
    pub fn numbers(&self) -> Result<Vec<f64>, String> {
        let mut out = Vec::new();
        self.collect_numbers(&mut out)?;
        Ok(out)
    }

    fn collect_numbers(&self, out: &mut Vec<f64>) -> Result<(), String> {
        match self {
            TagValue::Number(n) => out.push(*n),
            TagValue::Text(s) => out.push(parse_number(s)?),
            TagValue::Seq(items) => {
                for item in items {
                    item.collect_numbers(out)?;
                }
            }
        }
        Ok(())
    }

    /// The first text leaf, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s.trim()),
            TagValue::Number(_) => None,
            TagValue::Seq(items) => items.iter().find_map(TagValue::as_text),
        }
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Number(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl<const N: usize> From<[f64; N]> for TagValue {
    fn from(values: [f64; N]) -> Self {
        TagValue::Seq(values.iter().copied().map(TagValue::Number).collect())
    }
}

fn parse_number(s: &str) -> Result<f64, String> {
    let trimmed = s.trim();
    if let Some((num, den)) = trimmed.split_once('/') {
        let num: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", trimmed))?;
        let den: f64 = den
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a number", trimmed))?;
        return Ok(num / den);
    }
    trimmed
        .parse()
        .map_err(|_| format!("'{}' is not a number", trimmed))
}

pub trait TagProvider {
    fn get(&self, key: &str) -> Option<&TagValue>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The first `N` numeric components of `key`, all finite.
    fn require_numbers<const N: usize>(&self, key: &str) -> AvmResult<[f64; N]> {
        let value = self.get(key).ok_or_else(|| AvmError::missing_tag(key))?;
        let numbers = value
            .numbers()
            .map_err(|message| AvmError::malformed_value(key, message))?;

        if numbers.len() < N {
            return Err(AvmError::malformed_value(
                key,
                format!("expected {} components, found {}", N, numbers.len()),
            ));
        }

        let mut out = [0.0; N];
        for (slot, &n) in out.iter_mut().zip(&numbers) {
            if !n.is_finite() {
                return Err(AvmError::malformed_value(key, format!("{} is not finite", n)));
            }
            *slot = n;
        }
        Ok(out)
    }

    fn require_number(&self, key: &str) -> AvmResult<f64> {
        let [n] = self.require_numbers::<1>(key)?;
        Ok(n)
    }

    fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(TagValue::as_text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMap {
    tags: HashMap<String, TagValue>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<TagValue>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn set_number(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.set(key, TagValue::Number(value))
    }

    pub fn set_numbers(&mut self, key: impl Into<String>, values: &[f64]) -> &mut Self {
        let seq = values.iter().copied().map(TagValue::Number).collect();
        self.set(key, TagValue::Seq(seq))
    }

    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.set(key, TagValue::Text(value.into()))
    }

    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.tags.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl IntoIterator for TagMap {
    type Item = (String, TagValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, TagValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.into_iter()
    }
}

impl TagProvider for TagMap {
    fn get(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }
}

impl<S: std::hash::BuildHasher> TagProvider for HashMap<String, TagValue, S> {
    fn get(&self, key: &str) -> Option<&TagValue> {
        HashMap::get(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_map_numbers() {
        let mut map = TagMap::new();
        map.set_numbers(REFERENCE_PIXEL, &[149.0, 149.0]);
        assert_eq!(map.require_numbers::<2>(REFERENCE_PIXEL).unwrap(), [149.0, 149.0]);
        assert!(map.get(REFERENCE_VALUE).is_none());
    }

    #[test]
    fn test_text_leaves_are_parsed() {
        let mut map = TagMap::new();
        map.set(
            SCALE,
            TagValue::Seq(vec![" -0.00028 ".into(), "0.00028".into()]),
        );
        assert_eq!(map.require_numbers::<2>(SCALE).unwrap(), [-0.00028, 0.00028]);
    }

    #[test]
    fn test_rational_text() {
        let mut map = TagMap::new();
        map.set_text(ROTATION, "45/2");
        assert_eq!(map.require_number(ROTATION).unwrap(), 22.5);
    }

    #[test]
    fn test_scalar_number_satisfies_single_component() {
        let mut map = TagMap::new();
        map.set_number(IMAGE_WIDTH, 298.0);
        assert_eq!(map.require_number(IMAGE_WIDTH).unwrap(), 298.0);
    }

    #[test]
    fn test_require_missing() {
        let map = TagMap::new();
        let err = map.require_numbers::<2>(REFERENCE_VALUE).unwrap_err();
        assert!(matches!(err, AvmError::MissingTag { ref tag } if tag == REFERENCE_VALUE));
    }

    #[test]
    fn test_require_too_few_components() {
        let mut map = TagMap::new();
        map.set_numbers(SCALE, &[-0.5]);
        let err = map.require_numbers::<2>(SCALE).unwrap_err();
        assert!(matches!(err, AvmError::MalformedValue { .. }));
        assert!(err.to_string().contains("expected 2 components, found 1"));
    }

    #[test]
    fn test_require_unparsable_text() {
        let mut map = TagMap::new();
        map.set_text(ROTATION, "north-ish");
        let err = map.require_number(ROTATION).unwrap_err();
        assert!(matches!(err, AvmError::MalformedValue { ref tag, .. } if tag == ROTATION));
        assert!(err.to_string().contains("north-ish"));
    }

    #[test]
    fn test_require_non_finite() {
        let mut map = TagMap::new();
        map.set_numbers(REFERENCE_VALUE, &[f64::NAN, 0.0]);
        assert!(matches!(
            map.require_numbers::<2>(REFERENCE_VALUE),
            Err(AvmError::MalformedValue { .. })
        ));

        map.set_text(ROTATION, "1/0");
        assert!(matches!(
            map.require_number(ROTATION),
            Err(AvmError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_get_text() {
        let mut map = TagMap::new();
        map.set_text(COORDINATE_FRAME, " ICRS ");
        map.set_number(ROTATION, 0.0);
        assert_eq!(map.get_text(COORDINATE_FRAME), Some("ICRS"));
        assert_eq!(map.get_text(ROTATION), None);
    }

    #[test]
    fn test_builder_pattern() {
        let mut map = TagMap::new();
        map.set_numbers(REFERENCE_VALUE, &[10.0, 20.0])
            .set_number(ROTATION, 0.0)
            .set_text(COORDINATE_FRAME, "ICRS");
        assert_eq!(map.len(), 3);
        assert!(map.contains(ROTATION));
        assert!(map.remove(ROTATION).is_some());
        assert!(!map.contains(ROTATION));
    }

    #[test]
    fn test_plain_hash_map_is_a_provider() {
        let mut map: HashMap<String, TagValue> = HashMap::new();
        map.insert(REFERENCE_PIXEL.to_string(), [3.0, 4.0].into());
        assert_eq!(map.require_numbers::<2>(REFERENCE_PIXEL).unwrap(), [3.0, 4.0]);
    }
}
