//! Behaviour shared by the four element kinds

use super::property::{PropertyBag, PropertyValue, ID_KEY, REV_ID_KEY};
use super::types::{ElementId, Label, RevisionId};
use crate::error::{GraphError, GraphResult};
use std::borrow::Cow;

/// Identifier, revision, label and property bag of a graph element.
///
/// The reserved keys `Id` and `RevId` are readable through the same
/// property accessors as ordinary keys.
pub trait Element {
    fn element_id(&self) -> ElementId;

    fn revision(&self) -> RevisionId;

    fn label(&self) -> &Label;

    fn properties(&self) -> &PropertyBag;

    /// Non-failing read, including the reserved keys
    fn try_property(&self, key: &str) -> Option<Cow<'_, PropertyValue>> {
        match key {
            ID_KEY => Some(Cow::Owned(stamp_value(self.element_id().raw()))),
            REV_ID_KEY => Some(Cow::Owned(stamp_value(self.revision().as_u64()))),
            _ => self.properties().try_get(key).map(Cow::Borrowed),
        }
    }

    /// Strict read; fails with `KeyNotFound`
    fn property(&self, key: &str) -> GraphResult<Cow<'_, PropertyValue>> {
        self.try_property(key)
            .ok_or_else(|| GraphError::KeyNotFound(key.to_string()))
    }

    fn has_property(&self, key: &str) -> bool {
        self.try_property(key).is_some()
    }

    fn has_label(&self, label: &str) -> bool {
        self.label().as_str() == label
    }

    fn property_keys(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.properties().keys())
    }
}

/// Ids and revisions are kept below `i64::MAX` by the generators; anything
/// larger (a caller-supplied id) is surfaced as its decimal text.
fn stamp_value(raw: u64) -> PropertyValue {
    i64::try_from(raw)
        .map(PropertyValue::Integer)
        .unwrap_or_else(|_| PropertyValue::String(raw.to_string()))
}

/// Label filter shared by adjacency accessors and pipes: empty means "any".
pub(crate) fn label_matches(labels: &[Label], label: &Label) -> bool {
    labels.is_empty() || labels.iter().any(|l| l == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_value() {
        assert_eq!(stamp_value(5), PropertyValue::Integer(5));
        assert_eq!(
            stamp_value(u64::MAX),
            PropertyValue::String(u64::MAX.to_string())
        );
    }

    #[test]
    fn test_label_matches() {
        let loves = Label::new("loves");
        assert!(label_matches(&[], &loves));
        assert!(label_matches(&[Label::new("hates"), Label::new("loves")], &loves));
        assert!(!label_matches(&[Label::new("hates")], &loves));
    }
}
