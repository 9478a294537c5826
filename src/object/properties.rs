//! Late lookup of `Properties70` values on object elements.
//!
//! Object elements carry a `Properties70` child whose `P` rows are
//! `name, type, label, flags, value...`; values start at property
//! index 4.

use crate::tree::Element;
use crate::util::math::DVec3;

/// Index of the first value in a `P` row.
const VALUE_INDEX: usize = 4;

/// Find the `P` row with the given name.
pub(crate) fn find_property<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    let props = element.child("Properties70")?;
    props.children().iter().find(|row| {
        row.id() == "P"
            && row
                .property(0)
                .and_then(|p| p.as_token())
                .is_some_and(|t| t == name)
    })
}

/// Three doubles from a `P` row, or the default.
pub(crate) fn vec3_property(element: &Element, name: &str, default: DVec3) -> DVec3 {
    let Some(row) = find_property(element, name) else {
        return default;
    };
    let value = |i: usize| row.property(VALUE_INDEX + i).and_then(|p| p.to_f64().ok());
    match (value(0), value(1), value(2)) {
        (Some(x), Some(y), Some(z)) => DVec3::new(x, y, z),
        _ => default,
    }
}

/// One double from a `P` row, or the default.
pub(crate) fn f64_property(element: &Element, name: &str, default: f64) -> f64 {
    find_property(element, name)
        .and_then(|row| row.property(VALUE_INDEX))
        .and_then(|p| p.to_f64().ok())
        .unwrap_or(default)
}

/// One integer from a `P` row, or the default.
pub(crate) fn i64_property(element: &Element, name: &str, default: i64) -> i64 {
    find_property(element, name)
        .and_then(|row| row.property(VALUE_INDEX))
        .and_then(|p| p.to_i64().ok())
        .unwrap_or(default)
}
