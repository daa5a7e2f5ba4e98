//! Small helpers over lopdf objects.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::domain::{Matrix, Rect};
use crate::error::{PatchError, PatchResult};

/// Numeric value of an integer or real object.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// All operands as numbers, or `None` if any operand is not numeric.
pub(crate) fn numbers(operands: &[Object]) -> Option<Vec<f32>> {
    operands.iter().map(number).collect()
}

pub(crate) fn matrix(operands: &[Object]) -> Option<Matrix> {
    match numbers(operands)?.as_slice() {
        [a, b, c, d, e, f] => Some(Matrix::new(*a, *b, *c, *d, *e, *f)),
        _ => None,
    }
}

pub(crate) fn real(value: f32) -> Object {
    Object::Real(value)
}

pub(crate) fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

/// Follows a reference to its target; other objects are returned as-is.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> PatchResult<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Resolved dictionary entry, if present.
pub(crate) fn dict_get<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj).ok())
}

pub(crate) fn dict_get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    dict_get(doc, dict, key).and_then(|obj| obj.as_dict().ok())
}

pub(crate) fn dict_get_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict_get(doc, dict, key)
        .and_then(|obj| obj.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
}

/// Looks up a page attribute, walking up the `Parent` chain for
/// inheritable entries (`Resources`, `MediaBox`).
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> PatchResult<Option<&'a Object>> {
    let mut current = doc.get_object(page_id)?.as_dict()?;
    // Page trees are shallow; the bound only guards against cycles.
    for _ in 0..64 {
        if let Some(value) = dict_get(doc, current, key) {
            return Ok(Some(value));
        }
        match current.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = doc.get_object(*parent)?.as_dict()?,
            _ => return Ok(None),
        }
    }
    Err(PatchError::pdf("page tree parent chain is cyclic", None))
}

/// Visible area of a page: the CropBox when present, else the MediaBox,
/// else US Letter. MuPDF page space has its origin at this box's top-left
/// corner.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> PatchResult<Rect> {
    let obj = match inherited(doc, page_id, b"CropBox")? {
        Some(obj) => obj,
        None => match inherited(doc, page_id, b"MediaBox")? {
            Some(obj) => obj,
            None => return Ok(Rect::new(0.0, 0.0, 612.0, 792.0)),
        },
    };
    let values: Vec<f32> = obj
        .as_array()?
        .iter()
        .filter_map(|o| resolve(doc, o).ok().and_then(number))
        .collect();
    match values.as_slice() {
        [x0, y0, x1, y1] => Ok(Rect::new(*x0, *y0, *x1, *y1)),
        _ => Err(PatchError::pdf("malformed page box", Some(1))),
    }
}
