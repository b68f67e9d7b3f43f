//! Page tree operations.
//!
//! Pages taken from a source document are detached from their original page
//! tree (resolving any attributes they inherited from it) and attached to
//! the root `Pages` node of the target document.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{MergeError, Result};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page tree depth when walking `Parent` links.
const MAX_TREE_DEPTH: usize = 64;

/// A page lifted out of its source page tree.
#[derive(Debug, Clone)]
pub struct DetachedPage {
    /// Object id of the page dictionary.
    pub id: ObjectId,
    /// Inherited attributes the page does not define itself.
    pub inherited: Vec<(&'static [u8], Object)>,
}

/// Object id of the document's root `Pages` node.
pub fn root_pages_id(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(|pages| pages.as_reference())
        .map_err(|e| MergeError::merge_failed(format!("Failed to get pages reference: {e}")))
}

/// All pages of `doc` in page order, with their inherited attributes resolved.
pub fn detach_pages(doc: &Document) -> Result<Vec<DetachedPage>> {
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc
                .get_dictionary(id)
                .map_err(|e| MergeError::merge_failed(format!("Failed to get page: {e}")))?;
            Ok(DetachedPage {
                id,
                inherited: inherited_attributes(doc, page),
            })
        })
        .collect()
}

/// Append `pages` to the `Pages` node `pages_id` of `doc`.
///
/// Every page is re-parented onto `pages_id` and receives the attributes it
/// previously inherited. The pages' objects must already be present in `doc`.
///
/// `pages_id` must be the document's root `Pages` node. Its `Count` is
/// recomputed from the leaves already reachable through `Kids`, so a missing
/// or indirect `Count` on the input does not carry over.
///
/// Returns the number of pages appended.
pub fn attach_pages(doc: &mut Document, pages_id: ObjectId, pages: Vec<DetachedPage>) -> Result<usize> {
    let count = pages.len();
    let existing = doc.get_pages().len();
    let mut kids = Vec::with_capacity(count);

    for page in pages {
        let dict = doc
            .get_object_mut(page.id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| MergeError::merge_failed(format!("Failed to get page: {e}")))?;

        for (key, value) in page.inherited {
            dict.set(key, value);
        }
        dict.set("Parent", Object::Reference(pages_id));

        kids.push(Object::Reference(page.id));
    }

    let pages_dict = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| MergeError::merge_failed(format!("Failed to get pages object: {e}")))?;

    pages_dict
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|e| MergeError::merge_failed(format!("Failed to get Kids array: {e}")))?
        .extend(kids);

    pages_dict.set("Count", Object::Integer((existing + count) as i64));

    Ok(count)
}

/// Set the `Count` of the `Pages` node `pages_id` to `count`.
pub fn set_page_count(doc: &mut Document, pages_id: ObjectId, count: usize) -> Result<()> {
    doc.get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| MergeError::merge_failed(format!("Failed to get pages object: {e}")))?
        .set("Count", Object::Integer(count as i64));
    Ok(())
}

/// Resolve the inheritable attributes `page` lacks by walking its ancestors.
fn inherited_attributes(doc: &Document, page: &Dictionary) -> Vec<(&'static [u8], Object)> {
    let mut found = Vec::new();

    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }

        let mut parent = parent_id(page);
        for _ in 0..MAX_TREE_DEPTH {
            let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
                break;
            };
            if let Ok(value) = node.get(key) {
                found.push((key, value.clone()));
                break;
            }
            parent = parent_id(node);
        }
    }

    found
}

fn parent_id(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent")
        .and_then(|parent| parent.as_reference())
        .ok()
}
