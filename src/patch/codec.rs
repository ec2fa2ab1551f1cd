//! JSON encoding of patch lists

use crate::attr::Attribute;
use crate::error::PatchError;
use crate::node::TreeNode;
use crate::parser::is_qualified_name;

use super::Patch;

/// Decode a JSON patch (an array of edit objects)
///
/// Every name the edits would write is checked with [`validate`].
pub fn decode(bytes: &[u8]) -> Result<Vec<Patch>, PatchError> {
    let patches: Vec<Patch> = serde_json::from_slice(bytes)?;
    validate(&patches)?;
    Ok(patches)
}

/// Encode edits in the format accepted by [`decode`]
pub fn encode(patches: &[Patch]) -> Result<Vec<u8>, PatchError> {
    serde_json::to_vec(patches).map_err(PatchError::decode)
}

/// Reject edits whose element or attribute names the parser could not read
/// back, so an applied patch always prints to parseable markup.
pub fn validate(patches: &[Patch]) -> Result<(), PatchError> {
    for (index, patch) in patches.iter().enumerate() {
        match patch {
            Patch::SetAttributes { attributes, .. } => check_attributes(index, attributes)?,
            Patch::Append { node, .. } | Patch::Replace { node, .. } => {
                for node in node.nodes() {
                    if let TreeNode::Element {
                        namespace,
                        tag,
                        attributes,
                        ..
                    } = node
                    {
                        check_name(index, "element", namespace, tag)?;
                        check_attributes(index, attributes)?;
                    }
                }
            }
            Patch::SetText { .. } | Patch::Remove { .. } => {}
        }
    }
    Ok(())
}

fn check_attributes(index: usize, attributes: &[Attribute]) -> Result<(), PatchError> {
    attributes
        .iter()
        .try_for_each(|attr| check_name(index, "attribute", &attr.namespace, &attr.name))
}

fn check_name(index: usize, what: &str, namespace: &str, local: &str) -> Result<(), PatchError> {
    if is_qualified_name(namespace, local) {
        return Ok(());
    }
    let name = if namespace.is_empty() {
        format!("{local:?}")
    } else {
        format!("{namespace:?} : {local:?}")
    };
    Err(PatchError::Decode(format!("edit #{index}: invalid {what} name {name}")))
}
