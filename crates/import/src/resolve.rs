use kumiai_core::Category;

use crate::error::ImportError;

/// Maps a free-text description to a himoku by substring containment.
/// The vocabulary is scanned in the order given (ascending sort code,
/// with specific names coded before generic catch-alls) and the first
/// hit wins. Unrecognized text falls back to the default himoku; running
/// without one configured is a system misconfiguration, not a per-record
/// problem.
pub fn resolve_category<'a>(
    description: &str,
    vocabulary: &'a [Category],
    default: Option<&'a Category>,
) -> Result<&'a Category, ImportError> {
    if let Some(hit) = vocabulary
        .iter()
        .find(|category| description.contains(category.name.as_str()))
    {
        return Ok(hit);
    }
    default.ok_or(ImportError::NoDefaultCategory)
}
