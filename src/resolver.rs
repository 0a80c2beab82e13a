use crate::directory::DirectoryIndex;
use crate::models::{CategoryView, Event, RecordId, ReferenceCategory, ResolvedReference};

pub const PREVIEW_SIZE: usize = 2;

pub fn resolve(ids: &[RecordId], index: &DirectoryIndex) -> Vec<ResolvedReference> {
    ids.iter().map(|id| resolve_one(id, index)).collect()
}

pub fn resolve_one(id: &str, index: &DirectoryIndex) -> ResolvedReference {
    match index.lookup(id) {
        Some(member) => ResolvedReference::from(member),
        None => {
            tracing::debug!(member_id = %id, "unresolved member reference");
            ResolvedReference::unresolved()
        }
    }
}

pub fn preview_limit(expanded: bool) -> Option<usize> {
    if expanded {
        None
    } else {
        Some(PREVIEW_SIZE)
    }
}

pub fn select_preview<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(limit) if limit < items.len() => &items[..limit],
        _ => items,
    }
}

pub fn resolve_preview(ids: &[RecordId], index: &DirectoryIndex, expanded: bool) -> Vec<ResolvedReference> {
    resolve(select_preview(ids, preview_limit(expanded)), index)
}

pub fn category_view(
    event: &Event,
    category: ReferenceCategory,
    index: &DirectoryIndex,
    expanded: bool,
) -> CategoryView {
    let ids = event.references(category);
    let entries = resolve_preview(ids, index, expanded);
    let total = ids.len();
    let toggle_label = if total <= PREVIEW_SIZE {
        None
    } else if expanded {
        Some("Show less".to_string())
    } else {
        Some(format!("Show all {} {}", total, category.as_str()))
    };

    CategoryView {
        category,
        total,
        expanded,
        hidden: total - entries.len(),
        entries,
        toggle_label,
    }
}
