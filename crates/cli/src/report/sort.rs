use std::cmp::Ordering;

use tflog::parser::level;
use tflog::NormalizedRecord;

use super::SortKey;

/// Reorder `indices` (into `records`) by `key`. Stable, so equal records keep
/// input order.
pub fn sort_indices(indices: &mut [usize], records: &[NormalizedRecord], key: SortKey) {
    let compare: fn(&NormalizedRecord, &NormalizedRecord) -> Ordering = match key {
        SortKey::None => return,
        SortKey::Timestamp => by_timestamp,
        SortKey::Level => by_level,
        SortKey::LevelTimestamp => by_level_then_timestamp,
        SortKey::Resource => by_resource,
        SortKey::Message => by_message,
    };
    indices.sort_by(|&a, &b| compare(&records[a], &records[b]));
}

/// Lexicographic on the canonical string; the far-future sentinel sorts last.
fn by_timestamp(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    a.timestamp.cmp(&b.timestamp)
}

fn level_rank(record: &NormalizedRecord) -> usize {
    match record.level.as_deref() {
        Some(l) => level::rank(l),
        None => usize::MAX,
    }
}

fn by_level(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    level_rank(a).cmp(&level_rank(b))
}

fn by_level_then_timestamp(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    by_level(a, b).then_with(|| by_timestamp(a, b))
}

/// Records without a resource go last.
fn by_resource(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    match (a.resource_id(), b.resource_id()) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| by_timestamp(a, b))
}

fn by_message(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    // missing messages sort as empty, ahead of everything else
    let a = a.message.as_deref().unwrap_or("");
    let b = b.message.as_deref().unwrap_or("");
    a.cmp(b)
}
