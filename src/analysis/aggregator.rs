//! Grouping, counting and small-group bucketing.
//!
//! Datasets produced here are always ordered by count descending with
//! ties broken by label ascending.

use crate::models::{AggregatedDataset, CountItem, RawRecord};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::warn;

/// Minimum group size kept as-is by [`bucket_small`].
pub const DEFAULT_BUCKET_THRESHOLD: u64 = 5;

/// Label of the synthetic group collecting small groups.
pub const DEFAULT_BUCKET_LABEL: &str = "Altro (k<5)";

/// Group items by a derived key and count them.
///
/// Items whose key is `None` or empty are skipped entirely.
pub fn group_and_count<I, F>(items: I, mut key: F) -> AggregatedDataset
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Option<String>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();

    for item in items {
        match key(item) {
            Some(k) if !k.is_empty() => *counts.entry(k).or_default() += 1,
            _ => {}
        }
    }

    let mut grouped: Vec<CountItem> = counts
        .into_iter()
        .map(|(label, count)| CountItem { label, count })
        .collect();
    sort_dataset(&mut grouped);

    AggregatedDataset(grouped)
}

/// Count list memberships. A contact on N lists adds one to each of them.
pub fn count_list_memberships(records: &[RawRecord]) -> AggregatedDataset {
    group_and_count(
        records.iter().flat_map(|record| record.list_ids.iter()),
        |id| Some(id.clone()),
    )
}

/// Collapse every group smaller than `threshold` into one group named
/// `label`, appended last when it absorbed anything.
///
/// If a retained group already carries `label`, the synthetic group
/// replaces it instead of merging counts with it.
pub fn bucket_small(dataset: AggregatedDataset, threshold: u64, label: &str) -> AggregatedDataset {
    let mut small = 0;
    let mut kept = Vec::with_capacity(dataset.len());

    for item in dataset.0 {
        if item.count < threshold {
            small += item.count;
        } else {
            kept.push(item);
        }
    }

    if small > 0 {
        if let Some(pos) = kept.iter().position(|item| item.label == label) {
            warn!(
                "Group {:?} collides with the bucket label; its count of {} is replaced",
                label, kept[pos].count
            );
            kept.remove(pos);
        }
        kept.push(CountItem::new(label, small));
    }

    AggregatedDataset(kept)
}

fn sort_dataset(items: &mut [CountItem]) {
    items.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.label.cmp(&b.label))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(dataset: &AggregatedDataset) -> Vec<&str> {
        dataset.items().iter().map(|i| i.label.as_str()).collect()
    }

    fn is_ordered(dataset: &AggregatedDataset) -> bool {
        dataset.items().windows(2).all(|w| {
            w[0].count > w[1].count || (w[0].count == w[1].count && w[0].label <= w[1].label)
        })
    }

    #[test]
    fn test_group_and_count_orders_by_count_then_label() {
        let keys = ["b", "a", "c", "b", "c", "c", "a"];
        let dataset = group_and_count(keys, |k| Some(k.to_string()));

        assert_eq!(labels(&dataset), vec!["c", "a", "b"]);
        assert_eq!(dataset.items()[0].count, 3);
        assert!(is_ordered(&dataset));
    }

    #[test]
    fn test_group_and_count_skips_absent_keys() {
        let keys = [Some("x"), None, Some("x"), None, Some("y")];
        let dataset = group_and_count(keys, |k| k.map(String::from));

        assert_eq!(dataset.total(), 3);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.items().iter().all(|i| i.count >= 1));
    }

    #[test]
    fn test_group_and_count_skips_empty_keys() {
        let keys = ["", "x", ""];
        let dataset = group_and_count(keys, |k| Some(k.to_string()));

        assert_eq!(dataset.items(), &[CountItem::new("x", 1)]);
    }

    #[test]
    fn test_group_and_count_unique_labels_and_total() {
        let keys: Vec<String> = (0..200).map(|i| format!("k{}", i % 17)).collect();
        let dataset = group_and_count(keys.iter(), |k| Some(k.clone()));

        let mut seen = labels(&dataset);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), dataset.len());
        assert_eq!(dataset.total(), 200);
        assert!(is_ordered(&dataset));
    }

    #[test]
    fn test_group_and_count_empty() {
        let dataset = group_and_count(Vec::<&str>::new(), |k| Some(k.to_string()));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_count_list_memberships_flat_expansion() {
        let records = vec![
            RawRecord {
                list_ids: vec!["6".into(), "7".into()],
                ..Default::default()
            },
            RawRecord {
                list_ids: vec!["6".into()],
                ..Default::default()
            },
            RawRecord::default(),
        ];

        let dataset = count_list_memberships(&records);

        assert_eq!(
            dataset.items(),
            &[CountItem::new("6", 2), CountItem::new("7", 1)]
        );
    }

    #[test]
    fn test_bucket_small_preserves_total() {
        let dataset = AggregatedDataset(vec![
            CountItem::new("a", 9),
            CountItem::new("b", 5),
            CountItem::new("c", 4),
            CountItem::new("d", 1),
        ]);

        for threshold in 0..12 {
            let bucketed = bucket_small(dataset.clone(), threshold, DEFAULT_BUCKET_LABEL);
            assert_eq!(bucketed.total(), dataset.total(), "threshold {}", threshold);
        }

        let bucketed = bucket_small(dataset, 5, DEFAULT_BUCKET_LABEL);
        assert_eq!(labels(&bucketed), vec!["a", "b", DEFAULT_BUCKET_LABEL]);
        assert_eq!(bucketed.items()[2].count, 5);
    }

    #[test]
    fn test_bucket_small_no_small_groups() {
        let dataset = AggregatedDataset(vec![CountItem::new("a", 10)]);
        let bucketed = bucket_small(dataset.clone(), 5, DEFAULT_BUCKET_LABEL);
        assert_eq!(bucketed, dataset);
    }

    #[test]
    fn test_bucket_small_all_small() {
        let dataset = group_and_count(["A", "A", "B"], |k| Some(k.to_string()));
        let bucketed = bucket_small(dataset, DEFAULT_BUCKET_THRESHOLD, DEFAULT_BUCKET_LABEL);
        assert_eq!(bucketed.items(), &[CountItem::new(DEFAULT_BUCKET_LABEL, 3)]);
    }

    #[test]
    fn test_bucket_small_label_collision_replaces() {
        let dataset = AggregatedDataset(vec![
            CountItem::new(DEFAULT_BUCKET_LABEL, 7),
            CountItem::new("a", 6),
            CountItem::new("b", 2),
        ]);

        let bucketed = bucket_small(dataset, 5, DEFAULT_BUCKET_LABEL);

        assert_eq!(
            bucketed.items(),
            &[CountItem::new("a", 6), CountItem::new(DEFAULT_BUCKET_LABEL, 2)]
        );
    }
}
