//! Nested-loop join (C5): the sequential correctness oracle every other
//! algorithm's output is compared against.

use crate::record::{make_result, CastRecord, ResultRecord, TitleRecord};

/// `O(|L| * |R|)` baseline. Returns an empty vector if either side is empty.
pub fn perform_nested_loop_join(left: &[CastRecord], right: &[TitleRecord]) -> Vec<ResultRecord> {
    let mut results = Vec::new();
    for cast in left {
        for title in right {
            if cast.movie_id == title.title_id {
                results.push(make_result(cast, title));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::BoundedBytes;

    fn cast(movie_id: i32) -> CastRecord {
        CastRecord {
            movie_id,
            ..Default::default()
        }
    }

    fn title(title_id: i32, name: &str) -> TitleRecord {
        TitleRecord {
            title_id,
            title: BoundedBytes::new(name.as_bytes()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_right_yields_empty_result() {
        let left = vec![cast(1)];
        let right: Vec<TitleRecord> = vec![];
        assert!(perform_nested_loop_join(&left, &right).is_empty());
    }

    #[test]
    fn duplicate_keys_produce_full_cartesian_product() {
        let left = vec![cast(2), cast(2)];
        let right = vec![title(2, "A"), title(3, "B")];
        let results = perform_nested_loop_join(&left, &right);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.title_id == 2 && r.movie_id == 2));
    }
}
