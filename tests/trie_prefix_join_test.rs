// Integration tests for the concurrent trie prefix join and parallel sort.

use joinforge::config::JoinConfig;
use joinforge::join::{perform_join, JoinAlgorithm};
use joinforge::record::{BoundedBytes, CastRecord, TitleRecord};
use joinforge::sort::parallel_merge_sort;

fn cast_with_note(note: &str, id: i32) -> CastRecord {
    CastRecord {
        cast_info_id: id,
        note: BoundedBytes::new(note.as_bytes()),
        ..Default::default()
    }
}

fn title_with_text(text: &str, id: i32) -> TitleRecord {
    TitleRecord {
        title_id: id,
        title: BoundedBytes::new(text.as_bytes()),
        ..Default::default()
    }
}

#[test]
fn prefix_join_matches_every_ancestor_not_just_the_deepest() {
    let left = vec![cast_with_note("star", 1), cast_with_note("starship", 2)];
    let right = vec![
        title_with_text("star", 10),
        title_with_text("starship troopers", 20),
        title_with_text("unrelated", 30),
    ];
    let config = JoinConfig::with_threads(2);

    let results = perform_join(JoinAlgorithm::TriePrefix, &left, &right, &config).unwrap();

    // "star" is a prefix of both "star" and "starship troopers"; "starship" is a
    // prefix only of "starship troopers".
    let matches_for = |cast_info_id: i32| {
        results
            .iter()
            .filter(|r| r.cast_info_id == cast_info_id)
            .count()
    };
    assert_eq!(matches_for(1), 2);
    assert_eq!(matches_for(2), 1);
}

#[test]
fn prefix_join_finds_nothing_when_no_title_extends_the_note() {
    let left = vec![cast_with_note("zzz-no-match", 1)];
    let right = vec![title_with_text("completely different", 10)];
    let config = JoinConfig::with_threads(2);

    let results = perform_join(JoinAlgorithm::TriePrefix, &left, &right, &config).unwrap();
    assert!(results.is_empty());
}

#[test]
fn parallel_merge_sort_agrees_with_std_sort() {
    let mut data: Vec<i32> = (0..5_000).map(|i| (i * 2654435761u32) as i32 % 9973).collect();
    let mut expected = data.clone();
    expected.sort();

    parallel_merge_sort(&mut data, &|a: &i32, b: &i32| a.cmp(b));
    assert_eq!(data, expected);
}

#[test]
fn parallel_merge_sort_is_idempotent_on_already_sorted_input() {
    let mut data: Vec<i32> = (0..2_000).collect();
    let expected = data.clone();
    parallel_merge_sort(&mut data, &|a: &i32, b: &i32| a.cmp(b));
    assert_eq!(data, expected);
}
