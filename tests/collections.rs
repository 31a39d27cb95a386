use std::collections::{BTreeMap, BTreeSet, VecDeque};

use regex::Regex;

use sheet_mapper::mapping::{
    AutoMap, AutoMapper, ClassMap, CollectionField, DictionaryField, RowMapper,
};
use sheet_mapper::types::Sheet;
use sheet_mapper::MappingError;

#[derive(Debug, Default)]
struct Scores {
    weekly: Vec<u32>,
    unique: BTreeSet<u32>,
    recent: VecDeque<u32>,
    fixed: [u32; 3],
}

fn scores_map() -> ClassMap<Scores> {
    ClassMap::<Scores>::builder()
        .field(
            CollectionField::new("weekly", |s: &mut Scores| &mut s.weekly)
                .column_pattern(Regex::new(r"^Week\d+$").unwrap()),
        )
        .field(CollectionField::new("unique", |s: &mut Scores| &mut s.unique).column_name("All"))
        .field(
            CollectionField::new("recent", |s: &mut Scores| &mut s.recent)
                .column_names(["Week3", "Week2"]),
        )
        .field(
            CollectionField::new("fixed", |s: &mut Scores| &mut s.fixed)
                .column_name("All")
                .separators([',', ';'])
                .remove_empty_entries(),
        )
        .build()
}

#[test]
fn multi_column_and_split_modes() {
    let sheet = Sheet::from_strings(
        Some(&["Name", "Week1", "Week2", "Week3", "All"]),
        &[&["ada", "10", "20", "30", "3,1,3"]],
    );
    let scores = RowMapper::new()
        .map_row_with(&scores_map(), &sheet.row(0).unwrap())
        .unwrap();
    assert_eq!(scores.weekly, vec![10, 20, 30]);
    assert_eq!(scores.recent, VecDeque::from(vec![30, 20]));
    assert_eq!(scores.unique.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(scores.fixed, [3, 1, 3]);
}

#[test]
fn empty_token_in_set_fails_without_element_fallback() {
    let sheet = Sheet::from_strings(
        Some(&["Name", "Week1", "Week2", "Week3", "All"]),
        &[&["ada", "10", "20", "30", "3,,3"]],
    );
    let err = RowMapper::new()
        .map_row_with(&scores_map(), &sheet.row(0).unwrap())
        .unwrap_err();
    assert!(matches!(err, MappingError::EmptyValue { column: 4, .. }));
    assert_eq!(err.member(), Some("unique"));
}

#[test]
fn fixed_array_count_mismatch_is_a_construction_error() {
    let sheet = Sheet::from_strings(
        Some(&["Name", "Week1", "Week2", "Week3", "All"]),
        &[&["ada", "10", "20", "30", "1,2"]],
    );
    let err = RowMapper::new()
        .map_row_with(&scores_map(), &sheet.row(0).unwrap())
        .unwrap_err();
    assert!(matches!(err, MappingError::Construction { .. }));
    assert_eq!(err.member(), Some("fixed"));
}

#[test]
fn required_collection_rejects_empty_cell() {
    #[derive(Debug, Default)]
    struct Tags {
        tags: Vec<String>,
    }
    let map = ClassMap::<Tags>::builder()
        .field(CollectionField::new("tags", |t: &mut Tags| &mut t.tags).required())
        .build();
    let sheet = Sheet::from_strings(Some(&["tags"]), &[&[""], &["a, b"]]);
    let results: Vec<_> = RowMapper::new().map_sheet_with(&map, &sheet).collect();
    assert!(matches!(results[0], Err(MappingError::EmptyValue { .. })));
    assert_eq!(
        results[1].as_ref().unwrap().tags,
        vec!["a".to_string(), "b".to_string()]
    );
}

#[test]
fn element_fallbacks_apply_per_column() {
    #[derive(Debug, Default)]
    struct Readings {
        values: Vec<f64>,
    }
    let map = ClassMap::<Readings>::builder()
        .field(
            CollectionField::new("values", |r: &mut Readings| &mut r.values)
                .column_indices([0, 1, 2])
                .element_empty_fallback(0.0)
                .element_invalid_fallback(f64::NAN),
        )
        .build();
    let sheet = Sheet::from_strings(None, &[&["1.5", "", "bad"]]);
    let readings = RowMapper::new()
        .map_row_with(&map, &sheet.row(0).unwrap())
        .unwrap();
    assert_eq!(readings.values[..2], [1.5, 0.0]);
    assert!(readings.values[2].is_nan());
}

#[derive(Debug, Default)]
struct Survey {
    respondent: String,
    answers: BTreeMap<String, Option<u8>>,
}

impl AutoMap for Survey {
    fn auto_map(map: &mut AutoMapper<'_, Self>) {
        map.scalar("respondent", |s| &mut s.respondent);
        map.field(
            DictionaryField::new("answers", |s: &mut Survey| &mut s.answers)
                .columns_matching(|name, _| name.starts_with('Q')),
        );
    }
}

#[test]
fn dictionary_over_matching_headers() {
    let sheet = Sheet::from_strings(
        Some(&["respondent", "Q1", "Q2", "Notes"]),
        &[&["r1", "5", "", "late"]],
    );
    let survey: Survey = RowMapper::new().map_row(&sheet.row(0).unwrap()).unwrap();
    assert_eq!(survey.respondent, "r1");
    assert_eq!(survey.answers.len(), 2);
    assert_eq!(survey.answers["Q1"], Some(5));
    assert_eq!(survey.answers["Q2"], None);
}

#[test]
fn dictionary_without_matches_is_a_resolution_error() {
    let sheet = Sheet::from_strings(Some(&["respondent", "Notes"]), &[&["r1", "late"]]);
    let err = RowMapper::new()
        .map_row::<Survey>(&sheet.row(0).unwrap())
        .unwrap_err();
    assert!(matches!(err, MappingError::ColumnResolution { .. }));
}

#[test]
fn preserved_formatting_keeps_empty_cells_as_empty_collections() {
    #[derive(Debug, Default)]
    struct Notes {
        lines: Vec<String>,
    }
    let map = ClassMap::<Notes>::builder()
        .field(
            CollectionField::new("lines", |n: &mut Notes| &mut n.lines)
                .column_index(0)
                .separators(['|'])
                .preserve_formatting(),
        )
        .build();
    let sheet = Sheet::from_strings(None, &[&[""], &[" a| b "]]);
    let rows: Vec<Notes> = RowMapper::new()
        .map_sheet_with(&map, &sheet)
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(rows[0].lines.is_empty());
    assert_eq!(rows[1].lines, vec![" a".to_string(), " b ".to_string()]);
}

#[test]
fn dictionary_columns_without_headers_fail_instead_of_colliding() {
    #[derive(Debug, Default)]
    struct Extras {
        values: BTreeMap<String, u8>,
    }
    let map = ClassMap::<Extras>::builder()
        .field(
            DictionaryField::new("values", |e: &mut Extras| &mut e.values).column_indices([0, 1, 2]),
        )
        .build();
    let sheet = Sheet::from_strings(Some(&["A"]), &[&["1", "2", "3"]]);
    let err = RowMapper::new()
        .map_row_with(&map, &sheet.row(0).unwrap())
        .unwrap_err();
    assert!(matches!(err, MappingError::Construction { .. }));
    assert_eq!(err.member(), Some("values"));
}
