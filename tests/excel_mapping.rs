#![cfg(feature = "excel_test_writer")]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;

use sheet_mapper::ingestion::excel::read_excel_from_path;
use sheet_mapper::ingestion::{read_sheet_from_path, ExcelSheetSelection, SheetOptions};
use sheet_mapper::mapping::{AutoMap, AutoMapper, RowMapper};
use sheet_mapper::types::RawCellSource;
use sheet_mapper::{MappingError, MappingErrorKind};

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("sheet-mapper-{name}-{nanos}.xlsx"))
}

#[derive(Debug, Default, PartialEq)]
struct Person {
    id: i64,
    name: String,
    score: f64,
    active: bool,
    joined: Option<NaiveDate>,
}

impl AutoMap for Person {
    fn auto_map(map: &mut AutoMapper<'_, Self>) {
        map.scalar("id", |p| &mut p.id);
        map.scalar("name", |p| &mut p.name);
        map.scalar("score", |p| &mut p.score);
        map.scalar("active", |p| &mut p.active);
        map.configure("joined", |p| &mut p.joined, |f| f.optional());
    }
}

fn write_people_xlsx(path: &PathBuf, id_as_string: bool) {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Sheet1").unwrap();

    // header
    ws.write_string(0, 0, "id").unwrap();
    ws.write_string(0, 1, "name").unwrap();
    ws.write_string(0, 2, "score").unwrap();
    ws.write_string(0, 3, "active").unwrap();
    ws.write_string(0, 4, "joined").unwrap();

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let joined = ExcelDateTime::from_ymd(2024, 3, 1).unwrap();

    // row 1
    if id_as_string {
        ws.write_string(1, 0, "1").unwrap();
    } else {
        ws.write_number(1, 0, 1).unwrap();
    }
    ws.write_string(1, 1, "Ada").unwrap();
    ws.write_number(1, 2, 98.5).unwrap();
    ws.write_boolean(1, 3, true).unwrap();
    ws.write_datetime_with_format(1, 4, &joined, &date_format).unwrap();

    // row 2
    if id_as_string {
        ws.write_string(2, 0, "2").unwrap();
    } else {
        ws.write_number(2, 0, 2).unwrap();
    }
    ws.write_string(2, 1, "Grace").unwrap();
    ws.write_number(2, 2, 87.25).unwrap();
    ws.write_boolean(2, 3, false).unwrap();

    // Second sheet with a shifted table.
    let ws2 = wb.add_worksheet();
    ws2.set_name("Other").unwrap();
    ws2.write_string(2, 0, "id").unwrap();
    ws2.write_string(2, 1, "name").unwrap();
    ws2.write_string(2, 2, "score").unwrap();
    ws2.write_string(2, 3, "active").unwrap();
    ws2.write_number(3, 0, 3).unwrap();
    ws2.write_string(3, 1, "Linus").unwrap();
    ws2.write_string(3, 2, "not a number").unwrap();
    ws2.write_string(3, 3, "yes").unwrap();

    wb.save(path).unwrap();
}

#[test]
fn map_excel_first_sheet() {
    let path = tmp_file("people");
    write_people_xlsx(&path, false);

    let sheet = read_excel_from_path(&path, None, true).unwrap();
    let people: Vec<Person> = RowMapper::new()
        .map_sheet(&sheet)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(people.len(), 2);
    assert_eq!(
        people[0],
        Person {
            id: 1,
            name: "Ada".to_string(),
            score: 98.5,
            active: true,
            joined: NaiveDate::from_ymd_opt(2024, 3, 1),
        }
    );
    assert_eq!(people[1].joined, None);
}

#[test]
fn map_excel_accepts_numeric_text() {
    let path = tmp_file("people-text");
    write_people_xlsx(&path, true);

    let sheet = read_excel_from_path(&path, Some("Sheet1"), true).unwrap();
    let first: Person = RowMapper::new().map_row(&sheet.row(0).unwrap()).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(first.id, 1);
}

#[test]
fn named_sheet_keeps_workbook_row_numbers() {
    let path = tmp_file("people-other");
    write_people_xlsx(&path, false);

    let opts = SheetOptions {
        excel_sheet_selection: ExcelSheetSelection::Sheet("Other".to_string()),
        ..Default::default()
    };
    let sheet = read_sheet_from_path(&path, &opts).unwrap();
    std::fs::remove_file(&path).ok();

    let row = sheet.row(0).unwrap();
    assert_eq!(row.row_number(), 4);
    let err = RowMapper::new().map_row::<Person>(&row).unwrap_err();
    match err {
        MappingError::UnparsableValue { row, member, .. } => {
            assert_eq!(row, 4);
            assert_eq!(member, "score");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unknown_sheet_is_a_source_error() {
    let path = tmp_file("people-missing");
    write_people_xlsx(&path, false);
    let err = read_excel_from_path(&path, Some("Nope"), true).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert_eq!(err.kind(), MappingErrorKind::Source);
}
