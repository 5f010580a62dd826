//! Grouping, search, sort and paging over stored records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use cbh_model::{CanonicalId, CanonicalRecord, FieldKey, FieldValue, IdKind, Identifiers};
use cbh_report::{SortDirection, SortSpec, TableQuery, group_by_sample};

fn record(sample: u64, values: &[(FieldKey, FieldValue)]) -> CanonicalRecord {
    CanonicalRecord {
        id: format!("rec-{sample}-{}", values.len()),
        identifiers: Identifiers {
            donor: CanonicalId::mint(IdKind::Donor, sample),
            master: CanonicalId::mint(IdKind::Master, sample),
            sample: CanonicalId::mint(IdKind::Sample, sample),
        },
        values: values.iter().cloned().collect::<BTreeMap<_, _>>(),
    }
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

fn samples_with_ages(ages: &[Option<f64>]) -> Vec<CanonicalRecord> {
    ages.iter()
        .enumerate()
        .map(|(index, age)| {
            let values: Vec<_> = age
                .map(|age| (FieldKey::Age, FieldValue::Number(age)))
                .into_iter()
                .collect();
            record(index as u64 + 1, &values)
        })
        .collect()
}

#[test]
fn rows_sharing_a_sample_are_merged() {
    let records = vec![
        record(
            1,
            &[
                (FieldKey::Age, FieldValue::Number(34.0)),
                (FieldKey::LabParameter, text("HbA1c")),
                (FieldKey::ResultNumerical, FieldValue::Number(5.5)),
            ],
        ),
        record(2, &[(FieldKey::Age, FieldValue::Number(20.0))]),
        record(
            1,
            &[
                (FieldKey::Age, FieldValue::Number(40.0)),
                (FieldKey::LabParameter, text("CRP")),
            ],
        ),
    ];

    let rows = group_by_sample(&records);
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.sample_id().as_str(), "CBHS1");
    assert_eq!(first.row_count(), 2);
    assert_eq!(first.text(FieldKey::Age).as_deref(), Some("34"));
    assert_eq!(first.text(FieldKey::LabParameter).as_deref(), Some("HbA1c; CRP"));
    // Nulls are left out of per-result lists.
    assert_eq!(first.list(FieldKey::ResultNumerical), &[FieldValue::Number(5.5)]);
    assert_eq!(first.text(FieldKey::ResultNumerical).as_deref(), Some("5.5"));

    let second = &rows[1];
    assert_eq!(second.sample_id().as_str(), "CBHS2");
    assert_eq!(second.text(FieldKey::LabParameter), None);
    assert!(second.list(FieldKey::Age).is_empty());
}

#[test]
fn default_view_shows_default_columns_in_schema_order() {
    let rows = group_by_sample(&samples_with_ages(&[Some(30.0)]));
    let page = TableQuery::default().run(&rows);
    assert_eq!(
        page.headers(),
        vec![
            "CBH Donor ID",
            "CBH Sample ID",
            "Price",
            "Quantity",
            "Unit",
            "Matrix",
            "Gender",
            "Age",
        ]
    );
    assert_eq!(page.page, 1);
    assert_eq!(page.page_count, 1);
    assert_eq!(page.total, 1);
}

#[test]
fn chosen_columns_follow_schema_order() {
    let mut query = TableQuery::new();
    query.set_columns([FieldKey::Age, FieldKey::SampleId, FieldKey::Age]);
    assert_eq!(query.columns(), &[FieldKey::SampleId, FieldKey::Age]);

    query.toggle_column(FieldKey::DonorId);
    assert_eq!(
        query.columns(),
        &[FieldKey::DonorId, FieldKey::SampleId, FieldKey::Age]
    );
    query.toggle_column(FieldKey::SampleId);
    assert_eq!(query.columns(), &[FieldKey::DonorId, FieldKey::Age]);

    query.set_columns([]);
    assert_eq!(query.columns().len(), 8);
}

#[test]
fn search_matches_visible_cells_case_insensitively() {
    let records = vec![
        record(1, &[(FieldKey::Matrix, text("Serum"))]),
        record(2, &[(FieldKey::Matrix, text("Plasma"))]),
        record(3, &[(FieldKey::Diagnosis, text("serum sickness"))]),
    ];
    let rows = group_by_sample(&records);

    let mut query = TableQuery::new();
    query.search = Some("  SERUM ".to_string());
    let page = query.run(&rows);
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].sample_id().as_str(), "CBHS1");

    query.toggle_column(FieldKey::Diagnosis);
    assert_eq!(query.run(&rows).total, 2);

    query.search = Some(String::new());
    assert_eq!(query.run(&rows).total, 3);
}

#[test]
fn sorting_puts_nulls_last_in_both_directions() {
    let rows = group_by_sample(&samples_with_ages(&[Some(40.0), None, Some(9.0), Some(25.0)]));
    let mut query = TableQuery::new();

    query.sort = Some(SortSpec {
        field: FieldKey::Age,
        direction: SortDirection::Ascending,
    });
    let ascending: Vec<_> = query
        .run(&rows)
        .rows
        .iter()
        .map(|row| row.text(FieldKey::Age))
        .collect();
    assert_eq!(
        ascending,
        vec![
            Some("9".to_string()),
            Some("25".to_string()),
            Some("40".to_string()),
            None
        ]
    );

    query.sort = Some(SortSpec {
        field: FieldKey::Age,
        direction: SortDirection::Descending,
    });
    let descending: Vec<_> = query
        .run(&rows)
        .rows
        .iter()
        .map(|row| row.text(FieldKey::Age))
        .collect();
    assert_eq!(
        descending,
        vec![
            Some("40".to_string()),
            Some("25".to_string()),
            Some("9".to_string()),
            None
        ]
    );
}

#[test]
fn dates_sort_chronologically() {
    let date = |y, m, d| FieldValue::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"));
    let records = vec![
        record(1, &[(FieldKey::DateOfCollection, date(2022, 11, 2))]),
        record(2, &[(FieldKey::DateOfCollection, date(2021, 12, 31))]),
        record(3, &[(FieldKey::DateOfCollection, date(2022, 2, 10))]),
    ];
    let rows = group_by_sample(&records);
    let mut query = TableQuery::new();
    query.sort = Some(SortSpec {
        field: FieldKey::DateOfCollection,
        direction: SortDirection::Ascending,
    });
    let order: Vec<_> = query
        .run(&rows)
        .rows
        .iter()
        .map(|row| row.sample_id().as_str().to_string())
        .collect();
    assert_eq!(order, vec!["CBHS2", "CBHS3", "CBHS1"]);
}

#[test]
fn identifiers_sort_by_counter() {
    let records: Vec<_> = [1_000_000, 999, 25]
        .into_iter()
        .map(|sample| record(sample, &[]))
        .collect();
    let rows = group_by_sample(&records);
    let mut query = TableQuery::new();
    query.sort = Some(SortSpec {
        field: FieldKey::SampleId,
        direction: SortDirection::Ascending,
    });
    let order: Vec<_> = query
        .run(&rows)
        .rows
        .iter()
        .map(|row| row.sample_id().as_str().to_string())
        .collect();
    assert_eq!(order, vec!["CBHS25", "CBHS999", "CBHS1000000"]);

    query.sort = Some(SortSpec {
        field: FieldKey::DonorId,
        direction: SortDirection::Descending,
    });
    let first = query.run(&rows).rows[0].sample_id().as_str().to_string();
    assert_eq!(first, "CBHS1000000");
}

#[test]
fn pages_slice_the_matching_rows() {
    let ages: Vec<Option<f64>> = (0..120).map(|age| Some(f64::from(age))).collect();
    let rows = group_by_sample(&samples_with_ages(&ages));
    let mut query = TableQuery::new();

    let page = query.run(&rows);
    assert_eq!(page.page_count, 3);
    assert_eq!(page.rows.len(), 50);

    query.page = 3;
    let page = query.run(&rows);
    assert_eq!(page.rows.len(), 20);
    assert_eq!(page.rows[0].text(FieldKey::Age).as_deref(), Some("100"));

    query.page = 4;
    assert!(query.run(&rows).rows.is_empty());
}

#[test]
fn cells_render_visible_columns() {
    let records = vec![
        record(
            7,
            &[
                (FieldKey::Matrix, text("Serum")),
                (FieldKey::LabParameter, text("CRP")),
            ],
        ),
        record(7, &[(FieldKey::LabParameter, text("IgG"))]),
    ];
    let rows = group_by_sample(&records);
    let mut query = TableQuery::new();
    query.set_columns([FieldKey::LabParameter, FieldKey::Matrix, FieldKey::Unit, FieldKey::SampleId]);
    let page = query.run(&rows);

    let rendered = page
        .cells()
        .iter()
        .map(|cells| cells.join(" | "))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(rendered, @"CBHS7 |  | Serum | CRP; IgG");
}

#[test]
fn sort_direction_parses() {
    assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Descending));
    assert_eq!("ascending".parse::<SortDirection>(), Ok(SortDirection::Ascending));
    assert!("up".parse::<SortDirection>().is_err());
}

proptest! {
    #[test]
    fn paging_covers_every_row_once(total in 0usize..300, page_size in 1usize..60) {
        let ages: Vec<Option<f64>> = vec![None; total];
        let rows = group_by_sample(&samples_with_ages(&ages));
        let mut query = TableQuery::new();
        query.page_size = page_size;

        let first = query.run(&rows);
        prop_assert_eq!(first.total, total);
        prop_assert_eq!(first.page_count, total.div_ceil(page_size));

        let mut seen = 0;
        for page in 1..=first.page_count {
            query.page = page;
            let rows_on_page = query.run(&rows).rows.len();
            prop_assert!(rows_on_page >= 1 && rows_on_page <= page_size);
            seen += rows_on_page;
        }
        prop_assert_eq!(seen, total);
    }
}
