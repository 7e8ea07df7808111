use super::binders::BinderList;
use super::ids::{HlaId, group_name, locus_of};
use super::matrix::{AlleleMatrix, AlleleRow};
use super::params::EngineParams;
use super::stats::{ContingencyRow, Metric, Quadrants};

#[test]
fn test_locus_of() {
    assert_eq!(locus_of("DRB1*03:01"), "DR");
    assert_eq!(locus_of("DQA1*01:02/DQB1*06:02"), "DQ");
    assert_eq!(locus_of("D"), "D");
}

#[test]
fn test_group_name_includes_iteration() {
    let members = vec!["DRB1*01:01".to_string(), "DRB1*03:01".to_string()];
    assert_eq!(group_name(1, &members, '+'), "1+DRB1*01:01+DRB1*03:01");
}

#[test]
fn test_hla_id_display_and_members() {
    let allele = HlaId::allele("DPB1*04:01");
    assert!(!allele.is_group());
    assert!(allele.members().is_empty());
    assert_eq!(allele.to_string(), "DPB1*04:01");

    let group = HlaId::Group {
        name: "1+A+B".to_string(),
        members: vec!["A".to_string(), "B".to_string()],
    };
    assert!(group.is_group());
    assert_eq!(group.as_str(), "1+A+B");
    assert_eq!(group.members().len(), 2);
}

#[test]
fn test_binder_list_activity() {
    let empty = BinderList::default();
    assert!(!empty.is_active());

    let mut list: BinderList = ["DRB1*01:01", "DQB1*06:02"].into_iter().collect();
    assert!(list.is_active());
    assert!(list.contains("DRB1*01:01"));
    assert!(!list.contains("DRB1*03:01"));
    list.insert("1+DRB1*01:01+DQB1*06:02");
    assert_eq!(list.len(), 3);
}

#[test]
fn test_matrix_lookup() {
    let matrix = AlleleMatrix {
        donors: vec!["D1".to_string(), "D2".to_string()],
        rows: vec![AlleleRow {
            id: HlaId::allele("DRB1*01:01"),
            cells: vec![Some(1), None],
        }],
    };
    assert_eq!(matrix.n_rows(), 1);
    assert_eq!(matrix.n_donors(), 2);
    assert_eq!(
        matrix.row("DRB1*01:01").map(|r| r.cells.clone()),
        Some(vec![Some(1), None])
    );
    assert!(matrix.row("DQB1*06:02").is_none());
}

#[test]
fn test_metric_ratio() {
    assert_eq!(Metric::ratio(3.0, 0.0), Metric::Undefined);
    assert_eq!(Metric::ratio(3.0, 2.0).value(), Some(1.5));
    assert!(!Metric::Value(0.0).is_positive());
    assert!(!Metric::Undefined.is_positive());
}

#[test]
fn test_contingency_key() {
    let row = ContingencyRow {
        hla: HlaId::allele("DRB1*01:01"),
        peptide: "PEPTIDEA".to_string(),
        counts: Quadrants {
            ap_rp: 1,
            an_rp: 2,
            ap_rn: 3,
            an_rn: 4,
        },
    };
    assert_eq!(row.key('_'), "DRB1*01:01_PEPTIDEA");
    assert_eq!(row.counts.total(), 10);
}

#[test]
fn test_params_defaults() {
    let mut params = EngineParams::default_v1();
    assert!(params.is_null_token(""));
    assert!(params.is_null_token("N/A"));
    assert!(!params.is_null_token("DRB1*01:01"));
    assert_eq!(params.iteration_cap(12), 12);
    params.max_iterations = Some(3);
    assert_eq!(params.iteration_cap(12), 3);
}
