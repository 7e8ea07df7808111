use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::alleles::write_allele_table;
use super::reader::read_delimited;
use super::{InputError, read_allele_table, read_prediction_table, read_response_table};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("hla_comborate_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_file(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_read_delimited_skips_blank_lines() {
    let dir = make_temp_dir();
    let path = dir.join("t.tsv");
    write_file(&path, "a\tb\n1\t2\n\t\n\n3\n");

    let table = read_delimited(&path, '\t').unwrap();
    assert_eq!(table.header, vec!["a", "b"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].line_no, 5);
    assert_eq!(table.rows[1].field(1), "");
}

#[test]
fn test_read_delimited_rejects_extra_fields() {
    let dir = make_temp_dir();
    let path = dir.join("t.tsv");
    write_file(&path, "a\tb\n1\t2\t3\n");

    let err = read_delimited(&path, '\t').unwrap_err();
    assert!(matches!(err, InputError::Parse { line: 2, .. }));
}

#[test]
fn test_missing_file() {
    let dir = make_temp_dir();
    let err = read_allele_table(&dir.join("absent.tsv")).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_read_allele_table_gz() {
    let dir = make_temp_dir();
    let path = dir.join("alleles.tsv.gz");
    write_gz(
        &path,
        "D1\tD2\nHLA-DRB1*01:01\tDRB1*03:01\nDQB1*06:02\n",
    );

    let table = read_allele_table(&path).unwrap();
    assert_eq!(table.donors, vec!["D1", "D2"]);
    assert_eq!(table.columns[0], vec!["HLA-DRB1*01:01", "DQB1*06:02"]);
    assert_eq!(table.columns[1], vec!["DRB1*03:01", ""]);
}

#[test]
fn test_read_allele_table_duplicate_donor() {
    let dir = make_temp_dir();
    let path = dir.join("alleles.tsv");
    write_file(&path, "D1\tD1\nDRB1*01:01\tDRB1*03:01\n");

    let err = read_allele_table(&path).unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}

#[test]
fn test_write_allele_table_ragged() {
    let dir = make_temp_dir();
    let path = dir.join("out.tsv");
    let donors = vec!["D1".to_string(), "D2".to_string()];
    let columns = vec![
        vec!["A".to_string(), "B".to_string()],
        vec!["C".to_string()],
    ];
    write_allele_table(&path, &donors, &columns).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "D1\tD2\nA\tC\nB\t\n");
}

#[test]
fn test_read_response_table() {
    let dir = make_temp_dir();
    let path = dir.join("responses.tsv");
    write_file(
        &path,
        "Peptide #\tPeptide_ID\tPeptide_Seq\tDonor_1\tDonor_2\tNotes\n\
         1.0\tp1\tPEPTIDEA\t5\t0\tx\n\
         12\tp12\tPEPTIDEB\tNA\t3.5\t\n",
    );

    let table = read_response_table(&path, "Donor").unwrap();
    assert_eq!(table.donors, vec!["Donor_1", "Donor_2"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].number, 1);
    assert_eq!(table.rows[0].values, vec!["5", "0"]);
    assert_eq!(table.rows[1].values, vec!["NA", "3.5"]);
    assert_eq!(table.max_peptide_number(), 12);
}

#[test]
fn test_read_response_table_duplicate_peptide() {
    let dir = make_temp_dir();
    let path = dir.join("responses.tsv");
    write_file(
        &path,
        "Peptide #\tPeptide_ID\tPeptide_Seq\tDonor_1\n\
         1\tp1\tPEPTIDEA\t5\n\
         2\tp2\tPEPTIDEA\t0\n",
    );

    let err = read_response_table(&path, "Donor").unwrap_err();
    assert!(matches!(err, InputError::Parse { line: 3, .. }));
}

#[test]
fn test_read_response_table_missing_column() {
    let dir = make_temp_dir();
    let path = dir.join("responses.tsv");
    write_file(&path, "Peptide #\tPeptide_Seq\tDonor_1\n1\tPEPTIDEA\t5\n");

    let err = read_response_table(&path, "Donor").unwrap_err();
    match err {
        InputError::MissingColumn { column, .. } => assert_eq!(column, "Peptide_ID"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_read_response_table_without_donors() {
    let dir = make_temp_dir();
    let path = dir.join("responses.tsv");
    write_file(&path, "Peptide #\tPeptide_ID\tPeptide_Seq\n1\tp1\tPEPTIDEA\n");

    let err = read_response_table(&path, "Donor").unwrap_err();
    assert!(matches!(err, InputError::InvalidInput(_)));
}

#[test]
fn test_prediction_binders() {
    let dir = make_temp_dir();
    let path = dir.join("pred.csv");
    write_file(
        &path,
        "allele,peptide,rank\n\
         HLA-DRB1*01:01,PEPTIDEA,2.5\n\
         HLA-DRB1*03:01,PEPTIDEA,40\n\
         HLA-DQB1*06:02,PEPTIDEA,25\n\
         HLA-DRB1*01:01,PEPTIDEB,1\n",
    );

    let table = read_prediction_table(&path).unwrap();
    assert_eq!(table.header_line, "allele,peptide,rank");
    assert_eq!(table.rows_for("PEPTIDEA").count(), 3);

    let binders = table.binders_for("PEPTIDEA", 25.0, "HLA-");
    assert_eq!(binders.len(), 2);
    assert!(binders.contains("DRB1*01:01"));
    assert!(binders.contains("DQB1*06:02"));
    assert!(!binders.contains("DRB1*03:01"));

    assert!(!table.binders_for("PEPTIDEC", 25.0, "HLA-").is_active());
}

#[test]
fn test_prediction_rank_must_be_numeric() {
    let dir = make_temp_dir();
    let path = dir.join("pred.csv");
    write_file(&path, "allele,peptide,rank\nHLA-DRB1*01:01,PEPTIDEA,low\n");

    let err = read_prediction_table(&path).unwrap_err();
    assert!(matches!(err, InputError::Parse { line: 2, .. }));
}
