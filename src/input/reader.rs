use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

use crate::input::InputError;

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[derive(Debug, Clone)]
pub struct TableRow {
    pub line_no: usize,
    pub raw: String,
    pub fields: Vec<String>,
}

impl TableRow {
    pub fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Header-indexed delimited text table. Rows may be ragged.
#[derive(Debug, Clone)]
pub struct DelimitedTable {
    pub path: PathBuf,
    pub header_line: String,
    pub header: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl DelimitedTable {
    pub fn column(&self, name: &str) -> Result<usize, InputError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| InputError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }
}

pub fn read_delimited(path: &Path, sep: char) -> Result<DelimitedTable, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(InputError::parse(path, 1, "file is empty"));
    }
    let header_line = buf.trim_end_matches(['\n', '\r']).to_string();
    let header: Vec<String> = header_line
        .split(sep)
        .map(|s| s.trim().to_string())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(InputError::parse(path, 1, "header is empty"));
    }

    let mut rows = Vec::new();
    let mut line_no = 1usize;
    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end_matches(['\n', '\r']);
        let fields: Vec<String> = line.split(sep).map(|s| s.trim().to_string()).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        if fields.len() > header.len() {
            return Err(InputError::parse(
                path,
                line_no,
                format!(
                    "{} fields but header has {} columns",
                    fields.len(),
                    header.len()
                ),
            ));
        }
        rows.push(TableRow {
            line_no,
            raw: line.to_string(),
            fields,
        });
    }

    Ok(DelimitedTable {
        path: path.to_path_buf(),
        header_line,
        header,
        rows,
    })
}
