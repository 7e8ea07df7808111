use std::fmt;

/// Identifier of an allele-matrix row: either a typed allele or a composite group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HlaId {
    Allele(String),
    Group { name: String, members: Vec<String> },
}

impl HlaId {
    pub fn allele(code: impl Into<String>) -> Self {
        HlaId::Allele(code.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            HlaId::Allele(code) => code,
            HlaId::Group { name, .. } => name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, HlaId::Group { .. })
    }

    pub fn members(&self) -> &[String] {
        match self {
            HlaId::Allele(_) => &[],
            HlaId::Group { members, .. } => members,
        }
    }
}

impl fmt::Display for HlaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locus of an allele code: its first two characters ("DRB1*03:01" -> "DR").
pub fn locus_of(code: &str) -> &str {
    match code.char_indices().nth(2) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

/// Group names carry the iteration that created them: `"{iteration}+A+B"`.
pub fn group_name(iteration: usize, members: &[String], separator: char) -> String {
    let mut name = iteration.to_string();
    for member in members {
        name.push(separator);
        name.push_str(member);
    }
    name
}
