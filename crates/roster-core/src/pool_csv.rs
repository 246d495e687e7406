//! CSV pool importer: header-aliased, quote-aware parsing of an importable
//! partner pool document.

use std::collections::BTreeMap;
use std::fmt;

use contracts::PoolPartner;

use crate::store::{make_pool_partner, PoolEntryInput};

#[derive(Debug, PartialEq, Eq)]
pub enum PoolCsvError {
    /// Fewer than two lines, or zero rows survived validation. The caller
    /// decides whether this is a hard error or a no-op.
    EmptyResult,
}

impl fmt::Display for PoolCsvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResult => write!(f, "csv document produced no pool entries"),
        }
    }
}

impl std::error::Error for PoolCsvError {}

const ID_ALIASES: [&str; 4] = ["id", "partner_id", "파트너id", "파트너 id"];
const NAME_ALIASES: [&str; 5] = ["name", "partner_name", "이름", "파트너명", "partner"];
const GRADE_ALIASES: [&str; 2] = ["grade", "등급"];
const CLASS_ALIASES: [&str; 3] = ["class", "clazz", "클래스"];
const JOB_ALIASES: [&str; 2] = ["job", "직업"];
const BRIEF_ALIASES: [&str; 4] = ["brief_key", "brief", "간단키", "간단프로필키"];
const DETAIL_ALIASES: [&str; 4] = ["detail_key", "detail", "상세키", "상세프로필키"];

/// Splits one CSV line with RFC4180-style quoting: doubled quotes escape a
/// quote, commas inside quotes do not split. Cells come back trimmed.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut value = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    value.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                cells.push(value.trim().to_string());
                value.clear();
            }
            other => value.push(other),
        }
    }
    cells.push(value.trim().to_string());
    cells
}

fn resolve_header_index(headers: &[String], aliases: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();
    aliases
        .iter()
        .find_map(|alias| lowered.iter().position(|header| header == &alias.to_lowercase()))
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> Option<&'a str> {
    index.and_then(|index| row.get(index)).map(String::as_str)
}

/// Parses a whole CSV document into a pool keyed by derived id. Rows with a
/// blank resolved name are skipped; the last row with a given id wins.
pub fn parse_pool_csv(csv_text: &str) -> Result<BTreeMap<String, PoolPartner>, PoolCsvError> {
    let lines: Vec<&str> = csv_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(PoolCsvError::EmptyResult);
    }

    let headers = parse_csv_line(lines[0]);
    let id_idx = resolve_header_index(&headers, &ID_ALIASES);
    let name_idx = resolve_header_index(&headers, &NAME_ALIASES);
    let grade_idx = resolve_header_index(&headers, &GRADE_ALIASES);
    let class_idx = resolve_header_index(&headers, &CLASS_ALIASES);
    let job_idx = resolve_header_index(&headers, &JOB_ALIASES);
    let brief_idx = resolve_header_index(&headers, &BRIEF_ALIASES);
    let detail_idx = resolve_header_index(&headers, &DETAIL_ALIASES);

    let mut pool = BTreeMap::new();
    for line in &lines[1..] {
        let row = parse_csv_line(line);
        let name = cell(&row, name_idx).unwrap_or_default();
        if name.trim().is_empty() {
            continue;
        }
        let entry = make_pool_partner(PoolEntryInput {
            id: cell(&row, id_idx).unwrap_or(name),
            name,
            grade: cell(&row, grade_idx).unwrap_or("D"),
            class: cell(&row, class_idx).unwrap_or("support"),
            job: cell(&row, job_idx).unwrap_or_default(),
            brief_key: cell(&row, brief_idx),
            detail_key: cell(&row, detail_idx),
        });
        pool.insert(entry.id.clone(), entry);
    }

    if pool.is_empty() {
        return Err(PoolCsvError::EmptyResult);
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PartnerClass, PartnerGrade};

    #[test]
    fn quoted_cells_keep_commas_and_escaped_quotes() {
        let cells = parse_csv_line(r#""Aria, the Swift","S","say ""hi""",dps"#);
        assert_eq!(cells, vec!["Aria, the Swift", "S", r#"say "hi""#, "dps"]);
    }

    #[test]
    fn header_aliases_are_case_insensitive_and_localized() {
        let csv = "파트너명,등급,클래스,직업\nAria,S,dps,Pilot\n";
        let pool = parse_pool_csv(csv).expect("parse");
        let aria = pool.get("aria").expect("aria");
        assert_eq!(aria.name, "Aria");
        assert_eq!(aria.grade, PartnerGrade::S);
        assert_eq!(aria.class, PartnerClass::Dps);
        assert_eq!(aria.job, "Pilot");
    }

    #[test]
    fn round_trip_with_quoted_row_derives_id() {
        let csv = "Name,Grade,Class,Job\n\"Aria\",\"S\",\"dps\",\"Pilot\"\n";
        let pool = parse_pool_csv(csv).expect("parse");
        assert_eq!(pool.len(), 1);
        let aria = &pool["aria"];
        assert_eq!(aria.id, "aria");
        assert_eq!(aria.name, "Aria");
        assert_eq!(aria.grade, PartnerGrade::S);
    }

    #[test]
    fn blank_names_skip_and_last_id_wins() {
        let csv = "name,grade\n,\n  ,S\nVex,B\nVex,A\n";
        let pool = parse_pool_csv(csv).expect("parse");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool["vex"].grade, PartnerGrade::A);
    }

    #[test]
    fn header_only_or_all_invalid_is_empty_result() {
        assert_eq!(parse_pool_csv("name,grade\n"), Err(PoolCsvError::EmptyResult));
        assert_eq!(parse_pool_csv(""), Err(PoolCsvError::EmptyResult));
        assert_eq!(
            parse_pool_csv("name,grade\n,\n,\n"),
            Err(PoolCsvError::EmptyResult)
        );
    }

    #[test]
    fn missing_optional_columns_fall_back() {
        let csv = "name\nEcho\n";
        let pool = parse_pool_csv(csv).expect("parse");
        let echo = &pool["echo"];
        assert_eq!(echo.grade, PartnerGrade::D);
        assert_eq!(echo.class, PartnerClass::Support);
        assert_eq!(echo.brief_key, "{{PARTNER_BRIEF_ECHO}}");
    }
}
