//! Delimited survey text parsing.
//!
//! Every export carries a header row and a disposable trailing row: the
//! first line is always skipped and the last line is always dropped, even
//! when it holds data. Fields that fail to parse never abort the parse;
//! they become `None` (or the column's sentinel) and are collected as
//! [`MalformedField`]s next to the records.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use mobility_map_survey_models::{
    AgeRange, EducationStat, Gender, IncomeStat, MalformedField, SurveyDataset, VisitorRecord,
    VisitorType, ZoneId,
};

use crate::{SurveyError, SurveyFormat};

/// Name used in [`SurveyError::DataUnavailable`] for text handed in directly.
const INLINE_SOURCE: &str = "inline text";

/// First extended-format column holding a zone percentage. Also the zone
/// id column of the simple format.
const ZONE_COLUMN: usize = 11;

/// Records parsed from one file, plus the fields that had to be replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub malformed: Vec<MalformedField>,
}

impl<T> Parsed<T> {
    /// Appends this file's malformed fields to a dataset report and returns
    /// the records.
    pub fn into_records(self, report: &mut Vec<MalformedField>) -> Vec<T> {
        report.extend(self.malformed);
        self.records
    }
}

/// Parses the visitor survey in the given layout.
///
/// # Errors
///
/// * If the text is empty
/// * If the delimited text cannot be tokenized
pub fn parse_survey(
    text: &str,
    format: SurveyFormat,
) -> Result<Parsed<VisitorRecord>, SurveyError> {
    match format {
        SurveyFormat::Simple => parse_visitors_simple(text),
        SurveyFormat::Extended => parse_visitors_extended(text),
    }
}

/// Parses the comma-delimited layout, where column 11 names the zone the
/// row's visitors were counted in.
///
/// # Errors
///
/// * If the text is empty
/// * If the delimited text cannot be tokenized
pub fn parse_visitors_simple(text: &str) -> Result<Parsed<VisitorRecord>, SurveyError> {
    parse_rows(text, SurveyFormat::Simple.delimiter(), |row| {
        let mut record = visitor_columns(row);
        record.zone_id = row.number(ZONE_COLUMN, "zone id");
        record
    })
}

/// Parses the semicolon-delimited layout, where columns 11 onward hold the
/// percentage of the row's visitors seen in each zone.
///
/// Each percentage becomes `floor(count * pct / 100)` visitors under the
/// column's zero-based index. Zero headcounts are left out of the
/// distribution entirely.
///
/// # Errors
///
/// * If the text is empty
/// * If the delimited text cannot be tokenized
pub fn parse_visitors_extended(text: &str) -> Result<Parsed<VisitorRecord>, SurveyError> {
    parse_rows(text, SurveyFormat::Extended.delimiter(), |row| {
        let mut record = visitor_columns(row);
        record.distribution = distribution(row, record.visitor_count);
        record
    })
}

/// Parses the income summary (`location;year;age;count;average income`).
///
/// # Errors
///
/// * If the text is empty
/// * If the delimited text cannot be tokenized
pub fn parse_income(text: &str) -> Result<Parsed<IncomeStat>, SurveyError> {
    parse_rows(text, b';', |row| IncomeStat {
        location: row.text(0).to_string(),
        year: row.number(1, "year"),
        age_range: row.age_range(2),
        count: row.number(3, "count"),
        average_income: row.decimal(4, "average income"),
    })
}

/// Parses the education summary (`location;year;age;count;level`).
///
/// # Errors
///
/// * If the text is empty
/// * If the delimited text cannot be tokenized
pub fn parse_education(text: &str) -> Result<Parsed<EducationStat>, SurveyError> {
    parse_rows(text, b';', |row| EducationStat {
        location: row.text(0).to_string(),
        year: row.number(1, "year"),
        age_range: row.age_range(2),
        count: row.number(3, "count"),
        education_level: row.text(4).to_string(),
    })
}

/// Assembles a dataset from already-fetched texts.
///
/// # Errors
///
/// * If any of the texts is empty
/// * If any of the texts cannot be tokenized
pub fn parse_dataset(
    visitors: &str,
    format: SurveyFormat,
    income: Option<&str>,
    education: Option<&str>,
) -> Result<SurveyDataset, SurveyError> {
    let mut malformed = Vec::new();
    let visitors = parse_survey(visitors, format)?.into_records(&mut malformed);
    let income = match income {
        Some(text) => parse_income(text)?.into_records(&mut malformed),
        None => Vec::new(),
    };
    let education = match education {
        Some(text) => parse_education(text)?.into_records(&mut malformed),
        None => Vec::new(),
    };

    if !malformed.is_empty() {
        log::warn!("{} malformed fields while parsing survey data", malformed.len());
    }

    Ok(SurveyDataset {
        visitors,
        income,
        education,
        malformed,
    })
}

fn parse_rows<T>(
    text: &str,
    delimiter: u8,
    mut parse: impl FnMut(&mut Row<'_>) -> T,
) -> Result<Parsed<T>, SurveyError> {
    if text.trim().is_empty() {
        return Err(SurveyError::DataUnavailable {
            source_name: INLINE_SOURCE.to_string(),
        });
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut parsed = Parsed {
        records: Vec::new(),
        malformed: Vec::new(),
    };

    // Header plus the trailing line leave nothing to parse.
    if lines.len() < 3 {
        return Ok(parsed);
    }
    let body = lines[1..lines.len() - 1].join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        // One line is one record; quotes are ordinary characters.
        .quoting(false)
        .from_reader(body.as_bytes());

    for result in reader.records() {
        let record = result?;
        // Body line 1 is source line 2.
        let line = record.position().map_or(0, |pos| pos.line() + 1);
        let mut row = Row {
            record: &record,
            line,
            malformed: &mut parsed.malformed,
        };
        parsed.records.push(parse(&mut row));
    }

    log::debug!(
        "Parsed {} rows ({} malformed fields)",
        parsed.records.len(),
        parsed.malformed.len()
    );

    Ok(parsed)
}

/// Columns 0 through 10, shared by both visitor layouts.
fn visitor_columns(row: &mut Row<'_>) -> VisitorRecord {
    let timestamp = row.timestamp();
    let age_range = row.age_range(7);

    let visitor_type = row.label::<VisitorType>(8, "visitor type");
    let gender = row
        .label::<Gender>(9, "gender")
        .unwrap_or(Gender::Unspecified);

    VisitorRecord {
        location: row.text(0).to_string(),
        timestamp,
        domestic: row.text(5).eq_ignore_ascii_case("true"),
        catchment: row.text(6).to_string(),
        age_range,
        gender,
        visitor_type,
        visitor_count: row.number(10, "visitor count"),
        zone_id: None,
        distribution: None,
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn distribution(row: &mut Row<'_>, visitor_count: Option<u64>) -> Option<BTreeMap<ZoneId, u64>> {
    if row.record.len() <= ZONE_COLUMN {
        return None;
    }

    let mut zones = BTreeMap::new();
    for index in ZONE_COLUMN..row.record.len() {
        // Trailing delimiters leave blank cells; they are zero, not errors.
        if row.text(index).is_empty() {
            continue;
        }
        let column = format!("zone {index}");
        let Some(percentage) = row.decimal(index, &column) else {
            continue;
        };
        if !percentage.is_finite() || percentage < 0.0 {
            row.report(index, &column);
            continue;
        }
        let (Some(count), Ok(zone)) = (visitor_count, ZoneId::try_from(index)) else {
            continue;
        };

        let headcount = (count as f64 * percentage / 100.0).floor();
        if headcount >= 1.0 {
            zones.insert(zone, headcount as u64);
        }
    }

    Some(zones)
}

/// One tokenized row and the report its failures go to.
struct Row<'a> {
    record: &'a StringRecord,
    line: u64,
    malformed: &'a mut Vec<MalformedField>,
}

impl Row<'_> {
    /// Trimmed field text; missing trailing fields read as empty.
    fn text(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("").trim()
    }

    fn report(&mut self, index: usize, column: &str) {
        let value = self.text(index).to_string();
        self.malformed.push(MalformedField {
            line: self.line,
            column: column.to_string(),
            value,
        });
    }

    fn number<T: FromStr>(&mut self, index: usize, column: &str) -> Option<T> {
        let parsed = self.text(index).parse().ok();
        if parsed.is_none() {
            self.report(index, column);
        }
        parsed
    }

    /// Parses a decimal that may use `,` as its separator.
    fn decimal(&mut self, index: usize, column: &str) -> Option<f64> {
        let parsed = self.text(index).replace(',', ".").parse().ok();
        if parsed.is_none() {
            self.report(index, column);
        }
        parsed
    }

    fn label<T: FromStr>(&mut self, index: usize, column: &str) -> Option<T> {
        let parsed = T::from_str(self.text(index)).ok();
        if parsed.is_none() {
            self.report(index, column);
        }
        parsed
    }

    fn age_range(&mut self, index: usize) -> AgeRange {
        self.label(index, "age range").unwrap_or(AgeRange::Unknown)
    }

    fn timestamp(&mut self) -> Option<NaiveDateTime> {
        let year = self.number::<i32>(1, "year");
        let month = self.number::<u32>(2, "month");
        let day = self.number::<u32>(3, "day");
        let hour = self.number::<u32>(4, "hour");
        let (year, month, day, hour) = (year?, month?, day?, hour?);

        let timestamp = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0));
        if timestamp.is_none() {
            self.malformed.push(MalformedField {
                line: self.line,
                column: "timestamp".to_string(),
                value: format!("{year}-{month}-{day} {hour}:00"),
            });
        }
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_HEADER: &str =
        "location,year,month,day,hour,domestic,catchment,age,type,gender,count,zone";

    #[test]
    fn skips_header_and_drops_last_line() {
        let text = format!(
            "{SIMPLE_HEADER}\nA,2023,11,10,14,true,North,25-34,Resident,M,42,3\n\
             B,2023,11,10,15,false,South,65+,Commuter,F,7,4\n"
        );
        let parsed = parse_visitors_simple(&text).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].location, "A");
        assert_eq!(parsed.records[1].location, "B");
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn drops_last_line_even_without_trailing_newline() {
        let text = format!(
            "{SIMPLE_HEADER}\nA,2023,11,10,14,true,North,25-34,Resident,M,42,3\n\
             B,2023,11,10,15,false,South,65+,Commuter,F,7,4"
        );
        let parsed = parse_visitors_simple(&text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].location, "A");
    }

    #[test]
    fn header_only_yields_no_records() {
        let parsed = parse_visitors_simple(&format!("{SIMPLE_HEADER}\n")).unwrap();
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn parses_simple_row_fields() {
        let text = format!("{SIMPLE_HEADER}\r\nA,2023,11,10,14,TRUE,North,25-34,One day visitor,N,42,3\r\n");
        let record = parse_visitors_simple(&text).unwrap().records.remove(0);

        assert_eq!(
            record.timestamp.unwrap().to_string(),
            "2023-11-10 14:00:00"
        );
        assert!(record.domestic);
        assert_eq!(record.catchment, "North");
        assert_eq!(record.age_range, AgeRange::From25To34);
        assert_eq!(record.visitor_type, Some(VisitorType::OneDayVisitor));
        assert_eq!(record.gender, Gender::NonBinary);
        assert_eq!(record.visitor_count, Some(42));
        assert_eq!(record.zone_id, Some(3));
        assert!(record.distribution.is_none());
    }

    #[test]
    fn short_row_reports_missing_columns() {
        let text = format!("{SIMPLE_HEADER}\nZone1,2023,11,10,14,true,North,25-34,Resident,42\n");
        let parsed = parse_visitors_simple(&text).unwrap();
        let record = &parsed.records[0];

        assert_eq!(record.age_range, AgeRange::From25To34);
        assert_eq!(record.visitor_type, Some(VisitorType::Resident));
        assert_eq!(record.gender, Gender::Unspecified);
        assert_eq!(record.visitor_count, None);
        assert_eq!(record.zone_id, None);

        let columns: Vec<&str> = parsed.malformed.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(columns, ["gender", "visitor count", "zone id"]);
        assert!(parsed.malformed.iter().all(|m| m.line == 2));
    }

    #[test]
    fn malformed_count_is_none_not_a_crash() {
        let text = format!("{SIMPLE_HEADER}\nA,2023,11,10,14,true,North,18-24,Resident,M,lots,3\n");
        let parsed = parse_visitors_simple(&text).unwrap();
        assert_eq!(parsed.records[0].visitor_count, None);
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.malformed[0].value, "lots");
    }

    #[test]
    fn invalid_date_is_reported() {
        let text = format!("{SIMPLE_HEADER}\nA,2023,2,30,14,true,North,18-24,Resident,M,1,3\n");
        let parsed = parse_visitors_simple(&text).unwrap();
        assert_eq!(parsed.records[0].timestamp, None);
        assert_eq!(parsed.malformed[0].column, "timestamp");
    }

    #[test]
    fn unknown_labels_fall_back_to_sentinels() {
        let text = format!("{SIMPLE_HEADER}\nA,2023,11,10,14,true,North,0-17,Tourist,X,1,3\n");
        let parsed = parse_visitors_simple(&text).unwrap();
        let record = &parsed.records[0];
        assert_eq!(record.age_range, AgeRange::Unknown);
        assert_eq!(record.visitor_type, None);
        assert_eq!(record.gender, Gender::Unspecified);
        assert_eq!(parsed.malformed.len(), 3);
    }

    #[test]
    fn extended_rows_convert_percentages_to_headcounts() {
        let text = "h\n\
            A;2023;11;10;14;true;North;35-44;Resident;F;200;10,5;0;25;0,2\r\n";
        let parsed = parse_visitors_extended(text).unwrap();
        let distribution = parsed.records[0].distribution.as_ref().unwrap();

        assert_eq!(distribution.get(&11), Some(&21));
        assert_eq!(distribution.get(&12), None);
        assert_eq!(distribution.get(&13), Some(&50));
        // floor(200 * 0.2 / 100) == 0
        assert_eq!(distribution.get(&14), None);
        assert_eq!(distribution.len(), 2);
        assert!(parsed.malformed.is_empty());
    }

    #[test]
    fn extended_row_without_percentages_has_no_distribution() {
        let text = "h\nA;2023;11;10;14;true;North;35-44;Resident;F;200\n";
        let parsed = parse_visitors_extended(text).unwrap();
        assert!(parsed.records[0].distribution.is_none());
    }

    #[test]
    fn extended_distribution_never_stores_zero_or_negative() {
        let text = "h\nA;2023;11;10;14;true;North;35-44;Resident;F;3;10;-5;abc;;50\n";
        let parsed = parse_visitors_extended(text).unwrap();
        let distribution = parsed.records[0].distribution.as_ref().unwrap();

        assert!(distribution.values().all(|&count| count > 0));
        assert_eq!(distribution.get(&15), Some(&1));
        assert_eq!(distribution.len(), 1);

        let columns: Vec<&str> = parsed.malformed.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(columns, ["zone 12", "zone 13"]);
    }

    #[test]
    fn extended_distribution_is_empty_when_count_is_malformed() {
        let text = "h\nA;2023;11;10;14;true;North;35-44;Resident;F;?;50;50\n";
        let parsed = parse_visitors_extended(text).unwrap();
        assert_eq!(
            parsed.records[0].distribution.as_ref().map(BTreeMap::len),
            Some(0)
        );
    }

    #[test]
    fn empty_text_is_data_unavailable() {
        assert!(matches!(
            parse_visitors_simple(""),
            Err(SurveyError::DataUnavailable { .. })
        ));
        assert!(matches!(
            parse_income("  \n"),
            Err(SurveyError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn parses_income_and_education() {
        let income = "h\nCity;2022;25-34;120;41250,5\nCity;2022;N/A;3;x\n\n";
        let parsed = parse_income(income).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].average_income, Some(41_250.5));
        assert_eq!(parsed.records[0].year, Some(2022));
        assert_eq!(parsed.records[1].age_range, AgeRange::Unknown);
        assert_eq!(parsed.records[1].average_income, None);

        let education = "h\nCity;2022;45-54;80;Bachelor\n\n";
        let parsed = parse_education(education).unwrap();
        assert_eq!(parsed.records[0].education_level, "Bachelor");
        assert_eq!(parsed.records[0].count, Some(80));
    }

    #[test]
    fn assembles_dataset_with_combined_report() {
        let visitors = format!("{SIMPLE_HEADER}\nA,2023,11,10,14,true,North,25-34,Resident,M,oops,3\n");
        let dataset = parse_dataset(
            &visitors,
            SurveyFormat::Simple,
            Some("h\nCity;2022;25-34;x;100\n\n"),
            None,
        )
        .unwrap();

        assert_eq!(dataset.visitors.len(), 1);
        assert_eq!(dataset.income.len(), 1);
        assert!(dataset.education.is_empty());
        assert_eq!(dataset.malformed.len(), 2);
    }

    #[test]
    fn stray_quote_does_not_merge_lines() {
        let text = format!(
            "{SIMPLE_HEADER}\n\"Zone1,2023,11,10,14,true,North,25-34,Resident,F,42,1\n\
             Zone2,2023,11,10,15,true,North,35-44,Commuter,M,10,2\n\
             Zone3,2023,11,10,16,false,South,45-54,Resident,F,5,3\n\n"
        );
        let parsed = parse_visitors_simple(&text).unwrap();

        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0].location, "\"Zone1");
        assert_eq!(parsed.records[0].visitor_count, Some(42));
        assert_eq!(parsed.records[1].location, "Zone2");
        assert_eq!(parsed.records[1].zone_id, Some(2));
        assert_eq!(parsed.records[2].zone_id, Some(3));
        assert!(parsed.malformed.is_empty());
    }
}
