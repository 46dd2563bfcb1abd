use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::LoadError;
use crate::models::RawRow;

/// Reads the whole export and parses it off the runtime thread.
pub async fn load_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let rows = tokio::task::spawn_blocking(move || parse_rows(bytes.as_slice())).await??;
    info!(rows = rows.len(), path = %path.display(), "loaded collision export");
    Ok(rows)
}

fn lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

/// Streams header-keyed rows. Short rows leave trailing columns absent and
/// undecodable bytes are replaced rather than failing the row.
pub fn raw_rows<R: Read>(
    source: R,
) -> Result<impl Iterator<Item = Result<RawRow, csv::Error>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers: Vec<String> = reader.byte_headers()?.iter().map(lossy).collect();

    Ok(reader.into_byte_records().map(move |result| -> Result<RawRow, csv::Error> {
        let record = result?;
        Ok(headers
            .iter()
            .cloned()
            .zip(record.iter().map(lossy))
            .collect())
    }))
}

pub fn parse_rows<R: Read>(source: R) -> Result<Vec<RawRow>, csv::Error> {
    raw_rows(source)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rows_are_keyed_by_header() {
        let text = "CRASH DATE,VEHICLE TYPE CODE 1\n03/14/2021,Sedan\n";
        let rows = parse_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["CRASH DATE"], "03/14/2021");
        assert_eq!(rows[0]["VEHICLE TYPE CODE 1"], "Sedan");
    }

    #[test]
    fn short_rows_leave_columns_absent() {
        let text = "CRASH DATE,VEHICLE TYPE CODE 1\n03/14/2021\n";
        let rows = parse_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("VEHICLE TYPE CODE 1"));
    }

    #[test]
    fn truncated_row_does_not_abort_the_load() {
        let text = "CRASH YEAR,CRASH MONTH,VEHICLE TYPE CODE 1,CONTRIBUTING FACTOR VEHICLE 1\n\
                    2021,3,Sedan,Unsafe Speed\n\
                    2021,4\n\
                    2022,5,Taxi,\n";
        let rows = parse_rows(text.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["CRASH MONTH"], "4");
        assert!(!rows[1].contains_key("VEHICLE TYPE CODE 1"));
        assert_eq!(rows[2]["CONTRIBUTING FACTOR VEHICLE 1"], "");

        let record = crate::aggregate::parse_record(&rows[1]).unwrap();
        assert_eq!(record.vehicle_type, crate::models::UNKNOWN);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut bytes = b"CRASH DATE,VEHICLE TYPE CODE 1\n01/02/2021,Sedan\n01/03/2021,Ta".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b"xi\n01/04/2021,Bus\n");

        let rows = parse_rows(bytes.as_slice()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1]["VEHICLE TYPE CODE 1"], "Ta\u{fffd}\u{fffd}xi");
        assert_eq!(rows[2]["VEHICLE TYPE CODE 1"], "Bus");
    }

    #[tokio::test]
    async fn loads_rows_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "CRASH YEAR,CRASH MONTH").unwrap();
        writeln!(file, "2021,3").unwrap();
        writeln!(file, "2022,7").unwrap();

        let rows = load_rows(file.path()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["CRASH MONTH"], "7");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rows(&dir.path().join("absent.csv")).await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
