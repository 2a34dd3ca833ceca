//! CSV readers with per-row error reporting

use crate::error::{Error, Result, RowError};
use crate::schema::{ArrangementRow, ContainerRow, ItemRow};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::io;
use stowage_core::{Container, Item, Placement};
use tracing::{debug, warn};

/// A record together with the data row it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub row: usize,
    pub record: T,
}

/// Everything read from one file: good rows and bad rows, both in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Import<T> {
    pub records: Vec<Parsed<T>>,
    pub errors: Vec<RowError>,
}

impl<T> Import<T> {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Total number of data rows seen
    pub fn row_count(&self) -> usize {
        self.records.len() + self.errors.len()
    }
}

/// Read an items file
pub fn read_items<R: io::Read>(reader: R) -> Result<Import<Item>> {
    read_rows(reader, &ItemRow::REQUIRED, ItemRow::into_item)
}

/// Read a containers file
pub fn read_containers<R: io::Read>(reader: R) -> Result<Import<Container>> {
    read_rows(reader, &ContainerRow::REQUIRED, |row: ContainerRow| {
        Ok(row.into_container())
    })
}

/// Read an arrangement file as written by [`crate::write_arrangement`]
pub fn read_arrangement<R: io::Read>(reader: R) -> Result<Import<Placement>> {
    read_rows(reader, &ArrangementRow::REQUIRED, ArrangementRow::into_placement)
}

fn read_rows<R, Row, T, F>(reader: R, required: &[&str], convert: F) -> Result<Import<T>>
where
    R: io::Read,
    Row: DeserializeOwned,
    F: Fn(Row) -> std::result::Result<T, String>,
{
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    if let Some(missing) = required
        .iter()
        .find(|column| !headers.iter().any(|header| header == **column))
    {
        return Err(Error::MissingColumn(missing.to_string()));
    }

    let mut import = Import::new();
    for (index, result) in csv_reader.deserialize::<Row>().enumerate() {
        let row = index + 1;
        match result.map_err(|e| describe(&e)).and_then(&convert) {
            Ok(record) => import.records.push(Parsed { row, record }),
            Err(message) => {
                warn!(row, %message, "skipping CSV row");
                import.errors.push(RowError::new(row, message));
            }
        }
    }

    debug!(
        rows = import.row_count(),
        errors = import.errors.len(),
        "read CSV file"
    );
    Ok(import)
}

/// Field-level message without the reader's position prefix
fn describe(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} fields, found {}", expected_len, len),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const ITEMS: &str = "\
itemId,name,width,depth,height,mass,priority,expiryDate,usageLimit,preferredZone
001,Food Packet,10,10,20,5,80,2025-05-20,30,Crew Quarters
002,Oxygen Cylinder,15,15,50,30,95,N/A,100,Airlock
003,Broken,ten,10,10,1,50,,,
004,First Aid Kit,20,20,10,2,100,2025-07-10,,Medical Bay
";

    #[test]
    fn test_read_items_reports_bad_rows() {
        let import = read_items(ITEMS.as_bytes()).unwrap();

        assert_eq!(import.row_count(), 4);
        assert_eq!(import.records.len(), 3);
        assert_eq!(import.errors.len(), 1);
        assert_eq!(import.errors[0].row, 3);

        let oxygen = &import.records[1];
        assert_eq!(oxygen.row, 2);
        assert_eq!(oxygen.record.expiry_date, None);
        assert_eq!(oxygen.record.usage_limit, Some(100));

        let kit = &import.records[2];
        assert_eq!(kit.row, 4);
        assert_eq!(kit.record.expiry_date, NaiveDate::from_ymd_opt(2025, 7, 10));
        assert_eq!(kit.record.usage_limit, None);
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "itemId,name,width,depth,height,priority\nA,Spanner,1,2,3,10\n";
        let import = read_items(csv.as_bytes()).unwrap();
        assert!(import.errors.is_empty());
        assert_eq!(import.records[0].record.mass, 0.0);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "itemId,name,width,depth\nA,Spanner,1,2\n";
        match read_items(csv.as_bytes()) {
            Err(Error::MissingColumn(column)) => assert_eq!(column, "height"),
            other => panic!("expected a missing column, got {:?}", other.map(|i| i.row_count())),
        }
    }

    #[test]
    fn test_read_containers() {
        let csv = "\
containerId,zone,width,depth,height
contA,Crew Quarters,100,85,200
contB,Airlock,50,85,200,extra
";
        let import = read_containers(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 1);
        assert_eq!(import.records[0].record.zone, "Crew Quarters");
        assert_eq!(import.errors[0].row, 2);
    }

    #[test]
    fn test_arrangement_rejects_inverted_box() {
        let csv = "\
itemId,containerId,startWidth,startDepth,startHeight,endWidth,endDepth,endHeight
A,contA,0,0,0,2,2,2
B,contA,5,0,0,3,2,2
";
        let import = read_arrangement(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 1);
        assert_eq!(import.errors[0].row, 2);
    }
}
