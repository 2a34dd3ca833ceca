//! CSV writers

use crate::error::Result;
use crate::schema::ArrangementRow;
use csv::WriterBuilder;
use std::io;
use stowage_core::Placement;

/// Write placements in the arrangement layout; the header is always written
pub fn write_arrangement<W: io::Write>(placements: &[Placement], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(ArrangementRow::REQUIRED)?;
    for placement in placements {
        csv_writer.serialize(ArrangementRow::from(placement))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Arrangement CSV as bytes
pub fn arrangement_to_vec(placements: &[Placement]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_arrangement(placements, &mut buffer)?;
    Ok(buffer)
}
