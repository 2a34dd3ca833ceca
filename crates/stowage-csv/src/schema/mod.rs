//! Row layouts of the CSV files
//!
//! Each row type mirrors one header layout and converts into the
//! corresponding `stowage-core` record. Conversion only checks that the
//! text parses; range checks belong to the record's own `validate`.

pub mod arrangement;
pub mod container;
pub mod item;

pub use arrangement::ArrangementRow;
pub use container::ContainerRow;
pub use item::ItemRow;

/// Spreadsheet exports write this for "no value"
const NOT_APPLICABLE: &str = "N/A";

/// Empty and `N/A` cells are both absent values
pub(crate) fn present(cell: Option<String>) -> Option<String> {
    cell.map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(NOT_APPLICABLE))
}
