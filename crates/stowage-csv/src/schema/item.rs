//! Item rows

use super::present;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stowage_core::{Dimensions, Item};

/// `itemId,name,width,depth,height,mass,priority,expiryDate,usageLimit,preferredZone`
///
/// `mass`, `expiryDate`, `usageLimit` and `preferredZone` may be missing,
/// empty or `N/A`. `usageLimit` is a count, optionally followed by `uses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    pub item_id: String,
    pub name: String,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    #[serde(default)]
    pub mass: Option<f64>,
    pub priority: i32,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub usage_limit: Option<String>,
    #[serde(default)]
    pub preferred_zone: Option<String>,
}

impl ItemRow {
    pub const REQUIRED: [&'static str; 6] =
        ["itemId", "name", "width", "depth", "height", "priority"];

    /// Convert to an item, reporting the first cell that does not parse
    pub fn into_item(self) -> Result<Item, String> {
        let expiry_date = present(self.expiry_date)
            .map(|text| {
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map_err(|_| format!("expiryDate '{}' is not a YYYY-MM-DD date", text))
            })
            .transpose()?;

        let usage_limit = present(self.usage_limit)
            .map(|text| {
                let count = text.strip_suffix("uses").unwrap_or(text.as_str()).trim_end();
                count
                    .parse::<u32>()
                    .map_err(|_| format!("usageLimit '{}' is not a whole number", text))
            })
            .transpose()?;

        let mut item = Item::new(
            self.item_id.trim(),
            self.name.trim(),
            Dimensions::new(self.width, self.depth, self.height),
            self.priority,
        );
        item.mass = self.mass.unwrap_or_default();
        item.expiry_date = expiry_date;
        item.usage_limit = usage_limit;
        item.preferred_zone = present(self.preferred_zone);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ItemRow {
        ItemRow {
            item_id: "001".into(),
            name: "Food Packet".into(),
            width: 10.0,
            depth: 10.0,
            height: 20.0,
            mass: Some(5.0),
            priority: 80,
            expiry_date: Some("2025-05-20".into()),
            usage_limit: Some("30".into()),
            preferred_zone: Some("Crew Quarters".into()),
        }
    }

    #[test]
    fn test_into_item() {
        let item = row().into_item().unwrap();
        assert_eq!(item.item_id.as_str(), "001");
        assert_eq!(item.usage_limit, Some(30));
        assert_eq!(item.expiry_date, NaiveDate::from_ymd_opt(2025, 5, 20));
        assert_eq!(item.preferred_zone.as_deref(), Some("Crew Quarters"));
    }

    #[test]
    fn test_not_applicable_cells_are_absent() {
        let mut row = row();
        row.expiry_date = Some("N/A".into());
        row.usage_limit = Some(" ".into());
        row.preferred_zone = None;

        let item = row.into_item().unwrap();
        assert_eq!(item.expiry_date, None);
        assert_eq!(item.usage_limit, None);
        assert_eq!(item.preferred_zone, None);
    }

    #[test]
    fn test_usage_limit_with_unit() {
        let mut row = row();
        row.usage_limit = Some("30 uses".into());
        assert_eq!(row.clone().into_item().unwrap().usage_limit, Some(30));

        row.usage_limit = Some("many uses".into());
        assert!(row.into_item().unwrap_err().contains("usageLimit"));
    }

    #[test]
    fn test_bad_date_is_reported() {
        let mut row = row();
        row.expiry_date = Some("20/05/2025".into());
        let message = row.into_item().unwrap_err();
        assert!(message.contains("expiryDate"));
    }
}
