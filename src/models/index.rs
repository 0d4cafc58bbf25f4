//! Partition index file model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `data_index.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionIndex {
    pub current_year: i32,
    #[serde(default)]
    pub years: BTreeMap<String, YearInfo>,
}

/// Per-year record counts by region code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearInfo {
    #[serde(default)]
    pub regions: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_file() {
        let json = r#"{"currentYear":2024,"years":{
            "2024":{"regions":{"bing_ROW":31}},
            "2023":{"regions":{"bing_ROW":28,"bing_en-US":365}},
            "2009":{}
        }}"#;
        let index: PartitionIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.current_year, 2024);
        assert_eq!(index.years["2023"].regions["bing_en-US"], 365);
        assert!(index.years["2009"].regions.is_empty());
    }
}
