//! Bilingual country dictionary used to translate the carrier ledger's
//! Chinese country / billing-zone labels into the English names used by the
//! sales channel.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Built-in Chinese → English entries.
const BUILTIN: &[(&str, &str)] = &[
    ("美国", "United States"),
    ("英国", "United Kingdom"),
    ("澳大利亚", "Australia"),
    ("爱尔兰", "Ireland"),
    ("加拿大", "Canada"),
    ("荷兰", "Netherlands"),
    ("挪威", "Norway"),
    ("阿联酋", "United Arab Emirates"),
    ("德国", "Germany"),
    ("丹麦", "Denmark"),
    ("以色列", "Israel"),
    ("瑞典", "Sweden"),
    ("芬兰", "Finland"),
    ("瑞士", "Switzerland"),
    ("新西兰", "New Zealand"),
    ("法国", "France"),
    ("意大利", "Italy"),
    ("西班牙", "Spain"),
    ("比利时", "Belgium"),
    ("奥地利", "Austria"),
    ("波兰", "Poland"),
    ("葡萄牙", "Portugal"),
    ("日本", "Japan"),
    ("韩国", "South Korea"),
    ("新加坡", "Singapore"),
    ("香港", "Hong Kong"),
    ("台湾", "Taiwan"),
    ("马来西亚", "Malaysia"),
    ("泰国", "Thailand"),
    ("印度", "India"),
    ("墨西哥", "Mexico"),
    ("巴西", "Brazil"),
    ("南非", "South Africa"),
    ("希腊", "Greece"),
    ("捷克", "Czech Republic"),
    ("匈牙利", "Hungary"),
    ("罗马尼亚", "Romania"),
    ("斯洛伐克", "Slovakia"),
    ("斯洛文尼亚", "Slovenia"),
    ("克罗地亚", "Croatia"),
    ("保加利亚", "Bulgaria"),
    ("塞浦路斯", "Cyprus"),
    ("爱沙尼亚", "Estonia"),
    ("拉脱维亚", "Latvia"),
    ("立陶宛", "Lithuania"),
    ("卢森堡", "Luxembourg"),
    ("马耳他", "Malta"),
    ("冰岛", "Iceland"),
    ("土耳其", "Turkey"),
    ("俄罗斯", "Russia"),
    ("乌克兰", "Ukraine"),
    ("沙特阿拉伯", "Saudi Arabia"),
    ("卡塔尔", "Qatar"),
    ("科威特", "Kuwait"),
    ("巴林", "Bahrain"),
    ("阿曼", "Oman"),
    ("菲律宾", "Philippines"),
    ("印度尼西亚", "Indonesia"),
    ("越南", "Vietnam"),
];

/// Label → canonical name lookup. Misses pass through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryTable {
    entries: HashMap<String, String>,
    canonical: HashSet<String>,
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CountryTable {
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            canonical: HashSet::new(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut table = Self::empty();
        table.extend(pairs);
        table
    }

    /// Add or replace entries.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = (String, String)>) {
        for (label, name) in pairs {
            if let Some(old) = self.entries.insert(label, name.clone()) {
                if !self.entries.values().any(|v| *v == old) {
                    self.canonical.remove(&old);
                }
            }
            self.canonical.insert(name);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// Translate a label. Unknown labels come back unchanged; a miss on a
    /// label that is not already a canonical name is logged.
    pub fn translate(&self, label: &str) -> String {
        match self.entries.get(label) {
            Some(name) => name.clone(),
            None => {
                if !self.canonical.contains(label) {
                    log::info!("no country translation for '{label}', passing through");
                }
                label.to_string()
            }
        }
    }

    /// Entries sorted by label, for display.
    pub fn sorted(&self) -> BTreeMap<&str, &str> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_all_entries() {
        let table = CountryTable::builtin();
        assert_eq!(table.len(), 59);
        assert_eq!(table.get("美国"), Some("United States"));
        assert_eq!(table.get("越南"), Some("Vietnam"));
    }

    #[test]
    fn translate_hit() {
        let table = CountryTable::builtin();
        assert_eq!(table.translate("英国"), "United Kingdom");
    }

    #[test]
    fn translate_miss_passes_through() {
        // Unknown labels are expected to survive untranslated, not fail.
        let table = CountryTable::builtin();
        assert_eq!(table.translate("火星"), "火星");
        assert_eq!(table.translate("United States"), "United States");
    }

    #[test]
    fn extend_overrides_entry() {
        let mut table = CountryTable::builtin();
        table.extend([
            ("美国".to_string(), "USA".to_string()),
            ("美國".to_string(), "USA".to_string()),
        ]);
        assert_eq!(table.len(), 60);
        assert_eq!(table.translate("美国"), "USA");
        assert_eq!(table.translate("美國"), "USA");
    }
}
