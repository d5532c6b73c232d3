//! Free-text cleansing of the contributing-factor and vehicle-type slots.
//!
//! Each column group gets its own [`TextCleanser`], built from a
//! [`CleanserConfig`] table so corrections live in configuration rather
//! than code.

use std::collections::BTreeMap;

use crash_map_crash_models::{CrashRecord, VEHICLE_SLOTS};
use crash_map_ingest_models::{CleanserConfig, CleansingConfig};

/// Applies one correction table to free-text values.
#[derive(Debug, Clone, Default)]
pub struct TextCleanser {
    fold_case: bool,
    sentinels: Vec<String>,
    /// Cleaned value -> replacement, where `None` discards the value.
    replacements: BTreeMap<String, Option<String>>,
}

impl TextCleanser {
    #[must_use]
    pub fn new(config: &CleanserConfig) -> Self {
        let fold = |s: &str| {
            let s = s.trim();
            if config.fold_case {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };

        let mut replacements: BTreeMap<String, Option<String>> = config
            .corrections
            .iter()
            .map(|(from, to)| (fold(from), Some(to.clone())))
            .collect();
        for token in &config.discard {
            replacements.insert(fold(token), None);
        }

        Self {
            fold_case: config.fold_case,
            sentinels: config.sentinels.iter().map(|s| s.trim().to_string()).collect(),
            replacements,
        }
    }

    /// Cleans one value. Returns `None` for sentinels, discarded tokens, and
    /// values that are blank after trimming.
    #[must_use]
    pub fn clean(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.sentinels.iter().any(|s| s == trimmed) {
            return None;
        }

        let value = if self.fold_case {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        };

        match self.replacements.get(&value) {
            Some(replacement) => replacement.clone(),
            None => Some(value),
        }
    }

    /// Cleans every slot of a column group in place.
    pub fn clean_slots(&self, slots: &mut [Option<String>; VEHICLE_SLOTS]) {
        for slot in slots.iter_mut() {
            *slot = slot.as_deref().and_then(|v| self.clean(v));
        }
    }
}

/// The factor and vehicle cleansers together.
#[derive(Debug, Clone, Default)]
pub struct Cleansers {
    pub factors: TextCleanser,
    pub vehicles: TextCleanser,
}

impl Cleansers {
    #[must_use]
    pub fn new(config: &CleansingConfig) -> Self {
        Self {
            factors: TextCleanser::new(&config.factors),
            vehicles: TextCleanser::new(&config.vehicles),
        }
    }

    /// Cleans the factor and vehicle slots of one record.
    pub fn apply(&self, record: &mut CrashRecord) {
        self.factors.clean_slots(&mut record.contributing_factors);
        self.vehicles.clean_slots(&mut record.vehicle_types);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor_config() -> CleanserConfig {
        CleanserConfig {
            fold_case: true,
            sentinels: vec!["Unspecified".to_string()],
            corrections: BTreeMap::from([("illnes".to_string(), "illness".to_string())]),
            discard: vec!["1".to_string(), "80".to_string()],
        }
    }

    #[test]
    fn factors_fold_and_correct() {
        let cleanser = TextCleanser::new(&factor_config());
        assert_eq!(
            cleanser.clean("  Driver Inattention/Distraction "),
            Some("driver inattention/distraction".to_string())
        );
        assert_eq!(cleanser.clean("Illnes"), Some("illness".to_string()));
        assert_eq!(cleanser.clean("Unspecified"), None);
        assert_eq!(cleanser.clean(" Unspecified "), None);
        assert_eq!(cleanser.clean("80"), None);
        assert_eq!(cleanser.clean("1"), None);
        assert_eq!(cleanser.clean("   "), None);
    }

    #[test]
    fn sentinel_match_is_case_sensitive() {
        let cleanser = TextCleanser::new(&factor_config());
        assert_eq!(cleanser.clean("unspecified"), Some("unspecified".to_string()));
    }

    #[test]
    fn default_config_only_trims() {
        let cleanser = TextCleanser::new(&CleanserConfig::default());
        assert_eq!(cleanser.clean(" Sedan "), Some("Sedan".to_string()));
        assert_eq!(
            cleanser.clean("Station Wagon/Sport Utility Vehicle"),
            Some("Station Wagon/Sport Utility Vehicle".to_string())
        );
        assert_eq!(cleanser.clean(""), None);
    }

    #[test]
    fn cleans_record_slots_independently() {
        let cleansers = Cleansers {
            factors: TextCleanser::new(&factor_config()),
            vehicles: TextCleanser::new(&CleanserConfig::default()),
        };
        let mut record = CrashRecord {
            contributing_factors: [
                Some("Unsafe Speed".to_string()),
                Some("Unspecified".to_string()),
                None,
                Some(" ".to_string()),
                Some("Illnes".to_string()),
            ],
            vehicle_types: [
                Some(" Sedan".to_string()),
                Some("Unspecified".to_string()),
                None,
                None,
                None,
            ],
            ..CrashRecord::default()
        };

        cleansers.apply(&mut record);

        assert_eq!(
            record.contributing_factors,
            [
                Some("unsafe speed".to_string()),
                None,
                None,
                None,
                Some("illness".to_string()),
            ]
        );
        assert_eq!(
            record.vehicle_types,
            [
                Some("Sedan".to_string()),
                Some("Unspecified".to_string()),
                None,
                None,
                None,
            ]
        );
    }
}
