//! Condition code → presentation asset resolution.
//!
//! Codes follow the provider's condition list. Every code resolves to
//! something: unknown codes get the sunny/day entry so the panel never
//! shows a blank icon.

use std::collections::HashMap;

/// One row of the static condition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionEntry {
    pub code: i32,
    pub description: &'static str,
    /// Night label when it differs from `description`
    pub night_description: Option<&'static str>,
    pub day_asset: &'static str,
    pub night_asset: &'static str,
}

/// Output of [`ConditionResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub asset: &'static str,
    pub label: &'static str,
    /// False when the code was not in the table and the default was used
    pub matched: bool,
}

const fn entry(
    code: i32,
    description: &'static str,
    day_asset: &'static str,
    night_asset: &'static str,
) -> ConditionEntry {
    ConditionEntry {
        code,
        description,
        night_description: None,
        day_asset,
        night_asset,
    }
}

/// Fallback for codes the table does not know.
pub const DEFAULT_ENTRY: ConditionEntry = ConditionEntry {
    code: 1000,
    description: "Sunny",
    night_description: Some("Clear"),
    day_asset: "sunny",
    night_asset: "clear_night",
};

pub static CONDITIONS: &[ConditionEntry] = &[
    DEFAULT_ENTRY,
    entry(1003, "Partly cloudy", "partly_cloudy", "partly_cloudy_night"),
    entry(1006, "Cloudy", "cloudy", "cloudy"),
    entry(1009, "Overcast", "overcast", "overcast"),
    entry(1030, "Mist", "haze", "haze"),
    entry(1063, "Patchy rain possible", "rainy", "rainy"),
    entry(1066, "Patchy snow possible", "snowy", "snowy"),
    entry(1069, "Patchy sleet possible", "snowy_rainy", "snowy_rainy"),
    entry(1072, "Patchy freezing drizzle possible", "snowy_rainy", "snowy_rainy"),
    entry(1087, "Thundery outbreaks possible", "lightning", "lightning"),
    entry(1114, "Blowing snow", "windy", "windy"),
    entry(1117, "Blizzard", "snowy", "snowy"),
    entry(1135, "Fog", "fog", "fog"),
    entry(1147, "Freezing fog", "fog", "fog"),
    entry(1150, "Patchy light drizzle", "rainy", "rainy"),
    entry(1153, "Light drizzle", "rainy", "rainy"),
    entry(1168, "Freezing drizzle", "snowy_rainy", "snowy_rainy"),
    entry(1171, "Heavy freezing drizzle", "snowy_rainy", "snowy_rainy"),
    entry(1180, "Patchy light rain", "rainy", "rainy"),
    entry(1183, "Light rain", "rainy", "rainy"),
    entry(1186, "Moderate rain at times", "rainy", "rainy"),
    entry(1189, "Moderate rain", "rainy", "rainy"),
    entry(1192, "Heavy rain at times", "pouring", "pouring"),
    entry(1195, "Heavy rain", "pouring", "pouring"),
    entry(1198, "Light freezing rain", "snowy_rainy", "snowy_rainy"),
    entry(1201, "Moderate or heavy freezing rain", "snowy_rainy", "snowy_rainy"),
    entry(1204, "Light sleet", "snowy_rainy", "snowy_rainy"),
    entry(1207, "Moderate or heavy sleet", "snowy_rainy", "snowy_rainy"),
    entry(1210, "Patchy light snow", "snowy", "snowy"),
    entry(1213, "Light snow", "snowy", "snowy"),
    entry(1216, "Patchy moderate snow", "snowy", "snowy"),
    entry(1219, "Moderate snow", "snowy", "snowy"),
    entry(1222, "Patchy heavy snow", "snowy", "snowy"),
    entry(1225, "Heavy snow", "snowy", "snowy"),
    entry(1237, "Ice pellets", "hail", "hail"),
    entry(1240, "Light rain shower", "rainy", "rainy"),
    entry(1243, "Moderate or heavy rain shower", "pouring", "pouring"),
    entry(1246, "Torrential rain shower", "pouring", "pouring"),
    entry(1249, "Light sleet showers", "snowy_rainy", "snowy_rainy"),
    entry(1252, "Moderate or heavy sleet showers", "snowy_rainy", "snowy_rainy"),
    entry(1255, "Light snow showers", "snowy", "snowy"),
    entry(1258, "Moderate or heavy snow showers", "snowy", "snowy"),
    entry(1261, "Light showers of ice pellets", "hail", "hail"),
    entry(1264, "Moderate or heavy showers of ice pellets", "hail", "hail"),
    entry(1273, "Patchy light rain with thunder", "lightning_rainy", "lightning_rainy"),
    entry(1276, "Moderate or heavy rain with thunder", "lightning_rainy", "lightning_rainy"),
    entry(1279, "Patchy light snow with thunder", "lightning", "lightning"),
    entry(1282, "Moderate or heavy snow with thunder", "lightning", "lightning"),
];

/// Pure lookup from `(condition_code, is_daytime)` to an asset and label.
///
/// Built once from [`CONDITIONS`]; lookups take `&self` so a single resolver
/// can be shared across tasks without locking.
#[derive(Debug, Clone)]
pub struct ConditionResolver {
    table: HashMap<i32, ConditionEntry>,
}

impl Default for ConditionResolver {
    fn default() -> Self {
        Self::new(CONDITIONS)
    }
}

impl ConditionResolver {
    pub fn new(entries: &[ConditionEntry]) -> Self {
        let table = entries.iter().map(|e| (e.code, *e)).collect();
        Self { table }
    }

    pub fn resolve(&self, condition_code: i32, is_daytime: bool) -> Resolution {
        match self.table.get(&condition_code) {
            Some(entry) if is_daytime => Resolution {
                asset: entry.day_asset,
                label: entry.description,
                matched: true,
            },
            Some(entry) => Resolution {
                asset: entry.night_asset,
                label: entry.night_description.unwrap_or(entry.description),
                matched: true,
            },
            None => Self::fallback(),
        }
    }

    /// The fixed entry used for unknown codes.
    pub fn fallback() -> Resolution {
        Resolution {
            asset: DEFAULT_ENTRY.day_asset,
            label: DEFAULT_ENTRY.description,
            matched: false,
        }
    }

    pub fn entry(&self, condition_code: i32) -> Option<&ConditionEntry> {
        self.table.get(&condition_code)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sunny_day() {
        let resolver = ConditionResolver::default();
        let resolution = resolver.resolve(1000, true);
        assert_eq!(resolution.asset, "sunny");
        assert_eq!(resolution.label, "Sunny");
        assert!(resolution.matched);
    }

    #[test]
    fn test_clear_night_variant() {
        let resolver = ConditionResolver::default();
        let resolution = resolver.resolve(1000, false);
        assert_eq!(resolution.asset, "clear_night");
        assert_eq!(resolution.label, "Clear");
    }

    #[test]
    fn test_partly_cloudy_night_variant() {
        let resolver = ConditionResolver::default();
        assert_eq!(resolver.resolve(1003, true).asset, "partly_cloudy");
        assert_eq!(resolver.resolve(1003, false).asset, "partly_cloudy_night");
        assert_eq!(resolver.resolve(1003, false).label, "Partly cloudy");
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let resolver = ConditionResolver::default();
        let resolution = resolver.resolve(9999, true);
        assert_eq!(resolution.asset, "sunny");
        assert_eq!(resolution.label, "Sunny");
        assert!(!resolution.matched);
    }

    #[test]
    fn test_every_unknown_code_resolves_to_default() {
        let resolver = ConditionResolver::default();
        for code in -500..5000 {
            if resolver.entry(code).is_some() {
                continue;
            }
            for is_daytime in [true, false] {
                assert_eq!(
                    resolver.resolve(code, is_daytime),
                    ConditionResolver::fallback(),
                    "code {code} should use the default entry"
                );
            }
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = ConditionResolver::default();
        for entry in CONDITIONS {
            assert_eq!(
                resolver.resolve(entry.code, true),
                resolver.resolve(entry.code, true)
            );
            assert_eq!(
                resolver.resolve(entry.code, false),
                resolver.resolve(entry.code, false)
            );
        }
    }

    #[test]
    fn test_table_codes_are_unique() {
        let resolver = ConditionResolver::default();
        assert_eq!(resolver.len(), CONDITIONS.len());
    }

    #[test]
    fn test_thunder_rain() {
        let resolver = ConditionResolver::default();
        let resolution = resolver.resolve(1276, false);
        assert_eq!(resolution.asset, "lightning_rainy");
        assert_eq!(resolution.label, "Moderate or heavy rain with thunder");
    }
}
