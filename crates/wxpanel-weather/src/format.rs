//! Display strings derived from a snapshot.
//!
//! Everything here is pure. An invalid snapshot always yields dashes, never
//! zeros.

use wxpanel_core::TemperatureUnit;

use crate::types::{celsius_to_fahrenheit, WeatherSnapshot};

const DASHES: &str = "--";

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// 8-point compass name for a bearing in degrees.
pub fn wind_direction(bearing_deg: f64) -> &'static str {
    if !bearing_deg.is_finite() {
        return COMPASS[0];
    }
    let normalized = bearing_deg.rem_euclid(360.0);
    let sector = ((normalized + 22.5) / 45.0).floor() as usize % COMPASS.len();
    COMPASS[sector]
}

/// US EPA category name for an index of 1-6.
pub fn epa_category(index: u8) -> &'static str {
    match index {
        1 => "Good",
        2 => "Moderate",
        3 => "Unhealthy for Sensitive Groups",
        4 => "Unhealthy",
        5 => "Very Unhealthy",
        6 => "Hazardous",
        _ => DASHES,
    }
}

fn in_unit(celsius: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius_to_fahrenheit(celsius),
    }
}

// Integer formatting, so -0.4 prints as "0" rather than "-0".
fn whole(value: f64) -> i64 {
    value.round() as i64
}

impl WeatherSnapshot {
    /// `"21.3°C"`
    pub fn temperature_string(&self, unit: TemperatureUnit) -> String {
        if !self.valid {
            return format!("{DASHES}{}", unit.symbol());
        }
        format!("{:.1}{}", in_unit(self.temperature_c, unit), unit.symbol())
    }

    /// `"21°"`
    pub fn temperature_short(&self, unit: TemperatureUnit) -> String {
        if !self.valid {
            return format!("{DASHES}°");
        }
        format!("{}°", whole(in_unit(self.temperature_c, unit)))
    }

    /// `"12 - 24°"`
    pub fn temp_range_string(&self, unit: TemperatureUnit) -> String {
        if !self.valid {
            return format!("{DASHES} - {DASHES}°");
        }
        format!(
            "{} - {}°",
            whole(in_unit(self.temp_low_c, unit)),
            whole(in_unit(self.temp_high_c, unit))
        )
    }

    /// `"48%"`
    pub fn humidity_string(&self) -> String {
        if !self.valid {
            return format!("{DASHES}%");
        }
        format!("{}%", self.humidity_pct)
    }

    pub fn pressure_string(&self) -> String {
        if !self.valid {
            return format!("{DASHES} hPa");
        }
        format!("{:.1} hPa", self.pressure_hpa)
    }

    pub fn wind_string(&self) -> String {
        if !self.valid {
            return format!("{DASHES} m/s");
        }
        format!(
            "{:.1} m/s {}",
            self.wind_speed_ms,
            wind_direction(self.wind_bearing_deg)
        )
    }

    /// Provider's name for the queried location.
    pub fn location_string(&self) -> String {
        if !self.valid || self.location_name.trim().is_empty() {
            return DASHES.to_string();
        }
        self.location_name.trim().to_string()
    }

    /// PM2.5 concentration, `"12 µg/m³"`.
    pub fn air_quality_string(&self) -> String {
        if !self.valid {
            return format!("{DASHES} µg/m³");
        }
        format!("{} µg/m³", self.air_quality_pm25)
    }

    pub fn air_quality_category(&self) -> &'static str {
        if !self.valid {
            return DASHES;
        }
        epa_category(self.air_quality_index)
    }
}
