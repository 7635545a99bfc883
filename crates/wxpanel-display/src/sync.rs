//! Pushes snapshot state into the display collaborator.
//!
//! `PresentationSync` remembers what it last wrote so repeated renders of
//! the same snapshot issue no commands, and the condition icon is swapped
//! only when its asset changes.

use std::collections::HashMap;

use chrono_tz::Tz;
use wxpanel_core::{DisplayError, TemperatureUnit};
use wxpanel_weather::clock::format_refresh_time;
use wxpanel_weather::{ConditionResolver, Resolution, SyncStatus, WeatherSnapshot};

use crate::surface::{AssetStore, DisplaySurface, Field, ImageHandle};

const NO_DATA: &str = "No data";
const NO_TIME: &str = "--:--";

/// Everything the panel shows for one snapshot, minus the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub title: String,
    pub location: String,
    pub temperature: String,
    pub temp_range: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub air_quality: String,
    pub refresh_time: String,
    /// `None` while there is no data to show an icon for
    pub icon: Option<&'static str>,
}

impl Frame {
    pub fn build(
        snapshot: &WeatherSnapshot,
        resolution: &Resolution,
        unit: TemperatureUnit,
        tz: Tz,
    ) -> Self {
        if !snapshot.valid {
            return Self::placeholder(unit);
        }

        let air_quality = match snapshot.air_quality_index {
            0 => snapshot.air_quality_string(),
            _ => format!(
                "{} {}",
                snapshot.air_quality_string(),
                snapshot.air_quality_category()
            ),
        };

        Self {
            title: resolution.label.to_string(),
            location: snapshot.location_string(),
            temperature: snapshot.temperature_short(unit),
            temp_range: snapshot.temp_range_string(unit),
            humidity: snapshot.humidity_string(),
            wind: snapshot.wind_string(),
            pressure: snapshot.pressure_string(),
            air_quality,
            refresh_time: snapshot
                .fetched_at
                .map(|at| format_refresh_time(at, tz))
                .unwrap_or_else(|| NO_TIME.to_string()),
            icon: Some(resolution.asset),
        }
    }

    /// Dashes everywhere; never zeros.
    pub fn placeholder(unit: TemperatureUnit) -> Self {
        let empty = WeatherSnapshot::placeholder();
        Self {
            title: NO_DATA.to_string(),
            location: empty.location_string(),
            temperature: empty.temperature_short(unit),
            temp_range: empty.temp_range_string(unit),
            humidity: empty.humidity_string(),
            wind: empty.wind_string(),
            pressure: empty.pressure_string(),
            air_quality: empty.air_quality_string(),
            refresh_time: NO_TIME.to_string(),
            icon: None,
        }
    }

    fn texts(&self) -> [(Field, &str); 9] {
        [
            (Field::Title, self.title.as_str()),
            (Field::Location, self.location.as_str()),
            (Field::Temperature, self.temperature.as_str()),
            (Field::TempRange, self.temp_range.as_str()),
            (Field::Humidity, self.humidity.as_str()),
            (Field::Wind, self.wind.as_str()),
            (Field::Pressure, self.pressure.as_str()),
            (Field::AirQuality, self.air_quality.as_str()),
            (Field::RefreshTime, self.refresh_time.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
struct ShownIcon {
    asset: &'static str,
    handle: ImageHandle,
}

/// The only writer to the display surface.
pub struct PresentationSync<S, A> {
    surface: S,
    assets: A,
    texts: HashMap<Field, String>,
    icon: Option<ShownIcon>,
    fallback_asset: &'static str,
    /// Last asset that failed to load while the default was shown instead
    unavailable: Option<&'static str>,
}

impl<S: DisplaySurface, A: AssetStore> PresentationSync<S, A> {
    pub fn new(surface: S, assets: A) -> Self {
        Self {
            surface,
            assets,
            texts: HashMap::new(),
            icon: None,
            fallback_asset: ConditionResolver::fallback().asset,
            unavailable: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Asset currently on screen, if any.
    pub fn icon_asset(&self) -> Option<&'static str> {
        self.icon.map(|shown| shown.asset)
    }

    /// Render a snapshot. Safe to call repeatedly with the same inputs.
    pub fn render(
        &mut self,
        snapshot: &WeatherSnapshot,
        resolution: &Resolution,
        unit: TemperatureUnit,
        tz: Tz,
    ) -> Result<(), DisplayError> {
        let frame = Frame::build(snapshot, resolution, unit, tz);
        self.apply(&frame)
    }

    /// Write the fields of `frame` that differ from what is shown.
    pub fn apply(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        for (field, text) in frame.texts() {
            self.set_field(field, text)?;
        }
        self.sync_icon(frame.icon)
    }

    pub fn show_status(&mut self, status: &SyncStatus) -> Result<(), DisplayError> {
        self.set_field(Field::Status, status.label())
    }

    fn set_field(&mut self, field: Field, text: &str) -> Result<(), DisplayError> {
        if self.texts.get(&field).map(String::as_str) == Some(text) {
            return Ok(());
        }
        self.surface.set_text(field, text)?;
        self.texts.insert(field, text.to_string());
        Ok(())
    }

    fn sync_icon(&mut self, wanted: Option<&'static str>) -> Result<(), DisplayError> {
        let Some(asset) = wanted else {
            if let Some(shown) = self.icon.take() {
                self.surface.release_image(shown.handle);
            }
            return Ok(());
        };

        if self.icon_asset() == Some(asset) {
            return Ok(());
        }
        if self.unavailable == Some(asset) && self.icon_asset() == Some(self.fallback_asset) {
            return Ok(());
        }

        let (asset, handle) = match self.load(asset) {
            Ok(handle) => (asset, handle),
            Err(err) if asset == self.fallback_asset => return Err(err),
            Err(err) => {
                tracing::warn!("Icon '{}' unavailable ({}), using default", asset, err);
                self.unavailable = Some(asset);
                if self.icon_asset() == Some(self.fallback_asset) {
                    return Ok(());
                }
                match self.load(self.fallback_asset) {
                    Ok(handle) => (self.fallback_asset, handle),
                    Err(fallback_err) => {
                        tracing::error!("Default icon unavailable: {}", fallback_err);
                        return Err(err);
                    }
                }
            }
        };

        // The old image stays on screen until the new one is showing.
        if let Err(err) = self.surface.show_image(handle) {
            self.surface.release_image(handle);
            return Err(err);
        }
        if let Some(old) = self.icon.replace(ShownIcon { asset, handle }) {
            self.surface.release_image(old.handle);
        }
        if asset != self.fallback_asset {
            self.unavailable = None;
        }
        tracing::debug!("Icon set to '{}'", asset);
        Ok(())
    }

    fn load(&mut self, asset: &str) -> Result<ImageHandle, DisplayError> {
        let data = self.assets.read(asset)?;
        self.surface.create_image(&data)
    }
}
