//! Collaborator interfaces for the display and asset storage.

use wxpanel_core::DisplayError;

/// Text slots on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Location,
    Temperature,
    TempRange,
    Humidity,
    Wind,
    Pressure,
    AirQuality,
    RefreshTime,
    Status,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Location => "location",
            Field::Temperature => "temperature",
            Field::TempRange => "temp_range",
            Field::Humidity => "humidity",
            Field::Wind => "wind",
            Field::Pressure => "pressure",
            Field::AirQuality => "air_quality",
            Field::RefreshTime => "refresh_time",
            Field::Status => "status",
        }
    }
}

/// Opaque image owned by the surface until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Display update API.
///
/// Implementations own decoded images; every handle from `create_image`
/// must eventually be passed to `release_image`.
pub trait DisplaySurface {
    fn set_text(&mut self, field: Field, text: &str) -> Result<(), DisplayError>;

    fn create_image(&mut self, data: &[u8]) -> Result<ImageHandle, DisplayError>;

    /// Make `handle` the visible condition icon.
    fn show_image(&mut self, handle: ImageHandle) -> Result<(), DisplayError>;

    fn release_image(&mut self, handle: ImageHandle);
}

/// Read-only access to icon assets by name.
pub trait AssetStore {
    fn read(&self, name: &str) -> Result<Vec<u8>, DisplayError>;
}
