use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::fetcher::FetchError;

/// One immutable, self-consistent reading of weather state.
///
/// `Default` is the placeholder snapshot (`valid == false`) that readers see
/// before the first successful fetch. Published snapshots are shared behind
/// an `Arc` and replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub valid: bool,
    pub temperature_c: f64,
    /// Today's range; `temp_low_c <= temperature_c <= temp_high_c` is not
    /// enforced because the provider occasionally violates it.
    pub temp_low_c: f64,
    pub temp_high_c: f64,
    pub humidity_pct: u8,
    pub condition_code: i32,
    /// Provider's own label for the condition
    pub condition_text: String,
    /// Provider's day/night flag, when it sends one
    pub is_day: Option<bool>,
    /// PM2.5 in µg/m³, 0 when absent
    pub air_quality_pm25: u32,
    /// US EPA category 1-6, 0 = unknown
    pub air_quality_index: u8,
    pub wind_kph: f64,
    pub wind_speed_ms: f64,
    pub wind_bearing_deg: f64,
    pub pressure_hpa: f64,
    pub location_name: String,
    /// Device wall-clock time of the successful fetch
    pub fetched_at: Option<DateTime<Utc>>,
}

/// km/h to m/s with the exact 5/18 factor.
pub fn kph_to_ms(kph: f64) -> f64 {
    kph * 5.0 / 18.0
}

/// Celsius to Fahrenheit with the exact 9/5 factor.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

impl WeatherSnapshot {
    /// The snapshot shown before any fetch has succeeded.
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Parse a provider response body.
    ///
    /// All-or-nothing over the required fields (temperature, humidity,
    /// condition code, today's low and high); optional fields that are
    /// missing or malformed fall back to zero/empty.
    pub fn from_payload(body: &str, fetched_at: DateTime<Utc>) -> Result<Self, FetchError> {
        let payload: ApiResponse =
            serde_json::from_str(body).map_err(|_| FetchError::Parse("body".to_string()))?;

        let current = payload.current.ok_or_else(|| missing("current"))?;
        let temperature_c = current.temp_c.ok_or_else(|| missing("current.temp_c"))?;
        let humidity = current
            .humidity
            .filter(|h| (0.0..=100.0).contains(h))
            .ok_or_else(|| missing("current.humidity"))?;
        let condition = current
            .condition
            .as_ref()
            .ok_or_else(|| missing("current.condition"))?;
        let condition_code = condition
            .code
            .ok_or_else(|| missing("current.condition.code"))?;

        let today = payload
            .forecast
            .and_then(|f| f.forecastday)
            .and_then(|days| days.into_iter().next())
            .and_then(|day| day.day)
            .ok_or_else(|| missing("forecast.forecastday[0].day"))?;
        let temp_low_c = today
            .mintemp_c
            .ok_or_else(|| missing("forecast.forecastday[0].day.mintemp_c"))?;
        let temp_high_c = today
            .maxtemp_c
            .ok_or_else(|| missing("forecast.forecastday[0].day.maxtemp_c"))?;

        let air = current.air_quality.unwrap_or_default();
        let wind_kph = current.wind_kph.unwrap_or(0.0);

        Ok(Self {
            valid: true,
            temperature_c,
            temp_low_c,
            temp_high_c,
            humidity_pct: humidity.round() as u8,
            condition_code,
            condition_text: condition.text.clone().unwrap_or_default(),
            is_day: current.is_day.map(|flag| flag != 0),
            air_quality_pm25: air
                .pm2_5
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v.round() as u32)
                .unwrap_or(0),
            air_quality_index: air
                .us_epa_index
                .filter(|i| (1..=6).contains(i))
                .map(|i| i as u8)
                .unwrap_or(0),
            wind_kph,
            wind_speed_ms: kph_to_ms(wind_kph),
            wind_bearing_deg: current.wind_degree.unwrap_or(0.0),
            pressure_hpa: current.pressure_mb.unwrap_or(0.0),
            location_name: payload
                .location
                .and_then(|l| l.name)
                .unwrap_or_default(),
            fetched_at: Some(fetched_at),
        })
    }
}

fn missing(field: &str) -> FetchError {
    FetchError::Parse(field.to_string())
}

/// Deserialize a field as `None` when it is absent, null or of the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// Provider wire format (forecast.json with `aqi=yes`).

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default, deserialize_with = "lenient")]
    location: Option<ApiLocation>,
    #[serde(default, deserialize_with = "lenient")]
    current: Option<ApiCurrent>,
    #[serde(default, deserialize_with = "lenient")]
    forecast: Option<ApiForecast>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCurrent {
    #[serde(default, deserialize_with = "lenient")]
    temp_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    is_day: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    condition: Option<ApiCondition>,
    #[serde(default, deserialize_with = "lenient")]
    wind_kph: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    wind_degree: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pressure_mb: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    air_quality: Option<ApiAirQuality>,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    #[serde(default, deserialize_with = "lenient")]
    text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    code: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiAirQuality {
    #[serde(default, deserialize_with = "lenient")]
    pm2_5: Option<f64>,
    #[serde(rename = "us-epa-index", default, deserialize_with = "lenient")]
    us_epa_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiForecast {
    #[serde(default, deserialize_with = "lenient")]
    forecastday: Option<Vec<ApiForecastDay>>,
}

#[derive(Debug, Deserialize)]
struct ApiForecastDay {
    #[serde(default, deserialize_with = "lenient")]
    day: Option<ApiDay>,
}

#[derive(Debug, Deserialize)]
struct ApiDay {
    #[serde(default, deserialize_with = "lenient")]
    maxtemp_c: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    mintemp_c: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 29, 12, 0, 0).unwrap()
    }

    fn fixture() -> serde_json::Value {
        serde_json::json!({
            "location": { "name": "Beijing", "localtime": "2025-10-29 20:00" },
            "current": {
                "last_updated": "2025-10-29 19:45",
                "temp_c": 21.3,
                "is_day": 1,
                "condition": { "text": "Sunny", "code": 1000 },
                "wind_kph": 36.0,
                "wind_degree": 45,
                "pressure_mb": 1013.0,
                "humidity": 48,
                "cloud": 0,
                "uv": 5.0,
                "air_quality": { "pm2_5": 12.4, "us-epa-index": 1 }
            },
            "forecast": {
                "forecastday": [
                    { "date": "2025-10-29", "day": { "maxtemp_c": 24.0, "mintemp_c": 12.0 } }
                ]
            }
        })
    }

    fn parse(value: &serde_json::Value) -> Result<WeatherSnapshot, FetchError> {
        WeatherSnapshot::from_payload(&value.to_string(), fetched_at())
    }

    #[test]
    fn test_parse_full_payload() {
        let snapshot = parse(&fixture()).unwrap();

        assert!(snapshot.valid);
        assert_eq!(snapshot.temperature_c, 21.3);
        assert_eq!(snapshot.humidity_pct, 48);
        assert_eq!(snapshot.condition_code, 1000);
        assert_eq!(snapshot.condition_text, "Sunny");
        assert_eq!(snapshot.is_day, Some(true));
        assert_eq!(snapshot.air_quality_pm25, 12);
        assert_eq!(snapshot.air_quality_index, 1);
        assert_eq!(snapshot.pressure_hpa, 1013.0);
        assert_eq!(snapshot.wind_bearing_deg, 45.0);
        assert_eq!(snapshot.location_name, "Beijing");
        assert_eq!(snapshot.fetched_at, Some(fetched_at()));
    }

    #[test]
    fn test_wind_conversion_is_exact() {
        let snapshot = parse(&fixture()).unwrap();
        assert_eq!(snapshot.wind_kph, 36.0);
        assert_eq!(snapshot.wind_speed_ms, 10.0);
    }

    #[test]
    fn test_temperature_range_passes_through_unclamped() {
        let mut body = fixture();
        body["current"]["temp_c"] = serde_json::json!(26.5);
        body["forecast"]["forecastday"][0]["day"]["maxtemp_c"] = serde_json::json!(24.0);
        body["forecast"]["forecastday"][0]["day"]["mintemp_c"] = serde_json::json!(-3.25);

        let snapshot = parse(&body).unwrap();

        assert_eq!(snapshot.temperature_c, 26.5);
        assert_eq!(snapshot.temp_high_c, 24.0);
        assert_eq!(snapshot.temp_low_c, -3.25);
    }

    #[test]
    fn test_missing_required_fields_name_the_field() {
        let cases = [
            ("/current/temp_c", "current.temp_c"),
            ("/current/humidity", "current.humidity"),
            ("/current/condition/code", "current.condition.code"),
        ];

        for (pointer, field) in cases {
            let mut body = fixture();
            let (parent, key) = pointer.rsplit_once('/').unwrap();
            body.pointer_mut(parent)
                .unwrap()
                .as_object_mut()
                .unwrap()
                .remove(key);

            match parse(&body) {
                Err(FetchError::Parse(name)) => assert_eq!(name, field),
                other => panic!("expected Parse({field}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_forecast_day_is_parse_error() {
        let mut body = fixture();
        body["forecast"]["forecastday"] = serde_json::json!([]);
        assert!(matches!(
            parse(&body),
            Err(FetchError::Parse(field)) if field == "forecast.forecastday[0].day"
        ));

        let mut body = fixture();
        body["forecast"]["forecastday"][0]["day"]
            .as_object_mut()
            .unwrap()
            .remove("mintemp_c");
        assert!(matches!(
            parse(&body),
            Err(FetchError::Parse(field)) if field == "forecast.forecastday[0].day.mintemp_c"
        ));
    }

    #[test]
    fn test_malformed_required_field_is_parse_error() {
        let mut body = fixture();
        body["current"]["temp_c"] = serde_json::json!("warm");
        assert!(matches!(
            parse(&body),
            Err(FetchError::Parse(field)) if field == "current.temp_c"
        ));
    }

    #[test]
    fn test_humidity_out_of_range_is_parse_error() {
        let mut body = fixture();
        body["current"]["humidity"] = serde_json::json!(140);
        assert!(matches!(
            parse(&body),
            Err(FetchError::Parse(field)) if field == "current.humidity"
        ));
    }

    #[test]
    fn test_absent_air_quality_defaults_to_zero() {
        let mut body = fixture();
        body["current"]
            .as_object_mut()
            .unwrap()
            .remove("air_quality");

        let snapshot = parse(&body).unwrap();
        assert_eq!(snapshot.air_quality_pm25, 0);
        assert_eq!(snapshot.air_quality_index, 0);
    }

    #[test]
    fn test_malformed_optional_fields_default() {
        let mut body = fixture();
        body["current"]["air_quality"] = serde_json::json!({ "pm2_5": "n/a", "us-epa-index": 9 });
        body["current"]["wind_kph"] = serde_json::json!(null);
        body["current"]["pressure_mb"] = serde_json::json!([1013]);

        let snapshot = parse(&body).unwrap();
        assert!(snapshot.valid);
        assert_eq!(snapshot.air_quality_pm25, 0);
        assert_eq!(snapshot.air_quality_index, 0);
        assert_eq!(snapshot.wind_speed_ms, 0.0);
        assert_eq!(snapshot.pressure_hpa, 0.0);
    }

    #[test]
    fn test_non_json_body_is_parse_error() {
        let result = WeatherSnapshot::from_payload("<html>oops</html>", fetched_at());
        assert!(matches!(result, Err(FetchError::Parse(field)) if field == "body"));
    }

    #[test]
    fn test_placeholder_is_invalid() {
        let snapshot = WeatherSnapshot::placeholder();
        assert!(!snapshot.valid);
        assert!(snapshot.fetched_at.is_none());
    }

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
    }
}
