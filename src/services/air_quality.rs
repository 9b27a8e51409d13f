//! Measurement normalization.
//!
//! Turns the OpenAQ latest-measurement feed for a city into a flat map of
//! pollutant → most recent value. Sensor ids are resolved to parameter names
//! through the city's sensor list; unresolvable sensors are keyed
//! `SENSOR_<id>`.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::helpers::{humanize_since, parse_utc, round_2dp};
use crate::models::{City, CityAirQuality, Sensor};
use crate::services::openaq::{OpenAqClient, RawMeasurement};

/// A measurement that passed validation.
struct Reading {
    sensor_id: i64,
    value: f64,
    taken_at: DateTime<Utc>,
}

/// Fetch and normalize the latest readings for `city`.
///
/// Returns `None` when the city has no usable measurements or the upstream
/// fetch fails; the failure case is only distinguishable in the logs.
pub async fn fetch_city_air_quality(client: &OpenAqClient, city: &City) -> Option<CityAirQuality> {
    let measurements = match client.fetch_latest(city.id).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(
                "Failed to fetch latest measurements for {} ({}): {}",
                city.name,
                city.id,
                e
            );
            return None;
        }
    };

    let result = normalize(city, &measurements, Utc::now());
    if result.is_none() {
        tracing::info!("No air quality data available for {} ({})", city.name, city.id);
    }
    result
}

/// Fetch and normalize several cities concurrently, preserving input order
/// and omitting cities without data.
pub async fn fetch_many(client: &OpenAqClient, cities: &[City]) -> Vec<CityAirQuality> {
    let fetches = cities.iter().map(|city| fetch_city_air_quality(client, city));
    futures::future::join_all(fetches)
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Build the display record for `city` from its latest measurements.
///
/// Malformed entries (no sensor id, value or parseable `datetime.utc`) are
/// skipped. Returns `None` if nothing usable remains.
pub fn normalize(
    city: &City,
    measurements: &[RawMeasurement],
    now: DateTime<Utc>,
) -> Option<CityAirQuality> {
    let readings: Vec<Reading> = measurements.iter().filter_map(validate).collect();
    let latest = readings.iter().map(|r| r.taken_at).max()?;

    let sensors: HashMap<i64, &Sensor> = city.sensors.iter().map(|s| (s.id, s)).collect();

    let mut newest: BTreeMap<String, (DateTime<Utc>, f64)> = BTreeMap::new();
    for reading in &readings {
        let key = pollutant_key(sensors.get(&reading.sensor_id).copied(), reading.sensor_id);
        match newest.get(&key) {
            Some((seen, _)) if reading.taken_at <= *seen => {}
            _ => {
                newest.insert(key, (reading.taken_at, reading.value));
            }
        }
    }

    Some(CityAirQuality {
        id: city.id.to_string(),
        city_name: city.name.clone(),
        location: city.location.clone(),
        updated_time: humanize_since(latest, now),
        metrics: newest
            .into_iter()
            .map(|(key, (_, value))| (key, value))
            .collect(),
    })
}

/// The metric key for a sensor: its upper-cased parameter name, or
/// `SENSOR_<id>` when no name can be resolved.
pub fn pollutant_key(sensor: Option<&Sensor>, sensor_id: i64) -> String {
    sensor
        .and_then(|s| s.parameter.as_ref())
        .and_then(|p| p.name())
        .map(str::to_uppercase)
        .unwrap_or_else(|| format!("SENSOR_{}", sensor_id))
}

fn validate(m: &RawMeasurement) -> Option<Reading> {
    let reading = m.sensors_id.and_then(|sensor_id| {
        let taken_at = m.utc().and_then(parse_utc)?;
        let value = m.value.and_then(round_2dp)?;
        Some(Reading {
            sensor_id,
            value,
            taken_at,
        })
    });
    if reading.is_none() {
        tracing::warn!("Skipping malformed measurement: {:?}", m);
    }
    reading
}
