//! City resolution: one canonical city per locality.
//!
//! OpenAQ reports many monitoring stations per town. For each locality we keep
//! only the station that reported most recently; stations without a locality
//! are dropped because they cannot be grouped.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::helpers::parse_utc;
use crate::models::{City, UNKNOWN_LAST_SEEN};
use crate::services::openaq::{OpenAqClient, RawLocation};

/// Fetch the upstream locations and resolve the cities matching `query`.
///
/// Never fails: upstream and shape errors are logged and yield an empty list.
pub async fn resolve(client: &OpenAqClient, query: &str) -> Vec<City> {
    match client.fetch_locations().await {
        Ok(locations) => {
            let cities = filter_cities(canonical_cities(locations), query);
            tracing::debug!("Resolved {} cities for query '{}'", cities.len(), query);
            cities
        }
        Err(e) => {
            tracing::error!("Failed to fetch OpenAQ locations: {}", e);
            Vec::new()
        }
    }
}

/// Look up a single canonical city by its id.
pub async fn find_city(client: &OpenAqClient, id: i64) -> Option<City> {
    resolve(client, "").await.into_iter().find(|c| c.id == id)
}

/// Deduplicate locations by locality, keeping the most recently seen record.
///
/// Output order follows the first appearance of each locality upstream.
/// Records without a parseable timestamp rank below any dated record; on equal
/// timestamps the first record encountered wins.
pub fn canonical_cities(locations: Vec<RawLocation>) -> Vec<City> {
    let mut chosen: Vec<(RawLocation, Option<DateTime<Utc>>)> = Vec::new();
    let mut index_by_locality: HashMap<String, usize> = HashMap::new();

    for location in locations {
        let Some(locality) = location.locality().map(str::to_string) else {
            tracing::debug!("Skipping location {} without locality", location.id);
            continue;
        };
        let seen = location.last_seen_utc().and_then(parse_utc);

        match index_by_locality.get(&locality) {
            Some(&idx) => {
                // Option ordering puts None below every Some.
                if seen > chosen[idx].1 {
                    chosen[idx] = (location, seen);
                }
            }
            None => {
                index_by_locality.insert(locality, chosen.len());
                chosen.push((location, seen));
            }
        }
    }

    chosen
        .into_iter()
        .map(|(location, seen)| to_city(location, seen))
        .collect()
}

/// Keep the cities whose name contains `query`, ignoring case.
/// A blank query keeps everything.
pub fn filter_cities(cities: Vec<City>, query: &str) -> Vec<City> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return cities;
    }
    cities
        .into_iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect()
}

fn to_city(location: RawLocation, seen: Option<DateTime<Utc>>) -> City {
    let locality = location.locality().unwrap_or_default().to_string();
    let station = location
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    City {
        id: location.id,
        name: locality.clone(),
        location: locality,
        station,
        last_seen: seen
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| UNKNOWN_LAST_SEEN.to_string()),
        sensors: location.sensors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::openaq::parse_results;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loc(id: i64, locality: Option<&str>, last: Option<&str>) -> RawLocation {
        serde_json::from_value(json!({
            "id": id,
            "locality": locality,
            "name": format!("Station {}", id),
            "datetimeLast": last.map(|utc| json!({"utc": utc})),
            "sensors": [{"id": id * 10, "name": "pm25 µg/m³", "parameter": "pm25"}]
        }))
        .unwrap()
    }

    const T1: &str = "2026-03-01T07:00:00Z";
    const T2: &str = "2026-03-01T08:00:00Z";

    #[test]
    fn test_latest_record_wins() {
        let cities = canonical_cities(vec![
            loc(1, Some("Bristol"), Some(T1)),
            loc(2, Some("Bristol"), Some(T2)),
        ]);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, 2);
        assert_eq!(cities[0].name, "Bristol");
        assert_eq!(cities[0].last_seen, parse_utc(T2).unwrap().to_rfc3339());
    }

    #[test]
    fn test_order_of_records_does_not_matter() {
        let cities = canonical_cities(vec![
            loc(2, Some("Bristol"), Some(T2)),
            loc(1, Some("Bristol"), Some(T1)),
        ]);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, 2);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let cities = canonical_cities(vec![
            loc(5, Some("Leeds"), Some(T1)),
            loc(6, Some("Leeds"), Some(T1)),
        ]);
        assert_eq!(cities[0].id, 5);
    }

    #[test]
    fn test_missing_timestamp_is_oldest() {
        let cities = canonical_cities(vec![
            loc(1, Some("York"), None),
            loc(2, Some("York"), Some(T1)),
            loc(3, Some("York"), Some("not a date")),
        ]);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, 2);
    }

    #[test]
    fn test_all_undated_keeps_first_with_sentinel() {
        let cities = canonical_cities(vec![loc(8, Some("Hull"), None), loc(9, Some("Hull"), None)]);
        assert_eq!(cities[0].id, 8);
        assert_eq!(cities[0].last_seen, UNKNOWN_LAST_SEEN);
    }

    #[test]
    fn test_locations_without_locality_are_dropped() {
        let cities = canonical_cities(vec![
            loc(1, None, Some(T2)),
            loc(2, Some(""), Some(T2)),
            loc(3, Some("Bath"), Some(T1)),
        ]);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Bath");
    }

    #[test]
    fn test_one_city_per_locality_in_first_seen_order() {
        let cities = canonical_cities(vec![
            loc(1, Some("London"), Some(T1)),
            loc(2, Some("Cardiff"), Some(T1)),
            loc(3, Some("London"), Some(T2)),
            loc(4, Some("Glasgow"), None),
        ]);
        let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["London", "Cardiff", "Glasgow"]);
        assert_eq!(cities[0].id, 3);
    }

    #[test]
    fn test_chosen_record_fields_are_not_merged() {
        let cities = canonical_cities(vec![
            loc(1, Some("Bristol"), Some(T1)),
            loc(2, Some("Bristol"), Some(T2)),
        ]);
        let city = &cities[0];
        assert_eq!(city.station.as_deref(), Some("Station 2"));
        assert_eq!(city.sensors.len(), 1);
        assert_eq!(city.sensors[0].id, 20);
    }

    #[test]
    fn test_null_sensor_fields_keep_the_city() {
        let body = json!({
            "results": [
                {"id": 1, "locality": "Bristol", "sensors": [{"id": 10, "name": null, "parameter": "pm25"}]},
                {"id": 2, "locality": "Bath", "sensors": null}
            ]
        });
        let cities = canonical_cities(parse_results(&body, "location"));
        let names: Vec<&str> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bristol", "Bath"]);
        assert_eq!(cities[0].sensors.len(), 1);
        assert!(cities[1].sensors.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(canonical_cities(vec![]).is_empty());
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let cities = canonical_cities(vec![
            loc(1, Some("Manchester"), Some(T1)),
            loc(2, Some("Milton Keynes"), Some(T1)),
            loc(3, Some("Market Harborough"), Some(T1)),
        ]);
        let filtered = filter_cities(cities.clone(), "  MAN ");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Manchester");

        let filtered = filter_cities(cities, "ar");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Market Harborough");
    }

    #[test]
    fn test_filter_blank_query_returns_all() {
        let cities = canonical_cities(vec![
            loc(1, Some("Manchester"), Some(T1)),
            loc(2, Some("Leeds"), Some(T1)),
        ]);
        assert_eq!(filter_cities(cities.clone(), "   "), cities);
    }

    #[tokio::test]
    async fn test_resolve_upstream_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = OpenAqClient::new(&server.uri(), "key", 79, 1000);
        assert!(resolve(&client, "").await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_and_find_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/locations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": 1, "locality": "Bristol", "datetimeLast": {"utc": T1}, "sensors": []},
                    {"id": 2, "locality": "Bristol", "datetimeLast": {"utc": T2}, "sensors": []},
                    {"id": 3, "locality": "Bath", "sensors": []}
                ]
            })))
            .mount(&server)
            .await;

        let client = OpenAqClient::new(&server.uri(), "key", 79, 1000);
        let all = resolve(&client, "").await;
        assert_eq!(all.len(), 2);

        let bristol = resolve(&client, "bris").await;
        assert_eq!(bristol.len(), 1);
        assert_eq!(bristol[0].id, 2);

        assert_eq!(find_city(&client, 3).await.map(|c| c.name), Some("Bath".to_string()));
        assert!(find_city(&client, 1).await.is_none());
    }
}
