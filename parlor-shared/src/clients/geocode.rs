use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

/// Result of a reverse lookup. `city` is the raw settlement name when the
/// provider resolved one; `label` is always usable as display text, falling
/// back to literal coordinates when the lookup fails.
#[derive(Debug, Clone)]
pub struct CityLookup {
    pub label: String,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Best-effort reverse geocoder backed by nominatim, with an in-process
/// cache keyed by coordinates rounded to 4 decimals.
pub struct Geocoder {
    client: Client,
    cache: Mutex<HashMap<(i64, i64), CityLookup>>,
}

impl Geocoder {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("parlor-bot/1.0")
            .build()
            .expect("failed to build geocoder http client");
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn reverse(&self, lat: f64, lon: f64) -> CityLookup {
        let key = ((lat * 10_000.0).round() as i64, (lon * 10_000.0).round() as i64);
        if let Some(hit) = self.cache.lock().expect("geocode cache poisoned").get(&key) {
            return hit.clone();
        }

        let result = match self.lookup(lat, lon).await {
            Ok(Some(found)) => found,
            Ok(None) => Self::literal(lat, lon),
            Err(err) => {
                tracing::warn!(lat, lon, error = %err, "reverse geocode failed, using literal coordinates");
                Self::literal(lat, lon)
            }
        };

        self.cache
            .lock()
            .expect("geocode cache poisoned")
            .insert(key, result.clone());
        result
    }

    async fn lookup(&self, lat: f64, lon: f64) -> Result<Option<CityLookup>, reqwest::Error> {
        let response: NominatimResponse = self
            .client
            .get("https://nominatim.openstreetmap.org/reverse")
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("zoom", "10".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let addr = response.address;
        let city = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.municipality);
        let label: String = [city.clone(), addr.state, addr.country]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        if label.is_empty() {
            return Ok(None);
        }
        Ok(Some(CityLookup { label, city }))
    }

    fn literal(lat: f64, lon: f64) -> CityLookup {
        CityLookup {
            label: format!("{lat:.4},{lon:.4}"),
            city: None,
        }
    }
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}
