// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prayer schedule client (equran.id) and reverse geocoding (Nominatim).
//!
//! Handles:
//! - Province and city lists in the schedule API's vocabulary
//! - Monthly prayer schedules and Ramadan imsakiyah tables
//! - Coordinates to (province, city) via Nominatim
//! - Matching geocoded names onto the schedule API's lists

use crate::config::Config;
use crate::error::AppError;
use crate::services::location::{best_match, LocationError};
use chrono::{Datelike, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "AmaliahTracker/1.0";

/// Envelope used by every equran.id response.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: u16,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// One day of a monthly prayer schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule {
    /// Day of month
    pub tanggal: u32,
    #[serde(default)]
    pub tanggal_lengkap: String,
    #[serde(default)]
    pub hari: String,
    pub imsak: String,
    pub subuh: String,
    pub terbit: String,
    pub dhuha: String,
    pub dzuhur: String,
    pub ashar: String,
    pub maghrib: String,
    pub isya: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySchedule {
    pub provinsi: String,
    pub kabkota: String,
    pub bulan: u32,
    pub tahun: i32,
    pub jadwal: Vec<DailySchedule>,
}

/// One day of the Ramadan imsakiyah table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImsakiyahDay {
    pub tanggal: u32,
    pub imsak: String,
    pub subuh: String,
    pub terbit: String,
    pub dhuha: String,
    pub dzuhur: String,
    pub ashar: String,
    pub maghrib: String,
    pub isya: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImsakiyahSchedule {
    pub provinsi: String,
    pub kabkota: String,
    pub imsakiyah: Vec<ImsakiyahDay>,
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
    county: Option<String>,
    state: Option<String>,
}

/// Place names as reported by the geocoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedPlace {
    pub province: String,
    pub city: String,
}

/// Outcome of matching a detected place onto the schedule API's lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationMatchOutcome {
    Matched { province: String, city: String },
    /// Province found but no city could be matched.
    ProvinceOnly { province: String },
    NotFound,
}

/// Client for the prayer schedule and geocoding APIs.
#[derive(Clone)]
pub struct PrayerTimeService {
    http: reqwest::Client,
    schedule_base_url: String,
    geocoder_base_url: String,
}

impl PrayerTimeService {
    pub fn new(schedule_base_url: &str, geocoder_base_url: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            schedule_base_url: schedule_base_url.trim_end_matches('/').to_string(),
            geocoder_base_url: geocoder_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(&config.prayer_api_url, &config.geocoder_url)
    }

    // ─── Schedule API ────────────────────────────────────────

    pub async fn provinces(&self) -> Result<Vec<String>, AppError> {
        let url = format!("{}/shalat/provinsi", self.schedule_base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamApi(e.to_string()))?;
        unwrap_envelope(response).await
    }

    pub async fn cities(&self, province: &str) -> Result<Vec<String>, AppError> {
        let url = format!("{}/shalat/kabkota", self.schedule_base_url);
        self.post_json(&url, &serde_json::json!({ "provinsi": province }))
            .await
    }

    pub async fn monthly_schedule(
        &self,
        province: &str,
        city: &str,
        month: u32,
        year: i32,
    ) -> Result<MonthlySchedule, AppError> {
        let url = format!("{}/shalat", self.schedule_base_url);
        let body = serde_json::json!({
            "provinsi": province,
            "kabkota": city,
            "bulan": month,
            "tahun": year,
        });
        self.post_json(&url, &body).await
    }

    /// Schedule entry for `today`, fetched from that month's table.
    pub async fn today_schedule(
        &self,
        province: &str,
        city: &str,
        today: NaiveDate,
    ) -> Result<DailySchedule, AppError> {
        let month = self
            .monthly_schedule(province, city, today.month(), today.year())
            .await?;

        month
            .jadwal
            .into_iter()
            .find(|day| day.tanggal == today.day())
            .ok_or_else(|| {
                AppError::NotFound(format!("No schedule for day {} in {}", today.day(), city))
            })
    }

    pub async fn imsakiyah(&self, province: &str, city: &str) -> Result<ImsakiyahSchedule, AppError> {
        let url = format!("{}/imsakiyah", self.schedule_base_url);
        let body = serde_json::json!({ "provinsi": province, "kabkota": city });
        self.post_json(&url, &body).await
    }

    // ─── Geocoding ───────────────────────────────────────────

    /// Reverse geocode coordinates into province and city names.
    ///
    /// The city falls back from `city` to `town` to `county`, since
    /// regencies usually come back as counties.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<DetectedPlace, AppError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::BadRequest("Coordinates out of range".to_string()));
        }

        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=10&accept-language=id",
            self.geocoder_base_url, lat, lon
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamApi(format!("Geocoder HTTP {}", status)));
        }

        let parsed: NominatimResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamApi(format!("Geocoder JSON parse error: {}", e)))?;

        let address = parsed.address;
        let city = address
            .city
            .or(address.town)
            .or(address.county)
            .unwrap_or_default();
        let province = address.state.unwrap_or_default();

        tracing::debug!(lat, lon, %province, %city, "Reverse geocoded location");

        Ok(DetectedPlace { province, city })
    }

    /// Map detected names onto the schedule API's province and city lists.
    pub async fn match_location(&self, detected: &DetectedPlace) -> Result<LocationMatchOutcome, AppError> {
        let provinces = self.provinces().await?;
        let province = match best_match(&detected.province, &provinces) {
            Ok(found) => found,
            Err(LocationError::NoMatch(name)) => {
                tracing::info!(province = %name, "No province match");
                return Ok(LocationMatchOutcome::NotFound);
            }
        };

        let cities = match self.cities(&province.name).await {
            Ok(cities) => cities,
            Err(e) => {
                tracing::warn!(province = %province.name, error = %e, "City list unavailable");
                return Ok(LocationMatchOutcome::ProvinceOnly {
                    province: province.name,
                });
            }
        };
        match best_match(&detected.city, &cities) {
            Ok(city) => {
                tracing::info!(
                    province = %province.name,
                    province_score = province.score,
                    city = %city.name,
                    city_score = city.score,
                    "Location matched"
                );
                Ok(LocationMatchOutcome::Matched {
                    province: province.name,
                    city: city.name,
                })
            }
            Err(LocationError::NoMatch(name)) => {
                tracing::info!(province = %province.name, city = %name, "No city match");
                Ok(LocationMatchOutcome::ProvinceOnly {
                    province: province.name,
                })
            }
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamApi(e.to_string()))?;
        unwrap_envelope(response).await
    }
}

/// Check HTTP status and the envelope's `code`, then return `data`.
async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::UpstreamApi(format!("HTTP {}: {}", status, body)));
    }

    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| AppError::UpstreamApi(format!("JSON parse error: {}", e)))?;

    if envelope.code != 200 {
        return Err(AppError::UpstreamApi(format!(
            "API error {}: {}",
            envelope.code, envelope.message
        )));
    }

    envelope
        .data
        .ok_or_else(|| AppError::UpstreamApi("Response missing data".to_string()))
}
