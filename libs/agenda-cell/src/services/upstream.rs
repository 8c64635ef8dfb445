use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE},
    Client,
};
use serde::Deserialize;
use tracing::debug;

use shared_config::AppConfig;

use crate::models::Slot;

/// A professional as listed by the upstream scheduling API.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Professional {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
}

/// The two upstream capabilities the refresh needs. Injected so the
/// orchestrator can be driven by a mock in tests.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn fetch_professionals(&self, unit_id: i64) -> Result<Vec<Professional>>;

    async fn fetch_slots(
        &self,
        professional_id: i64,
        date: NaiveDate,
        unit_id: i64,
    ) -> Result<Vec<Slot>>;
}

/// Raw slot record as returned by the slots endpoint.
#[derive(Debug, Deserialize)]
struct RawSlot {
    status: Option<String>,
    #[serde(rename = "appointmentStatus")]
    appointment_status: Option<String>,
    #[serde(rename = "encaixe")]
    fit_in: Option<bool>,
    #[serde(rename = "formatedHour")]
    formatted_hour: Option<String>,
    #[serde(rename = "numericHour", alias = "numeric_hour")]
    numeric_hour: Option<f64>,
    #[serde(rename = "idPatient")]
    patient_id: Option<i64>,
    #[serde(rename = "idAppointment")]
    appointment_id: Option<i64>,
}

impl RawSlot {
    fn into_slot(self) -> Slot {
        let status = self.status.unwrap_or_else(|| "Indefinido".to_string());
        let is_fit_in = self.fit_in.unwrap_or(false) || status == "Encaixe";

        Slot {
            hour: self.formatted_hour.unwrap_or_else(|| "N/A".to_string()),
            numeric_hour: self.numeric_hour.unwrap_or(0.0),
            status,
            appointment_status: self.appointment_status,
            is_fit_in,
            patient_id: self.patient_id,
            appointment_id: self.appointment_id,
        }
    }
}

/// The slots endpoint wraps the day's slots per professional.
#[derive(Debug, Deserialize)]
struct SlotsByProfessional {
    #[serde(default)]
    hours: Vec<RawSlot>,
}

/// Client for the Amei scheduling API.
///
/// Credentials come from the config at construction time; nothing here is
/// ambient or module-global.
pub struct AmeiClient {
    client: Client,
    base_url: String,
    bearer_token: String,
    cookie: String,
}

impl AmeiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.amei_base_url.clone(),
            bearer_token: config.amei_bearer_token.clone(),
            cookie: config.amei_cookie.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.bearer_token))?,
        );
        if !self.cookie.is_empty() {
            headers.insert(COOKIE, HeaderValue::from_str(&self.cookie)?);
        }

        Ok(headers)
    }
}

#[async_trait]
impl ScheduleProvider for AmeiClient {
    async fn fetch_professionals(&self, unit_id: i64) -> Result<Vec<Professional>> {
        let url = format!("{}/profissionais/by-unidade", self.base_url);
        debug!("Fetching professionals for unit {}", unit_id);

        let response = self
            .client
            .get(&url)
            .headers(self.get_headers()?)
            .query(&[("idClinic", unit_id.to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "professionals request failed ({}): {}",
                status,
                error_text
            ));
        }

        let professionals = response.json::<Vec<Professional>>().await?;
        Ok(professionals)
    }

    async fn fetch_slots(
        &self,
        professional_id: i64,
        date: NaiveDate,
        unit_id: i64,
    ) -> Result<Vec<Slot>> {
        let url = format!("{}/slots/list-slots-by-professional", self.base_url);
        let compact_date = date.format("%Y%m%d").to_string();
        debug!(
            "Fetching slots for professional {} on {} (unit {})",
            professional_id, date, unit_id
        );

        let response = self
            .client
            .get(&url)
            .headers(self.get_headers()?)
            .query(&[
                ("idClinic", unit_id.to_string()),
                ("idSpecialty", "null".to_string()),
                ("idProfessional", professional_id.to_string()),
                ("initialDate", compact_date.clone()),
                ("finalDate", compact_date),
                ("initialHour", "00:00".to_string()),
                ("endHour", "23:59".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("slots request failed ({}): {}", status, error_text));
        }

        // The payload is a one-element array wrapping the day's slots.
        let payload = response.json::<Vec<SlotsByProfessional>>().await?;
        let slots = payload
            .into_iter()
            .next()
            .map(|day| day.hours.into_iter().map(RawSlot::into_slot).collect())
            .unwrap_or_default();

        Ok(slots)
    }
}
