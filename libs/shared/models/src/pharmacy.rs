use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduling::{Booking, CatalogueEntry, StaffName};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pharmacy {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub primary_email: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Per-pharmacy switches for booking emails. Absent settings mean "send everything".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailSettings {
    pub pharmacy_id: Uuid,
    #[serde(default)]
    pub booking_notification_email: Option<String>,
    #[serde(default)]
    pub cc_email: Option<String>,
    #[serde(default)]
    pub send_patient_confirmation: Option<bool>,
    #[serde(default)]
    pub send_pharmacy_notification: Option<bool>,
}

impl EmailSettings {
    pub fn patient_confirmation_enabled(&self) -> bool {
        self.send_patient_confirmation != Some(false)
    }

    pub fn pharmacy_notification_enabled(&self) -> bool {
        self.send_pharmacy_notification != Some(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedService {
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub service_catalogue: Option<CatalogueEntry>,
}

impl BookedService {
    pub fn display_name(&self) -> String {
        self.custom_title
            .clone()
            .filter(|title| !title.trim().is_empty())
            .or_else(|| self.service_catalogue.as_ref().map(|c| c.name.clone()))
            .unwrap_or_else(|| "Appointment".to_string())
    }
}

/// A booking joined with the service, pharmacy and staff rows needed to notify about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "pharmacy_services")]
    pub service: BookedService,
    #[serde(rename = "pharmacies")]
    pub pharmacy: Pharmacy,
    #[serde(default, rename = "pharmacists")]
    pub staff: Option<StaffName>,
}
