use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Reservation, ReservationListing};

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    pub num_people: i32,
}

#[derive(Debug, Serialize)]
pub struct ReservationCreated {
    pub notice: &'static str,
    pub reservation: Reservation,
}

#[derive(Debug, Serialize)]
pub struct ReservationList {
    pub reservations: Vec<ReservationListing>,
}
