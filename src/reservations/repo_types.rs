use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Reservation {
    pub id: i64,
    pub shop_id: i64,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    pub num_people: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReservationListing {
    pub id: i64,
    pub shop_id: i64,
    pub shop_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date_time: OffsetDateTime,
    pub num_people: i32,
}
