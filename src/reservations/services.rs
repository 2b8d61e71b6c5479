use tracing::info;
use uuid::Uuid;

use super::{dto::ReservationRequest, repo::ReservationStore, repo_types::Reservation};
use crate::{
    billing::{gate::require_paid_member, repo::SubscriptionStore},
    error::AppError,
};

/// No capacity or overlap checks are made.
pub async fn create<S>(
    store: &S,
    user_id: Uuid,
    shop_id: i64,
    req: &ReservationRequest,
) -> Result<Reservation, AppError>
where
    S: ReservationStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    if req.num_people < 1 {
        return Err(AppError::validation("Number of people must be at least 1"));
    }

    let reservation = store
        .insert_reservation(shop_id, member.user_id(), req.date_time, req.num_people)
        .await?;
    info!(reservation_id = reservation.id, shop_id, %user_id, "reservation created");
    Ok(reservation)
}

/// Cancel one of the caller's own reservations. Other users' ids look
/// missing.
pub async fn cancel<S>(store: &S, user_id: Uuid, reservation_id: i64) -> Result<(), AppError>
where
    S: ReservationStore + ?Sized,
{
    let reservation = store
        .find_reservation(reservation_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or(AppError::NotFound("reservation"))?;

    store.delete_reservation(reservation.id).await?;
    info!(reservation_id, %user_id, "reservation cancelled");
    Ok(())
}
