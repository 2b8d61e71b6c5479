use tracing::info;
use uuid::Uuid;

use super::{dto::ReviewRequest, repo::ReviewStore, repo_types::Review};
use crate::{
    billing::{gate::require_paid_member, repo::SubscriptionStore},
    error::{is_unique_violation, AppError},
};

const DUPLICATE_REVIEW: &str = "You have already posted a review for this shop.";
const MAX_COMMENT_CHARS: usize = 2000;

fn validate(req: &ReviewRequest) -> Result<(i32, String), AppError> {
    if !(1..=5).contains(&req.score) {
        return Err(AppError::validation("Score must be between 1 and 5"));
    }
    let comment = req.comment.trim();
    if comment.is_empty() {
        return Err(AppError::validation("Comment is required"));
    }
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::validation(format!(
            "Comment must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok((req.score, comment.to_string()))
}

/// Post the caller's single review for a shop.
pub async fn create_review<S>(
    store: &S,
    user_id: Uuid,
    shop_id: i64,
    req: &ReviewRequest,
) -> Result<Review, AppError>
where
    S: ReviewStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    let (score, comment) = validate(req)?;

    if store
        .find_review_by_author(shop_id, member.user_id())
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(DUPLICATE_REVIEW.into()));
    }

    // A concurrent insert can still win; the unique constraint decides.
    let review = match store
        .insert_review(shop_id, member.user_id(), score, &comment)
        .await
    {
        Ok(r) => r,
        Err(e) if is_unique_violation(&e) => return Err(AppError::Conflict(DUPLICATE_REVIEW.into())),
        Err(e) => return Err(e.into()),
    };
    info!(review_id = review.id, shop_id, %user_id, score, "review posted");
    Ok(review)
}

async fn owned_review<S>(store: &S, user_id: Uuid, review_id: i64) -> Result<Review, AppError>
where
    S: ReviewStore + ?Sized,
{
    store
        .find_review(review_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or(AppError::NotFound("review"))
}

pub async fn edit_review<S>(
    store: &S,
    user_id: Uuid,
    review_id: i64,
    req: &ReviewRequest,
) -> Result<Review, AppError>
where
    S: ReviewStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    let review = owned_review(store, member.user_id(), review_id).await?;
    let (score, comment) = validate(req)?;

    let updated = store.update_review(review.id, score, &comment).await?;
    info!(review_id, %user_id, score, "review updated");
    Ok(updated)
}

pub async fn delete_review<S>(store: &S, user_id: Uuid, review_id: i64) -> Result<(), AppError>
where
    S: ReviewStore + SubscriptionStore + ?Sized,
{
    let member = require_paid_member(store, user_id).await?;
    let review = owned_review(store, member.user_id(), review_id).await?;

    store.delete_review(review.id).await?;
    info!(review_id, %user_id, "review deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{billing::gate::AccessDenied, testing::MemoryStore};

    fn req(score: i32, comment: &str) -> ReviewRequest {
        ReviewRequest {
            score,
            comment: comment.into(),
        }
    }

    async fn paid_user(store: &MemoryStore) -> Uuid {
        let user_id = Uuid::new_v4();
        store.activate(user_id, "cus_1", "sub_1").await.unwrap();
        user_id
    }

    #[tokio::test]
    async fn second_review_for_same_shop_conflicts() {
        let store = MemoryStore::default();
        let user_id = paid_user(&store).await;

        create_review(&store, user_id, 7, &req(4, "Great miso katsu"))
            .await
            .unwrap();
        let err = create_review(&store, user_id, 7, &req(2, "Changed my mind"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.review_count(), 1);
    }

    #[tokio::test]
    async fn unpaid_user_cannot_review() {
        let store = MemoryStore::default();
        let err = create_review(&store, Uuid::new_v4(), 7, &req(4, "ok"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(_)));
        assert_eq!(store.review_count(), 0);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let store = MemoryStore::default();
        let user_id = paid_user(&store).await;
        for bad in [req(0, "x"), req(6, "x"), req(3, "   ")] {
            let err = create_review(&store, user_id, 1, &bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(store.review_count(), 0);
    }

    #[tokio::test]
    async fn edit_and_delete_are_gated_and_leave_review_untouched() {
        let store = MemoryStore::default();
        let user_id = paid_user(&store).await;
        let review = create_review(&store, user_id, 3, &req(5, "Best tebasaki"))
            .await
            .unwrap();

        // membership lapses
        store.deactivate(user_id).await.unwrap();

        let err = edit_review(&store, user_id, review.id, &req(1, "meh"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(AccessDenied::Inactive)));

        let err = delete_review(&store, user_id, review.id).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(AccessDenied::Inactive)));

        assert_eq!(store.find_review(review.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn user_without_subscription_row_is_redirected() {
        let store = MemoryStore::default();
        let author = paid_user(&store).await;
        let review = create_review(&store, author, 3, &req(5, "Best tebasaki"))
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let err = edit_review(&store, stranger, review.id, &req(1, "meh"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(AccessDenied::NoSubscription)));
        assert_eq!(store.find_review(review.id).await.unwrap(), Some(review));
    }

    #[tokio::test]
    async fn only_the_author_can_edit_or_delete() {
        let store = MemoryStore::default();
        let author = paid_user(&store).await;
        let other = paid_user(&store).await;
        let review = create_review(&store, author, 3, &req(5, "Best tebasaki"))
            .await
            .unwrap();

        let err = edit_review(&store, other, review.id, &req(1, "meh"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("review")));
        let err = delete_review(&store, other, review.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("review")));

        let edited = edit_review(&store, author, review.id, &req(3, " Still good "))
            .await
            .unwrap();
        assert_eq!(edited.score, 3);
        assert_eq!(edited.comment, "Still good");

        delete_review(&store, author, review.id).await.unwrap();
        assert_eq!(store.find_review(review.id).await.unwrap(), None);
    }
}
