use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{average_rate, CategoryList, IndexPage, SearchResponse, ShopDetail},
    repo,
    search::{self, SearchFilter, SearchParams},
};
use crate::{
    auth::extractors::OptionalAuthUser,
    error::AppError,
    favorites::repo::FavoriteStore,
    reviews::repo::{latest, list_for_shop},
    state::AppState,
};

const PICKUP_COUNT: i64 = 10;
const LATEST_REVIEW_COUNT: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/categories", get(categories))
        .route("/search", get(search_shops))
        .route("/shops/:id", get(shop_detail))
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<IndexPage>, AppError> {
    let pickup_shops = repo::pickup_shops(&state.db, PICKUP_COUNT).await?;
    let latest_reviews = latest(&state.db, LATEST_REVIEW_COUNT).await?;
    let categories = repo::list_categories(&state.db).await?;

    Ok(Json(IndexPage {
        pickup_shops,
        latest_reviews: latest_reviews.into_iter().map(Into::into).collect(),
        categories,
    }))
}

#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<CategoryList>, AppError> {
    let categories = repo::list_categories(&state.db).await?;
    Ok(Json(CategoryList { categories }))
}

#[instrument(skip(state))]
pub async fn search_shops(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, AppError> {
    let filter = SearchFilter::try_from(params)?;
    let page = search::search(&state.db, &filter).await?;
    debug!(total = page.total_hit_count, returned = page.shops.len(), "search done");

    Ok(Json(SearchResponse {
        total_hit_count: page.total_hit_count,
        shops: page.shops,
    }))
}

#[instrument(skip(state))]
pub async fn shop_detail(
    State(state): State<AppState>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(shop_id): Path<i64>,
) -> Result<Json<ShopDetail>, AppError> {
    let shop = repo::find_shop(&state.db, shop_id)
        .await?
        .ok_or(AppError::NotFound("shop"))?;
    let category = repo::find_category(&state.db, shop.category_id).await?;
    let stats = repo::rating_stats(&state.db, shop_id).await?;
    let reviews = list_for_shop(&state.db, shop_id).await?;
    let is_favorite = match user_id {
        Some(user_id) => state.db.is_favorite(shop_id, user_id).await?,
        None => false,
    };

    Ok(Json(ShopDetail {
        shop,
        category,
        review_count: stats.review_count,
        average: stats.average,
        average_rate: average_rate(stats.average),
        reviews: reviews.into_iter().map(Into::into).collect(),
        is_favorite,
    }))
}
