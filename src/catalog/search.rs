//! Shop search: user-supplied filter fields to a single SQL query.
//!
//! All supplied filters are ANDed. Empty strings count as "not supplied".

use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{repo::SHOP_COLUMNS, repo_types::Shop};
use crate::error::AppError;

pub const PAGE_SIZE: i64 = 10;

const KEYWORD_MIN_CHARS: usize = 2;
const KEYWORD_MAX_CHARS: usize = 100;

/// Raw query-string fields, as the search form sends them.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub selected_category: Option<String>,
    pub freeword: Option<String>,
    pub region: Option<String>,
    pub price_range: Option<String>,
    pub rating: Option<String>,
}

/// `"min-max"` budget bucket; `"min-"` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBucket {
    pub min: i32,
    pub max: Option<i32>,
}

impl FromStr for PriceBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid price range: {s}"));
        let (min, max) = s.trim().split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse::<i32>().map_err(|_| invalid())?;
        let max = match max.trim() {
            "" => None,
            m => Some(m.parse::<i32>().map_err(|_| invalid())?),
        };
        if matches!(max, Some(max) if max < min) {
            return Err(invalid());
        }
        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub category_id: Option<i64>,
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub price: Option<PriceBucket>,
    pub min_rating: Option<i32>,
}

fn supplied(field: Option<String>) -> Option<String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl TryFrom<SearchParams> for SearchFilter {
    type Error = AppError;

    fn try_from(p: SearchParams) -> Result<Self, Self::Error> {
        let category_id = supplied(p.selected_category)
            .map(|c| {
                c.parse::<i64>()
                    .map_err(|_| AppError::validation("Select a valid category"))
            })
            .transpose()?;

        let keyword = supplied(p.freeword);
        if let Some(k) = &keyword {
            let len = k.chars().count();
            if !(KEYWORD_MIN_CHARS..=KEYWORD_MAX_CHARS).contains(&len) {
                return Err(AppError::validation(format!(
                    "Keyword must be between {KEYWORD_MIN_CHARS} and {KEYWORD_MAX_CHARS} characters"
                )));
            }
        }

        let price = supplied(p.price_range)
            .map(|r| r.parse::<PriceBucket>())
            .transpose()?;

        // Unusable ratings are dropped rather than rejected.
        let min_rating = supplied(p.rating).and_then(|r| match r.parse::<i32>() {
            Ok(v) if (1..=5).contains(&v) => Some(v),
            _ => {
                debug!(rating = %r, "ignoring unusable rating filter");
                None
            }
        });

        Ok(Self {
            category_id,
            keyword,
            region: supplied(p.region),
            price,
            min_rating,
        })
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
fn like_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl SearchFilter {
    fn push_from_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(" FROM shops s");
        if self.min_rating.is_some() {
            // inner join: shops without reviews have no average and drop out
            qb.push(
                " JOIN (SELECT shop_id, AVG(score)::float8 AS avg_score \
                 FROM reviews GROUP BY shop_id) r ON r.shop_id = s.id",
            );
        }
        qb.push(" WHERE TRUE");
        if let Some(id) = self.category_id {
            qb.push(" AND s.category_id = ").push_bind(id);
        }
        if let Some(keyword) = &self.keyword {
            qb.push(" AND s.name ILIKE ").push_bind(like_pattern(keyword));
        }
        if let Some(region) = &self.region {
            qb.push(" AND s.region ILIKE ").push_bind(like_pattern(region));
        }
        if let Some(price) = self.price {
            qb.push(" AND s.price_range >= ").push_bind(price.min);
            if let Some(max) = price.max {
                qb.push(" AND s.price_range <= ").push_bind(max);
            }
        }
        if let Some(rating) = self.min_rating {
            qb.push(" AND r.avg_score >= ").push_bind(f64::from(rating));
        }
    }

    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {SHOP_COLUMNS}"));
        self.push_from_where(&mut qb);
        qb.push(" ORDER BY s.id LIMIT ").push_bind(PAGE_SIZE);
        qb
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        self.push_from_where(&mut qb);
        qb
    }
}

#[derive(Debug)]
pub struct SearchPage {
    pub total_hit_count: i64,
    pub shops: Vec<Shop>,
}

/// First page of matches plus the uncapped match count.
pub async fn search(db: &PgPool, filter: &SearchFilter) -> anyhow::Result<SearchPage> {
    let (total_hit_count,) = filter
        .count_query()
        .build_query_as::<(i64,)>()
        .fetch_one(db)
        .await
        .context("count search hits")?;

    let shops = filter
        .select_query()
        .build_query_as::<Shop>()
        .fetch_all(db)
        .await
        .context("search shops")?;

    Ok(SearchPage {
        total_hit_count,
        shops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> SearchParams {
        let mut p = SearchParams::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "selected_category" => p.selected_category = v,
                "freeword" => p.freeword = v,
                "region" => p.region = v,
                "price_range" => p.price_range = v,
                "rating" => p.rating = v,
                other => panic!("unknown field {other}"),
            }
        }
        p
    }

    fn filter(pairs: &[(&str, &str)]) -> Result<SearchFilter, AppError> {
        SearchFilter::try_from(params(pairs))
    }

    #[test]
    fn price_bucket_closed_and_open() {
        assert_eq!(
            "1000-2999".parse::<PriceBucket>().unwrap(),
            PriceBucket { min: 1000, max: Some(2999) }
        );
        assert_eq!(
            "5000-".parse::<PriceBucket>().unwrap(),
            PriceBucket { min: 5000, max: None }
        );
    }

    #[test]
    fn price_bucket_rejects_garbage() {
        for bad in ["cheap", "-1000", "1000", "a-b", "3000-1000"] {
            assert!(bad.parse::<PriceBucket>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn empty_fields_mean_no_filter() {
        let f = filter(&[
            ("selected_category", ""),
            ("freeword", "  "),
            ("region", ""),
            ("price_range", ""),
            ("rating", ""),
        ])
        .unwrap();
        assert_eq!(f, SearchFilter::default());
    }

    #[test]
    fn unusable_rating_is_ignored() {
        assert_eq!(filter(&[("rating", "abc")]).unwrap().min_rating, None);
        assert_eq!(filter(&[("rating", "9")]).unwrap().min_rating, None);
        assert_eq!(filter(&[("rating", "4")]).unwrap().min_rating, Some(4));
    }

    #[test]
    fn keyword_length_is_validated() {
        assert!(matches!(filter(&[("freeword", "x")]), Err(AppError::Validation(_))));
        let long = "x".repeat(101);
        assert!(filter(&[("freeword", long.as_str())]).is_err());
        assert_eq!(
            filter(&[("freeword", " 味噌 ")]).unwrap().keyword.as_deref(),
            Some("味噌")
        );
    }

    #[test]
    fn category_must_be_numeric() {
        assert!(filter(&[("selected_category", "washoku")]).is_err());
        assert_eq!(filter(&[("selected_category", "3")]).unwrap().category_id, Some(3));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
        assert_eq!(like_pattern("ramen"), "%ramen%");
    }

    #[test]
    fn unfiltered_query_is_capped_but_count_is_not() {
        let f = SearchFilter::default();
        let select = f.select_query();
        assert_eq!(
            select.sql(),
            format!("SELECT {SHOP_COLUMNS} FROM shops s WHERE TRUE ORDER BY s.id LIMIT $1")
        );
        let count = f.count_query();
        assert_eq!(count.sql(), "SELECT COUNT(*) FROM shops s WHERE TRUE");
    }

    #[test]
    fn closed_price_bucket_bounds_both_sides() {
        let f = filter(&[("price_range", "1000-2999")]).unwrap();
        let count = f.count_query();
        assert_eq!(
            count.sql(),
            "SELECT COUNT(*) FROM shops s WHERE TRUE \
             AND s.price_range >= $1 AND s.price_range <= $2"
        );
    }

    #[test]
    fn open_price_bucket_has_only_lower_bound() {
        let f = filter(&[("price_range", "5000-")]).unwrap();
        let sql = f.count_query().sql().to_string();
        assert!(sql.contains("s.price_range >= $1"));
        assert!(!sql.contains("<="));
    }

    #[test]
    fn rating_filter_inner_joins_review_averages() {
        let f = filter(&[("rating", "3")]).unwrap();
        let sql = f.count_query().sql().to_string();
        assert!(sql.contains(" JOIN (SELECT shop_id, AVG(score)::float8 AS avg_score"));
        assert!(!sql.contains("LEFT JOIN"));
        assert!(sql.ends_with("AND r.avg_score >= $1"));
    }

    #[test]
    fn all_filters_are_conjunctive_in_order() {
        let f = filter(&[
            ("selected_category", "2"),
            ("freeword", "ひつまぶし"),
            ("region", "中区"),
            ("price_range", "3000-4999"),
            ("rating", "4"),
        ])
        .unwrap();
        let sql = f.select_query().sql().to_string();
        let where_clause = sql.split(" WHERE ").nth(1).unwrap();
        assert_eq!(
            where_clause,
            "TRUE AND s.category_id = $1 AND s.name ILIKE $2 AND s.region ILIKE $3 \
             AND s.price_range >= $4 AND s.price_range <= $5 AND r.avg_score >= $6 \
             ORDER BY s.id LIMIT $7"
        );
    }
}
