use crate::db::{FakeDatabase, UserRow};
use crate::pipeline::NO_IMAGE;
use crate::query::{
    age_in_years, ImageFilter, QueryError, QueryFilters, QueryService, MILLIS_PER_YEAR,
};
use std::collections::HashMap;
use std::sync::Arc;

const NOW: i64 = 1_700_000_000_000;

fn row(user_id: &str, birthdate: &str, img_path: &str) -> UserRow {
    UserRow {
        user_id: user_id.to_string(),
        first_name: format!("First{}", user_id),
        last_name: format!("Last{}", user_id),
        birthdate: birthdate.to_string(),
        img_path: img_path.to_string(),
    }
}

fn born_years_ago(years: f64) -> String {
    ((NOW as f64) - years * MILLIS_PER_YEAR).to_string()
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn setup(rows: Vec<UserRow>) -> QueryService<FakeDatabase> {
    let database = FakeDatabase::new();
    for row in rows {
        database.fake_add_user(row);
    }
    QueryService::new(Arc::new(database))
}

async fn ids(service: &QueryService<FakeDatabase>, filters: QueryFilters) -> Vec<String> {
    service
        .query_at(&filters, NOW)
        .await
        .unwrap()
        .into_keys()
        .collect()
}

#[tokio::test]
async fn no_filters_returns_every_user_keyed_by_id() {
    let service = setup(vec![
        row("1001", "670626000000", NO_IMAGE),
        row("1000", "612302400000", "srcdata/1000.png"),
    ]);

    let users = service.query_at(&QueryFilters::default(), NOW).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users["1000"].first_name, "First1000");
    assert_eq!(users["1000"].img_path, "srcdata/1000.png");
    assert_eq!(users["1001"].birthts, "670626000000");
}

#[tokio::test]
async fn image_filter_splits_on_the_sentinel() {
    let service = setup(vec![
        row("1", "0", "srcdata/1.png"),
        row("2", "0", NO_IMAGE),
        row("3", "0", "srcdata/3.jpg"),
    ]);

    let with_image = QueryFilters {
        image: ImageFilter::WithImage,
        ..Default::default()
    };
    let without_image = QueryFilters {
        image: ImageFilter::WithoutImage,
        ..Default::default()
    };

    assert_eq!(ids(&service, with_image).await, vec!["1", "3"]);
    assert_eq!(ids(&service, without_image).await, vec!["2"]);
}

#[tokio::test]
async fn age_bounds_are_inclusive() {
    let service = setup(vec![row("thirty", &born_years_ago(30.0), NO_IMAGE)]);

    let at_least = |min: f64| QueryFilters {
        min_age: Some(min),
        ..Default::default()
    };
    let at_most = |max: f64| QueryFilters {
        max_age: Some(max),
        ..Default::default()
    };

    assert_eq!(ids(&service, at_least(30.0)).await, vec!["thirty"]);
    assert!(ids(&service, at_least(30.01)).await.is_empty());
    assert_eq!(ids(&service, at_most(30.0)).await, vec!["thirty"]);
    assert!(ids(&service, at_most(29.99)).await.is_empty());
}

#[tokio::test]
async fn filters_combine() {
    let service = setup(vec![
        row("young_img", &born_years_ago(20.0), "srcdata/a.png"),
        row("old_img", &born_years_ago(50.0), "srcdata/b.png"),
        row("mid_img", &born_years_ago(35.0), "srcdata/c.png"),
        row("mid_none", &born_years_ago(35.0), NO_IMAGE),
    ]);

    let filters = QueryFilters {
        image: ImageFilter::WithImage,
        min_age: Some(25.0),
        max_age: Some(40.0),
    };
    assert_eq!(ids(&service, filters).await, vec!["mid_img"]);
}

#[tokio::test]
async fn non_numeric_birthts_only_drops_out_under_age_bounds() {
    let service = setup(vec![row("odd", "not-a-number", NO_IMAGE)]);

    assert_eq!(ids(&service, QueryFilters::default()).await, vec!["odd"]);

    let bounded = QueryFilters {
        min_age: Some(0.0),
        ..Default::default()
    };
    assert!(ids(&service, bounded).await.is_empty());
}

#[tokio::test]
async fn duplicate_ids_keep_the_last_row() {
    let service = setup(vec![
        row("1000", "1", "srcdata/old.png"),
        row("1000", "2", "srcdata/new.png"),
    ]);

    let users = service.query_at(&QueryFilters::default(), NOW).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users["1000"].img_path, "srcdata/new.png");
}

#[tokio::test]
async fn unavailable_database_is_an_error() {
    let database = Arc::new(FakeDatabase::new());
    database.fake_set_unavailable(true);
    let service = QueryService::new(database);

    let result = service.query(&QueryFilters::default()).await;
    assert!(matches!(result, Err(QueryError::Database(_))));
}

#[test]
fn filters_parse_from_query_parameters() {
    let filters = QueryFilters::from_params(&params(&[
        ("is_image_exists", "TRUE"),
        ("min_age", "18"),
        ("max_age", " 65.5 "),
        ("page", "3"),
    ]))
    .unwrap();

    assert_eq!(
        filters,
        QueryFilters {
            image: ImageFilter::WithImage,
            min_age: Some(18.0),
            max_age: Some(65.5),
        }
    );
    assert_eq!(
        QueryFilters::from_params(&params(&[("is_image_exists", "False")]))
            .unwrap()
            .image,
        ImageFilter::WithoutImage
    );
    assert_eq!(
        QueryFilters::from_params(&HashMap::new()).unwrap(),
        QueryFilters::default()
    );
}

#[test]
fn bad_filter_values_are_rejected() {
    for (name, value) in [
        ("is_image_exists", "yes"),
        ("min_age", "abc"),
        ("max_age", "NaN"),
        ("min_age", "inf"),
    ] {
        let result = QueryFilters::from_params(&params(&[(name, value)]));
        assert!(
            matches!(result, Err(QueryError::InvalidFilter { name: ref n, .. }) if n == name),
            "{}={} should be rejected",
            name,
            value
        );
    }
}

#[test]
fn age_is_computed_in_julian_years() {
    let birth = born_years_ago(42.0);
    let age = age_in_years(&birth, NOW).unwrap();
    assert!((age - 42.0).abs() < 1e-9);
    assert_eq!(age_in_years("x", NOW), None);
}
