use crate::query::error::QueryError;
use std::collections::HashMap;
use std::str::FromStr;

pub const IMAGE_PARAM: &str = "is_image_exists";
pub const MIN_AGE_PARAM: &str = "min_age";
pub const MAX_AGE_PARAM: &str = "max_age";

/// Tri-state filter on whether a user has an image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFilter {
    #[default]
    Any,
    WithImage,
    WithoutImage,
}

impl FromStr for ImageFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("true") {
            Ok(ImageFilter::WithImage)
        } else if s.eq_ignore_ascii_case("false") {
            Ok(ImageFilter::WithoutImage)
        } else {
            Err(())
        }
    }
}

impl ImageFilter {
    pub fn matches(&self, has_image: bool) -> bool {
        match self {
            ImageFilter::Any => true,
            ImageFilter::WithImage => has_image,
            ImageFilter::WithoutImage => !has_image,
        }
    }
}

/// Filters of a user query. Age bounds are inclusive and in years.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryFilters {
    pub image: ImageFilter,
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
}

impl QueryFilters {
    /// Build filters from raw query parameters; unknown parameters are ignored
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let image = match params.get(IMAGE_PARAM) {
            Some(value) => value
                .parse()
                .map_err(|_| invalid(IMAGE_PARAM, value))?,
            None => ImageFilter::Any,
        };

        Ok(QueryFilters {
            image,
            min_age: parse_age(params, MIN_AGE_PARAM)?,
            max_age: parse_age(params, MAX_AGE_PARAM)?,
        })
    }

    pub fn has_age_bounds(&self) -> bool {
        self.min_age.is_some() || self.max_age.is_some()
    }

    pub fn matches_age(&self, age: f64) -> bool {
        self.min_age.map_or(true, |min| age >= min) && self.max_age.map_or(true, |max| age <= max)
    }
}

fn parse_age(params: &HashMap<String, String>, name: &str) -> Result<Option<f64>, QueryError> {
    let Some(value) = params.get(name) else {
        return Ok(None);
    };
    match value.trim().parse::<f64>() {
        Ok(age) if age.is_finite() => Ok(Some(age)),
        _ => Err(invalid(name, value)),
    }
}

fn invalid(name: &str, value: &str) -> QueryError {
    QueryError::InvalidFilter {
        name: name.to_string(),
        value: value.to_string(),
    }
}
