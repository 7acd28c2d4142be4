use std::collections::BTreeMap;

use crate::{
    errors::{AppError, AppResult},
    models::dto::response::TitleDto,
};

/// Read-only book title -> content index table, built once at startup.
pub struct IndexResolver {
    indices: BTreeMap<String, String>,
}

impl IndexResolver {
    pub fn new(indices: BTreeMap<String, String>) -> Self {
        Self { indices }
    }

    pub fn resolve(&self, title: &str) -> AppResult<&str> {
        self.indices
            .get(title)
            .map(String::as_str)
            .ok_or_else(|| {
                AppError::not_found_with(
                    format!("Title '{}' not found", title),
                    self.indices.keys().cloned().collect(),
                )
            })
    }

    pub fn titles(&self) -> Vec<TitleDto> {
        self.indices
            .iter()
            .map(|(title, index)| TitleDto {
                title: title.clone(),
                index: index.clone(),
            })
            .collect()
    }
}
