use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::date_format;

pub const DEFAULT_IMPORTANCE: u8 = 3;
pub const DEFAULT_DIFFICULTY: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    #[serde(default, with = "date_format::optional")]
    pub exam_date: Option<NaiveDate>,
    #[serde(default = "default_weight_factor")]
    pub importance: u8,
    #[serde(default = "default_weight_factor")]
    pub difficulty: u8,
    #[serde(default)]
    pub time_studied_so_far: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl CourseRecord {
    /// importance × difficulty, each treated as 1 when unset (zero).
    pub fn weight(&self) -> u32 {
        let importance = if self.importance == 0 { 1 } else { self.importance };
        let difficulty = if self.difficulty == 0 { 1 } else { self.difficulty };
        u32::from(importance) * u32::from(difficulty)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreateInput {
    pub name: String,
    #[serde(default, with = "date_format::optional")]
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub difficulty: Option<u8>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "date_format::patch::deserialize")]
    pub exam_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub difficulty: Option<u8>,
}

fn default_weight_factor() -> u8 {
    1
}
