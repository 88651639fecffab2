use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Compatibility record: item `item_id` fits vehicle submodel `submodel_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitmentLink {
    pub id: i32,
    pub item_id: i32,
    pub submodel_id: i32,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFitment {
    pub item_id: i32,
    pub submodel_id: i32,
    pub notes: Option<String>,
}

/// A fitment link with the vehicle names denormalised for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitmentView {
    #[serde(flatten)]
    pub link: FitmentLink,
    pub make_name: String,
    pub model_name: String,
    pub submodel_name: String,
}
