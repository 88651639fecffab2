use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Vehicle manufacturer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Make {
    pub id: i32,
    pub name: String,
    pub country: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewMake {
    pub name: String,
    pub country: Option<String>,
}

/// Vehicle model (A3, 318i, ...) belonging to a make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: i32,
    pub make_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModel {
    pub make_id: i32,
    pub name: String,
}

/// Most granular vehicle identifier; fitment links point here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submodel {
    pub id: i32,
    pub model_id: i32,
    pub name: String,
    pub year_from: i32,
    pub year_to: Option<i32>,
    pub engine_type: String,
    /// Litres
    pub engine_displacement: f64,
    pub fuel_type: String,
    pub transmission_type: String,
    pub body_type: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmodel {
    pub model_id: i32,
    pub name: String,
    pub year_from: i32,
    pub year_to: Option<i32>,
    pub engine_type: String,
    pub engine_displacement: f64,
    pub fuel_type: String,
    pub transmission_type: String,
    pub body_type: String,
}

impl Submodel {
    /// Whether the submodel was produced in `year`; an open `year_to` means still in production.
    pub fn covers_year(&self, year: i32) -> bool {
        year >= self.year_from && self.year_to.map_or(true, |to| year <= to)
    }
}
