//! Categorized evaluation questions.
//!
//! The built-in reference catalog covers flight planning and monitoring; a
//! JSON catalog of the same shape can replace it:
//!
//! ```json
//! [{"name": "simple_factual", "questions": ["What is ICAO?"]}]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    categories: Vec<Category>,
}

const SIMPLE_FACTUAL: &[&str] = &[
    "What is ICAO?",
    "What does ATC stand for?",
    "What is the definition of flight planning?",
    "What is a flight plan?",
    "What does VFR mean?",
    "What does IFR mean?",
    "What is NOTAM?",
    "What is the purpose of a flight plan?",
    "What is the minimum fuel reserve requirement?",
    "What is an alternate aerodrome?",
    "What is RVSM?",
    "What does ETOPS stand for?",
    "What is a SID?",
    "What is a STAR?",
    "What is the definition of cruising level?",
    "What is a waypoint?",
    "What is the definition of route?",
    "What is AIP?",
    "What is a navigation log?",
    "What is the purpose of pre-flight planning?",
];

const APPLIED: &[&str] = &[
    "How do you calculate the required fuel for a flight?",
    "What steps are involved in filing a flight plan?",
    "When should a pilot file a flight plan?",
    "How do you determine the optimal cruising altitude?",
    "What factors affect flight planning?",
    "What should be checked during pre-flight planning?",
    "How do you select an alternate aerodrome?",
    "What are the requirements for international flight planning?",
    "How do you calculate the estimated time en route?",
    "What information is required in a flight plan?",
    "How do you determine the route of flight?",
    "What weather information is needed for flight planning?",
    "How do you calculate the top of descent point?",
    "What are the procedures for flight plan amendments?",
    "How do you monitor a flight in progress?",
    "What actions should be taken if the flight deviates from the plan?",
    "How do you calculate fuel burn rate?",
    "What are the considerations for route selection?",
    "How do you determine the appropriate airspeed for cruise?",
    "What are the procedures for flight plan closure?",
];

const HIGHER_ORDER: &[&str] = &[
    "What trade-offs should be considered when choosing between a direct route and airways?",
    "How would weather conditions affect the choice of alternate aerodrome?",
    "If the planned cruising altitude is unavailable, how should the pilot adjust the flight plan?",
    "What factors would lead a pilot to decide to divert to an alternate airport?",
    "How do fuel requirements change for different flight conditions?",
    "What is the relationship between aircraft weight and optimal cruise altitude?",
    "How should a pilot balance fuel efficiency with flight time?",
    "What considerations are needed when planning a flight over mountainous terrain?",
    "How do wind conditions affect route planning and fuel calculations?",
    "What decision-making process should be used when flight conditions deteriorate?",
];

impl QuestionCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// 50 flight-planning questions: 20 simple factual, 20 applied, 10 higher order.
    pub fn reference() -> Self {
        let category = |name: &str, questions: &[&str]| Category {
            name: name.to_string(),
            questions: questions.iter().map(|q| q.to_string()).collect(),
        };
        Self::new(vec![
            category("simple_factual", SIMPLE_FACTUAL),
            category("applied", APPLIED),
            category("higher_order", HIGHER_ORDER),
        ])
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.is_empty() {
            return Err(EvalError::EmptyCatalog);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| EvalError::CatalogRead { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(category, question)` pairs in catalog order.
    pub fn questions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .flat_map(|c| c.questions.iter().map(move |q| (c.name.as_str(), q.as_str())))
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::reference()
    }
}
