// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Website records and the request objects that create or change them.
//!
//! All ten data fields are kept as text, exactly as they appear in the source
//! dataset. Numeric checks only happen when a record is created through a
//! [`RecordDraft`].

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SiteError, Result};

/// Column order of the source dataset.
pub const FIELD_NAMES: [&str; 10] = [
    "website_name",
    "category",
    "country",
    "launch_year",
    "monthly_visitors",
    "user_name",
    "login_time",
    "comment",
    "feedback",
    "rating",
];

/// Inclusive rating bounds accepted on insert.
pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 5.0;

/// One website's attribute bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity. Collections persisted before ids existed load as nil
    /// and are re-keyed by the store.
    #[serde(default = "Uuid::nil")]
    pub id: Uuid,
    pub website_name: String,
    pub category: String,
    pub country: String,
    pub launch_year: String,
    pub monthly_visitors: String,
    pub user_name: String,
    pub login_time: String,
    pub comment: String,
    pub feedback: String,
    pub rating: String,
}

impl Record {
    /// Build a record from the ten columns in [`FIELD_NAMES`] order.
    /// Returns `None` when any column is empty or whitespace.
    pub fn from_columns<S: AsRef<str>>(id: Uuid, columns: &[S]) -> Option<Self> {
        if columns.len() != FIELD_NAMES.len() {
            return None;
        }
        let col = |i: usize| {
            let v = columns[i].as_ref().trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        Some(Record {
            id,
            website_name: col(0)?,
            category: col(1)?,
            country: col(2)?,
            launch_year: col(3)?,
            monthly_visitors: col(4)?,
            user_name: col(5)?,
            login_time: col(6)?,
            comment: col(7)?,
            feedback: col(8)?,
            rating: col(9)?,
        })
    }

    /// The ten data fields in [`FIELD_NAMES`] order.
    pub fn columns(&self) -> [&str; 10] {
        [
            &self.website_name,
            &self.category,
            &self.country,
            &self.launch_year,
            &self.monthly_visitors,
            &self.user_name,
            &self.login_time,
            &self.comment,
            &self.feedback,
            &self.rating,
        ]
    }

    /// Apply `patch`, keeping the prior value of every field the patch leaves
    /// absent or empty. `login_time` is always replaced.
    pub fn apply(&mut self, patch: RecordPatch, login_time: String) {
        fn merge(slot: &mut String, value: Option<String>) {
            if let Some(v) = value {
                let v = v.trim();
                if !v.is_empty() {
                    *slot = v.to_string();
                }
            }
        }
        merge(&mut self.website_name, patch.website_name);
        merge(&mut self.category, patch.category);
        merge(&mut self.country, patch.country);
        merge(&mut self.launch_year, patch.launch_year);
        merge(&mut self.monthly_visitors, patch.monthly_visitors);
        merge(&mut self.user_name, patch.user_name);
        merge(&mut self.comment, patch.comment);
        merge(&mut self.feedback, patch.feedback);
        merge(&mut self.rating, patch.rating);
        self.login_time = login_time;
    }
}

/// Form submitted to create a record. Validated as a whole before anything is
/// stored; `login_time` is stamped by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDraft {
    pub website_name: String,
    pub category: String,
    pub country: String,
    pub launch_year: String,
    pub monthly_visitors: String,
    pub user_name: String,
    pub comment: String,
    pub feedback: String,
    pub rating: String,
}

impl RecordDraft {
    /// Check every field and collect all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        let required = [
            ("website_name", &self.website_name),
            ("category", &self.category),
            ("country", &self.country),
            ("launch_year", &self.launch_year),
            ("monthly_visitors", &self.monthly_visitors),
            ("user_name", &self.user_name),
            ("comment", &self.comment),
            ("feedback", &self.feedback),
            ("rating", &self.rating),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                problems.push(format!("{name} is required"));
            }
        }

        if !self.launch_year.trim().is_empty() && parse_number(&self.launch_year).is_none() {
            problems.push(format!("launch_year '{}' is not a number", self.launch_year));
        }
        if !self.monthly_visitors.trim().is_empty()
            && parse_number(&self.monthly_visitors).is_none()
        {
            problems.push(format!(
                "monthly_visitors '{}' is not a number",
                self.monthly_visitors
            ));
        }
        if !self.rating.trim().is_empty() {
            match parse_number(&self.rating) {
                Some(r) if (RATING_MIN..=RATING_MAX).contains(&r) => {}
                Some(_) => problems.push(format!("rating '{}' must be between 1 and 5", self.rating)),
                None => problems.push(format!("rating '{}' is not a number", self.rating)),
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SiteError::Validation(problems))
        }
    }

    /// Turn a validated draft into a record.
    pub fn into_record(self, id: Uuid, login_time: String) -> Record {
        Record {
            id,
            website_name: self.website_name.trim().to_string(),
            category: self.category.trim().to_string(),
            country: self.country.trim().to_string(),
            launch_year: self.launch_year.trim().to_string(),
            monthly_visitors: self.monthly_visitors.trim().to_string(),
            user_name: self.user_name.trim().to_string(),
            login_time,
            comment: self.comment.trim().to_string(),
            feedback: self.feedback.trim().to_string(),
            rating: self.rating.trim().to_string(),
        }
    }
}

/// Partial update. Absent or empty fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub website_name: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub launch_year: Option<String>,
    pub monthly_visitors: Option<String>,
    pub user_name: Option<String>,
    pub comment: Option<String>,
    pub feedback: Option<String>,
    pub rating: Option<String>,
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Render a login timestamp the way the dataset stores them,
/// e.g. `3/14/2024, 9:05:07 PM`.
pub fn login_timestamp(at: DateTime<Local>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
