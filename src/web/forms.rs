use std::str::FromStr;

use serde::Deserialize;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};
use uuid::Uuid;

use crate::records::dto::RecordInput;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Health-record form fields arrive as raw strings; browsers submit empty
/// inputs as `""`, so everything is parsed leniently here and the engine
/// enforces what is actually required.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    pub id: Option<String>,
    pub date: Option<String>,
    pub body_temperature: Option<String>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<String>,
    pub water_intake: Option<String>,
    pub sleep_duration: Option<String>,
    pub stress_level: Option<String>,
    pub notes: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_field<T: FromStr>(value: &Option<String>) -> Option<T> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

impl RecordForm {
    pub fn record_id(&self) -> Option<Uuid> {
        parse_field(&self.id)
    }

    pub fn to_input(&self) -> RecordInput {
        RecordInput {
            date: self
                .date
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .and_then(|s| Date::parse(s, DATE_FORMAT).ok()),
            body_temperature: parse_field(&self.body_temperature),
            blood_pressure: non_blank(&self.blood_pressure),
            heart_rate: parse_field(&self.heart_rate),
            water_intake: parse_field(&self.water_intake),
            sleep_duration: parse_field(&self.sleep_duration),
            stress_level: parse_field(&self.stress_level),
            notes: non_blank(&self.notes),
        }
    }
}
