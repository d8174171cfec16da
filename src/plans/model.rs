use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    items::{ItemInput, PlanItem, PlanKind},
    lenient,
};
use crate::i18n::Locale;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("plan name is empty")]
    IncompletePlan,
    #[error("day {day} is incomplete")]
    IncompleteDay { day: usize },
    #[error("item {item} of day {day} is incomplete")]
    IncompleteItem { day: usize, item: usize },
    #[error("no day at index {0}")]
    DayOutOfRange(usize),
    #[error("no item at index {0}")]
    ItemOutOfRange(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    /// Used once all seven weekdays are taken.
    Other,
}

impl DayOfWeek {
    pub const WEEK: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
            DayOfWeek::Other => "other",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                DayOfWeek::Monday => "Monday",
                DayOfWeek::Tuesday => "Tuesday",
                DayOfWeek::Wednesday => "Wednesday",
                DayOfWeek::Thursday => "Thursday",
                DayOfWeek::Friday => "Friday",
                DayOfWeek::Saturday => "Saturday",
                DayOfWeek::Sunday => "Sunday",
                DayOfWeek::Other => "Day",
            },
            Locale::Es => match self {
                DayOfWeek::Monday => "Lunes",
                DayOfWeek::Tuesday => "Martes",
                DayOfWeek::Wednesday => "Miércoles",
                DayOfWeek::Thursday => "Jueves",
                DayOfWeek::Friday => "Viernes",
                DayOfWeek::Saturday => "Sábado",
                DayOfWeek::Sunday => "Domingo",
                DayOfWeek::Other => "Día",
            },
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the canonical key, three-letter abbreviations and localized labels.
impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let all = DayOfWeek::WEEK.iter().copied().chain([DayOfWeek::Other]);
        for day in all {
            let matches = day.as_str() == wanted
                || (day != DayOfWeek::Other && day.as_str()[..3] == wanted)
                || Locale::ALL.iter().any(|l| day.label(*l).to_lowercase() == wanted);
            if matches {
                return Ok(day);
            }
        }
        Err(format!("unknown day of week '{}'", s.trim()))
    }
}

impl From<DayOfWeek> for String {
    fn from(day: DayOfWeek) -> Self {
        day.as_str().to_string()
    }
}

impl TryFrom<String> for DayOfWeek {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Name a day gets until the user renames it, e.g. "Monday - Training".
pub fn default_day_name(day: DayOfWeek, kind: PlanKind, locale: Locale) -> String {
    format!("{} - {}", day.label(locale), kind.day_suffix(locale))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day<I> {
    /// Client-side handle for unsaved days. Never serialized.
    #[serde(rename = "tempId", default, skip_serializing)]
    pub temp_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default = "Vec::new", alias = "exercises", alias = "meals")]
    pub items: Vec<I>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_manually_edited: Option<bool>,
}

/// New values for a day's heading. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayUpdate {
    #[serde(default, deserialize_with = "lenient::parsed")]
    pub day_of_week: Option<DayOfWeek>,
    pub name: Option<String>,
}

impl<I: PlanItem> Day<I> {
    pub fn new(day_of_week: DayOfWeek, order: u32, locale: Locale) -> Self {
        Self {
            temp_id: Some(Uuid::new_v4().to_string()),
            day_of_week: Some(day_of_week),
            name: default_day_name(day_of_week, I::KIND, locale),
            order: Some(order),
            items: Vec::new(),
            name_manually_edited: Some(false),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.day_of_week.is_some() && !self.name.trim().is_empty() && self.order.is_some()
    }

    pub fn name_is_manual(&self) -> bool {
        self.name_manually_edited.unwrap_or(false)
    }

    pub fn add_item(&mut self, input: ItemInput<I::Record, I::Custom>) -> &I {
        let mut item = I::from_input(input);
        item.set_order(self.items.len() as u32 + 1);
        self.items.push(item);
        &self.items[self.items.len() - 1]
    }

    pub fn edit_item(
        &mut self,
        index: usize,
        input: ItemInput<I::Record, I::Custom>,
    ) -> Result<&I, PlanError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(PlanError::ItemOutOfRange(index))?;
        item.apply_edit(input);
        Ok(item)
    }

    pub fn remove_item(&mut self, index: usize) -> Result<I, PlanError> {
        if index >= self.items.len() {
            return Err(PlanError::ItemOutOfRange(index));
        }
        let removed = self.items.remove(index);
        self.renumber_items();
        Ok(removed)
    }

    /// Swaps with the neighbour; at either end the list is left as is.
    pub fn move_item(&mut self, index: usize, direction: Direction) -> Result<(), PlanError> {
        if index >= self.items.len() {
            return Err(PlanError::ItemOutOfRange(index));
        }
        match direction {
            Direction::Up if index > 0 => self.items.swap(index, index - 1),
            Direction::Down if index + 1 < self.items.len() => self.items.swap(index, index + 1),
            _ => {}
        }
        self.renumber_items();
        Ok(())
    }

    pub fn renumber_items(&mut self) {
        for (i, item) in self.items.iter_mut().enumerate() {
            item.set_order(i as u32 + 1);
        }
    }

    /// Fills in the manual-name flag for days that arrived without one.
    fn settle_name_flag(&mut self) {
        if self.name_manually_edited.is_some() {
            return;
        }
        let name = self.name.trim();
        let generated = match self.day_of_week {
            Some(day) => Locale::ALL
                .iter()
                .any(|l| default_day_name(day, I::KIND, *l) == name),
            None => false,
        };
        self.name_manually_edited = Some(!name.is_empty() && !generated);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan<I> {
    #[serde(
        default,
        alias = "_id",
        alias = "mysqlId",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "Vec::new")]
    pub days: Vec<Day<I>>,
    #[serde(default = "OffsetDateTime::now_utc", with = "time::serde::rfc3339")]
    pub date_created: OffsetDateTime,
}

impl<I: PlanItem> Plan<I> {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            is_active: false,
            days: Vec::new(),
            date_created: OffsetDateTime::now_utc(),
        }
    }

    /// Appends a day on the first weekday no other day uses yet.
    pub fn add_day(&mut self, locale: Locale) -> &Day<I> {
        let day_of_week = DayOfWeek::WEEK
            .iter()
            .copied()
            .find(|d| !self.days.iter().any(|existing| existing.day_of_week == Some(*d)))
            .unwrap_or(DayOfWeek::Other);
        let day = Day::new(day_of_week, self.days.len() as u32 + 1, locale);
        self.days.push(day);
        &self.days[self.days.len() - 1]
    }

    pub fn remove_day(&mut self, index: usize) -> Result<Day<I>, PlanError> {
        if index >= self.days.len() {
            return Err(PlanError::DayOutOfRange(index));
        }
        let removed = self.days.remove(index);
        self.renumber_days();
        Ok(removed)
    }

    pub fn update_day(
        &mut self,
        index: usize,
        update: DayUpdate,
        locale: Locale,
    ) -> Result<&Day<I>, PlanError> {
        let day = self
            .days
            .get_mut(index)
            .ok_or(PlanError::DayOutOfRange(index))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name != day.name {
                day.name_manually_edited = Some(!name.is_empty());
                day.name = name;
            }
        }

        if let Some(new_day) = update.day_of_week {
            if day.day_of_week != Some(new_day) {
                day.day_of_week = Some(new_day);
                if !day.name_is_manual() || day.name.trim().is_empty() {
                    day.name = default_day_name(new_day, I::KIND, locale);
                    day.name_manually_edited = Some(false);
                }
            }
        }

        Ok(day)
    }

    pub fn day_mut(&mut self, index: usize) -> Result<&mut Day<I>, PlanError> {
        self.days
            .get_mut(index)
            .ok_or(PlanError::DayOutOfRange(index))
    }

    pub fn renumber_days(&mut self) {
        for (i, day) in self.days.iter_mut().enumerate() {
            day.order = Some(i as u32 + 1);
        }
    }

    /// Puts a submitted or imported document into canonical shape: days and
    /// items sorted by their stated order and renumbered densely. Days without
    /// an order are left untouched so `validate` can reject them.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        if self.days.iter().all(|d| d.order.is_some()) {
            self.days.sort_by_key(|d| d.order);
            self.renumber_days();
        }
        for day in &mut self.days {
            day.name = day.name.trim().to_string();
            day.items.sort_by_key(|item| match item.order() {
                0 => u32::MAX,
                n => n,
            });
            day.renumber_items();
            day.settle_name_flag();
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::IncompletePlan);
        }
        for (d, day) in self.days.iter().enumerate() {
            if !day.is_complete() {
                return Err(PlanError::IncompleteDay { day: d + 1 });
            }
            if let Some(i) = day.items.iter().position(|item| !item.is_complete()) {
                return Err(PlanError::IncompleteItem {
                    day: d + 1,
                    item: i + 1,
                });
            }
        }
        Ok(())
    }

    pub fn strip_temporary_ids(&mut self) {
        for day in &mut self.days {
            day.temp_id = None;
        }
    }
}
