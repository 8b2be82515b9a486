use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::error::AvailabilityError;
use crate::models::{Schedule, Visit};
use crate::services::rules::{covers, overlaps};

const TIME_FORMAT: &str = "%H:%M:%S";

/// Time predicate a query applies to committed intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Any,
    /// `existing.start < end AND existing.end > start`
    Overlapping { start: NaiveTime, end: NaiveTime },
    /// `existing.start <= start AND existing.end >= end`
    Covering { start: NaiveTime, end: NaiveTime },
}

impl TimeRange {
    fn matches(&self, start: NaiveTime, end: NaiveTime) -> bool {
        match *self {
            TimeRange::Any => true,
            TimeRange::Overlapping { start: s, end: e } => overlaps(start, end, s, e),
            TimeRange::Covering { start: s, end: e } => covers(start, end, s, e),
        }
    }

    fn push_filters(&self, filters: &mut Vec<String>) {
        match *self {
            TimeRange::Any => {}
            TimeRange::Overlapping { start, end } => {
                filters.push(format!("start_time=lt.{}", end.format(TIME_FORMAT)));
                filters.push(format!("end_time=gt.{}", start.format(TIME_FORMAT)));
            }
            TimeRange::Covering { start, end } => {
                filters.push(format!("start_time=lte.{}", start.format(TIME_FORMAT)));
                filters.push(format!("end_time=gte.{}", end.format(TIME_FORMAT)));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub doctor_id: Uuid,
    pub day_of_week: i16,
    pub range: TimeRange,
    pub exclude_id: Option<Uuid>,
}

impl ScheduleQuery {
    pub fn for_day(doctor_id: Uuid, day_of_week: i16) -> Self {
        Self { doctor_id, day_of_week, range: TimeRange::Any, exclude_id: None }
    }

    pub fn in_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    pub fn matches(&self, schedule: &Schedule) -> bool {
        schedule.doctor_id == self.doctor_id
            && schedule.day_of_week == self.day_of_week
            && self.exclude_id != Some(schedule.id)
            && self.range.matches(schedule.start_time, schedule.end_time)
    }

    /// PostgREST query string for the `schedules` table.
    pub fn to_filters(&self) -> String {
        let mut filters = vec![
            format!("doctor_id=eq.{}", self.doctor_id),
            format!("day_of_week=eq.{}", self.day_of_week),
        ];
        self.range.push_filters(&mut filters);
        if let Some(id) = self.exclude_id {
            filters.push(format!("id=neq.{}", id));
        }
        filters.push("order=start_time.asc".to_string());
        filters.join("&")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub range: TimeRange,
    pub exclude_id: Option<Uuid>,
}

impl VisitQuery {
    pub fn for_date(doctor_id: Uuid, date: NaiveDate) -> Self {
        Self { doctor_id, date, range: TimeRange::Any, exclude_id: None }
    }

    pub fn in_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn excluding(mut self, id: Option<Uuid>) -> Self {
        self.exclude_id = id;
        self
    }

    pub fn matches(&self, visit: &Visit) -> bool {
        visit.doctor_id == self.doctor_id
            && visit.date == self.date
            && self.exclude_id != Some(visit.id)
            && self.range.matches(visit.start_time, visit.end_time)
    }

    /// PostgREST query string for the `visits` table.
    pub fn to_filters(&self) -> String {
        let mut filters = vec![
            format!("doctor_id=eq.{}", self.doctor_id),
            format!("date=eq.{}", self.date.format("%Y-%m-%d")),
        ];
        self.range.push_filters(&mut filters);
        if let Some(id) = self.exclude_id {
            filters.push(format!("id=neq.{}", id));
        }
        filters.push("order=start_time.asc".to_string());
        filters.join("&")
    }
}

/// Read access to committed schedules and visits. Implementations may return
/// extra rows but never fewer than the query matches.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find_schedules(&self, query: &ScheduleQuery) -> Result<Vec<Schedule>, AvailabilityError>;

    async fn find_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, AvailabilityError>;
}

pub struct SupabaseAvailabilityStore {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseAvailabilityStore {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: impl Into<String>) -> Self {
        Self { supabase, auth_token: auth_token.into() }
    }
}

#[async_trait]
impl AvailabilityStore for SupabaseAvailabilityStore {
    async fn find_schedules(&self, query: &ScheduleQuery) -> Result<Vec<Schedule>, AvailabilityError> {
        let filters = query.to_filters();
        debug!("Fetching schedules: {}", filters);

        self.supabase
            .select::<Schedule>("schedules", &filters, &self.auth_token)
            .await
            .map_err(|e| {
                error!("Failed to fetch schedules: {}", e);
                AvailabilityError::Store(e.to_string())
            })
    }

    async fn find_visits(&self, query: &VisitQuery) -> Result<Vec<Visit>, AvailabilityError> {
        let filters = query.to_filters();
        debug!("Fetching visits: {}", filters);

        self.supabase
            .select::<Visit>("visits", &filters, &self.auth_token)
            .await
            .map_err(|e| {
                error!("Failed to fetch visits: {}", e);
                AvailabilityError::Store(e.to_string())
            })
    }
}
