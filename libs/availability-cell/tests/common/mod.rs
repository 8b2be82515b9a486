#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use availability_cell::{
    AvailabilityError, AvailabilityStore, Schedule, ScheduleQuery, Visit, VisitQuery, VisitStatus,
};

/// Store that hands back every row it holds; the rules must do the filtering.
#[derive(Default)]
pub struct InMemoryStore {
    schedules: Mutex<Vec<Schedule>>,
    visits: Mutex<Vec<Visit>>,
    fail: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn add_schedule(&self, doctor_id: Uuid, day_of_week: i16, start: NaiveTime, end: NaiveTime) -> Schedule {
        let schedule = Schedule { id: Uuid::new_v4(), doctor_id, day_of_week, start_time: start, end_time: end };
        self.schedules.lock().unwrap().push(schedule.clone());
        schedule
    }

    pub fn add_visit(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Visit {
        let visit = Visit {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id,
            date,
            start_time: start,
            end_time: end,
            status: VisitStatus::Scheduled,
            description: None,
        };
        self.visits.lock().unwrap().push(visit.clone());
        visit
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryStore {
    async fn find_schedules(&self, _query: &ScheduleQuery) -> Result<Vec<Schedule>, AvailabilityError> {
        if self.fail {
            return Err(AvailabilityError::Store("store offline".to_string()));
        }
        Ok(self.schedules.lock().unwrap().clone())
    }

    async fn find_visits(&self, _query: &VisitQuery) -> Result<Vec<Visit>, AvailabilityError> {
        if self.fail {
            return Err(AvailabilityError::Store("store offline".to_string()));
        }
        Ok(self.visits.lock().unwrap().clone())
    }
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2024-01-01 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}
