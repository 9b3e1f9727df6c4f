//! The editable business data behind the views.
//!
//! A [`DataStore`] is shared between the host (which adds records) and the
//! assistant (which reads a fresh snapshot every turn). Every write recomputes
//! the summary before the lock is released.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;
use tracing::info;

use crate::business::{
    AppointmentStatus, AppointmentType, BusinessDataSnapshot, Customer, CustomerStatus, Quote,
    QuoteStatus, ScheduleItem, SnapshotSource,
};

/// Fields supplied when adding a customer. The store assigns the id, marks
/// the customer active and stamps today as the last contact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuote {
    pub customer_name: String,
    pub project_type: String,
    pub status: QuoteStatus,
    pub amount: u64,
    pub description: String,
    pub location: String,
    pub materials: Vec<String>,
    pub labor_hours: u32,
}

/// An appointment to put on the schedule. It starts out scheduled.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub customer: String,
    pub date: String,
    pub time: String,
    pub kind: AppointmentType,
    pub location: String,
    /// Minutes
    pub duration: u32,
    pub notes: String,
}

#[derive(Debug, Default)]
pub struct DataStore {
    inner: RwLock<BusinessDataSnapshot>,
}

impl DataStore {
    pub fn new(data: BusinessDataSnapshot) -> Self {
        Self {
            inner: RwLock::new(data),
        }
    }

    pub fn placeholder() -> Self {
        Self::new(BusinessDataSnapshot::placeholder())
    }

    fn read(&self) -> RwLockReadGuard<'_, BusinessDataSnapshot> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BusinessDataSnapshot> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a customer and return its id
    pub fn add_customer(&self, new: NewCustomer) -> String {
        let mut data = self.write();
        let id = next_id("C", data.customers.iter().map(|c| c.id.as_str()));
        data.customers.push(Customer {
            id: id.clone(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            projects: 0,
            total_spent: 0,
            last_contact: today(),
            status: CustomerStatus::Active,
            notes: new.notes,
        });
        data.refresh_summary();
        info!(%id, "customer added");
        id
    }

    /// Put a quote at the top of the list and return its id
    pub fn add_quote(&self, new: NewQuote) -> String {
        let mut data = self.write();
        let id = next_id("Q", data.quotes.iter().map(|q| q.id.as_str()));
        data.quotes.insert(
            0,
            Quote {
                id: id.clone(),
                customer_name: new.customer_name,
                project_type: new.project_type,
                status: new.status,
                amount: new.amount,
                date: today(),
                description: new.description,
                location: new.location,
                materials: new.materials,
                labor_hours: new.labor_hours,
            },
        );
        data.refresh_summary();
        info!(%id, "quote added");
        id
    }

    pub fn schedule_job(&self, new: NewJob) -> String {
        let mut data = self.write();
        let id = next_id("S", data.schedule.iter().map(|s| s.id.as_str()));
        data.schedule.push(ScheduleItem {
            id: id.clone(),
            title: new.title,
            customer: new.customer,
            date: new.date,
            time: new.time,
            kind: new.kind,
            status: AppointmentStatus::Scheduled,
            location: new.location,
            duration: new.duration,
            notes: new.notes,
        });
        data.refresh_summary();
        info!(%id, "job scheduled");
        id
    }
}

impl SnapshotSource for DataStore {
    fn snapshot(&self) -> BusinessDataSnapshot {
        self.read().clone()
    }
}

/// One past the highest numbered id with `prefix`, e.g. `C005` after `C004`
fn next_id<'a>(prefix: &str, ids: impl Iterator<Item = &'a str>) -> String {
    let highest = ids
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:03}", prefix, highest + 1)
}

fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
