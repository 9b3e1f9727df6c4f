//! Business data the assistant can see: quotes, customers, schedule, projects.
//!
//! The assistant only ever reads this through [`SnapshotSource`], once per
//! turn, at prompt-build time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub customer_name: String,
    pub project_type: String,
    pub status: QuoteStatus,
    pub amount: u64,
    pub date: String,
    pub description: String,
    pub location: String,
    pub materials: Vec<String>,
    pub labor_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
    Prospect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub projects: u32,
    pub total_spent: u64,
    pub last_contact: String,
    pub status: CustomerStatus,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentType {
    Consultation,
    Installation,
    Maintenance,
    Estimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub id: String,
    pub title: String,
    pub customer: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    pub location: String,
    /// Minutes
    pub duration: u32,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Completed,
    OnHold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub customer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ProjectStatus,
    pub start_date: String,
    pub end_date: String,
    pub budget: u64,
    pub spent: u64,
    pub materials: Vec<String>,
    pub crew: Vec<String>,
}

/// Counts derived from the collections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_quotes: usize,
    pub pending_quotes: usize,
    pub approved_quotes: usize,
    pub total_customers: usize,
    pub active_customers: usize,
    pub prospect_customers: usize,
    pub upcoming_appointments: usize,
    pub active_projects: usize,
    /// Sum of completed quotes
    pub total_revenue: u64,
    /// Sum of approved quotes
    pub pending_revenue: u64,
}

impl Summary {
    pub fn derive(
        quotes: &[Quote],
        customers: &[Customer],
        schedule: &[ScheduleItem],
        projects: &[Project],
    ) -> Self {
        Self {
            total_quotes: quotes.len(),
            pending_quotes: quotes
                .iter()
                .filter(|q| q.status == QuoteStatus::Pending)
                .count(),
            approved_quotes: quotes
                .iter()
                .filter(|q| q.status == QuoteStatus::Approved)
                .count(),
            total_customers: customers.len(),
            active_customers: customers
                .iter()
                .filter(|c| c.status == CustomerStatus::Active)
                .count(),
            prospect_customers: customers
                .iter()
                .filter(|c| c.status == CustomerStatus::Prospect)
                .count(),
            upcoming_appointments: schedule
                .iter()
                .filter(|s| s.status == AppointmentStatus::Scheduled)
                .count(),
            active_projects: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::InProgress)
                .count(),
            total_revenue: quotes
                .iter()
                .filter(|q| q.status == QuoteStatus::Completed)
                .map(|q| q.amount)
                .sum(),
            pending_revenue: quotes
                .iter()
                .filter(|q| q.status == QuoteStatus::Approved)
                .map(|q| q.amount)
                .sum(),
        }
    }
}

/// Everything the assistant is told about the business for one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessDataSnapshot {
    pub quotes: Vec<Quote>,
    pub customers: Vec<Customer>,
    pub schedule: Vec<ScheduleItem>,
    pub projects: Vec<Project>,
    pub summary: Summary,
}

impl BusinessDataSnapshot {
    /// Build a snapshot, deriving the summary from the collections
    pub fn new(
        quotes: Vec<Quote>,
        customers: Vec<Customer>,
        schedule: Vec<ScheduleItem>,
        projects: Vec<Project>,
    ) -> Self {
        let summary = Summary::derive(&quotes, &customers, &schedule, &projects);

        Self {
            quotes,
            customers,
            schedule,
            projects,
            summary,
        }
    }

    /// Recompute the summary after the collections changed
    pub fn refresh_summary(&mut self) {
        self.summary = Summary::derive(
            &self.quotes,
            &self.customers,
            &self.schedule,
            &self.projects,
        );
    }

    /// Indented JSON rendering used inside prompts
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether any entity carries this id
    pub fn contains_id(&self, id: &str) -> bool {
        self.quotes.iter().any(|q| q.id == id)
            || self.customers.iter().any(|c| c.id == id)
            || self.schedule.iter().any(|s| s.id == id)
            || self.projects.iter().any(|p| p.id == id)
    }

    /// Sample data for a fresh install
    pub fn placeholder() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        let quotes = vec![
            Quote {
                id: "Q001".to_string(),
                customer_name: "John Smith".to_string(),
                project_type: "Residential Fence".to_string(),
                status: QuoteStatus::Pending,
                amount: 3500,
                date: "2024-01-15".to_string(),
                description: "150ft wooden privacy fence with gate".to_string(),
                location: "123 Oak Street, Springfield".to_string(),
                materials: strings(&["Cedar posts", "Privacy panels", "Gate hardware"]),
                labor_hours: 24,
            },
            Quote {
                id: "Q002".to_string(),
                customer_name: "Sarah Johnson".to_string(),
                project_type: "Commercial Fencing".to_string(),
                status: QuoteStatus::Approved,
                amount: 8900,
                date: "2024-01-18".to_string(),
                description: "Chain link fence around parking lot".to_string(),
                location: "456 Business Ave, Springfield".to_string(),
                materials: strings(&["Chain link", "Steel posts", "Barbed wire"]),
                labor_hours: 40,
            },
            Quote {
                id: "Q003".to_string(),
                customer_name: "Mike Davis".to_string(),
                project_type: "Pool Fence".to_string(),
                status: QuoteStatus::Completed,
                amount: 2100,
                date: "2024-01-10".to_string(),
                description: "Safety fence around swimming pool".to_string(),
                location: "789 Pool Lane, Springfield".to_string(),
                materials: strings(&["Aluminum panels", "Self-closing gate", "Safety latches"]),
                labor_hours: 16,
            },
        ];

        let customers = vec![
            Customer {
                id: "C001".to_string(),
                name: "John Smith".to_string(),
                email: "john.smith@email.com".to_string(),
                phone: "(555) 123-4567".to_string(),
                address: "123 Oak Street, Springfield".to_string(),
                projects: 2,
                total_spent: 5600,
                last_contact: "2024-01-15".to_string(),
                status: CustomerStatus::Active,
                notes: "Prefers wooden fencing, very detail-oriented".to_string(),
            },
            Customer {
                id: "C002".to_string(),
                name: "Sarah Johnson".to_string(),
                email: "sarah.j@business.com".to_string(),
                phone: "(555) 987-6543".to_string(),
                address: "456 Business Ave, Springfield".to_string(),
                projects: 1,
                total_spent: 8900,
                last_contact: "2024-01-18".to_string(),
                status: CustomerStatus::Active,
                notes: "Commercial client, needs invoicing to accounting dept".to_string(),
            },
            Customer {
                id: "C003".to_string(),
                name: "Mike Davis".to_string(),
                email: "mike.davis@email.com".to_string(),
                phone: "(555) 456-7890".to_string(),
                address: "789 Pool Lane, Springfield".to_string(),
                projects: 1,
                total_spent: 2100,
                last_contact: "2024-01-10".to_string(),
                status: CustomerStatus::Active,
                notes: "Quick decision maker, referred by neighbor".to_string(),
            },
            Customer {
                id: "C004".to_string(),
                name: "Lisa Wilson".to_string(),
                email: "lisa.wilson@email.com".to_string(),
                phone: "(555) 321-0987".to_string(),
                address: "321 Garden St, Springfield".to_string(),
                projects: 0,
                total_spent: 0,
                last_contact: "2024-01-20".to_string(),
                status: CustomerStatus::Prospect,
                notes: "Interested in decorative fencing, budget conscious".to_string(),
            },
        ];

        let schedule = vec![
            ScheduleItem {
                id: "S001".to_string(),
                title: "Initial Consultation - John Smith".to_string(),
                customer: "John Smith".to_string(),
                date: "2024-01-25".to_string(),
                time: "09:00".to_string(),
                kind: AppointmentType::Consultation,
                status: AppointmentStatus::Scheduled,
                location: "123 Oak Street, Springfield".to_string(),
                duration: 60,
                notes: "Discuss privacy fence options and pricing".to_string(),
            },
            ScheduleItem {
                id: "S002".to_string(),
                title: "Fence Installation - Sarah Johnson".to_string(),
                customer: "Sarah Johnson".to_string(),
                date: "2024-01-26".to_string(),
                time: "08:00".to_string(),
                kind: AppointmentType::Installation,
                status: AppointmentStatus::Scheduled,
                location: "456 Business Ave, Springfield".to_string(),
                duration: 480,
                notes: "Full day installation, bring full crew".to_string(),
            },
            ScheduleItem {
                id: "S003".to_string(),
                title: "Maintenance Check - Mike Davis".to_string(),
                customer: "Mike Davis".to_string(),
                date: "2024-01-24".to_string(),
                time: "14:00".to_string(),
                kind: AppointmentType::Maintenance,
                status: AppointmentStatus::Completed,
                location: "789 Pool Lane, Springfield".to_string(),
                duration: 30,
                notes: "Annual safety inspection completed".to_string(),
            },
        ];

        let projects = vec![
            Project {
                id: "P001".to_string(),
                name: "Smith Residential Fence".to_string(),
                customer: "John Smith".to_string(),
                kind: "Residential".to_string(),
                status: ProjectStatus::InProgress,
                start_date: "2024-01-20".to_string(),
                end_date: "2024-01-25".to_string(),
                budget: 3500,
                spent: 1200,
                materials: strings(&["Cedar posts", "Privacy panels", "Gate hardware"]),
                crew: strings(&["Tom Wilson", "Jake Brown"]),
            },
            Project {
                id: "P002".to_string(),
                name: "Johnson Commercial Fencing".to_string(),
                customer: "Sarah Johnson".to_string(),
                kind: "Commercial".to_string(),
                status: ProjectStatus::Planning,
                start_date: "2024-01-26".to_string(),
                end_date: "2024-02-02".to_string(),
                budget: 8900,
                spent: 0,
                materials: strings(&["Chain link", "Steel posts", "Barbed wire"]),
                crew: strings(&["Tom Wilson", "Jake Brown", "Mike Rodriguez"]),
            },
        ];

        Self::new(quotes, customers, schedule, projects)
    }
}

/// Something that can hand the assistant the current business data
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> BusinessDataSnapshot;
}

impl SnapshotSource for BusinessDataSnapshot {
    fn snapshot(&self) -> BusinessDataSnapshot {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_summary_matches_collections() {
        let data = BusinessDataSnapshot::placeholder();
        let s = &data.summary;
        assert_eq!(s.total_quotes, 3);
        assert_eq!(s.pending_quotes, 1);
        assert_eq!(s.approved_quotes, 1);
        assert_eq!(s.total_customers, 4);
        assert_eq!(s.active_customers, 3);
        assert_eq!(s.prospect_customers, 1);
        assert_eq!(s.upcoming_appointments, 2);
        assert_eq!(s.active_projects, 1);
        assert_eq!(s.total_revenue, 2100);
        assert_eq!(s.pending_revenue, 8900);
    }

    #[test]
    fn test_pretty_rendering_uses_wire_field_names() {
        let rendered = BusinessDataSnapshot::placeholder().to_pretty_string();
        assert!(rendered.contains("\"customerName\": \"John Smith\""));
        assert!(rendered.contains("\"status\": \"in-progress\""));
        assert!(rendered.contains("\"type\": \"installation\""));
        assert!(rendered.contains("\"pendingRevenue\": 8900"));
    }

    #[test]
    fn test_contains_id_spans_every_collection() {
        let data = BusinessDataSnapshot::placeholder();
        for id in ["Q002", "C004", "S003", "P001"] {
            assert!(data.contains_id(id), "{id} should be found");
        }
        assert!(!data.contains_id("X999"));
    }
}
