use chrono::{DateTime, Utc};

use crate::types::{Priority, Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
    /// Pending tasks whose due date is strictly in the past.
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Low,
    Medium,
    High,
}

impl PriorityFilter {
    fn target(self) -> Option<Priority> {
        match self {
            PriorityFilter::All => None,
            PriorityFilter::Low => Some(Priority::Low),
            PriorityFilter::Medium => Some(Priority::Medium),
            PriorityFilter::High => Some(Priority::High),
        }
    }
}

type Predicate = Box<dyn Fn(&Task) -> bool + Send + Sync>;

/// Active dashboard filters, compiled into a predicate list and applied as a
/// logical AND. An empty list keeps every task.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub search: String,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.status == StatusFilter::All
            && self.priority == PriorityFilter::All
    }

    /// `now` comes from the caller so Overdue is judged at filter time and
    /// never baked into stored state.
    fn predicates(&self, now: DateTime<Utc>) -> Vec<Predicate> {
        let mut predicates: Vec<Predicate> = Vec::new();

        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            predicates.push(Box::new(move |task: &Task| {
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }));
        }

        match self.status {
            StatusFilter::All => {}
            StatusFilter::Pending => {
                predicates.push(Box::new(|task: &Task| task.status == TaskStatus::Pending));
            }
            StatusFilter::Completed => {
                predicates.push(Box::new(|task: &Task| task.status == TaskStatus::Completed));
            }
            StatusFilter::Overdue => {
                predicates.push(Box::new(move |task: &Task| {
                    task.status == TaskStatus::Pending && task.due_date < now
                }));
            }
        }

        if let Some(priority) = self.priority.target() {
            predicates.push(Box::new(move |task: &Task| task.priority == priority));
        }

        predicates
    }

    pub fn apply(&self, tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
        let predicates = self.predicates(now);
        tasks
            .iter()
            .filter(|task| predicates.iter().all(|p| p(task)))
            .cloned()
            .collect()
    }
}
