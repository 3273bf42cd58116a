//! In-memory task store
//!
//! Used by tests and by callers that embed the tools without a project on
//! disk. Each instance has its own ID counter.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::store::{newest_first, search_tier, StoreError, TaskStore, DEFAULT_SEARCH_LIMIT};
use crate::domain::{Category, NewTask, Task, TaskId, TaskPatch};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,

    /// Highest ID ever handed out; deleted IDs are not reused
    last_id: u64,

    search_limit: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            last_id: 0,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for MemoryStore {
    fn get(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn list(&self, category: Option<Category>) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| category.is_none() || t.category == category)
            .cloned()
            .collect();
        tasks.sort_by(newest_first);
        Ok(tasks)
    }

    fn search(&self, query: &str) -> Result<Vec<Task>, StoreError> {
        let query = query.trim().to_lowercase();

        let mut hits: Vec<(u8, &Task)> = self
            .tasks
            .values()
            .filter_map(|t| search_tier(t, &query).map(|tier| (tier, t)))
            .collect();
        hits.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| newest_first(a, b)));

        Ok(hits
            .into_iter()
            .take(self.search_limit)
            .map(|(_, t)| t.clone())
            .collect())
    }

    fn create(&mut self, new: NewTask, created_at: DateTime<Utc>) -> Result<Task, StoreError> {
        let next = self.last_id + 1;
        let id = TaskId::new(next).ok_or(StoreError::Corrupt {
            id: 0,
            reason: "task ID counter overflowed".to_string(),
        })?;
        self.last_id = next;

        let task = Task::from_new(id, new, created_at);
        self.tasks.insert(id, task.clone());
        Ok(task)
    }

    fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get_mut(&id).map(|task| {
            task.apply(patch);
            task.clone()
        }))
    }

    fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        Ok(self.tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create(NewTask::new("Buy milk").with_category(Category::Shopping), at(0)).unwrap();
        store.create(NewTask::new("Call mom").with_category(Category::Personal), at(1)).unwrap();
        store.create(NewTask::new("Milk the cows"), at(2)).unwrap();
        store
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let store = seeded();
        let mut ids: Vec<u64> = store.list(None).unwrap().iter().map(|t| t.id.get()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn deleted_ids_not_reused() {
        let mut store = seeded();
        assert!(store.delete(TaskId::new(3).unwrap()).unwrap());
        let task = store.create(NewTask::new("New"), at(5)).unwrap();
        assert_eq!(task.id.get(), 4);
    }

    #[test]
    fn stores_are_independent() {
        let mut a = MemoryStore::new();
        let mut b = MemoryStore::new();
        a.create(NewTask::new("a"), at(0)).unwrap();
        let first_b = b.create(NewTask::new("b"), at(0)).unwrap();
        assert_eq!(first_b.id.get(), 1);
    }

    #[test]
    fn list_newest_first_and_by_category() {
        let store = seeded();
        let titles: Vec<String> = store.list(None).unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Milk the cows", "Call mom", "Buy milk"]);

        let shopping = store.list(Some(Category::Shopping)).unwrap();
        assert_eq!(shopping.len(), 1);
        assert_eq!(shopping[0].title, "Buy milk");
    }

    #[test]
    fn search_ranks_prefix_before_substring() {
        let store = seeded();
        let titles: Vec<String> = store.search("MILK").unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Milk the cows", "Buy milk"]);
    }

    #[test]
    fn search_exact_title_first() {
        let mut store = seeded();
        store.create(NewTask::new("Buy milk and eggs"), at(10)).unwrap();
        let hits = store.search("buy milk").unwrap();
        assert_eq!(hits[0].title, "Buy milk");
        assert_eq!(hits[1].title, "Buy milk and eggs");
    }

    #[test]
    fn search_matches_category_name() {
        let store = seeded();
        let hits = store.search("personal").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Call mom");
    }

    #[test]
    fn search_limit_applies() {
        let mut store = MemoryStore::new().with_search_limit(2);
        for i in 0..5 {
            store.create(NewTask::new(format!("task {i}")), at(i)).unwrap();
        }
        assert_eq!(store.search("task").unwrap().len(), 2);
    }

    #[test]
    fn update_is_partial() {
        let mut store = seeded();
        let id = TaskId::new(1).unwrap();
        let patch = TaskPatch {
            priority: Some(Priority::High),
            ..TaskPatch::default()
        };

        let updated = store.update(id, &patch).unwrap().unwrap();
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.category, Some(Category::Shopping));
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(store.get(id).unwrap(), Some(updated));
    }

    #[test]
    fn update_and_delete_missing() {
        let mut store = seeded();
        let missing = TaskId::new(99).unwrap();
        assert!(store.update(missing, &TaskPatch::default()).unwrap().is_none());
        assert!(!store.delete(missing).unwrap());
        assert_eq!(store.len(), 3);
    }
}
