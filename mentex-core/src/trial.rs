use serde::{Deserialize, Serialize};

/// Labeled mental state a participant holds during one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialClass {
    Focus,
    Relaxation,
}

/// Ordered trial assignments for a whole session. Read-only once built;
/// obtain validated instances from the schedule generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    entries: Vec<TrialClass>,
}

impl Schedule {
    pub fn new(entries: Vec<TrialClass>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn class_at(&self, index: usize) -> TrialClass {
        self.entries[index]
    }

    pub fn last_index(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = TrialClass> + '_ {
        self.entries.iter().copied()
    }

    pub fn count_of(&self, class: TrialClass) -> usize {
        self.entries.iter().filter(|&&c| c == class).count()
    }

    /// Length of the longest stretch of identical classes.
    pub fn longest_run(&self) -> usize {
        let mut longest = 0;
        let mut run = 0;
        let mut prev = None;
        for &class in &self.entries {
            run = if Some(class) == prev { run + 1 } else { 1 };
            prev = Some(class);
            longest = longest.max(run);
        }
        longest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_run_over_mixed_entries() {
        use TrialClass::*;
        let schedule = Schedule::new(vec![Focus, Focus, Relaxation, Focus, Focus, Focus]);
        assert_eq!(schedule.longest_run(), 3);
        assert_eq!(schedule.count_of(Focus), 5);
        assert_eq!(schedule.count_of(Relaxation), 1);
    }

    #[test]
    fn longest_run_of_empty_schedule_is_zero() {
        let schedule = Schedule::new(Vec::new());
        assert_eq!(schedule.longest_run(), 0);
        assert!(schedule.is_empty());
    }
}
