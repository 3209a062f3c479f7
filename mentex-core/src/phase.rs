use crate::trial::TrialClass;

/// Session phases. Exactly one is current at any instant; phases only move
/// forward, ending in `Completed` or `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    InitialFixation,
    ActiveTrial { index: usize, class: TrialClass },
    InterTrialFixation { after_index: usize },
    Completed,
    Aborted,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Completed | SessionPhase::Aborted)
    }

    pub fn is_fixation(&self) -> bool {
        matches!(
            self,
            SessionPhase::InitialFixation | SessionPhase::InterTrialFixation { .. }
        )
    }

    pub fn active_class(&self) -> Option<TrialClass> {
        match self {
            SessionPhase::ActiveTrial { class, .. } => Some(*class),
            _ => None,
        }
    }
}
