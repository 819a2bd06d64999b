use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, recurrence::frequency::UnknownVariant};

/// Where a recurring rule is in its lifecycle.
///
/// Rules start out [RuleStatus::Active]. [RuleStatus::Completed] and
/// [RuleStatus::Cancelled] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// The rule produces transactions.
    Active,
    /// The rule is on hold and may be resumed.
    Paused,
    /// The rule ran out of occurrences, either by its end date or its execution cap.
    Completed,
    /// The user stopped the rule for good.
    Cancelled,
}

/// A user or system request to move a rule to another [RuleStatus].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusAction {
    /// Put an active rule on hold.
    Pause,
    /// Reactivate a paused rule.
    Resume,
    /// Stop an active or paused rule permanently.
    Cancel,
    /// Mark an active rule as having no further occurrences.
    Complete,
}

impl RuleStatus {
    /// All statuses in display order.
    pub const ALL: [RuleStatus; 4] = [
        RuleStatus::Active,
        RuleStatus::Paused,
        RuleStatus::Completed,
        RuleStatus::Cancelled,
    ];

    /// The identifier used for storage and form values.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleStatus::Active => "active",
            RuleStatus::Paused => "paused",
            RuleStatus::Completed => "completed",
            RuleStatus::Cancelled => "cancelled",
        }
    }

    /// The name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            RuleStatus::Active => "Active",
            RuleStatus::Paused => "Paused",
            RuleStatus::Completed => "Completed",
            RuleStatus::Cancelled => "Cancelled",
        }
    }

    /// Whether no transition leaves this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, RuleStatus::Completed | RuleStatus::Cancelled)
    }

    /// The status reached by applying `action` to `self`.
    ///
    /// # Errors
    /// Returns [Error::InvalidStatusTransition] if `action` is not allowed
    /// from the current status.
    pub fn apply(self, action: StatusAction) -> Result<RuleStatus, Error> {
        match (self, action) {
            (RuleStatus::Active, StatusAction::Pause) => Ok(RuleStatus::Paused),
            (RuleStatus::Active, StatusAction::Complete) => Ok(RuleStatus::Completed),
            (RuleStatus::Active | RuleStatus::Paused, StatusAction::Cancel) => {
                Ok(RuleStatus::Cancelled)
            }
            (RuleStatus::Paused, StatusAction::Resume) => Ok(RuleStatus::Active),
            (from, action) => Err(Error::InvalidStatusTransition { from, action }),
        }
    }

    /// The actions a user may take from this status, used to render buttons.
    pub fn user_actions(self) -> &'static [StatusAction] {
        match self {
            RuleStatus::Active => &[StatusAction::Pause, StatusAction::Cancel],
            RuleStatus::Paused => &[StatusAction::Resume, StatusAction::Cancel],
            RuleStatus::Completed | RuleStatus::Cancelled => &[],
        }
    }
}

impl StatusAction {
    /// The identifier used for form values.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusAction::Pause => "pause",
            StatusAction::Resume => "resume",
            StatusAction::Cancel => "cancel",
            StatusAction::Complete => "complete",
        }
    }

    /// The button label shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            StatusAction::Pause => "Pause",
            StatusAction::Resume => "Resume",
            StatusAction::Cancel => "Cancel",
            StatusAction::Complete => "Complete",
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned(), "rule status"))
    }
}
