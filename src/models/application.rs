use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Unset,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enter(ApplicationStatus),
    Stay,
}

impl ApplicationStatus {
    /// Decides what setting `target` on an application in this status means.
    /// Re-setting the current status is a no-op; accepted and rejected are
    /// terminal.
    pub fn transition(self, target: ApplicationStatus) -> Result<Transition, &'static str> {
        if self == target {
            return Ok(Transition::Stay);
        }
        match self {
            ApplicationStatus::Unset => match target {
                ApplicationStatus::Accepted | ApplicationStatus::Rejected => Ok(Transition::Enter(target)),
                ApplicationStatus::Unset => Ok(Transition::Stay),
            },
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => {
                Err("The status for this application has already been updated and cannot be changed again.")
            }
        }
    }

    pub fn notification_message(&self, job_title: &str) -> Option<String> {
        match self {
            ApplicationStatus::Accepted => Some(format!("Your application for {} has been accepted.", job_title)),
            ApplicationStatus::Rejected => Some(format!("Your application for {} has been rejected.", job_title)),
            ApplicationStatus::Unset => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unset_enters_terminal_status() {
        assert_eq!(
            ApplicationStatus::Unset.transition(ApplicationStatus::Accepted),
            Ok(Transition::Enter(ApplicationStatus::Accepted))
        );
        assert_eq!(
            ApplicationStatus::Unset.transition(ApplicationStatus::Rejected),
            Ok(Transition::Enter(ApplicationStatus::Rejected))
        );
    }

    #[test]
    fn test_resetting_same_status_is_noop() {
        assert_eq!(
            ApplicationStatus::Accepted.transition(ApplicationStatus::Accepted),
            Ok(Transition::Stay)
        );
        assert_eq!(
            ApplicationStatus::Rejected.transition(ApplicationStatus::Rejected),
            Ok(Transition::Stay)
        );
        assert_eq!(ApplicationStatus::Unset.transition(ApplicationStatus::Unset), Ok(Transition::Stay));
    }

    #[test]
    fn test_terminal_status_cannot_change() {
        assert!(ApplicationStatus::Accepted.transition(ApplicationStatus::Rejected).is_err());
        assert!(ApplicationStatus::Rejected.transition(ApplicationStatus::Accepted).is_err());
        assert!(ApplicationStatus::Accepted.transition(ApplicationStatus::Unset).is_err());
    }

    #[test]
    fn test_notification_text_is_status_specific() {
        assert_eq!(
            ApplicationStatus::Accepted.notification_message("Backend Engineer").as_deref(),
            Some("Your application for Backend Engineer has been accepted.")
        );
        assert_eq!(
            ApplicationStatus::Rejected.notification_message("Backend Engineer").as_deref(),
            Some("Your application for Backend Engineer has been rejected.")
        );
        assert_eq!(ApplicationStatus::Unset.notification_message("Backend Engineer"), None);
    }
}
