use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

/// Company names are free-form text entered by managers; every comparison in
/// the system goes through this normalization so that "Acme " and "acme"
/// scope to the same company.
pub fn company_key(name: Option<&str>) -> String {
    name.unwrap_or("").trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = "7b0c9f2e-4a1d-4a2f-9c2b-1f6f2a9d0e11")]
    pub id: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe")]
    pub username: String,
    /// Plaintext credential field compared verbatim at login; this mirrors the
    /// source system and is not a security model.
    #[serde(default, skip_serializing)]
    pub password: String,
    pub role: Role,
    #[schema(example = "Barista", nullable = true)]
    pub job_title: Option<String>,
    #[schema(example = "EMP-031", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "Acme Coffee", nullable = true)]
    pub company_name: Option<String>,
    #[schema(example = "John Smith", nullable = true)]
    pub manager_name: Option<String>,
}

impl User {
    pub fn company_key(&self) -> String {
        company_key(self.company_name.as_deref())
    }

    pub fn same_company(&self, other: &User) -> bool {
        self.company_key() == other.company_key()
    }

    /// Whether this user may manage (edit schedules of, adjudicate requests
    /// involving) the given user. Supervisors cross company boundaries;
    /// managers stay inside their own.
    pub fn manages(&self, other: &User) -> bool {
        match self.role {
            Role::Supervisor => true,
            Role::Manager => self.same_company(other),
            Role::Employee => false,
        }
    }

    pub fn may_view_schedule_of(&self, other: &User) -> bool {
        self.id == other.id || self.manages(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, company: Option<&str>) -> User {
        User {
            id: "u1".into(),
            name: "Test".into(),
            username: "test".into(),
            password: String::new(),
            role,
            job_title: None,
            employee_code: None,
            company_name: company.map(str::to_string),
            manager_name: None,
        }
    }

    #[test]
    fn company_key_normalizes_case_and_whitespace() {
        assert_eq!(company_key(Some("  Acme Coffee ")), "acme coffee");
        assert_eq!(company_key(Some("ACME COFFEE")), "acme coffee");
        assert_eq!(company_key(None), "");
    }

    #[test]
    fn manager_scope_is_company_bound_supervisor_is_not() {
        let manager = user(Role::Manager, Some("Acme"));
        let same = user(Role::Employee, Some(" acme "));
        let other = user(Role::Employee, Some("Globex"));
        let supervisor = user(Role::Supervisor, Some("Globex"));

        assert!(manager.manages(&same));
        assert!(!manager.manages(&other));
        assert!(supervisor.manages(&same));
        assert!(supervisor.manages(&other));
        assert!(!same.manages(&other));
    }
}
