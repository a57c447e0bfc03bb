//! Employee model.

use serde::{Deserialize, Serialize};

/// The slice of an employee record the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Department name, used to look up the department's timing.
    pub department: String,
}

impl Employee {
    /// Creates a new employee record.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            department: department.into(),
        }
    }
}
