use serde::{Deserialize, Serialize};

/// Entry of the recipients directory (employees that can be surveyed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    /// Normalised phone number, digits only. `None` when not contactable.
    pub phone: Option<String>,
    pub department: Option<String>,
    pub active: bool,
}

impl Recipient {
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}
