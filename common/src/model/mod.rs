pub mod campaign;
pub mod dispatch;
pub mod recipient;
pub mod response;
pub mod send;
pub mod stats;
pub mod survey;
pub mod token;

/// Error returned when a stored enum label cannot be parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown variant '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
