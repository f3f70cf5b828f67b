//! Observable events
//!
//! Events are explicit and typed. Only the command layer emits them; the
//! schema engine itself is silent.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Schemas registered (built-in and on-disk)
    SchemasLoaded,
    /// Schema directory could not be loaded
    SchemaLoadFailed,
    /// Write passed defaults and validation
    ContractAccepted,
    /// Write rejected with violations
    ContractRejected,
    /// Slug source unusable; fallback slug applied
    SlugFallback,
    /// Schema exported
    SchemaExported,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaLoadFailed => "SCHEMA_LOAD_FAILED",
            Event::ContractAccepted => "CONTRACT_ACCEPTED",
            Event::ContractRejected => "CONTRACT_REJECTED",
            Event::SlugFallback => "SLUG_FALLBACK",
            Event::SchemaExported => "SCHEMA_EXPORTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaLoadFailed => Severity::Fatal,
            Event::ContractRejected | Event::SlugFallback => Severity::Warn,
            _ => Severity::Info,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::SchemasLoaded,
            Event::SchemaLoadFailed,
            Event::ContractAccepted,
            Event::ContractRejected,
            Event::SlugFallback,
            Event::SchemaExported,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_severities() {
        assert!(Event::SchemaLoadFailed.is_fatal());
        assert_eq!(Event::ContractRejected.severity(), Severity::Warn);
        assert_eq!(Event::ContractAccepted.severity(), Severity::Info);
    }
}
