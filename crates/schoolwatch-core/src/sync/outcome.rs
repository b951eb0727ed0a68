use serde::Serialize;

/// Result of one refresh call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum RefreshOutcome<R> {
    Success {
        records: Vec<R>,
        served_from_cache: bool,
    },
    Cooldown {
        minutes_remaining: i64,
    },
    Error {
        message: String,
    },
}

impl<R> RefreshOutcome<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Success { .. })
    }

    pub fn records(&self) -> Option<&[R]> {
        match self {
            RefreshOutcome::Success { records, .. } => Some(records),
            _ => None,
        }
    }

    pub fn served_from_cache(&self) -> bool {
        matches!(
            self,
            RefreshOutcome::Success {
                served_from_cache: true,
                ..
            }
        )
    }

    /// One-line banner text for the outcome
    pub fn summary(&self) -> String {
        match self {
            RefreshOutcome::Success {
                records,
                served_from_cache: true,
            } => format!("Loaded {} records from cache", records.len()),
            RefreshOutcome::Success { records, .. } => {
                format!("Synchronized {} records", records.len())
            }
            RefreshOutcome::Cooldown { minutes_remaining } => format!(
                "Sync is paused, try again in {} minute{}",
                minutes_remaining,
                if *minutes_remaining == 1 { "" } else { "s" }
            ),
            RefreshOutcome::Error { message } => format!("Failed to load data: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let fresh: RefreshOutcome<u32> = RefreshOutcome::Success {
            records: vec![1, 2, 3],
            served_from_cache: false,
        };
        assert!(fresh.is_success());
        assert!(!fresh.served_from_cache());
        assert_eq!(fresh.records(), Some(&[1, 2, 3][..]));
        assert_eq!(fresh.summary(), "Synchronized 3 records");

        let cooldown: RefreshOutcome<u32> = RefreshOutcome::Cooldown {
            minutes_remaining: 1,
        };
        assert!(!cooldown.is_success());
        assert_eq!(cooldown.records(), None);
        assert_eq!(cooldown.summary(), "Sync is paused, try again in 1 minute");
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome: RefreshOutcome<u32> = RefreshOutcome::Cooldown {
            minutes_remaining: 25,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "cooldown", "minutes_remaining": 25})
        );
    }
}
