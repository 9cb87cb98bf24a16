//! Resource tag constants for face-auth stacks
//!
//! Deployed stacks carry these tags; CloudFormation propagates stack tags to
//! every taggable resource it creates.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `faceauth:tool` | Static identifier ("face-auth") |
//! | `faceauth:stack` | Stack name the resources belong to |
//! | `faceauth:created-at` | RFC 3339 creation timestamp |

/// Tag key for tool identification
pub const TAG_TOOL: &str = "faceauth:tool";

/// Tag value for tool identification
pub const TAG_TOOL_VALUE: &str = "face-auth";

/// Tag key for the owning stack name
pub const TAG_STACK: &str = "faceauth:stack";

/// Tag key for creation timestamp (RFC 3339 format)
pub const TAG_CREATED_AT: &str = "faceauth:created-at";

/// Helper to format creation timestamp for tags
pub fn format_created_at(time: chrono::DateTime<chrono::Utc>) -> String {
    time.to_rfc3339()
}

/// Standard tags for a stack, as key/value pairs
pub fn stack_tags(stack_name: &str, created_at: chrono::DateTime<chrono::Utc>) -> Vec<(String, String)> {
    vec![
        (TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string()),
        (TAG_STACK.to_string(), stack_name.to_string()),
        (TAG_CREATED_AT.to_string(), format_created_at(created_at)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_created_at_format() {
        let time = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(format_created_at(time), "2025-03-01T12:30:00+00:00");
    }

    #[test]
    fn test_stack_tags() {
        let time = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let tags = stack_tags("rfl-dev", time);
        assert_eq!(tags.len(), 3);
        assert!(tags.contains(&(TAG_STACK.to_string(), "rfl-dev".to_string())));
        assert!(tags.contains(&(TAG_TOOL.to_string(), TAG_TOOL_VALUE.to_string())));
    }
}
