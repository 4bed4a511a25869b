//! Meeting notes: append-mostly records, created and listed but never
//! edited in place by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::backlog::{parse_timestamp, rfc3339};

const SLUG_MAX_LEN: usize = 50;

/// A stored meeting note. The file key is derived: `YYYY-MM-DD-<title-slug>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub title: String,
    pub date: DateTime<Utc>,
    pub participants: Vec<String>,
    pub agenda: Vec<String>,
    pub notes: String,
    pub action_items: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a meeting note.
#[derive(Debug, Clone, Default)]
pub struct MeetingDraft {
    pub title: String,
    /// Meeting date; defaults to the creation instant.
    pub date: Option<DateTime<Utc>>,
    pub participants: Vec<String>,
    pub agenda: Vec<String>,
    pub notes: String,
    pub action_items: Vec<String>,
}

impl Meeting {
    /// Build a validated meeting from a draft.
    pub fn from_draft(draft: MeetingDraft, now: DateTime<Utc>) -> Result<Self> {
        let meeting = Self {
            title: draft.title.trim().to_string(),
            date: draft.date.unwrap_or(now),
            participants: draft.participants,
            agenda: draft.agenda,
            notes: draft.notes,
            action_items: draft.action_items,
            created_at: now,
        };
        if meeting.title.is_empty() {
            return Err(StoreError::validation("title", "must not be empty"));
        }
        Ok(meeting)
    }

    /// Derived file key: meeting date plus title slug.
    #[must_use]
    pub fn file_key(&self) -> String {
        format!("{}-{}", self.date.format("%Y-%m-%d"), slugify(&self.title))
    }

    /// The text handed to the semantic index on creation.
    #[must_use]
    pub fn index_text(&self) -> String {
        format!("{}\n{}", self.title, self.notes)
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.title);
        md.push_str(&format!("**Date:** {}\n", rfc3339(self.date)));
        md.push_str(&format!(
            "**Participants:** {}\n\n",
            self.participants.join(", ")
        ));

        if !self.agenda.is_empty() {
            md.push_str("## Agenda\n");
            for entry in &self.agenda {
                md.push_str(&format!("- {entry}\n"));
            }
            md.push('\n');
        }
        if !self.notes.is_empty() {
            md.push_str("## Notes\n");
            md.push_str(&self.notes);
            md.push_str("\n\n");
        }
        if !self.action_items.is_empty() {
            md.push_str("## Action Items\n");
            for item in &self.action_items {
                md.push_str(&format!("- {item}\n"));
            }
            md.push('\n');
        }

        md.push_str("---\n");
        md.push_str(&format!("*Created: {}*\n", rfc3339(self.created_at)));
        md
    }

    pub fn from_markdown(content: &str) -> Result<Self> {
        let mut title = None;
        let mut date = None;
        let mut participants = Vec::new();
        let mut agenda = Vec::new();
        let mut notes = String::new();
        let mut action_items = Vec::new();
        let mut created_at = None;

        #[derive(PartialEq)]
        enum Section {
            None,
            Agenda,
            Notes,
            ActionItems,
        }
        let mut section = Section::None;

        for line in content.lines() {
            if let Some(heading) = line.strip_prefix("# ") {
                title = Some(heading.trim().to_string());
            } else if line.starts_with("## Agenda") {
                section = Section::Agenda;
            } else if line.starts_with("## Notes") {
                section = Section::Notes;
            } else if line.starts_with("## Action Items") {
                section = Section::ActionItems;
            } else if line.starts_with("##") {
                section = Section::None;
            } else if let Some(value) = super::md_field(line, "**Date:**") {
                date = Some(parse_timestamp("date", value)?);
            } else if let Some(value) = super::md_field(line, "**Participants:**") {
                participants = value
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
            } else if let Some(value) = line.strip_prefix("*Created:") {
                created_at = Some(parse_timestamp(
                    "created_at",
                    value.trim_end_matches('*'),
                )?);
            } else {
                match section {
                    Section::Agenda => {
                        if let Some(entry) = line.strip_prefix("- ") {
                            agenda.push(entry.trim().to_string());
                        }
                    }
                    Section::ActionItems => {
                        if let Some(entry) = line.strip_prefix("- ") {
                            action_items.push(entry.trim().to_string());
                        }
                    }
                    Section::Notes => {
                        if line != "---" {
                            notes.push_str(line);
                            notes.push('\n');
                        }
                    }
                    Section::None => {}
                }
            }
        }

        let date =
            date.ok_or_else(|| StoreError::validation("date", "missing **Date:** field"))?;
        Ok(Self {
            title: title
                .ok_or_else(|| StoreError::validation("title", "missing title heading"))?,
            date,
            participants,
            agenda,
            notes: notes.trim().to_string(),
            action_items,
            created_at: created_at.unwrap_or(date),
        })
    }
}

/// Lowercase the title, map separators to `-`, and cap the length.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '/' || c == '-' || c == '_')
            && !slug.ends_with('-')
            && !slug.is_empty()
        {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    slug.chars().take(SLUG_MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Meeting {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        Meeting::from_draft(
            MeetingDraft {
                title: "Sprint Planning / Q2".to_string(),
                date: Some(now),
                participants: vec!["alice".to_string(), "bob".to_string()],
                agenda: vec!["velocity".to_string(), "capacity".to_string()],
                notes: "Carried over two items.\nAgreed on scope.".to_string(),
                action_items: vec!["bob: update roadmap".to_string()],
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn file_key_is_date_plus_slug() {
        assert_eq!(sample().file_key(), "2025-03-14-sprint-planning-q2");
    }

    #[test]
    fn slug_caps_length_and_strips_punctuation() {
        let long = "A ".repeat(60);
        assert!(slugify(&long).len() <= SLUG_MAX_LEN);
        assert_eq!(slugify("Weekly Sync: API & Infra"), "weekly-sync-api-infra");
    }

    #[test]
    fn markdown_roundtrips() {
        let meeting = sample();
        let parsed = Meeting::from_markdown(&meeting.to_markdown()).unwrap();
        assert_eq!(parsed, meeting);
    }

    #[test]
    fn markdown_roundtrips_without_optional_sections() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let meeting = Meeting::from_draft(
            MeetingDraft {
                title: "Standup".to_string(),
                date: Some(now),
                ..MeetingDraft::default()
            },
            now,
        )
        .unwrap();
        let parsed = Meeting::from_markdown(&meeting.to_markdown()).unwrap();
        assert_eq!(parsed, meeting);
        assert!(parsed.agenda.is_empty());
        assert!(parsed.notes.is_empty());
    }

    #[test]
    fn empty_title_is_rejected() {
        let err = Meeting::from_draft(
            MeetingDraft {
                title: " ".to_string(),
                ..MeetingDraft::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { field: "title", .. }));
    }
}
