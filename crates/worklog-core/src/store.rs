//! Git-backed document store.
//!
//! Each record is one markdown file in the working tree; every logical
//! mutation is exactly one commit with a greppable `<action> <kind> <id>`
//! message. Writes stage to a temp sibling and rename into place before the
//! commit, so readers never observe a half-written file and a failure before
//! the commit leaves no partial record. A repository-wide exclusive lock
//! serializes mutations; reads go lock-free against the last-committed state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::vec::IntoIter;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{self, StoreConfig};
use crate::error::{Result, StoreError};
use crate::git::{self, CommitInfo};
use crate::lock::RepoLock;
use crate::model::RecordKind;
use crate::model::backlog::{BacklogDraft, BacklogItem, BacklogPatch, Status};
use crate::model::meeting::{Meeting, MeetingDraft};
use crate::notify::{IndexAction, IndexEvent, IndexNotifier, NoopNotifier};
use crate::query::{BacklogQuery, QueryPage, run_query};
use crate::workflow;

const BACKLOG_DIR: &str = "backlogs";
const MEETING_DIR: &str = "meetings";
const ARCHIVE_DIR: &str = "archives";
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const ID_LEN: usize = 8;
const MAX_ID_ATTEMPTS: u32 = 5;

/// One explicitly constructed, explicitly owned store per repository.
pub struct WorklogStore {
    root: PathBuf,
    config: StoreConfig,
    notifier: Arc<dyn IndexNotifier>,
}

impl WorklogStore {
    /// Open (or initialize) the repository at `root` with its on-disk config
    /// and no index notifier.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = config::load_store_config(&root)
            .map_err(|e| StoreError::validation("config", format!("{e:#}")))?;
        Self::open_with(root, config, Arc::new(NoopNotifier))
    }

    /// Open (or initialize) with an explicit config and index notifier.
    pub fn open_with(
        root: impl Into<PathBuf>,
        config: StoreConfig,
        notifier: Arc<dyn IndexNotifier>,
    ) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::unavailable("init", e))?;

        let fresh = !root.join(".git").exists();
        if fresh {
            info!(repo = %root.display(), "initializing new worklog repository");
            git::init(&root)?;
        } else {
            debug!(repo = %root.display(), "opening existing worklog repository");
        }
        git::set_config(&root, "user.name", &config.git.user_name)?;
        git::set_config(&root, "user.email", &config.git.user_email)?;

        for dir in [MEETING_DIR, BACKLOG_DIR, ARCHIVE_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| StoreError::unavailable("init", e))?;
            let keep = path.join(".gitkeep");
            if !keep.exists() {
                fs::write(&keep, "").map_err(|e| StoreError::unavailable("init", e))?;
            }
        }

        if fresh {
            fs::write(root.join("README.md"), README).map_err(|e| {
                StoreError::unavailable("init", e)
            })?;
            git::stage(&root, ".")?;
            git::commit(&root, "init worklog repository")?;
        }

        Ok(Self {
            root,
            config,
            notifier,
        })
    }

    /// Effective repository configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Repository root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ── backlog items ───────────────────────────────────────────────────

    /// Create a backlog item: validate, assign a unique id, write, commit.
    pub fn create_backlog(&self, draft: BacklogDraft) -> Result<BacklogItem> {
        let _lock = self.lock()?;
        let id = self.allocate_id()?;
        let item = BacklogItem::from_draft(draft, id, Utc::now())?;

        let rel = rel_backlog(&item.id);
        self.write_atomic(&rel, &item.to_markdown())?;
        self.commit_paths(&[&rel], &format!("create backlog {}", item.id))?;
        info!(id = %item.id, title = %item.title, "created backlog item");

        self.notify(RecordKind::Backlog, &item.id, IndexAction::Created, Some(item.index_text()));
        Ok(item)
    }

    /// Fetch a current (non-archived) backlog item.
    pub fn get_backlog(&self, id: &str) -> Result<BacklogItem> {
        let rel = rel_backlog(id);
        let path = self.root.join(&rel);
        if !path.exists() {
            return Err(StoreError::not_found(RecordKind::Backlog, id));
        }
        self.read_backlog(&path, Some(id))
    }

    /// Lazy, restartable pass over all backlog items in filename order.
    /// Archived items are included only on request.
    pub fn iter_backlog(&self, include_archived: bool) -> Result<BacklogIter> {
        let mut paths = record_paths(&self.root.join(BACKLOG_DIR))?;
        if include_archived {
            paths.extend(record_paths(&self.root.join(ARCHIVE_DIR))?);
        }
        Ok(BacklogIter {
            store: self,
            paths: paths.into_iter(),
        })
    }

    /// Collect the full backlog listing.
    pub fn list_backlog(&self, include_archived: bool) -> Result<Vec<BacklogItem>> {
        self.iter_backlog(include_archived)?.collect()
    }

    /// Evaluate a structured query against the current snapshot.
    pub fn search_backlog(&self, query: &BacklogQuery) -> Result<QueryPage> {
        query.validate()?;
        let items = self.list_backlog(query.include_archived)?;
        run_query(&items, query)
    }

    /// Apply a partial update; only the provided fields change and
    /// `updated_at` strictly increases.
    pub fn update_backlog(&self, id: &str, patch: &BacklogPatch) -> Result<BacklogItem> {
        if patch.is_empty() {
            return Err(StoreError::validation("patch", "no fields to update"));
        }

        let _lock = self.lock()?;
        let mut item = self.get_backlog(id)?;
        patch.apply_to(&mut item);
        bump_updated(&mut item, Utc::now());
        item.validate()?;

        let rel = rel_backlog(id);
        self.write_atomic(&rel, &item.to_markdown())?;
        self.commit_paths(&[&rel], &format!("update backlog {id}"))?;
        info!(id = %id, "updated backlog item");

        self.notify(RecordKind::Backlog, id, IndexAction::Updated, Some(item.index_text()));
        Ok(item)
    }

    /// Change status through the workflow rules; entering `done` stamps
    /// `completed_at`.
    pub fn update_status(&self, id: &str, new_status: Status) -> Result<BacklogItem> {
        let _lock = self.lock()?;
        let mut item = self.get_backlog(id)?;
        workflow::check_transition(item.status, new_status)?;

        let now = Utc::now();
        item.status = new_status;
        if new_status == Status::Done && item.completed_at.is_none() {
            item.completed_at = Some(now);
        }
        bump_updated(&mut item, now);

        let rel = rel_backlog(id);
        self.write_atomic(&rel, &item.to_markdown())?;
        self.commit_paths(&[&rel], &format!("status backlog {id}"))?;
        info!(id = %id, status = %new_status, "changed backlog status");

        self.notify(RecordKind::Backlog, id, IndexAction::Updated, Some(item.index_text()));
        Ok(item)
    }

    /// Soft-delete (default): move the file to the archive path with
    /// `archived: true`. With `archive = false`, remove it permanently.
    /// Either way, one commit.
    pub fn delete_backlog(&self, id: &str, archive: bool) -> Result<BacklogItem> {
        let _lock = self.lock()?;
        let rel = rel_backlog(id);
        let path = self.root.join(&rel);
        if !path.exists() {
            return Err(StoreError::not_found(RecordKind::Backlog, id));
        }
        let mut item = self.read_backlog(&path, Some(id))?;

        if archive {
            item.archived = true;
            bump_updated(&mut item, Utc::now());
            let archived_rel = rel_archive(id);
            self.write_atomic(&archived_rel, &item.to_markdown())?;
            fs::remove_file(&path).map_err(|e| StoreError::unavailable("archive", e))?;
            self.commit_paths(&[&rel, &archived_rel], &format!("archive backlog {id}"))?;
            info!(id = %id, "archived backlog item");
            self.notify(RecordKind::Backlog, id, IndexAction::Archived, Some(item.index_text()));
        } else {
            fs::remove_file(&path).map_err(|e| StoreError::unavailable("delete", e))?;
            self.commit_paths(&[&rel], &format!("delete backlog {id}"))?;
            info!(id = %id, "deleted backlog item");
            self.notify(RecordKind::Backlog, id, IndexAction::Deleted, None);
        }
        Ok(item)
    }

    // ── meetings ────────────────────────────────────────────────────────

    /// Create a meeting note. The file key is derived from date and title;
    /// a duplicate key is a validation error.
    pub fn create_meeting(&self, draft: MeetingDraft) -> Result<Meeting> {
        let _lock = self.lock()?;
        let meeting = Meeting::from_draft(draft, Utc::now())?;
        let key = meeting.file_key();

        let rel = rel_meeting(&key);
        if self.root.join(&rel).exists() {
            return Err(StoreError::validation(
                "title",
                format!("meeting '{key}' already exists"),
            ));
        }

        self.write_atomic(&rel, &meeting.to_markdown())?;
        self.commit_paths(&[&rel], &format!("create meeting {key}"))?;
        info!(key = %key, "created meeting note");

        self.notify(RecordKind::Meeting, &key, IndexAction::Created, Some(meeting.index_text()));
        Ok(meeting)
    }

    /// Fetch one meeting by its derived file key.
    pub fn get_meeting(&self, key: &str) -> Result<Meeting> {
        let path = self.root.join(rel_meeting(key));
        if !path.exists() {
            return Err(StoreError::not_found(RecordKind::Meeting, key));
        }
        let content =
            fs::read_to_string(&path).map_err(|e| StoreError::unavailable("read", e))?;
        Meeting::from_markdown(&content).map_err(|e| StoreError::Consistency {
            path,
            detail: e.to_string(),
        })
    }

    /// All meeting notes in filename (date) order.
    pub fn list_meetings(&self) -> Result<Vec<Meeting>> {
        let mut meetings = Vec::new();
        for path in record_paths(&self.root.join(MEETING_DIR))? {
            let content =
                fs::read_to_string(&path).map_err(|e| StoreError::unavailable("read", e))?;
            meetings.push(Meeting::from_markdown(&content).map_err(|e| {
                StoreError::Consistency {
                    path,
                    detail: e.to_string(),
                }
            })?);
        }
        Ok(meetings)
    }

    // ── history ─────────────────────────────────────────────────────────

    /// Commit history for one record, newest first. Archived backlog items
    /// resolve to their archive path.
    pub fn history(&self, kind: RecordKind, id: &str, limit: usize) -> Result<Vec<CommitInfo>> {
        let rel = match kind {
            RecordKind::Backlog => {
                let rel = rel_backlog(id);
                if self.root.join(&rel).exists() {
                    rel
                } else {
                    let archived = rel_archive(id);
                    if !self.root.join(&archived).exists() {
                        return Err(StoreError::not_found(kind, id));
                    }
                    archived
                }
            }
            RecordKind::Meeting => {
                let rel = rel_meeting(id);
                if !self.root.join(&rel).exists() {
                    return Err(StoreError::not_found(kind, id));
                }
                rel
            }
        };
        git::file_log(&self.root, &rel, limit)
    }

    // ── internals ───────────────────────────────────────────────────────

    fn lock(&self) -> Result<RepoLock> {
        RepoLock::acquire(&self.root.join(".worklog/repo.lock"), LOCK_TIMEOUT)
    }

    /// Draw ids until one is unused. Collisions on 8 hex chars are rare
    /// enough that hitting the attempt cap means something else is wrong.
    fn allocate_id(&self) -> Result<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id: String = Uuid::new_v4().simple().to_string()[..ID_LEN].to_string();
            let taken = self.root.join(rel_backlog(&id)).exists()
                || self.root.join(rel_archive(&id)).exists();
            if !taken {
                return Ok(id);
            }
        }
        Err(StoreError::unavailable(
            "id allocation",
            format!("no unused id after {MAX_ID_ATTEMPTS} attempts"),
        ))
    }

    /// Stage-then-rename so no reader ever sees a partial file.
    fn write_atomic(&self, rel: &str, content: &str) -> Result<()> {
        let path = self.root.join(rel);
        let tmp = path.with_extension("md.tmp");
        fs::write(&tmp, content).map_err(|e| StoreError::unavailable("write", e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::unavailable("write", e))?;
        Ok(())
    }

    fn commit_paths(&self, rels: &[&str], message: &str) -> Result<()> {
        for rel in rels {
            git::stage(&self.root, rel)?;
        }
        git::commit(&self.root, message)
    }

    fn read_backlog(&self, path: &Path, expected_id: Option<&str>) -> Result<BacklogItem> {
        let content =
            fs::read_to_string(path).map_err(|e| StoreError::unavailable("read", e))?;
        let item = BacklogItem::from_markdown(&content).map_err(|e| StoreError::Consistency {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        if let Some(expected) = expected_id {
            if item.id != expected {
                return Err(StoreError::Consistency {
                    path: path.to_path_buf(),
                    detail: format!("file claims id '{}', expected '{expected}'", item.id),
                });
            }
        }
        Ok(item)
    }

    fn notify(&self, kind: RecordKind, id: &str, action: IndexAction, text: Option<String>) {
        self.notifier.record_changed(IndexEvent {
            kind,
            id: id.to_string(),
            action,
            text,
        });
    }
}

/// Lazy backlog iterator; parses one file per `next()` call. Obtain a fresh
/// one from `iter_backlog` to restart.
pub struct BacklogIter<'a> {
    store: &'a WorklogStore,
    paths: IntoIter<PathBuf>,
}

impl Iterator for BacklogIter<'_> {
    type Item = Result<BacklogItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(self.store.read_backlog(&path, None))
    }
}

fn bump_updated(item: &mut BacklogItem, now: DateTime<Utc>) {
    // Strictly increasing even if the clock hasn't ticked since the load.
    item.updated_at = if now > item.updated_at {
        now
    } else {
        item.updated_at + chrono::Duration::microseconds(1)
    };
}

fn rel_backlog(id: &str) -> String {
    format!("{BACKLOG_DIR}/{id}.md")
}

fn rel_archive(id: &str) -> String {
    format!("{ARCHIVE_DIR}/{id}.md")
}

fn rel_meeting(key: &str) -> String {
    format!("{MEETING_DIR}/{key}.md")
}

/// Markdown record files under `dir`, sorted by filename for deterministic
/// listing order.
fn record_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| StoreError::unavailable("list", e))?;
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::unavailable("list", e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

const README: &str = "# Worklog Repository\n\n\
This repository contains meeting notes and backlog items managed by worklog.\n\n\
## Structure\n\
- `/meetings` - Meeting notes\n\
- `/backlogs` - Backlog items\n\
- `/archives` - Archived items\n";
