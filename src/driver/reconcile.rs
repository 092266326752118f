//! Post-completion file placement and renaming.
//!
//! A finished offline task leaves its files somewhere below its upload
//! folder, under the names the release used. Reconciliation finds them, moves
//! them into the recorded save path, renames them after the naming template
//! and trashes source folders it emptied.
//!
//! The submission record is taken out of the store before any remote
//! mutation, so a concurrent poller that sees the same completed task finds
//! nothing to do. A run abandoned before any file was touched puts the record
//! back and leaves the provider task alone, so the next poll tries again.

use crate::error::{Error, Result};
use crate::renamer::RenameHint;
use crate::types::{Event, FolderId, RemoteFileCandidate, RemoteTask, SubmittedTaskRecord, TaskState};
use std::collections::{BTreeSet, HashSet};

use super::Pan123Driver;
use super::matching;

impl Pan123Driver {
    /// Reconcile a completed task's files with its recorded naming intent
    ///
    /// Best effort: failures are logged and never surface to the caller. On
    /// success `task.display_name` reflects the renamed primary file.
    pub async fn reconcile(&self, task: &mut RemoteTask) {
        if task.lacks_submission_metadata() {
            tracing::debug!(task_id = %task.task_id, "no submission record, skipping rename");
            return;
        }
        if task.state != TaskState::Completed {
            tracing::debug!(task_id = %task.task_id, state = %task.state, "task not completed, skipping rename");
            return;
        }
        if let Err(e) = self.ensure_session().await {
            tracing::error!(task_id = %task.task_id, error = %e, "cannot reconcile task");
            return;
        }

        let Some(record) = self.state.records.take(task.task_id).await else {
            tracing::debug!(task_id = %task.task_id, "task already reconciled");
            return;
        };

        match self.reconcile_files(task, &record).await {
            Ok(files) => {
                if let Err(e) = self.delete_offline_task(task.task_id).await {
                    tracing::warn!(task_id = %task.task_id, error = %e, "failed to delete reconciled offline task");
                }
                tracing::info!(task_id = %task.task_id, files, "task reconciled");
                self.emit(Event::TaskReconciled {
                    task_id: task.task_id,
                    files,
                });
            }
            Err(e) => {
                tracing::warn!(task_id = %task.task_id, error = %e, "reconciliation abandoned, will retry");
                self.state.records.insert(record).await;
            }
        }
    }

    /// Locate, move and rename the task's files; returns the number of candidates
    ///
    /// An error means no file was moved or renamed.
    async fn reconcile_files(&self, task: &mut RemoteTask, record: &SubmittedTaskRecord) -> Result<usize> {
        let template = self
            .naming_template(task, record)
            .ok_or_else(|| Error::NotFound(format!("naming template for '{}'", task.display_name)))?;

        let target = self.resolve_or_create(&record.save_path).await?;
        let candidates = self.locate_candidates(task, target).await?;
        if candidates.is_empty() {
            return Err(Error::Consistency(format!(
                "no files matching '{}' below the upload folder",
                task.display_name
            )));
        }

        let mut emptied = BTreeSet::new();
        for candidate in &candidates {
            if let Some(source) = self.place_file(task, candidate, target, &template).await {
                emptied.insert(source);
            }
        }

        self.prune_sources(emptied, target).await;
        Ok(candidates.len())
    }

    /// Template recorded at submission, else one synthesized by the renamer
    fn naming_template(&self, task: &RemoteTask, record: &SubmittedTaskRecord) -> Option<String> {
        if let Some(name) = record.target_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(name.to_string());
        }

        let hint = RenameHint {
            download_dir: record.save_path.clone(),
            title: task.display_name.clone(),
            subgroup: matching::extract_subgroup(&task.display_name),
        };
        let template = self.renamer.template_for(&hint);
        if template.is_none() {
            tracing::info!(
                task_id = %task.task_id,
                renamer = self.renamer.name(),
                "renamer produced no template"
            );
        }
        template
    }

    /// Depth-first search below the task's upload folder for matching files
    ///
    /// A subtree whose listing fails is skipped. Folders deeper than the
    /// configured search depth are not entered.
    async fn locate_candidates(&self, task: &RemoteTask, target: FolderId) -> Result<Vec<RemoteFileCandidate>> {
        let offline = self.find_completed_task(task.task_id).await?;
        let upload = offline
            .destination_folder()
            .map(FolderId)
            .ok_or_else(|| Error::NotFound(format!("upload folder of task {}", task.task_id)))?;

        let max_depth = self.config.listing.max_search_depth;
        let mut stack = vec![(upload, 0usize)];
        let mut visited = HashSet::new();
        let mut candidates = Vec::new();

        while let Some((folder, depth)) = stack.pop() {
            if !visited.insert(folder) {
                continue;
            }

            let children = match self.list_children(folder, self.config.listing.page_size).await {
                Ok(children) => children,
                Err(e) => {
                    tracing::warn!(folder_id = %folder, error = %e, "cannot list folder, skipping subtree");
                    continue;
                }
            };

            let mut subfolders = Vec::new();
            for entry in children {
                if entry.is_dir() {
                    if depth < max_depth {
                        subfolders.push(FolderId(entry.file_id));
                    }
                } else if matching::matches_display_name(&entry.file_name, &task.display_name) {
                    candidates.push(RemoteFileCandidate {
                        file_id: entry.file_id.into(),
                        file_name: entry.file_name,
                        parent_folder_id: folder,
                        is_in_target_directory: folder == target,
                    });
                }
            }
            // listing order is preserved when popping
            stack.extend(subfolders.into_iter().rev().map(|id| (id, depth + 1)));
        }

        tracing::debug!(task_id = %task.task_id, upload_folder = %upload, found = candidates.len(), "searched upload folder");
        Ok(candidates)
    }

    /// Move and rename one file; returns its original folder when it was moved out of it
    async fn place_file(
        &self,
        task: &mut RemoteTask,
        candidate: &RemoteFileCandidate,
        target: FolderId,
        template: &str,
    ) -> Option<FolderId> {
        let final_name = self.renamer.final_name(template, &candidate.file_name);
        if candidate.is_in_target_directory && candidate.file_name == final_name {
            tracing::debug!(file_id = %candidate.file_id, name = %final_name, "file already in place");
            return None;
        }

        let mut moved_from = None;
        if !candidate.is_in_target_directory {
            if let Err(e) = self.move_file(candidate.file_id, target).await {
                tracing::warn!(file_id = %candidate.file_id, error = %e, "failed to move file, skipping it");
                return None;
            }
            tracing::info!(file_id = %candidate.file_id, to_folder = %target, "moved file");
            self.emit(Event::FileMoved {
                task_id: task.task_id,
                file_id: candidate.file_id,
                to_folder: target,
            });
            if candidate.parent_folder_id != target {
                moved_from = Some(candidate.parent_folder_id);
            }
        }

        if candidate.file_name != final_name {
            match self.rename_file(candidate.file_id, &final_name).await {
                Ok(()) => {
                    tracing::info!(file_id = %candidate.file_id, from = %candidate.file_name, to = %final_name, "renamed file");
                    if task.display_name == candidate.file_name {
                        task.display_name = final_name.clone();
                    }
                    self.emit(Event::FileRenamed {
                        task_id: task.task_id,
                        from: candidate.file_name.clone(),
                        to: final_name,
                    });
                }
                Err(e) => {
                    tracing::warn!(file_id = %candidate.file_id, error = %e, "failed to rename file");
                }
            }
        }

        moved_from
    }

    /// Trash each source folder that is empty after the moves
    async fn prune_sources(&self, sources: BTreeSet<FolderId>, target: FolderId) {
        let sources: Vec<FolderId> = sources
            .into_iter()
            .filter(|folder| *folder != target && !folder.is_root())
            .collect();
        if sources.is_empty() {
            return;
        }

        tokio::time::sleep(self.config.timing.cleanup_settle).await;
        for folder in sources {
            match self.trash_if_empty(folder).await {
                Ok(true) => {
                    tracing::info!(folder_id = %folder, "trashed emptied source folder");
                    self.emit(Event::FolderTrashed { folder_id: folder });
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(folder_id = %folder, error = %e, "failed to clean up source folder");
                }
            }
        }
    }
}
