//! JSON file-backed store.
//!
//! The data file may be shared by several processes. Every call takes an
//! advisory lock on a sibling `<file>.lock`: shared for reads, exclusive for
//! writes. Reads reload the file under the lock. Writes reload, apply the
//! change to the fresh copy, write it to a temporary file in the same
//! directory and rename it into place, all before releasing the lock. The
//! in-memory copy is only replaced once the new snapshot is on disk.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock;
use uuid::Uuid;

use assessor_core::error::StoreError;
use assessor_core::model::{Attempt, AttemptRecord, Course, Lesson, Quiz, StudentAnswer};
use assessor_core::traits::{EnrollmentGate, QuizStore};

use crate::memory::{Dataset, MemoryStore};

/// A store persisted as a single JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    pretty: bool,
    memory: MemoryStore,
}

impl FileStore {
    /// Open the data file at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>, pretty: bool) -> Result<Self, StoreError> {
        let store = Self::unloaded(path.into(), pretty)?;
        store.refresh()?;
        tracing::debug!(path = %store.path.display(), "opened data file");
        Ok(store)
    }

    /// Write `dataset` to `path`, replacing whatever is there.
    pub fn create(
        path: impl Into<PathBuf>,
        dataset: Dataset,
        pretty: bool,
    ) -> Result<Self, StoreError> {
        let store = Self::unloaded(path.into(), pretty)?;
        store.write_through(move |data| {
            *data = dataset;
            Ok(((), true))
        })?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The dataset as currently stored on disk.
    pub fn snapshot(&self) -> Result<Dataset, StoreError> {
        self.refresh()?;
        self.memory.snapshot()
    }

    fn unloaded(path: PathBuf, pretty: bool) -> Result<Self, StoreError> {
        std::fs::create_dir_all(parent_dir(&path))?;
        let mut lock_name = path.file_name().unwrap_or_default().to_os_string();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);

        let store = Self {
            path,
            lock_path,
            pretty,
            memory: MemoryStore::new(),
        };
        // Created up front so later calls only need to open it.
        store.lock_file()?;
        Ok(store)
    }

    fn lock_file(&self) -> Result<File, StoreError> {
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?)
    }

    /// Reload the in-memory copy from disk under a shared lock.
    fn refresh(&self) -> Result<(), StoreError> {
        let lock = RwLock::new(self.lock_file()?);
        let _guard = lock.read()?;
        let dataset = self.load()?;
        self.memory.replace(dataset)
    }

    /// Apply `op` to the on-disk dataset under an exclusive lock.
    ///
    /// `op` returns its result and whether it changed anything. Unchanged
    /// datasets are not rewritten.
    fn write_through<T>(
        &self,
        op: impl FnOnce(&mut Dataset) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut lock = RwLock::new(self.lock_file()?);
        let _guard = lock.write()?;

        let mut dataset = self.load()?;
        let (out, changed) = op(&mut dataset)?;
        if changed {
            self.write_file(&dataset)?;
        }
        self.memory.replace(dataset)?;
        Ok(out)
    }

    fn load(&self) -> Result<Dataset, StoreError> {
        if !self.path.exists() {
            return Ok(Dataset::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_file(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let json = if self.pretty {
            serde_json::to_vec_pretty(dataset)?
        } else {
            serde_json::to_vec(dataset)?
        };

        let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(&self.path))?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        tracing::trace!(path = %self.path.display(), bytes = json.len(), "data file written");
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[async_trait]
impl QuizStore for FileStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<Quiz, StoreError> {
        self.write_through(|data| Ok((data.insert_quiz(quiz)?, true)))
    }

    async fn set_correct_answer(
        &self,
        question_id: Uuid,
        answer_id: Uuid,
    ) -> Result<(), StoreError> {
        self.write_through(|data| Ok((data.set_correct_answer(question_id, answer_id)?, true)))
    }

    async fn find_quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>, StoreError> {
        self.refresh()?;
        self.memory.find_quiz(quiz_id).await
    }

    async fn quizzes_for_lesson(&self, lesson_id: Uuid) -> Result<Vec<Quiz>, StoreError> {
        self.refresh()?;
        self.memory.quizzes_for_lesson(lesson_id).await
    }

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<Lesson>, StoreError> {
        self.refresh()?;
        self.memory.find_lesson(lesson_id).await
    }

    async fn find_course(&self, course_id: Uuid) -> Result<Option<Course>, StoreError> {
        self.refresh()?;
        self.memory.find_course(course_id).await
    }

    async fn record_attempt(
        &self,
        record: &AttemptRecord,
        expected_latest: Option<Uuid>,
    ) -> Result<(), StoreError> {
        self.write_through(|data| Ok((data.record_attempt(record, expected_latest)?, true)))
    }

    async fn latest_attempt(
        &self,
        student_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<Option<Attempt>, StoreError> {
        self.refresh()?;
        self.memory.latest_attempt(student_id, quiz_id).await
    }

    async fn attempts_for_quiz(&self, quiz_id: Uuid) -> Result<Vec<Attempt>, StoreError> {
        self.refresh()?;
        self.memory.attempts_for_quiz(quiz_id).await
    }

    async fn answers_for_attempt(
        &self,
        attempt_id: Uuid,
    ) -> Result<Vec<StudentAnswer>, StoreError> {
        self.refresh()?;
        self.memory.answers_for_attempt(attempt_id).await
    }

    async fn delete_quiz(&self, quiz_id: Uuid) -> Result<bool, StoreError> {
        self.write_through(|data| {
            let deleted = data.delete_quiz(quiz_id);
            Ok((deleted, deleted))
        })
    }
}

#[async_trait]
impl EnrollmentGate for FileStore {
    async fn is_enrolled(&self, student_id: Uuid, course_id: Uuid) -> Result<bool, StoreError> {
        self.refresh()?;
        self.memory.is_enrolled(student_id, course_id).await
    }
}
