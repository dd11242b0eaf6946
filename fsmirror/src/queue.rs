use std::io;

use fsmirror_core::{
    error::TaskExecutionError,
    store::{EntryMetadata, FileStore},
    task::{Task, TaskAction},
};

/// Outcome of a `TaskQueue::run`
#[derive(Debug, Default)]
pub struct QueueReport {
    pub applied: Vec<Task>,
    pub failures: Vec<TaskExecutionError>,
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    propagate_directories: bool,
}

impl TaskQueue {
    pub fn new(propagate_directories: bool) -> Self {
        Self {
            tasks: vec![],
            propagate_directories,
        }
    }

    pub fn add(&mut self, task: Task) {
        self.tasks.push(task)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Execute all tasks in insertion order. A failing task is logged and
    /// doesn't prevent next ones. The queue is empty after the call, whatever
    /// happened.
    pub fn run(&mut self, store: &dyn FileStore) -> QueueReport {
        let mut report = QueueReport::default();

        for task in std::mem::take(&mut self.tasks) {
            match self.execute(&task, store) {
                Ok(_) => {
                    log::info!("Executed {}", task);
                    report.applied.push(task);
                }
                Err(source) => {
                    let error = TaskExecutionError { task, source };
                    log::error!("{}", error);
                    report.failures.push(error);
                }
            }
        }

        report
    }

    fn execute(&self, task: &Task, store: &dyn FileStore) -> io::Result<()> {
        match task.action() {
            TaskAction::AddFile | TaskAction::UpdateFile => {
                // A directory replaced by a file on the watched side
                if let Some(EntryMetadata::Directory) = store.stat(task.destination())? {
                    log::debug!("Replace directory {}", task.destination().display());
                    store.remove_all(task.destination())?;
                }
                if let Some(parent) = task.destination().parent() {
                    store.create_dir_all(parent)?;
                }
                store.copy_file(task.source(), task.destination())
            }
            TaskAction::DeleteFile => store.remove_file(task.destination()),
            TaskAction::AddDirectory => {
                if self.propagate_directories {
                    store.create_dir_all(task.destination())
                } else {
                    Ok(())
                }
            }
            TaskAction::DeleteDirectory => {
                if self.propagate_directories {
                    store.remove_all(task.destination())
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::tests::*;
    use crate::translate::ChangeTranslator;
    use fsmirror_core::change::Change;
    use fsmirror_core::store::{LocalFileStore, MockFileStore};
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn task(action: TaskAction, source: &str, destination: &str) -> Task {
        Task::new(action, PathBuf::from(source), PathBuf::from(destination))
    }

    #[test]
    fn test_run_in_order_and_clear() {
        // Given
        let mut sequence = Sequence::new();
        let mut store = MockFileStore::new();
        store.expect_stat().returning(|_| Ok(None));
        store
            .expect_create_dir_all()
            .withf(|path| path == Path::new("/b"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        store
            .expect_copy_file()
            .withf(|source, destination| {
                source == Path::new("/a/x.txt") && destination == Path::new("/b/x.txt")
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));
        store
            .expect_remove_file()
            .withf(|path| path == Path::new("/b/y.txt"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));
        let mut queue = TaskQueue::new(false);
        queue.add(task(TaskAction::AddFile, "/a/x.txt", "/b/x.txt"));
        queue.add(task(TaskAction::DeleteFile, "/a/y.txt", "/b/y.txt"));
        queue.add(task(TaskAction::AddDirectory, "/a/Folder", "/b/Folder"));
        queue.add(task(TaskAction::DeleteDirectory, "/a/Old", "/b/Old"));

        // When
        let report = queue.run(&store);

        // Then
        assert_eq!(report.applied.len(), 4);
        assert!(report.failures.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_run_continue_after_failure_and_clear() {
        // Given
        let mut store = MockFileStore::new();
        store.expect_stat().returning(|_| Ok(None));
        store.expect_create_dir_all().returning(|_| Ok(()));
        store
            .expect_copy_file()
            .withf(|source, _| source == Path::new("/a/broken.txt"))
            .times(1)
            .returning(|_, _| Err(io::Error::from(io::ErrorKind::PermissionDenied)));
        store
            .expect_copy_file()
            .withf(|source, _| source == Path::new("/a/ok.txt"))
            .times(1)
            .returning(|_, _| Ok(()));
        let mut queue = TaskQueue::new(false);
        queue.add(task(TaskAction::UpdateFile, "/a/broken.txt", "/b/broken.txt"));
        queue.add(task(TaskAction::UpdateFile, "/a/ok.txt", "/b/ok.txt"));

        // When
        let report = queue.run(&store);

        // Then
        assert_eq!(
            report.applied,
            vec![task(TaskAction::UpdateFile, "/a/ok.txt", "/b/ok.txt")]
        );
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].task,
            task(TaskAction::UpdateFile, "/a/broken.txt", "/b/broken.txt")
        );
        assert!(queue.is_empty());
    }

    #[rstest]
    #[case(TaskAction::AddDirectory, "Folder", true)]
    #[case(TaskAction::DeleteDirectory, "Folder", false)]
    fn test_propagate_directories(
        #[case] action: TaskAction,
        #[case] name: &str,
        #[case] expected_exists: bool,
    ) {
        // Given
        let tmpdir_ = tmpdir();
        let source = tmpdir_.join("a").join(name);
        let destination = tmpdir_.join("b").join(name);
        fs::create_dir_all(&source).unwrap();
        if action == TaskAction::DeleteDirectory {
            write_files(&destination, &[("Sub/c.txt", "c")]);
        }
        let mut queue = TaskQueue::new(true);
        queue.add(Task::new(action, source, destination.clone()));

        // When
        let report = queue.run(&LocalFileStore::new());

        // Then
        assert!(report.failures.is_empty());
        assert_eq!(destination.exists(), expected_exists);
    }

    #[test]
    fn test_add_file_over_directory() {
        // Given
        let tmpdir_ = tmpdir();
        let source = tmpdir_.join("a").join("x");
        let destination = tmpdir_.join("b").join("x");
        write_files(&tmpdir_.join("a"), &[("x", "now a file")]);
        write_files(&destination, &[("old.txt", "old"), ("Sub/c.txt", "c")]);
        let mut queue = TaskQueue::new(false);
        queue.add(Task::new(TaskAction::AddFile, source, destination.clone()));

        // When
        let report = queue.run(&LocalFileStore::new());

        // Then
        assert!(report.failures.is_empty());
        assert!(destination.is_file());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "now a file");
    }

    #[test]
    fn test_delete_absent_file() {
        // Given
        let tmpdir_ = tmpdir();
        let mut queue = TaskQueue::new(false);
        queue.add(Task::new(
            TaskAction::DeleteFile,
            tmpdir_.join("a").join("gone.txt"),
            tmpdir_.join("b").join("gone.txt"),
        ));

        // When
        let report = queue.run(&LocalFileStore::new());

        // Then
        assert!(report.failures.is_empty());
        assert_eq!(report.applied.len(), 1);
    }

    #[test]
    fn test_translate_then_run_add_file() {
        // Given
        let tmpdir_ = tmpdir();
        let primary = tmpdir_.join("a");
        let secondary = tmpdir_.join("b");
        write_files(&primary, &[("Folder/Sub/f.txt", "exact content")]);
        fs::create_dir_all(&secondary).unwrap();
        let translator = ChangeTranslator::new(primary.clone(), secondary.clone());
        let change = Change::FileAdded(primary.join("Folder").join("Sub").join("f.txt"));
        let mut queue = TaskQueue::new(false);

        // When
        queue.add(translator.translate(&change).unwrap().unwrap());
        let report = queue.run(&LocalFileStore::new());

        // Then
        assert!(report.failures.is_empty());
        assert_eq!(
            fs::read_to_string(secondary.join("Folder").join("Sub").join("f.txt")).unwrap(),
            "exact content"
        );
        assert_eq!(
            disk_files(&secondary),
            vec!["Folder", "Folder/Sub", "Folder/Sub/f.txt"]
        );
    }
}
