use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use fsmirror_core::{
    change::Change,
    error::{DiffError, InitialMirrorError, RunnerError, ScanError},
    snapshot::{Snapshot, SnapshotMap},
    store::{EntryMetadata, FileStore, LocalFileStore},
    task::{Task, TaskAction},
    types::Side,
};
use strum_macros::Display;

use crate::{
    context::Context,
    diff::SnapshotDiff,
    mirror::InitialMirror,
    queue::TaskQueue,
    scanner::{Scan, Scanner},
    state::SnapshotStore,
    translate::ChangeTranslator,
};

// Maximum delay between two stop signal checks while waiting next cycle
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SyncState {
    Initializing,
    InitialMirror,
    Polling,
    Stopped,
}

#[derive(Debug)]
pub enum Activity {
    Started,
    Mirrored(u64),
    CycleFinished(CycleReport),
    Stopped,
}

#[derive(Debug)]
pub struct CycleReport {
    pub side: Side,
    pub changes: Vec<Change>,
    pub applied: Vec<Task>,
    pub failures: Vec<String>,
}

impl CycleReport {
    fn empty(side: Side) -> Self {
        Self {
            side,
            changes: vec![],
            applied: vec![],
            failures: vec![],
        }
    }
}

pub struct Runner {
    context: Context,
    store: Box<dyn FileStore>,
    stop_signal: Arc<AtomicBool>,
    activity_sender: Option<Sender<Activity>>,
    state: SyncState,
    primary: SnapshotStore,
    secondary: SnapshotStore,
    queue: TaskQueue,
}

impl Runner {
    pub fn new(
        context: Context,
        store: Box<dyn FileStore>,
        stop_signal: Arc<AtomicBool>,
        activity_sender: Option<Sender<Activity>>,
    ) -> Self {
        let primary = SnapshotStore::new(Side::Primary, context.primary.clone());
        let secondary = SnapshotStore::new(Side::Secondary, context.secondary.clone());
        let queue = TaskQueue::new(context.propagate_directories);

        Self {
            context,
            store,
            stop_signal,
            activity_sender,
            state: SyncState::Initializing,
            primary,
            secondary,
            queue,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn snapshots(&self, side: Side) -> &SnapshotStore {
        match side {
            Side::Primary => &self.primary,
            Side::Secondary => &self.secondary,
        }
    }

    fn snapshots_mut(&mut self, side: Side) -> &mut SnapshotStore {
        match side {
            Side::Primary => &mut self.primary,
            Side::Secondary => &mut self.secondary,
        }
    }

    fn set_state(&mut self, state: SyncState) {
        log::info!("{} -> {}", self.state, state);
        self.state = state;
    }

    fn is_stopped(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    fn notify(&self, activity: Activity) {
        if let Some(activity_sender) = &self.activity_sender {
            if activity_sender.send(activity).is_err() {
                log::debug!("Activity receiver is gone");
            }
        }
    }

    fn scanner(&self) -> Scanner<'_> {
        Scanner::new(self.store.as_ref(), self.stop_signal.clone())
            .with_threads(self.context.scan_threads)
    }

    /// Take primary baseline snapshots, replace secondary content by primary
    /// content and take secondary baseline snapshots. Return copied files
    /// count.
    pub fn initial_mirror(&mut self) -> Result<u64, RunnerError> {
        self.set_state(SyncState::InitialMirror);

        // Primary writes made during the copy are seen by the first cycle
        let scan = self
            .scanner()
            .scan(&self.context.primary)
            .map_err(InitialMirrorError::from)?;
        let snapshots = with_skipped_subtrees(&self.primary, scan);
        self.primary.replace(snapshots);

        let copied = InitialMirror::new(
            self.store.as_ref(),
            self.context.primary.clone(),
            self.context.secondary.clone(),
        )
        .run()?;
        log::info!(
            "Mirrored {} files from {} into {}",
            copied,
            self.context.primary.display(),
            self.context.secondary.display()
        );

        let scan = self
            .scanner()
            .scan(&self.context.secondary)
            .map_err(InitialMirrorError::from)?;
        let snapshots = with_skipped_subtrees(&self.secondary, scan);
        self.secondary.replace(snapshots);

        Ok(copied)
    }

    /// Run one poll cycle on each watched side
    pub fn poll(&mut self) -> Result<Vec<CycleReport>, RunnerError> {
        let mut reports = vec![];

        for side in self.context.watched_sides() {
            if self.is_stopped() {
                break;
            }
            reports.push(self.poll_side(side)?);
        }

        Ok(reports)
    }

    /// Scan `side`, diff against its known snapshots and apply changes on the
    /// other side
    pub fn poll_side(&mut self, side: Side) -> Result<CycleReport, RunnerError> {
        let watched_root = self.context.root(side).to_path_buf();
        let target_root = self.context.root(side.other()).to_path_buf();

        let scan = match self.scanner().scan(&watched_root) {
            Ok(scan) => scan,
            Err(ScanError::Interrupted(_)) => {
                log::info!("[{}] Scan interrupted (on stop signal)", side);
                return Ok(CycleReport::empty(side));
            }
            Err(error) => {
                log::error!("[{}] Skip cycle: {}", side, error);
                return Ok(CycleReport::empty(side));
            }
        };

        let (changes, snapshots) = self.changes(side, scan)?;
        let translator = ChangeTranslator::new(watched_root, target_root);
        let mut tasks = vec![];
        for change in &changes {
            log::info!("[{}] {}", side, change);
            if let Some(task) = translator.translate(change)? {
                tasks.push(task);
            }
        }
        // Stable: removals first, each group keeps its parent-first order
        tasks.sort_by_key(|task| !task.action().is_removal());
        for task in tasks {
            self.queue.add(task);
        }
        let queue_report = self.queue.run(self.store.as_ref());
        self.snapshots_mut(side).replace(snapshots);

        // Prevent applied tasks to be seen as changes of the other side
        if self.context.watch_secondary {
            for task in &queue_report.applied {
                self.record(side.other(), task);
            }
        }

        let report = CycleReport {
            side,
            changes,
            applied: queue_report.applied,
            failures: queue_report
                .failures
                .iter()
                .map(|error| error.to_string())
                .collect(),
        };
        log::debug!(
            "[{}] Cycle finished: {} changes, {} applied tasks, {} failed tasks",
            side,
            report.changes.len(),
            report.applied.len(),
            report.failures.len()
        );

        Ok(report)
    }

    fn changes(&self, side: Side, scan: Scan) -> Result<(Vec<Change>, SnapshotMap), DiffError> {
        let previous = self.snapshots(side);
        let snapshots = with_skipped_subtrees(previous, scan);

        if previous.is_empty() {
            log::info!(
                "[{}] First observation of {} ({} directories), used as baseline",
                previous.side(),
                previous.root().display(),
                snapshots.len()
            );
            return Ok((vec![], snapshots));
        }

        let mut changes = vec![];
        for (path, old) in previous.snapshots() {
            changes.extend(SnapshotDiff::new(old, snapshots.get(path))?.changes());
        }
        // Directories created since last cycle are compared to nothing
        for (path, new) in &snapshots {
            if !previous.contains(path) {
                let empty = Snapshot::empty(path.clone());
                changes.extend(SnapshotDiff::new(&empty, Some(new))?.changes());
            }
        }

        // A removed directory is reported by its parent and by itself
        let mut seen = HashSet::new();
        changes.retain(|change| seen.insert(change.clone()));

        Ok((changes, snapshots))
    }

    /// Report effect of an applied task into `side` snapshots
    fn record(&mut self, side: Side, task: &Task) {
        // Not observed yet, next scan of this side is a baseline
        if self.snapshots(side).is_empty() {
            return;
        }

        let destination = task.destination();
        match task.action() {
            TaskAction::AddFile | TaskAction::UpdateFile => {
                match self.store.stat(destination) {
                    Ok(Some(EntryMetadata::File(entry))) => {
                        let snapshots = self.snapshots_mut(side);
                        // The file may have replaced a directory
                        snapshots.forget_directory(destination);
                        snapshots.record_file(destination, entry);
                    }
                    Ok(other) => log::debug!(
                        "{} is not a file after copy ({:?})",
                        destination.display(),
                        other
                    ),
                    Err(error) => log::debug!(
                        "Unable to record {}: {}",
                        destination.display(),
                        error
                    ),
                }
            }
            TaskAction::DeleteFile => self.snapshots_mut(side).forget_file(destination),
            TaskAction::AddDirectory if self.context.propagate_directories => {
                self.snapshots_mut(side).record_directory(destination)
            }
            TaskAction::DeleteDirectory if self.context.propagate_directories => {
                self.snapshots_mut(side).forget_directory(destination)
            }
            TaskAction::AddDirectory | TaskAction::DeleteDirectory => {}
        }
    }

    /// Sleep during poll interval. Return false if stop signal is received
    /// meanwhile.
    fn wait(&self) -> bool {
        let deadline = Instant::now() + self.context.poll_interval;

        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(STOP_CHECK_INTERVAL));
        }
    }

    fn poll_forever(&mut self) -> Result<(), RunnerError> {
        self.set_state(SyncState::Polling);

        while !self.is_stopped() {
            for report in self.poll()? {
                self.notify(Activity::CycleFinished(report));
            }
            if !self.wait() {
                log::info!("Finished polling (on stop signal)");
                break;
            }
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<(), RunnerError> {
        log::info!(
            "Prepare to mirror {} into {}",
            self.context.primary.display(),
            self.context.secondary.display()
        );
        self.notify(Activity::Started);

        let result = self.initial_mirror().and_then(|copied| {
            self.notify(Activity::Mirrored(copied));
            if self.context.exit_after_sync {
                log::info!("Synchronization finished");
                Ok(())
            } else {
                self.poll_forever()
            }
        });

        self.set_state(SyncState::Stopped);
        self.notify(Activity::Stopped);
        result
    }
}

/// Fresh snapshots completed with previously known snapshots of subtrees which
/// couldn't be scanned this time, so they aren't seen as removed
fn with_skipped_subtrees(previous: &SnapshotStore, scan: Scan) -> SnapshotMap {
    let kept = previous
        .snapshots()
        .iter()
        .filter(|(path, _)| !scan.snapshots.contains_key(*path) && scan.is_skipped(path))
        .map(|(path, snapshot)| (path.clone(), snapshot.clone()))
        .collect::<Vec<_>>();

    let mut snapshots = scan.snapshots;
    snapshots.extend(kept);
    snapshots
}

pub fn run(
    context: Context,
    stop_signal: Arc<AtomicBool>,
    activity_sender: Option<Sender<Activity>>,
) -> Result<(), RunnerError> {
    let mut runner = Runner::new(
        context,
        Box::new(LocalFileStore::new()),
        stop_signal,
        activity_sender,
    );
    runner.run()
}
