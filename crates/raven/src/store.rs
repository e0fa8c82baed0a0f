// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Durable FIFO queue of serialized events awaiting delivery.
//!
//! Reports captured while the process is going down are appended here and
//! replayed by an explicit flush. A flush clears the whole queue whatever
//! the individual outcomes were, so a report whose replay fails is lost.

use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{RavenSdkError, Result};
use crate::transport::Transport;

/// Name of the persisted list.
pub const QUEUE_KEY: &str = "raven.pending-reports";

/// A serialized event payload waiting for a flush pass.
pub type PendingReport = String;

/// Storage for the ordered list of pending reports.
///
/// Implementations must be synchronous: enqueue runs inside the panic hook.
pub trait QueueBackend: Send {
	fn load(&self) -> Result<Vec<PendingReport>>;
	fn save(&mut self, reports: &[PendingReport]) -> Result<()>;

	/// Called when [`load`](Self::load) reported a corrupt list; afterwards
	/// the backend must load as empty.
	fn discard_corrupt(&mut self) -> Result<()> {
		self.save(&[])
	}
}

/// Keeps the list in process memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryQueue {
	reports: Vec<PendingReport>,
}

impl MemoryQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_reports(reports: Vec<PendingReport>) -> Self {
		Self { reports }
	}
}

impl QueueBackend for MemoryQueue {
	fn load(&self) -> Result<Vec<PendingReport>> {
		Ok(self.reports.clone())
	}

	fn save(&mut self, reports: &[PendingReport]) -> Result<()> {
		self.reports = reports.to_vec();
		Ok(())
	}
}

/// Keeps the list as a JSON array of strings in `<dir>/raven.pending-reports.json`.
#[derive(Debug, Clone)]
pub struct FileQueue {
	dir: PathBuf,
}

impl FileQueue {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path(&self) -> PathBuf {
		self.dir.join(format!("{QUEUE_KEY}.json"))
	}

	fn tmp_path(&self) -> PathBuf {
		self.dir.join(format!("{QUEUE_KEY}.json.tmp"))
	}
}

impl QueueBackend for FileQueue {
	fn load(&self) -> Result<Vec<PendingReport>> {
		let path = self.path();
		let contents = match std::fs::read_to_string(&path) {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!(path = %path.display(), "queue file not found");
				return Ok(Vec::new());
			}
			Err(e) => return Err(e.into()),
		};

		serde_json::from_str(&contents)
			.map_err(|e| RavenSdkError::CorruptQueue(format!("{}: {e}", path.display())))
	}

	fn save(&mut self, reports: &[PendingReport]) -> Result<()> {
		std::fs::create_dir_all(&self.dir)?;

		let path = self.path();
		let tmp_path = self.tmp_path();
		let json = serde_json::to_string(reports)?;

		let mut file = File::create(&tmp_path)?;
		file.write_all(json.as_bytes())?;
		file.sync_all()?;
		drop(file);
		std::fs::rename(&tmp_path, &path)?;

		debug!(path = %path.display(), count = reports.len(), "saved queue to disk");
		Ok(())
	}

	/// Moves the unreadable file to `raven.pending-reports.json.corrupt`.
	fn discard_corrupt(&mut self) -> Result<()> {
		let path = self.path();
		let corrupt_path = self.dir.join(format!("{QUEUE_KEY}.json.corrupt"));
		std::fs::rename(&path, &corrupt_path)?;
		warn!(
			path = %path.display(),
			moved_to = %corrupt_path.display(),
			"moved corrupt queue file aside"
		);
		Ok(())
	}
}

/// Result of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
	pub attempted: usize,
	pub failed: usize,
}

thread_local! {
	/// Address of the store whose queue lock this thread holds, or 0.
	static HELD_QUEUE: Cell<usize> = const { Cell::new(0) };
}

/// The offline queue shared by a client and its panic hook.
///
/// The queue lock is only held for a single load or load-and-save, never
/// while a transport runs. A thread that re-enters the store while holding
/// the lock (a panic inside a backend, for instance) gets
/// [`RavenSdkError::QueueBusy`] instead of deadlocking.
pub struct OfflineStore {
	backend: Mutex<Box<dyn QueueBackend>>,
	flushing: Mutex<()>,
}

impl std::fmt::Debug for OfflineStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OfflineStore").finish_non_exhaustive()
	}
}

impl OfflineStore {
	pub fn new(backend: impl QueueBackend + 'static) -> Self {
		Self {
			backend: Mutex::new(Box::new(backend)),
			flushing: Mutex::new(()),
		}
	}

	pub fn in_memory() -> Self {
		Self::new(MemoryQueue::new())
	}

	pub fn file(dir: impl Into<PathBuf>) -> Self {
		Self::new(FileQueue::new(dir))
	}

	/// Appends a payload to the end of the queue.
	pub fn enqueue(&self, payload: PendingReport) -> Result<()> {
		let mut queue = self.lock()?;
		let mut reports = queue.load_or_recover()?;
		reports.push(payload);
		queue.save(&reports)?;
		let pending = reports.len();
		drop(queue);

		debug!(pending, "report queued");
		Ok(())
	}

	/// Replays every queued payload in enqueue order, then removes them all,
	/// whatever the individual outcomes.
	///
	/// Reports enqueued while the replay runs stay queued for the next pass.
	pub fn flush_all(&self, transport: &dyn Transport) -> Result<FlushSummary> {
		let _flushing = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);

		let reports = self.lock()?.load_or_recover()?;
		if reports.is_empty() {
			return Ok(FlushSummary::default());
		}
		let replayed = reports.len();

		let mut summary = FlushSummary::default();
		for payload in reports {
			summary.attempted += 1;
			if let Err(e) = transport.send_raw(payload) {
				summary.failed += 1;
				warn!(error = %e, "dropping pending report after failed replay");
			}
		}

		let mut queue = self.lock()?;
		let mut remaining = queue.load_or_recover()?;
		remaining.drain(..replayed.min(remaining.len()));
		queue.save(&remaining)?;
		drop(queue);

		info!(
			attempted = summary.attempted,
			failed = summary.failed,
			"flushed pending reports"
		);
		Ok(summary)
	}

	pub fn len(&self) -> Result<usize> {
		Ok(self.lock()?.load_or_recover()?.len())
	}

	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}

	// A poisoned lock is recovered: the panic hook may run after another
	// thread panicked while holding it.
	fn lock(&self) -> Result<QueueGuard<'_>> {
		let address = self as *const Self as usize;
		if HELD_QUEUE.with(Cell::get) == address {
			return Err(RavenSdkError::QueueBusy);
		}

		let backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
		HELD_QUEUE.with(|held| held.set(address));
		Ok(QueueGuard { backend })
	}
}

struct QueueGuard<'a> {
	backend: MutexGuard<'a, Box<dyn QueueBackend>>,
}

impl QueueGuard<'_> {
	/// Loads the list, replacing an unreadable one with an empty list.
	fn load_or_recover(&mut self) -> Result<Vec<PendingReport>> {
		match self.backend.load() {
			Err(RavenSdkError::CorruptQueue(reason)) => {
				warn!(reason = %reason, "discarding corrupt offline queue");
				self.backend.discard_corrupt()?;
				Ok(Vec::new())
			}
			other => other,
		}
	}

	fn save(&mut self, reports: &[PendingReport]) -> Result<()> {
		self.backend.save(reports)
	}
}

impl Drop for QueueGuard<'_> {
	fn drop(&mut self) {
		HELD_QUEUE.with(|held| held.set(0));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::Delivery;
	use std::sync::Arc;
	use tempfile::TempDir;

	#[derive(Default)]
	struct RecordingTransport {
		sent: Mutex<Vec<String>>,
		fail_on: Option<&'static str>,
	}

	impl Transport for RecordingTransport {
		fn send_raw(&self, payload: String) -> Result<Delivery> {
			let fail = self.fail_on == Some(payload.as_str());
			self.sent.lock().unwrap().push(payload);
			if fail {
				return Err(RavenSdkError::MissingCredentials);
			}
			Ok(Delivery::PrintedLocally)
		}
	}

	#[test]
	fn flush_replays_in_enqueue_order() {
		let store = OfflineStore::in_memory();
		store.enqueue("a".to_string()).unwrap();
		store.enqueue("b".to_string()).unwrap();
		store.enqueue("c".to_string()).unwrap();

		let transport = RecordingTransport::default();
		let summary = store.flush_all(&transport).unwrap();

		assert_eq!(*transport.sent.lock().unwrap(), vec!["a", "b", "c"]);
		assert_eq!(
			summary,
			FlushSummary {
				attempted: 3,
				failed: 0
			}
		);
		assert!(store.is_empty().unwrap());
	}

	#[test]
	fn failed_replay_is_still_removed() {
		let store = OfflineStore::in_memory();
		store.enqueue("ok".to_string()).unwrap();
		store.enqueue("bad".to_string()).unwrap();

		let transport = RecordingTransport {
			fail_on: Some("bad"),
			..Default::default()
		};
		let summary = store.flush_all(&transport).unwrap();

		assert_eq!(summary.failed, 1);
		assert!(store.is_empty().unwrap());

		let second = RecordingTransport::default();
		assert_eq!(store.flush_all(&second).unwrap(), FlushSummary::default());
		assert!(second.sent.lock().unwrap().is_empty());
	}

	#[test]
	fn enqueue_does_not_flush() {
		let store = OfflineStore::in_memory();
		store.enqueue("a".to_string()).unwrap();
		assert_eq!(store.len().unwrap(), 1);
	}

	#[test]
	fn file_queue_missing_file_is_empty() {
		let tmp = TempDir::new().unwrap();
		let queue = FileQueue::new(tmp.path().join("nested"));
		assert!(queue.load().unwrap().is_empty());
	}

	#[test]
	fn file_queue_persists_across_instances() {
		let tmp = TempDir::new().unwrap();
		let store = OfflineStore::file(tmp.path());
		store.enqueue("first".to_string()).unwrap();
		store.enqueue("second".to_string()).unwrap();
		drop(store);

		let queue = FileQueue::new(tmp.path());
		assert_eq!(queue.load().unwrap(), vec!["first", "second"]);
		assert!(!tmp.path().join("raven.pending-reports.json.tmp").exists());

		let on_disk = std::fs::read_to_string(queue.path()).unwrap();
		assert_eq!(on_disk, r#"["first","second"]"#);
	}

	#[test]
	fn file_queue_reports_corruption() {
		let tmp = TempDir::new().unwrap();
		let queue = FileQueue::new(tmp.path());
		std::fs::write(queue.path(), "not json").unwrap();

		assert!(matches!(queue.load(), Err(RavenSdkError::CorruptQueue(_))));
	}

	#[test]
	fn flush_clears_file() {
		let tmp = TempDir::new().unwrap();
		let store = OfflineStore::file(tmp.path());
		store.enqueue("x".to_string()).unwrap();

		store.flush_all(&RecordingTransport::default()).unwrap();

		let queue = FileQueue::new(tmp.path());
		assert!(queue.load().unwrap().is_empty());
	}

	#[test]
	fn poisoned_lock_is_recovered() {
		let store = Arc::new(OfflineStore::in_memory());
		let clone = store.clone();
		let _ = std::thread::spawn(move || {
			let _guard = clone.backend.lock().unwrap();
			panic!("poison");
		})
		.join();

		store.enqueue("after".to_string()).unwrap();
		assert_eq!(store.len().unwrap(), 1);
	}

	#[test]
	fn corrupt_file_is_moved_aside_on_enqueue() {
		let tmp = TempDir::new().unwrap();
		let queue = FileQueue::new(tmp.path());
		std::fs::write(queue.path(), r#"["{}""#).unwrap();

		let store = OfflineStore::file(tmp.path());
		store.enqueue("fresh".to_string()).unwrap();

		assert_eq!(queue.load().unwrap(), vec!["fresh"]);
		let aside = tmp.path().join("raven.pending-reports.json.corrupt");
		assert_eq!(std::fs::read_to_string(aside).unwrap(), r#"["{}""#);
	}

	#[test]
	fn corrupt_file_does_not_block_flush() {
		let tmp = TempDir::new().unwrap();
		std::fs::write(FileQueue::new(tmp.path()).path(), "not json").unwrap();
		let store = OfflineStore::file(tmp.path());

		let transport = RecordingTransport::default();
		assert_eq!(store.flush_all(&transport).unwrap(), FlushSummary::default());
		assert!(store.is_empty().unwrap());

		store.enqueue("next".to_string()).unwrap();
		assert_eq!(store.flush_all(&transport).unwrap().attempted, 1);
		assert_eq!(*transport.sent.lock().unwrap(), vec!["next"]);
	}

	/// Enqueues into the store it is replaying from, as a panic hook would
	/// when the transport panics.
	struct EnqueueingTransport {
		store: Arc<OfflineStore>,
		sent: Mutex<Vec<String>>,
	}

	impl Transport for EnqueueingTransport {
		fn send_raw(&self, payload: String) -> Result<Delivery> {
			self.store.enqueue(format!("during-{payload}")).unwrap();
			self.sent.lock().unwrap().push(payload);
			Ok(Delivery::PrintedLocally)
		}
	}

	#[test]
	fn enqueue_from_inside_a_replay_survives_the_clear() {
		let store = Arc::new(OfflineStore::in_memory());
		store.enqueue("a".to_string()).unwrap();
		store.enqueue("b".to_string()).unwrap();

		let transport = EnqueueingTransport {
			store: store.clone(),
			sent: Mutex::new(Vec::new()),
		};
		let summary = store.flush_all(&transport).unwrap();

		assert_eq!(summary.attempted, 2);
		assert_eq!(*transport.sent.lock().unwrap(), vec!["a", "b"]);
		let remaining = RecordingTransport::default();
		store.flush_all(&remaining).unwrap();
		assert_eq!(*remaining.sent.lock().unwrap(), vec!["during-a", "during-b"]);
	}

	#[test]
	fn reentering_a_held_lock_is_refused() {
		let store = OfflineStore::in_memory();
		let guard = store.lock().unwrap();

		assert!(matches!(
			store.enqueue("x".to_string()),
			Err(RavenSdkError::QueueBusy)
		));

		drop(guard);
		store.enqueue("x".to_string()).unwrap();
		assert_eq!(store.len().unwrap(), 1);
	}

	const WRITERS: usize = 4;
	const PER_WRITER: usize = 25;

	fn concurrent_enqueue_and_flush(store: OfflineStore) {
		let store = Arc::new(store);
		let transport = Arc::new(RecordingTransport::default());

		let writers: Vec<_> = (0..WRITERS)
			.map(|writer| {
				let store = store.clone();
				std::thread::spawn(move || {
					for seq in 0..PER_WRITER {
						store.enqueue(format!("{writer}-{seq}")).unwrap();
					}
				})
			})
			.collect();

		let flusher = {
			let store = store.clone();
			let transport = transport.clone();
			std::thread::spawn(move || {
				for _ in 0..20 {
					store.flush_all(transport.as_ref()).unwrap();
					std::thread::yield_now();
				}
			})
		};

		for writer in writers {
			writer.join().unwrap();
		}
		flusher.join().unwrap();

		let mut seen: Vec<String> = transport.sent.lock().unwrap().clone();
		let leftover = RecordingTransport::default();
		store.flush_all(&leftover).unwrap();
		seen.extend(leftover.sent.lock().unwrap().iter().cloned());

		assert_eq!(seen.len(), WRITERS * PER_WRITER);
		for writer in 0..WRITERS {
			let sequence: Vec<usize> = seen
				.iter()
				.filter_map(|payload| payload.split_once('-'))
				.filter(|(w, _)| w.parse::<usize>().unwrap() == writer)
				.map(|(_, seq)| seq.parse().unwrap())
				.collect();
			assert_eq!(sequence, (0..PER_WRITER).collect::<Vec<_>>());
		}
	}

	#[test]
	fn concurrent_enqueue_and_flush_in_memory() {
		concurrent_enqueue_and_flush(OfflineStore::in_memory());
	}

	#[test]
	fn concurrent_enqueue_and_flush_on_disk() {
		let tmp = TempDir::new().unwrap();
		concurrent_enqueue_and_flush(OfflineStore::file(tmp.path()));
	}
}
