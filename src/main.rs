/*!
 * Agent Sync - Demonstration Entry Point
 *
 * Runs the two-agent handshake: a main agent and a worker share one region
 * holding a mutex, a condition variable and a small record, and take turns
 * through it. The order in which they step is printed at the end.
 *
 * Failures come back as `miette` reports, so an error exits with its
 * diagnostic code and help text rendered.
 */

use agent_sync::{
    init_tracing, monitoring::span_agent, AtomicWord, ConditionVariable, Mutex, SharedPrimitive,
    SharedRegion, SpinWait, SyncConfig, SyncError, SyncResult,
};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tracing::info;

const MUTEX_OFFSET: usize = 0;
const CONDVAR_OFFSET: usize = 4;
const READY_OFFSET: usize = 8;
const PROCESSED_OFFSET: usize = 12;
const STEP_COUNT_OFFSET: usize = 16;
const STEPS_OFFSET: usize = 20;

const STEP_NAMES: [&str; 8] = [
    "main1", "worker1", "worker2", "main2", "worker3", "main3", "main4", "main5",
];
const REGION_LEN: usize = STEPS_OFFSET + STEP_NAMES.len() * 4;

/// Handles one agent holds onto the shared record
struct Record {
    mutex: Mutex,
    condvar: ConditionVariable,
    ready: AtomicWord,
    processed: AtomicWord,
    step_count: AtomicWord,
    steps: SharedRegion,
}

impl Record {
    /// Attach to the record in `region`, as each agent does on startup
    fn attach(region: &SharedRegion) -> SyncResult<Self> {
        Ok(Self {
            mutex: Mutex::attach(region, MUTEX_OFFSET)?.with_config(SyncConfig::from_env()),
            condvar: ConditionVariable::attach(region, CONDVAR_OFFSET)?,
            ready: region.word(READY_OFFSET)?,
            processed: region.word(PROCESSED_OFFSET)?,
            step_count: region.word(STEP_COUNT_OFFSET)?,
            steps: region.clone(),
        })
    }

    fn push(&self, step: &str) -> SyncResult<()> {
        let code = STEP_NAMES
            .iter()
            .position(|name| *name == step)
            .ok_or_else(|| SyncError::InvalidArgument(format!("unknown step {step}")))?;
        let slot = self.step_count.fetch_add(1) as usize;
        if slot >= STEP_NAMES.len() {
            return Err(SyncError::CapacityExceeded("step log is full".into()));
        }
        self.steps
            .word(STEPS_OFFSET + slot * 4)?
            .store(code as u32 + 1, Ordering::Release);
        info!(step, "step recorded");
        Ok(())
    }

    fn contains(&self, step: &str) -> bool {
        self.steps().iter().any(|s| *s == step)
    }

    fn steps(&self) -> Vec<&'static str> {
        let count = (self.step_count.load(Ordering::Acquire) as usize).min(STEP_NAMES.len());
        (0..count)
            .filter_map(|slot| self.steps.word(STEPS_OFFSET + slot * 4).ok())
            .map(|word| word.load(Ordering::Acquire) as usize)
            .filter(|&code| code > 0)
            .map(|code| STEP_NAMES[code - 1])
            .collect()
    }
}

fn worker(region: SharedRegion) -> SyncResult<()> {
    let _span = span_agent("worker").entered();
    let record = Record::attach(&region)?;

    record.push("worker1")?;
    let mut guard = record.mutex.lock();
    record.push("worker2")?;

    record.condvar.wait_until(&mut guard, None, || {
        record.ready.load(Ordering::Acquire) == 1
    });
    record.push("worker3")?;
    record.processed.store(1, Ordering::Release);

    guard.unlock();
    record.condvar.notify_one();
    Ok(())
}

fn main() -> miette::Result<()> {
    init_tracing();
    let _span = span_agent("main").entered();

    let region = SharedRegion::new(REGION_LEN);
    let record = Record::attach(&region)?;
    record.push("main1")?;

    let handle = {
        let region = region.clone();
        thread::Builder::new()
            .name("worker".into())
            .spawn(move || worker(region))
            .map_err(|e| SyncError::InvalidState(format!("failed to spawn worker: {e}")))?
    };

    // Let the worker take the lock first
    let mut spin = SpinWait::new();
    spin.spin_until(|| record.contains("worker2"), Some(Duration::from_secs(5)));

    {
        let _guard = record.mutex.lock();
        record.push("main2")?;
        record.ready.store(1, Ordering::Release);
    }
    record.condvar.notify_one();

    {
        let mut guard = record.mutex.lock();
        record.condvar.wait_until(&mut guard, None, || {
            record.processed.load(Ordering::Acquire) == 1
        });
        record.push("main3")?;
        record.push("main4")?;
    }
    record.push("main5")?;

    handle
        .join()
        .map_err(|_| SyncError::InvalidState("worker panicked".into()))??;

    info!(steps = ?record.steps(), "handshake complete");
    println!("{:?}", record.steps());
    Ok(())
}
