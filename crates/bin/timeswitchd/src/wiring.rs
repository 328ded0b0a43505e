//! Assembly of the command processor and startup discovery of schedules.

use std::sync::Arc;

use timeswitch_adapter_jobs_tokio::TokioJobScheduler;
use timeswitch_adapter_state_memory::InMemoryStateStore;
use timeswitch_adapter_suncalc::SunCalcCalculator;
use timeswitch_app::action_runner::ActionRunner;
use timeswitch_app::ports::{JobScheduler, SystemClock};
use timeswitch_app::schedulers::SchedulerContext;
use timeswitch_app::services::CommandProcessor;
use timeswitch_domain::codec::Registry;
use timeswitch_domain::error::CodecError;
use timeswitch_domain::id::StateId;
use timeswitch_domain::value::StateValue;

use crate::config::Config;

/// State service the daemon runs on, shared with `main` for snapshots.
pub type States = Arc<InMemoryStateStore>;

/// Processor driving `states`, with timers on `jobs`.
///
/// # Errors
///
/// Returns [`CodecError`] if the default codec registry is incomplete.
pub fn build_processor(
    config: &Config,
    states: States,
    jobs: Arc<dyn JobScheduler>,
) -> Result<Arc<CommandProcessor<States>>, CodecError> {
    let context = SchedulerContext {
        jobs,
        runner: Arc::new(ActionRunner::new(states)),
        astro: Arc::new(SunCalcCalculator::new()),
        clock: Arc::new(SystemClock),
        coordinates: config.coordinates(),
        one_time_grace: config.one_time_grace(),
    };
    CommandProcessor::new(context, Registry::default(), config.retry_delay())
}

/// Processor on a fresh [`TokioJobScheduler`].
///
/// # Errors
///
/// See [`build_processor`].
pub fn build_default_processor(
    config: &Config,
    states: States,
) -> Result<(Arc<CommandProcessor<States>>, Arc<TokioJobScheduler>), CodecError> {
    let jobs = Arc::new(TokioJobScheduler::new());
    let processor = build_processor(config, states, jobs.clone())?;
    Ok((processor, jobs))
}

/// Hand every schedule stored under `prefix` to `processor`.
///
/// A schedule lives in `<prefix><n>.data` as JSON text; it is armed when
/// `<prefix><n>.enabled` holds `true`. Schedules that fail to load are
/// logged and skipped. Returns how many were loaded.
pub async fn load_schedules(
    processor: &CommandProcessor<States>,
    states: &InMemoryStateStore,
    prefix: &str,
) -> usize {
    let mut loaded = 0;
    for (data_id, stored) in states.with_prefix(prefix) {
        let Some(base) = data_id.as_str().strip_suffix(".data") else {
            continue;
        };
        let StateValue::String(data) = stored.val else {
            tracing::warn!(%data_id, "schedule data is not a string, skipping");
            continue;
        };
        let enabled = StateId::new(format!("{base}.enabled"))
            .ok()
            .and_then(|id| states.get(&id))
            .is_some_and(|state| state.val == StateValue::Boolean(true));
        match processor.add_schedule(data_id.clone(), &data, enabled).await {
            Ok(()) => loaded += 1,
            Err(error) => {
                tracing::warn!(%data_id, error = %error_chain(&error), "failed to load schedule");
            }
        }
    }
    loaded
}

/// `error: cause: cause` on one line.
#[must_use]
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}
