//! Command processor: owns every managed schedule and applies commands to
//! them one at a time.
//!
//! Only one command runs at once. A command arriving while another is in
//! flight does not queue: it sleeps for `retry_delay` and tries again, so
//! concurrent commands on the same schedule are applied in no guaranteed
//! order. After a successful command the schedule is serialized and written
//! back to its data state.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;

use timeswitch_domain::action::{Action, ActionSlot};
use timeswitch_domain::codec::Registry;
use timeswitch_domain::error::{CodecError, CommandError, TimeSwitchError};
use timeswitch_domain::id::StateId;
use timeswitch_domain::trigger::{AstroTime, AstroTrigger, TimeTrigger, Trigger, TriggerType};
use timeswitch_domain::value::StateValue;
use timeswitch_domain::weekday::Weekdays;

use crate::command::{Command, CommandRequest};
use crate::managed_schedule::ManagedSchedule;
use crate::ports::StateService;
use crate::schedulers::{ExpiryHook, SchedulerContext};

/// Default delay before a command that found the processor busy is retried.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Applies [`Command`]s to the schedules it owns.
pub struct CommandProcessor<S> {
    this: Weak<Self>,
    context: SchedulerContext<S>,
    registry: Registry,
    references: Registry,
    schedules: Mutex<HashMap<StateId, ManagedSchedule>>,
    retry_delay: Duration,
}

impl<S: StateService + 'static> CommandProcessor<S> {
    /// Create a processor without schedules.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::NoCodecFound`] when `registry` has no on/off
    /// action codec to wrap with action references.
    pub fn new(
        context: SchedulerContext<S>,
        registry: Registry,
        retry_delay: Duration,
    ) -> Result<Arc<Self>, CodecError> {
        let references = registry.with_action_references()?;
        Ok(Arc::new_cyclic(|this| Self {
            this: this.clone(),
            context,
            registry,
            references,
            schedules: Mutex::new(HashMap::new()),
            retry_delay,
        }))
    }

    fn states(&self) -> &S {
        self.context.runner.states()
    }

    /// Take over the schedule serialized in `data`, stored under `data_id`.
    /// A schedule already held under `data_id` is disarmed and replaced.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed data, or a scheduler error when
    /// an enabled schedule cannot be armed.
    #[tracing::instrument(skip(self, data))]
    pub async fn add_schedule(
        &self,
        data_id: StateId,
        data: &str,
        enabled: bool,
    ) -> Result<(), TimeSwitchError> {
        let mut schedule = self.registry.deserialize_schedule_from_str(data)?;
        schedule.set_enabled(enabled);
        let scheduler = self
            .context
            .universal_scheduler(self.expiry_hook(data_id.clone()));
        let managed = ManagedSchedule::new(schedule, Box::new(scheduler))?;
        let mut schedules = self.schedules.lock().await;
        if let Some(mut previous) = schedules.insert(data_id, managed) {
            previous.destroy();
        }
        tracing::info!("schedule loaded");
        Ok(())
    }

    /// Disarm and forget the schedule under `data_id`.
    /// Returns whether there was one.
    pub async fn remove_schedule(&self, data_id: &StateId) -> bool {
        let Some(mut managed) = self.schedules.lock().await.remove(data_id) else {
            return false;
        };
        managed.destroy();
        tracing::info!(data_id = %data_id, "schedule removed");
        true
    }

    /// Data ids of every held schedule, sorted.
    pub async fn data_ids(&self) -> Vec<StateId> {
        let mut ids: Vec<StateId> = self.schedules.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The schedule under `data_id` as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ScheduleNotFound`] for an unknown id.
    pub async fn serialized(&self, data_id: &StateId) -> Result<String, TimeSwitchError> {
        let schedules = self.schedules.lock().await;
        let managed = schedules
            .get(data_id)
            .ok_or_else(|| CommandError::ScheduleNotFound(data_id.to_string()))?;
        Ok(self.registry.serialize_schedule_to_string(managed.schedule())?)
    }

    /// Disarm every schedule and drop them.
    pub async fn shutdown(&self) {
        let mut schedules = self.schedules.lock().await;
        for managed in schedules.values_mut() {
            managed.destroy();
        }
        tracing::info!(schedules = schedules.len(), "all schedules disarmed");
        schedules.clear();
    }

    /// Validate and apply a raw request.
    ///
    /// # Errors
    ///
    /// See [`CommandProcessor::handle`].
    pub async fn handle_request(&self, request: &CommandRequest) -> Result<(), TimeSwitchError> {
        let command = Command::from_request(request)?;
        self.handle(command).await
    }

    /// Apply `command` once no other command is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ScheduleNotFound`] for an unknown data id, and
    /// any validation, codec, schedule, scheduler or state error raised while
    /// applying the command. A failed write-back of the schedule is logged and
    /// does not fail the command.
    #[tracing::instrument(skip(self, command), fields(command = command.name(), data_id = %command.data_id()))]
    pub async fn handle(&self, command: Command) -> Result<(), TimeSwitchError> {
        let mut schedules = loop {
            if let Ok(guard) = self.schedules.try_lock() {
                break guard;
            }
            tracing::debug!(delay_ms = self.retry_delay.as_millis(), "processor busy, deferring command");
            tokio::time::sleep(self.retry_delay).await;
        };
        let data_id = command.data_id().clone();
        let managed = schedules
            .get_mut(&data_id)
            .ok_or_else(|| CommandError::ScheduleNotFound(data_id.to_string()))?;
        self.apply(managed, command).await?;
        let json = self.registry.serialize_schedule_to_string(managed.schedule())?;
        // The change is live in memory already; a failed write-back only
        // leaves the stored copy stale until the next successful command.
        if let Err(error) = self
            .states()
            .set_state(data_id, StateValue::String(json), true)
            .await
        {
            tracing::warn!(%error, "failed to write schedule back");
            return Ok(());
        }
        tracing::debug!("command applied");
        Ok(())
    }

    async fn apply(
        &self,
        managed: &mut ManagedSchedule,
        command: Command,
    ) -> Result<(), TimeSwitchError> {
        match command {
            Command::AddTrigger { trigger_type, .. } => {
                let trigger = default_trigger(managed, trigger_type)?;
                managed.add_trigger(trigger)?;
            }
            Command::AddOneTimeTrigger { mut trigger, .. } => {
                if let Value::Object(fields) = &mut trigger {
                    fields
                        .entry("id")
                        .or_insert_with(|| Value::String(managed.next_trigger_id().to_string()));
                }
                let trigger = self.references.deserialize_trigger(&trigger)?;
                if trigger.trigger_type() != TriggerType::OneTime {
                    return Err(CodecError::TypeMismatch {
                        expected: Trigger::ONE_TIME.to_string(),
                        found: trigger.type_tag().to_string(),
                    }
                    .into());
                }
                managed.add_trigger(trigger)?;
            }
            Command::UpdateTrigger { trigger, .. } => {
                let trigger = self.references.deserialize_trigger(&trigger)?;
                managed.update_trigger(trigger)?;
            }
            Command::DeleteTrigger { trigger_id, .. } => {
                managed.remove_trigger(&trigger_id)?;
            }
            Command::ChangeName { name, .. } => managed.set_name(name)?,
            Command::EnableSchedule { state_id, .. } => {
                managed.set_enabled(true)?;
                self.states()
                    .set_state(state_id, StateValue::Boolean(true), true)
                    .await?;
            }
            Command::DisableSchedule { state_id, .. } => {
                managed.set_enabled(false)?;
                self.states()
                    .set_state(state_id, StateValue::Boolean(false), true)
                    .await?;
            }
            Command::ChangeSwitchedValues {
                value_type,
                on_value,
                off_value,
                ..
            } => managed.set_switched_values(value_type, on_value, off_value)?,
            Command::ChangeSwitchedIds { state_ids, .. } => managed.set_switched_ids(state_ids)?,
        }
        Ok(())
    }

    /// Deletes expired one-time triggers of the schedule under `data_id`
    /// through the regular command path.
    fn expiry_hook(&self, data_id: StateId) -> ExpiryHook {
        let this = self.this.clone();
        Arc::new(move |trigger_id| {
            let Some(this) = this.upgrade() else {
                return;
            };
            let command = Command::DeleteTrigger {
                data_id: data_id.clone(),
                trigger_id,
            };
            tokio::spawn(async move {
                if let Err(error) = this.handle(command).await {
                    tracing::warn!(%error, "failed to delete expired one-time trigger");
                }
            });
        })
    }
}

/// A trigger switching "on" every day: midnight, or sunrise without shift.
fn default_trigger(
    managed: &ManagedSchedule,
    trigger_type: TriggerType,
) -> Result<Trigger, TimeSwitchError> {
    let id = managed.next_trigger_id();
    let action = Action::Shared(ActionSlot::On);
    let trigger = match trigger_type {
        TriggerType::Time => TimeTrigger::builder()
            .id(id)
            .hour(0)
            .minute(0)
            .weekdays(Weekdays::all())
            .action(action)
            .build()?
            .into(),
        TriggerType::Astro => AstroTrigger::builder()
            .id(id)
            .astro_time(AstroTime::Sunrise)
            .shift_in_minutes(0)
            .weekdays(Weekdays::all())
            .action(action)
            .build()?
            .into(),
        TriggerType::OneTime => {
            return Err(CommandError::InvalidMessage(format!(
                "`{}` cannot be added without a date",
                Trigger::ONE_TIME
            ))
            .into());
        }
    };
    Ok(trigger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use timeswitch_domain::error::ScheduleError;

    use crate::action_runner::ActionRunner;
    use crate::action_runner::tests::InMemoryStates;
    use crate::ports::JobRule;
    use crate::schedulers::testing::{
        BERLIN, FixedAstroCalculator, FixedClock, RecordingJobScheduler,
    };

    const DATA_ID: &str = "time-switch.0.onoff.0.data";
    const ENABLED_ID: &str = "time-switch.0.onoff.0.enabled";

    struct Fixture {
        jobs: Arc<RecordingJobScheduler>,
        runner: Arc<ActionRunner<InMemoryStates>>,
        processor: Arc<CommandProcessor<InMemoryStates>>,
    }

    fn data_id() -> StateId {
        StateId::new(DATA_ID).unwrap()
    }

    fn fixture() -> Fixture {
        let jobs = Arc::new(RecordingJobScheduler::default());
        let runner = Arc::new(ActionRunner::new(InMemoryStates::default()));
        let context = SchedulerContext {
            jobs: jobs.clone(),
            runner: Arc::clone(&runner),
            astro: Arc::new(FixedAstroCalculator::default()),
            clock: Arc::new(FixedClock::monday_at(10, 0)),
            coordinates: BERLIN,
            one_time_grace: Duration::from_millis(100),
        };
        let processor =
            CommandProcessor::new(context, Registry::default(), Duration::from_millis(5)).unwrap();
        Fixture {
            jobs,
            runner,
            processor,
        }
    }

    fn schedule_json() -> String {
        json!({
            "type": "OnOffSchedule",
            "name": "Porch light",
            "onAction": {
                "type": "OnOffStateAction",
                "valueType": "boolean",
                "idsOfStatesToSet": ["porch.light"],
                "onValue": true,
                "offValue": false,
                "booleanValue": true
            },
            "offAction": {
                "type": "OnOffStateAction",
                "valueType": "boolean",
                "idsOfStatesToSet": ["porch.light"],
                "onValue": true,
                "offValue": false,
                "booleanValue": false
            },
            "triggers": [{
                "type": "TimeTrigger",
                "id": "0",
                "hour": 22,
                "minute": 15,
                "weekdays": [0, 1, 2, 3, 4, 5, 6],
                "action": {"type": "OnOffStateAction", "name": "Off"}
            }]
        })
        .to_string()
    }

    async fn loaded(enabled: bool) -> Fixture {
        let f = fixture();
        f.processor
            .add_schedule(data_id(), &schedule_json(), enabled)
            .await
            .unwrap();
        f
    }

    fn command(name: &str, message: Value) -> CommandRequest {
        CommandRequest {
            command: name.to_string(),
            message,
        }
    }

    fn written_schedule(f: &Fixture) -> Value {
        let Some(StateValue::String(json)) = f.runner.states().value(DATA_ID) else {
            panic!("schedule was not written back");
        };
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn should_arm_triggers_of_enabled_schedule_when_loaded() {
        let f = loaded(true).await;
        assert_eq!(
            f.jobs.active_rules(),
            vec![JobRule::Recurring {
                weekdays: Weekdays::all(),
                hour: 22,
                minute: 15,
            }]
        );
        assert_eq!(f.processor.data_ids().await, vec![data_id()]);
    }

    #[tokio::test]
    async fn should_add_default_time_trigger_and_write_back() {
        let f = loaded(false).await;
        f.processor
            .handle_request(&command(
                "add-trigger",
                json!({"dataId": DATA_ID, "triggerType": "TimeTrigger", "actionType": "OnOffStateAction"}),
            ))
            .await
            .unwrap();

        let written = written_schedule(&f);
        let added = &written["triggers"][1];
        assert_eq!(added["id"], "1");
        assert_eq!(added["hour"], 0);
        assert_eq!(added["minute"], 0);
        assert_eq!(added["weekdays"], json!([0, 1, 2, 3, 4, 5, 6]));
        assert_eq!(added["action"], json!({"type": "OnOffStateAction", "name": "On"}));
    }

    #[tokio::test]
    async fn should_enable_schedule_and_acknowledge_flag() {
        let f = loaded(false).await;
        f.processor
            .handle_request(&command(
                "enable-schedule",
                json!({"dataId": DATA_ID, "stateId": ENABLED_ID}),
            ))
            .await
            .unwrap();

        assert_eq!(f.jobs.active_rules().len(), 1);
        let writes = f.runner.states().writes();
        assert!(writes.contains(&(ENABLED_ID.to_string(), StateValue::Boolean(true), true)));
        assert!(writes.iter().any(|(id, _, ack)| id == DATA_ID && *ack));
    }

    #[tokio::test]
    async fn should_disarm_everything_when_disabled() {
        let f = loaded(true).await;
        f.processor
            .handle_request(&command(
                "disable-schedule",
                json!({"dataId": DATA_ID, "stateId": ENABLED_ID}),
            ))
            .await
            .unwrap();
        assert!(f.jobs.active_rules().is_empty());
        assert_eq!(
            f.runner.states().value(ENABLED_ID),
            Some(StateValue::Boolean(false))
        );
    }

    #[tokio::test]
    async fn should_update_trigger_keeping_shared_reference() {
        let f = loaded(true).await;
        let trigger = json!({
            "type": "TimeTrigger",
            "id": "0",
            "hour": 23,
            "minute": 0,
            "weekdays": [5, 6],
            "action": {"type": "OnOffStateAction", "name": "Off"}
        });
        f.processor
            .handle_request(&command(
                "update-trigger",
                json!({"dataId": DATA_ID, "trigger": trigger.to_string()}),
            ))
            .await
            .unwrap();

        assert_eq!(written_schedule(&f)["triggers"][0], trigger);
        assert_eq!(
            f.jobs.active_rules(),
            vec![JobRule::Recurring {
                weekdays: Weekdays::new(vec![5, 6]).unwrap(),
                hour: 23,
                minute: 0,
            }]
        );
    }

    #[tokio::test]
    async fn should_assign_id_to_one_time_trigger_without_one() {
        let f = loaded(true).await;
        f.processor
            .handle_request(&command(
                "add-one-time-trigger",
                json!({"dataId": DATA_ID, "trigger": {
                    "type": "OneTimeTrigger",
                    "date": "2026-10-20T20:00:00.000Z",
                    "action": {"type": "OnOffStateAction", "name": "On"}
                }}),
            ))
            .await
            .unwrap();

        assert_eq!(written_schedule(&f)["triggers"][1]["id"], "1");
        assert_eq!(f.jobs.active_rules().len(), 2);
    }

    #[tokio::test]
    async fn should_reject_non_one_time_trigger_in_add_one_time_trigger() {
        let f = loaded(false).await;
        let result = f
            .processor
            .handle_request(&command(
                "add-one-time-trigger",
                json!({"dataId": DATA_ID, "trigger": {
                    "type": "TimeTrigger",
                    "hour": 1,
                    "minute": 0,
                    "weekdays": [1],
                    "action": {"type": "OnOffStateAction", "name": "On"}
                }}),
            ))
            .await;
        assert!(matches!(
            result,
            Err(TimeSwitchError::Codec(CodecError::TypeMismatch { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn should_delete_past_one_time_trigger_after_grace() {
        let f = loaded(true).await;
        f.processor
            .handle_request(&command(
                "add-one-time-trigger",
                json!({"dataId": DATA_ID, "trigger": {
                    "type": "OneTimeTrigger",
                    "id": "7",
                    "date": "2020-01-01T00:00:00.000Z",
                    "action": {"type": "OnOffStateAction", "name": "On"}
                }}),
            ))
            .await
            .unwrap();
        assert_eq!(written_schedule(&f)["triggers"].as_array().unwrap().len(), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let triggers = written_schedule(&f)["triggers"].clone();
        assert_eq!(triggers.as_array().unwrap().len(), 1);
        assert_eq!(triggers[0]["id"], "0");
    }

    #[tokio::test]
    async fn should_replace_switched_ids_of_both_actions() {
        let f = loaded(false).await;
        f.processor
            .handle_request(&command(
                "change-switched-ids",
                json!({"dataId": DATA_ID, "stateIds": ["porch.light", "garage.light"]}),
            ))
            .await
            .unwrap();
        let written = written_schedule(&f);
        assert_eq!(
            written["onAction"]["idsOfStatesToSet"],
            json!(["porch.light", "garage.light"])
        );
        assert_eq!(
            written["offAction"]["idsOfStatesToSet"],
            json!(["porch.light", "garage.light"])
        );
    }

    #[tokio::test]
    async fn should_change_switched_values_and_type() {
        let f = loaded(false).await;
        f.processor
            .handle_request(&command(
                "change-switched-values",
                json!({"dataId": DATA_ID, "valueType": "number", "onValue": 80, "offValue": 0}),
            ))
            .await
            .unwrap();
        let written = written_schedule(&f);
        assert_eq!(written["onAction"]["valueType"], "number");
        assert_eq!(written["onAction"]["onValue"], 80);
        assert_eq!(written["offAction"]["offValue"], 0);
    }

    #[tokio::test]
    async fn should_fail_for_unknown_schedule() {
        let f = fixture();
        let result = f
            .processor
            .handle_request(&command("change-name", json!({"dataId": DATA_ID, "name": "x"})))
            .await;
        assert!(matches!(
            result,
            Err(TimeSwitchError::Command(CommandError::ScheduleNotFound(_)))
        ));
        assert!(f.runner.states().writes().is_empty());
    }

    #[tokio::test]
    async fn should_not_write_back_when_command_fails() {
        let f = loaded(false).await;
        let result = f
            .processor
            .handle_request(&command("delete-trigger", json!({"dataId": DATA_ID, "triggerId": "9"})))
            .await;
        assert!(matches!(
            result,
            Err(TimeSwitchError::Schedule(ScheduleError::TriggerNotFound(_)))
        ));
        assert!(f.runner.states().value(DATA_ID).is_none());
    }

    #[tokio::test]
    async fn should_keep_applied_change_when_write_back_fails() {
        let f = loaded(false).await;
        f.runner.states().fail_on(DATA_ID);
        f.processor
            .handle_request(&command(
                "change-name",
                json!({"dataId": DATA_ID, "name": "Garden light"}),
            ))
            .await
            .unwrap();

        assert!(f.runner.states().value(DATA_ID).is_none());
        let serialized: Value =
            serde_json::from_str(&f.processor.serialized(&data_id()).await.unwrap()).unwrap();
        assert_eq!(serialized["name"], "Garden light");
    }

    #[tokio::test]
    async fn should_apply_both_of_two_concurrent_commands() {
        let f = loaded(false).await;
        let first_request = command(
            "change-name",
            json!({"dataId": DATA_ID, "name": "First"}),
        );
        let first = f.processor.handle_request(&first_request);
        let second_request = command(
            "add-trigger",
            json!({"dataId": DATA_ID, "triggerType": "AstroTrigger", "actionType": "OnOffStateAction"}),
        );
        let second = f.processor.handle_request(&second_request);
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        let serialized: Value =
            serde_json::from_str(&f.processor.serialized(&data_id()).await.unwrap()).unwrap();
        assert_eq!(serialized["name"], "First");
        assert_eq!(serialized["triggers"][1]["type"], "AstroTrigger");
    }

    #[tokio::test]
    async fn should_disarm_everything_on_shutdown() {
        let f = loaded(true).await;
        f.processor.shutdown().await;
        assert!(f.jobs.active_rules().is_empty());
        assert!(f.processor.data_ids().await.is_empty());
        assert!(!f.processor.remove_schedule(&data_id()).await);
    }
}
