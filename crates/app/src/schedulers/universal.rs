//! Dispatching scheduler: routes each trigger to the scheduler of its type.

use timeswitch_domain::error::SchedulerError;
use timeswitch_domain::trigger::Trigger;

use super::{TriggerScheduler, TypedTriggerScheduler};

/// Routes triggers to the first contained scheduler handling their type.
pub struct UniversalTriggerScheduler {
    schedulers: Vec<Box<dyn TypedTriggerScheduler>>,
}

impl UniversalTriggerScheduler {
    #[must_use]
    pub fn new(schedulers: Vec<Box<dyn TypedTriggerScheduler>>) -> Self {
        Self { schedulers }
    }

    fn scheduler_for(
        &mut self,
        trigger: &Trigger,
    ) -> Result<&mut Box<dyn TypedTriggerScheduler>, SchedulerError> {
        let trigger_type = trigger.trigger_type();
        self.schedulers
            .iter_mut()
            .find(|scheduler| scheduler.for_type() == trigger_type)
            .ok_or_else(|| SchedulerError::NoSchedulerForType(trigger.type_tag().to_string()))
    }
}

impl TriggerScheduler for UniversalTriggerScheduler {
    fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        self.scheduler_for(trigger)?.register(trigger)
    }

    fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
        self.scheduler_for(trigger)?.unregister(trigger)
    }

    fn destroy(&mut self) {
        for scheduler in &mut self.schedulers {
            scheduler.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use timeswitch_domain::action::{Action, ActionSlot};
    use timeswitch_domain::id::TriggerId;
    use timeswitch_domain::trigger::{TimeTrigger, TriggerType};
    use timeswitch_domain::weekday::Weekdays;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.lock().unwrap().push(call);
        }

        fn all(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct SpyScheduler {
        trigger_type: TriggerType,
        calls: Calls,
    }

    impl TriggerScheduler for SpyScheduler {
        fn register(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
            self.calls.push(format!("{}:register:{}", self.trigger_type, trigger.id()));
            Ok(())
        }

        fn unregister(&mut self, trigger: &Trigger) -> Result<(), SchedulerError> {
            self.calls.push(format!("{}:unregister:{}", self.trigger_type, trigger.id()));
            Ok(())
        }

        fn destroy(&mut self) {
            self.calls.push(format!("{}:destroy", self.trigger_type));
        }
    }

    impl TypedTriggerScheduler for SpyScheduler {
        fn for_type(&self) -> TriggerType {
            self.trigger_type
        }
    }

    fn universal(types: &[TriggerType]) -> (Calls, UniversalTriggerScheduler) {
        let calls = Calls::default();
        let schedulers = types
            .iter()
            .map(|&trigger_type| {
                Box::new(SpyScheduler {
                    trigger_type,
                    calls: calls.clone(),
                }) as Box<dyn TypedTriggerScheduler>
            })
            .collect();
        (calls, UniversalTriggerScheduler::new(schedulers))
    }

    fn time_trigger() -> Trigger {
        TimeTrigger::builder()
            .id(TriggerId::new("0").unwrap())
            .hour(6)
            .minute(0)
            .weekdays(Weekdays::all())
            .action(Action::Shared(ActionSlot::Off))
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn should_route_to_scheduler_of_trigger_type() {
        let (calls, mut scheduler) = universal(&[TriggerType::Astro, TriggerType::Time]);
        scheduler.register(&time_trigger()).unwrap();
        scheduler.unregister(&time_trigger()).unwrap();
        assert_eq!(
            calls.all(),
            vec![
                "TimeTrigger:register:0".to_string(),
                "TimeTrigger:unregister:0".to_string(),
            ]
        );
    }

    #[test]
    fn should_fail_when_no_scheduler_handles_type() {
        let (calls, mut scheduler) = universal(&[TriggerType::Astro]);
        assert_eq!(
            scheduler.register(&time_trigger()),
            Err(SchedulerError::NoSchedulerForType("TimeTrigger".to_string()))
        );
        assert!(calls.all().is_empty());
    }

    #[test]
    fn should_destroy_every_scheduler() {
        let (calls, mut scheduler) = universal(&[TriggerType::Time, TriggerType::OneTime]);
        scheduler.destroy();
        assert_eq!(
            calls.all(),
            vec![
                "TimeTrigger:destroy".to_string(),
                "OneTimeTrigger:destroy".to_string(),
            ]
        );
    }
}
