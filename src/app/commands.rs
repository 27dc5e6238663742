//! Wires configuration, storage and the workflow together and runs one
//! CLI command.

use crate::app::cli::{Command, TriageInputs};
use crate::config::TriageConfig;
use crate::decision::{DecisionContext, DecisionEngine, DecisionWeight, APPOINTMENT_PRIORITY_KIND};
use crate::domain::{AppointmentEvent, AppointmentId, PatientId, Specialty, SystemClock};
use crate::event_store::{FileAppointmentRepository, FileEventLog, FilePendingDecisionRepository};
use crate::structured_logger::StructuredLogger;
use crate::triage_paths::TriagePaths;
use crate::workflow::{
    AppointmentFilter, AppointmentRequest, EventPublisher, RequestOutcome, Response,
    SchedulingWorkflow, StoreError, UseCaseFailure,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Event log that also mirrors every event into the structured log.
struct AuditedEventLog {
    log: FileEventLog,
    logger: Option<Arc<StructuredLogger>>,
}

#[async_trait]
impl EventPublisher for AuditedEventLog {
    async fn publish(&self, event: &AppointmentEvent) -> Result<(), StoreError> {
        self.log.publish(event).await?;
        if let Some(logger) = &self.logger {
            logger.log_domain_event(event);
        }
        Ok(())
    }
}

/// JSON printed for a command, and whether it succeeded.
#[derive(Debug)]
pub struct CommandOutput {
    pub body: Value,
    pub ok: bool,
}

pub struct App {
    workflow: SchedulingWorkflow,
    event_log: FileEventLog,
    logger: Option<Arc<StructuredLogger>>,
    default_weight: DecisionWeight,
}

impl App {
    /// Opens file-backed storage under the resolved data directory.
    pub fn open(config: &TriageConfig, data_dir: Option<&Path>) -> Result<Self> {
        let paths = TriagePaths::resolve(data_dir.or(config.data_dir.as_deref()))?;
        let logger = if config.structured_log {
            Some(Arc::new(StructuredLogger::open(
                &paths.structured_log_path()?,
            )?))
        } else {
            None
        };

        let mut event_log = FileEventLog::new(paths.event_log_path());
        if let Some(logger) = &logger {
            event_log = event_log.with_metadata("run_id", logger.run_id());
        }
        let publisher = AuditedEventLog {
            log: event_log.clone(),
            logger: logger.clone(),
        };

        let workflow = SchedulingWorkflow::new(
            Arc::new(FileAppointmentRepository::new(paths.appointments_dir()?)),
            Arc::new(FilePendingDecisionRepository::new(paths.pending_dir()?)),
            Arc::new(publisher),
            Arc::new(SystemClock),
        )
        .with_default_weight(config.default_weight);

        tracing::debug!("Using triage data directory {}", paths.root().display());
        Ok(Self {
            workflow,
            event_log,
            logger,
            default_weight: config.default_weight,
        })
    }

    pub async fn run(&self, command: Command) -> Result<CommandOutput> {
        let name = command.name();
        let output = self.dispatch(command).await?;
        if let Some(logger) = &self.logger {
            let tag = output.body.get("tag").and_then(Value::as_str);
            logger.log_outcome(name, output.ok, tag);
        }
        Ok(output)
    }

    async fn dispatch(&self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::Evaluate { inputs } => {
                let context = self.context_for(&inputs);
                let result = DecisionEngine::new().evaluate(&context);
                if let Some(logger) = &self.logger {
                    logger.log_decision(&context, &result);
                }
                render(Ok(result))
            }
            Command::Request {
                id,
                patient,
                specialty,
                at,
                inputs,
            } => {
                let request = AppointmentRequest {
                    request_id: id.map_or_else(AppointmentId::generate, AppointmentId::from),
                    patient_id: PatientId::from(patient),
                    specialty: Specialty::from(specialty),
                    scheduled_at: at,
                    reason: inputs.reason,
                    age: inputs.age,
                    wait_days: inputs.wait_days,
                    weight: inputs.weight,
                };
                let outcome = self.workflow.request_appointment(request.clone()).await;
                if let (Some(logger), Ok(outcome)) = (&self.logger, &outcome) {
                    if let Ok(context) = request.to_context(self.default_weight) {
                        let decision = match outcome {
                            RequestOutcome::Scheduled { decision, .. }
                            | RequestOutcome::Pending { decision, .. } => decision,
                        };
                        logger.log_decision(&context, decision);
                    }
                }
                render(outcome)
            }
            Command::Approve { pending_id } => {
                render(self.workflow.approve_pending_decision(&pending_id).await)
            }
            Command::Reject {
                pending_id,
                by,
                reason,
            } => render(
                self.workflow
                    .reject_pending_decision(&pending_id, &by, &reason)
                    .await,
            ),
            Command::Reschedule { id, at, successor } => render(
                self.workflow
                    .reschedule_appointment(
                        &AppointmentId::from(id),
                        at,
                        successor.map(AppointmentId::from),
                    )
                    .await,
            ),
            Command::Transition { id, to } => render(
                self.workflow
                    .change_appointment_state(&AppointmentId::from(id), to)
                    .await,
            ),
            Command::Cancel { id } => render(
                self.workflow
                    .cancel_appointment(&AppointmentId::from(id))
                    .await,
            ),
            Command::OverridePriority {
                id,
                priority,
                justification,
                by,
            } => render(
                self.workflow
                    .override_appointment_priority(
                        &AppointmentId::from(id),
                        priority,
                        &justification,
                        &by,
                    )
                    .await,
            ),
            Command::List { patient, state } => {
                let filter = AppointmentFilter {
                    patient_id: patient.map(PatientId::from),
                    state,
                };
                render(self.workflow.list_appointments(&filter).await)
            }
            Command::Pending => render(self.workflow.list_pending_decisions().await),
            Command::History { id } => render(self.history(&id)),
        }
    }

    fn context_for(&self, inputs: &TriageInputs) -> DecisionContext {
        DecisionContext::new(APPOINTMENT_PRIORITY_KIND)
            .with_data("reason", inputs.reason.as_str())
            .with_data("age", inputs.age)
            .with_data("waitDays", inputs.wait_days)
            .with_weight(inputs.weight.unwrap_or(self.default_weight))
    }

    fn history(&self, id: &str) -> Result<Value, UseCaseFailure> {
        let events: Vec<AppointmentEvent> = self
            .event_log
            .load_events(id)?
            .into_iter()
            .map(|stored| stored.event)
            .collect();
        if events.is_empty() {
            return Err(UseCaseFailure::not_found(format!(
                "no events recorded for {}",
                id
            )));
        }
        let appointment = self.event_log.replay(id)?;
        Ok(serde_json::json!({
            "appointment": appointment,
            "events": events,
        }))
    }
}

fn render<T: Serialize>(result: Result<T, UseCaseFailure>) -> Result<CommandOutput> {
    let response = Response::from(result);
    Ok(CommandOutput {
        ok: response.is_ok(),
        body: serde_json::to_value(&response)?,
    })
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
