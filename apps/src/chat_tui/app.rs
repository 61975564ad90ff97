use session::{ChatController, ClientConfig, Notification, SessionState};

use crate::model::{Model, RunningState};

pub struct App {
    pub model: Model,
    pub controller: ChatController,
    pub config: ClientConfig,
}

impl App {
    pub fn new(controller: ChatController, config: ClientConfig) -> Self {
        App {
            model: Model::default(),
            controller,
            config,
        }
    }

    pub fn is_done(&self) -> bool {
        self.model.running_state == RunningState::Done
    }

    /// Applies a controller notification to the view model.
    pub fn apply_notification(&mut self, notification: Notification) {
        match notification {
            Notification::StateChanged(SessionState::Disconnected) => {
                if self.model.running_state == RunningState::ChatView {
                    self.model.status = Some("disconnected".to_string());
                    self.model.running_state = RunningState::ConnectView;
                }
            }
            Notification::StateChanged(_) => {}
            Notification::MessageAppended(_) => {
                // The controller resets its log when a session starts; keep
                // the timestamp column aligned with it.
                let logged = self.controller.messages().len();
                self.model.received_at.truncate(logged.saturating_sub(1));
                self.model.received_at.push(utils::current_time_millis());
            }
            Notification::Failure(error) => {
                self.model.status = Some(error.to_string());
            }
        }
    }
}
