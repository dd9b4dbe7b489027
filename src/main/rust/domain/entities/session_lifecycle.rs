use std::time::Instant;

use crate::domain::value_objects::ConnectionState;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Domain entity tracking the broker session lifecycle
#[derive(Debug)]
pub struct SessionLifecycle {
    current_state: ConnectionState,
    state_history: Vec<StateTransition>,
    started_at: Option<Instant>,
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            current_state: ConnectionState::Disconnected,
            state_history: Vec::new(),
            started_at: None,
        }
    }

    pub fn current_state(&self) -> &ConnectionState {
        &self.current_state
    }

    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| start.elapsed())
    }

    pub fn transition_count(&self) -> usize {
        self.state_history.len()
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.state_history.last()
    }

    /// Transition to connecting state
    pub fn transition_to_connecting(&mut self) {
        self.record_transition(ConnectionState::Connecting, None);
    }

    /// Transition to connected state (CONNACK received)
    pub fn transition_to_connected(&mut self) {
        self.record_transition(ConnectionState::Connected, None);
    }

    /// Transition to subscribed state; the bridge is fully operational
    pub fn transition_to_subscribed(&mut self) {
        self.record_transition(ConnectionState::Subscribed, None);

        // Track start time when the session first becomes operational
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Transition to reconnecting state
    pub fn transition_to_reconnecting(&mut self, attempt: u32, reason: Option<String>) {
        self.record_transition(ConnectionState::Reconnecting { attempt }, reason);
    }

    /// Transition to failed state
    pub fn transition_to_failed(&mut self, reason: Option<String>) {
        self.record_transition(ConnectionState::Failed, reason);
    }

    fn record_transition(&mut self, new_state: ConnectionState, reason: Option<String>) {
        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        self.state_history.push(transition);
        self.current_state = new_state;
    }

    /// Pure business rule: should we keep retrying the broker connection?
    pub fn should_continue_retrying(&self, max_attempts: Option<u32>) -> bool {
        if let ConnectionState::Reconnecting { attempt } = self.current_state {
            match max_attempts {
                Some(max) => attempt < max,
                None => true, // Unlimited retries
            }
        } else {
            false
        }
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
