use std::collections::VecDeque;

use crate::types::*;

/// Number of progress lines kept for display
pub const TRANSCRIPT_LIMIT: usize = 100;

/// Application Model - the complete state of the upgrade step
///
/// Created on `Mount` and reset on `Unmount`. Everything except the socket
/// connection survives a reconnect so the page can reattach to an upgrade that
/// is already running.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    // Page lifecycle
    pub mounted: bool,
    pub page_url: String,
    /// The web portal itself still has to be checked for updates
    pub checking_web_portal: bool,

    // Upgrade flow
    pub state: UpdateState,
    pub previous_state: UpdateState,
    /// Best guess of the phase a busy service is in, used while reattaching
    pub reattach_prior: UpdateState,
    pub error: ErrorType,
    pub last_message: Option<OsUpdaterMessage>,
    pub transcript: VecDeque<String>,
    pub update_size: UpdateSize,
    pub available_space: Option<u64>,
    pub updater_backend: UpdaterBackend,
    pub os_updates: Option<OsUpdateInfo>,
    pub ap_disconnect_dialog_enabled: bool,

    // Socket state
    pub is_connected: bool,
    pub reconnect_timer: Option<u64>,

    // Web portal restart polling
    pub server_restart: ServerRestartState,

    /// Last timer id handed out; never reset
    pub next_timer_id: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            mounted: false,
            page_url: String::new(),
            checking_web_portal: true,
            state: UpdateState::None,
            previous_state: UpdateState::None,
            reattach_prior: UpdateState::None,
            error: ErrorType::None,
            last_message: None,
            transcript: VecDeque::new(),
            update_size: UpdateSize::default(),
            available_space: None,
            updater_backend: UpdaterBackend::Default,
            os_updates: None,
            ap_disconnect_dialog_enabled: true,
            is_connected: false,
            reconnect_timer: None,
            server_restart: ServerRestartState::Idle,
            next_timer_id: 0,
        }
    }
}

impl Model {
    /// Start over for a newly mounted page. `search == "?all"` means the web
    /// portal was already checked.
    pub fn mount(&mut self, page_url: String, search: &str) {
        self.reset();
        self.mounted = true;
        self.page_url = page_url;
        self.checking_web_portal = search != "?all";
        self.state = UpdateState::Connect;
    }

    /// Back to the unmounted default. Timer ids keep counting so timers of an
    /// earlier mount can never be mistaken for new ones.
    pub fn reset(&mut self) {
        *self = Self {
            next_timer_id: self.next_timer_id,
            ..Self::default()
        };
    }

    pub fn allocate_timer_id(&mut self) -> u64 {
        self.next_timer_id += 1;
        self.next_timer_id
    }

    /// Switch phase, remembering where we came from
    pub fn set_state(&mut self, state: UpdateState) {
        if self.state != state {
            self.previous_state = self.state;
            self.state = state;
        }
    }

    /// Available space does not cover the upgrade
    pub fn is_space_exhausted(&self) -> bool {
        self.available_space
            .is_some_and(|available| self.update_size.exceeds(available))
    }

    /// Enter the error state. While space is exhausted the error kind is
    /// always `NoSpaceAvailable`.
    pub fn raise_error(&mut self, error: ErrorType) {
        self.error = if self.is_space_exhausted() {
            ErrorType::NoSpaceAvailable
        } else {
            error
        };
        self.set_state(UpdateState::Error);
    }

    /// Remember a message and append its text to the transcript
    pub fn record_message(&mut self, message: OsUpdaterMessage) {
        if let Some(line) = message
            .progress()
            .map(|payload| payload.message.trim())
            .filter(|line| !line.is_empty())
        {
            if self.transcript.len() == TRANSCRIPT_LIMIT {
                self.transcript.pop_front();
            }
            self.transcript.push_back(line.to_string());
        }
        self.last_message = Some(message);
    }
}
