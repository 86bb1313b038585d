//! Modal dialogs as cancellable futures
//!
//! A command that needs user input asks the editor's [`DialogHost`] for a
//! response. The host answers through a oneshot channel; dropping the
//! sender without answering means the user cancelled.

use core::cell::RefCell;
use futures::channel::oneshot;
use std::collections::VecDeque;
use tracing::debug;

/// Input a command asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogRequest {
    /// Ask for a time offset, either relative or absolute
    TimeJump {
        /// Initial value in milliseconds
        value: i64,
        /// Whether the "relative" box starts checked
        relative_checked: bool,
    },
}

/// Answer to a [`DialogRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResponse {
    TimeJump { value: i64, is_relative: bool },
}

/// Presents dialogs to the user
pub trait DialogHost {
    /// Show a dialog; the receiver resolves with the answer or is cancelled
    fn open(&self, request: DialogRequest) -> oneshot::Receiver<DialogResponse>;
}

/// Host that cancels every dialog
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDialogs;

impl DialogHost for NoDialogs {
    fn open(&self, request: DialogRequest) -> oneshot::Receiver<DialogResponse> {
        debug!(?request, "no dialog host; cancelling");
        let (_sender, receiver) = oneshot::channel();
        receiver
    }
}

/// Host answering from a prepared queue; `None` entries cancel
#[derive(Debug, Default)]
pub struct ScriptedDialogs {
    answers: RefCell<VecDeque<Option<DialogResponse>>>,
    requests: RefCell<Vec<DialogRequest>>,
}

impl ScriptedDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next answer
    #[must_use]
    pub fn answer(self, response: DialogResponse) -> Self {
        self.answers.borrow_mut().push_back(Some(response));
        self
    }

    /// Queue a cancellation
    #[must_use]
    pub fn cancel(self) -> Self {
        self.answers.borrow_mut().push_back(None);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<DialogRequest> {
        self.requests.borrow().clone()
    }
}

impl DialogHost for ScriptedDialogs {
    fn open(&self, request: DialogRequest) -> oneshot::Receiver<DialogResponse> {
        self.requests.borrow_mut().push(request);
        let (sender, receiver) = oneshot::channel();
        if let Some(Some(response)) = self.answers.borrow_mut().pop_front() {
            // The receiver is alive, so sending cannot fail
            let _ = sender.send(response);
        }
        receiver
    }
}
