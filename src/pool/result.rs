use std::any::Any;
use std::backtrace::BacktraceStatus;

use serde::Serialize;
use thiserror::Error;

/// Outcome of one task, produced exactly once when it completes
#[derive(Debug, Clone)]
pub struct TaskResult<T, M = ()> {
    pub sequence: u64,
    pub name: String,
    pub metadata: Option<M>,
    pub outcome: Result<T, TaskFailure>,
}

impl<T, M> TaskResult<T, M> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.outcome.as_ref().err()
    }

    pub fn into_value(self) -> Option<T> {
        self.outcome.ok()
    }
}

/// Structured description of a failed target
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    /// Short type name of the error, or `panic`
    pub kind: String,
    pub message: String,
    /// Remaining entries of the error's source chain, outermost first
    pub causes: Vec<String>,
    /// Stack frames captured with the error, innermost first
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub function: String,
    pub location: Option<String>,
}

impl TaskFailure {
    pub(crate) fn from_error(kind: &str, err: anyhow::Error) -> Self {
        let backtrace = err.backtrace();
        let frames = if backtrace.status() == BacktraceStatus::Captured {
            parse_frames(&backtrace.to_string())
        } else {
            Vec::new()
        };

        Self {
            kind: kind.to_string(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(|cause| cause.to_string()).collect(),
            frames,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "task panicked".to_string()
        };

        Self {
            kind: "panic".to_string(),
            message,
            causes: Vec::new(),
            frames: Vec::new(),
        }
    }
}

/// Parse the text rendering of a `std::backtrace::Backtrace`:
///
/// ```text
///    0: my_crate::work
///              at ./src/lib.rs:10:5
///    1: core::ops::function::FnOnce::call_once
/// ```
pub(crate) fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines().map(str::trim) {
        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                frame.location = Some(location.to_string());
            }
        } else if let Some((index, function)) = line.split_once(": ")
            && !index.is_empty()
            && index.chars().all(|c| c.is_ascii_digit())
        {
            frames.push(Frame {
                function: function.to_string(),
                location: None,
            });
        }
    }

    frames
}
