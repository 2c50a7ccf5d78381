use serde_json::Value;

use crate::ui::prelude::{Level, emit};

pub(super) fn log_event(level: Level, code: &str, message: impl Into<String>) {
    let message = message.into();
    emit(level, code, &message, None);
}

pub(super) fn log_event_with(level: Level, code: &str, message: impl Into<String>, data: Value) {
    let message = message.into();
    emit(level, code, &message, Some(data));
}
