//! Async user actions.
//!
//! The app is shared through a `RefCell` on a single-threaded event loop.
//! Borrows are only held between awaits, so a reply that arrives while
//! another request is in flight is appended as soon as it resolves.

use std::cell::RefCell;

use crate::app::{ChatApp, ReplyKind};
use crate::store::KeyValueStorage;
use crate::transport::{ChatTransport, TransportError};

/// Send user text. Returns `false` without issuing a request when the text is blank.
pub async fn send_message<B, T>(app: &RefCell<ChatApp<B>>, transport: &T, text: &str) -> bool
where
    B: KeyValueStorage,
    T: ChatTransport + ?Sized,
{
    let Some(text) = app.borrow_mut().begin_send(text) else {
        return false;
    };
    complete_send(app, transport, &text).await;
    true
}

/// Second half of [`send_message`], for callers that already ran
/// [`ChatApp::begin_send`] and want to redraw before the reply arrives
pub async fn complete_send<B, T>(app: &RefCell<ChatApp<B>>, transport: &T, text: &str)
where
    B: KeyValueStorage,
    T: ChatTransport + ?Sized,
{
    let outcome = transport.send_message(text).await;
    app.borrow_mut().receive_reply(ReplyKind::Chat, outcome);
}

/// Upload a file and record the assistant's analysis
pub async fn upload_file<B, T>(app: &RefCell<ChatApp<B>>, transport: &T, file: T::Upload)
where
    B: KeyValueStorage,
    T: ChatTransport + ?Sized,
{
    let outcome = transport.upload_file(file).await;
    app.borrow_mut().receive_reply(ReplyKind::Upload, outcome);
}

/// Export the active conversation. Failures are returned for the view to report.
pub async fn export_conversation<B, T>(
    app: &RefCell<ChatApp<B>>,
    transport: &T,
) -> Result<Vec<u8>, TransportError>
where
    B: KeyValueStorage,
    T: ChatTransport + ?Sized,
{
    let lines = app.borrow().transcript_lines();
    transport.export_conversation(&lines).await
}
