//! Scripted in-memory transport.
//!
//! `ScriptedTransport` is handed to the code under test; the paired
//! `ScriptHandle` stays with the test to push inbound frames, drop the link,
//! make upcoming opens fail, and inspect what was sent.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use hexchess_protocol::{ClientMessage, ServerMessage};

use crate::infrastructure::websocket::{Link, Transport, TransportError};

enum Frame {
    Text(String),
    Error(String),
    Close,
}

#[derive(Default)]
struct Script {
    failing_opens: u32,
    open_delay: Duration,
    open_attempts: u32,
    opens: u32,
    sent: Vec<String>,
    inbound: Option<mpsc::UnboundedSender<Frame>>,
    link_closed: bool,
}

pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

#[derive(Clone)]
pub struct ScriptHandle {
    script: Rc<RefCell<Script>>,
}

pub struct ScriptedLink {
    rx: mpsc::UnboundedReceiver<Frame>,
    script: Rc<RefCell<Script>>,
    closed: bool,
}

impl ScriptedTransport {
    pub fn new() -> (Self, ScriptHandle) {
        let script = Rc::new(RefCell::new(Script::default()));
        (
            Self {
                script: Rc::clone(&script),
            },
            ScriptHandle { script },
        )
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    type Link = ScriptedLink;

    async fn open(&mut self, url: &str) -> Result<ScriptedLink, TransportError> {
        let delay = {
            let mut script = self.script.borrow_mut();
            script.open_attempts += 1;
            script.open_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.borrow_mut();
        if script.failing_opens > 0 {
            script.failing_opens -= 1;
            return Err(TransportError::Open {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        script.opens += 1;
        script.inbound = Some(tx);
        script.link_closed = false;
        Ok(ScriptedLink {
            rx,
            script: Rc::clone(&self.script),
            closed: false,
        })
    }
}

#[async_trait(?Send)]
impl Link for ScriptedLink {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.script.borrow_mut().sent.push(text);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        if self.closed {
            return None;
        }
        match self.rx.recv().await? {
            Frame::Text(text) => Some(Ok(text)),
            Frame::Error(reason) => Some(Err(TransportError::Socket(reason))),
            Frame::Close => {
                self.closed = true;
                None
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.script.borrow_mut().link_closed = true;
    }
}

impl ScriptHandle {
    /// Make the next `n` opens fail.
    pub fn fail_next_opens(&self, n: u32) {
        self.script.borrow_mut().failing_opens = n;
    }

    /// Make every open take `delay` before it resolves.
    pub fn delay_opens(&self, delay: Duration) {
        self.script.borrow_mut().open_delay = delay;
    }

    /// Opens started so far, whether or not they succeeded.
    pub fn open_attempts(&self) -> u32 {
        self.script.borrow().open_attempts
    }

    /// Successful opens so far.
    pub fn open_count(&self) -> u32 {
        self.script.borrow().opens
    }

    fn push(&self, frame: Frame) {
        if let Some(tx) = self.script.borrow().inbound.as_ref() {
            let _ = tx.send(frame);
        }
    }

    /// Queue a raw inbound frame on the current link.
    pub fn push_text(&self, text: impl Into<String>) {
        self.push(Frame::Text(text.into()));
    }

    /// Queue an encoded server message on the current link.
    pub fn push_message(&self, message: &ServerMessage) {
        let text = message.encode().expect("server message encodes");
        self.push_text(text);
    }

    /// Queue a socket error on the current link.
    pub fn push_error(&self, reason: impl Into<String>) {
        self.push(Frame::Error(reason.into()));
    }

    /// Simulate the server dropping the current link.
    pub fn drop_connection(&self) {
        self.push(Frame::Close);
    }

    /// Whether the client closed the current link itself.
    pub fn link_closed(&self) -> bool {
        self.script.borrow().link_closed
    }

    /// Raw frames the client sent, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.script.borrow().sent.clone()
    }

    /// Sent frames decoded back into intents.
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        self.sent()
            .iter()
            .map(|text| serde_json::from_str(text).expect("sent frame is a known intent"))
            .collect()
    }
}
