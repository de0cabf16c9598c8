use std::fmt;

use burokku_core::command::{classify_frame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:5000/prijem";
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug)]
pub struct LinkConfig {
    pub url: String,
    pub reconnect_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

impl LinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug)]
pub enum LinkError {
    NotOpen,
    BadUrl(url::ParseError),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NotOpen => write!(f, "link is not open, command dropped"),
            LinkError::BadUrl(err) => write!(f, "invalid endpoint url: {err}"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Single reconnecting websocket to the robot controller. Commands sent
/// while the socket is down are dropped, never queued; the supervisor task
/// retries the connection forever at a fixed delay.
#[derive(Debug)]
pub struct RobotLink {
    outbound: mpsc::UnboundedSender<String>,
    status: watch::Receiver<LinkStatus>,
    frames: Option<mpsc::UnboundedReceiver<ServerFrame>>,
    task: JoinHandle<()>,
}

impl RobotLink {
    pub fn connect(config: LinkConfig) -> Result<Self, LinkError> {
        Url::parse(&config.url).map_err(LinkError::BadUrl)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Connecting);
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(config, outbound_rx, status_tx, frames_tx));
        Ok(Self {
            outbound: outbound_tx,
            status: status_rx,
            frames: Some(frames_rx),
            task,
        })
    }

    pub fn status(&self) -> LinkStatus {
        *self.status.borrow()
    }

    pub fn status_watch(&self) -> watch::Receiver<LinkStatus> {
        self.status.clone()
    }

    /// Inbound frames, classified. Can be taken once.
    pub fn take_frames(&mut self) -> Option<mpsc::UnboundedReceiver<ServerFrame>> {
        self.frames.take()
    }

    pub async fn wait_open(&self) {
        let mut rx = self.status.clone();
        loop {
            if *rx.borrow_and_update() == LinkStatus::Open {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn send(&self, line: &str) -> Result<(), LinkError> {
        if self.status() != LinkStatus::Open {
            eprintln!("link not open, dropping command: {line}");
            return Err(LinkError::NotOpen);
        }
        self.outbound
            .send(line.to_string())
            .map_err(|_| LinkError::NotOpen)
    }
}

impl Drop for RobotLink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_link(
    config: LinkConfig,
    mut outbound: mpsc::UnboundedReceiver<String>,
    status: watch::Sender<LinkStatus>,
    frames: mpsc::UnboundedSender<ServerFrame>,
) {
    loop {
        let _ = status.send(LinkStatus::Connecting);
        match connect_async(config.url.as_str()).await {
            Ok((stream, _response)) => {
                let _ = status.send(LinkStatus::Open);
                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        line = outbound.recv() => match line {
                            Some(line) => {
                                if write.send(Message::Text(line)).await.is_err() {
                                    break;
                                }
                            }
                            None => return,
                        },
                        inbound = read.next() => match inbound {
                            Some(Ok(Message::Text(text))) => {
                                let frame = classify_frame(&text);
                                if let ServerFrame::Error(detail) = &frame {
                                    eprintln!("server error: {detail}");
                                }
                                let _ = frames.send(frame);
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(err)) => {
                                eprintln!("link error: {err}");
                                break;
                            }
                        },
                    }
                }
            }
            Err(err) => {
                eprintln!("connect to {} failed: {err}", config.url);
            }
        }
        let _ = status.send(LinkStatus::Closed);
        // Anything that raced into the queue while the socket was going down
        // is dropped, not carried over to the next connection.
        loop {
            match outbound.try_recv() {
                Ok(_) => {}
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        }
        sleep(config.reconnect_delay).await;
    }
}
