use comms::{Command, FrameReceiver, FrameSender, Response};
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    config::Mode,
    dispatcher::ModelDispatcher,
    error::{OrbitErr, Result},
};

/// Serves one client: reads a frame, dispatches it and answers, until `exit`.
pub struct ConnectionLoop<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: FrameReceiver<R>,
    tx: FrameSender<W>,
    dispatcher: ModelDispatcher,
    mode: Mode,
    dim: usize,
    buf: Vec<u8>,
}

impl<R, W> ConnectionLoop<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `ConnectionLoop`.
    ///
    /// # Args
    /// * `rx` - The receiving end of the client connection.
    /// * `tx` - The sending end of the client connection.
    /// * `dispatcher` - The models data frames are handed to.
    /// * `mode` - What to do with every data frame.
    /// * `dim` - The feature dimension data frames must carry.
    pub fn new(
        rx: FrameReceiver<R>,
        tx: FrameSender<W>,
        dispatcher: ModelDispatcher,
        mode: Mode,
        dim: usize,
    ) -> Self {
        Self {
            rx,
            tx,
            dispatcher,
            mode,
            dim,
            buf: Vec::new(),
        }
    }

    pub fn dispatcher(&self) -> &ModelDispatcher {
        &self.dispatcher
    }

    /// Processes frames until the client sends `exit`.
    ///
    /// Malformed and unknown frames, as well as failures while handling a frame,
    /// are answered and the loop goes on.
    ///
    /// # Errors
    /// Returns `OrbitErr::Disconnected` if the client closes the connection and
    /// `OrbitErr::Transport` if reading or writing fails.
    pub async fn run(&mut self) -> Result<()> {
        let Self {
            rx,
            tx,
            dispatcher,
            mode,
            dim,
            buf,
        } = self;

        loop {
            let Some(frame) = rx.recv_into(buf).await.map_err(OrbitErr::Transport)? else {
                warn!("client closed the connection");
                return Err(OrbitErr::Disconnected);
            };

            let response = match comms::decode(frame, *dim) {
                Ok(Command::Exit) => {
                    info!("received exit, closing connection");
                    tx.send(&Response::Bye).await.map_err(OrbitErr::Transport)?;
                    tx.shutdown().await.map_err(OrbitErr::Transport)?;
                    return Ok(());
                }
                Ok(Command::Reset) => reply(dispatcher.reset(), "reset"),
                Ok(Command::Save) => reply(dispatcher.save_in(*mode), "save"),
                Ok(Command::Data(frame)) => {
                    debug!(label = frame.label(); "received data frame");
                    dispatcher.handle(*mode, &frame).unwrap_or_else(|e| {
                        error!("failed to process data frame: {e}");
                        Response::Error
                    })
                }
                Err(e) if e.is_malformed() => {
                    warn!("malformed frame: {e}");
                    Response::Error
                }
                Err(e) => {
                    warn!("{e}");
                    Response::Invalid
                }
            };

            tx.send(&response).await.map_err(OrbitErr::Transport)?;
        }
    }
}

fn reply(outcome: Result<()>, what: &str) -> Response {
    match outcome {
        Ok(()) => {
            info!("{what} done");
            Response::Ok
        }
        Err(e) => {
            error!("{what} failed: {e}");
            Response::Error
        }
    }
}
