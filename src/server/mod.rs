//! Socket setup and the single client session.

mod connection;

use std::net::SocketAddr;

use log::info;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

pub use connection::ConnectionLoop;

use crate::{
    config::Mode,
    dispatcher::ModelDispatcher,
    error::{OrbitErr, Result, SetupStage},
};

/// Only one client is ever served.
const BACKLOG: u32 = 1;

fn setup(stage: SetupStage) -> impl FnOnce(std::io::Error) -> OrbitErr {
    move |source| OrbitErr::Setup { stage, source }
}

/// Creates a socket, binds it to `addr` and starts listening.
///
/// # Errors
/// Returns `OrbitErr::Setup` naming the step that failed.
pub fn listen(addr: SocketAddr) -> Result<TcpListener> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(setup(SetupStage::Create))?;

    socket
        .set_reuseaddr(true)
        .map_err(setup(SetupStage::Create))?;
    socket.bind(addr).map_err(setup(SetupStage::Bind))?;

    let listener = socket.listen(BACKLOG).map_err(setup(SetupStage::Listen))?;
    info!("listening at {addr}");

    Ok(listener)
}

/// Waits for the one client connection.
///
/// # Errors
/// Returns `OrbitErr::Setup` if accepting fails.
pub async fn accept(listener: &TcpListener) -> Result<(TcpStream, SocketAddr)> {
    let (stream, peer) = listener
        .accept()
        .await
        .map_err(setup(SetupStage::Accept))?;

    info!("client connected from {peer}");
    Ok((stream, peer))
}

/// Listens on `addr`, accepts one client and serves it until it sends `exit`.
///
/// # Args
/// * `addr` - The address to listen at.
/// * `dispatcher` - The models every data frame is handed to.
/// * `mode` - What to do with every data frame.
/// * `dim` - The feature dimension data frames must carry.
///
/// # Errors
/// Returns `OrbitErr::Setup` if the socket can't be set up and
/// `OrbitErr::Disconnected` or `OrbitErr::Transport` if the session breaks.
pub async fn serve(
    addr: SocketAddr,
    dispatcher: ModelDispatcher,
    mode: Mode,
    dim: usize,
) -> Result<()> {
    let listener = listen(addr)?;
    let (stream, _) = accept(&listener).await?;
    drop(listener);

    let (rx, tx) = stream.into_split();
    let (rx, tx) = comms::channel(rx, tx);

    ConnectionLoop::new(rx, tx, dispatcher, mode, dim).run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binding_a_taken_port_fails_at_bind() {
        let first = listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();

        let err = listen(addr).unwrap_err();
        assert!(matches!(
            err,
            OrbitErr::Setup {
                stage: SetupStage::Bind,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn accepts_one_client() {
        let listener = listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await });
        let (_, peer) = accept(&listener).await.unwrap();

        let stream = client.await.unwrap().unwrap();
        assert_eq!(stream.local_addr().unwrap(), peer);
    }
}
