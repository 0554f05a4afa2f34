use std::{fs, net::TcpListener as StdListener, path::Path, time::Duration};

use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::sleep,
};

use orbitai::{ExitCode, config::Layout};

const PREFIX: &str = "esa.mo.nmf.apps.OrbitAI.";

fn write_props(dir: &Path, port: u16, extra: &[&str]) -> std::path::PathBuf {
    let mut text = format!(
        "# controller settings\n\
         {PREFIX}port={port}\n\
         {PREFIX}host=127.0.0.1\n\
         {PREFIX}mode=0\n\
         {PREFIX}inputs=PD1,PD2,PD3,PD4,PD5\n\
         {PREFIX}log.data.training=1\n\
         {PREFIX}AROW=1\n\
         some.other.app.port=1\n"
    );
    for line in extra {
        text.push_str(PREFIX);
        text.push_str(line);
        text.push('\n');
    }

    let path = dir.join("orbitai.properties");
    fs::write(&path, text).unwrap();
    path
}

fn free_port() -> u16 {
    StdListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn connect(port: u16) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            return stream;
        }
        sleep(Duration::from_millis(20)).await;
    }

    panic!("controller never started listening on {port}");
}

async fn request(stream: &mut TcpStream, frame: &[u8]) -> String {
    stream.write_all(frame).await.unwrap();

    let mut buf = [0; 64];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

#[tokio::test]
async fn serves_a_training_session() {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path());
    layout.create_dirs().unwrap();

    let port = free_port();
    let props = write_props(dir.path(), port, &["AROW.hparam.r=0.8"]);

    let controller = tokio::spawn(async move { orbitai::run(&props, layout).await });
    let mut client = connect(port).await;

    assert_eq!(
        request(&mut client, b"0036 1 1:0.5 2:0.3 3:0.1 4:0.9 5:0.2").await,
        "OK\n"
    );
    assert_eq!(request(&mut client, b"hello").await, "INVALID\n");
    assert_eq!(request(&mut client, b"exit").await, "BYE\n");

    controller.await.unwrap().unwrap();

    assert!(dir.path().join("models/AROW").is_file());
    let log = fs::read_to_string(dir.path().join("logs/training.csv")).unwrap();
    let row = log.lines().nth(1).unwrap();
    assert!(row.ends_with(",1,0.5,0.3,0.1,0.9,0.2"));
}

#[tokio::test]
async fn missing_properties_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path());

    let err = orbitai::run(&dir.path().join("nope.properties"), layout)
        .await
        .unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::PropertiesFileMissing);
}

#[tokio::test]
async fn missing_hyperparameter_is_fatal_before_listening() {
    let dir = TempDir::new().unwrap();
    let layout = Layout::new(dir.path());
    let props = write_props(dir.path(), free_port(), &[]);

    let err = orbitai::run(&props, layout).await.unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::ParseArgs);
}
