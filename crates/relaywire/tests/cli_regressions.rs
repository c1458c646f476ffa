#![cfg(all(unix, feature = "cli"))]

use std::io::{self, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use relaywire::frame::{encode_prefix, FrameReader};
use relaywire::{flags, Endpoint, Frame, Relay, RelayError, RelayListener};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/rwcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn wait_for_relay(path: &Path, timeout: Duration) -> io::Result<Relay> {
    let endpoint = Endpoint::local(path).map_err(io::Error::other)?;
    let start = Instant::now();
    loop {
        let mut relay = Relay::new(endpoint.clone());
        match relay.connect() {
            Ok(()) => return Ok(relay),
            Err(err) => {
                if start.elapsed() >= timeout {
                    return Err(io::Error::other(format!("connect timeout: {err}")));
                }
                thread::sleep(Duration::from_millis(25));
            }
        }
    }
}

fn relaywire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_relaywire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn stop(mut child: Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn echo_returns_frames_in_order() {
    let dir = unique_temp_dir("echo");
    let sock_path = dir.join("echo.sock");

    let child = relaywire()
        .arg("echo")
        .arg(&sock_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("echo command should start");

    let mut relay =
        wait_for_relay(&sock_path, Duration::from_secs(3)).expect("client should connect");

    let frames = [
        Frame::new(0, "ping"),
        Frame::new(flags::EMPTY, ""),
        Frame::new(0x80, vec![0x42u8; 300_000]),
    ];
    relay.send_batch(&frames).expect("batch should send");
    for expected in &frames {
        let echoed = relay.wait_frame().expect("echo should arrive");
        assert_eq!(&echoed, expected);
    }

    relay.close().expect("close should succeed");
    stop(child);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn echo_rejects_corrupt_prefix_and_keeps_serving() {
    let dir = unique_temp_dir("echo-corrupt");
    let sock_path = dir.join("echo.sock");

    let child = relaywire()
        .arg("echo")
        .arg(&sock_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("echo command should start");

    // Make sure the server is up before talking raw bytes to it.
    drop(wait_for_relay(&sock_path, Duration::from_secs(3)).expect("client should connect"));

    let mut raw = UnixStream::connect(&sock_path).expect("raw client should connect");
    let mut prefix = encode_prefix(0, 4);
    prefix[16] ^= 0xFF;
    raw.write_all(&prefix).expect("corrupt prefix should write");

    let mut reader = FrameReader::new(raw);
    let reply = reader.read_frame().expect("error reply should arrive");
    assert!(reply.is_error());
    let message = String::from_utf8(reply.body.to_vec()).expect("reply should be text");
    assert!(message.contains("invalid prefix (checksum)"), "{message}");

    let mut relay =
        wait_for_relay(&sock_path, Duration::from_secs(3)).expect("server should keep accepting");
    relay.send(&Frame::new(0, "still there")).unwrap();
    assert_eq!(relay.wait_frame().unwrap(), Frame::new(0, "still there"));

    drop(relay);
    stop(child);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn listen_prints_json_lines_and_stops_after_count() {
    let dir = unique_temp_dir("listen");
    let sock_path = dir.join("listen.sock");

    let child = relaywire()
        .arg("--format")
        .arg("json")
        .arg("listen")
        .arg(&sock_path)
        .arg("--count")
        .arg("2")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("listen command should start");

    let mut relay =
        wait_for_relay(&sock_path, Duration::from_secs(3)).expect("client should connect");
    relay
        .send_batch(&[Frame::new(0, "first"), Frame::error("second")])
        .expect("frames should send");

    let output = child.wait_with_output().expect("listen should exit");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["body"], "first");
    assert_eq!(lines[0]["flags"], 0);
    assert_eq!(lines[1]["body"], "second");
    assert_eq!(lines[1]["flag_names"], "ERROR");
    assert_eq!(lines[1]["size"], 6);

    drop(relay);
    let _ = std::fs::remove_dir_all(&dir);
}

fn serve_one_reply(reply: Frame) -> (Endpoint, thread::JoinHandle<Frame>) {
    let listener = RelayListener::bind(&Endpoint::network("127.0.0.1", 0).unwrap())
        .expect("listener should bind");
    let endpoint = listener.local_endpoint().unwrap();
    let handle = thread::spawn(move || {
        let mut session = listener.accept().expect("listener should accept");
        let request = session.recv().expect("request should arrive");
        session.send(&reply).expect("reply should send");
        assert!(matches!(session.recv(), Err(RelayError::Disconnected)));
        request
    });
    (endpoint, handle)
}

#[test]
fn send_wait_prints_reply() {
    let (endpoint, server) = serve_one_reply(Frame::new(0, "pong"));

    let output = relaywire()
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(endpoint.to_string())
        .arg("--flags")
        .arg("0x04")
        .arg("--data")
        .arg("ping")
        .arg("--wait")
        .output()
        .expect("send command should run");
    assert!(output.status.success(), "{output:?}");

    let reply: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("reply should be json");
    assert_eq!(reply["body"], "pong");
    assert_eq!(reply["peer"], endpoint.to_string());

    let request = server.join().expect("server thread should complete");
    assert_eq!(request, Frame::new(flags::COMPRESSED, "ping"));
}

#[test]
fn send_exits_nonzero_on_error_reply() {
    let (endpoint, server) = serve_one_reply(Frame::error("unknown method"));

    let status = relaywire()
        .arg("--format")
        .arg("raw")
        .arg("send")
        .arg(endpoint.to_string())
        .arg("--wait")
        .stdout(Stdio::null())
        .status()
        .expect("send command should run");
    assert_eq!(status.code(), Some(1));

    let request = server.join().expect("server thread should complete");
    assert!(request.body.is_empty());
}

#[test]
fn send_to_closed_port_is_transport_error() {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let output = relaywire()
        .arg("send")
        .arg(format!("tcp://127.0.0.1:{port}"))
        .arg("--data")
        .arg("ping")
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: connect failed"), "{stderr}");
}

#[test]
fn version_reports_package_version() {
    let output = relaywire()
        .arg("version")
        .output()
        .expect("version command should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("relaywire {}", env!("CARGO_PKG_VERSION"))
    );
}
