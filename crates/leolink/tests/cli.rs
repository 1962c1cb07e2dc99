#![cfg(all(unix, feature = "cli"))]

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/leolink-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn accept_within(listener: &UnixListener, timeout: Duration) -> UnixStream {
    listener
        .set_nonblocking(true)
        .expect("listener should go non-blocking");
    let start = Instant::now();
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream
                    .set_nonblocking(false)
                    .expect("stream should go blocking");
                return stream;
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                if start.elapsed() >= timeout {
                    panic!("no connection from leolink");
                }
                thread::sleep(Duration::from_millis(20));
            }
            Err(err) => panic!("accept failed: {err}"),
        }
    }
}

fn leolink(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_leolink"));
    command
        .env_remove("LEOLINK_CONFIG")
        .env_remove("LEOLINK_LOG_LEVEL")
        .arg("--log-level")
        .arg("error")
        .arg("--log-root")
        .arg(dir.join("logs"));
    command
}

fn telemetry_frame(count: u32) -> String {
    format!(
        "<3171,12:00:{count:02},{count},F,ASCENT,100.0,20.0,1000.0,3.7,0,0,0,0,0,0,0,0,0,5,12:00:00,100.0,1.0,2.0,8,CX ON,,1.5,90>\r\n"
    )
}

fn wait_with_output(child: std::process::Child) -> Output {
    child.wait_with_output().expect("leolink should exit")
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_leolink"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("leolink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn send_writes_framed_command_to_bridge() {
    let dir = unique_temp_dir("send");
    let sock_path = dir.join("modem.sock");
    let listener = UnixListener::bind(&sock_path).expect("bridge should bind");

    let child = leolink(&dir)
        .arg("--format")
        .arg("json")
        .arg("send")
        .arg(format!("unix:{}", sock_path.display()))
        .arg("cx")
        .arg("on")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("send should start");

    let mut stream = accept_within(&listener, Duration::from_secs(5));
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    let mut received = Vec::new();
    stream
        .read_to_end(&mut received)
        .expect("bridge should read until leolink hangs up");

    let output = wait_with_output(child);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&received), "<CMD, 3171, CX, ON>");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"sent\":\"CMD, 3171, CX, ON\""));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn config_file_sets_team_id() {
    let dir = unique_temp_dir("config");
    let sock_path = dir.join("modem.sock");
    let config_path = dir.join("leolink.toml");
    fs::write(&config_path, "team_id = 42\n").expect("config should be writable");
    let listener = UnixListener::bind(&sock_path).expect("bridge should bind");

    let child = leolink(&dir)
        .arg("--config")
        .arg(&config_path)
        .arg("send")
        .arg(format!("unix:{}", sock_path.display()))
        .arg("mec")
        .arg("cam2")
        .arg("off")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("send should start");

    let mut stream = accept_within(&listener, Duration::from_secs(5));
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    let mut received = String::new();
    stream
        .read_to_string(&mut received)
        .expect("bridge should read");

    assert!(wait_with_output(child).status.success());
    assert_eq!(received, "<CMD, 42, MEC, CAM2, OFF>");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unknown_command_code_is_usage_error() {
    let dir = unique_temp_dir("usage");
    let output = leolink(&dir)
        .arg("send")
        .arg("unix:/nonexistent/modem.sock")
        .arg("launch")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(64));
    assert!(!dir.join("logs").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_bridge_is_device_error() {
    let dir = unique_temp_dir("missing");
    let output = leolink(&dir)
        .arg("monitor")
        .arg(format!("unix:{}", dir.join("absent.sock").display()))
        .output()
        .expect("monitor should run");

    assert_eq!(output.status.code(), Some(3));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn monitor_logs_session_and_prints_records() {
    let dir = unique_temp_dir("monitor");
    let sock_path = dir.join("modem.sock");
    let listener = UnixListener::bind(&sock_path).expect("bridge should bind");

    let child = leolink(&dir)
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(format!("unix:{}", sock_path.display()))
        .arg("--count")
        .arg("2")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("monitor should start");

    let mut stream = accept_within(&listener, Duration::from_secs(5));
    for count in [1, 1, 2] {
        stream
            .write_all(telemetry_frame(count).as_bytes())
            .expect("bridge should write");
    }

    let output = wait_with_output(child);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let records: Vec<&str> = stdout.lines().collect();
    assert_eq!(records.len(), 2);
    assert!(records[0].contains("\"packet_count\":1"));
    assert!(records[1].contains("\"packet_count\":2"));

    let sessions: Vec<PathBuf> = fs::read_dir(dir.join("logs"))
        .expect("log root should exist")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    assert_eq!(sessions.len(), 1);
    let log = fs::read_to_string(sessions[0].join("Flight_3171.csv")).expect("session log");
    assert_eq!(log.lines().count(), 3);
    assert!(sessions[0].join("summary.json").exists());

    drop(stream);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn monitor_with_zero_count_prints_nothing() {
    let dir = unique_temp_dir("zero");
    let sock_path = dir.join("modem.sock");
    let listener = UnixListener::bind(&sock_path).expect("bridge should bind");

    let child = leolink(&dir)
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(format!("unix:{}", sock_path.display()))
        .arg("--count")
        .arg("0")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("monitor should start");

    let mut stream = accept_within(&listener, Duration::from_secs(5));
    let _ = stream.write_all(telemetry_frame(1).as_bytes());

    let output = wait_with_output(child);
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());

    drop(stream);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn monitor_reports_lost_bridge() {
    let dir = unique_temp_dir("lost");
    let sock_path = dir.join("modem.sock");
    let listener = UnixListener::bind(&sock_path).expect("bridge should bind");

    let child = leolink(&dir)
        .arg("--format")
        .arg("json")
        .arg("monitor")
        .arg(format!("unix:{}", sock_path.display()))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("monitor should start");

    let mut stream = accept_within(&listener, Duration::from_secs(5));
    stream
        .write_all(telemetry_frame(1).as_bytes())
        .expect("bridge should write");
    thread::sleep(Duration::from_millis(600));
    drop(stream);

    let output = wait_with_output(child);
    assert_eq!(output.status.code(), Some(3), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);

    let _ = fs::remove_dir_all(&dir);
}
