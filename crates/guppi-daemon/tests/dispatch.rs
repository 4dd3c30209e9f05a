//! End-to-end dispatch tests over a real Unix domain socket.

use guppi_core::action::{ActionError, ActionRegistry, Callable};
use guppi_core::client;
use guppi_core::config::{ActionSet, Actions, FunctionSpec, ShellSpec};
use guppi_core::event::{Env, Event};
use guppi_daemon::daemon::{DispatchServer, ServerConfig};
use guppi_daemon::resolver::BuiltinResolver;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct TestDaemon {
    socket_path: PathBuf,
    cancel: CancellationToken,
    _dir: tempfile::TempDir,
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn fn_spec(name: &str) -> FunctionSpec {
    FunctionSpec {
        name: name.to_string(),
        enabled: true,
    }
}

fn shell_spec(name: &str, command: &str) -> ShellSpec {
    ShellSpec {
        name: name.to_string(),
        command: command.to_string(),
        enabled: true,
    }
}

fn counting_callable(counter: Arc<AtomicUsize>) -> Arc<dyn Callable> {
    Arc::new(move |_: &Event, _: &Env| -> Result<String, ActionError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(String::new())
    })
}

/// Bind a daemon in a temp dir and serve it on a background task.
fn start_daemon(set: ActionSet, resolver: &BuiltinResolver) -> TestDaemon {
    let dir = tempfile::TempDir::new().unwrap();
    let socket_path = dir.path().join("guppi.socket");

    let registry = Arc::new(ActionRegistry::build(set, resolver).unwrap());
    let server = DispatchServer::bind(ServerConfig::new(&socket_path), registry).unwrap();

    let cancel = CancellationToken::new();
    let serve_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = server.serve(serve_cancel).await;
    });

    TestDaemon {
        socket_path,
        cancel,
        _dir: dir,
    }
}

fn event(json: &str) -> Event {
    Event::decode(json.as_bytes()).unwrap()
}

async fn wait_for_count(counter: &AtomicUsize, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while counter.load(Ordering::SeqCst) < expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected count {expected}, saw {}",
            counter.load(Ordering::SeqCst)
        )
    });
}

#[tokio::test(flavor = "multi_thread")]
async fn prompt_reply_round_trip() {
    let mut resolver = BuiltinResolver::new();
    resolver.register(
        "prompt",
        Arc::new(|e: &Event, _: &Env| -> Result<String, ActionError> {
            Ok(format!("hello {}", e.get("who").unwrap().as_str().unwrap()))
        }),
    );

    let set = ActionSet {
        prompt: Some(fn_spec("prompt")),
        actions: Actions::default(),
    };
    let daemon = start_daemon(set, &resolver);

    let reply = client::send_event(&daemon.socket_path, &event(r#"{"who":"world"}"#))
        .await
        .unwrap();
    assert_eq!(reply.as_deref(), Some("hello world"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_prompt_sends_no_reply_but_fan_out_still_runs() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut resolver = BuiltinResolver::new();
    resolver.register(
        "prompt",
        Arc::new(|_: &Event, _: &Env| -> Result<String, ActionError> {
            Err(anyhow::anyhow!("prompt failure").into())
        }),
    );
    resolver.register("record", counting_callable(counter.clone()));

    let set = ActionSet {
        prompt: Some(fn_spec("prompt")),
        actions: Actions {
            function: vec![fn_spec("record")],
            shell: vec![],
        },
    };
    let daemon = start_daemon(set, &resolver);

    let reply = client::send_event(&daemon.socket_path, &event("{}"))
        .await
        .unwrap();
    assert_eq!(reply, None);
    wait_for_count(&counter, 1).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_payload_runs_zero_actions() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut resolver = BuiltinResolver::new();
    resolver.register("record", counting_callable(counter.clone()));

    let set = ActionSet {
        prompt: None,
        actions: Actions {
            function: vec![fn_spec("record")],
            shell: vec![],
        },
    };
    let daemon = start_daemon(set, &resolver);

    let reply = client::send_raw(&daemon.socket_path, b"not-json{{")
        .await
        .unwrap();
    assert_eq!(reply, None);

    // Give a would-be fan-out time to run before asserting it did not.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn replayed_event_fans_out_independently() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut resolver = BuiltinResolver::new();
    resolver.register("record", counting_callable(counter.clone()));

    let set = ActionSet {
        prompt: None,
        actions: Actions {
            function: vec![fn_spec("record")],
            shell: vec![],
        },
    };
    let daemon = start_daemon(set, &resolver);

    let payload = event(r#"{"x":"hi"}"#);
    client::send_event(&daemon.socket_path, &payload).await.unwrap();
    client::send_event(&daemon.socket_path, &payload).await.unwrap();
    wait_for_count(&counter, 2).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn shell_fan_out_substitutes_event_fields() {
    let resolver = BuiltinResolver::new();
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("out.txt");

    let set = ActionSet {
        prompt: None,
        actions: Actions {
            function: vec![],
            shell: vec![shell_spec("record", "printf %s {x} > {out}")],
        },
    };
    let daemon = start_daemon(set, &resolver);

    let payload = format!(r#"{{"x":"hi","out":"{}"}}"#, out.display());
    client::send_raw(&daemon.socket_path, payload.as_bytes())
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while !out.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("shell action never wrote its output file");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "hi");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_survives_a_failing_function_action() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut resolver = BuiltinResolver::new();
    resolver.register(
        "boom",
        Arc::new(|_: &Event, _: &Env| -> Result<String, ActionError> {
            Err(anyhow::anyhow!("action failure").into())
        }),
    );
    resolver.register("record", counting_callable(counter.clone()));

    let set = ActionSet {
        prompt: None,
        actions: Actions {
            function: vec![fn_spec("boom"), fn_spec("record")],
            shell: vec![],
        },
    };
    let daemon = start_daemon(set, &resolver);

    client::send_event(&daemon.socket_path, &event("{}")).await.unwrap();
    wait_for_count(&counter, 1).await;

    // The next event is still served.
    client::send_event(&daemon.socket_path, &event("{}")).await.unwrap();
    wait_for_count(&counter, 2).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_limit_of_one_still_serves_queued_clients() {
    let mut resolver = BuiltinResolver::new();
    resolver.register(
        "prompt",
        Arc::new(|_: &Event, _: &Env| -> Result<String, ActionError> {
            std::thread::sleep(Duration::from_millis(150));
            Ok("served".to_string())
        }),
    );

    let set = ActionSet {
        prompt: Some(fn_spec("prompt")),
        actions: Actions::default(),
    };

    let dir = tempfile::TempDir::new().unwrap();
    let socket_path = dir.path().join("guppi.socket");
    let mut config = ServerConfig::new(&socket_path);
    config.connection_limit = 1;

    let registry = Arc::new(ActionRegistry::build(set, &resolver).unwrap());
    let server = DispatchServer::bind(config, registry).unwrap();
    let cancel = CancellationToken::new();
    let serve_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = server.serve(serve_cancel).await;
    });

    // Excess connections wait rather than being refused; once a slot frees,
    // a waiting connection proceeds.
    let a = {
        let path = socket_path.clone();
        tokio::spawn(async move { client::send_raw(&path, b"{}").await.unwrap() })
    };
    let b = {
        let path = socket_path.clone();
        tokio::spawn(async move { client::send_raw(&path, b"{}").await.unwrap() })
    };

    assert_eq!(a.await.unwrap().as_deref(), Some("served"));
    assert_eq!(b.await.unwrap().as_deref(), Some("served"));

    cancel.cancel();
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_socket_file_is_replaced_on_bind() {
    let dir = tempfile::TempDir::new().unwrap();
    let socket_path = dir.path().join("guppi.socket");
    std::fs::write(&socket_path, b"").unwrap();

    let registry = Arc::new(
        ActionRegistry::build(ActionSet::default(), &BuiltinResolver::new()).unwrap(),
    );
    let server = DispatchServer::bind(ServerConfig::new(&socket_path), registry).unwrap();
    assert_eq!(server.socket_path(), socket_path.as_path());
}
