// One shared server per test binary, started on its own runtime so it outlives each test's.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

// Bound address (`host:port`), published once the listener is up.
static SERVER_ADDR: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Start the server on first use and return its `host:port`.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        // A plain thread keeps the server alive across `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral port so parallel test binaries never collide.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(addr.to_string());
                rhythm_server::run(listener).await.expect("server failed");
            });
        });
        wait_until_accepting(published);
    });

    SERVER_ADDR
        .get()
        .expect("server address should be initialized")
        .as_str()
}

pub fn http_url(path: &str) -> String {
    format!("http://{}{path}", ensure_server())
}

pub fn ws_url() -> String {
    format!("ws://{}/ws", ensure_server())
}

fn wait_until_accepting(published: Arc<OnceLock<String>>) {
    let addr = loop {
        if let Some(addr) = published.get() {
            break addr.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER_ADDR.set(addr.clone());

    // The listener is bound before publishing, but accept may lag slightly behind.
    for _ in 0..100 {
        if std::net::TcpStream::connect(&addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
