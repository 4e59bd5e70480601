//! Shared harness for the end-to-end suite.
//!
//! Boots a real daemon on an ephemeral port against the in-memory store and
//! talks to it over a raw framed TCP stream, exactly as a client would.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use roster_core::protocol::{
    decode_response, encode_request, Credentials, FrameCodec, PersonPayload, Request, Response,
};
use roster_core::protocol::messages::{CoordinatesPayload, LocationPayload};
use roster_daemon::auth::AuthService;
use roster_daemon::collection::PersonList;
use roster_daemon::commands::CommandRegistry;
use roster_daemon::dispatch::Router;
use roster_daemon::server::Server;
use roster_daemon::state::{DaemonState, SharedState};
use roster_daemon::store::MemoryStore;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

pub struct TestDaemon {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub auth: AuthService,
    state: SharedState,
    handle: JoinHandle<()>,
}

impl TestDaemon {
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone());
        let list = Arc::new(PersonList::load(store.clone()).await.unwrap());
        let router = Arc::new(Router::new(
            CommandRegistry::with_default_commands(),
            auth.clone(),
            list,
        ));
        let state = DaemonState::shared();
        let server = Server::bind("127.0.0.1:0", router, state.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());
        Self {
            addr,
            store,
            auth,
            state,
            handle,
        }
    }

    pub async fn shutdown(self) {
        self.state.request_shutdown();
        let _ = self.handle.await;
    }
}

pub struct TestClient {
    framed: Framed<TcpStream, FrameCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            framed: Framed::new(stream, FrameCodec::new()),
        }
    }

    /// One request, one response.
    pub async fn send(&mut self, request: &Request) -> Response {
        self.framed.send(encode_request(request)).await.unwrap();
        let frame = self.framed.next().await.unwrap().unwrap();
        decode_response(&frame).unwrap()
    }

    /// Writes every request before reading any response; returns the
    /// responses in arrival order.
    pub async fn send_pipelined(&mut self, requests: &[Request]) -> Vec<Response> {
        for request in requests {
            self.framed.feed(encode_request(request)).await.unwrap();
        }
        self.framed.flush().await.unwrap();

        let mut responses = Vec::with_capacity(requests.len());
        for _ in requests {
            let frame = self.framed.next().await.unwrap().unwrap();
            responses.push(decode_response(&frame).unwrap());
        }
        responses
    }

    /// Sends an arbitrary (well-framed) payload and reads one response.
    pub async fn send_raw(&mut self, payload: Bytes) -> Response {
        self.framed.send(payload).await.unwrap();
        let frame = self.framed.next().await.unwrap().unwrap();
        decode_response(&frame).unwrap()
    }

    /// Hands back the raw stream, for tests that write invalid frames.
    pub fn into_inner(self) -> TcpStream {
        self.framed.into_inner()
    }
}

pub fn creds(username: &str, password: &str) -> Option<Credentials> {
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

pub fn request(command: &str, credentials: Option<Credentials>) -> Request {
    Request::new(command, Vec::new(), Vec::new(), credentials)
}

pub fn request_with_args(
    command: &str,
    args: &[&str],
    credentials: Option<Credentials>,
) -> Request {
    Request::new(
        command,
        args.iter().map(ToString::to_string).collect(),
        Vec::new(),
        credentials,
    )
}

pub fn request_with_person(
    command: &str,
    person: PersonPayload,
    credentials: Option<Credentials>,
) -> Request {
    Request::new(command, Vec::new(), vec![person], credentials)
}

pub fn person_payload(name: &str, height: i32, weight: i32) -> PersonPayload {
    PersonPayload {
        name: name.to_string(),
        coordinates: Some(CoordinatesPayload { x: 0, y: 0 }),
        height,
        weight,
        hair_color: "BLUE".to_string(),
        nationality: "USA".to_string(),
        location: Some(LocationPayload {
            x: 1.0,
            y: Some(2.0),
            name: Some("L".to_string()),
        }),
        ..PersonPayload::default()
    }
}
