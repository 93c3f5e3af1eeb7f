//! Loopback stand-in for a dev server, answering any number of connections
//! from a fixed route table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub(crate) enum Reply {
    Json(&'static str, String),
    /// Chunked body whose connection stays open after the last write.
    Stream(Vec<String>),
}

pub(crate) async fn serve(routes: Vec<(&'static str, Reply)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = listener.local_addr().expect("loopback addr");
    let routes: Arc<HashMap<&'static str, Reply>> = Arc::new(routes.into_iter().collect());

    tokio::spawn(async move {
        while let Ok((socket, _peer)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                answer(socket, &routes).await;
            });
        }
    });

    format!("http://{addr}")
}

/// Address of a port that was free a moment ago, so connecting is refused.
pub(crate) fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().expect("loopback addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

async fn answer(mut socket: TcpStream, routes: &HashMap<&'static str, Reply>) {
    let Some(path) = request_path(&mut socket).await else {
        return;
    };

    match routes.get(path.as_str()) {
        Some(Reply::Json(status, body)) => {
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body.as_bytes()).await;
        }
        Some(Reply::Stream(lines)) => {
            let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            for line in lines {
                let chunk = format!("{:x}\r\n{line}\r\n", line.len());
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        None => {
            let _ = socket
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await;
        }
    }
    let _ = socket.flush().await;
}

async fn request_path(socket: &mut TcpStream) -> Option<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        head.extend_from_slice(&buf[..n]);
    }
    let head = String::from_utf8_lossy(&head);
    let request_line = head.lines().next()?;
    request_line.split_whitespace().nth(1).map(str::to_string)
}
