//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and connect a
//! `tokio-tungstenite` client to it.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use lobbyrelay_transport::{
        Connection, OriginPolicy, Transport, TransportError,
        WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().unwrap().to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");
        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives ---
        server_conn
            .send(r#"{"event":"hello"}"#)
            .await
            .expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"event":"hello"}"#);

        // --- Client sends text, server receives ---
        client_ws
            .send(Message::text("from client"))
            .await
            .unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, "from client");

        // --- Binary frames are decoded as UTF-8 ---
        client_ws
            .send(Message::Binary(b"binary text".to_vec().into()))
            .await
            .unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, "binary text");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_pending_recv() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        let server_handle =
            tokio::spawn(async move { transport.accept().await.unwrap() });
        let mut client_ws = connect_client(&addr).await;
        let server_conn =
            std::sync::Arc::new(server_handle.await.unwrap());

        // Park a reader on the connection, then send from another task.
        let reader = {
            let conn = std::sync::Arc::clone(&server_conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::timeout(
            std::time::Duration::from_secs(1),
            server_conn.send("broadcast"),
        )
        .await
        .expect("send must not block behind recv")
        .unwrap();

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "broadcast");

        client_ws.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        let server_handle =
            tokio::spawn(async move { transport.accept().await.unwrap() });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_disallowed_origin_is_rejected() {
        let policy = OriginPolicy::from_origins(["http://allowed.test"]);
        let mut transport =
            WebSocketTransport::bind_with_origins("127.0.0.1:0", policy)
                .await
                .unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        let server_handle =
            tokio::spawn(async move { transport.accept().await });

        let mut request = format!("ws://{addr}").into_client_request().unwrap();
        request
            .headers_mut()
            .insert("origin", "http://evil.test".parse().unwrap());
        let client = tokio_tungstenite::connect_async(request).await;
        assert!(client.is_err(), "client handshake should be refused");

        let result = server_handle.await.unwrap();
        assert!(matches!(result, Err(TransportError::OriginRejected(_))));
    }

    #[tokio::test]
    async fn test_allowed_origin_is_accepted() {
        let policy = OriginPolicy::from_origins(["http://allowed.test"]);
        let mut transport =
            WebSocketTransport::bind_with_origins("127.0.0.1:0", policy)
                .await
                .unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        let server_handle =
            tokio::spawn(async move { transport.accept().await });

        let mut request = format!("ws://{addr}").into_client_request().unwrap();
        request
            .headers_mut()
            .insert("origin", "http://allowed.test".parse().unwrap());
        let (_client, _) = tokio_tungstenite::connect_async(request)
            .await
            .expect("allowed origin should connect");

        assert!(server_handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_utf8_binary_frame_keeps_connection_open() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = transport.local_addr().unwrap().to_string();
        let server_handle =
            tokio::spawn(async move { transport.accept().await.unwrap() });
        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws
            .send(Message::Binary(vec![0xff, 0xfe].into()))
            .await
            .unwrap();
        let result = server_conn.recv().await;
        assert!(matches!(result, Err(TransportError::InvalidFrame(_))));

        // The next frame is read normally.
        client_ws.send(Message::text("still here")).await.unwrap();
        let received = server_conn.recv().await.unwrap().unwrap();
        assert_eq!(received, "still here");
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap()
            .with_handshake_timeout(Duration::from_millis(200));
        let addr = transport.local_addr().unwrap();

        // Opens TCP but never sends the upgrade request.
        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();

        let incoming = transport.accept_incoming().await.unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            incoming.handshake(),
        )
        .await
        .expect("handshake should give up on its own");
        assert!(matches!(result, Err(TransportError::HandshakeTimeout(_))));
    }

    #[tokio::test]
    async fn test_accept_incoming_does_not_wait_for_the_upgrade() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = transport.local_addr().unwrap();

        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();
        let stalled = transport.accept_incoming().await.unwrap();
        assert_eq!(stalled.peer_addr().ip(), addr.ip());

        // A second client is picked up while the first is still silent.
        let client = tokio::spawn(async move {
            tokio_tungstenite::connect_async(format!("ws://{addr}")).await
        });
        let incoming = tokio::time::timeout(
            Duration::from_secs(3),
            transport.accept_incoming(),
        )
        .await
        .expect("listener must not be held up by the silent client")
        .unwrap();
        let conn = incoming.handshake().await.unwrap();
        assert!(conn.id().into_inner() > 0);
        assert!(client.await.unwrap().is_ok());
        drop(stalled);
    }
}
