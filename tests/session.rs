//! End-to-end exercises of the public API: a scripted NETCONF server on one
//! end of an in-memory stream pair, a [`Session`] on the other.

use netconf_client::{Decoder, Error, FrameReader, Reply, Session};
use pretty_assertions::assert_eq;
use serde_derive::{Deserialize, Serialize};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::sync::CancellationToken;

const SERVER_HELLO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
<capabilities>
<capability>urn:ietf:params:netconf:base:1.1</capability>
<capability>urn:ietf:params:ns:netconf:capability:startup:1.0</capability>
</capabilities>
<session-id>4</session-id>
</hello>
]]>]]>
"#;

const LLDP_REPLY: &str = r#"<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" xmlns:junos="http://xml.juniper.net/junos/15.1X49/junos">
<lldp-neighbors-information junos:style="brief">
<lldp-neighbor-information>
<lldp-local-port-id>ge-0/0/7</lldp-local-port-id>
<lldp-local-parent-interface-name>-</lldp-local-parent-interface-name>
<lldp-remote-chassis-id-subtype>Mac address</lldp-remote-chassis-id-subtype>
<lldp-remote-chassis-id>f0:1c:2d:ed:68:80</lldp-remote-chassis-id>
<lldp-remote-port-description>ge-0/0/0.0</lldp-remote-port-description>
<lldp-remote-system-name>EX2200C2</lldp-remote-system-name>
</lldp-neighbor-information>
</lldp-neighbors-information>
</rpc-reply>
]]>]]>
"#;

const OK_REPLY: &str = "<rpc-reply message-id=\"2\"><ok/></rpc-reply>\n]]>]]>\n";

const LOCK_DENIED_REPLY: &str = r#"<rpc-reply message-id="3">
<rpc-error>
<error-type>protocol</error-type>
<error-tag>lock-denied</error-tag>
<error-severity>error</error-severity>
<error-message>Lock is already held</error-message>
<error-info><session-id>77</session-id></error-info>
</rpc-error>
</rpc-reply>
]]>]]>
"#;

#[derive(Debug, Serialize)]
#[serde(rename = "get-lldp-neighbors-information")]
struct GetLldpNeighbors {}

#[derive(Debug, Serialize)]
#[serde(rename = "lock")]
struct Lock {
    target: Target,
}

#[derive(Debug, Serialize)]
struct Target {
    running: (),
}

#[derive(Debug, Deserialize, PartialEq)]
struct LldpReply {
    #[serde(rename = "lldp-neighbor-information", default)]
    neighbor: Vec<Neighbor>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Neighbor {
    #[serde(rename = "lldp-local-port-id", default)]
    local_port_id: String,
    #[serde(rename = "lldp-remote-chassis-id", default)]
    remote_chassis_id: String,
    #[serde(rename = "lldp-remote-system-name", default)]
    remote_system_name: String,
}

/// Answers the hello exchange and then serves one canned reply per request,
/// returning the raw requests it saw.
fn spawn_server(
    server: DuplexStream,
    replies: Vec<&'static str>,
) -> tokio::task::JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let (read_half, mut write_half) = tokio::io::split(server);
        let mut decoder = Decoder::new(FrameReader::new(read_half));

        write_half.write_all(SERVER_HELLO.as_bytes()).await.unwrap();
        let client_hello = decoder.read_message().await.unwrap();
        assert!(client_hello.contains("<hello"), "got: {client_hello}");
        decoder.get_mut().reset();

        let mut requests = Vec::new();
        for reply in replies {
            requests.push(decoder.read_message().await.unwrap());
            decoder.get_mut().reset();
            write_half.write_all(reply.as_bytes()).await.unwrap();
        }
        requests
    })
}

#[tokio::test]
async fn test_session_runs_typed_rpcs() {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let server_task = spawn_server(server, vec![LLDP_REPLY, OK_REPLY]);

    let (read_half, write_half) = tokio::io::split(client);
    let (mut session, hello) = Session::open(read_half, write_half).await.unwrap();
    assert_eq!(hello.session_id(), Some(4));
    assert!(hello.has_capability("urn:ietf:params:netconf:base:1.1"));

    let cancel = CancellationToken::new();

    let reply: Reply<LldpReply> = session.exec_one(&cancel, &GetLldpNeighbors {}).await.unwrap();
    let data = reply.data.unwrap();
    assert_eq!(
        data.neighbor,
        vec![Neighbor {
            local_port_id: "ge-0/0/7".to_string(),
            remote_chassis_id: "f0:1c:2d:ed:68:80".to_string(),
            remote_system_name: "EX2200C2".to_string(),
        }]
    );

    let reply: Reply = session
        .exec_one(&cancel, &Lock { target: Target { running: () } })
        .await
        .unwrap();
    assert!(reply.ok);
    assert_eq!(reply.message_id.as_deref(), Some("2"));

    session.close().await.unwrap();

    let requests = server_task.await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(
        requests[0].contains("<get-lldp-neighbors-information/>"),
        "got: {}",
        requests[0]
    );
    assert!(requests[1].contains("<lock>"), "got: {}", requests[1]);

    // counter-stamped message ids increase across the session's requests
    // (other tests share the process-wide counter, so only order is checked)
    let first_id = message_id_of(&requests[0]);
    let second_id = message_id_of(&requests[1]);
    assert!(second_id > first_id);
}

#[tokio::test]
async fn test_rpc_error_surfaces_with_reply_details() {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let server_task = spawn_server(server, vec![LOCK_DENIED_REPLY]);

    let (read_half, write_half) = tokio::io::split(client);
    let (mut session, _hello) = Session::open(read_half, write_half).await.unwrap();

    let cancel = CancellationToken::new();
    let err = session
        .exec_one::<_, ()>(&cancel, &Lock { target: Target { running: () } })
        .await
        .unwrap_err();

    let Error::Rpc(reply_error) = err else {
        panic!("expected Error::Rpc, got: {err:?}");
    };
    assert_eq!(reply_error.to_string(), "Lock is already held");
    assert_eq!(reply_error.error_info.session_id, Some(77));

    session.close().await.unwrap();
    server_task.await.unwrap();
}

#[tokio::test]
async fn test_exec_sequence_is_lazy_and_ordered() {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let server_task = spawn_server(server, vec![OK_REPLY, OK_REPLY, OK_REPLY]);

    let (read_half, write_half) = tokio::io::split(client);
    let (mut session, _hello) = Session::open(read_half, write_half).await.unwrap();

    let methods = [GetLldpNeighbors {}, GetLldpNeighbors {}, GetLldpNeighbors {}];
    let mut replies = session.exec(CancellationToken::new(), &methods);
    let mut seen = 0;
    while let Some(reply) = replies.next::<()>().await {
        assert!(reply.unwrap().ok);
        seen += 1;
    }
    assert_eq!(seen, 3);

    session.close().await.unwrap();
    assert_eq!(server_task.await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_cancelled_token_stops_the_exchange() {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let server_task = spawn_server(server, Vec::new());

    let (read_half, write_half) = tokio::io::split(client);
    let (mut session, _hello) = Session::open(read_half, write_half).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = session
        .exec_one::<_, ()>(&cancel, &GetLldpNeighbors {})
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled), "got: {err:?}");

    session.close().await.unwrap();
    server_task.await.unwrap();
}

fn message_id_of(rpc: &str) -> u64 {
    let (_, rest) = rpc.split_once("message-id=\"").unwrap();
    let (id, _) = rest.split_once('"').unwrap();
    id.parse().unwrap()
}
