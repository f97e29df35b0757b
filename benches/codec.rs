//! Benchmarks for the message codec.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use netconf_client::{marshal_method, unmarshal, Decoder, Method, Reply};
use serde_derive::{Deserialize, Serialize};
use std::io::Cursor;
use tokio::runtime::Runtime;

const HELLO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
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
<lldp-remote-chassis-id>f0:1c:2d:ed:68:80</lldp-remote-chassis-id>
<lldp-remote-system-name>EX2200C2</lldp-remote-system-name>
</lldp-neighbor-information>
</lldp-neighbors-information>
</rpc-reply>
]]>]]>
"#;

#[derive(Debug, Deserialize)]
struct LldpReply {
    #[serde(rename = "lldp-neighbor-information", default)]
    neighbor: Vec<Neighbor>,
}

#[derive(Debug, Deserialize)]
struct Neighbor {
    #[serde(rename = "lldp-local-port-id", default)]
    local_port_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "get-interface-information")]
struct ShowInterfacesRpc {
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<()>,
}

fn bench_decode_hello(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    c.bench_function("decode_hello", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut decoder = Decoder::new(Cursor::new(black_box(HELLO).as_bytes()));
                black_box(decoder.decode_hello().await.unwrap())
            })
        })
    });
}

fn bench_decode_reply(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    c.bench_function("decode_reply", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let mut decoder = Decoder::new(Cursor::new(black_box(LLDP_REPLY).as_bytes()));
                let reply: Reply<LldpReply> = decoder.decode().await.unwrap();
                black_box(reply.data.unwrap().neighbor[0].local_port_id.len())
            })
        })
    });
}

fn bench_unmarshal(c: &mut Criterion) {
    c.bench_function("unmarshal", |b| {
        b.iter(|| {
            let reply: Reply<LldpReply> = unmarshal(black_box(LLDP_REPLY)).unwrap();
            black_box(reply.data.unwrap().neighbor.len())
        })
    });
}

fn bench_marshal(c: &mut Criterion) {
    let method = Method::with_message_id(ShowInterfacesRpc { detail: Some(()) }, "1");
    c.bench_function("marshal", |b| {
        b.iter(|| black_box(marshal_method(black_box(&method)).unwrap().len()))
    });
}

criterion_group!(
    benches,
    bench_decode_hello,
    bench_decode_reply,
    bench_unmarshal,
    bench_marshal
);
criterion_main!(benches);
