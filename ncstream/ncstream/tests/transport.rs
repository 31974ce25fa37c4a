use std::io::Read;

use ncstream::{CannedResponse, MemoryTransport, StatusClass, Transport};

#[test]
fn memory_transport_serves_canned_responses_and_logs_requests() {
    let transport = MemoryTransport::new();
    transport.insert(
        "http://h/a?req=header",
        CannedResponse::ok(&b"CDFS"[..]).with_declared_length(4),
    );

    let mut response = transport.send("http://h/a?req=header").expect("send");
    assert_eq!(response.status, StatusClass::Success);
    assert_eq!(response.declared_length, Some(4));
    let mut body = Vec::new();
    response.body.read_to_end(&mut body).expect("read body");
    assert_eq!(body, b"CDFS");

    let missing = transport.send("http://h/b?req=header").expect("send");
    assert_eq!(missing.status, StatusClass::NotFound);

    assert_eq!(
        transport.requests(),
        ["http://h/a?req=header", "http://h/b?req=header"]
    );
    transport.clear_requests();
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn handler_answers_unknown_urls() {
    let transport = MemoryTransport::with_handler(|url| {
        url.ends_with("?req=header")
            .then(|| CannedResponse::status(StatusClass::OtherError, "500 Internal Server Error"))
    });
    transport.insert("http://h/a?req=header", CannedResponse::ok(&b""[..]));

    assert_eq!(
        transport.send("http://h/a?req=header").expect("send").status,
        StatusClass::Success
    );
    let computed = transport.send("http://h/b?req=header").expect("send");
    assert_eq!(computed.status, StatusClass::OtherError);
    assert_eq!(computed.detail, "500 Internal Server Error");
    assert_eq!(
        transport.send("http://h/b?var=x").expect("send").status,
        StatusClass::NotFound
    );
}

#[cfg(feature = "http")]
#[test]
fn http_transport_rejects_invalid_length_header() {
    use ncstream::{HttpTransport, TransportError};

    assert!(matches!(
        HttpTransport::builder()
            .with_length_header("not a header")
            .build(),
        Err(TransportError::Config { .. })
    ));
    assert!(
        HttpTransport::builder()
            .with_timeout(std::time::Duration::from_secs(5))
            .with_user_agent("ncstream-tests")
            .build()
            .is_ok()
    );
}
