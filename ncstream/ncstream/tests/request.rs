use ncstream::{
    Request, RequestError,
    core::{Range, Section},
    request::{canonical_location, request_base},
};

#[test]
fn uri_canonicalization() {
    let cases = [
        ("ncremote://host/data/a.nc", "http://host/data/a.nc"),
        ("ncremote:https://host/a.nc", "https://host/a.nc"),
        ("http://host/a.nc", "http://host/a.nc"),
        ("https://host:8443/a.nc", "https://host:8443/a.nc"),
        ("//host/a.nc", "http://host/a.nc"),
    ];
    for (uri, base) in cases {
        assert_eq!(request_base(uri), base, "{uri}");
    }
    assert_eq!(
        canonical_location("http://host/a.nc"),
        "ncremote:http://host/a.nc"
    );
}

#[test]
fn header_request() {
    assert_eq!(Request::Header.to_query(), "req=header");
    assert_eq!(Request::Header.url("http://h/a"), "http://h/a?req=header");
    assert_eq!(Request::parse("http://h/a?req=header").expect("parse"), Request::Header);
}

#[test]
fn variable_request_round_trips() {
    let section = Section::new(vec![
        Range::span(2, 4).expect("range"),
        Range::new(0, 20, 5).expect("range"),
    ]);
    let cases = [
        Request::variable("temp", section.clone()),
        Request::variable("temp", Section::whole()),
        Request::variable("wind speed", section),
        Request::variable("odd(name)&x=1", Section::whole()),
        Request::variable("température", Section::whole()),
    ];
    for request in cases {
        let url = request.url("http://h/a");
        assert_eq!(Request::parse(&url).expect("parse"), request, "{url}");
    }
}

#[test]
fn variable_query_text() {
    let section = Section::new(vec![
        Range::span(2, 4).expect("range"),
        Range::span(0, 20).expect("range"),
    ]);
    assert_eq!(
        Request::variable("temp", section).to_query(),
        "var=temp(2:4,0:20)"
    );
    assert_eq!(
        Request::variable("wind speed", Section::whole()).to_query(),
        "var=wind+speed"
    );
    assert_eq!(
        Request::variable("a(b)", Section::whole()).to_query(),
        "var=a%28b%29"
    );
}

#[test]
fn unrecognized_requests() {
    for text in ["", "req=data", "http://h/a?var=", "var=temp(0:2", "x=1"] {
        assert!(
            matches!(Request::parse(text), Err(RequestError::Unrecognized(_))),
            "{text:?}"
        );
    }
    assert!(matches!(
        Request::parse("var=temp(a:b)"),
        Err(RequestError::Section(_))
    ));
}
