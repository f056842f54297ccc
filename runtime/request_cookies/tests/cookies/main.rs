use assertions::{header_parts, is_removal_cookie};
use fixtures::{pairs, store};
use googletest::{
    assert_that,
    prelude::{eq, some},
};
use itertools::Itertools;
use request_cookies::{
    CookieEncoder, CookieEntry, CookieOptions, CookieStore, DeleteOptions, Priority, SameSite,
    errors::{DeleteCookieError, SetCookieError, ValidationError},
};

mod fixtures;

#[test]
fn unknown_cookies_are_absent() {
    let store = store("theme=dark");

    assert!(!store.has("lang"));
    assert!(store.get("lang").is_none());
    assert!(store.get_all(Some("lang")).is_empty());
}

#[test]
fn incoming_cookies_can_be_read() {
    let store = store("theme=dark; lang=en");

    let theme = store.get("theme").unwrap();
    assert_that!(theme.name(), eq("theme"));
    assert_that!(theme.value(), eq("dark"));
    assert!(store.has("lang"));
    // Incoming cookies carry no attributes.
    assert_eq!(theme.options(), &CookieOptions::default());
}

#[test]
fn set_shadows_the_incoming_value_in_place() {
    let mut store = store("theme=dark; lang=en");

    store.set("theme", "light", CookieOptions::new()).unwrap();

    assert_that!(store.get("theme").unwrap().value(), eq("light"));
    assert_eq!(
        pairs(&store.get_all(None)),
        [
            ("theme".to_owned(), "light".to_owned()),
            ("lang".to_owned(), "en".to_owned())
        ]
    );
}

#[test]
fn later_sets_replace_earlier_ones() {
    let mut store = store("");

    store.set("step", "1", CookieOptions::new()).unwrap();
    store.set("other", "x", CookieOptions::new()).unwrap();
    store.set("step", "2", CookieOptions::new()).unwrap();

    assert_that!(store.get("step").unwrap().value(), eq("2"));
    let pending = store.pending().map(|c| c.name()).join(",");
    assert_eq!(pending, "step,other");
}

#[test]
fn entries_can_be_set_as_a_whole() {
    let mut store = store("");

    let entry = CookieEntry::new("cart", "3-items")
        .set_options(CookieOptions::new().set_priority(Priority::Low));
    store.set_entry(entry).unwrap();
    store.set_entry(("plain", "value").into()).unwrap();

    let cart = store.get("cart").unwrap();
    assert_eq!(cart.options().priority, Some(Priority::Low));
    let plain = store.get("plain");
    assert_that!(plain.as_ref().map(|c| c.value()), some(eq("value")));
}

#[test]
fn get_all_returns_a_snapshot() {
    let mut store = store("theme=dark");

    let before = store.get_all(None);
    store.set("theme", "light", CookieOptions::new()).unwrap();
    store.set("lang", "en", CookieOptions::new()).unwrap();

    assert_eq!(pairs(&before), [("theme".to_owned(), "dark".to_owned())]);
    assert_eq!(store.get_all(None).len(), 2);
}

#[test]
fn namesakes_sent_by_the_client_are_all_returned() {
    let store = store("id=first; id=second; other=1");

    assert_that!(store.get("id").unwrap().value(), eq("first"));
    assert_eq!(
        pairs(&store.get_all(Some("id"))),
        [
            ("id".to_owned(), "first".to_owned()),
            ("id".to_owned(), "second".to_owned())
        ]
    );
}

#[test]
fn delete_leaves_a_removal_cookie_behind() {
    let mut store = store("theme=dark; lang=en");

    store.delete("theme").unwrap();

    // The cookie is still visible, as a removal cookie, until the response is sent.
    assert!(store.has("theme"));
    let theme = store.get("theme").unwrap();
    assert_that!(theme, is_removal_cookie());
    assert!(theme.is_removal());

    let header = &store.header_values()[0];
    let parts = header_parts(header);
    assert_eq!(parts[0], "theme=");
    assert!(parts.contains(&"Max-Age=0"));
    assert!(parts.contains(&"Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    assert!(parts.contains(&"Path=/"));
}

#[test]
fn delete_with_scope_targets_domain_and_path() {
    let mut store = store("session=abc");

    store
        .delete_with(
            DeleteOptions::new("session")
                .set_domain("example.com")
                .set_path("/account"),
        )
        .unwrap();

    let session = store.get("session").unwrap();
    assert_that!(session, is_removal_cookie());
    assert_that!(session.options().domain.as_deref(), some(eq("example.com")));
    assert_that!(session.options().path.as_deref(), some(eq("/account")));
}

#[test]
fn delete_many_queues_every_removal() {
    let mut store = store("a=1; b=2; c=3");

    store.delete_many(["a", "c"]).unwrap();

    assert_that!(store.get("a").unwrap(), is_removal_cookie());
    assert_that!(store.get("b").unwrap().value(), eq("2"));
    assert_that!(store.get("c").unwrap(), is_removal_cookie());
}

#[test]
fn delete_many_is_all_or_nothing() {
    let mut store = store("a=1; b=2");

    let err = store.delete_many(["a", "not valid"]).unwrap_err();

    assert!(matches!(
        err,
        DeleteCookieError::Validation(ValidationError::InvalidName { .. })
    ));
    assert_eq!(store.pending().count(), 0);
    assert_that!(store.get("a").unwrap().value(), eq("1"));
}

#[test]
fn zero_max_age_has_removal_semantics() {
    let mut store = store("name=someone");

    store
        .set("name", "lee", CookieOptions::new().set_max_age(0))
        .unwrap();

    let name = store.get("name").unwrap();
    assert_eq!(name.options().max_age, Some(0));
    let header = &store.header_values()[0];
    assert!(header_parts(header).contains(&"Max-Age=0"));
}

#[test]
fn clear_removes_every_visible_cookie() {
    let mut store = store("a=1; b=2");
    store.set("c", "3", CookieOptions::new()).unwrap();

    store.clear().unwrap();

    assert_eq!(store.len(), 3);
    for entry in store.get_all(None) {
        assert_that!(entry, is_removal_cookie());
    }
}

#[test]
fn clear_is_idempotent() {
    let mut once = store("a=1; b=2");
    once.set("c", "3", CookieOptions::new()).unwrap();
    let mut twice = once.clone();

    once.clear().unwrap();
    twice.clear().unwrap();
    twice.clear().unwrap();

    let once: Vec<_> = once.pending().cloned().collect();
    let twice: Vec<_> = twice.pending().cloned().collect();
    assert_eq!(once, twice);
}

#[test]
fn to_string_uses_raw_values() {
    let mut store = store("theme=dark; lang=en");
    store
        .set(
            "greeting",
            "hello world",
            CookieOptions::new().set_encode(CookieEncoder::percent_encoding()),
        )
        .unwrap();

    insta::assert_snapshot!(store.to_string(), @"theme=dark; lang=en; greeting=hello world");
}

#[test]
fn to_string_round_trips_through_the_parser() {
    let mut store = store("theme=dark; lang=en; id=1; id=2");
    store.set("theme", "light", CookieOptions::new()).unwrap();
    store.set("new", "cookie", CookieOptions::new()).unwrap();
    store.delete("lang").unwrap();

    let reparsed = CookieStore::parse(&store.to_string());

    assert_eq!(pairs(&reparsed.get_all(None)), pairs(&store.get_all(None)));
}

#[test]
fn encoded_values_round_trip_through_the_parser() {
    let mut store = store("theme=dark");
    store
        .set(
            "query",
            "a=1 & b=2, c",
            CookieOptions::new().set_encode(CookieEncoder::percent_encoding()),
        )
        .unwrap();

    let reparsed = CookieStore::parse(&store.to_string());

    assert_eq!(
        pairs(&reparsed.get_all(None)),
        [
            ("theme".to_owned(), "dark".to_owned()),
            ("query".to_owned(), "a=1 & b=2, c".to_owned())
        ]
    );
}

#[test]
fn raw_values_that_cannot_be_read_back_are_rejected() {
    let mut store = store("theme=dark");

    for value in ["x; y=z", " padded", "padded ", "tab\tinside"] {
        let err = store
            .set(
                "q",
                value,
                CookieOptions::new().set_encode(CookieEncoder::percent_encoding()),
            )
            .unwrap_err();
        assert!(
            matches!(
                err,
                SetCookieError::Validation(ValidationError::InvalidValue { .. })
            ),
            "`{value:?}` should be rejected"
        );
    }
    assert!(!store.has("q"));
    insta::assert_snapshot!(store.to_string(), @"theme=dark");
}

#[test]
fn encoder_is_applied_on_the_wire_only() {
    let mut store = store("");
    let shout = CookieEncoder::new(|value| value.to_uppercase());

    store
        .set("mood", "calm", CookieOptions::new().set_encode(shout))
        .unwrap();

    assert_that!(store.get("mood").unwrap().value(), eq("calm"));
    assert!(store.header_values()[0].starts_with("mood=CALM"));
}

#[test]
fn encoded_values_are_validated() {
    let mut store = store("");

    // Spaces are only acceptable once encoded.
    let err = store
        .set("greeting", "hello world", CookieOptions::new())
        .unwrap_err();
    assert!(matches!(
        err,
        SetCookieError::Validation(ValidationError::InvalidValue { .. })
    ));

    store
        .set(
            "greeting",
            "hello world",
            CookieOptions::new().set_encode(CookieEncoder::percent_encoding()),
        )
        .unwrap();
    assert!(store.header_values()[0].starts_with("greeting=hello%20world"));
}

#[test]
fn malformed_names_and_attributes_are_rejected() {
    let mut store = store("");

    let err = store
        .set("bad name", "value", CookieOptions::new())
        .unwrap_err();
    assert_eq!(
        err,
        SetCookieError::Validation(ValidationError::InvalidName {
            name: "bad name".into()
        })
    );

    let err = store
        .set("ok", "value", CookieOptions::new().set_path("no-slash"))
        .unwrap_err();
    assert!(matches!(
        err,
        SetCookieError::Validation(ValidationError::InvalidAttribute {
            attribute: "Path",
            ..
        })
    ));

    assert_eq!(store.pending().count(), 0);
}

#[test]
fn every_option_reaches_the_set_cookie_header() {
    let mut store = store("");
    let expires: jiff::Timestamp = "2031-06-15T12:30:00Z".parse().unwrap();

    store
        .set(
            "prefs",
            "compact",
            CookieOptions::new()
                .set_expires(expires)
                .set_max_age(600)
                .set_domain("example.com")
                .set_path("/settings")
                .set_secure(true)
                .set_http_only(true)
                .set_same_site(SameSite::None)
                .set_priority(Priority::Medium)
                .set_partitioned(true),
        )
        .unwrap();

    let header = &store.header_values()[0];
    let parts = header_parts(header);
    assert_eq!(parts[0], "prefs=compact");
    for attribute in [
        "Expires=Sun, 15 Jun 2031 12:30:00 GMT",
        "Max-Age=600",
        "Domain=example.com",
        "Path=/settings",
        "Secure",
        "HttpOnly",
        "SameSite=None",
        "Priority=Medium",
        "Partitioned",
    ] {
        assert!(parts.contains(&attribute), "`{attribute}` missing from `{header}`");
    }
}
