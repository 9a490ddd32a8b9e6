//! End-to-end dispatch tests driven through `Engine::serve`.

use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use serde_json::json;
use sprig::http::render::{RenderError, TemplateRenderer};
use sprig::Context;

mod common;
use common::{engine_with_logger, get, request};

type Trace = Arc<Mutex<Vec<String>>>;

/// Middleware that records entry and exit around `next()`.
fn tracer(trace: &Trace, name: &'static str) -> impl Fn(&mut Context) + Send + Sync + 'static {
    let trace = Arc::clone(trace);
    move |ctx: &mut Context| {
        trace.lock().unwrap().push(format!("{name}:pre"));
        ctx.next();
        trace.lock().unwrap().push(format!("{name}:post"));
    }
}

fn take(trace: &Trace) -> Vec<String> {
    std::mem::take(&mut *trace.lock().unwrap())
}

#[test]
fn test_literal_beats_param_and_params_bind() {
    let (mut engine, _) = engine_with_logger();
    engine
        .get("/hello/:name", |ctx: &mut Context| {
            let name = ctx.param("name").unwrap_or_default().to_string();
            ctx.write_text(StatusCode::OK, format!("param {name}"));
        })
        .unwrap();
    engine
        .get("/hello/world", |ctx: &mut Context| {
            ctx.write_text(StatusCode::OK, "literal");
        })
        .unwrap();

    assert_eq!(engine.serve(get("/hello/world")).text(), "literal");
    assert_eq!(engine.serve(get("/hello/alice")).text(), "param alice");
}

#[test]
fn test_wildcard_binds_remaining_path() {
    let (mut engine, _) = engine_with_logger();
    engine
        .get("/assets/*filepath", |ctx: &mut Context| {
            let file = ctx.param("filepath").unwrap_or_default().to_string();
            let pattern = ctx.route_pattern().unwrap_or_default().to_string();
            ctx.write_json(StatusCode::OK, &json!({ "filepath": file, "pattern": pattern }));
        })
        .unwrap();

    let response = engine.serve(get("/assets/css/site.css"));
    assert_eq!(
        response.json().unwrap(),
        json!({ "filepath": "css/site.css", "pattern": "/assets/*filepath" })
    );
}

#[test]
fn test_last_registration_wins() {
    let (mut engine, _) = engine_with_logger();
    engine
        .get("/dup", |ctx: &mut Context| ctx.write_text(StatusCode::OK, "first"))
        .unwrap();
    engine
        .get("/dup", |ctx: &mut Context| ctx.write_text(StatusCode::OK, "second"))
        .unwrap();

    assert_eq!(engine.serve(get("/dup")).text(), "second");
    assert_eq!(engine.routes().len(), 1);
}

#[test]
fn test_group_middleware_accumulates_and_unwinds() {
    let trace: Trace = Arc::default();
    let (mut engine, _) = engine_with_logger();
    engine.use_middleware(tracer(&trace, "root"));
    {
        let mut api = engine.group("/api");
        api.use_middleware(tracer(&trace, "api"));
        let handler_trace = Arc::clone(&trace);
        api.get("/items", move |ctx: &mut Context| {
            handler_trace.lock().unwrap().push("handler".to_string());
            ctx.write_text(StatusCode::OK, "items");
        })
        .unwrap();
    }
    let handler_trace = Arc::clone(&trace);
    engine
        .get("/home", move |_: &mut Context| {
            handler_trace.lock().unwrap().push("handler".to_string());
        })
        .unwrap();

    engine.serve(get("/api/items"));
    assert_eq!(
        take(&trace),
        vec!["root:pre", "api:pre", "handler", "api:post", "root:post"]
    );

    engine.serve(get("/home"));
    assert_eq!(take(&trace), vec!["root:pre", "handler", "root:post"]);
}

#[test]
fn test_fail_in_handler_unwinds_every_middleware() {
    let trace: Trace = Arc::default();
    let (mut engine, logger) = engine_with_logger();
    engine.use_middleware(tracer(&trace, "outer"));
    {
        let mut api = engine.group("/api");
        api.use_middleware(tracer(&trace, "inner"));
        let handler_trace = Arc::clone(&trace);
        api.get("/x", move |ctx: &mut Context| {
            handler_trace.lock().unwrap().push("handler".to_string());
            ctx.fail(StatusCode::INTERNAL_SERVER_ERROR, "boom");
            assert!(ctx.is_aborted());
        })
        .unwrap();
    }

    let response = engine.serve(get("/api/x"));
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json().unwrap(), json!({ "message": "boom" }));
    assert_eq!(
        take(&trace),
        vec!["outer:pre", "inner:pre", "handler", "inner:post", "outer:post"]
    );
    assert_eq!(logger.matching("error", "boom").len(), 1);
}

#[test]
fn test_fail_in_middleware_skips_handler() {
    let trace: Trace = Arc::default();
    let (mut engine, _) = engine_with_logger();
    engine.use_middleware(tracer(&trace, "outer"));
    {
        let mut api = engine.group("/api");
        api.use_middleware(|ctx: &mut Context| {
            ctx.fail(StatusCode::FORBIDDEN, "nope");
        });
        let handler_trace = Arc::clone(&trace);
        api.get("/x", move |ctx: &mut Context| {
            handler_trace.lock().unwrap().push("handler".to_string());
            ctx.write_text(StatusCode::OK, "unreachable");
        })
        .unwrap();
    }

    let response = engine.serve(get("/api/x"));
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.json().unwrap(), json!({ "message": "nope" }));
    assert_eq!(take(&trace), vec!["outer:pre", "outer:post"]);
}

#[test]
fn test_middleware_observes_failure_after_next() {
    let seen: Arc<Mutex<Option<String>>> = Arc::default();
    let (mut engine, _) = engine_with_logger();
    let slot = Arc::clone(&seen);
    engine.use_middleware(move |ctx: &mut Context| {
        ctx.next();
        *slot.lock().unwrap() = ctx.error().map(ToString::to_string);
    });
    engine
        .get("/bad", |ctx: &mut Context| ctx.fail(StatusCode::BAD_REQUEST, "missing field"))
        .unwrap();

    engine.serve(get("/bad"));
    assert_eq!(
        seen.lock().unwrap().as_deref(),
        Some("handler failed with 400: missing field")
    );
}

#[test]
fn test_panic_becomes_generic_500_and_is_logged_once() {
    let (mut engine, logger) = engine_with_logger();
    engine
        .get("/panic", |_: &mut Context| {
            let names: Vec<&str> = Vec::new();
            let _ = names[100];
        })
        .unwrap();

    let response = engine.serve(get("/panic"));
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json().unwrap(),
        json!({ "message": "Internal Server Error" })
    );
    assert!(!response.text().contains("out of bounds"));

    let errors: Vec<_> = logger
        .entries()
        .into_iter()
        .filter(|e| e.level == "error")
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "/panic");
    assert_eq!(errors[0].status, Some(500));
    assert!(errors[0]
        .message
        .as_deref()
        .unwrap_or_default()
        .contains("index out of bounds"));

    // The engine keeps serving after a fault.
    assert_eq!(engine.serve(get("/panic")).status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_panic_after_commit_discards_partial_response() {
    let (mut engine, logger) = engine_with_logger();
    engine
        .get("/late", |ctx: &mut Context| {
            ctx.set_header("x-partial", "yes");
            ctx.write_text(StatusCode::OK, "partial");
            panic!("late fault");
        })
        .unwrap();

    let response = engine.serve(get("/late"));
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"message":"Internal Server Error"}"#);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert!(response.header("x-partial").is_none());
    assert_eq!(logger.matching("error", "late fault").len(), 1);
}

#[test]
fn test_status_commits_once() {
    let (mut engine, _) = engine_with_logger();
    engine
        .get("/twice", |ctx: &mut Context| {
            assert!(ctx.set_status(StatusCode::CREATED));
            assert!(!ctx.set_status(StatusCode::ACCEPTED));
            ctx.set_header("x-late", "ignored");
            ctx.write_body(b"made");
        })
        .unwrap();

    for _ in 0..3 {
        let response = engine.serve(get("/twice"));
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.text(), "made");
        assert!(response.header("x-late").is_none());
    }
}

#[test]
fn test_unmatched_request_passes_through_middleware() {
    let trace: Trace = Arc::default();
    let (mut engine, _) = engine_with_logger();
    engine.use_middleware(tracer(&trace, "root"));
    engine.use_middleware(|ctx: &mut Context| {
        ctx.set_header("x-seen", "yes");
        ctx.next();
    });

    let response = engine.serve(request(Method::POST, "/nowhere"));
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "404 NOT FOUND: /nowhere\n");
    assert_eq!(response.header("x-seen"), Some("yes"));
    assert_eq!(take(&trace), vec!["root:pre", "root:post"]);
}

#[test]
fn test_abort_skips_handler() {
    let (mut engine, _) = engine_with_logger();
    engine.use_middleware(|ctx: &mut Context| {
        if ctx.request().header("authorization").is_none() {
            ctx.write_text(StatusCode::UNAUTHORIZED, "denied");
            ctx.abort();
        }
    });
    engine
        .get("/secret", |ctx: &mut Context| ctx.write_text(StatusCode::OK, "secret"))
        .unwrap();

    let denied = engine.serve(get("/secret"));
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.text(), "denied");

    let allowed = engine.serve(get("/secret").with_header("authorization", "Bearer x"));
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.text(), "secret");
}

#[test]
fn test_form_and_query_values() {
    let (mut engine, _) = engine_with_logger();
    engine
        .post("/login", |ctx: &mut Context| {
            let body = json!({
                "username": ctx.form_value("username"),
                "password": ctx.form_value("password"),
                "next": ctx.query_value("next"),
            });
            ctx.write_json(StatusCode::OK, &body);
        })
        .unwrap();

    let login = request(Method::POST, "/login?next=%2Fhome&username=ignored")
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body("username=alice&password=1234");

    assert_eq!(
        engine.serve(login).json().unwrap(),
        json!({ "username": "alice", "password": "1234", "next": "/home" })
    );
}

#[test]
fn test_static_files_served_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/site.css"), "body {}").unwrap();

    let (mut engine, _) = engine_with_logger();
    engine.static_files("/assets", dir.path()).unwrap();

    let found = engine.serve(get("/assets/css/site.css"));
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.text(), "body {}");
    assert_eq!(found.header("content-type"), Some("text/css; charset=utf-8"));

    assert_eq!(engine.serve(get("/assets/css/missing.css")).status, StatusCode::NOT_FOUND);
    assert_eq!(engine.serve(get("/assets/../secret")).status, StatusCode::NOT_FOUND);
}

#[test]
fn test_encoded_param_is_decoded() {
    let (mut engine, _) = engine_with_logger();
    engine
        .get("/hello/:name", |ctx: &mut Context| {
            let name = ctx.param("name").unwrap_or_default().to_string();
            ctx.write_text(StatusCode::OK, format!("hello {name}"));
        })
        .unwrap();

    assert_eq!(engine.serve(get("/hello/John%20Doe")).text(), "hello John Doe");
}

#[test]
fn test_static_file_with_encoded_name() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("my file.txt"), "spaced").unwrap();

    let (mut engine, _) = engine_with_logger();
    engine.static_files("/assets", dir.path()).unwrap();

    let found = engine.serve(get("/assets/my%20file.txt"));
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.text(), "spaced");

    assert_eq!(engine.serve(get("/assets/%2e%2e/secret")).status, StatusCode::NOT_FOUND);
}

struct GreetingRenderer;

impl TemplateRenderer for GreetingRenderer {
    fn render(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError> {
        match name {
            "greet.tmpl" => Ok(format!(
                "<p>hello {}</p>",
                data["name"].as_str().unwrap_or("stranger")
            )),
            other => Err(RenderError::NotFound(other.to_string())),
        }
    }
}

#[test]
fn test_html_rendering() {
    let (mut engine, _) = engine_with_logger();
    engine.set_renderer(Arc::new(GreetingRenderer));
    engine
        .get("/greet/:name", |ctx: &mut Context| {
            let data = json!({ "name": ctx.param("name") });
            ctx.write_html(StatusCode::OK, "greet.tmpl", &data);
        })
        .unwrap();
    engine
        .get("/broken", |ctx: &mut Context| {
            ctx.write_html(StatusCode::OK, "missing.tmpl", &json!({}));
        })
        .unwrap();

    let page = engine.serve(get("/greet/sprig"));
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.text(), "<p>hello sprig</p>");
    assert_eq!(page.header("content-type"), Some("text/html; charset=utf-8"));

    let broken = engine.serve(get("/broken"));
    assert_eq!(broken.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        broken.json().unwrap(),
        json!({ "message": "template 'missing.tmpl' not found" })
    );
}

#[test]
fn test_success_status_logged_at_info() {
    let (mut engine, logger) = engine_with_logger();
    engine
        .get("/ok", |ctx: &mut Context| ctx.write_text(StatusCode::OK, "ok"))
        .unwrap();

    engine.serve(get("/ok"));

    let entries = logger.entries();
    assert!(entries
        .iter()
        .any(|e| e.level == "debug" && e.path == "/ok" && e.status.is_none()));
    assert!(entries
        .iter()
        .any(|e| e.level == "info" && e.path == "/ok" && e.status == Some(200)));
}
