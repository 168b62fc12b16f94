//! CCIP-read gateway endpoints.
//!
//! - `GET /{sender}/{calldata}.json` -- calldata in the path
//! - `POST /` -- `{ sender, data, signature? }` JSON body
//!
//! Both transports hand a [`GatewayRequest`] to the shared dispatcher and
//! render its outcome identically: handler responses pass through, decode
//! failures become 404.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ccip_read_core::{
    DecodeError, DispatchError, DispatchOutcome, Dispatcher, GatewayRequest, PostBody,
    SelectorRegistry,
};
use serde_json::json;
use tracing::{debug, error};

use super::AppState;
use crate::network::ShutdownController;

/// Gateway routes, awaiting an [`AppState`].
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ccip_post_handler))
        .route("/{sender}/{calldata}", get(ccip_get_handler))
}

/// Standalone gateway router for mounting into an existing axum application.
///
/// Carries its own always-ready shutdown controller; use
/// [`NetworkModule`](crate::network::NetworkModule) for a managed server.
pub fn gateway_router(registry: Arc<SelectorRegistry>) -> Router {
    let shutdown = Arc::new(ShutdownController::new());
    shutdown.set_ready();
    gateway_routes().with_state(AppState::new(Dispatcher::new(registry), shutdown))
}

/// `GET /{sender}/{calldata}.json`
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn ccip_get_handler(
    State(state): State<AppState>,
    Path((sender, calldata)): Path<(String, String)>,
) -> Result<Response, GatewayError> {
    serve(&state, GatewayRequest::Get { sender, calldata }).await
}

/// `POST /`
///
/// A body that is not a JSON lookup object, or that arrives without a JSON
/// content type, is a not-found result like any other decode failure.
/// Oversized bodies keep their 413.
///
/// # Errors
///
/// See [`GatewayError`].
pub async fn ccip_post_handler(
    State(state): State<AppState>,
    body: Result<Json<PostBody>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(JsonRejection::BytesRejection(rejection)) => return Ok(rejection.into_response()),
        Err(rejection) => {
            let err = DecodeError::InvalidBody(rejection.body_text());
            debug!(error = %err, "post body rejected");
            return Ok(outcome_response(DispatchOutcome::NotFound(err)));
        }
    };
    serve(&state, GatewayRequest::Post(body)).await
}

async fn serve(state: &AppState, request: GatewayRequest) -> Result<Response, GatewayError> {
    let Some(_guard) = state.shutdown.begin_call() else {
        return Err(GatewayError::ShuttingDown);
    };
    let outcome = state.dispatcher.dispatch(request).await?;
    Ok(outcome_response(outcome))
}

fn outcome_response(outcome: DispatchOutcome) -> Response {
    match outcome {
        DispatchOutcome::Responded(response) => {
            let status =
                StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(response.body)).into_response()
        }
        DispatchOutcome::Exhausted => message(StatusCode::NOT_FOUND, "no handler produced a response"),
        DispatchOutcome::NotFound(err) => message(StatusCode::NOT_FOUND, &err.to_string()),
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

/// Failures rendered by the gateway endpoints themselves.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 503: the gateway is draining.
    #[error("gateway is shutting down")]
    ShuttingDown,
    /// 500: a handler unit failed. Details are logged, not returned.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::ShuttingDown => {
                message(StatusCode::SERVICE_UNAVAILABLE, "gateway is shutting down")
            }
            Self::Dispatch(DispatchError::Handler {
                signature,
                unit,
                source,
            }) => {
                error!(%signature, unit, error = %format!("{source:#}"), "handler failed");
                message(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::{B256, U256};
    use axum::body::Body;
    use axum::http::Request;
    use ccip_read_core::{
        abi_value_to_json, handler_fn, namehash, CallContext, CallHandler, FunctionSpec,
        GatewayResponse, HandlerChain, HandlerOutcome,
    };
    use parking_lot::Mutex;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const TEXT: &str = "function text(bytes32 node, string key) view returns (string)";
    const SET_TEXT: &str =
        "function setText(bytes32 node, string calldata key, string calldata value)";

    fn encode(signature: &str, args: Vec<DynSolValue>) -> String {
        let spec = FunctionSpec::parse(signature).unwrap().unwrap();
        let mut calldata = spec.selector().to_vec();
        calldata.extend(DynSolValue::Tuple(args).abi_encode_params());
        format!("0x{}", alloy_primitives::hex::encode(calldata))
    }

    fn blockful_calldata() -> String {
        encode(
            TEXT,
            vec![
                DynSolValue::FixedBytes(namehash("blockful.eth"), 32),
                DynSolValue::String("blockful".into()),
            ],
        )
    }

    fn invalid_calldata() -> String {
        encode("function text(uint32 num)", vec![DynSolValue::Uint(U256::from(2), 32)])
    }

    fn expected_blockful() -> Value {
        json!({
            "node": abi_value_to_json(&DynSolValue::FixedBytes(namehash("blockful.eth"), 32)),
            "key": "blockful",
        })
    }

    fn echo_body(ctx: &CallContext) -> HandlerOutcome {
        HandlerOutcome::Respond(GatewayResponse::json(json!({
            "node": ctx.args.get("node").map(abi_value_to_json),
            "key": ctx.args.get_str("key"),
        })))
    }

    fn echo_node_key() -> impl CallHandler {
        handler_fn(|ctx| Ok(echo_body(ctx)))
    }

    /// Unit that records its label and continues.
    fn pass(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> impl CallHandler {
        let log = Arc::clone(log);
        handler_fn(move |_| {
            log.lock().push(label);
            Ok(HandlerOutcome::Continue)
        })
    }

    /// Unit that records its label and blocks with a 500.
    fn block(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> impl CallHandler {
        let log = Arc::clone(log);
        handler_fn(move |_| {
            log.lock().push(label);
            Ok(HandlerOutcome::Respond(GatewayResponse::with_status(
                500,
                json!({ "message": "blocking call" }),
            )))
        })
    }

    /// Unit that records its label and echoes `node` and `key`.
    fn echo(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> impl CallHandler {
        let log = Arc::clone(log);
        handler_fn(move |ctx| {
            log.lock().push(label);
            Ok(echo_body(ctx))
        })
    }

    fn router(entries: Vec<(&str, HandlerChain)>) -> Router {
        let registry = entries
            .into_iter()
            .fold(SelectorRegistry::builder(), |b, (sig, chain)| b.function(sig, chain))
            .build()
            .unwrap();
        gateway_router(Arc::new(registry))
    }

    fn get_request(calldata: &str) -> Request<Body> {
        Request::get(format!("/0x12345/{calldata}.json"))
            .header("accept", "application/json")
            .body(Body::empty())
            .unwrap()
    }

    fn post_request(calldata: &str) -> Request<Body> {
        Request::post("/")
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(Body::from(
                json!({ "sender": "0x12345", "data": calldata }).to_string(),
            ))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn both(calldata: &str) -> [Request<Body>; 2] {
        [get_request(calldata), post_request(calldata)]
    }

    // -- single function --------------------------------------------------

    #[tokio::test]
    async fn valid_call_without_middleware() {
        for request in both(&blockful_calldata()) {
            let app = router(vec![(TEXT, HandlerChain::single(echo_node_key()))]);
            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, expected_blockful());
        }
    }

    #[tokio::test]
    async fn invalid_call_is_not_found() {
        for request in both(&invalid_calldata()) {
            let app = router(vec![(TEXT, HandlerChain::single(echo_node_key()))]);
            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body["message"].as_str().unwrap().contains("no function registered"));
        }
    }

    #[tokio::test]
    async fn non_blocking_middleware_runs_before_handler() {
        for request in both(&blockful_calldata()) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let chain = HandlerChain::new()
                .then(pass(&log, "middleware"))
                .then(echo(&log, "handler"));
            let app = router(vec![(TEXT, chain)]);

            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, expected_blockful());
            assert_eq!(*log.lock(), vec!["middleware", "handler"]);
        }
    }

    #[tokio::test]
    async fn blocking_middleware_stops_the_chain() {
        for request in both(&blockful_calldata()) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let chain = HandlerChain::new()
                .then(block(&log, "middleware"))
                .then(echo(&log, "handler"));
            let app = router(vec![(TEXT, chain)]);

            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "message": "blocking call" }));
            assert_eq!(*log.lock(), vec!["middleware"]);
        }
    }

    // -- several functions ------------------------------------------------

    #[tokio::test]
    async fn routes_to_the_matching_function() {
        for request in both(&blockful_calldata()) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let app = router(vec![
                (TEXT, HandlerChain::single(echo(&log, "text"))),
                (SET_TEXT, HandlerChain::single(echo(&log, "setText"))),
            ]);

            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, expected_blockful());
            assert_eq!(*log.lock(), vec!["text"]);
        }
    }

    #[tokio::test]
    async fn invalid_call_among_several_functions_is_not_found() {
        for request in both(&invalid_calldata()) {
            let app = router(vec![
                (TEXT, HandlerChain::single(echo_node_key())),
                (SET_TEXT, HandlerChain::single(echo_node_key())),
            ]);
            let (status, _) = send(app, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn shared_middleware_runs_once_per_call() {
        for request in both(&blockful_calldata()) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let app = router(vec![
                (TEXT, HandlerChain::new().then(pass(&log, "middleware")).then(echo(&log, "text"))),
                (
                    SET_TEXT,
                    HandlerChain::new().then(pass(&log, "middleware")).then(echo(&log, "setText")),
                ),
            ]);

            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, expected_blockful());
            assert_eq!(*log.lock(), vec!["middleware", "text"]);
        }
    }

    #[tokio::test]
    async fn duplicate_signature_blocked_by_first_chain() {
        for request in both(&blockful_calldata()) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let app = router(vec![
                (TEXT, HandlerChain::new().then(block(&log, "gate")).then(echo(&log, "h1"))),
                (TEXT, HandlerChain::new().then(block(&log, "gate")).then(echo(&log, "h2"))),
            ]);

            let (status, body) = send(app, request).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({ "message": "blocking call" }));
            assert_eq!(*log.lock(), vec!["gate"]);
        }
    }

    // -- transport details ------------------------------------------------

    #[tokio::test]
    async fn get_without_json_extension_is_not_found() {
        let app = router(vec![(TEXT, HandlerChain::single(echo_node_key()))]);
        let request = Request::get(format!("/0x12345/{}", blockful_calldata()))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "calldata path segment must end in `.json`");
    }

    #[tokio::test]
    async fn post_without_data_is_not_found() {
        let app = router(vec![(TEXT, HandlerChain::single(echo_node_key()))]);
        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"sender":"0x12345"}"#))
            .unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_with_non_string_data_is_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let app = router(vec![(TEXT, HandlerChain::single(pass(&log, "only")))]);
        let request = Request::post("/")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"sender":"0x1","data":123}"#))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn post_without_content_type_is_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let app = router(vec![(TEXT, HandlerChain::single(pass(&log, "only")))]);
        let request = Request::post("/")
            .body(Body::from(
                json!({ "sender": "0x12345", "data": blockful_calldata() }).to_string(),
            ))
            .unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn post_with_non_json_body_is_not_found() {
        let app = router(vec![(TEXT, HandlerChain::single(echo_node_key()))]);
        let request = Request::post("/")
            .header("content-type", "text/plain")
            .body(Body::from("sender=0x1&data=0x59d1d43c"))
            .unwrap();

        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn exhausted_chain_is_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let app = router(vec![(TEXT, HandlerChain::single(pass(&log, "only")))]);

        let (status, body) = send(app, get_request(&blockful_calldata())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "no handler produced a response");
        assert_eq!(*log.lock(), vec!["only"]);
    }

    #[tokio::test]
    async fn handler_error_is_internal_server_error() {
        let app = router(vec![(
            TEXT,
            HandlerChain::single(handler_fn(|_| Err(anyhow::anyhow!("store offline")))),
        )]);

        let (status, body) = send(app, post_request(&blockful_calldata())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn draining_gateway_refuses_calls() {
        let registry = SelectorRegistry::builder()
            .function(TEXT, HandlerChain::single(echo_node_key()))
            .build()
            .unwrap();
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.trigger_shutdown();
        let app = gateway_routes().with_state(AppState::new(
            Dispatcher::new(Arc::new(registry)),
            shutdown,
        ));

        let (status, body) = send(app, get_request(&blockful_calldata())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "gateway is shutting down");
    }

    #[tokio::test]
    async fn unnamed_arguments_are_exposed_by_position() {
        let app = router(vec![(
            "function addr(bytes32, uint256)",
            HandlerChain::single(handler_fn(|ctx| {
                Ok(HandlerOutcome::Respond(GatewayResponse::json(ctx.args.to_json())))
            })),
        )]);
        let calldata = encode(
            "function addr(bytes32, uint256)",
            vec![
                DynSolValue::FixedBytes(B256::ZERO, 32),
                DynSolValue::Uint(U256::from(60), 256),
            ],
        );

        let (status, body) = send(app, get_request(&calldata)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["0"], format!("0x{}", "00".repeat(32)));
        assert_eq!(body["1"], "60");
    }
}
